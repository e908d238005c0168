//! Czech Wikipedia.
//!
//! Infobox values here are noisier than on the English edition, so most
//! fields pass through [`del_redundant_text`] before anything else reads them.

use lazy_static::lazy_static;
use regex::{NoExpand, Regex};

use super::{has_prefix, LangAlias, Locale, SentenceFacts};
use crate::config::LangMap;
use crate::entity::EntityCore;
use crate::geocode::Geocoder;
use crate::normalize::coords::{self, Coordinates};
use crate::normalize::date::DatePair;
use crate::normalize::date_cs::convert_date;

const NON_ENTITY_PREFIXES: &[&str] = &[
    "wikipedie:",
    "redaktor:",
    "soubor:",
    "mediawiki:",
    "šablona:",
    "pomoc:",
    "kategorie:",
    "speciální:",
    "portál:",
    "modul:",
    "seznam",
    "geografie",
    "společenstvo",
];

/// Adjective stems of ruling houses and nations used in names such as
/// "Kateřina Řecká a Dánská".
const NATIONALITY_STEMS: &[&str] = &[
    "Anglick", "Aragonsk", "Bavorsk", "Brabantsk", "Burgundsk", "Česk", "Dánsk", "Francouzsk",
    "Hesensk", "Chorvatsk", "Italsk", "Kastilsk", "Litevsk", "Navarrsk", "Neapolsk", "Německ",
    "Norsk", "Polsk", "Portugalsk", "Prusk", "Rakousk", "Rusk", "Řeck", "Sask", "Sicilsk", "Skotsk",
    "Španělsk", "Švédsk", "Uhersk",
];

const LATITUDE_KEYS: &[&str] = &["zeměpisná šířka", "zeměpisná_šířka"];
const LONGITUDE_KEYS: &[&str] = &["zeměpisná výška", "zeměpisná_výška"];
const BIRTH_DATE_KEYS: &[&str] = &["datum narození", "datum_narození"];
const DEATH_DATE_KEYS: &[&str] = &["datum úmrtí", "datum_úmrtí"];
const RELIEF_INFOBOXES: &[&str] = &["reliéf", "hora", "průsmyk", "pohoří", "sedlo"];

lazy_static! {
    static ref DATE_TITLE: Regex = Regex::new(r"^\d{1,2}\. [^\W\d_]+$").unwrap();

    static ref LANG_LINK: Regex = Regex::new(r"\[\[(.*?)(?:\|.*?)?\]\]\s*(<br(?: ?/)?>)?").unwrap();
    static ref PIPED_LINK: Regex = Regex::new(r"\[\[[^\]|]+\|([^\]|]+)\]\]").unwrap();
    static ref LINK: Regex = Regex::new(r"\[\[([^\]]+)\]\]").unwrap();
    static ref EMPHASIS: Regex = Regex::new(r"'{2,}(.+?)'{2,}").unwrap();
    static ref SMALL_TAG: Regex = Regex::new(r"\s*</?small>\s*").unwrap();
    static ref BREAK: Regex = Regex::new(r"\s*<br(?: ?/)?>\s*").unwrap();
    static ref SMALL_TEMPLATE: Regex = Regex::new(r"\s*\{\{small\|([^}]+)\}\}\s*").unwrap();
    static ref NOWRAP: Regex = Regex::new(r"(?i)\s*\{\{nowrap\|([^}]+)\}\}\s*").unwrap();
    static ref CITATION_NEEDED: Regex =
        Regex::new(r"(?i)\s*\{\{(?:(?:doplňte|doplnit|chybí) zdroj|zdroj\?|fakt[^}]*)\}\}\s*").unwrap();
    static ref BULLET: Regex = Regex::new(r"\s*(?:\{\{•\}\}|•)\s*").unwrap();

    static ref FLAG_AND_NAME: Regex = Regex::new(r"(?i)\{\{Vlajka a název\|(.*?)(?:\|.*?)?\}\}").unwrap();
    static ref FOREIGN: Regex =
        Regex::new(r"(?i)\{\{(?:vjazyce2|cizojazyčně|audio|cj)\|.*?\|(.+?)\}\}").unwrap();
    static ref SMALL_PRINT: Regex = Regex::new(r"(?i)\{\{malé\|(.*?)\}\}").unwrap();
    static ref TEMPLATE: Regex = Regex::new(r"\{\{.*?\}\}").unwrap();
    static ref BREAK_SPACE: Regex = Regex::new(r"<br(?: /)?>").unwrap();
    static ref TAG: Regex = Regex::new(r"<.*?>").unwrap();
    static ref IMAGE_LINK: Regex =
        Regex::new(r"(?i)\[\[(?:Soubor|File):.*?\.(?:jpe?g|png|gif|bmp|ico|tif|tga|svg)[^\]]*\]\]").unwrap();
    static ref PIXELS: Regex = Regex::new(r"(?i)\d+\s*px").unwrap();
    static ref AGE: Regex = Regex::new(r"(?i)(?:(?:,\s*)?\(.*?věk.*?\)$|\(.*?věk.*?\)(?:,\s*)?)").unwrap();
    static ref YEARS: Regex = Regex::new(r"(?i)\(.*?let.*?\)").unwrap();
    static ref COMMAS: Regex = Regex::new(r",{2,}").unwrap();
    static ref LINK_END: Regex = Regex::new(r"(\]\])([^,])").unwrap();
    static ref MARKUP_CHARS: Regex = Regex::new(r"[{}<>\[\]]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    static ref MILLION: Regex = Regex::new(r"(?i)mil\.|mili[oó]n").unwrap();
    static ref THOUSAND: Regex = Regex::new(r"(?i)tis\.|tis[ií]c").unwrap();

    static ref PARENS: Regex = Regex::new(r"\(.*?\)").unwrap();
    static ref BRACKETED: Regex = Regex::new(r"\[.*?\]").unwrap();
    static ref LIST_SEPARATOR: Regex = Regex::new(r", ?").unwrap();

    static ref OFFICIAL_NAME: Regex = Regex::new(r"úřední\snázev\s(\w+)").unwrap();
    static ref NBSP: Regex = Regex::new(r"&nbsp;").unwrap();
    static ref ALIAS_PIPED_LINK: Regex = Regex::new(r"\[\[.*?\|(.*?)\]\]").unwrap();
    static ref ALIAS_LINK: Regex = Regex::new(r"\[\[(.*?)\]\]").unwrap();
    static ref FOREIGN_NAME: Regex = Regex::new(r"(?i)\{\{Cizojazyčně\|(.*?)\|(.*?)\}\}").unwrap();
    static ref SMALL_ANY: Regex = Regex::new(r"(?i)\{\{(?:malé|small).*?\}\}").unwrap();
    static ref ITALICS: Regex = Regex::new(r"'{2}").unwrap();
    static ref WIDE_GAP: Regex = Regex::new(r"[ \t]{2,3}").unwrap();

    static ref FICTIONAL: Regex =
        Regex::new(r"(?i)hrdinové\s+a\s+postavy\s+řecké\s+mytologie|bohové|postavy").unwrap();
    static ref LOCATION_SUFFIX: Regex = Regex::new(r"(?i)\s+(?:ze?|of|von)\s+.*").unwrap();
    static ref AND_NEIGHBOURS: Regex = Regex::new(r"([^ ]+)\s+a(?:nd)?\s+([^ ]+)").unwrap();

    static ref BORN_YEAR: Regex = Regex::new(r"\(\s*\*\s*(\d+)\s*\)").unwrap();
    static ref BORN_DATE: Regex = Regex::new(r"\(\s*\*\s*(\d+\.\s*\w+\.?\s+\d{1,4})\s*\)").unwrap();
    static ref BORN_DATE_PLACE: Regex = Regex::new(
        r"\(\s*\*\s*(\d+\.\s*\w+\.?\s+\d{1,4})\s*(?:,\s*)?([^\W\d_][\w\s\-–—−,]+[^\W\d_])\s*\)"
    )
    .unwrap();
    static ref LIFE_YEARS: Regex = Regex::new(
        r"\(\s*(?:\*\s*)?(\d{1,4})\s*(?:,\s*)?([^\W\d_][\w\s\-–—−,]+[^\W\d_])?\s*[\-–—−]\s*(?:†\s*)?(\d{1,4})\s*(?:,\s*)?([^\W\d_][\w\s\-–—−,]+[^\W\d_])?\s*\)"
    )
    .unwrap();
    static ref LIFE_DATES: Regex = Regex::new(
        r"\(\s*(?:\*\s*)?(\d+\.\s*\w+\.?\s+\d{1,4})\s*(?:,\s*)?([^\W\d_][\w\s\-–—−,]+[^\W\d_])?\s*[\-–—−]\s*(?:†\s*)?(\d+\.\s*\w+\.?\s+\d{1,4})\s*(?:,\s*)?([^\W\d_][\w\s\-–—−,]+[^\W\d_])?\s*\)"
    )
    .unwrap();

    static ref FORMER_STATES: Regex =
        Regex::new(r"(?i)Krátce\s+existující\s+státy|Zaniklé\s+(?:státy|monarchie)").unwrap();
    static ref PENINSULA_CATEGORY: Regex = Regex::new(r"(?i)poloostrovy\s+(?:na|ve?)").unwrap();
    static ref PENINSULA: Regex = Regex::new(r"(?i)poloostrov").unwrap();
    static ref RELIEF: Regex = Regex::new(r"(?i)reliéf|hora|průsmyk|pohoří|sedlo").unwrap();
    static ref CONTINENT: Regex = Regex::new(r"(?i)kontinent").unwrap();
    static ref ISLAND: Regex = Regex::new(r"(?i)ostrov").unwrap();
    static ref WATERFALL: Regex = Regex::new(r"(?i)vodopád").unwrap();
}

/// Remove the markup common to every Czech infobox value.
///
/// Links are reduced to their caption, emphasis and small print unwrapped,
/// and line breaks replaced by `separator`. With a language map, a leading
/// link naming a language ("[[angličtina]] Prague") becomes a
/// `{{Vjazyce|code}}` marker that the alias patterns understand.
pub fn del_redundant_text(text: &str, separator: &str, langmap: Option<&LangMap>) -> String {
    let mut text = text.to_string();
    if let Some(langmap) = langmap {
        let replacement = LANG_LINK.captures(&text).and_then(|caps| {
            let name = caps.get(1)?.as_str().to_lowercase();
            let code = langmap.get(&name)?;
            Some((caps[0].to_string(), format!("{{{{Vjazyce|{}}}}} ", code)))
        });
        if let Some((from, to)) = replacement {
            text = text.replace(&from, &to);
        }
    }

    let text = PIPED_LINK.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = EMPHASIS.replace_all(&text, "$1");
    let text = SMALL_TAG.replace_all(&text, " ");
    let text = BREAK.replace_all(&text, NoExpand(separator));
    let text = SMALL_TEMPLATE.replace_all(&text, " $1");
    let text = NOWRAP.replace_all(&text, " $1");
    let text = CITATION_NEEDED.replace_all(&text, "");
    let text = text.replace("{{--}}", "–").replace("{{break}}", ", ");
    let text = BULLET.replace_all(&text, ", ");
    text.replace("&nbsp;", " ").replace('\u{a0}', " ")
}

fn redundant(text: &str) -> String {
    del_redundant_text(text, "|", None)
}

/// Birth or death place in plain text.
pub fn get_place(place: &str) -> String {
    let place = FLAG_AND_NAME.replace_all(place, "$1");
    let place = FOREIGN.replace_all(&place, "$1");
    let place = SMALL_PRINT.replace_all(&place, "$1");
    let place = TEMPLATE.replace_all(&place, "");
    let place = BREAK_SPACE.replace_all(&place, " ");
    let place = TAG.replace_all(&place, "");
    let place = IMAGE_LINK.replace_all(&place, "");
    let place = PIXELS.replace_all(&place, "");
    let place = AGE.replace_all(&place, "");
    let place = YEARS.replace_all(&place, "");
    let place = COMMAS.replace_all(&place, ",");
    let place = LINK_END.replace_all(&place, "$1, $2");
    let place = redundant(&place);
    let place = MARKUP_CHARS.replace_all(&place, "");
    let place = WHITESPACE.replace_all(&place, " ");
    place.trim().trim_matches(',').trim().to_string()
}

fn get_continent(value: &str) -> String {
    let continent = PARENS.replace_all(value, "");
    let continent = BRACKETED.replace_all(&continent, "");
    let continent = TAG.replace_all(&continent, "");
    let continent = TEMPLATE.replace_all(&continent, "");
    let continent = WHITESPACE.replace_all(&continent, " ");
    LIST_SEPARATOR
        .replace_all(continent.trim(), "|")
        .replace('/', "|")
}

fn first_field<'a>(core: &'a EntityCore, keys: &[&str]) -> &'a str {
    core.first_value(keys)
}

fn is_nationality(word: &str) -> bool {
    word.strip_suffix(['á', 'ý', 'é'])
        .map_or(false, |stem| NATIONALITY_STEMS.contains(&stem))
}

fn optional(caps: &regex::Captures, i: usize) -> Option<String> {
    caps.get(i).map(|m| m.as_str().to_string()).filter(|s| !s.is_empty())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Czech;

impl Locale for Czech {
    fn code(&self) -> &'static str {
        "cs"
    }

    fn is_entity(&self, title: &str) -> bool {
        !has_prefix(&title.to_lowercase(), NON_ENTITY_PREFIXES) && !DATE_TITLE.is_match(title)
    }

    fn coefficient(&self, value: &str) -> f64 {
        if MILLION.is_match(value) {
            1e6
        } else if THOUSAND.is_match(value) {
            1e3
        } else {
            1.0
        }
    }

    fn coordinates(&self, core: &EntityCore, geocoder: &dyn Geocoder) -> Coordinates {
        let lat = coords::parse_degree(&redundant(first_field(core, LATITUDE_KEYS)));
        let lon = coords::parse_degree(&redundant(first_field(core, LONGITUDE_KEYS)));
        if !lat.is_empty() && !lon.is_empty() {
            return (lat, lon);
        }
        if !core.markup.coords.is_empty() {
            let (lat, lon) = coords::parse_coordinates(&core.markup.coords);
            if !lat.is_empty() && !lon.is_empty() {
                return (lat, lon);
            }
        }
        geocoder.lookup(&core.original_title)
    }

    fn continents(&self, core: &EntityCore) -> String {
        let value = core.field("světadíl");
        if value.is_empty() {
            return String::new();
        }
        get_continent(&redundant(value))
    }

    fn specific_aliases(&self, core: &EntityCore, langmap: &LangMap) -> Vec<LangAlias> {
        if core.kind() == "person" {
            return Vec::new();
        }
        let Some((lang, value)) = core
            .markup
            .fields
            .iter()
            .find_map(|(key, value)| OFFICIAL_NAME.captures(key).map(|caps| (caps[1].to_string(), value)))
        else {
            return Vec::new();
        };

        let alias = NBSP.replace_all(value, " ");
        let alias = ALIAS_PIPED_LINK.replace_all(&alias, "$1");
        let alias = ALIAS_LINK.replace_all(&alias, "$1");
        if let Some(caps) = FOREIGN_NAME.captures(&alias) {
            return vec![(caps[2].to_string(), Some(caps[1].to_string()))];
        }
        let alias = SMALL_ANY.replace_all(&alias, "");
        let alias = ITALICS.replace_all(alias.trim(), "");
        let alias = WIDE_GAP.replace_all(&alias, "|");

        let code = langmap.get(&lang).map(str::to_string);
        alias
            .split('|')
            .map(|a| PARENS.replace_all(a, "").trim().to_string())
            .filter(|a| !a.is_empty())
            .map(|a| (a, code.clone()))
            .collect()
    }

    fn person_aliases(&self, core: &EntityCore, gender: &str) -> Vec<LangAlias> {
        let title = &core.title;
        if gender != "F" || title.ends_with("ová") || title.ends_with("ská") || title.ends_with("tá") {
            return Vec::new();
        }
        vec![(format!("{}ová", title), Some("cs".to_string()))]
    }

    fn person_prefix(&self, core: &EntityCore) -> &'static str {
        if FICTIONAL.is_match(&core.categories().join("\n")) {
            return "person:fictional";
        }
        let name = LOCATION_SUFFIX.replace(&core.title, "");
        if let Some(caps) = AND_NEIGHBOURS.captures(&name) {
            if !is_nationality(&caps[1]) || !is_nationality(&caps[2]) {
                return "person:group";
            }
        }
        "person"
    }

    fn person_dates(&self, core: &EntityCore) -> DatePair {
        let date = |keys: &[&str], is_birth: bool| {
            let value = first_field(core, keys);
            if value.is_empty() {
                String::new()
            } else {
                convert_date(&redundant(value), is_birth)
            }
        };
        (date(BIRTH_DATE_KEYS, true), date(DEATH_DATE_KEYS, false))
    }

    /// Later, more specific shapes overwrite what earlier ones found.
    fn sentence_facts(&self, first_sentence: &str) -> SentenceFacts {
        let mut facts = SentenceFacts::default();
        let text = first_sentence;

        for pattern in [&*BORN_YEAR, &*BORN_DATE] {
            if let Some(date) = pattern.captures(text).and_then(|caps| optional(&caps, 1)) {
                facts.birth_date = convert_date(&date, true);
            }
        }

        if let Some(caps) = BORN_DATE_PLACE.captures(text) {
            if let Some(date) = optional(&caps, 1) {
                facts.birth_date = convert_date(&date, true);
            }
            if let Some(place) = optional(&caps, 2) {
                facts.birth_place = get_place(&place);
            }
        }

        for pattern in [&*LIFE_YEARS, &*LIFE_DATES] {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            if let Some(date) = optional(&caps, 1) {
                facts.birth_date = convert_date(&date, true);
            }
            if let Some(place) = optional(&caps, 2) {
                facts.birth_place = get_place(&place);
            }
            if let Some(date) = optional(&caps, 3) {
                facts.death_date = convert_date(&date, false);
            }
            if let Some(place) = optional(&caps, 4) {
                facts.death_place = get_place(&place);
            }
        }
        facts
    }

    fn clean_place(&self, value: &str) -> String {
        get_place(value)
    }

    fn country_prefix(&self, core: &EntityCore) -> &'static str {
        if FORMER_STATES.is_match(&core.categories().join("\n")) {
            "country:former"
        } else {
            "country"
        }
    }

    fn geo_prefix(&self, core: &EntityCore) -> &'static str {
        let infobox = core.infobox_name();
        let title = &core.original_title;
        if PENINSULA_CATEGORY.is_match(&core.categories().join("\n")) || PENINSULA.is_match(title) {
            "geo:peninsula"
        } else if RELIEF_INFOBOXES.contains(&infobox) || RELIEF.is_match(title) {
            "geo:relief"
        } else if infobox == "kontinent" || CONTINENT.is_match(title) {
            "geo:continent"
        } else if infobox == "ostrov" || ISLAND.is_match(title) {
            "geo:island"
        } else if infobox == "vodopád" || WATERFALL.is_match(title) {
            "geo:waterfall"
        } else {
            "geo:unknown"
        }
    }

    fn parse_date(&self, value: &str) -> DatePair {
        (convert_date(&redundant(value), true), String::new())
    }
}
