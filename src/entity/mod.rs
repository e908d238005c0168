//! Knowledge-base entities: the fields every kind shares plus per-kind data.
//!
//! An [`Entity`] is built from one classified page: [`EntityCore`] collects
//! images, the first sentence and aliases; the kind module fills its own
//! columns and refines the prefix (`person:artist`, `geo:island`, ...).

mod aliases;
pub mod event;
pub mod organisation;
pub mod person;
pub mod place;

use lazy_static::lazy_static;
use md5::Md5;
use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha224};

use crate::config::{Keywords, LangMap, Matchers};
use crate::extract::ExtractedMarkup;
use crate::geocode::Geocoder;
use crate::locale::Locale;
use crate::normalize::units;
use crate::unique::AliasSet;
use crate::wikicode;

pub use aliases::remove_lang_templates;

lazy_static! {
    static ref TITLE_QUALIFIER: Regex = Regex::new(r"\s+\(.+?\)\s*$").unwrap();
    static ref TEMPLATE: Regex = Regex::new(r"\{\{.*?\}\}").unwrap();
    static ref PIPED_LINK: Regex = Regex::new(r"\[\[.*?\|([^\|]*?)\]\]").unwrap();
    static ref BRACKETS_QUOTES_EMPTY_PARENS: Regex = Regex::new(r"\[|\]|'|\(\)").unwrap();

    static ref MAPLINK: Regex = Regex::new(r"(?i)\{\{(?:maplink|#property).*?\}\}").unwrap();
    static ref FILE_PREFIX: Regex = Regex::new(r"(?i)file:").unwrap();
    static ref IMAGE_PARAM: Regex = Regex::new(r"(?i)image|photo|[0-9]+").unwrap();
    static ref IMAGE_EXTENSION: Regex = Regex::new(r"(?i)\.(?:jpe?g|png|gif|bmp|ico|tif|tga|svg)").unwrap();
    static ref IMAGE_NAME: Regex =
        Regex::new(r"(?i)^(?:\[\[(?:image:)?)?(.*?(?:jpe?g|png|gif|bmp|ico|tif|tga|svg)).*$").unwrap();

    static ref EXTERNAL_LINK: Regex = Regex::new(r"\[http.*?\s(.+?)\]").unwrap();
    static ref NBSP: Regex = Regex::new(r"&nbsp;").unwrap();
    static ref MEDIA_LINK: Regex = Regex::new(r"(?i)\[\[(?:file|soubor|image):.*?\]\]").unwrap();
    static ref PLAIN_LINK: Regex = Regex::new(r"\[\[([^\|]*?)\]\]").unwrap();
    static ref BRACKETS: Regex = Regex::new(r"\[|\]").unwrap();
    static ref PRONUNCIATION: Regex = Regex::new(r"\{\{(?:IPA|respell|pronunciation).*?\}\}[,;]?").unwrap();
    static ref EMPTY_PARENS: Regex = Regex::new(r"\([\s,;]*\)").unwrap();
    static ref PAREN_OPEN_JUNK: Regex = Regex::new(r"\([\s,;]+").unwrap();
    static ref PAREN_CLOSE_JUNK: Regex = Regex::new(r"[\s,;]+\)").unwrap();
    static ref MULTI_SPACE: Regex = Regex::new(r"[ \t]{2,}").unwrap();
}

/// Shared, read-only state for building entities of one locale.
pub struct Context<'a> {
    pub keywords: &'a Keywords,
    pub matchers: &'a Matchers,
    pub langmap: &'a LangMap,
    pub locale: &'a dyn Locale,
    pub geocoder: &'a dyn Geocoder,
}

/// Templates dropped, piped links reduced to their caption, brackets and
/// quotes removed.
pub fn remove_templates(data: &str) -> String {
    let data = TEMPLATE.replace_all(data, "");
    let data = PIPED_LINK.replace_all(&data, "$1");
    BRACKETS_QUOTES_EMPTY_PARENS.replace_all(&data, "").into_owned()
}

/// Commons path of an image: `wikimedia/commons/a/ab/Name.jpg` where `ab`
/// is the start of the MD5 of the name.
pub fn image_path(image: &str) -> String {
    let image = image.trim().replace(' ', "_");
    let hash = format!("{:x}", Md5::digest(image.as_bytes()));
    format!("wikimedia/commons/{}/{}/{}", &hash[..1], &hash[..2], image)
}

fn generate_eid() -> String {
    let seed: u32 = rand::thread_rng().gen_range(1..=1_000_000);
    let digest = format!("{:x}", Sha224::digest(seed.to_string().as_bytes()));
    digest[..10].to_string()
}

/// Link of an article on its edition: spaces become underscores.
pub fn article_link(lang: &str, title: &str) -> String {
    format!("https://{}.wikipedia.org/wiki/{}", lang, title.replace(' ', "_"))
}

/// Fields every entity kind carries.
#[derive(Debug, Clone)]
pub struct EntityCore {
    pub eid: String,
    pub prefix: String,
    /// Title without a trailing parenthesised qualifier.
    pub title: String,
    pub original_title: String,
    pub lang: String,
    pub link: String,
    pub redirects: Vec<String>,
    pub description: String,
    pub first_sentence: String,
    pub images: Vec<String>,
    pub aliases: AliasSet,
    pub markup: ExtractedMarkup,
}

impl EntityCore {
    pub fn new(
        ctx: &Context,
        kind: &str,
        title: &str,
        markup: ExtractedMarkup,
        redirects: Vec<String>,
        description: &str,
    ) -> Self {
        let lang = ctx.locale.code().to_string();
        let mut core = EntityCore {
            eid: generate_eid(),
            prefix: kind.to_string(),
            title: TITLE_QUALIFIER.replace(title, "").into_owned(),
            original_title: title.to_string(),
            link: article_link(&lang, title),
            lang,
            redirects,
            description: description.trim().to_string(),
            first_sentence: String::new(),
            images: Vec::new(),
            aliases: AliasSet::new(),
            markup,
        };
        core.extract_images(ctx.keywords);
        core.first_sentence = first_sentence(&core.markup.paragraph, &ctx.matchers.sentence_lead);
        if core.first_sentence.is_empty() {
            core.first_sentence = core.description.clone();
        } else {
            core.description = wikicode::strip_code(&core.first_sentence);
        }
        core
    }

    /// Kind without the variant suffix ("person" for "person:artist").
    pub fn kind(&self) -> &str {
        self.prefix.split(':').next().unwrap_or_default()
    }

    /// Infobox value for `key`, "" when absent.
    pub fn field(&self, key: &str) -> &str {
        self.markup.fields.get(key).unwrap_or_default()
    }

    /// First non-empty infobox value among `keys`.
    pub fn first_value<S: AsRef<str>>(&self, keys: &[S]) -> &str {
        keys.iter()
            .filter_map(|k| self.markup.fields.get(k.as_ref()))
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }

    /// Every non-empty infobox value among `keys`, in key order.
    pub fn values<S: AsRef<str>>(&self, keys: &[S]) -> Vec<&str> {
        keys.iter()
            .filter_map(|k| self.markup.fields.get(k.as_ref()))
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn infobox_name(&self) -> &str {
        &self.markup.infobox_name
    }

    pub fn categories(&self) -> &[String] {
        &self.markup.categories
    }

    fn extract_images(&mut self, keywords: &Keywords) {
        let mut images: Vec<String> = self
            .markup
            .images
            .iter()
            .map(|img| image_path(img))
            .collect();

        for value in self.values(&keywords.image) {
            let value = value.replace('\n', "");
            if value.starts_with("http") || MAPLINK.is_match(&value) {
                continue;
            }
            images.extend(infobox_images(&value).iter().map(|img| image_path(img)));
        }
        self.images = images;
    }

    /// Area in km² from the locale's area keys.
    pub fn area(&self, keywords: &Keywords) -> String {
        for key in &keywords.area_km2 {
            let area = units::fix_area(self.field(key));
            if !area.is_empty() {
                return area;
            }
        }
        for key in &keywords.area_sqmi {
            let area = units::fix_area(self.field(key));
            if !area.is_empty() {
                return units::convert_text(&area, "sqmi");
            }
        }
        for key in &keywords.area_other {
            let value = self.field(key);
            if value.is_empty() {
                continue;
            }
            if let Some(area) = units::area_from_text(value) {
                return area;
            }
        }
        String::new()
    }

    pub fn population(&self, ctx: &Context) -> String {
        let value = self.first_value(&ctx.keywords.population);
        if value.is_empty() {
            return String::new();
        }
        units::population(value, |word| ctx.locale.coefficient(word))
    }

    /// Tab-separated record: shared columns followed by `columns`.
    pub fn serialize(&self, columns: &[String]) -> String {
        let mut record = vec![
            self.eid.clone(),
            self.prefix.clone(),
            self.title.clone(),
            self.aliases.serialize(&self.title),
            self.redirects.join("|"),
            self.description.clone(),
            self.original_title.clone(),
            self.images.join("|"),
            self.link.clone(),
        ];
        record.extend(columns.iter().cloned());
        record.join("\t").replace('\n', "")
    }
}

/// Image names in an infobox image value.
fn infobox_images(value: &str) -> Vec<String> {
    let value = FILE_PREFIX.replace_all(value, "");
    let mut images: Vec<String> = Vec::new();
    if value.contains(['{', '}']) {
        for template in wikicode::parse_templates(&value) {
            for param in &template.params {
                if IMAGE_PARAM.is_match(&param.name) && IMAGE_EXTENSION.is_match(&param.value) {
                    images.push(param.value.trim().to_string());
                }
            }
        }
    }
    if images.is_empty() {
        images.push(value.into_owned());
    }
    images
        .iter()
        .map(|img| IMAGE_NAME.replace(img, "$1").trim().replace(' ', "_"))
        .filter(|img| !img.is_empty())
        .collect()
}

/// Is the byte before `idx` in `chars` such that a period at `idx` ends an
/// abbreviation or an initial ("Jr.", "J.")?
fn is_abbreviation(chars: &[char], idx: usize) -> bool {
    let before = |n: usize| idx.checked_sub(n).map(|i| chars[i]);
    let initial = matches!(
        (before(2), before(1)),
        (Some(a), Some(b)) if (a.is_whitespace() || a == '.' || a == '"') && b.is_ascii_uppercase()
    );
    let short_word = matches!(
        (before(3), before(2), before(1)),
        (Some(a), Some(b), Some(c)) if a.is_whitespace() && b.is_ascii_uppercase() && c.is_ascii_lowercase()
    );
    initial || short_word
}

/// First sentence of the lead paragraph: from the bold subject through the
/// first full stop after the copula, with links, pronunciations and empty
/// parentheses cleaned out.
pub fn first_sentence(paragraph: &str, lead: &Regex) -> String {
    let mut paragraph = paragraph.trim().to_string();
    if paragraph.is_empty() {
        return String::new();
    }
    if !paragraph.ends_with('.') {
        paragraph.push('.');
    }
    let paragraph = EXTERNAL_LINK.replace_all(&paragraph, "$1");

    let Some(m) = lead.find(&paragraph) else {
        return String::new();
    };

    let chars: Vec<(usize, char)> = paragraph.char_indices().collect();
    let plain: Vec<char> = chars.iter().map(|&(_, c)| c).collect();
    let start_idx = chars.partition_point(|&(b, _)| b < m.end());
    let mut end = None;
    for (idx, &(byte, c)) in chars.iter().enumerate().skip(start_idx) {
        if c == '\n' {
            break;
        }
        if c == '.' && !is_abbreviation(&plain, idx) {
            end = Some(byte + 1);
            break;
        }
    }
    let Some(end) = end else {
        return String::new();
    };

    let sentence = &paragraph[m.start()..end];
    let sentence = NBSP.replace_all(sentence, " ");
    let sentence = MEDIA_LINK.replace_all(&sentence, "");
    let sentence = PLAIN_LINK.replace_all(&sentence, "$1");
    let sentence = PIPED_LINK.replace_all(&sentence, "$1");
    let sentence = BRACKETS.replace_all(&sentence, "");
    let sentence = PRONUNCIATION.replace_all(&sentence, "");
    let sentence = EMPTY_PARENS.replace_all(&sentence, "");
    let sentence = PAREN_OPEN_JUNK.replace_all(&sentence, "(");
    let sentence = PAREN_CLOSE_JUNK.replace_all(&sentence, ")");
    MULTI_SPACE.replace_all(&sentence, " ").into_owned()
}

/// Kind-specific columns.
#[derive(Debug, Clone)]
pub enum KindData {
    Person(person::Person),
    Country(place::Country),
    Settlement(place::Settlement),
    Waterarea(place::Waterarea),
    Watercourse(place::Watercourse),
    Geo(place::Geo),
    Organisation(organisation::Organisation),
    Event(event::Event),
}

impl KindData {
    fn columns(&self, prefix: &str) -> Vec<String> {
        match self {
            KindData::Person(p) => p.columns(prefix),
            KindData::Country(c) => c.columns(),
            KindData::Settlement(s) => s.columns(),
            KindData::Waterarea(w) => w.columns(),
            KindData::Watercourse(w) => w.columns(),
            KindData::Geo(g) => g.columns(prefix),
            KindData::Organisation(o) => o.columns(),
            KindData::Event(e) => e.columns(),
        }
    }
}

/// One knowledge-base record.
#[derive(Debug, Clone)]
pub struct Entity {
    pub core: EntityCore,
    pub data: KindData,
}

/// Kinds that [`Entity::build`] knows how to fill.
pub const KINDS: &[&str] = &[
    "person",
    "country",
    "settlement",
    "waterarea",
    "watercourse",
    "geo",
    "organisation",
    "event",
];

impl Entity {
    /// Build the record for a page classified as `kind`. `None` for an
    /// unknown kind.
    pub fn build(
        ctx: &Context,
        kind: &str,
        title: &str,
        markup: ExtractedMarkup,
        redirects: Vec<String>,
        description: &str,
    ) -> Option<Self> {
        if !KINDS.contains(&kind) {
            return None;
        }
        let mut core = EntityCore::new(ctx, kind, title, markup, redirects, description);
        let data = match kind {
            "person" => KindData::Person(person::Person::assign(&mut core, ctx)),
            "country" => KindData::Country(place::Country::assign(&mut core, ctx)),
            "settlement" => KindData::Settlement(place::Settlement::assign(&mut core, ctx)),
            "waterarea" => KindData::Waterarea(place::Waterarea::assign(&mut core, ctx)),
            "watercourse" => KindData::Watercourse(place::Watercourse::assign(&mut core, ctx)),
            "geo" => KindData::Geo(place::Geo::assign(&mut core, ctx)),
            "organisation" => KindData::Organisation(organisation::Organisation::assign(&mut core, ctx)),
            _ => KindData::Event(event::Event::assign(&mut core, ctx)),
        };
        Some(Entity { core, data })
    }

    pub fn serialize(&self) -> String {
        self.core.serialize(&self.data.columns(&self.core.prefix))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::Schema;
    use crate::extract::{self, InfoboxFields};
    use crate::geocode::NoGeocoder;
    use crate::locale;
    use std::path::Path;

    pub struct Fixture {
        pub schema: Schema,
        pub langmap: LangMap,
        pub locale: Box<dyn Locale>,
    }

    impl Fixture {
        pub fn new(lang: &str) -> Self {
            let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("schema");
            let schema = Schema::load(&dir.join(format!("patterns_{}.yaml", lang))).unwrap();
            let langmap = LangMap::load(&dir.join(format!("langmap_{}.json", lang))).unwrap();
            Fixture {
                schema,
                langmap,
                locale: locale::for_code(lang).unwrap(),
            }
        }

        pub fn ctx(&self) -> Context<'_> {
            Context {
                keywords: &self.schema.keywords,
                matchers: &self.schema.matchers,
                langmap: &self.langmap,
                locale: self.locale.as_ref(),
                geocoder: &NoGeocoder,
            }
        }

        /// Core over a hand-built infobox.
        pub fn core(&self, kind: &str, title: &str, fields: &[(&str, &str)]) -> EntityCore {
            let markup = ExtractedMarkup {
                infobox_found: true,
                fields: fields.iter().map(|&(k, v)| (k, v)).collect::<InfoboxFields>(),
                ..Default::default()
            };
            EntityCore::new(&self.ctx(), kind, title, markup, Vec::new(), "")
        }

        /// Core over raw article markup.
        pub fn core_from_markup(&self, kind: &str, title: &str, content: &str) -> EntityCore {
            let markup = extract::extract(content, &self.schema.matchers);
            EntityCore::new(&self.ctx(), kind, title, markup, Vec::new(), "")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;

    fn lead() -> Regex {
        Regex::new(r"'''.*?'''.*?(?: (?:is|was|are|were) )").unwrap()
    }

    // ─────────────────────────────────────────────────────────────
    // First sentence
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn sentence_stops_after_copula() {
        let paragraph = "'''Prague''' is the capital of the [[Czech Republic]]. It has 1.3 million people.";
        assert_eq!(
            first_sentence(paragraph, &lead()),
            "'''Prague''' is the capital of the Czech Republic."
        );
    }

    #[test]
    fn sentence_skips_initials_and_abbreviations() {
        let paragraph = "'''John F. Kennedy''' was president of the U.S. after Dwight D. Eisenhower and Mr. Jr. Smith. Next.";
        assert_eq!(
            first_sentence(paragraph, &lead()),
            "'''John F. Kennedy''' was president of the U.S. after Dwight D. Eisenhower and Mr. Jr. Smith."
        );
    }

    #[test]
    fn sentence_cleanup() {
        let paragraph = "'''Nice''' ({{IPA-fr|nis}}; [[File:X.ogg|listen]]) is a [[city|town]]&nbsp;in [[France]]";
        assert_eq!(first_sentence(paragraph, &lead()), "'''Nice''' is a town in France.");
    }

    #[test]
    fn sentence_without_subject_is_empty() {
        assert_eq!(first_sentence("Prague is a city.", &lead()), "");
        assert_eq!(first_sentence("", &lead()), "");
    }

    // ─────────────────────────────────────────────────────────────
    // Shared fields
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn helpers() {
        assert_eq!(remove_templates("[[Prague|Praha]] {{cn}}(capital)"), "Praha (capital)");
        assert_eq!(remove_templates("a() b"), "a b");
        assert_eq!(article_link("en", "New York City"), "https://en.wikipedia.org/wiki/New_York_City");
        let path = image_path("Prague skyline.jpg");
        assert!(path.starts_with("wikimedia/commons/"));
        assert!(path.ends_with("/Prague_skyline.jpg"));
        let parts: Vec<&str> = path.split('/').collect();
        assert_eq!(parts[2].len(), 1);
        assert!(parts[3].starts_with(parts[2]));
    }

    #[test]
    fn core_title_and_link() {
        let fixture = Fixture::new("en");
        let core = fixture.core("settlement", "Springfield (Oregon)", &[]);
        assert_eq!(core.title, "Springfield");
        assert_eq!(core.original_title, "Springfield (Oregon)");
        assert_eq!(core.link, "https://en.wikipedia.org/wiki/Springfield_(Oregon)");
        assert_eq!(core.eid.len(), 10);
        assert!(core.eid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn own_sentence_wins_over_external_description() {
        let fixture = Fixture::new("en");
        let content = "'''Prague''' is the capital of the [[Czech Republic]]. It is old.";
        let markup = crate::extract::extract(content, &fixture.schema.matchers);
        let core = EntityCore::new(&fixture.ctx(), "settlement", "Prague", markup, Vec::new(), "Some external sentence.");
        assert!(core.description.starts_with("Prague is the capital"), "{}", core.description);
        assert!(core.first_sentence.starts_with("'''Prague''' is the capital"));

        let core = EntityCore::new(
            &fixture.ctx(),
            "settlement",
            "Prague",
            ExtractedMarkup::default(),
            Vec::new(),
            " Some external sentence. ",
        );
        assert_eq!(core.description, "Some external sentence.");
        assert_eq!(core.first_sentence, "Some external sentence.");
    }

    #[test]
    fn infobox_image_values() {
        assert_eq!(infobox_images("File:Prague Castle.jpg"), vec!["Prague_Castle.jpg"]);
        assert_eq!(
            infobox_images("[[Image:Old Town.png|200px]]"),
            vec!["Old_Town.png"]
        );
        assert_eq!(
            infobox_images("{{Photomontage|photo1a=A b.jpg|photo2a=C.svg|size=200}}"),
            vec!["A_b.jpg", "C.svg"]
        );
    }

    #[test]
    fn core_images_skip_urls_and_maps() {
        let fixture = Fixture::new("en");
        let core = fixture.core("settlement", "X", &[("image", "http://example.org/a.jpg")]);
        assert!(core.images.is_empty());
        let core = fixture.core("settlement", "X", &[("image", "{{maplink|frame=yes}}")]);
        assert!(core.images.is_empty());
        let core = fixture.core("settlement", "X", &[("image_skyline", "Skyline.jpg")]);
        assert_eq!(core.images.len(), 1);
    }

    #[test]
    fn area_fallbacks() {
        let fixture = Fixture::new("en");
        let kw = &fixture.schema.keywords;
        let core = fixture.core("country", "X", &[("area_km2", "1 000 000")]);
        assert_eq!(core.area(kw), "1000000");
        let core = fixture.core("country", "X", &[("area_sq_mi", "10")]);
        assert_eq!(core.area(kw), "25.9");
        let core = fixture.core("country", "X", &[("area", "{{convert|10|km2|sqmi}}")]);
        assert_eq!(core.area(kw), "10");
        let core = fixture.core("country", "X", &[]);
        assert_eq!(core.area(kw), "");
    }

    #[test]
    fn serialize_joins_shared_columns() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("country", "Ruritania", &[]);
        core.redirects = vec!["Ruritanian Kingdom".into(), "Rur".into()];
        core.description = "A\nkingdom.".into();
        core.aliases.add("Ruritania", Some("en"));
        core.aliases.add("Kingdom of Ruritania", Some("en"));
        let line = core.serialize(&["1.0".to_string(), "2.0".to_string()]);
        let cols: Vec<&str> = line.split('\t').collect();
        assert_eq!(cols.len(), 11);
        assert_eq!(cols[1], "country");
        assert_eq!(cols[3], "Kingdom of Ruritania#lang=en");
        assert_eq!(cols[4], "Ruritanian Kingdom|Rur");
        assert_eq!(cols[5], "Akingdom.");
        assert_eq!(cols[8], "https://en.wikipedia.org/wiki/Ruritania");
        assert_eq!(cols[10], "2.0");
    }
}
