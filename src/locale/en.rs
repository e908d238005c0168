//! English Wikipedia.

use lazy_static::lazy_static;
use regex::Regex;

use super::{has_prefix, LangAlias, Locale, SentenceFacts};
use crate::config::LangMap;
use crate::entity::EntityCore;
use crate::geocode::Geocoder;
use crate::normalize::coords::{self, Coordinates};
use crate::normalize::date::{self, DatePair};

const NON_ENTITY_PREFIXES: &[&str] = &[
    "wikipedia:",
    "file",
    "mediawiki:",
    "template:",
    "help:",
    "category:",
    "special:",
    "portal:",
    "module:",
    "draft:",
    "user:",
    "list of",
    "geography of",
    "history of",
    "economy of",
    "politics of",
    "culture of",
    "bibliography of",
    "outline of",
    "music of",
    "flag of",
    "index of",
    "timeline of",
];

const CONTINENTS: &[&str] = &[
    "Asia",
    "Africa",
    "Europe",
    "North America",
    "South America",
    "Australia",
    "Oceania",
    "Antarctica",
];

lazy_static! {
    static ref MONTH_TITLE: Regex = Regex::new(
        r"(?i)^(?:january|february|march|april|may|june|july|august|september|october|november|december)(?:\s[0-9]+)?$"
    )
    .unwrap();
    static ref BILLION: Regex = Regex::new(r"(?i)billion").unwrap();

    static ref LOCATION_CONTINENTS: Vec<Regex> = [
        r"Asia",
        r"Africa",
        r"Europe",
        r"North[^,]+America",
        r"South[^,]+America",
        r"Australia",
        r"Oceania",
        r"Antarctica",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
    static ref SENTENCE_CONTINENTS: Vec<Regex> = CONTINENTS
        .iter()
        .map(|c| Regex::new(&format!(r"\b{}\b", c)).unwrap())
        .collect();

    static ref GROUP_TITLE: Regex = Regex::new(r".*\s(?:,|and|&)\s.*").unwrap();
    static ref GANG: Regex = Regex::new(r"(?i)gang").unwrap();
    static ref ARTIST: Regex = Regex::new(r"(?i)artist").unwrap();

    static ref PARENTHESIS: Regex = Regex::new(r"\((.*?)\)").unwrap();
    static ref DASH_TEMPLATE: Regex =
        Regex::new(r"&ndash;|\{\{spaced ndash\}\}|\{\{snd\}\}|\{\{ndash\}\}|\{\{spaced en dash\}\}|\{\{snds\}\}|\{\{spnd\}\}")
            .unwrap();
    static ref SPACE_TEMPLATE: Regex = Regex::new(r"\{\{Spaces\}\}|\{\{nbsp\}\}").unwrap();
    static ref LINK: Regex = Regex::new(r"\[\[.*?\]\]").unwrap();
    static ref TEMPLATE_SEMI: Regex = Regex::new(r"\{\{.*?\}\};?").unwrap();
    static ref IN_PLACE: Regex = Regex::new(r"\s+in\s+(.*)").unwrap();
    static ref BORN_IN: Regex = Regex::new(r".*?born.*?\s+in\s+([^\d]+)").unwrap();
    static ref DIED_IN: Regex = Regex::new(r".*?died.*?\s+in\s+([^\d]+)").unwrap();

    static ref FLAG_AND_NAME: Regex = Regex::new(r"(?i)\{\{Vlajka a název\|(.*?)(?:\|.*?)?\}\}").unwrap();
    static ref FLAGICON: Regex = Regex::new(r"(?i)\{\{flagicon\|(.*?)(?:\|.*?)?\}\}").unwrap();
    static ref SMALL: Regex = Regex::new(r"(?i)\{\{(?:malé|small)\|(.*?)\}\}").unwrap();
    static ref NOWRAP: Regex = Regex::new(r"\{\{nowrap\|(.*?)\}\}").unwrap();
    static ref MEDIA_LINK: Regex = Regex::new(r"(?i)\[\[(?:file|soubor|image):.*?\]\]").unwrap();
    static ref TEMPLATE: Regex = Regex::new(r"\{\{.*?\}\}").unwrap();
    static ref PIPED_LINK: Regex = Regex::new(r"\[\[[^\]]*?\|([^\|]*?)\]\]").unwrap();
    static ref BRACKETS: Regex = Regex::new(r"\[|\]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    static ref FORMER_COUNTRIES: Regex = Regex::new(r"(?i)former.*?countries").unwrap();
    static ref GEO_NAME: Regex = Regex::new(r"(?i)(waterfall|islands?|mountain|peninsulas?|continent)").unwrap();
}

#[derive(Debug, Default, Clone, Copy)]
pub struct English;

/// Place cleanup shared by infobox values: flags, small print and media
/// dropped, links reduced to their caption.
fn fix_place(value: &str) -> String {
    let place = FLAG_AND_NAME.replace_all(value, "$1");
    let place = FLAGICON.replace_all(&place, "$1");
    let place = SMALL.replace_all(&place, "$1");
    let place = NOWRAP.replace_all(&place, "$1");
    let place = MEDIA_LINK.replace_all(&place, "");
    let place = TEMPLATE.replace_all(&place, "");
    let place = PIPED_LINK.replace_all(&place, "$1");
    let place = BRACKETS.replace_all(&place, "");
    WHITESPACE.replace_all(&place, " ").trim().to_string()
}

fn first_date(text: &str) -> String {
    date::extract_date(text).0
}

impl Locale for English {
    fn code(&self) -> &'static str {
        "en"
    }

    fn is_entity(&self, title: &str) -> bool {
        let lower = title.to_lowercase();
        !has_prefix(&lower, NON_ENTITY_PREFIXES) && !MONTH_TITLE.is_match(title)
    }

    fn coefficient(&self, value: &str) -> f64 {
        if BILLION.is_match(value) {
            1e9
        } else {
            1.0
        }
    }

    fn coordinates(&self, core: &EntityCore, _geocoder: &dyn Geocoder) -> Coordinates {
        for source in [core.field("coordinates"), core.markup.coords.as_str()] {
            if source.is_empty() {
                continue;
            }
            let (lat, lon) = coords::parse_coordinates(source);
            if !lat.is_empty() && !lon.is_empty() {
                return (lat, lon);
            }
        }
        coords::empty()
    }

    fn continents(&self, core: &EntityCore) -> String {
        if core.kind() == "waterarea" {
            let location = core.field("location");
            if !location.is_empty() {
                return CONTINENTS
                    .iter()
                    .zip(LOCATION_CONTINENTS.iter())
                    .filter(|(_, pattern)| pattern.is_match(location))
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join("|");
            }
        }
        CONTINENTS
            .iter()
            .zip(SENTENCE_CONTINENTS.iter())
            .find(|(_, pattern)| pattern.is_match(&core.first_sentence))
            .map(|(name, _)| name.to_string())
            .unwrap_or_default()
    }

    fn specific_aliases(&self, _core: &EntityCore, _langmap: &LangMap) -> Vec<LangAlias> {
        Vec::new()
    }

    fn person_aliases(&self, _core: &EntityCore, _gender: &str) -> Vec<LangAlias> {
        Vec::new()
    }

    fn person_prefix(&self, core: &EntityCore) -> &'static str {
        let categories = core.categories();
        if GROUP_TITLE.is_match(&core.title)
            || categories.join(" ").to_lowercase().contains("groups of")
            || GANG.is_match(&core.title)
        {
            return "person:group";
        }
        if core.infobox_name().contains("character")
            || core.description.contains("fictional")
            || categories.iter().any(|c| c.to_lowercase().contains("fictional"))
        {
            return "person:fictional";
        }
        if core.infobox_name().to_lowercase() == "artist" || categories.iter().any(|c| ARTIST.is_match(c)) {
            return "person:artist";
        }
        "person"
    }

    fn person_dates(&self, core: &EntityCore) -> DatePair {
        let mut birth = String::new();
        let mut death = String::new();

        let value = core.field("birth_date").trim();
        if !value.is_empty() {
            birth = first_date(value);
        }

        let value = core.field("death_date").trim();
        if !value.is_empty() {
            let (first, second) = date::extract_date(value);
            if second.is_empty() {
                death = first;
            } else {
                if birth.is_empty() {
                    birth = first;
                }
                death = second;
            }
        }
        (birth, death)
    }

    fn sentence_facts(&self, first_sentence: &str) -> SentenceFacts {
        let mut facts = SentenceFacts::default();
        let Some(caps) = PARENTHESIS.captures(first_sentence) else {
            return facts;
        };

        let group = DASH_TEMPLATE.replace_all(&caps[1], "–");
        let group = SPACE_TEMPLATE.replace_all(&group, " ");
        let group = LINK.replace_all(&group, "");
        let group = TEMPLATE_SEMI.replace_all(&group, "");
        let parts: Vec<&str> = group.trim().split('–').collect();

        if let [born, died] = parts[..] {
            let mut born_date = born.replace("born", "").trim().to_string();
            let died_date = died.replace("died", "").trim().to_string();
            if died_date.contains("BC") && !born_date.contains("BC") {
                born_date.push_str(" BC");
            }
            facts.birth_date = first_date(&born_date);
            facts.death_date = first_date(&died_date);

            if let Some(place) = IN_PLACE.captures(born) {
                facts.birth_place = place[1].trim().to_string();
            }
            if let Some(place) = IN_PLACE.captures(died) {
                facts.death_place = place[1].trim().to_string();
            }
        } else {
            let text = parts[0];
            if text.contains("born") {
                facts.birth_date = first_date(text.replace("born", "").trim());
            } else if text.contains("died") {
                facts.death_date = first_date(text.replace("died", "").trim());
            } else {
                facts.birth_date = first_date(text);
            }

            if let Some(place) = BORN_IN.captures(text) {
                facts.birth_place = place[1].trim().to_string();
            }
            if let Some(place) = DIED_IN.captures(text) {
                facts.death_place = place[1].trim().to_string();
            }
        }
        facts
    }

    fn clean_place(&self, value: &str) -> String {
        fix_place(value)
    }

    fn country_prefix(&self, core: &EntityCore) -> &'static str {
        let former = core
            .categories()
            .iter()
            .filter(|c| !c.contains("developed"))
            .any(|c| FORMER_COUNTRIES.is_match(c));
        if former {
            "country:former"
        } else {
            "country"
        }
    }

    fn geo_prefix(&self, core: &EntityCore) -> &'static str {
        let name = GEO_NAME
            .captures(core.infobox_name())
            .map(|caps| caps[1].to_lowercase())
            .unwrap_or_default();
        match name.as_str() {
            "island" | "islands" => return "geo:island",
            "mountain" => return "geo:relief",
            "peninsula" | "peninsulas" => return "geo:peninsula",
            "waterfall" => return "geo:waterfall",
            "continent" => return "geo:continent",
            _ => {}
        }

        let categories = core.categories().join(" ").to_lowercase();
        if categories.contains("mountain ranges") || categories.contains("mountains") {
            "geo:relief"
        } else if categories.contains("waterfalls") {
            "geo:waterfall"
        } else if categories.contains("islands") || categories.contains("atols") {
            "geo:island"
        } else if categories.contains("peninsulas") {
            "geo:peninsula"
        } else {
            "geo:unknown"
        }
    }

    fn parse_date(&self, value: &str) -> DatePair {
        date::extract_date(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_support::Fixture;

    #[test]
    fn non_entity_titles() {
        let en = English;
        assert!(en.is_entity("Prague"));
        assert!(!en.is_entity("List of rivers of Europe"));
        assert!(!en.is_entity("Template:Infobox"));
        assert!(!en.is_entity("Category:Rivers"));
        assert!(!en.is_entity("March 3"));
        assert!(!en.is_entity("History of Prague"));
        assert!(en.is_entity("Mayflower"));
    }

    #[test]
    fn coefficients() {
        assert_eq!(English.coefficient("1.3 billion"), 1e9);
        assert_eq!(English.coefficient("1,300"), 1.0);
    }

    #[test]
    fn places() {
        assert_eq!(fix_place("[[London]], England"), "London, England");
        assert_eq!(
            fix_place("{{flagicon|UK}} [[Marylebone|Marylebone, London]]"),
            "UK Marylebone, London"
        );
        assert_eq!(fix_place("[[File:Flag.svg|20px]] {{small|near}} Paris"), "near Paris");
    }

    #[test]
    fn facts_from_one_sided_parenthesis() {
        let facts = English.sentence_facts("'''Ann Smith''' (born 12 June 1950 in Leeds) is a writer.");
        assert_eq!(facts.birth_date, "1950-06-12");
        assert_eq!(facts.birth_place, "Leeds");
        assert_eq!(facts.death_date, "");

        let facts = English.sentence_facts("'''Bob''' (died 1 May 1901) was a king.");
        assert_eq!(facts.death_date, "1901-05-01");
        assert_eq!(facts.birth_date, "");
    }

    #[test]
    fn facts_with_dash_template() {
        let facts = English.sentence_facts("'''Tom''' (1 May 1900{{snd}}2 June 1980) was a poet.");
        assert_eq!(facts.birth_date, "1900-05-01");
        assert_eq!(facts.death_date, "1980-06-02");
    }

    #[test]
    fn sentence_without_parenthesis() {
        assert_eq!(English.sentence_facts("'''Tom''' was a poet."), SentenceFacts::default());
    }

    #[test]
    fn prefixes() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("country", "Ruritania", &[]);
        core.markup.categories.push("Former countries in Europe".to_string());
        assert_eq!(English.country_prefix(&core), "country:former");
        core.markup.categories = vec!["Former least developed countries".to_string()];
        assert_eq!(English.country_prefix(&core), "country");

        let mut core = fixture.core("geo", "K2", &[]);
        core.markup.infobox_name = "mountain".to_string();
        assert_eq!(English.geo_prefix(&core), "geo:relief");
        core.markup.infobox_name = "islands".to_string();
        assert_eq!(English.geo_prefix(&core), "geo:island");
        core.markup.infobox_name = String::new();
        core.markup.categories = vec!["Waterfalls of Norway".to_string()];
        assert_eq!(English.geo_prefix(&core), "geo:waterfall");
        core.markup.categories.clear();
        assert_eq!(English.geo_prefix(&core), "geo:unknown");
    }

    #[test]
    fn continents_from_location_or_sentence() {
        let fixture = Fixture::new("en");
        let core = fixture.core("waterarea", "Lake", &[("location", "North and Central America, Asia")]);
        assert_eq!(English.continents(&core), "Asia|North America");

        let mut core = fixture.core("geo", "Alps", &[]);
        core.first_sentence = "The Alps are a range in Europe and Asia.".to_string();
        assert_eq!(English.continents(&core), "Asia");
    }

    #[test]
    fn coordinates_prefer_infobox() {
        let fixture = Fixture::new("en");
        let core = fixture.core("settlement", "X", &[("coordinates", "{{coord|50|5|N|14|25|E}}")]);
        assert_eq!(
            English.coordinates(&core, &crate::geocode::NoGeocoder),
            ("50.08333".to_string(), "14.41667".to_string())
        );
        let mut core = fixture.core("settlement", "X", &[]);
        core.markup.coords = "{{coord|41.2|-80.4}}".to_string();
        assert_eq!(
            English.coordinates(&core, &crate::geocode::NoGeocoder),
            ("41.2".to_string(), "-80.4".to_string())
        );
    }
}
