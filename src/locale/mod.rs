//! Per-language behaviour: title filters, number words, coordinate sources,
//! dates and prefix rules that differ between Wikipedia editions.

mod cs;
mod en;

use crate::config::LangMap;
use crate::entity::EntityCore;
use crate::error::{KbError, Result};
use crate::geocode::Geocoder;
use crate::normalize::coords::Coordinates;
use crate::normalize::date::DatePair;

pub use cs::Czech;
pub use en::English;

/// Dates and places recovered from the parenthesis of a person's first sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceFacts {
    pub birth_date: String,
    pub death_date: String,
    pub birth_place: String,
    pub death_place: String,
}

/// An alias with an optional language code.
pub type LangAlias = (String, Option<String>);

pub trait Locale: Send + Sync {
    /// Wikipedia edition code ("en", "cs").
    fn code(&self) -> &'static str;

    /// Whether a page title can name an entity (not a list, a namespace page or a date).
    fn is_entity(&self, title: &str) -> bool;

    /// Multiplier for a number word in a population value.
    fn coefficient(&self, value: &str) -> f64;

    fn coordinates(&self, core: &EntityCore, geocoder: &dyn Geocoder) -> Coordinates;

    /// Continents joined by `|`.
    fn continents(&self, core: &EntityCore) -> String;

    /// Extra aliases that only this edition's markup carries.
    fn specific_aliases(&self, core: &EntityCore, langmap: &LangMap) -> Vec<LangAlias>;

    /// Name forms derived from a person's title and gender.
    fn person_aliases(&self, core: &EntityCore, gender: &str) -> Vec<LangAlias>;

    fn person_prefix(&self, core: &EntityCore) -> &'static str;

    /// Birth and death dates from the infobox.
    fn person_dates(&self, core: &EntityCore) -> DatePair;

    fn sentence_facts(&self, first_sentence: &str) -> SentenceFacts;

    /// Cleanup for a birth or death place value.
    fn clean_place(&self, value: &str) -> String;

    fn country_prefix(&self, core: &EntityCore) -> &'static str;

    fn geo_prefix(&self, core: &EntityCore) -> &'static str;

    /// One or two dates from an organisation or event field.
    fn parse_date(&self, value: &str) -> DatePair;
}

/// Locale for an edition code. "cz" is accepted as an alias of "cs".
pub fn for_code(code: &str) -> Result<Box<dyn Locale>> {
    match code {
        "en" => Ok(Box::new(English)),
        "cs" | "cz" => Ok(Box::new(Czech)),
        other => Err(KbError::UnsupportedLocale(other.to_string())),
    }
}

/// Canonical edition code, mapping the legacy "cz" to "cs".
pub fn canonical_code(code: &str) -> &str {
    match code {
        "cz" => "cs",
        other => other,
    }
}

/// Does the lowercased `title` start with any of `prefixes`?
fn has_prefix(title: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| title.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry() {
        assert_eq!(for_code("en").unwrap().code(), "en");
        assert_eq!(for_code("cz").unwrap().code(), "cs");
        assert!(matches!(for_code("xx"), Err(KbError::UnsupportedLocale(_))));
        assert_eq!(canonical_code("cz"), "cs");
    }
}
