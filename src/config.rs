//! Run-wide lookup tables: identification patterns, keyword lists, the
//! language map and the precomputed redirect / first-sentence maps.
//!
//! Everything here is loaded once at startup and shared read-only by every
//! worker. Missing pattern or language files are fatal; missing redirect and
//! first-sentence dumps are not.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::classify::{KindPatterns, PatternTable};
use crate::error::{KbError, Result};

// === Patterns YAML structures ===

#[derive(Debug, Deserialize)]
struct PatternsFile {
    identification: Vec<KindSpec>,
    keywords: Keywords,
}

#[derive(Debug, Deserialize)]
struct KindSpec {
    kind: String,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default, rename = "!categories")]
    neg_categories: Vec<String>,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default, rename = "!names")]
    neg_names: Vec<String>,
    #[serde(default)]
    titles: Vec<String>,
    #[serde(default, rename = "!titles")]
    neg_titles: Vec<String>,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default, rename = "!fields")]
    neg_fields: Vec<String>,
}

/// Infobox key lists and free-form patterns, per locale.
///
/// Key lists are tried in order; the first non-empty value usually wins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Keywords {
    pub disambig_pattern: String,
    pub category_pattern: String,

    pub area_km2: Vec<String>,
    pub area_sqmi: Vec<String>,
    pub area_other: Vec<String>,
    pub population: Vec<String>,
    pub image: Vec<String>,

    /// Verbs that end the subject of a first sentence ("is", "was", "je", ...).
    pub sentence: Vec<String>,

    pub infobox_name: Vec<String>,
    pub infobox_names: Vec<String>,
    pub native_name_lang: Vec<String>,
    pub native_name: Vec<String>,
    /// Regexes with the language in group 1 and the alias in group 2.
    pub lang_alias_patterns: Vec<String>,

    pub country: Vec<String>,
    pub height: Vec<String>,
    pub source: Vec<String>,
    pub streamflow: Vec<String>,
    pub length: Vec<String>,

    pub birth_place: Vec<String>,
    pub death_place: Vec<String>,
    pub gender: Vec<String>,
    pub male: Vec<String>,
    pub female: Vec<String>,
    pub jobs: Vec<String>,
    pub nationality: Vec<String>,
    #[serde(rename = "type")]
    pub kind_type: Vec<String>,
}

/// Keyword patterns compiled once per run.
#[derive(Debug)]
pub struct Matchers {
    pub disambig: Regex,
    pub category: Regex,
    pub lang_alias: Vec<Regex>,
    /// `'''subject''' ... <verb> ` prefix of a first sentence.
    pub sentence_lead: Regex,
    pub male: Option<Regex>,
    pub female: Option<Regex>,
}

/// Identification table plus keywords for one locale.
#[derive(Debug)]
pub struct Schema {
    pub patterns: PatternTable,
    pub keywords: Keywords,
    pub matchers: Matchers,
}

fn compile(owner: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| KbError::Pattern {
        owner: owner.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_all(owner: &str, patterns: &[String], flags: &str) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| compile(owner, &format!("{}{}", flags, p)))
        .collect()
}

/// Whole-word alternation of literal words, or `None` for an empty list.
fn word_alternation(owner: &str, words: &[String]) -> Result<Option<Regex>> {
    if words.is_empty() {
        return Ok(None);
    }
    let alternation: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    compile(owner, &format!(r"(?i)\b(?:{})\b", alternation.join("|"))).map(Some)
}

impl KindSpec {
    fn compile(self) -> Result<KindPatterns> {
        let owner = self.kind.clone();
        Ok(KindPatterns {
            categories: compile_all(&owner, &self.categories, "(?i)")?,
            neg_categories: compile_all(&owner, &self.neg_categories, "(?i)")?,
            names: compile_all(&owner, &self.names, "(?i)")?,
            neg_names: compile_all(&owner, &self.neg_names, "(?i)")?,
            titles: compile_all(&owner, &self.titles, "(?i)")?,
            neg_titles: compile_all(&owner, &self.neg_titles, "(?i)")?,
            fields: self.fields,
            neg_fields: self.neg_fields,
            kind: self.kind,
        })
    }
}

impl Matchers {
    fn compile(keywords: &Keywords) -> Result<Self> {
        let verbs: Vec<String> = keywords.sentence.iter().map(|v| regex::escape(v)).collect();
        let lead = format!(r"'''.*?'''.*?(?: (?:{}) )", verbs.join("|"));
        Ok(Matchers {
            disambig: compile("disambig_pattern", &format!("(?i){}", keywords.disambig_pattern))?,
            category: compile("category_pattern", &format!("(?i){}", keywords.category_pattern))?,
            lang_alias: compile_all("lang_alias_patterns", &keywords.lang_alias_patterns, "(?i)")?,
            sentence_lead: compile("sentence", &lead)?,
            male: word_alternation("male", &keywords.male)?,
            female: word_alternation("female", &keywords.female)?,
        })
    }
}

impl Schema {
    pub fn from_yaml(contents: &str, path: &Path) -> Result<Self> {
        let raw: PatternsFile = serde_yaml::from_str(contents).map_err(|source| KbError::Schema {
            path: path.to_path_buf(),
            source,
        })?;
        let kinds = raw
            .identification
            .into_iter()
            .map(KindSpec::compile)
            .collect::<Result<Vec<_>>>()?;
        let matchers = Matchers::compile(&raw.keywords)?;
        Ok(Schema {
            patterns: PatternTable::new(kinds),
            keywords: raw.keywords,
            matchers,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_file(path)?;
        let schema = Self::from_yaml(&contents, path)?;
        info!(path = %path.display(), kinds = schema.patterns.len(), "loaded identification patterns");
        Ok(schema)
    }
}

fn read_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|source| KbError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|source| KbError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(contents)
}

/// Look for `schema/<filename>`, first under `schema_dir` when given, then
/// relative to the working directory.
pub fn find_schema_file(filename: &str, schema_dir: Option<&Path>) -> Result<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = schema_dir {
        candidates.push(dir.join(filename));
    }
    candidates.push(PathBuf::from(format!("schema/{}", filename)));
    candidates.push(PathBuf::from(format!("../../schema/{}", filename)));
    candidates
        .into_iter()
        .find(|p| p.exists())
        .ok_or_else(|| KbError::SchemaNotFound(filename.to_string()))
}

// === Language map ===

/// Language name (lowercase, locale spelling) to short code.
#[derive(Debug, Clone, Default)]
pub struct LangMap(HashMap<String, String>);

impl LangMap {
    pub fn from_json(contents: &str, path: &Path) -> Result<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(contents).map_err(|source| KbError::LangMap {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(LangMap(raw))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let map = Self::from_json(&read_file(path)?, path)?;
        info!(path = %path.display(), entries = map.0.len(), "loaded language map");
        Ok(map)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Map a language name to its code; unknown names come back unchanged.
    pub fn code_or_self<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).unwrap_or(name)
    }
}

impl FromIterator<(String, String)> for LangMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        LangMap(iter.into_iter().collect())
    }
}

// === Redirects and first sentences ===

/// Article link to every title that redirects to it.
pub type Redirects = HashMap<String, Vec<String>>;
/// Article link to its precomputed first sentence.
pub type FirstSentences = HashMap<String, String>;

/// Parse `from<TAB>to` lines. Malformed lines are skipped.
pub fn parse_redirects(reader: impl BufRead) -> std::io::Result<Redirects> {
    let mut redirects = Redirects::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        match line.split_once('\t') {
            Some((from, to)) if !to.contains('\t') => {
                redirects.entry(to.to_string()).or_default().push(from.to_string());
            }
            _ => debug!(line = %line, "redirects: malformed line"),
        }
    }
    Ok(redirects)
}

/// Parse `link<TAB>sentence` lines; a line without a sentence maps to "".
pub fn parse_first_sentences(reader: impl BufRead) -> std::io::Result<FirstSentences> {
    let mut sentences = FirstSentences::new();
    for line in reader.lines() {
        let line = line?;
        let mut split = line.trim().split('\t');
        let link = split.next().unwrap_or_default();
        let sentence = split.next().unwrap_or_default();
        sentences.insert(link.to_string(), sentence.to_string());
    }
    Ok(sentences)
}

fn load_optional<T: Default>(
    path: Option<&Path>,
    what: &str,
    parse: impl FnOnce(BufReader<File>) -> std::io::Result<T>,
) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "{} file not found, skipping", what);
            return Ok(T::default());
        }
    };
    parse(BufReader::with_capacity(256 * 1024, file)).map_err(|source| KbError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_redirects(path: Option<&Path>) -> Result<Redirects> {
    let redirects = load_optional(path, "redirect", parse_redirects)?;
    info!(targets = redirects.len(), "loaded redirects");
    Ok(redirects)
}

pub fn load_first_sentences(path: Option<&Path>) -> Result<FirstSentences> {
    let sentences = load_optional(path, "first sentence", parse_first_sentences)?;
    info!(entries = sentences.len(), "loaded first sentences");
    Ok(sentences)
}

/// Everything a worker needs to process pages of one locale.
#[derive(Debug)]
pub struct Resources {
    pub schema: Schema,
    pub langmap: LangMap,
    pub redirects: Redirects,
    pub first_sentences: FirstSentences,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const MINIMAL: &str = r#"
identification:
  - kind: person
    categories: ["births$"]
    "!categories": ["fictional"]
    fields: [birth_date]
  - kind: country
    names: ["^country$"]
keywords:
  disambig_pattern: "\\{\\{disambiguation"
  category_pattern: "\\[\\[Category:\\s*(.+?)\\s*(?:\\|.*?)?\\]\\]"
  sentence: [is, was]
  male: [male]
  female: [female, woman]
  type: [type]
"#;

    #[test]
    fn schema_keeps_kind_order() {
        let schema = Schema::from_yaml(MINIMAL, Path::new("test.yaml")).unwrap();
        let kinds: Vec<&str> = schema.patterns.kinds().map(|k| k.kind.as_str()).collect();
        assert_eq!(kinds, vec!["person", "country"]);
        assert_eq!(schema.keywords.kind_type, vec!["type".to_string()]);
    }

    #[test]
    fn schema_patterns_are_case_insensitive() {
        let schema = Schema::from_yaml(MINIMAL, Path::new("test.yaml")).unwrap();
        assert!(schema.matchers.disambig.is_match("{{Disambiguation}}"));
        let caps = schema.matchers.category.captures("[[category: 1950 births|Smith]]").unwrap();
        assert_eq!(&caps[1], "1950 births");
        assert!(schema.matchers.sentence_lead.is_match("'''Jan''' (born 1950) is a painter"));
    }

    #[test]
    fn gender_words_match_whole_words() {
        let schema = Schema::from_yaml(MINIMAL, Path::new("test.yaml")).unwrap();
        let male = schema.matchers.male.as_ref().unwrap();
        let female = schema.matchers.female.as_ref().unwrap();
        assert!(male.is_match("Male novelists"));
        assert!(!male.is_match("female novelists"));
        assert!(female.is_match("Woman chess players"));
    }

    #[test]
    fn bad_pattern_is_reported() {
        let yaml = "identification:\n  - kind: person\n    titles: [\"(\"]\nkeywords: {}\n";
        let err = Schema::from_yaml(yaml, Path::new("bad.yaml")).unwrap_err();
        assert!(matches!(err, KbError::Pattern { ref owner, .. } if owner == "person"));
    }

    #[test]
    fn bad_yaml_is_reported() {
        let err = Schema::from_yaml("identification: [", Path::new("bad.yaml")).unwrap_err();
        assert!(matches!(err, KbError::Schema { .. }));
    }

    #[test]
    fn langmap_lookup() {
        let map = LangMap::from_json(r#"{"czech": "cs", "german": "de"}"#, Path::new("l.json")).unwrap();
        assert_eq!(map.get("czech"), Some("cs"));
        assert_eq!(map.code_or_self("klingon"), "klingon");
    }

    #[test]
    fn redirects_group_by_target() {
        let input = "Praha\tPrague\nPrag\tPrague\nbroken line\n";
        let redirects = parse_redirects(Cursor::new(input)).unwrap();
        assert_eq!(redirects["Prague"], vec!["Praha".to_string(), "Prag".to_string()]);
        assert_eq!(redirects.len(), 1);
    }

    #[test]
    fn first_sentences_allow_empty() {
        let input = "https://en.wikipedia.org/wiki/A\tA is a letter.\nhttps://en.wikipedia.org/wiki/B\n";
        let sentences = parse_first_sentences(Cursor::new(input)).unwrap();
        assert_eq!(sentences["https://en.wikipedia.org/wiki/A"], "A is a letter.");
        assert_eq!(sentences["https://en.wikipedia.org/wiki/B"], "");
    }

    #[test]
    fn missing_optional_file_is_empty() {
        let redirects = load_redirects(Some(Path::new("/nonexistent/redirects.tsv"))).unwrap();
        assert!(redirects.is_empty());
    }

    #[test]
    fn schema_dir_is_searched_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns_xx.yaml");
        std::fs::write(&path, MINIMAL).unwrap();
        assert_eq!(find_schema_file("patterns_xx.yaml", Some(dir.path())).unwrap(), path);
        assert!(matches!(
            find_schema_file("patterns_missing.yaml", Some(dir.path())),
            Err(KbError::SchemaNotFound(_))
        ));
    }
}
