//! Raw markup to structured page data: infobox, lead paragraph, categories,
//! coordinate template and inline images.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::Matchers;
use crate::span;
use crate::wikicode::{self, Template};

lazy_static! {
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref REF_SELF_CLOSING: Regex = Regex::new(r"<ref[^<]*?/>").unwrap();
    static ref REF_BLOCK: Regex = Regex::new(r"(?s)<ref(?:.*?)?>.*?</ref>").unwrap();
    static ref BREAK: Regex = Regex::new(r"<br\s*?/>|<br>").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref LEAD_LINE: Regex = Regex::new(r"(?i)^'''|The '''").unwrap();
    static ref FILE_LINK: Regex = Regex::new(r"(?i)\[\[(?:file|soubor):([^\]]*?)\|[^\]]*?\]\]").unwrap();
    static ref IMAGE_EXTENSION: Regex = Regex::new(r"(?i)\.(?:jpe?g|png|gif|bmp|ico|tif|tga|svg)$").unwrap();
}

/// Infobox key/value pairs in source order. Keys are lowercased; a repeated
/// key keeps its first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoboxFields {
    entries: Vec<(String, String)>,
}

impl InfoboxFields {
    pub fn insert(&mut self, key: String, value: String) {
        if !self.contains(&key) {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InfoboxFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = InfoboxFields::default();
        for (k, v) in iter {
            fields.insert(k.into(), v.into());
        }
        fields
    }
}

/// Structured view of one article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedMarkup {
    pub infobox_found: bool,
    /// Infobox type without the leading "Infobox" word ("settlement").
    pub infobox_name: String,
    pub fields: InfoboxFields,
    /// Lead paragraph starting at the first bold subject.
    pub paragraph: String,
    pub categories: Vec<String>,
    /// Source of the last coordinate template outside the infobox.
    pub coords: String,
    pub images: Vec<String>,
}

/// Drop comments, references, footnote templates and `<nowiki/>`.
pub fn remove_not_important(content: &str) -> String {
    let text = COMMENT.replace_all(content, "");
    let text = REF_SELF_CLOSING.replace_all(&text, "");
    let text = REF_BLOCK.replace_all(&text, "");
    let text = span::remove_note_templates(&text);
    text.replace("<nowiki/>", " ")
}

/// Line breaks become two spaces.
pub fn remove_breaks(text: &str) -> String {
    BREAK.replace_all(text, "  ").into_owned()
}

fn infobox_name(template: &Template) -> String {
    let words: Vec<&str> = template.name.split_whitespace().skip(1).collect();
    let name = words.join(" ");
    let name = name.trim().trim_start_matches('-').trim();
    remove_breaks(name)
}

fn infobox_fields(template: &Template) -> InfoboxFields {
    let mut fields = InfoboxFields::default();
    for param in &template.params {
        let (key, value) = if param.showkey {
            let value: Vec<&str> = param.value.split('=').map(str::trim).collect();
            (param.name.trim().to_lowercase(), value.join("="))
        } else {
            (param.value.trim().to_lowercase(), String::new())
        };
        fields.insert(key, BREAK.replace_all(&value, ", ").into_owned());
    }
    fields
}

fn lead_paragraph(content: &str, infobox_source: &str) -> String {
    let mut section = wikicode::first_section(content).to_string();
    if !infobox_source.is_empty() {
        section = section.replacen(infobox_source, "", 1);
    }
    let lines: Vec<&str> = section.lines().filter(|l| !l.trim().is_empty()).collect();

    for (idx, line) in lines.iter().enumerate() {
        if let Some(m) = LEAD_LINE.find(line) {
            let mut paragraph = line[m.start()..].to_string();
            paragraph.push(' ');
            paragraph.push_str(&lines[idx + 1..].join(" "));
            return remove_breaks(&paragraph).trim().to_string();
        }
    }
    String::new()
}

/// Extract infobox, lead paragraph, categories, coordinates and images from
/// one article's markup.
pub fn extract(content: &str, matchers: &Matchers) -> ExtractedMarkup {
    let content = remove_not_important(content);
    let mut markup = ExtractedMarkup::default();
    let mut infobox_source = String::new();

    for template in wikicode::parse_templates(&content) {
        let name = template.lower_name();
        if !markup.infobox_found && name.starts_with("infobox") {
            markup.infobox_found = true;
            markup.infobox_name = infobox_name(&template);
            markup.fields = infobox_fields(&template);
            infobox_source = template.source;
        } else if name.contains("coord") {
            markup.coords = remove_breaks(&template.source);
        }
    }

    markup.paragraph = lead_paragraph(&content, &infobox_source);

    for line in content.lines() {
        if let Some(caps) = matchers.category.captures(line) {
            let category = caps.get(1).map_or("", |m| m.as_str()).trim();
            markup.categories.push(remove_breaks(category));
            continue;
        }
        if let Some(caps) = FILE_LINK.captures(line) {
            let image = caps[1].trim();
            if IMAGE_EXTENSION.is_match(image) {
                markup.images.push(image.to_string());
            }
        }
    }

    markup
}

/// Whitespace runs collapsed to one space.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}
