//! Wikitext template decomposition.
//!
//! A recursive descent parser in the spirit of a small markup-template
//! library: it yields every template in the text (nested ones included, in
//! preorder), with ordered `(name, value)` parameters, and can render the
//! plain text of a fragment with templates dropped and links resolved.
//! Balance checks are delegated to [`crate::span`]; an unclosed `{{` or `[[`
//! is kept as literal text.

use lazy_static::lazy_static;
use regex::Regex;

use crate::span;

lazy_static! {
    static ref HEADING_LINE: Regex = Regex::new(r"(?m)^=+[^=\n].*=+[ \t]*$").unwrap();
    static ref BOLD_ITALIC: Regex = Regex::new(r"'{2,}").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"</?[A-Za-z][^>]*>").unwrap();
    static ref MEDIA_OR_CATEGORY: Regex =
        Regex::new(r"(?i)^\s*:?\s*(?:file|image|soubor|obrázek|category|kategorie)\s*:").unwrap();
}

/// One template parameter. Positional parameters are named "1", "2", ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub value: String,
    pub showkey: bool,
}

/// Parsed template: {{name|param1|key=value|...}}
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub params: Vec<Param>,
    /// Exact source text, delimiters included.
    pub source: String,
}

impl Template {
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Name lowercased and trimmed, for case-insensitive dispatch.
    pub fn lower_name(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

/// Parsed wikilink: [[target#anchor|display]]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wikilink {
    pub target: String,
    pub anchor: Option<String>,
    pub display: Option<String>,
}

impl Wikilink {
    /// Return display text if present, otherwise target
    pub fn text(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.target)
    }

    fn is_media_or_category(&self) -> bool {
        MEDIA_OR_CATEGORY.is_match(&self.target)
    }
}

/// Recursive descent parser. Nested fragments (template parameters, link
/// captions) are parsed by child parsers sharing the same template sink.
struct WikitextParser<'a, 'o> {
    text: &'a str,
    pos: usize,
    templates: &'o mut Vec<Template>,
}

impl<'a, 'o> WikitextParser<'a, 'o> {
    fn new(text: &'a str, templates: &'o mut Vec<Template>) -> Self {
        WikitextParser { text, pos: 0, templates }
    }

    fn peek(&self, n: usize) -> &str {
        // n is character count, not byte count
        let remaining = &self.text[self.pos..];
        let end_offset: usize = remaining.chars().take(n).map(|c| c.len_utf8()).sum();
        &remaining[..end_offset]
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.text[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    // ─────────────────────────────────────────────────────────────
    // nodes ::= (template | wikilink | char)*
    // ─────────────────────────────────────────────────────────────
    fn parse_nodes(&mut self) -> String {
        let mut plain = String::new();
        while !self.at_end() {
            if self.peek(2) == "{{" && self.parse_template() {
                continue;
            }
            if self.peek(2) == "[[" {
                if let Some(link) = self.parse_wikilink() {
                    if !link.is_media_or_category() {
                        let text = WikitextParser::new(link.text(), &mut *self.templates).parse_nodes();
                        plain.push_str(&text);
                    }
                    continue;
                }
            }
            if let Some(c) = self.consume_char() {
                plain.push(c);
            }
        }
        plain
    }

    // ─────────────────────────────────────────────────────────────
    // template ::= "{{" name ("|" param)* "}}"
    // param    ::= (key "=")? value
    // ─────────────────────────────────────────────────────────────
    fn parse_template(&mut self) -> bool {
        let Some(found) = span::locate(self.text, self.pos) else {
            return false;
        };
        let source = &self.text[found.start..found.end];
        if !source.ends_with("}}") {
            return false;
        }
        let inner = &source[2..source.len() - 2];
        self.pos = found.end;

        // Reserve the slot so the outer template precedes its children.
        let slot = self.templates.len();
        self.templates.push(Template::default());

        let mut parts = span::split_at_depth(inner, 0, b'|').into_iter();
        let name = parts.next().unwrap_or_default();
        WikitextParser::new(name, &mut *self.templates).parse_nodes();

        let mut params = Vec::new();
        let mut position = 0;
        for part in parts {
            let (param_name, value, showkey) = match split_key(part) {
                Some((key, value)) => (key.trim().to_string(), value, true),
                None => {
                    position += 1;
                    (position.to_string(), part, false)
                }
            };
            WikitextParser::new(value, &mut *self.templates).parse_nodes();
            params.push(Param { name: param_name, value: value.to_string(), showkey });
        }

        self.templates[slot] = Template {
            name: name.trim().to_string(),
            params,
            source: source.to_string(),
        };
        true
    }

    // ─────────────────────────────────────────────────────────────
    // wikilink ::= "[[" target ("#" anchor)? ("|" display)? "]]"
    // ─────────────────────────────────────────────────────────────
    fn parse_wikilink(&mut self) -> Option<Wikilink> {
        let found = span::locate(self.text, self.pos)?;
        let source = &self.text[found.start..found.end];
        if !source.ends_with("]]") {
            return None;
        }
        self.pos = found.end;

        let inner = &source[2..source.len() - 2];
        let mut parts = span::split_at_depth(inner, 0, b'|');
        let head = parts.remove(0);
        let (target, anchor) = match head.split_once('#') {
            Some((t, a)) => (t.trim().to_string(), Some(a.trim().to_string())),
            None => (head.trim().to_string(), None),
        };
        let display = parts.last().map(|d| d.trim().to_string());
        Some(Wikilink { target, anchor, display })
    }
}

/// Split `key=value` on the first `=` outside nested constructs.
fn split_key(part: &str) -> Option<(&str, &str)> {
    let mut depth = 0;
    for (i, b) in part.bytes().enumerate() {
        match b {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth -= 1,
            b'=' if depth == 0 => return Some((&part[..i], &part[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Every template in `text`, nested ones included, outer before inner.
pub fn parse_templates(text: &str) -> Vec<Template> {
    let mut templates = Vec::new();
    WikitextParser::new(text, &mut templates).parse_nodes();
    templates
}

/// Plain text of `text`: templates dropped, links replaced by their display
/// text (media and category links dropped), tags and bold/italic quotes removed.
pub fn strip_code(text: &str) -> String {
    let mut sink = Vec::new();
    let plain = WikitextParser::new(text, &mut sink).parse_nodes();
    let plain = HTML_TAG.replace_all(&plain, "");
    BOLD_ITALIC.replace_all(&plain, "").trim().to_string()
}

/// Parse a bare link body such as `[[Prague|capital]]`.
pub fn parse_wikilink(text: &str) -> Option<Wikilink> {
    let mut sink = Vec::new();
    WikitextParser::new(text, &mut sink).parse_wikilink()
}

/// Lead section: everything before the first heading line.
pub fn first_section(text: &str) -> &str {
    match HEADING_LINE.find(text) {
        Some(heading) => &text[..heading.start()],
        None => text,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests for WikitextParser
// ─────────────────────────────────────────────────────────────────────────────
