//! Canonical dates (`YYYY-MM-DD` with `??` placeholders) from English markup.
//!
//! Structured birth/death templates are split into their numeric parts;
//! anything else goes through an ordered list of free-text rules, first
//! matching rule wins.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::wikicode::{self, Template};

/// Two canonical dates, oldest first. Either side may be empty.
pub type DatePair = (String, String);

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

lazy_static! {
    static ref DATE_TEMPLATE: Regex = Regex::new(r"(?i)date|death|birth|dda|d-da|b-da").unwrap();
    static ref NOTE_TEMPLATE: Regex = Regex::new(r"(?i)citation|note").unwrap();
    static ref TWO_DATE_TEMPLATE: Regex =
        Regex::new(r"(?i)death(?:-| )(?:date|year) and age|dda|d-da").unwrap();
    static ref HAS_DIGIT: Regex = Regex::new(r"[0-9]").unwrap();

    static ref SLASHED_DATE: Regex = Regex::new(r"[0-9]+/[0-9]+/[0-9]+").unwrap();
    static ref QUALIFIERS: Regex = Regex::new(r"''circa''|circa|c\.|\(.*?age.*?\)|\bno\b|\bAD\b").unwrap();
    static ref NBSP: Regex = Regex::new(r"\{\{nbsp\}\}|&nbsp;").unwrap();
    static ref YEAR_SPAN: Regex = Regex::new(r"([0-9]+)(?:/|–|-)[0-9]+").unwrap();
    static ref BC_YEAR: Regex = Regex::new(r"([0-9]+)\s+BCE?|BCE?\s+([0-9]+)").unwrap();

    static ref TEXT_RULES: Vec<TextRule> = vec![
        TextRule {
            pattern: Regex::new(r"(?i)^([a-z]+)[^0-9a-z]+?([0-9]+)[^0-9a-z]+?(-?[0-9]+)").unwrap(),
            build: month_day_year,
        },
        TextRule {
            pattern: Regex::new(r"(?i)^([0-9]+)[^\(\)0-9]+?([a-z]+)[^\(\)]+?(-?[0-9]+)").unwrap(),
            build: day_month_year,
        },
        TextRule {
            pattern: Regex::new(r"(?i)^([a-z]+).+?(-?[0-9]+)(?:\s|$)").unwrap(),
            build: month_year,
        },
        TextRule {
            pattern: Regex::new(r"^(-?[0-9]+)(?:[^,0-9]|$)").unwrap(),
            build: year_only,
        },
    ];
}

/// One free-text date shape. `build` may still reject a match (e.g. when the
/// word in month position is not a month), in which case the next rule runs.
struct TextRule {
    pattern: Regex,
    build: fn(&Captures) -> Option<String>,
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Zero-pad a single digit ("5" -> "05"); anything else is kept as is.
fn pad(value: &str) -> String {
    if is_numeric(value) && value.len() == 1 && value != "0" {
        format!("0{}", value)
    } else {
        value.to_string()
    }
}

fn month_number(name: &str) -> Option<String> {
    let name = name.to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == name)
        .map(|idx| format!("{:02}", idx + 1))
}

fn month_day_year(caps: &Captures) -> Option<String> {
    let month = month_number(&caps[1])?;
    Some(format!("{}-{}-{}", pad(&caps[3]), month, pad(&caps[2])))
}

fn day_month_year(caps: &Captures) -> Option<String> {
    let month = month_number(&caps[2])?;
    Some(format!("{}-{}-{}", pad(&caps[3]), month, pad(&caps[1])))
}

fn month_year(caps: &Captures) -> Option<String> {
    let month = month_number(&caps[1])?;
    Some(format!("{}-{}-??", &caps[2], month))
}

fn year_only(caps: &Captures) -> Option<String> {
    Some(format!("{}-??-??", &caps[1]))
}

/// Parse a date written out in words ("2 May 1956", "December 3, 1935").
pub fn parse_text_date(text: &str) -> String {
    TEXT_RULES
        .iter()
        .find_map(|rule| rule.pattern.captures(text).and_then(|caps| (rule.build)(&caps)))
        .unwrap_or_default()
}

/// Numeric template parts `[year, month, day]`; missing parts become `??`.
fn parse_numeric_parts(parts: &[String]) -> String {
    if parts.len() > 3 {
        return String::new();
    }
    let mut out: Vec<String> = parts.iter().map(|p| pad(p)).collect();
    while out.len() < 3 {
        out.push("??".to_string());
    }
    out.join("-")
}

fn parse_parts(parts: &[String]) -> String {
    if parts.is_empty() {
        return String::new();
    }
    match parts.iter().find(|p| !is_numeric(p)) {
        Some(text) => parse_text_date(text),
        None => parse_numeric_parts(parts),
    }
}

/// Split the parts of a date template into one or two dates depending on
/// whether the template carries both birth and death.
fn split_template_dates(parts: &[String], name: &str) -> DatePair {
    if parts.len() > 3 || TWO_DATE_TEMPLATE.is_match(name) {
        if parts.len() % 2 != 0 {
            return (String::new(), String::new());
        }
        let (first, second) = parts.split_at(parts.len() / 2);
        (parse_parts(first), parse_parts(second))
    } else {
        (parse_parts(parts), String::new())
    }
}

/// Numeric `(year, month, day)` of a canonical date; `??` counts as 0 and a
/// range is keyed by its first date. `None` for anything unparseable.
fn chronological_key(date: &str) -> Option<(i64, u32, u32)> {
    let date = date.split('/').next()?.trim();
    let (sign, rest) = match date.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, date),
    };
    let mut parts = rest.split('-');
    let number = |part: Option<&str>| -> Option<u32> {
        match part? {
            "??" => Some(0),
            value => value.parse().ok(),
        }
    };
    let year = number(parts.next())?;
    let month = number(parts.next()).unwrap_or(0);
    let day = number(parts.next()).unwrap_or(0);
    Some((sign * i64::from(year), month, day))
}

/// Order two canonical dates oldest first; empty or unparseable dates sort
/// last and equal dates keep their input order.
pub fn order_dates(first: String, second: String) -> DatePair {
    let key = |d: &str| match chronological_key(d) {
        Some(key) => (false, key),
        None => (true, (0, 0, 0)),
    };
    if key(&first) <= key(&second) {
        (first, second)
    } else {
        (second, first)
    }
}

/// Parse a date that is not wrapped in a date template, such as text taken
/// from the first sentence ("9 June AD&nbsp;68 (aged 30)").
pub fn parse_free_text(text: &str) -> String {
    if SLASHED_DATE.is_match(text) {
        return String::new();
    }
    let text = QUALIFIERS.replace_all(text, "");
    let text = NBSP.replace_all(&text, " ");
    let text = YEAR_SPAN.replace_all(&text, "$1");
    let text = BC_YEAR.replace_all(&text, |caps: &Captures| {
        let year = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("-{}", year)
    });
    parse_text_date(text.trim())
}

fn template_parts(template: &Template) -> Vec<String> {
    template
        .params
        .iter()
        .map(|p| p.value.trim())
        .filter(|v| !v.is_empty() && !v.starts_with("mf=") && !v.starts_with("df=") && HAS_DIGIT.is_match(v))
        .map(str::to_string)
        .collect()
}

/// Extract up to two dates from an infobox value.
///
/// The last date-like template decides; a value without one is parsed as
/// free text together with the parameters of whatever templates it holds.
pub fn extract_date(data: &str) -> DatePair {
    let templates = wikicode::parse_templates(data);
    if templates.is_empty() {
        return (parse_free_text(data), String::new());
    }

    let dated: Vec<&Template> = templates
        .iter()
        .filter(|t| DATE_TEMPLATE.is_match(&t.source) && !NOTE_TEMPLATE.is_match(&t.name))
        .collect();

    let Some(template) = dated.last() else {
        let mut text = wikicode::strip_code(data);
        for param in templates.iter().flat_map(|t| t.params.iter()) {
            text.push(' ');
            text.push_str(&param.value);
        }
        return (parse_free_text(text.trim()), String::new());
    };

    if template.source.to_lowercase().contains("based on age") {
        return (String::new(), String::new());
    }

    let (first, second) = split_template_dates(&template_parts(template), &template.name);
    order_dates(first, second)
}
