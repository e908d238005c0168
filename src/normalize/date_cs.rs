//! Canonical dates from Czech markup.
//!
//! The raw value (already stripped of links and formatting) is rewritten by
//! an ordered cascade of rules, each one replacing the whole string with a
//! canonical date. Once a rule produced a canonical date the rest are skipped.
//! Centuries become ranges (`1301-??-??/1400-??-??`); dates marked
//! "př. n. l." are shifted to astronomical years with a minus sign.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref CANONICAL_PREFIX: Regex = Regex::new(r"^[\d?]+-[\d?]+-[\d?]+").unwrap();
    static ref BC_MARK: Regex = Regex::new(r"(?i)př\.?\s*n\.?\s*l\.?").unwrap();
    static ref BC_STRIP: Regex = Regex::new(r"(?i)př\.\s*n\.\s*l\.").unwrap();
    static ref UNCERTAIN: Regex = Regex::new(r"[?~]").unwrap();
    static ref ANY_TEMPLATE: Regex = Regex::new(r"^\{\{[^}]+\}\}").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    static ref SINGLE: Regex = Regex::new(r"^([\d?]{4})-([\d?]{2})-([\d?]{2})$").unwrap();
    static ref RANGE: Regex =
        Regex::new(r"^([\d?]{4})-([\d?]{2})-([\d?]{2})/([\d?]{4})-([\d?]{2})-([\d?]{2})$").unwrap();

    static ref RULES: Vec<Rule> = {
        const MONTH: &str = r"(?:led|úno|bře|dub|kvě|čer|srp|zář|říj|list|pros)[^\W\d_]+";
        let rule = |pattern: &str, shape: Shape, applies: Applies| Rule {
            pattern: Regex::new(pattern).unwrap(),
            shape,
            applies,
        };
        vec![
            rule(
                r"(?i).*?(\d+\.?|prvn.|druh.)\s*(?:pol(?:\.|ovin.))\s*(\d+)\.?\s*(?:st(?:\.?|ol\.?|oletí)).*",
                Shape::HalfCentury,
                Applies::Always,
            ),
            rule(
                r"(?i).*?(\d+)\.?\s*(?:až?|[\-–—−/])\s*(\d+)\.?\s*(?:st\.?|stol\.?|století).*",
                Shape::CenturyRange,
                Applies::Always,
            ),
            rule(r"(?i).*?(\d+)\.?\s*(?:st\.?|stol\.?|století).*", Shape::Century, Applies::Always),
            rule(
                r"(?i).*?\{\{\s*datum[\s_]+narození\D*\|\s*(\d*)\s*\|\s*(\d*)\s*\|\s*(\d*)[^}]*\}\}.*",
                Shape::YearMonthDay,
                Applies::Birth,
            ),
            rule(
                r"(?i).*?\{\{\s*datum[\s_]+úmrtí\D*\|\s*(\d*)\s*\|\s*(\d*)\s*\|\s*(\d*)[^}]*\}\}.*",
                Shape::YearMonthDay,
                Applies::Death,
            ),
            rule(
                r"(?i).*?\{\{\s*JULGREGDATUM\s*\|\s*(\d+)\s*\|\s*(\d+)\s*\|\s*(\d+)[^}]*\}\}.*",
                Shape::DayMonthYear,
                Applies::Always,
            ),
            rule(
                &format!(r"(?i).*?(\d+)\.\s*({})(?:\s*,)?\s+(\d+).*", MONTH),
                Shape::DayMonthNameYear,
                Applies::Always,
            ),
            rule(
                r"(?i).*?(\d+)\s*(?:či|až?|nebo|[\-–—−/])\s*(\d+).*",
                Shape::YearRange,
                Applies::Always,
            ),
            rule(r".*?(\d+)\s*\.\s*(\d+)\s*\.\s*(\d+).*", Shape::DayMonthYear, Applies::Always),
            rule(
                &format!(r"(?i).*?({})(?:\s*,)?\s+(\d+).*", MONTH),
                Shape::MonthNameYear,
                Applies::Always,
            ),
            rule(&format!(r"(?i).*?(\d+)\.\s*({}).*", MONTH), Shape::DayMonthName, Applies::Always),
            rule(r".*?(\d{1,4}).*", Shape::Year, Applies::Always),
        ]
    };
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    HalfCentury,
    CenturyRange,
    Century,
    YearMonthDay,
    DayMonthYear,
    DayMonthNameYear,
    YearRange,
    MonthNameYear,
    DayMonthName,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applies {
    Always,
    Birth,
    Death,
}

struct Rule {
    pattern: Regex,
    shape: Shape,
    applies: Applies,
}

impl Rule {
    fn applies_to(&self, is_birth: bool) -> bool {
        match self.applies {
            Applies::Always => true,
            Applies::Birth => is_birth,
            Applies::Death => !is_birth,
        }
    }
}

fn zfill(value: &str, width: usize) -> String {
    format!("{:0>width$}", value, width = width)
}

fn zfill_or_unknown(value: &str, width: usize) -> String {
    if value.is_empty() {
        "?".repeat(width)
    } else {
        zfill(value, width)
    }
}

/// Month number from a Czech month name in any case form; `??` if unknown.
fn month_number(name: &str) -> String {
    let lower = name.to_lowercase();
    // "červen" (June) is a prefix of "červenec" (July); only the latter
    // contains a "c" in any of its inflected forms.
    const STEMS: [(&str, &str); 11] = [
        ("led", "01"),
        ("únor", "02"),
        ("břez", "03"),
        ("dub", "04"),
        ("květ", "05"),
        ("červ", "06"),
        ("srp", "08"),
        ("září", "09"),
        ("říj", "10"),
        ("listopad", "11"),
        ("prosin", "12"),
    ];
    for (stem, number) in STEMS {
        if lower.contains(stem) {
            if stem == "červ" && lower.contains('c') {
                return "07".to_string();
            }
            return number.to_string();
        }
    }
    "??".to_string()
}

fn century_bounds(century: i64) -> (i64, i64) {
    ((century - 1) * 100 + 1, century * 100)
}

fn build(shape: Shape, caps: &Captures) -> Option<String> {
    let out = match shape {
        Shape::HalfCentury => {
            let century: i64 = caps[2].parse().ok()?;
            let first_half = caps[1].contains('1') || caps[1].to_lowercase().starts_with("prvn");
            let (start, end) = if first_half {
                ((century - 1) * 100 + 1, (century - 1) * 100 + 50)
            } else {
                ((century - 1) * 100 + 51, century * 100)
            };
            format!("{:04}-??-??/{:04}-??-??", start, end)
        }
        Shape::CenturyRange => {
            let (start, _) = century_bounds(caps[1].parse().ok()?);
            let (_, end) = century_bounds(caps[2].parse().ok()?);
            format!("{:04}-??-??/{:04}-??-??", start, end)
        }
        Shape::Century => {
            let (start, end) = century_bounds(caps[1].parse().ok()?);
            format!("{:04}-??-??/{:04}-??-??", start, end)
        }
        Shape::YearMonthDay => format!(
            "{}-{}-{}",
            zfill_or_unknown(&caps[1], 4),
            zfill_or_unknown(&caps[2], 2),
            zfill_or_unknown(&caps[3], 2)
        ),
        Shape::DayMonthYear => {
            format!("{}-{}-{}", zfill(&caps[3], 4), zfill(&caps[2], 2), zfill(&caps[1], 2))
        }
        Shape::DayMonthNameYear => {
            format!("{}-{}-{}", zfill(&caps[3], 4), month_number(&caps[2]), zfill(&caps[1], 2))
        }
        Shape::YearRange => format!("{}-??-??/{}-??-??", zfill(&caps[1], 4), zfill(&caps[2], 4)),
        Shape::MonthNameYear => format!("{}-{}-??", zfill(&caps[2], 4), month_number(&caps[1])),
        Shape::DayMonthName => format!("????-{}-{}", month_number(&caps[2]), zfill(&caps[1], 2)),
        Shape::Year => format!("{}-??-??", zfill(&caps[1], 4)),
    };
    Some(out)
}

/// Drop every `{{...}}` that is not a `datum ...` or `JULGREGDATUM` template.
fn strip_foreign_templates(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        if rest.starts_with("{{") {
            let head: String = rest[2..].trim_start().chars().take(7).collect::<String>().to_lowercase();
            if !head.starts_with("datum") && !head.starts_with("julgreg") {
                if let Some(m) = ANY_TEMPLATE.find(rest) {
                    pos += m.end();
                    continue;
                }
            }
        }
        let Some(c) = rest.chars().next() else { break };
        out.push(c);
        pos += c.len_utf8();
    }
    out
}

fn bc_year(year: &str) -> String {
    match year.parse::<i64>() {
        Ok(1) => "0000".to_string(),
        Ok(y) if y > 1 => format!("-{:04}", y - 1),
        _ => year.to_string(),
    }
}

/// Shift a canonical date or range to negative astronomical years.
fn to_before_christ(date: &str) -> String {
    if let Some(caps) = SINGLE.captures(date) {
        if &caps[1] == "????" {
            return date.to_string();
        }
        return format!("{}-{}-{}", bc_year(&caps[1]), &caps[2], &caps[3]);
    }
    if let Some(caps) = RANGE.captures(date) {
        if &caps[1] == "????" || &caps[4] == "????" {
            return date.to_string();
        }
        let (Ok(mut first), Ok(mut second)) = (caps[1].parse::<i64>(), caps[4].parse::<i64>()) else {
            return date.to_string();
        };
        if first < second {
            std::mem::swap(&mut first, &mut second);
        }
        return format!(
            "{}-{}-{}/{}-{}-{}",
            bc_year(&first.to_string()),
            &caps[2],
            &caps[3],
            bc_year(&second.to_string()),
            &caps[5],
            &caps[6]
        );
    }
    date.to_string()
}

/// Convert a cleaned Czech date value to canonical form.
///
/// `is_birth` selects which of the combined birth/death templates is read.
/// Returns an empty string when no rule recognized the value.
pub fn convert_date(value: &str, is_birth: bool) -> String {
    let original = value.to_string();
    let before_christ = BC_MARK.is_match(value);

    let date = UNCERTAIN.replace_all(value, "");
    let date = strip_foreign_templates(&date);
    let mut date = BC_STRIP.replace_all(&date, "").into_owned();

    let mut fired = false;
    for rule in RULES.iter().filter(|r| r.applies_to(is_birth)) {
        if CANONICAL_PREFIX.is_match(&date) {
            break;
        }
        let mut matched = false;
        let rewritten = rule
            .pattern
            .replace_all(&date, |caps: &Captures| match build(rule.shape, caps) {
                Some(out) => {
                    matched = true;
                    out
                }
                None => caps[0].to_string(),
            })
            .into_owned();
        if matched {
            date = rewritten;
            fired = true;
        }
    }

    let date = WHITESPACE.replace_all(&date, " ").trim().to_string();
    if !fired || date == original {
        return String::new();
    }
    if before_christ {
        return to_before_christ(&date);
    }
    date
}
