//! Latitude/longitude from coordinate templates and degree fields.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

use super::{join_digit_groups, render_float, round_to};

/// Latitude and longitude as rendered strings; both empty when unknown.
pub type Coordinates = (String, String);

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s").unwrap();
    static ref DMS: Regex = Regex::new(
        r"([0-9.]+)\|([0-9.]+)?\|?([0-9.]+)?\|?(N|S)\|([0-9.]+)\|([0-9.]+)?\|?([0-9.]+)?\|?(E|W)"
    )
    .unwrap();
    static ref DECIMAL_PAIR: Regex = Regex::new(r"\{\{.*\|([0-9.-]+)\|([0-9.-]+).*\}\}").unwrap();
    static ref MISSING: Regex = Regex::new(r"[Cc]oords?missing").unwrap();

    static ref PARENS: Regex = Regex::new(r"\(.*?\)").unwrap();
    static ref BRACKETS: Regex = Regex::new(r"\[.*?\]").unwrap();
    static ref TAGS: Regex = Regex::new(r"<.*?>").unwrap();
    static ref TEMPLATES: Regex = Regex::new(r"\{\{.*?\}\}").unwrap();
    static ref LEADING_TEXT: Regex = Regex::new(r"^[^\d-]*(\d)").unwrap();
    static ref FIRST_NUMBER: Regex = Regex::new(r"^(-?\d+(?:[.,]\d+)?)[^\d.,]+.*$").unwrap();
    static ref ANY_DIGIT: Regex = Regex::new(r"\d").unwrap();
}

pub fn empty() -> Coordinates {
    (String::new(), String::new())
}

/// Decimal degrees from one hemisphere's captures of [`DMS`].
fn hemisphere(caps: &Captures, first: usize) -> Option<f64> {
    let mut value = 0.0;
    for (i, divisor) in [1.0, 60.0, 3600.0].iter().enumerate() {
        if let Some(part) = caps.get(first + i) {
            value += part.as_str().parse::<f64>().ok()? / divisor;
        }
    }
    let value = round_to(value, 5);
    match &caps[first + 3] {
        "S" | "W" => Some(-value),
        _ => Some(value),
    }
}

/// Parse a `{{coord}}` template.
///
/// Degree/minute/second forms with hemisphere letters are summed as
/// `deg + min/60 + sec/3600`; a bare decimal pair is returned verbatim.
/// A "coordinates missing" marker, like anything unrecognized, gives an
/// empty pair.
pub fn parse_coordinates(text: &str) -> Coordinates {
    let compact = WHITESPACE.replace_all(text, "");

    if let Some(caps) = DMS.captures(&compact) {
        if let (Some(lat), Some(lon)) = (hemisphere(&caps, 1), hemisphere(&caps, 5)) {
            return (render_float(lat), render_float(lon));
        }
    }

    if let Some(caps) = DECIMAL_PAIR.captures(&compact) {
        return (caps[1].to_string(), caps[2].to_string());
    }

    if !MISSING.is_match(&compact) {
        debug!(value = %compact, "coordinates: no format matched");
    }
    empty()
}

/// A single degree value from a field such as `zeměpisná šířka = 50.08 s. š.`.
///
/// Both "," and "." are accepted as decimal separators; the result always
/// uses ".". Empty when no digit remains after cleanup.
pub fn parse_degree(value: &str) -> String {
    let degree = PARENS.replace_all(value, "");
    let degree = BRACKETS.replace_all(&degree, "");
    let degree = TAGS.replace_all(&degree, "");
    let degree = TEMPLATES.replace_all(&degree, "").replace(&['{', '}'][..], "");
    let degree = join_digit_groups(&degree);
    let degree = LEADING_TEXT.replace(degree.trim(), "$1");
    let degree = FIRST_NUMBER.replace(&degree, "$1").replace(',', ".");

    if !ANY_DIGIT.is_match(&degree) {
        return String::new();
    }
    degree.trim().to_string()
}
