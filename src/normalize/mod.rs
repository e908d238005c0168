//! Field normalizers: dates, measured quantities and coordinates.
//!
//! Every normalizer is a pure function over a field value. A value that cannot
//! be converted confidently yields an empty string.

pub mod coords;
pub mod date;
pub mod date_cs;
pub mod units;

/// Drop whitespace that sits between two digits ("1 000 000" -> "1000000").
pub fn join_digit_groups(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace()
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).map_or(false, |n| n.is_ascii_digit())
        {
            continue;
        }
        out.push(c);
    }
    out
}

/// Drop a comma used as a thousands separator (one followed by three digits).
pub fn strip_thousands_commas(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        if c == ','
            && bytes.len() >= i + 4
            && bytes[i + 1..i + 4].iter().all(u8::is_ascii_digit)
        {
            continue;
        }
        out.push(c);
    }
    out
}

/// Render a float the way it reads in the knowledge base: shortest round-trip
/// form, always with a fractional part ("1.0", "51.5", "-0.11667").
pub fn render_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Like [`render_float`] but integral values lose the trailing ".0".
pub fn render_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
