//! Numbers with units: areas, lengths, heights, discharge and population.
//!
//! Everything is brought to km², km/m and m³/s. Values in a unit that is not
//! in the table are dropped rather than guessed.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

use super::{join_digit_groups, render_number, round_to, strip_thousands_commas};

const SQMI_TO_KM2: f64 = 2.589988;
const SQFT_TO_KM2: f64 = 9.2903e-8;
const HA_TO_KM2: f64 = 0.01;
const ACRE_TO_KM2: f64 = 0.00404685642;
const M2_TO_KM2: f64 = 0.000001;
const FT_PER_M: f64 = 3.2808;
const MI_TO_KM: f64 = 1.609344;
const CUFT_TO_M3: f64 = 0.028317;
const FT3_TO_M3: f64 = 0.0283168466;
const L_TO_M3: f64 = 0.001;

pub const DEFAULT_PRECISION: i32 = 2;

/// Units already in the target system; the number passes through unchanged.
const METRIC_UNITS: &[&str] = &[
    "sqkm",
    "km2",
    "km²",
    "sq km",
    "square kilometres",
    "km",
    "kilometres",
    "kilometers",
    "m",
    "meters",
    "metres",
    "m3",
    "m3/s",
    "m³/s",
];

lazy_static! {
    static ref TEMPLATE_GREEDY: Regex = Regex::new(r"\{\{.*\}\}").unwrap();
    static ref TEMPLATE_LAZY: Regex = Regex::new(r"\{\{.*?\}\}").unwrap();
    static ref PARENS_GREEDY: Regex = Regex::new(r"\(.+\)").unwrap();
    static ref PARENS_LAZY: Regex = Regex::new(r"\(.*?\)").unwrap();
    static ref LEADING_NUMBER: Regex = Regex::new(r"(\d+(?:\.\d+)?)(?:.+|$)").unwrap();
    static ref CONVERT_ANY: Regex = Regex::new(r"(?i)\{\{(?:convert|cvt)\|([^\}]+)\}\}").unwrap();
    static ref CONVERT_NUMBER: Regex =
        Regex::new(r"(?i)\{\{(?:convert|cvt)\|([\d,\.]+)\|([^\|]+)(?:\|.*?)?\}\}").unwrap();
    static ref NUMBER_AND_UNIT: Regex = Regex::new(r"^([\d,\.]+)(.*)").unwrap();
    static ref MEASURE: Regex = Regex::new(r"^([\d\.]+)(?:\s?([^\s]+))?").unwrap();
    static ref FLOW: Regex = Regex::new(r"^([\d\.,]+)(?:\s([^\s]+))?").unwrap();
    static ref LEADING_NON_DIGITS: Regex = Regex::new(r"^\D*(\d)").unwrap();
    static ref NOWRAP: Regex = Regex::new(r"\{\{nowrap\|([^\{]*?)\}\}").unwrap();
    static ref CIRCA: Regex = Regex::new(r"\{\{circa\|([^\|]+).*?\}\}").unwrap();
    static ref UNINHABITED: Regex = Regex::new(r"(?i)uninhabited|neobydlen|bez.+?obyvatel").unwrap();
    static ref POPULATION: Regex = Regex::new(r"^(\d+)(?:\s?([^\s]+))?").unwrap();
    static ref PLAINLIST: Regex = Regex::new(r"(?i)plainlist").unwrap();
}

/// Conversion factor into the target unit and an optional fixed precision.
fn conversion(unit: &str) -> Option<(f64, Option<i32>)> {
    let factor = match unit {
        "sqmi" | "mi2" => SQMI_TO_KM2,
        "sqft" => return Some((SQFT_TO_KM2, Some(5))),
        "mi" | "mile" | "miles" => MI_TO_KM,
        "ft" | "feet" => 1.0 / FT_PER_M,
        "cuft/s" | "cuft" => CUFT_TO_M3,
        "ft3/s" => FT3_TO_M3,
        "l/s" => L_TO_M3,
        "ha" => HA_TO_KM2,
        "acres" | "acre" => ACRE_TO_KM2,
        "m2" => M2_TO_KM2,
        _ => return None,
    };
    Some((factor, None))
}

/// Convert `number` given in `unit` to the metric target unit.
///
/// Integral results are rendered without a decimal point. An unknown unit
/// yields an empty string.
pub fn convert(number: f64, unit: &str, precision: i32) -> String {
    let unit = unit.to_lowercase();
    if METRIC_UNITS.contains(&unit.as_str()) {
        return render_number(number);
    }
    match conversion(&unit) {
        Some((factor, places)) => render_number(round_to(number * factor, places.unwrap_or(precision))),
        None => {
            debug!(unit = %unit, "unit conversion: unknown unit");
            String::new()
        }
    }
}

/// [`convert`] for a number still in text form.
pub fn convert_text(number: &str, unit: &str) -> String {
    match number.trim().parse::<f64>() {
        Ok(value) => convert(value, unit, DEFAULT_PRECISION),
        Err(_) => {
            debug!(number = %number, "unit conversion: not a number");
            String::new()
        }
    }
}

/// Reduce a raw area value to its leading decimal number.
pub fn fix_area(value: &str) -> String {
    let area = value.replace("&nbsp;", "");
    let area = join_digit_groups(&area);
    let area = TEMPLATE_GREEDY.replace_all(&area, "");
    let area = strip_thousands_commas(&area).replace(',', ".");
    LEADING_NUMBER.replace_all(&area, "$1").trim().to_string()
}

/// Area from a free-form value: a `{{convert}}` template or a number with an
/// optional unit (km² when absent). `None` when the value has neither shape.
pub fn area_from_text(value: &str) -> Option<String> {
    if let Some(caps) = CONVERT_ANY.captures(value) {
        let parts: Vec<&str> = caps[1].split('|').map(str::trim).collect();
        if parts.len() >= 2 {
            let mut unit = parts[1];
            if unit == "-" {
                unit = parts.get(3).copied().unwrap_or("");
            }
            return Some(convert_text(&fix_area(parts[0]), unit));
        }
    }

    let area = PARENS_GREEDY.replace_all(value, "");
    let area = area.trim();
    let caps = NUMBER_AND_UNIT.captures(area)?;
    let unit = caps[2].trim();
    let unit = if unit.is_empty() { "km2" } else { unit };
    Some(convert_text(&fix_area(&caps[1]), unit))
}

/// Apply a `{{convert|n|unit}}` template in `value`, replacing the whole value
/// with the converted number.
fn apply_convert_template(value: String) -> String {
    match CONVERT_NUMBER.captures(&value) {
        Some(caps) => convert_text(caps[1].trim(), caps[2].trim()),
        None => value,
    }
}

/// Length or height: metres/kilometres with unit conversion.
pub fn measure(value: &str) -> String {
    let length = PARENS_LAZY.replace_all(value, "").replace("&nbsp;", " ");
    let length = strip_thousands_commas(&join_digit_groups(&length)).replace(',', ".");
    let length = apply_convert_template(length);
    let length = TEMPLATE_LAZY.replace_all(&length, "");

    match MEASURE.captures(&length) {
        Some(caps) => {
            let number = caps[1].trim();
            match caps.get(2) {
                Some(unit) => convert_text(number, unit.as_str().trim_matches('.').trim()),
                None => number.to_string(),
            }
        }
        None => String::new(),
    }
}

/// Discharge in m³/s.
pub fn streamflow(value: &str) -> String {
    let flow = PARENS_LAZY.replace_all(value, "");
    let flow = strip_thousands_commas(&flow.trim().replace("&nbsp;", ""));
    let flow = apply_convert_template(flow);
    let flow = join_digit_groups(&flow);
    let flow = LEADING_NON_DIGITS.replace(&flow, "$1").replace(',', ".");

    match FLOW.captures(&flow) {
        Some(caps) => match caps.get(2) {
            Some(unit) => convert_text(&caps[1], unit.as_str()),
            None => caps[1].to_string(),
        },
        None => String::new(),
    }
}

/// Population count. `coefficient` maps a trailing word such as "million" to
/// its multiplier (1.0 when the word is not a multiplier).
pub fn population<F>(value: &str, coefficient: F) -> String
where
    F: Fn(&str) -> f64,
{
    if PLAINLIST.is_match(value) {
        return String::new();
    }

    let pop = PARENS_LAZY.replace_all(value, "");
    let pop = NOWRAP.replace_all(&pop, "$1").replace("&nbsp;", "");
    let pop = strip_thousands_commas(&join_digit_groups(&pop));
    let pop = CIRCA.replace_all(&pop, "$1");
    let pop = TEMPLATE_LAZY.replace_all(&pop, "");
    let pop = pop.trim();

    if UNINHABITED.is_match(pop) {
        return "0".to_string();
    }

    match POPULATION.captures(pop) {
        Some(caps) => scaled_population(&caps, &coefficient),
        None => String::new(),
    }
}

fn scaled_population<F>(caps: &Captures, coefficient: &F) -> String
where
    F: Fn(&str) -> f64,
{
    let number = caps[1].trim();
    let Some(word) = caps.get(2) else {
        return number.to_string();
    };
    let coef = coefficient(word.as_str().trim());
    match number.parse::<f64>() {
        Ok(n) => format!("{}", (n * coef) as i64),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_coef(_: &str) -> f64 {
        1.0
    }

    // ─────────────────────────────────────────────────────────────
    // convert
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn metric_passes_through() {
        assert_eq!(convert(10.0, "km2", 2), "10");
        assert_eq!(convert(0.5, "KM", 2), "0.5");
    }

    #[test]
    fn square_miles_convert() {
        assert_eq!(convert(10.0, "sqmi", 2), "25.9");
        assert_eq!(convert(20.0, "sqmi", 2), "51.8");
    }

    #[test]
    fn feet_divide() {
        assert_eq!(convert(3280.8, "ft", 2), "1000");
    }

    #[test]
    fn unknown_unit_is_empty() {
        assert_eq!(convert(10.0, "furlong", 2), "");
        assert_eq!(convert_text("ten", "km"), "");
    }

    #[test]
    fn conversion_is_monotonic() {
        for unit in ["sqmi", "mi", "ft", "ha", "acre", "l/s", "km2"] {
            let mut last = f64::MIN;
            for x in [0.0, 1.0, 2.5, 10.0, 100.0, 12345.0] {
                let v: f64 = convert(x, unit, 2).parse().unwrap();
                assert!(v >= last, "{} not monotonic at {}", unit, x);
                last = v;
            }
        }
    }

    #[test]
    fn metric_rendering_is_idempotent() {
        let once = convert(12.75, "km2", 2);
        let twice = convert_text(&once, "km2");
        assert_eq!(once, twice);
    }

    // ─────────────────────────────────────────────────────────────
    // area
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn fix_area_values() {
        assert_eq!(fix_area("0.5"), "0.5");
        assert_eq!(fix_area("0,5"), "0.5");
        assert_eq!(
            fix_area("&nbsp; 0,5 {{nowrap|something}} (ref: 2016 messurements)"),
            "0.5"
        );
        assert_eq!(fix_area("1 000 000"), "1000000");
        assert_eq!(fix_area("1,000,000"), "1000000");
        assert_eq!(fix_area("10,000,5"), "10000.5");
    }

    #[test]
    fn area_from_template_or_text() {
        assert_eq!(area_from_text("{{convert|10|km2|sqmi}}").as_deref(), Some("10"));
        assert_eq!(area_from_text("{{cvt|10|km2|sqmi}}").as_deref(), Some("10"));
        assert_eq!(area_from_text("10 km2").as_deref(), Some("10"));
        assert_eq!(area_from_text("10km2").as_deref(), Some("10"));
        assert_eq!(area_from_text("10").as_deref(), Some("10"));
        assert_eq!(area_from_text("unknown"), None);
    }

    // ─────────────────────────────────────────────────────────────
    // population
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn population_values() {
        assert_eq!(population("10", no_coef), "10");
        assert_eq!(population("10 &nbsp; (something)", no_coef), "10");
        assert_eq!(population("{{nowrap|10|20px}}", no_coef), "10");
        assert_eq!(population("{{circa|10}}", no_coef), "10");
        assert_eq!(population("uninhabited", no_coef), "0");
        assert_eq!(population("bez obyvatel", no_coef), "0");
        assert_eq!(population("10,000", no_coef), "10000");
        assert_eq!(population("10 000", no_coef), "10000");
    }

    #[test]
    fn population_applies_coefficient() {
        let coef = |w: &str| if w == "million" { 1e6 } else { 1.0 };
        assert_eq!(population("3 million", coef), "3000000");
    }

    #[test]
    fn population_in_list_is_dropped() {
        assert_eq!(population("{{plainlist|* 10 * 20}}", no_coef), "");
    }

    // ─────────────────────────────────────────────────────────────
    // length, height, streamflow
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn measure_values() {
        assert_eq!(measure("1 234 km"), "1234");
        assert_eq!(measure("{{convert|10|mi|km}}"), "16.09");
        assert_eq!(measure("979 m (3,212 ft)"), "979");
        assert_eq!(measure("none"), "");
    }

    #[test]
    fn streamflow_values() {
        assert_eq!(streamflow("avg. 1,500 m3/s"), "1500");
        assert_eq!(streamflow("{{convert|100|cuft/s|m3/s}}"), "2.83");
        assert_eq!(streamflow("12,5"), "12.5");
    }
}
