//! Events: start and end dates, places and event type.

use lazy_static::lazy_static;
use regex::Regex;

use super::{remove_templates, Context, EntityCore};

const START_KEYS: &[&str] = &["year", "start_date", "first_aired", "election_date", "začátek"];
const END_KEYS: &[&str] = &["end_date", "konec"];
const DATE_KEYS: &[&str] = &["date", "datum"];
const LOCATION_KEYS: &[&str] = &[
    "place",
    "country",
    "location",
    "areas",
    "city",
    "host_city",
    "cities",
    "affected",
    "site",
    "venue",
    "místo",
    "země",
];

lazy_static! {
    static ref WIDE_GAP: Regex = Regex::new(r"[ \t]{2,}").unwrap();
    static ref BARE_NUMBER: Regex = Regex::new(r"^\d+\.?$").unwrap();
    static ref BARE_WORD: Regex = Regex::new(r"^[^\W\d_]+$").unwrap();
    static ref MONTH_YEAR: Regex = Regex::new(r"([^\W\d_]+\.?\s+\d+)\s*$").unwrap();
    static ref YEAR: Regex = Regex::new(r"(\d+)\s*$").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub start: String,
    pub end: String,
    pub locations: String,
    pub kind: String,
}

impl Event {
    pub fn assign(core: &mut EntityCore, ctx: &Context) -> Self {
        let (start, end) = dates(core, ctx);
        let event = Event {
            start,
            end,
            locations: locations(core),
            kind: event_type(core),
        };
        core.collect_aliases(ctx);
        core.non_person_aliases(ctx);
        event
    }

    pub fn columns(&self) -> Vec<String> {
        vec![
            self.start.clone(),
            self.end.clone(),
            self.locations.clone(),
            self.kind.clone(),
        ]
    }
}

fn dates(core: &EntityCore, ctx: &Context) -> (String, String) {
    let mut start = core
        .values(START_KEYS)
        .last()
        .map(|v| ctx.locale.parse_date(v).0)
        .unwrap_or_default();
    let end_value = core.first_value(END_KEYS);
    let mut end = if end_value.is_empty() {
        String::new()
    } else {
        ctx.locale.parse_date(end_value).0
    };

    let date = core.first_value(DATE_KEYS);
    if !date.is_empty() {
        if let Some((from, to)) = date_range(date, ctx) {
            start = from;
            end = to;
        }
    }
    (start, end)
}

/// Start and end of a `date` value such as `4–6 June 2010` or
/// `June–July 2010`. The first half borrows whatever it leaves out from the
/// second. `None` when the halves cannot be completed.
fn date_range(value: &str, ctx: &Context) -> Option<(String, String)> {
    let parts: Vec<&str> = value.split('–').map(str::trim).filter(|p| !p.is_empty()).collect();
    match parts.as_slice() {
        [] => None,
        [single] => Some(ctx.locale.parse_date(single)),
        [first, second, ..] => {
            let first = if BARE_NUMBER.is_match(first) {
                let caps = MONTH_YEAR.captures(second)?;
                format!("{} {}", first, &caps[1])
            } else if BARE_WORD.is_match(first) {
                let caps = YEAR.captures(second)?;
                format!("{} {}", first, &caps[1])
            } else {
                first.to_string()
            };
            Some((ctx.locale.parse_date(&first).0, ctx.locale.parse_date(second).0))
        }
    }
}

/// Places separated by `|`. Long comma lists and column layouts are split;
/// a short comma list is one place ("Paris, France").
fn locations(core: &EntityCore) -> String {
    let value = remove_templates(core.first_value(LOCATION_KEYS));
    let value = value.trim();
    if WIDE_GAP.is_match(value) {
        return WIDE_GAP.replace_all(value, "|").into_owned();
    }
    let parts: Vec<&str> = value.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
    if parts.len() > 5 {
        parts.join("|")
    } else {
        value.to_string()
    }
}

fn event_type(core: &EntityCore) -> String {
    let mut kind = remove_templates(core.field("type")).trim().to_lowercase();
    let name = core.infobox_name().trim().to_lowercase();
    let name = if name == "event" { String::new() } else { name };

    if kind.is_empty() {
        kind = name.clone();
    }
    if name == "election" && kind != "election" {
        kind = if kind.is_empty() {
            "election".to_string()
        } else {
            format!("{} election", kind)
        };
    }
    kind
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Dates
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn start_and_end_fields() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core(
            "event",
            "Battle of Somewhere",
            &[("start_date", "{{start date|1916|7|1}}"), ("end_date", "18 November 1916")],
        );
        let event = Event::assign(&mut core, &fixture.ctx());
        assert_eq!(event.start, "1916-07-01");
        assert_eq!(event.end, "1916-11-18");
    }

    #[test]
    fn date_ranges_borrow_from_the_end() {
        let fixture = Fixture::new("en");
        let ctx = fixture.ctx();
        assert_eq!(
            date_range("4–6 June 2010", &ctx),
            Some(("2010-06-04".to_string(), "2010-06-06".to_string()))
        );
        assert_eq!(
            date_range("June – July 2010", &ctx),
            Some(("2010-06-??".to_string(), "2010-07-??".to_string()))
        );
        assert_eq!(
            date_range("1 September 1939", &ctx),
            Some(("1939-09-01".to_string(), String::new()))
        );
        assert_eq!(date_range("4–June", &ctx), None);
    }

    #[test]
    fn date_field_overrides_start() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("event", "Festival", &[("year", "1900"), ("date", "12–14 August 1969")]);
        let event = Event::assign(&mut core, &fixture.ctx());
        assert_eq!(event.start, "1969-08-12");
        assert_eq!(event.end, "1969-08-14");
    }

    // ─────────────────────────────────────────────────────────────
    // Places and type
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn short_comma_list_is_one_place() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("event", "Summit", &[("location", "[[Paris]], [[France]]")]);
        assert_eq!(Event::assign(&mut core, &fixture.ctx()).locations, "Paris, France");
    }

    #[test]
    fn long_lists_and_columns_are_split() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("event", "Tour", &[("cities", "A, B, C, D, E, F")]);
        assert_eq!(Event::assign(&mut core, &fixture.ctx()).locations, "A|B|C|D|E|F");

        let mut core = fixture.core("event", "Games", &[("host_city", "Athens  Sparta")]);
        assert_eq!(Event::assign(&mut core, &fixture.ctx()).locations, "Athens|Sparta");
    }

    #[test]
    fn election_type() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("event", "Vote", &[("type", "Presidential")]);
        core.markup.infobox_name = "Election".to_string();
        assert_eq!(Event::assign(&mut core, &fixture.ctx()).kind, "presidential election");

        let mut core = fixture.core("event", "Vote", &[]);
        core.markup.infobox_name = "election".to_string();
        assert_eq!(Event::assign(&mut core, &fixture.ctx()).kind, "election");

        let mut core = fixture.core("event", "Party", &[]);
        core.markup.infobox_name = "Event".to_string();
        assert_eq!(Event::assign(&mut core, &fixture.ctx()).kind, "");
    }

    #[test]
    fn czech_event() {
        let fixture = Fixture::new("cs");
        let mut core = fixture.core("event", "Bitva u Slavkova", &[("datum", "2. prosince 1805"), ("místo", "[[Slavkov u Brna]]")]);
        let event = Event::assign(&mut core, &fixture.ctx());
        assert_eq!(event.start, "1805-12-02");
        assert_eq!(event.locations, "Slavkov u Brna");
    }
}
