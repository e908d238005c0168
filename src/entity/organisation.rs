//! Organisations: founding and dissolution dates, type and seat.

use super::{remove_templates, Context, EntityCore};

const FOUNDED_KEYS: &[&str] = &[
    "formation",
    "foundation",
    "founded",
    "fouded_date",
    "established",
    "založení",
    "vznik",
];
const CANCELLED_KEYS: &[&str] = &["defunct", "banned", "dissolved", "zánik", "zrušení"];
const ACTIVE_KEYS: &[&str] = &["active", "dates", "působení"];

const LOCATION_KEYS: &[&str] = &["location", "headquarters", "hq_location", "area", "sídlo"];
const COUNTRY_KEYS: &[&str] = &["location_country", "country", "hq_location_country", "země"];
const CITY_KEYS: &[&str] = &["location_city", "hq_location_city", "město"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Organisation {
    pub founded: String,
    pub cancelled: String,
    pub kind: String,
    pub location: String,
}

impl Organisation {
    pub fn assign(core: &mut EntityCore, ctx: &Context) -> Self {
        let (founded, cancelled) = dates(core, ctx);
        let mut kind = cleaned(core.first_value(&ctx.keywords.kind_type));
        if kind.is_empty() && !core.infobox_name().is_empty() && core.infobox_name().to_lowercase() != "organization" {
            kind = core.infobox_name().to_string();
        }
        let organisation = Organisation {
            founded,
            cancelled,
            kind,
            location: location(core),
        };
        core.collect_aliases(ctx);
        core.non_person_aliases(ctx);
        organisation
    }

    pub fn columns(&self) -> Vec<String> {
        vec![
            self.founded.clone(),
            self.cancelled.clone(),
            self.kind.clone(),
            self.location.clone(),
        ]
    }
}

fn cleaned(value: &str) -> String {
    remove_templates(value).trim().to_string()
}

fn first_date(core: &EntityCore, ctx: &Context, keys: &[&str]) -> String {
    let value = core.first_value(keys);
    if value.is_empty() {
        return String::new();
    }
    ctx.locale.parse_date(value).0
}

/// Founding and dissolution dates; an "active" span such as `1990–2005`
/// fills whichever of the two is still missing.
fn dates(core: &EntityCore, ctx: &Context) -> (String, String) {
    let mut founded = first_date(core, ctx, FOUNDED_KEYS);
    let mut cancelled = first_date(core, ctx, CANCELLED_KEYS);

    let active = core.first_value(ACTIVE_KEYS);
    if !active.is_empty() {
        let separator = if active.contains('–') { '–' } else { '-' };
        if let Some((from, to)) = active.split_once(separator).filter(|(_, to)| !to.contains(separator)) {
            if founded.is_empty() {
                founded = ctx.locale.parse_date(from).0;
            }
            if cancelled.is_empty() {
                cancelled = ctx.locale.parse_date(to).0;
            }
        }
    }
    (founded, cancelled)
}

/// "City, Country" when both are known, otherwise the most specific value
/// available.
fn location(core: &EntityCore) -> String {
    let location = cleaned(core.first_value(LOCATION_KEYS));
    let country = cleaned(core.first_value(COUNTRY_KEYS));
    let city = cleaned(core.first_value(CITY_KEYS));

    if !city.is_empty() && !country.is_empty() {
        format!("{}, {}", city, country)
    } else if !location.is_empty() {
        location
    } else if !country.is_empty() {
        country
    } else {
        city
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;

    #[test]
    fn english_organisation() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core(
            "organisation",
            "Acme Corporation",
            &[
                ("founded", "{{start date and age|1949|5|1}}"),
                ("defunct", "2001"),
                ("type", "[[Public company|Public]]"),
                ("location_city", "[[Springfield]]"),
                ("location_country", "United States"),
            ],
        );
        let org = Organisation::assign(&mut core, &fixture.ctx());
        assert_eq!(
            org.columns(),
            vec!["1949-05-01", "2001-??-??", "Public", "Springfield, United States"]
        );
    }

    #[test]
    fn active_span_and_infobox_type() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("organisation", "Band", &[("active", "1990–2005"), ("headquarters", "Leeds")]);
        core.markup.infobox_name = "musical artist".to_string();
        let org = Organisation::assign(&mut core, &fixture.ctx());
        assert_eq!(org.founded, "1990-??-??");
        assert_eq!(org.cancelled, "2005-??-??");
        assert_eq!(org.kind, "musical artist");
        assert_eq!(org.location, "Leeds");

        let mut core = fixture.core("organisation", "Other", &[]);
        core.markup.infobox_name = "Organization".to_string();
        assert_eq!(Organisation::assign(&mut core, &fixture.ctx()).kind, "");
    }

    #[test]
    fn czech_dates() {
        let fixture = Fixture::new("cs");
        let mut core = fixture.core("organisation", "Sokol", &[("založení", "16. února 1862"), ("sídlo", "[[Praha]]")]);
        let org = Organisation::assign(&mut core, &fixture.ctx());
        assert_eq!(org.founded, "1862-02-16");
        assert_eq!(org.location, "Praha");
    }
}
