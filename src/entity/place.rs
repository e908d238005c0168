//! Geographic kinds: countries, settlements, water bodies and other
//! features (mountains, islands, waterfalls, ...).

use lazy_static::lazy_static;
use regex::Regex;

use super::{Context, EntityCore};
use crate::normalize::coords::Coordinates;
use crate::normalize::units;

lazy_static! {
    static ref CZECH_LANDS: Regex = Regex::new(r"Čechy|Morava|Slezsko|CZE?").unwrap();
    static ref PARENS: Regex = Regex::new(r"\(.*?\)").unwrap();
    static ref COUNTRY_TEMPLATE: Regex = Regex::new(
        r"(?i)\{\{(?:nowrap|flagu?|country|flagcountry|vlajka\s+a\s+název)\|([^\|]+)(.*?)?\}\}"
    )
    .unwrap();
    static ref PIPED_LINK: Regex = Regex::new(r"\[\[.*?\|([^\|\[]*?)\]\]").unwrap();
    static ref SOURCE_LINK: Regex = Regex::new(r"\[\[.*?\|([^\|]*?)\]\]").unwrap();
    static ref BRACKETS: Regex = Regex::new(r"\[|\]").unwrap();
    static ref PLAINLIST_FIRST: Regex = Regex::new(r"\{\{plainlist\|\s*\*\s*(.+?)\*.*").unwrap();
    static ref BARE_TEMPLATE: Regex = Regex::new(r"\{\{([^\|]+?)\}\}").unwrap();
    static ref TEMPLATE: Regex = Regex::new(r"\{\{.*?\}\}").unwrap();
    static ref ITALICS: Regex = Regex::new(r"'{2}").unwrap();
}

/// Infobox names that fix the country of a settlement by themselves.
const COUNTRY_BY_INFOBOX: &[(&str, &str)] = &[
    ("česká obec", "Czech Republic"),
    ("statutární město", "Czech Republic"),
    ("anglické město", "United Kingdom"),
];

/// Country name from a `subdivision_name`-like value.
pub fn fix_country(value: &str) -> String {
    let country = if CZECH_LANDS.is_match(value) {
        "Czech Republic".to_string()
    } else {
        value.replace('\n', "")
    };
    let country = PARENS.replace_all(&country, "");
    let country = COUNTRY_TEMPLATE.replace_all(&country, "$1");
    let country = PIPED_LINK.replace_all(&country, "$1");
    let country = BRACKETS.replace_all(&country, "");
    let country = PLAINLIST_FIRST.replace_all(&country, "$1");
    let country = BARE_TEMPLATE.replace_all(&country, "$1");
    let country = TEMPLATE.replace_all(&country, "");
    country.replace(',', "").trim().to_string()
}

/// Source location of a river.
pub fn fix_source(value: &str) -> String {
    let source = SOURCE_LINK.replace_all(value, "$1");
    let source = BRACKETS.replace_all(&source, "");
    let source = ITALICS.replace_all(&source, "");
    let source = TEMPLATE.replace_all(&source, "").replace("()", "");
    source.trim().trim_matches(',').trim().to_string()
}

fn locate(core: &EntityCore, ctx: &Context) -> Coordinates {
    ctx.locale.coordinates(core, ctx.geocoder)
}

fn place_aliases(core: &mut EntityCore, ctx: &Context) {
    core.collect_aliases(ctx);
    core.non_person_aliases(ctx);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Country {
    pub latitude: String,
    pub longitude: String,
    pub area: String,
    pub population: String,
}

impl Country {
    pub fn assign(core: &mut EntityCore, ctx: &Context) -> Self {
        core.prefix = ctx.locale.country_prefix(core).to_string();
        let (latitude, longitude) = locate(core, ctx);
        let country = Country {
            latitude,
            longitude,
            area: core.area(ctx.keywords),
            population: core.population(ctx),
        };
        place_aliases(core, ctx);
        country
    }

    pub fn columns(&self) -> Vec<String> {
        vec![
            self.latitude.clone(),
            self.longitude.clone(),
            self.area.clone(),
            self.population.clone(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
    pub country: String,
    pub latitude: String,
    pub longitude: String,
    pub area: String,
    pub population: String,
}

impl Settlement {
    pub fn assign(core: &mut EntityCore, ctx: &Context) -> Self {
        let country = match COUNTRY_BY_INFOBOX.iter().find(|(name, _)| *name == core.infobox_name()) {
            Some((_, country)) => country.to_string(),
            None => {
                let value = core.first_value(&ctx.keywords.country);
                if value.is_empty() {
                    String::new()
                } else {
                    fix_country(value)
                }
            }
        };
        let (latitude, longitude) = locate(core, ctx);
        let settlement = Settlement {
            country,
            latitude,
            longitude,
            area: core.area(ctx.keywords),
            population: core.population(ctx),
        };
        place_aliases(core, ctx);
        settlement
    }

    pub fn columns(&self) -> Vec<String> {
        vec![
            self.country.clone(),
            self.latitude.clone(),
            self.longitude.clone(),
            self.area.clone(),
            self.population.clone(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Waterarea {
    pub continents: String,
    pub latitude: String,
    pub longitude: String,
    pub area: String,
}

impl Waterarea {
    pub fn assign(core: &mut EntityCore, ctx: &Context) -> Self {
        let (latitude, longitude) = locate(core, ctx);
        let waterarea = Waterarea {
            continents: ctx.locale.continents(core),
            latitude,
            longitude,
            area: core.area(ctx.keywords),
        };
        place_aliases(core, ctx);
        waterarea
    }

    pub fn columns(&self) -> Vec<String> {
        vec![
            self.continents.clone(),
            self.latitude.clone(),
            self.longitude.clone(),
            self.area.clone(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watercourse {
    pub continents: String,
    pub latitude: String,
    pub longitude: String,
    pub length: String,
    pub area: String,
    pub streamflow: String,
    pub source: String,
}

impl Watercourse {
    pub fn assign(core: &mut EntityCore, ctx: &Context) -> Self {
        let kw = ctx.keywords;
        let measured = |keys: &[String], normalize: fn(&str) -> String| {
            let value = core.first_value(keys);
            if value.is_empty() {
                String::new()
            } else {
                normalize(value)
            }
        };
        let (latitude, longitude) = locate(core, ctx);
        let watercourse = Watercourse {
            continents: ctx.locale.continents(core),
            latitude,
            longitude,
            length: measured(&kw.length, units::measure),
            area: core.area(kw),
            streamflow: measured(&kw.streamflow, units::streamflow),
            source: measured(&kw.source, fix_source),
        };
        place_aliases(core, ctx);
        watercourse
    }

    pub fn columns(&self) -> Vec<String> {
        vec![
            self.continents.clone(),
            self.latitude.clone(),
            self.longitude.clone(),
            self.length.clone(),
            self.area.clone(),
            self.streamflow.clone(),
            self.source.clone(),
        ]
    }
}

/// Other natural features. Which columns are filled depends on the prefix
/// the locale assigns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Geo {
    pub continent: String,
    pub latitude: String,
    pub longitude: String,
    pub area: String,
    pub population: String,
    pub total_height: String,
}

fn has_continent(prefix: &str) -> bool {
    matches!(prefix, "geo:waterfall" | "geo:island" | "geo:relief")
}

fn has_extent(prefix: &str) -> bool {
    matches!(prefix, "geo:island" | "geo:continent")
}

impl Geo {
    pub fn assign(core: &mut EntityCore, ctx: &Context) -> Self {
        core.prefix = ctx.locale.geo_prefix(core).to_string();
        let (latitude, longitude) = locate(core, ctx);
        let mut geo = Geo {
            latitude,
            longitude,
            ..Default::default()
        };

        let prefix = core.prefix.clone();
        if prefix == "geo:waterfall" {
            let height = core.first_value(&ctx.keywords.height);
            if !height.is_empty() {
                geo.total_height = units::measure(height);
            }
        }
        if has_extent(&prefix) {
            geo.area = core.area(ctx.keywords);
            geo.population = core.population(ctx);
        }
        if has_continent(&prefix) {
            geo.continent = ctx.locale.continents(core);
        }
        place_aliases(core, ctx);
        geo
    }

    pub fn columns(&self, prefix: &str) -> Vec<String> {
        let mut columns = Vec::new();
        if has_continent(prefix) {
            columns.push(self.continent.clone());
        }
        columns.push(self.latitude.clone());
        columns.push(self.longitude.clone());
        if has_extent(prefix) {
            columns.push(self.area.clone());
            columns.push(self.population.clone());
        }
        if prefix == "geo:waterfall" {
            columns.push(self.total_height.clone());
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::unique::KEY_LANG;

    #[test]
    fn country_values() {
        assert_eq!(fix_country("{{flag|United States}}"), "United States");
        assert_eq!(fix_country("[[Czech Republic|Czechia]]"), "Czechia");
        assert_eq!(fix_country("[[Morava]]"), "Czech Republic");
        assert_eq!(fix_country("{{plainlist|\n* [[France]]\n* [[Spain]]}}"), "France");
        assert_eq!(fix_country("{{USA}}"), "USA");
    }

    #[test]
    fn source_values() {
        assert_eq!(fix_source("[[Rocky Mountains|Rockies]], ''Colorado''"), "Rockies, Colorado");
        assert_eq!(fix_source("Lake Itasca {{coord|47|N|95|W}}"), "Lake Itasca");
    }

    #[test]
    fn country_entity() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core_from_markup(
            "country",
            "Ruritania",
            "{{Infobox country\n| coordinates = {{coord|48|N|16|E}}\n| area_km2 = 12 345\n| population_estimate = 1 500 000\n}}\n\
             '''Ruritania''', officially the '''Kingdom of Ruritania''', is a country in Europe.",
        );
        let country = Country::assign(&mut core, &fixture.ctx());
        assert_eq!(core.prefix, "country");
        assert_eq!(country.columns(), vec!["48.0", "16.0", "12345", "1500000"]);
        assert_eq!(
            core.aliases.get("Kingdom of Ruritania").and_then(|p| p.get(KEY_LANG)),
            Some("en")
        );
    }

    #[test]
    fn settlement_country() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("settlement", "Springfield", &[("subdivision_name", "{{flag|United States}}")]);
        let settlement = Settlement::assign(&mut core, &fixture.ctx());
        assert_eq!(settlement.country, "United States");
        assert_eq!(settlement.columns().len(), 5);

        let fixture = Fixture::new("cs");
        let mut core = fixture.core("settlement", "Kocourkov", &[]);
        core.markup.infobox_name = "česká obec".to_string();
        let settlement = Settlement::assign(&mut core, &fixture.ctx());
        assert_eq!(settlement.country, "Czech Republic");
    }

    #[test]
    fn watercourse_measures() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core(
            "watercourse",
            "Blue River",
            &[
                ("length", "{{convert|10|mi|km}}"),
                ("discharge1_avg", "{{convert|100|cuft/s|m3/s}}"),
                ("source1_location", "[[Rocky Mountains|Rockies]]"),
            ],
        );
        let river = Watercourse::assign(&mut core, &fixture.ctx());
        assert_eq!(river.length, "16.09");
        assert_eq!(river.streamflow, "2.83");
        assert_eq!(river.source, "Rockies");
        assert_eq!(river.columns().len(), 7);
    }

    #[test]
    fn waterarea_continents() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("waterarea", "Lake Baikal", &[("location", "Siberia, Asia")]);
        let lake = Waterarea::assign(&mut core, &fixture.ctx());
        assert_eq!(lake.continents, "Asia");
        assert_eq!(lake.columns().len(), 4);
    }

    #[test]
    fn geo_columns_follow_prefix() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("geo", "Angel Falls", &[("height", "979 m")]);
        core.markup.infobox_name = "waterfall".to_string();
        let geo = Geo::assign(&mut core, &fixture.ctx());
        assert_eq!(core.prefix, "geo:waterfall");
        assert_eq!(geo.total_height, "979");
        assert_eq!(geo.columns(&core.prefix).len(), 4);

        assert_eq!(geo.columns("geo:island").len(), 5);
        assert_eq!(geo.columns("geo:peninsula").len(), 2);
        assert_eq!(geo.columns("geo:continent").len(), 4);
        assert_eq!(geo.columns("geo:relief").len(), 3);
    }
}
