//! People: gender, birth and death, jobs, nationality and name variants.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::{Context, EntityCore};

lazy_static! {
    static ref PARENS: Regex = Regex::new(r"\(.*?\)").unwrap();
    static ref PIPED_LINK: Regex = Regex::new(r"\[\[[^\]]*?\|(.+?)\]\]").unwrap();
    static ref PLAIN_LINK: Regex = Regex::new(r"\[\[(.+?)\]\]").unwrap();
    static ref NOWRAP: Regex = Regex::new(r"(?i)\{\{nowrap\|([^}]+)\}\}").unwrap();
    static ref BOLD_ITALIC: Regex = Regex::new(r"'{2,3}").unwrap();
    static ref PLAINLIST: Regex =
        Regex::new(r"(?i)\{\{(?:(?:indented\s)?plainlist|flatlist)\s*?\|(.*?)\}\}").unwrap();
    static ref HLIST: Regex = Regex::new(r"(?i)\{\{(?:hlist|ubl|unbulleted\slist)\s*?\|(.*?)\}\}").unwrap();
    static ref TEMPLATE: Regex = Regex::new(r"\{\{.*?\}\}").unwrap();
    static ref JOB_SEPARATOR: Regex = Regex::new(r"[;*•]").unwrap();

    static ref CITATION_OR_FLAG: Regex = Regex::new(r"(?i)\{\{(?:citation|flagicon)[^}]*?\}\}").unwrap();
    static ref MEDIA_LINK: Regex = Regex::new(r"(?i)\[\[(?:image|file|soubor|obrázek):[^\]]*?\]\]").unwrap();
    static ref BRACKETS: Regex = Regex::new(r"\[|\]").unwrap();
    static ref TEMPLATE_ARGUMENT: Regex = Regex::new(r"\{\{.+?\|(.+?)\}\}").unwrap();
    static ref TEMPLATE_NAME: Regex = Regex::new(r"\{\{(.*?)\}\}").unwrap();
    static ref CONJUNCTION: Regex = Regex::new(r"\s(?:and|a)\s").unwrap();
    static ref WIDE_SPACE: Regex = Regex::new(r"\s{2,}").unwrap();

    static ref ART_LINK: Regex = Regex::new(r"\[\[.*?\|([^\|]*?)\]\]").unwrap();
    static ref URL_TEMPLATE: Regex = Regex::new(r"(?i)\{\{url\|(?:.*?=)?([^\|\}]+).*?\}\}").unwrap();
    static ref EXTERNAL_LINK: Regex = Regex::new(r"\[(.*?)\s.*?\]").unwrap();

    static ref SAINTS: Regex = Regex::new(r"saints (\w+) and (\w+)").unwrap();
    static ref SAINTS_CI: Regex = Regex::new(r"(?i)saints (\w+) and (\w+)").unwrap();
    static ref EMPTY_BOLD: Regex = Regex::new(r"'{3}\s*'{3}").unwrap();
    static ref BOLD_IN_PARENS: Regex = Regex::new(r"\(('{3}.*?)'{3}\)\s*'{3}").unwrap();
    static ref BOLD: Regex = Regex::new(r"'{3}(.*?)'{3}").unwrap();
    static ref BOLD_RUN: Regex = Regex::new(r"'{3,}").unwrap();
    static ref ITALIC_RUN: Regex = Regex::new(r"'{2,}").unwrap();
    static ref LEADING_AND: Regex = Regex::new(r"^(?:and|&)").unwrap();
    static ref INNER_AND: Regex = Regex::new(r"\s+(?:and|&)\s+").unwrap();
    static ref COMPANIONS: Regex = Regex::new(r"(?i)companions").unwrap();

    static ref NAME_IN_PARENS: Regex =
        Regex::new(r"^'''([^,\(]*?)\(([^\(]*?)\)\s*[^\w]*?([^']+)'''").unwrap();
    static ref NAME_IN_QUOTES: Regex = Regex::new(r#"'''([^\(]*?)"(.*?)"\s.*?([^']+)'''"#).unwrap();
    static ref ALSO_KNOWN: Regex =
        Regex::new(r"(?:někdy|nebo)?\s*\b(?:také|též|či|alias|or)\b").unwrap();
    static ref PARENS_OR_SEMICOLON: Regex = Regex::new(r"\(|\)|;").unwrap();
    static ref NEE: Regex = Regex::new(r"\{\{nee\|(.*?)\}\}").unwrap();
}

/// Columns only artists carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artist {
    pub art_forms: String,
    pub urls: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Person {
    pub gender: String,
    pub birth_date: String,
    pub birth_place: String,
    pub death_date: String,
    pub death_place: String,
    pub jobs: String,
    pub nationality: String,
    pub artist: Option<Artist>,
}

impl Person {
    pub fn assign(core: &mut EntityCore, ctx: &Context) -> Self {
        core.prefix = ctx.locale.person_prefix(core).to_string();
        core.collect_aliases(ctx);

        let kw = ctx.keywords;
        let (birth_date, death_date) = ctx.locale.person_dates(core);
        let place = |keys: &[String]| {
            let value = core.first_value(keys);
            if value.is_empty() {
                String::new()
            } else {
                ctx.locale.clean_place(value)
            }
        };

        let mut person = Person {
            gender: gender(core, ctx),
            birth_date,
            birth_place: place(&kw.birth_place),
            death_date,
            death_place: place(&kw.death_place),
            jobs: jobs(core.first_value(&kw.jobs)),
            nationality: nationality(core.first_value(&kw.nationality)),
            artist: None,
        };
        person.fill_from_sentence(core, ctx);

        if core.prefix == "person:artist" {
            person.artist = Some(Artist {
                art_forms: art_forms(core),
                urls: urls(core.field("website")),
            });
        }

        if core.prefix == "person:group" {
            group_aliases(core);
        } else {
            person_aliases(core, ctx, &person.gender);
        }
        person
    }

    /// Fill empty dates and places from the first sentence's parenthesis.
    fn fill_from_sentence(&mut self, core: &EntityCore, ctx: &Context) {
        let complete = [&self.birth_date, &self.death_date, &self.birth_place, &self.death_place]
            .iter()
            .all(|f| !f.is_empty());
        if complete || core.first_sentence.is_empty() {
            return;
        }
        let facts = ctx.locale.sentence_facts(&core.first_sentence);
        for (field, found) in [
            (&mut self.birth_date, facts.birth_date),
            (&mut self.death_date, facts.death_date),
            (&mut self.birth_place, facts.birth_place),
            (&mut self.death_place, facts.death_place),
        ] {
            if field.is_empty() {
                *field = found;
            }
        }
    }

    pub fn columns(&self, prefix: &str) -> Vec<String> {
        let mut columns = vec![
            self.gender.clone(),
            self.birth_date.clone(),
            self.birth_place.clone(),
            self.death_date.clone(),
            self.death_place.clone(),
            self.jobs.clone(),
            self.nationality.clone(),
        ];
        if prefix == "person:artist" {
            let artist = self.artist.clone().unwrap_or_default();
            columns.extend([
                artist.art_forms,
                String::new(),
                String::new(),
                String::new(),
                artist.urls,
            ]);
        }
        columns
    }
}

fn word_match(pattern: &Option<Regex>, text: &str) -> bool {
    pattern.as_ref().map_or(false, |p| p.is_match(text))
}

/// "M" or "F" from the gender field, otherwise from the categories
/// ("Female novelists"). Fictional characters are never guessed.
fn gender(core: &EntityCore, ctx: &Context) -> String {
    let kw = ctx.keywords;
    let value = core.first_value(&kw.gender);
    if !value.is_empty() {
        let value = value.to_lowercase();
        let value = PARENS.replace_all(value.trim(), "");
        let value = value.trim();
        if kw.male.iter().any(|m| m == value) {
            return "M".to_string();
        }
        if kw.female.iter().any(|f| f == value) {
            return "F".to_string();
        }
        debug!(value = %value, title = %core.title, "invalid gender");
    }

    if core.prefix == "person:fictional" {
        return String::new();
    }
    let categories: Vec<String> = core.categories().iter().map(|c| c.to_lowercase()).collect();
    if categories.iter().any(|c| word_match(&ctx.matchers.female, c)) {
        return "F".to_string();
    }
    if categories.iter().any(|c| word_match(&ctx.matchers.male, c)) {
        return "M".to_string();
    }
    String::new()
}

fn split_trimmed(value: &str, sep: char) -> impl Iterator<Item = String> + '_ {
    value
        .split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Occupations joined by `|`.
pub fn jobs(data: &str) -> String {
    if data.is_empty() {
        return String::new();
    }
    let value = PIPED_LINK.replace_all(data, "$1");
    let value = PLAIN_LINK.replace_all(&value, "$1");
    let value = NOWRAP.replace_all(&value, "$1");
    let value = PARENS.replace_all(&value, "");
    let value = BOLD_ITALIC.replace_all(value.trim(), "");
    let value = value.replace("&nbsp;", " ").replace('\n', "");
    let mut value = value.trim().to_string();

    let mut jobs: Vec<String> = Vec::new();
    if let Some(caps) = PLAINLIST.captures(&value) {
        let items: Vec<String> = split_trimmed(&caps[1], '*').collect();
        if !items.is_empty() {
            jobs.extend(items);
            value = PLAINLIST.replace_all(&value, "").trim().to_string();
        }
    }
    if let Some(caps) = HLIST.captures(&value) {
        let items: Vec<String> = split_trimmed(&caps[1], '|').collect();
        if !items.is_empty() {
            jobs.extend(items);
            value = HLIST.replace_all(&value, "").trim().to_string();
        }
    }

    let value = TEMPLATE.replace_all(&value, "");
    let value = value.trim();
    if let Some(sep) = JOB_SEPARATOR.find(value).and_then(|m| m.as_str().chars().next()) {
        jobs.extend(split_trimmed(value, sep));
    } else if !value.is_empty() {
        let value = value.replace(", and", ",");
        jobs.extend(split_trimmed(&value, ','));
    }
    jobs.join("|")
}

/// Nationalities joined by `|`.
pub fn nationality(data: &str) -> String {
    if data.is_empty() {
        return String::new();
    }
    let value = CITATION_OR_FLAG.replace_all(data, "");
    let value = MEDIA_LINK.replace_all(&value, "");
    let value = PIPED_LINK.replace_all(&value, "$1");
    let value = PLAIN_LINK.replace_all(&value, "$1");
    let value = BRACKETS.replace_all(&value, "");
    let value = PARENS.replace_all(&value, "");
    let value = TEMPLATE_ARGUMENT.replace_all(value.trim(), "$1");
    let value = TEMPLATE_NAME.replace_all(&value, "$1");
    let value = CONJUNCTION.replace_all(value.trim(), ",");
    let value = WIDE_SPACE.replace_all(&value, ",");

    let separator = ['/', '-', '–', ','].into_iter().find(|&sep| value.contains(sep));
    match separator {
        Some(sep) => split_trimmed(&value, sep).collect::<Vec<_>>().join("|"),
        None => value.into_owned(),
    }
}

fn art_forms(core: &EntityCore) -> String {
    let mut forms: Vec<String> = Vec::new();
    for key in ["movement", "field"] {
        let value = core.field(key).replace('\n', " ");
        if value.is_empty() || value.contains("''") {
            continue;
        }
        let value = ART_LINK.replace_all(&value, "$1");
        let value = BRACKETS.replace_all(&value, "");
        let value = TEMPLATE.replace_all(&value, "").to_lowercase();
        let mut items: Vec<&str> = value.split(',').map(str::trim).collect();
        if items.len() == 1 {
            items = items[0].split('/').map(str::trim).collect();
        }
        let joined = items.join("|");
        if !joined.is_empty() {
            forms.push(joined);
        }
    }
    forms.join("|")
}

fn urls(website: &str) -> String {
    let value = URL_TEMPLATE.replace_all(website, "$1");
    EXTERNAL_LINK.replace_all(&value, "$1").into_owned()
}

/// Members of a group named in the title or the bold names of the first
/// sentence ("'''Simon''' and '''Garfunkel'''").
fn group_aliases(core: &mut EntityCore) {
    let mut aliases: Vec<String> = Vec::new();
    if let Some(caps) = SAINTS.captures(&core.title) {
        aliases.push(format!("Saint {}", &caps[1]));
        aliases.push(format!("Saint {}", &caps[2]));
    }

    let sentence = EMPTY_BOLD.replace_all(&core.first_sentence, " ");
    let sentence = BOLD_IN_PARENS.replace_all(&sentence, "$1 ");
    let title = core.title.to_lowercase();

    for caps in BOLD.captures_iter(&sentence) {
        let m = ITALIC_RUN.replace_all(&caps[1], "");
        if m.to_lowercase() == title {
            continue;
        }
        if let Some(saints) = SAINTS_CI.captures(&m) {
            aliases.push(format!("Saint {}", &saints[1]));
            aliases.push(format!("Saint {}", &saints[2]));
            continue;
        }
        for value in m.split(',') {
            let value = LEADING_AND.replace(value.trim(), "");
            for name in INNER_AND.split(value.trim()) {
                if !COMPANIONS.is_match(name) {
                    aliases.push(name.replace('"', ""));
                }
            }
        }
    }

    for alias in aliases {
        core.aliases.add(&alias, None);
    }
}

fn clean_name_part(part: &str) -> String {
    let part = ALSO_KNOWN.replace_all(part, "");
    let part = part.replace(['(', ')', '\''], "");
    part.trim().to_string()
}

/// Name variants of an individual: "Given (Nick) Surname", quoted nicknames,
/// maiden names and the remaining bold names of the first sentence.
fn person_aliases(core: &mut EntityCore, ctx: &Context, gender: &str) {
    if core.first_sentence.is_empty() {
        return;
    }
    for (alias, lang) in ctx.locale.person_aliases(core, gender) {
        core.aliases.add(&alias, lang.as_deref());
    }

    let lang = core.lang.clone();
    let mut sentence = core.first_sentence.clone();
    for pattern in [&*NAME_IN_PARENS, &*NAME_IN_QUOTES] {
        let Some(caps) = pattern.captures(&sentence) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if pattern.as_str() == NAME_IN_PARENS.as_str() {
            let before_close = sentence[..whole.end() - 3].chars().last();
            if before_close.map_or(false, |c| c.is_whitespace() || c == '"') {
                continue;
            }
        }
        let parts: Vec<String> = (1..caps.len())
            .map(|i| clean_name_part(caps.get(i).map_or("", |m| m.as_str())))
            .collect();
        if parts.len() == 3 {
            core.aliases.add(&format!("{} {}", parts[0], parts[2]), Some(&lang));
            core.aliases.add(&format!("{} {}", parts[1], parts[2]), Some(&lang));
        }
        let (start, end) = (whole.start(), whole.end());
        sentence = format!("{}{}{}", &sentence[..start], parts.join(" "), &sentence[end..]);
    }

    let mut sentence = EMPTY_BOLD.replace_all(&sentence, " ").into_owned();

    if let Some(caps) = NEE.captures(&sentence) {
        let surname = caps[1].replace('\'', "");
        let mut given: Vec<&str> = core.title.split(' ').collect();
        given.pop();
        core.aliases.add(&format!("{} {}", given.join(" "), surname), None);
        if let Some(whole) = caps.get(0) {
            let (start, end) = (whole.start(), whole.end());
            sentence = format!("{}{}{}", &sentence[..start], surname, &sentence[end..]);
        }
    }

    for caps in BOLD.captures_iter(&sentence) {
        let alias = PARENS_OR_SEMICOLON.replace_all(&caps[1], "");
        let alias = ITALIC_RUN.replace_all(&alias, "");
        core.aliases.add(&alias, None);
    }

    core.first_sentence = BOLD_RUN.replace_all(&sentence, "").into_owned();
}
