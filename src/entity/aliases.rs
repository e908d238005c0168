//! Alias collection shared by every kind: infobox names, native names,
//! language templates and the bold names of a first sentence.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::{remove_templates, Context, EntityCore};
use crate::config::{LangMap, Matchers};
use crate::span;

lazy_static! {
    static ref UNKNOWN: Regex = Regex::new(r"(?i)nezveřejněn|neznám|unknown").unwrap();
    static ref TRAILING_PARENS: Regex = Regex::new(r"\((.*?)\)$").unwrap();
    static ref PARENS: Regex = Regex::new(r"\(.*?\)").unwrap();
    static ref IN_LANGUAGE: Regex = Regex::new(r"^in (\w+) (.+)").unwrap();
    static ref NICKNAME: Regex = Regex::new(r#"^.+?["\(](.+?)["\)].+$"#).unwrap();
    static ref NICKNAME_STRIP: Regex = Regex::new(r#"(^.+?)\s["\(].+?["\)](.+$)"#).unwrap();
    static ref BOLD_ITALIC: Regex = Regex::new(r"'{2,3}").unwrap();
    static ref TEMPLATES_GREEDY: Regex = Regex::new(r"(?s)\{\{.*\}\}").unwrap();
    static ref TEMPLATE: Regex = Regex::new(r"\{\{.*?\}\}").unwrap();
    static ref BRACKETS: Regex = Regex::new(r"\[|\]").unwrap();
    static ref PIPED_LINK: Regex = Regex::new(r"\[\[.*?\|([^\|]*?)\]\]").unwrap();

    static ref SMALL_NESTED: Regex = Regex::new(r"\{\{small\|([^\}]*?\{\{.*?\}\}.*?)\}\}").unwrap();
    static ref SMALL: Regex = Regex::new(r"\{\{small\|(.*?)\}\}").unwrap();
    static ref BREAK: Regex = Regex::new(r"<br ?/?>").unwrap();
    static ref QUOTES_AND_BOLD: Regex = Regex::new(r#"'{2,3}|""#).unwrap();
    static ref WIDE_GAP: Regex = Regex::new(r"[ \t]{2,}").unwrap();
    static ref QUOTES_AND_ITALIC: Regex = Regex::new(r#""|'{2,}"#).unwrap();
    static ref LABEL: Regex = Regex::new(r"[\w\s]+:").unwrap();
    static ref IN_LANG_TEMPLATE: Regex = Regex::new(r"\{\{in lang\|(.*?)\}\}").unwrap();
    static ref NATIVE_NAME_OR_PHRASE: Regex =
        Regex::new(r"\{\{(?:native (?:name|phrase))\|(.*?)\|(.*?)(?:\|.*?)?\}\}").unwrap();

    static ref NATIVE_LANG_TEMPLATE: Regex = Regex::new(r"lang-(\w+)").unwrap();
    static ref NBSP: Regex = Regex::new(r"(?i)&nbsp;").unwrap();
    static ref INVISIBLE: Regex = Regex::new(r"(?i)\{\{okina\}\}|\{\{wbr\}\}").unwrap();
    static ref NASTALIQ: Regex = Regex::new(r"(?i)\{\{Nastaliq\|(.*?)\}\}").unwrap();
    static ref FILE_LINK: Regex = Regex::new(r"(?i)\[\[(?:File|Soubor):.*?\]\]").unwrap();
    static ref NATIVE_TEMPLATES: Vec<Regex> = vec![
        Regex::new(r"(?i)\{\{(?:native name)\|(.*?)\|(.*?)(?:\|.*?)?\}\}").unwrap(),
        Regex::new(r"(?i)(?:'{2,3})?\{\{(?:transliteration|transl)\|(.*?)\|(?:(?:ISO|ALA-LC)\|)?(.*?)\}\}(?:'{2,3})?").unwrap(),
    ];
    static ref QUOTED: Regex = Regex::new(r"'{2,3}(.*?)'{2,3}").unwrap();
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref WORD: Regex = Regex::new(r"\w+").unwrap();

    static ref BOLD: Regex = Regex::new(r"'{3}(.*?)'{3}").unwrap();
    static ref BOLD_MARK: Regex = Regex::new(r"'{3}").unwrap();
    static ref ITALIC_RUN: Regex = Regex::new(r"'{2,}").unwrap();
    static ref COMMA_RUN: Regex = Regex::new(r"[ ,]{2,}").unwrap();
    static ref LANGUAGE_LABEL: Regex = Regex::new(r"(\w+):\s*([^\(\{]+?)(?:'{2,}|,|;|\))").unwrap();
}

/// Find language-tagged aliases (`{{lang|de|Prag}}`) in `data`.
///
/// Returns the text with every match replaced by its alias (`replace`) or
/// removed, together with the `(alias, lang)` pairs found. Matches with an
/// invalid language tag or a templated alias are left untouched.
pub fn remove_lang_templates(
    data: &str,
    replace: bool,
    matchers: &Matchers,
    langmap: &LangMap,
) -> (String, Vec<(String, String)>) {
    let mut spans: Vec<(usize, usize, String)> = Vec::new();
    let mut aliases = Vec::new();

    for pattern in &matchers.lang_alias {
        for caps in pattern.captures_iter(data) {
            let (Some(whole), Some(lang), Some(alias)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            let mut lang = lang.as_str().trim().to_string();
            if lang.chars().count() > 2 {
                if let Some(code) = langmap.get(&lang.to_lowercase()) {
                    lang = code.to_string();
                }
            }
            let len = lang.chars().count();
            if !(2..=3).contains(&len) {
                debug!(lang = %lang, "invalid language tag");
                continue;
            }
            let alias = alias.as_str().replace('\'', "").trim().to_string();
            if alias.contains(['{', '}', '=']) {
                continue;
            }
            aliases.push((alias.clone(), lang));
            spans.push((whole.start(), whole.end(), alias));
        }
    }

    spans.sort_by_key(|&(start, _, _)| start);
    let mut text = String::with_capacity(data.len());
    let mut cursor = 0;
    for (start, end, alias) in spans {
        if start < cursor {
            continue;
        }
        text.push_str(&data[cursor..start]);
        if replace {
            text.push_str(&alias);
        }
        cursor = end;
    }
    text.push_str(&data[cursor..]);
    (text, aliases)
}

impl EntityCore {
    /// Aliases from the infobox, native name fields and the first sentence.
    pub fn collect_aliases(&mut self, ctx: &Context) {
        self.infobox_aliases(ctx);
        self.infobox_alternate_names(ctx);
        self.native_names(ctx);
        self.lang_aliases(ctx);
    }

    fn add_lang_aliases(&mut self, found: Vec<(String, String)>) {
        for (alias, lang) in found {
            self.aliases.add(&alias, Some(&lang));
        }
    }

    fn infobox_aliases(&mut self, ctx: &Context) {
        let values: Vec<String> = self
            .values(&ctx.keywords.infobox_name)
            .into_iter()
            .map(str::to_string)
            .collect();
        let is_individual = self.prefix.starts_with("person") && self.prefix != "person:group";

        for value in values {
            if UNKNOWN.is_match(&value) {
                continue;
            }
            let mut d = value;
            if is_individual {
                if let Some(caps) = TRAILING_PARENS.captures(&d) {
                    let alias = PARENS.replace_all(&caps[1], "").trim().replace('"', "");
                    match IN_LANGUAGE.captures(&alias) {
                        Some(lang_caps) => {
                            let lang = ctx.langmap.get(&lang_caps[1].to_lowercase());
                            self.aliases.add(&lang_caps[2], lang);
                        }
                        None => self.aliases.add(&alias, None),
                    }
                    d = TRAILING_PARENS.replace(&d, "").trim().to_string();
                }
                if let Some(caps) = NICKNAME.captures(&d) {
                    let surname = self.title.split_whitespace().last().unwrap_or_default();
                    let alias = format!("{} {}", &caps[1], surname);
                    self.aliases.add(&alias, None);
                    d = NICKNAME_STRIP.replace(&d, "$1$2").into_owned();
                }
            }

            let (d, found) = remove_lang_templates(&d, true, ctx.matchers, ctx.langmap);
            if !found.is_empty() {
                self.add_lang_aliases(found);
                continue;
            }

            let d = BOLD_ITALIC.replace_all(&d, "");
            let d = d.replace("&#39;", "'").replace("&zwj;", "'");
            let d = TEMPLATES_GREEDY.replace_all(&d, "");
            let d = BRACKETS.replace_all(&d, "");
            let d = PARENS.replace_all(&d, "");
            self.aliases.add(d.trim(), None);
        }
    }

    /// Alternative names (`other_name`, `nickname`, ...): lists, separated
    /// names and native-name templates. Stops at the first value holding a
    /// separated list.
    fn infobox_alternate_names(&mut self, ctx: &Context) {
        let values: Vec<String> = self
            .values(&ctx.keywords.infobox_names)
            .into_iter()
            .map(str::to_string)
            .collect();

        for value in values {
            if UNKNOWN.is_match(&value) {
                continue;
            }
            let d = value.replace('\n', " ");
            let d = PIPED_LINK.replace_all(&d, "$1");
            let d = BRACKETS.replace_all(&d, "");
            let d = SMALL_NESTED.replace_all(&d, "$1");
            let d = SMALL.replace_all(&d, "$1");
            let d = BREAK.replace_all(&d, ", ");
            let d = d.trim_matches('.');

            let (d, items) = span::expand_list_templates(d);
            for item in items {
                let item = QUOTES_AND_BOLD.replace_all(&item, "");
                let item = PARENS.replace_all(&item, "");
                let item = item.trim();
                if !item.ends_with(':') {
                    self.aliases.add(item, None);
                }
            }

            let d = WIDE_GAP.replace_all(&d, "*").into_owned();

            if d.contains([',', '*']) {
                let d = PARENS.replace_all(&d, "");
                let d = QUOTES_AND_ITALIC.replace_all(&d, "");
                for sep in [',', '*'] {
                    if d.split(sep).count() > 1 {
                        for part in d.split(sep).filter(|s| !s.is_empty()) {
                            self.separated_name(part.trim(), ctx);
                        }
                        break;
                    }
                }
                return;
            }

            let (d, found) = remove_lang_templates(&d, false, ctx.matchers, ctx.langmap);
            self.add_lang_aliases(found);

            if let Some(caps) = NATIVE_NAME_OR_PHRASE.captures(&d) {
                self.aliases.add(&caps[2], Some(&caps[1]));
                return;
            }

            let d = d.replace('"', "");
            let d = PARENS.replace_all(&d, "");
            self.aliases.add(d.trim(), None);
        }
    }

    fn separated_name(&mut self, part: &str, ctx: &Context) {
        let v = LABEL.replace_all(part, "");
        let mut v = v.replace('*', "").trim().to_string();
        let mut lang = String::new();
        if let Some(caps) = IN_LANG_TEMPLATE.captures(&v) {
            lang = caps[1].trim().to_string();
            v = IN_LANG_TEMPLATE.replace_all(&v, "").trim().to_string();
        }
        let (mut v, found) = remove_lang_templates(&v, false, ctx.matchers, ctx.langmap);
        if !found.is_empty() {
            self.add_lang_aliases(found);
            return;
        }
        if let Some(caps) = NATIVE_NAME_OR_PHRASE.captures(&v) {
            lang = caps[1].to_string();
            v = caps[2].to_string();
        }
        let lang = Some(lang.as_str()).filter(|l| !l.is_empty());
        self.aliases.add(&v, lang);
    }

    fn native_language(&self, ctx: &Context) -> String {
        let value = self.first_value(&ctx.keywords.native_name_lang);
        if value.is_empty() {
            return String::new();
        }
        let lang = value.trim_matches(':').to_lowercase();
        let lang = BRACKETS.replace_all(&lang, "");
        let lang = match NATIVE_LANG_TEMPLATE.captures(&lang) {
            Some(caps) => caps[1].to_string(),
            None => lang.into_owned(),
        };
        let lang = lang.replace(',', "-");
        let mut lang = lang.split('-').next().unwrap_or_default().to_string();
        if lang.chars().count() != 2 {
            if let Some(code) = ctx.langmap.get(&lang) {
                lang = code.to_string();
            }
        }
        if lang.chars().count() > 3 {
            debug!(lang = %lang, title = %self.title, "unsupported native name language");
        }
        lang
    }

    fn native_names(&mut self, ctx: &Context) {
        let native_lang = self.native_language(ctx);
        let native_lang = Some(native_lang.as_str()).filter(|l| !l.is_empty());

        let value = self.first_value(&ctx.keywords.native_name).to_string();
        if value.is_empty() {
            return;
        }
        let data = NBSP.replace_all(&value, " ");
        let data = INVISIBLE.replace_all(&data, "");
        let data = NASTALIQ.replace_all(&data, "$1");
        let data = PARENS.replace_all(&data, "");
        let data = FILE_LINK.replace_all(&data, "");
        let mut data = span::unwrap_wrapper_templates(&data).trim().to_string();

        for pattern in NATIVE_TEMPLATES.iter() {
            let mut matched = Vec::new();
            for caps in pattern.captures_iter(&data) {
                let alias = caps.get(2).map_or("", |m| m.as_str());
                if alias.is_empty() {
                    continue;
                }
                let alias = BOLD_ITALIC.replace_all(alias, "");
                self.aliases.add(&alias, Some(&caps[1]));
                if let Some(m) = caps.get(0) {
                    matched.push((m.start(), m.end()));
                }
            }
            data = span::remove_ranges(&data, &matched);
        }

        if !data.is_empty() {
            let (rest, found) = remove_lang_templates(&data, false, ctx.matchers, ctx.langmap);
            self.add_lang_aliases(found);
            data = rest;
        }

        let mut matched = Vec::new();
        for caps in QUOTED.captures_iter(&data) {
            let alias = &caps[1];
            if TEMPLATE.is_match(alias) {
                continue;
            }
            let alias = remove_templates(alias);
            if !alias.trim().is_empty() {
                self.aliases.add(&alias, native_lang);
                if let Some(m) = caps.get(0) {
                    matched.push((m.start(), m.end()));
                }
            }
        }
        let data = span::remove_ranges(&data, &matched);

        let data = TEMPLATES_GREEDY.replace_all(&data, "");
        let data = HORIZONTAL_SPACE.replace_all(&data, " ");
        let data = data.trim();
        if WORD.is_match(data) {
            self.aliases.add(data, native_lang);
        }
    }

    /// Language-tagged names in the first sentence. The sentence keeps the
    /// alias text in place of each template.
    fn lang_aliases(&mut self, ctx: &Context) {
        let (sentence, found) = remove_lang_templates(&self.first_sentence, true, ctx.matchers, ctx.langmap);
        self.add_lang_aliases(found);
        self.first_sentence = sentence;
    }

    /// Bold names and `language: name` pairs of a first sentence, plus the
    /// locale's own aliases. Used by every kind except persons.
    pub fn non_person_aliases(&mut self, ctx: &Context) {
        let sentence = self.first_sentence.clone();
        let lang = self.lang.clone();

        for caps in BOLD.captures_iter(&sentence) {
            let m = TEMPLATE.replace_all(&caps[1], "");
            if self.aliases.contains(&m) {
                continue;
            }
            let m = ITALIC_RUN.replace_all(&m, "");
            let m = m.replace('"', "");
            let m = PARENS.replace_all(&m, "");
            let m = COMMA_RUN.replace_all(m.trim(), ", ");
            let m = m.trim().trim_matches([',', ';']);
            if m.chars().count() > 1 {
                self.aliases.add(m, Some(&lang));
            }
        }

        let sentence = BOLD_MARK.replace_all(&sentence, "");
        if let Some(caps) = LANGUAGE_LABEL.captures(&sentence) {
            let label = caps[1].to_lowercase();
            let alias = TEMPLATE.replace_all(&caps[2], "");
            let alias = alias.trim().replace('"', "");
            let alias = BOLD_ITALIC.replace_all(&alias, "");
            if !alias.is_empty() && label.chars().count() > 2 {
                if let Some(code) = ctx.langmap.get(&label) {
                    self.aliases.add(&alias, Some(code));
                }
            }
        }

        self.locale_aliases(ctx);
    }

    fn locale_aliases(&mut self, ctx: &Context) {
        for (alias, lang) in ctx.locale.specific_aliases(self, ctx.langmap) {
            self.aliases.add(&alias, lang.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;

    fn alias_lang<'a>(core: &'a EntityCore, alias: &str) -> Option<&'a str> {
        core.aliases.get(alias).and_then(|p| p.get(crate::unique::KEY_LANG))
    }

    // ─────────────────────────────────────────────────────────────
    // Language templates
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn lang_templates_replace_or_remove() {
        let fixture = Fixture::new("en");
        let m = &fixture.schema.matchers;
        let (text, found) = remove_lang_templates("Prague ({{lang-cs|Praha}}) is", true, m, &fixture.langmap);
        assert_eq!(text, "Prague (Praha) is");
        assert_eq!(found, vec![("Praha".to_string(), "cs".to_string())]);
        let (text, _) = remove_lang_templates("Prague ({{lang-cs|Praha}}) is", false, m, &fixture.langmap);
        assert_eq!(text, "Prague () is");
    }

    #[test]
    fn lang_templates_reject_bad_tags() {
        let fixture = Fixture::new("en");
        let m = &fixture.schema.matchers;
        let (text, found) = remove_lang_templates("{{lang|x|Foo}}", true, m, &fixture.langmap);
        assert!(found.is_empty());
        assert_eq!(text, "{{lang|x|Foo}}");
    }

    // ─────────────────────────────────────────────────────────────
    // Infobox names
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn person_nickname_and_parenthesis() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("person", "Henry Ford", &[("name", "Henry \"Hank\" Ford (in German Heinrich Ford)")]);
        core.collect_aliases(&fixture.ctx());
        assert!(core.aliases.contains("Hank Ford"));
        assert_eq!(alias_lang(&core, "Heinrich Ford"), Some("de"));
        assert!(core.aliases.contains("Henry Ford"));
    }

    #[test]
    fn unknown_names_are_skipped() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("country", "X", &[("name", "Unknown")]);
        core.collect_aliases(&fixture.ctx());
        assert!(core.aliases.is_empty());
    }

    #[test]
    fn separated_alternate_names() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core(
            "country",
            "Ruritania",
            &[("other_name", "Rurland, {{lang|de|Rurien}}, {{native name|fr|Ruritanie}}")],
        );
        core.collect_aliases(&fixture.ctx());
        assert_eq!(alias_lang(&core, "Rurland"), None);
        assert!(core.aliases.contains("Rurland"));
        assert_eq!(alias_lang(&core, "Rurien"), Some("de"));
        assert_eq!(alias_lang(&core, "Ruritanie"), Some("fr"));
    }

    #[test]
    fn listed_alternate_names() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core("country", "X", &[("other_name", "{{plainlist|\n* Alpha\n* ''Beta'' (old)\n* Note:}}")]);
        core.collect_aliases(&fixture.ctx());
        assert!(core.aliases.contains("Alpha"));
        assert!(core.aliases.contains("Beta"));
        assert!(!core.aliases.contains("Note:"));
    }

    // ─────────────────────────────────────────────────────────────
    // Native names and the first sentence
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn native_name_field() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core(
            "country",
            "Czech Republic",
            &[("native_name", "''Česká republika''"), ("native_name_lang", "Czech")],
        );
        core.collect_aliases(&fixture.ctx());
        assert_eq!(alias_lang(&core, "Česká republika"), Some("cs"));
    }

    #[test]
    fn native_name_templates() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core(
            "country",
            "Japan",
            &[("native_name", "{{native name|ja|日本国}}, {{transl|ja|Nippon-koku}}")],
        );
        core.collect_aliases(&fixture.ctx());
        assert_eq!(alias_lang(&core, "日本国"), Some("ja"));
        assert_eq!(alias_lang(&core, "Nippon-koku"), Some("ja"));
    }

    #[test]
    fn bold_names_in_sentence() {
        let fixture = Fixture::new("en");
        let mut core = fixture.core_from_markup(
            "country",
            "Czech Republic",
            "'''Czech Republic''', also known as '''Czechia''' ({{lang-cs|Česko}}), is a country.",
        );
        core.collect_aliases(&fixture.ctx());
        core.non_person_aliases(&fixture.ctx());
        assert_eq!(alias_lang(&core, "Česko"), Some("cs"));
        assert_eq!(alias_lang(&core, "Czechia"), Some("en"));
        assert!(core.first_sentence.contains("(Česko)"));
        assert!(!core.aliases.serialize(&core.title).contains("Czech Republic#"));
    }
}
