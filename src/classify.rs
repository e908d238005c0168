//! Entity kind identification by scored patterns.
//!
//! Every kind carries positive and negative patterns over four kinds of
//! evidence: categories, infobox name, page title and infobox field names.
//! Each positive hit adds a point while the score is non-negative; the first
//! negative hit in a pass turns the score negative (or -1 from zero), and a
//! negative score never recovers. The highest positive score wins, earlier
//! kinds winning ties.

use regex::Regex;

/// Compiled identification patterns of one kind (all case-insensitive).
#[derive(Debug)]
pub struct KindPatterns {
    pub kind: String,
    pub categories: Vec<Regex>,
    pub neg_categories: Vec<Regex>,
    pub names: Vec<Regex>,
    pub neg_names: Vec<Regex>,
    pub titles: Vec<Regex>,
    pub neg_titles: Vec<Regex>,
    /// Infobox keys whose presence is evidence for the kind.
    pub fields: Vec<String>,
    pub neg_fields: Vec<String>,
}

/// Identification patterns in declaration order.
#[derive(Debug, Default)]
pub struct PatternTable {
    kinds: Vec<KindPatterns>,
}

impl PatternTable {
    pub fn new(kinds: Vec<KindPatterns>) -> Self {
        PatternTable { kinds }
    }

    pub fn kinds(&self) -> impl Iterator<Item = &KindPatterns> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// What the classifier looks at for one page.
pub struct Evidence<'a> {
    pub title: &'a str,
    pub infobox_name: &'a str,
    pub categories: &'a [String],
    pub has_field: &'a dyn Fn(&str) -> bool,
}

fn veto(score: &mut i32) {
    if *score > 0 {
        *score = -*score;
    } else if *score == 0 {
        *score = -1;
    }
}

fn score_hits<I, J>(score: &mut i32, positive: I, negative: J)
where
    I: IntoIterator<Item = bool>,
    J: IntoIterator<Item = bool>,
{
    for hit in positive {
        if hit && *score >= 0 {
            *score += 1;
        }
    }
    if negative.into_iter().any(|hit| hit) {
        veto(score);
    }
}

fn score_text(score: &mut i32, text: &str, positive: &[Regex], negative: &[Regex]) {
    score_hits(
        score,
        positive.iter().map(|p| p.is_match(text)),
        negative.iter().map(|n| n.is_match(text)),
    );
}

fn score_kind(patterns: &KindPatterns, evidence: &Evidence) -> i32 {
    let mut score = 0;
    for category in evidence.categories {
        score_text(&mut score, category, &patterns.categories, &patterns.neg_categories);
    }
    score_text(&mut score, evidence.infobox_name, &patterns.names, &patterns.neg_names);
    score_text(&mut score, evidence.title, &patterns.titles, &patterns.neg_titles);
    score_hits(
        &mut score,
        patterns.fields.iter().map(|f| (evidence.has_field)(f)),
        patterns.neg_fields.iter().map(|f| (evidence.has_field)(f)),
    );
    score
}

/// Score of every kind, in table order.
pub fn scores<'t>(table: &'t PatternTable, evidence: &Evidence) -> Vec<(&'t str, i32)> {
    table
        .kinds()
        .map(|k| (k.kind.as_str(), score_kind(k, evidence)))
        .collect()
}

/// Best-scoring kind, or `None` when no kind scored above zero.
pub fn classify<'t>(table: &'t PatternTable, evidence: &Evidence) -> Option<(&'t str, i32)> {
    let mut best: Option<(&str, i32)> = None;
    for (kind, score) in scores(table, evidence) {
        if score > 0 && best.map_or(true, |(_, b)| score > b) {
            best = Some((kind, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn re(patterns: &[&str]) -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
            .collect()
    }

    fn kind(name: &str) -> KindPatterns {
        KindPatterns {
            kind: name.to_string(),
            categories: Vec::new(),
            neg_categories: Vec::new(),
            names: Vec::new(),
            neg_names: Vec::new(),
            titles: Vec::new(),
            neg_titles: Vec::new(),
            fields: Vec::new(),
            neg_fields: Vec::new(),
        }
    }

    fn table() -> PatternTable {
        let mut person = kind("person");
        person.categories = re(&["births$", "deaths$"]);
        person.neg_categories = re(&["fictional"]);
        person.names = re(&["^person$"]);
        person.fields = vec!["birth_date".into(), "birth_place".into()];

        let mut settlement = kind("settlement");
        settlement.categories = re(&["cities", "towns"]);
        settlement.names = re(&["settlement"]);
        settlement.neg_titles = re(&["^list of"]);

        let mut country = kind("country");
        country.categories = re(&["cities"]);
        PatternTable::new(vec![person, settlement, country])
    }

    fn evidence<'a>(
        title: &'a str,
        infobox_name: &'a str,
        categories: &'a [String],
        has_field: &'a dyn Fn(&str) -> bool,
    ) -> Evidence<'a> {
        Evidence {
            title,
            infobox_name,
            categories,
            has_field,
        }
    }

    fn cats(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Scoring
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn positive_evidence_accumulates() {
        let table = table();
        let categories = cats(&["1950 births", "2010 deaths"]);
        let fields = |f: &str| f == "birth_date";
        let ev = evidence("John Smith", "person", &categories, &fields);
        let by_kind = scores(&table, &ev);
        assert_eq!(by_kind[0], ("person", 4));
        assert_eq!(classify(&table, &ev), Some(("person", 4)));
    }

    #[test]
    fn negative_hit_flips_and_sticks() {
        let table = table();
        let categories = cats(&["1950 births", "Fictional characters", "2010 deaths"]);
        let none = |_: &str| false;
        let ev = evidence("Sherlock", "", &categories, &none);
        assert_eq!(scores(&table, &ev)[0], ("person", -1));
        assert_eq!(classify(&table, &ev), None);
    }

    #[test]
    fn negative_from_zero_is_minus_one() {
        let table = table();
        let none = |_: &str| false;
        let ev = evidence("List of towns", "settlement", &[], &none);
        assert_eq!(scores(&table, &ev)[1], ("settlement", -1));
    }

    #[test]
    fn lone_negative_category_leaves_page_unidentified() {
        let table = table();
        let categories = cats(&["Fictional characters"]);
        let none = |_: &str| false;
        let ev = evidence("Sherlock Holmes", "", &categories, &none);
        assert_eq!(
            scores(&table, &ev),
            vec![("person", -1), ("settlement", 0), ("country", 0)]
        );
        assert_eq!(classify(&table, &ev), None);
    }

    #[test]
    fn ties_go_to_earlier_kind() {
        let table = table();
        let categories = cats(&["Cities in Peru"]);
        let none = |_: &str| false;
        let ev = evidence("Lima", "", &categories, &none);
        assert_eq!(classify(&table, &ev), Some(("settlement", 1)));
    }

    #[test]
    fn no_evidence_is_unclassified() {
        let table = table();
        let none = |_: &str| false;
        let ev = evidence("Blue", "", &[], &none);
        assert_eq!(classify(&table, &ev), None);
        assert!(scores(&table, &ev).iter().all(|(_, s)| *s == 0));
    }

    #[test]
    fn negative_field_vetoes() {
        let mut person = kind("person");
        person.fields = vec!["birth_date".into()];
        person.neg_fields = vec!["founded".into()];
        let table = PatternTable::new(vec![person]);
        let fields = |f: &str| f == "birth_date" || f == "founded";
        let ev = evidence("Acme", "", &[], &fields);
        assert_eq!(scores(&table, &ev)[0], ("person", -1));
    }
}
