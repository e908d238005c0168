//! Per-page processing and the sequential driver.
//!
//! [`Engine`] holds everything that is read-only for a run (schema, language
//! map, redirects, first sentences, locale and geocoder) and turns one dump
//! page into at most one knowledge-base line. It keeps no per-page state, so
//! one engine is shared by every worker of the parallel strategies.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, trace, warn};

use crate::classify::{self, Evidence};
use crate::config::Resources;
use crate::dump::{self, RawPage};
use crate::entity::{article_link, Context, Entity};
use crate::extract;
use crate::geocode::Geocoder;
use crate::locale::Locale;

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// A record line (without the trailing newline) of kind `prefix`.
    Entity { prefix: String, line: String },
    /// Outside the main namespace, or a title that cannot name an entity.
    Special,
    Redirect,
    Disambiguation,
    Empty,
    /// No kind scored above zero.
    Unidentified,
    /// Processing the page panicked; the page is dropped.
    Failed,
}

pub struct Engine {
    pub resources: Resources,
    pub locale: Box<dyn Locale>,
    pub geocoder: Box<dyn Geocoder>,
}

impl Engine {
    pub fn new(resources: Resources, locale: Box<dyn Locale>, geocoder: Box<dyn Geocoder>) -> Self {
        Engine {
            resources,
            locale,
            geocoder,
        }
    }

    pub fn context(&self) -> Context<'_> {
        Context {
            keywords: &self.resources.schema.keywords,
            matchers: &self.resources.schema.matchers,
            langmap: &self.resources.langmap,
            locale: self.locale.as_ref(),
            geocoder: self.geocoder.as_ref(),
        }
    }

    /// Parse and process one `<page>` element.
    pub fn process_xml(&self, page_xml: &str) -> PageOutcome {
        match dump::parse_page(page_xml) {
            Some(page) => self.process_page(&page),
            None => PageOutcome::Special,
        }
    }

    /// Process one page. A panic inside extraction drops the page instead of
    /// the run.
    pub fn process_page(&self, page: &RawPage) -> PageOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| self.build(page))) {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(title = %page.title, "page processing panicked, dropping page");
                PageOutcome::Failed
            }
        }
    }

    fn build(&self, page: &RawPage) -> PageOutcome {
        if !self.locale.is_entity(&page.title.to_lowercase()) {
            return PageOutcome::Special;
        }
        if page.redirect {
            return PageOutcome::Redirect;
        }
        if page.text.trim().is_empty() {
            return PageOutcome::Empty;
        }
        let schema = &self.resources.schema;
        if schema.matchers.disambig.is_match(&page.text) {
            trace!(title = %page.title, "disambiguation");
            return PageOutcome::Disambiguation;
        }

        let markup = extract::extract(&page.text, &schema.matchers);
        let has_field = |key: &str| markup.fields.contains(key);
        let evidence = Evidence {
            title: &page.title,
            infobox_name: &markup.infobox_name,
            categories: &markup.categories,
            has_field: &has_field,
        };
        let Some((kind, score)) = classify::classify(&schema.patterns, &evidence) else {
            trace!(title = %page.title, "unidentified page");
            return PageOutcome::Unidentified;
        };
        debug!(title = %page.title, kind, score, "identified");

        let link = article_link(self.locale.code(), &page.title);
        let redirects = self.resources.redirects.get(&link).cloned().unwrap_or_default();
        let description = self
            .resources
            .first_sentences
            .get(&link)
            .map(String::as_str)
            .unwrap_or_default();

        let ctx = self.context();
        match Entity::build(&ctx, kind, &page.title, markup, redirects, description) {
            Some(entity) => PageOutcome::Entity {
                prefix: entity.core.prefix.clone(),
                line: entity.serialize(),
            },
            None => {
                warn!(title = %page.title, kind, "identified kind has no entity builder");
                PageOutcome::Unidentified
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Stats {
    pub pages_processed: usize,
    pub entities_written: usize,
    pub special: usize,
    pub redirects: usize,
    pub disambiguations: usize,
    pub empty: usize,
    pub unidentified: usize,
    pub failed: usize,
    /// Written records per prefix.
    pub by_prefix: BTreeMap<String, usize>,
    pub elapsed: Duration,
}

impl Stats {
    /// Count one outcome; entities are counted by [`Stats::record_entity`].
    pub fn record(&mut self, outcome: &PageOutcome) {
        self.pages_processed += 1;
        match outcome {
            PageOutcome::Entity { .. } => {}
            PageOutcome::Special => self.special += 1,
            PageOutcome::Redirect => self.redirects += 1,
            PageOutcome::Disambiguation => self.disambiguations += 1,
            PageOutcome::Empty => self.empty += 1,
            PageOutcome::Unidentified => self.unidentified += 1,
            PageOutcome::Failed => self.failed += 1,
        }
    }

    pub fn record_entity(&mut self, prefix: &str) {
        self.entities_written += 1;
        *self.by_prefix.entry(prefix.to_string()).or_default() += 1;
    }
}

/// Count `outcome` and write its record line, if any. Returns true once
/// `limit` records have been written.
pub fn write_outcome<W: Write>(
    outcome: PageOutcome,
    stats: &mut Stats,
    writer: &mut W,
    limit: Option<usize>,
) -> std::io::Result<bool> {
    stats.record(&outcome);
    if let PageOutcome::Entity { prefix, line } = outcome {
        writeln!(writer, "{}", line)?;
        stats.record_entity(&prefix);
        if let Some(l) = limit {
            if stats.entities_written >= l {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

pub fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb
}

pub fn run_sequential<W: Write>(
    engine: &Engine,
    reader: impl BufRead,
    writer: &mut W,
    limit: Option<usize>,
    quiet: bool,
) -> std::io::Result<Stats> {
    let start_time = Instant::now();
    let mut stats = Stats::default();
    let pb = spinner(quiet);
    let mut limit_reached = false;
    let mut write_error = None;

    dump::scan_pages(reader, |page_xml| {
        let outcome = engine.process_xml(&page_xml);
        match write_outcome(outcome, &mut stats, &mut *writer, limit) {
            Ok(true) => {
                limit_reached = true;
                return false;
            }
            Ok(false) => {}
            Err(e) => {
                write_error = Some(e);
                return false;
            }
        }

        if stats.pages_processed % 1000 == 0 {
            let rate = stats.pages_processed as f64 / start_time.elapsed().as_secs_f64();
            pb.set_message(format!(
                "Pages: {} | Entities: {} | Rate: {:.0} pg/s",
                stats.pages_processed, stats.entities_written, rate
            ));
        }
        true
    })?;

    if let Some(e) = write_error {
        return Err(e);
    }
    writer.flush()?;

    match limit {
        Some(l) if limit_reached => pb.finish_with_message(format!("Reached limit of {} entities", l)),
        _ => pb.finish_and_clear(),
    }

    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

pub fn print_stats(stats: &Stats, strategy_name: &str) {
    println!();
    println!("============================================================");
    println!("Strategy: {}", strategy_name);
    println!("Pages processed: {}", stats.pages_processed);
    println!("Entities written: {}", stats.entities_written);
    println!("------------------------------------------------------------");
    for (prefix, count) in &stats.by_prefix {
        println!("  {}: {}", prefix, count);
    }
    println!("------------------------------------------------------------");
    println!("Special pages: {}", stats.special);
    println!("Redirects: {}", stats.redirects);
    println!("Disambiguations: {}", stats.disambiguations);
    println!("Empty pages: {}", stats.empty);
    println!("Unidentified: {}", stats.unidentified);
    println!("Failed: {}", stats.failed);
    println!("Time: {}m {}s", stats.elapsed.as_secs() / 60, stats.elapsed.as_secs() % 60);
    println!("Rate: {:.0} pages/sec", stats.pages_processed as f64 / stats.elapsed.as_secs_f64());
    println!("============================================================");
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::config::Redirects;
    use std::io::Cursor;

    fn dump(pages: &[String]) -> String {
        format!("<mediawiki>\n{}</mediawiki>\n", pages.concat())
    }

    // ─────────────────────────────────────────────────────────────
    // Page filters
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn filters_before_extraction() {
        let engine = engine("en", Redirects::new());
        assert_eq!(engine.process_xml(&page("List of rivers", PRAGUE)), PageOutcome::Special);
        assert_eq!(
            engine.process_xml(&page("Mercury", "'''Mercury''' may refer to:\n{{disambiguation}}")),
            PageOutcome::Disambiguation
        );
        assert_eq!(engine.process_xml(&page("Nothing", "   ")), PageOutcome::Empty);
        assert_eq!(
            engine.process_xml(&page("Plain", "'''Plain''' is a word without any signal.")),
            PageOutcome::Unidentified
        );
        let redirect = "<page><title>Praha</title><ns>0</ns><redirect title=\"Prague\" /><revision><text>#REDIRECT [[Prague]]</text></revision></page>";
        assert_eq!(engine.process_xml(redirect), PageOutcome::Redirect);
        let talk = "<page><title>Talk:Prague</title><ns>1</ns><revision><text>x</text></revision></page>";
        assert_eq!(engine.process_xml(talk), PageOutcome::Special);
    }

    // ─────────────────────────────────────────────────────────────
    // Records
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn settlement_record_carries_redirects() {
        let mut redirects = Redirects::new();
        redirects.insert(
            "https://en.wikipedia.org/wiki/Prague".to_string(),
            vec!["Praha".to_string(), "Prag".to_string()],
        );
        let engine = engine("en", redirects);
        let PageOutcome::Entity { prefix, line } = engine.process_xml(&page("Prague", PRAGUE)) else {
            panic!("expected an entity");
        };
        assert_eq!(prefix, "settlement");
        let columns: Vec<&str> = line.split('\t').collect();
        assert_eq!(columns[1], "settlement");
        assert_eq!(columns[2], "Prague");
        assert_eq!(columns[4], "Praha|Prag");
        assert_eq!(columns[8], "https://en.wikipedia.org/wiki/Prague");
        assert_eq!(columns[9], "Czech Republic");
    }

    #[test]
    fn sequential_run_counts_outcomes() {
        let engine = engine("en", Redirects::new());
        let input = dump(&[
            page("Prague", PRAGUE),
            page("Jan Novak", PERSON),
            page("List of rivers", PRAGUE),
        ]);
        let mut out = Vec::new();
        let stats = run_sequential(&engine, Cursor::new(input), &mut out, None, true).unwrap();
        assert_eq!(stats.pages_processed, 3);
        assert_eq!(stats.entities_written, 2);
        assert_eq!(stats.special, 1);
        assert_eq!(stats.by_prefix.get("person"), Some(&1));

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split('\t').nth(1), Some("settlement"));
        assert_eq!(lines[1].split('\t').nth(1), Some("person"));
    }

    #[test]
    fn sequential_run_stops_at_limit() {
        let engine = engine("en", Redirects::new());
        let input = dump(&[page("Prague", PRAGUE), page("Jan Novak", PERSON)]);
        let mut out = Vec::new();
        let stats = run_sequential(&engine, Cursor::new(input), &mut out, Some(1), true).unwrap();
        assert_eq!(stats.entities_written, 1);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
