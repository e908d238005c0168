//! Balanced-span scanning over `{{...}}` / `[[...]]` constructs.
//!
//! Depth is counted per delimiter character, so `{{` opens two levels and the
//! parameters of a template sit at depth [`PARAM_DEPTH`]. Anything nested one
//! template deeper sits at depth 4 and is left alone by the rewriting helpers.

use lazy_static::lazy_static;
use regex::Regex;

/// Depth at which a template's own `|` separators appear.
pub const PARAM_DEPTH: i32 = 2;

/// Byte offsets of one balanced construct.
///
/// `params_start` is the byte just after the first `|` at [`PARAM_DEPTH`],
/// or `None` for a construct without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub params_start: Option<usize>,
    pub end: usize,
}

impl Span {
    /// Inner parameter text (between the first separator and the closing delimiters).
    pub fn params<'a>(&self, text: &'a str) -> &'a str {
        match self.params_start {
            Some(p) if p <= self.end.saturating_sub(2) => text.get(p..self.end - 2).unwrap_or(""),
            _ => "",
        }
    }

    fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

lazy_static! {
    static ref LIST_MARKERS: Vec<Regex> = vec![
        Regex::new(r"(?i)\{\{(?:(?:indented\s)?plainlist|flatlist)\s*?\|").unwrap(),
        Regex::new(r"(?i)\{\{(?:hlist|ubl|(?:unbulleted|collapsible)\slist)\s*?\|").unwrap(),
    ];
    static ref WRAPPER_MARKERS: Vec<Regex> = vec![
        Regex::new(r"(?i)\{\{nobold\|").unwrap(),
        Regex::new(r"(?i)\{\{small(?:er)?\|").unwrap(),
        Regex::new(r"(?i)\{\{nowrap\|").unwrap(),
    ];
    static ref NOTE_MARKERS: Vec<Regex> = vec![
        Regex::new(r"(?i)\{\{efn").unwrap(),
        Regex::new(r"(?i)\{\{refn").unwrap(),
        Regex::new(r"(?i)\{\{citation").unwrap(),
        Regex::new(r"(?i)\{\{notetag").unwrap(),
        Regex::new(r"(?i)\{\{snf").unwrap(),
        Regex::new(r"(?i)\{\{sfn").unwrap(),
        Regex::new(r"(?i)\{\{#tag:ref").unwrap(),
        Regex::new(r"(?i)\{\{ref label").unwrap(),
    ];
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Core scanner
// ─────────────────────────────────────────────────────────────────────────────

/// Scan the construct opening at `start`.
///
/// Returns `None` when `start` is not an opening delimiter, when depth never
/// returns to zero (including a stray closer before it does), or when the
/// final closer is not of the opening kind.
pub fn locate(text: &str, start: usize) -> Option<Span> {
    scan(text, start).map(|(span, _)| span)
}

/// Like [`locate`], also returning offsets of every further `|` at [`PARAM_DEPTH`].
fn scan(text: &str, start: usize) -> Option<(Span, Vec<usize>)> {
    let bytes = text.as_bytes();
    let closer = match bytes.get(start) {
        Some(b'{') => b'}',
        Some(b'[') => b']',
        _ => return None,
    };

    let mut depth: i32 = 0;
    let mut params_start = None;
    let mut separators = Vec::new();

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth -= 1,
            b'|' if depth == PARAM_DEPTH => {
                if params_start.is_none() {
                    params_start = Some(i + 1);
                } else {
                    separators.push(i);
                }
            }
            _ => {}
        }
        if depth == 0 {
            if b != closer {
                return None;
            }
            return Some((Span { start, params_start, end: i + 1 }, separators));
        }
        if depth < 0 {
            return None;
        }
    }
    None
}

/// Locate every balanced construct whose opening matches one of `markers`.
///
/// Spans are returned in text order and never overlap: a match that starts
/// inside an already accepted span is skipped. Unbalanced matches are dropped.
pub fn find_spans(text: &str, markers: &[Regex]) -> Vec<Span> {
    let mut starts: Vec<usize> = markers
        .iter()
        .flat_map(|m| m.find_iter(text).map(|found| found.start()))
        .collect();
    starts.sort_unstable();
    starts.dedup();

    let mut spans: Vec<Span> = Vec::new();
    for start in starts {
        if spans.last().map_or(false, |last| start < last.end) {
            continue;
        }
        if let Some(span) = locate(text, start) {
            if !spans.iter().any(|s| s.overlaps(&span)) {
                spans.push(span);
            }
        }
    }
    spans
}

/// Replace each span with `replacement(text, span)`, working from the end of the
/// text so earlier offsets stay valid.
pub fn splice<F>(text: &str, spans: &[Span], mut replacement: F) -> String
where
    F: FnMut(&str, &Span) -> String,
{
    let mut ordered: Vec<&Span> = spans.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut out = text.to_string();
    for span in ordered {
        let piece = replacement(text, span);
        out.replace_range(span.start..span.end, &piece);
    }
    out
}

/// Remove byte ranges `(start, end)` from `text`, last range first.
pub fn remove_ranges(text: &str, ranges: &[(usize, usize)]) -> String {
    let mut ordered = ranges.to_vec();
    ordered.sort_by(|a, b| b.0.cmp(&a.0));
    let mut out = text.to_string();
    for (start, end) in ordered {
        if start <= end && end <= out.len() {
            out.replace_range(start..end, "");
        }
    }
    out
}

/// Split `text` on `sep` occurrences that sit at exactly `depth`.
pub fn split_at_depth(text: &str, depth: i32, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut current = 0;
    let mut level = 0;
    for (i, &b) in text.as_bytes().iter().enumerate() {
        match b {
            b'{' | b'[' => level += 1,
            b'}' | b']' => level -= 1,
            _ if b == sep && level == depth => {
                parts.push(&text[current..i]);
                current = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[current..]);
    parts
}

// ─────────────────────────────────────────────────────────────────────────────
// Call sites
// ─────────────────────────────────────────────────────────────────────────────

/// Expand `plainlist`/`flatlist`/`hlist`/`ubl`/`unbulleted list` templates.
///
/// Returns the text with the list templates removed and the list items in text
/// order. Inner `|` separators are turned into `*` markers before splitting so
/// hlist-style and bullet-style lists split the same way.
pub fn expand_list_templates(text: &str) -> (String, Vec<String>) {
    let spans = find_spans(text, &LIST_MARKERS);
    if spans.is_empty() {
        return (text.to_string(), Vec::new());
    }

    let mut items = Vec::new();
    for span in &spans {
        let Some((_, separators)) = scan(text, span.start) else {
            continue;
        };
        let Some(params_start) = span.params_start else {
            continue;
        };
        let mut inner: Vec<u8> = text.as_bytes()[params_start..span.end - 2].to_vec();
        for sep in separators {
            inner[sep - params_start] = b'*';
        }
        let inner = String::from_utf8_lossy(&inner).into_owned();
        items.extend(
            inner
                .split('*')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string),
        );
    }

    (splice(text, &spans, |_, _| String::new()), items)
}

/// Strip `nobold`, `small`/`smaller` and `nowrap` wrappers, keeping their content.
pub fn unwrap_wrapper_templates(text: &str) -> String {
    let mut content = text.to_string();
    for marker in WRAPPER_MARKERS.iter() {
        let spans = find_spans(&content, std::slice::from_ref(marker));
        content = splice(&content, &spans, |src, span| span.params(src).to_string());
    }
    HORIZONTAL_SPACE.replace_all(&content, " ").into_owned()
}

/// Excise footnote and citation templates (`efn`, `refn`, `sfn`, ...) wholesale.
pub fn remove_note_templates(text: &str) -> String {
    let spans = find_spans(text, &NOTE_MARKERS);
    let content = splice(text, &spans, |_, _| String::new());
    HORIZONTAL_SPACE.replace_all(&content, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // locate
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn locate_simple_template() {
        let text = "a {{nowrap|x}} b";
        let span = locate(text, 2).unwrap();
        assert_eq!(&text[span.start..span.end], "{{nowrap|x}}");
        assert_eq!(span.params(text), "x");
    }

    #[test]
    fn locate_nested_template() {
        let text = "{{outer|{{inner|a}}|b}}";
        let span = locate(text, 0).unwrap();
        assert_eq!(span.end, text.len());
        assert_eq!(span.params(text), "{{inner|a}}|b");
    }

    #[test]
    fn locate_without_params() {
        let text = "{{okina}}";
        let span = locate(text, 0).unwrap();
        assert_eq!(span.params_start, None);
        assert_eq!(span.params(text), "");
    }

    #[test]
    fn locate_link() {
        let text = "[[Prague|capital]] city";
        let span = locate(text, 0).unwrap();
        assert_eq!(&text[..span.end], "[[Prague|capital]]");
    }

    #[test]
    fn locate_unbalanced_is_none() {
        assert_eq!(locate("{{nowrap|x", 0), None);
        assert_eq!(locate("{{a|{{b}}", 0), None);
    }

    #[test]
    fn locate_not_an_opener() {
        assert_eq!(locate("abc", 0), None);
        assert_eq!(locate("", 0), None);
    }

    #[test]
    fn param_pipe_inside_link_is_not_a_separator() {
        let text = "{{hlist|[[a|b]]|c}}";
        let (_, seps) = scan(text, 0).unwrap();
        assert_eq!(seps.len(), 1);
        assert_eq!(&text[seps[0]..seps[0] + 2], "|c");
    }

    // ─────────────────────────────────────────────────────────────
    // split_at_depth
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn split_top_level_only() {
        let parts = split_at_depth("a|{{b|c}}|[[d|e]]", 0, b'|');
        assert_eq!(parts, vec!["a", "{{b|c}}", "[[d|e]]"]);
    }

    // ─────────────────────────────────────────────────────────────
    // List expansion
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn hlist_items() {
        let (rest, items) = expand_list_templates("{{hlist | Computer programmer | businessperson}}");
        assert_eq!(rest, "");
        assert_eq!(items, vec!["Computer programmer", "businessperson"]);
    }

    #[test]
    fn plainlist_items() {
        let (rest, items) = expand_list_templates("before {{plainlist|\n* One\n* Two\n}} after");
        assert_eq!(rest, "before  after");
        assert_eq!(items, vec!["One", "Two"]);
    }

    #[test]
    fn unbulleted_list_with_nested_template() {
        let (_, items) = expand_list_templates("{{unbulleted list|{{lang|fr|Paris}}|Lutetia}}");
        assert_eq!(items, vec!["{{lang|fr|Paris}}", "Lutetia"]);
    }

    #[test]
    fn two_lists_in_one_value() {
        let (rest, items) = expand_list_templates("{{ubl|a|b}}, {{flatlist|\n* c}}");
        assert_eq!(rest, ", ");
        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[test]
    fn unbalanced_list_left_unchanged() {
        let text = "{{hlist|a|b";
        let (rest, items) = expand_list_templates(text);
        assert_eq!(rest, text);
        assert!(items.is_empty());
    }

    // ─────────────────────────────────────────────────────────────
    // Wrappers and notes
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn wrappers_keep_inner_content() {
        let out = unwrap_wrapper_templates("{{nobold|{{lang|en|example}}}} and {{small|tiny}}");
        assert_eq!(out, "{{lang|en|example}} and tiny");
    }

    #[test]
    fn unbalanced_wrapper_left_unchanged() {
        let text = "{{nowrap|never closed";
        assert_eq!(unwrap_wrapper_templates(text), text);
    }

    #[test]
    fn mismatched_closer_around_multibyte_left_unchanged() {
        let text = "{{nowrap|x}é]";
        assert_eq!(locate(text, 0), None);
        assert_eq!(unwrap_wrapper_templates(text), text);
        assert_eq!(unwrap_wrapper_templates("{{small|Plzeň}}é"), "Plzeňé");

        let span = Span { start: 0, params_start: Some(9), end: 14 };
        assert_eq!(span.params(text), "");
    }

    #[test]
    fn notes_are_removed() {
        let out = remove_note_templates("Rome{{efn|Latin: {{lang|la|Roma}}}} is old{{sfn|Smith|2001}}.");
        assert_eq!(out, "Rome is old.");
    }

    #[test]
    fn unbalanced_note_left_unchanged() {
        let text = "Rome{{efn|broken";
        assert_eq!(remove_note_templates(text), text);
    }

    #[test]
    fn remove_ranges_from_end() {
        assert_eq!(remove_ranges("abcdef", &[(0, 1), (3, 5)]), "bcf");
    }
}
