//! Streaming reader for MediaWiki XML dumps (`.xml` or `.xml.bz2`).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bzip2::read::BzDecoder;
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::{KbError, Result};

lazy_static! {
    static ref TITLE_PATTERN: Regex = Regex::new(r"<title>([^<]+)</title>").unwrap();
    static ref NS_PATTERN: Regex = Regex::new(r"<ns>(\d+)</ns>").unwrap();
    static ref TEXT_PATTERN: Regex = Regex::new(r"(?s)<text[^>]*>(.+?)</text>").unwrap();
    static ref REDIRECT_PATTERN: Regex = Regex::new(r#"<redirect\s+title="[^"]+""#).unwrap();
}

/// One article page from the dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// NFC-normalized title.
    pub title: String,
    /// Unescaped wikitext.
    pub text: String,
    pub redirect: bool,
}

/// Reverse the XML escaping of a dump field.
pub fn unescape_xml(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

/// Parse one `<page>` element. `None` for pages outside the main namespace
/// or without a title.
pub fn parse_page(page_xml: &str) -> Option<RawPage> {
    let title = TITLE_PATTERN.captures(page_xml).map(|cap| cap[1].to_string())?;

    if let Some(cap) = NS_PATTERN.captures(page_xml) {
        if &cap[1] != "0" {
            return None;
        }
    }

    let text = TEXT_PATTERN
        .captures(page_xml)
        .map(|cap| unescape_xml(&cap[1]))
        .unwrap_or_default();

    Some(RawPage {
        title: unescape_xml(&title).nfc().collect(),
        text,
        redirect: REDIRECT_PATTERN.is_match(page_xml),
    })
}

/// Call `callback` with every complete `<page>` element; stop early when it
/// returns false.
pub fn scan_pages(mut reader: impl BufRead, mut callback: impl FnMut(String) -> bool) -> std::io::Result<()> {
    let mut buffer = String::new();
    let mut chunk = vec![0u8; 1024 * 1024]; // 1MB chunks
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let bytes_read = reader.read(&mut chunk)?;
        if bytes_read == 0 {
            break;
        }

        // Keep a multi-byte character split across chunks for the next read.
        pending.extend_from_slice(&chunk[..bytes_read]);
        let valid = match std::str::from_utf8(&pending) {
            Ok(_) => pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => pending.len(),
        };
        buffer.push_str(&String::from_utf8_lossy(&pending[..valid]));
        pending.drain(..valid);

        while let Some(start) = buffer.find("<page>") {
            if let Some(end_offset) = buffer[start..].find("</page>") {
                let end = start + end_offset + "</page>".len();
                let page_xml = buffer[start..end].to_string();
                buffer.drain(..end);

                if !callback(page_xml) {
                    return Ok(());
                }
            } else {
                buffer.drain(..start);
                break;
            }
        }

        if buffer.len() > 10 && !buffer.contains("<page>") {
            let mut keep = buffer.len().saturating_sub(10);
            while !buffer.is_char_boundary(keep) {
                keep -= 1;
            }
            buffer.drain(..keep);
        }
    }

    Ok(())
}

/// Every `<page>` element of the dump, in order.
pub fn read_all_pages(reader: impl BufRead) -> std::io::Result<Vec<String>> {
    let mut pages = Vec::new();
    scan_pages(reader, |page_xml| {
        pages.push(page_xml);
        true
    })?;
    Ok(pages)
}

/// Buffered reader over a dump, decompressing `.bz2` on the fly.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|source| KbError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn BufRead + Send> = if path.to_string_lossy().ends_with(".bz2") {
        Box::new(BufReader::with_capacity(256 * 1024, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(256 * 1024, file))
    };
    Ok(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DUMP: &str = r#"<mediawiki>
  <page>
    <title>Praha</title>
    <ns>0</ns>
    <revision><text bytes="10" xml:space="preserve">'''Praha''' je &lt;ref&gt;x&lt;/ref&gt; město.</text></revision>
  </page>
  <page>
    <title>Wikipedie:Pískoviště</title>
    <ns>4</ns>
    <revision><text>nothing</text></revision>
  </page>
  <page>
    <title>Prag</title>
    <ns>0</ns>
    <redirect title="Praha" />
    <revision><text>#REDIRECT [[Praha]]</text></revision>
  </page>
</mediawiki>"#;

    #[test]
    fn scans_every_page() {
        let pages = read_all_pages(Cursor::new(DUMP)).unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages[0].starts_with("<page>") && pages[0].ends_with("</page>"));
    }

    #[test]
    fn callback_can_stop_the_scan() {
        let mut seen = 0;
        scan_pages(Cursor::new(DUMP), |_| {
            seen += 1;
            false
        })
        .unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn main_namespace_pages_only() {
        let pages: Vec<RawPage> = read_all_pages(Cursor::new(DUMP))
            .unwrap()
            .iter()
            .filter_map(|xml| parse_page(xml))
            .collect();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].title, "Praha");
        assert_eq!(pages[0].text, "'''Praha''' je <ref>x</ref> město.");
        assert!(!pages[0].redirect);
        assert!(pages[1].redirect);
    }

    #[test]
    fn titles_are_nfc() {
        let xml = "<page><title>Bo\u{17e}ena N\u{0115}mcov\u{00e1}</title><ns>0</ns></page>";
        let decomposed = "<page><title>Boz\u{30c}ena Ne\u{306}mcova\u{301}</title><ns>0</ns></page>";
        assert_eq!(parse_page(xml).unwrap().title, parse_page(decomposed).unwrap().title);
    }

    #[test]
    fn unescape_order() {
        assert_eq!(unescape_xml("&amp;lt; &lt;b&gt; &quot;q&quot;"), "&lt; <b> \"q\"");
    }
}
