//! Knowledge-base side files: the `HEAD-KB` column layout and `VERSION`.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{KbError, Result};

const SHARED_COLUMNS: &str = "ID\tTYPE\tNAME\t{m}ALIASES\t{m}REDIRECTS\tDESCRIPTION\tORIGINAL_WIKINAME\t{gm[http://athena3.fit.vutbr.cz/kb/images/]}IMAGE\t{ui}WIKIPEDIA LINK";
const METRIC_COLUMNS: &str = "WIKI BACKLINKS\tWIKI HITS\tWIKI PRIMARY SENSE\tSCORE WIKI\tSCORE METRICS\tCONFIDENCE";

const PERSON: &str = "GENDER\t{e}DATE OF BIRTH\tPLACE OF BIRTH\t{e}DATE OF DEATH\tPLACE OF DEATH\t{m}JOBS\t{m}NATIONALITY";
const ARTIST: &str = "GENDER\t{e}DATE OF BIRTH\tPLACE OF BIRTH\t{e}DATE OF DEATH\tPLACE OF DEATH\t{m}JOBS\t{m}NATIONALITY\t{m}ART_FORMS\t{m}INFLUENCERS\t{m}INFLUENCEES\tULAN_ID\t{m}OTHER_URLS";
const COUNTRY: &str = "LATITUDE\tLONGITUDE\tAREA\tPOPULATION";

/// Kind-specific columns of every record prefix, in `HEAD-KB` order.
pub const KIND_COLUMNS: &[(&str, &str)] = &[
    ("person", PERSON),
    ("person:artist", ARTIST),
    ("person:fictional", PERSON),
    ("person:group", PERSON),
    ("country", COUNTRY),
    ("country:former", COUNTRY),
    ("settlement", "COUNTRY\tLATITUDE\tLONGITUDE\tAREA\tPOPULATION"),
    ("watercourse", "{m}CONTINENT\tLATITUDE\tLONGITUDE\tLENGTH\tAREA\tSTREAMFLOW\tSOURCE_LOC"),
    ("waterarea", "{m}CONTINENT\tLATITUDE\tLONGITUDE\tAREA"),
    ("geo:relief", "{m}CONTINENT\tLATITUDE\tLONGITUDE"),
    ("geo:waterfall", "{m}CONTINENT\tLATITUDE\tLONGITUDE\tTOTAL HEIGHT"),
    ("geo:island", "{m}CONTINENT\tLATITUDE\tLONGITUDE\tAREA\tPOPULATION"),
    ("geo:peninsula", "LATITUDE\tLONGITUDE"),
    ("geo:continent", "LATITUDE\tLONGITUDE\tAREA\tPOPULATION"),
    ("organisation", "FOUNDED\tCANCELLED\tORGANISATION_TYPE\tLOCATION"),
    ("event", "START\tEND\tLOCATION\tEVENT_TYPE"),
];

lazy_static! {
    static ref DUMP_DATE: Regex = Regex::new(r"wiki-([0-9]{8})-").unwrap();
}

/// Number of kind-specific columns a record of `prefix` carries.
pub fn column_count(prefix: &str) -> Option<usize> {
    KIND_COLUMNS
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, columns)| columns.split('\t').count())
}

/// The `HEAD-KB` text: one `<prefix>` line per record prefix.
pub fn head_kb() -> String {
    KIND_COLUMNS
        .iter()
        .map(|(prefix, columns)| format!("<{}>{}\t{}\t{}\n", prefix, SHARED_COLUMNS, columns, METRIC_COLUMNS))
        .collect()
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let io_err = |source| KbError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(path).map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)
}

pub fn write_head_kb(path: &Path) -> Result<()> {
    write_file(path, &head_kb())
}

/// Release channel appended to the version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    Release,
    Dev,
    Test,
}

impl Stability {
    fn suffix(self) -> &'static str {
        match self {
            Stability::Release => "",
            Stability::Dev => "-dev",
            Stability::Test => "-test",
        }
    }
}

/// Dump date (`YYYYMMDD`) from a dump file name such as
/// `enwiki-20240101-pages-articles.xml.bz2`, following a symlink when the
/// path is one.
pub fn dump_date(path: &Path, lang: &str) -> Option<String> {
    let target = fs::read_link(path).unwrap_or_else(|_| path.to_path_buf());
    let name = target.file_name()?.to_string_lossy().into_owned();
    let caps = DUMP_DATE.captures(&name)?;
    let prefix = &name[..caps.get(0)?.start()];
    prefix.ends_with(lang).then(|| caps[1].to_string())
}

/// `{lang}_{dump}-{unix time}` plus the stability suffix.
pub fn version_string(lang: &str, dump: &str, timestamp: u64, stability: Stability) -> String {
    format!("{}_{}-{}{}", lang, dump, timestamp, stability.suffix())
}

pub fn write_version(path: &Path, lang: &str, dump: &str, stability: Stability) -> Result<()> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    write_file(path, &version_string(lang, dump, timestamp, stability))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::KINDS;

    #[test]
    fn head_has_one_line_per_prefix() {
        let head = head_kb();
        let lines: Vec<&str> = head.lines().collect();
        assert_eq!(lines.len(), 16);
        assert!(lines[0].starts_with("<person>ID\tTYPE\tNAME\t{m}ALIASES"));
        assert!(lines[15].starts_with("<event>"));
        assert!(lines.iter().all(|l| l.ends_with("SCORE METRICS\tCONFIDENCE")));
        assert!(head.contains("\t{ui}WIKIPEDIA LINK\tCOUNTRY\tLATITUDE\tLONGITUDE\tAREA\tPOPULATION\tWIKI BACKLINKS"));
    }

    #[test]
    fn every_kind_has_a_layout() {
        for kind in KINDS {
            assert!(
                KIND_COLUMNS.iter().any(|(prefix, _)| prefix.split(':').next() == Some(*kind)),
                "{}",
                kind
            );
        }
        assert_eq!(column_count("person:artist"), Some(12));
        assert_eq!(column_count("geo:peninsula"), Some(2));
        assert_eq!(column_count("unknown"), None);
    }

    #[test]
    fn version_format() {
        assert_eq!(version_string("cs", "20240101", 1700000000, Stability::Dev), "cs_20240101-1700000000-dev");
        assert_eq!(version_string("en", "latest", 5, Stability::Release), "en_latest-5");
        assert_eq!(version_string("en", "latest", 5, Stability::Test), "en_latest-5-test");
    }

    #[test]
    fn dump_date_from_name() {
        assert_eq!(
            dump_date(Path::new("/data/enwiki-20240101-pages-articles.xml.bz2"), "en"),
            Some("20240101".to_string())
        );
        assert_eq!(dump_date(Path::new("cswiki-20231120-pages-articles.xml"), "en"), None);
        assert_eq!(dump_date(Path::new("pages.xml"), "en"), None);
    }

    #[test]
    fn files_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let head = dir.path().join("HEAD-KB");
        write_head_kb(&head).unwrap();
        assert_eq!(fs::read_to_string(&head).unwrap(), head_kb());

        let version = dir.path().join("VERSION");
        write_version(&version, "en", "20240101", Stability::Test).unwrap();
        let text = fs::read_to_string(&version).unwrap();
        assert!(text.starts_with("en_20240101-"));
        assert!(text.ends_with("-test"));
    }

    #[cfg(unix)]
    #[test]
    fn dump_date_follows_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("cswiki-20231120-pages-articles.xml.bz2");
        fs::write(&target, b"").unwrap();
        let link = dir.path().join("cswiki-latest.xml.bz2");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        assert_eq!(dump_date(&link, "cs"), Some("20231120".to_string()));
    }
}
