use std::path::PathBuf;

use thiserror::Error;

/// Startup and I/O failures. Per-page extraction never produces one of these;
/// unparseable fields degrade to empty values instead.
#[derive(Debug, Error)]
pub enum KbError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema {path:?}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse language map {path:?}: {source}")]
    LangMap {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid pattern for {owner}: {pattern:?}: {source}")]
    Pattern {
        owner: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("could not find schema/{0}; use --schema-dir to specify it")]
    SchemaNotFound(String),

    #[error("unsupported locale: {0}")]
    UnsupportedLocale(String),
}

pub type Result<T> = std::result::Result<T, KbError>;
