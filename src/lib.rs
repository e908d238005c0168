//! Knowledge-base extraction from Wikipedia XML dumps.
//!
//! Each article is reduced to an [`extract::ExtractedMarkup`], classified
//! into an entity kind by scored patterns, and normalized into one
//! tab-separated record whose columns depend on the kind.

pub mod classify;
pub mod config;
pub mod dump;
pub mod entity;
pub mod error;
pub mod extract;
pub mod geocode;
pub mod kb;
pub mod locale;
pub mod normalize;
pub mod parallel;
pub mod pipeline;
pub mod span;
pub mod unique;
pub mod wikicode;

pub use error::{KbError, Result};
