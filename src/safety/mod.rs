//! Text safety for user-entered fields.
//!
//! - [`catalog`]: the disallowed-content pattern catalog (data only).
//! - [`sanitizer`]: normalization, structural checks and catalog matching.

pub mod catalog;
pub mod sanitizer;

pub use catalog::{CatalogEntry, CatalogMatch, CompiledCatalog, ContentCategory, CATALOG};
pub use sanitizer::{
    normalize_for_match, normalize_whitespace, MatchPass, Rejection, TextSanitizer, Verdict,
    MAX_LENGTH, REPEAT_LIMIT,
};
