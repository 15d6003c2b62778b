//! FAQ search layer.
//!
//! - **[`canonicalize`]**: tokenization, stop words and plural folding shared by both sides.
//! - **[`catalog`]**: the immutable FAQ catalog and its loaders.
//! - **[`matcher`]**: weighted and confidence scoring over the catalog.

pub mod canonicalize;
pub mod catalog;
pub mod matcher;

pub use catalog::{CatalogError, FaqCatalog, FaqEntry};
pub use matcher::{FaqMatch, FaqMatcher, MatcherSettings, ScoringMode};
