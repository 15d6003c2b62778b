//! FAQ catalog: the fixed, ordered list of question/answer pairs.
//!
//! The catalog is loaded once at startup (embedded default or a TOML/JSON
//! file) and is read-only afterwards. Token data for each entry is computed
//! at load time so matching never re-tokenizes catalog text.
//!
//! # Example catalog file
//!
//! ```toml
//! [[entries]]
//! question = "Do you provide free pickup and delivery?"
//! answer = "Yes! We offer FREE pickup and delivery across Dubai."
//! keywords = ["free", "pickup", "delivery"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::canonicalize::{expanded_set, folded_set, keywords, normalize_word};

const DEFAULT_CATALOG: &str = include_str!("../../data/faq.toml");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read FAQ catalog: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse FAQ catalog (TOML): {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse FAQ catalog (JSON): {0}")]
    Json(#[from] serde_json::Error),

    #[error("FAQ catalog entry {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
}

/// A canonical question with its answer and optional authored keyword hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl FaqEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            keywords: None,
        }
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = Some(keywords.iter().map(|k| k.to_string()).collect());
        self
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    entries: Vec<FaqEntry>,
}

/// A catalog word kept in both spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HintWord {
    pub raw: String,
    pub folded: String,
}

/// Precomputed token views of one entry.
#[derive(Debug, Clone)]
pub(crate) struct PreparedEntry {
    pub question_lower: String,
    pub answer_lower: String,
    /// Folded question keywords.
    pub question_folded: HashSet<String>,
    /// Folded answer keywords.
    pub answer_folded: HashSet<String>,
    /// Raw and folded tokens of question, answer and authored keywords.
    pub union_expanded: HashSet<String>,
    /// Authored keywords (or question keywords when none were authored).
    pub hints: Vec<HintWord>,
    /// Question keywords, one per folded form.
    pub question_words: Vec<HintWord>,
}

/// Dedupes by folded form, keeping the first spelling seen.
fn hint_words(words: &[String]) -> Vec<HintWord> {
    let mut seen = HashSet::new();
    words
        .iter()
        .map(|raw| HintWord {
            raw: raw.clone(),
            folded: normalize_word(raw),
        })
        .filter(|w| seen.insert(w.folded.clone()))
        .collect()
}

impl PreparedEntry {
    fn from_entry(entry: &FaqEntry) -> Self {
        let question_lower = entry.question.to_lowercase();
        let answer_lower = entry.answer.to_lowercase();
        let question_keywords = keywords(&question_lower);
        let answer_keywords = keywords(&answer_lower);

        let authored: Vec<String> = entry
            .keywords
            .iter()
            .flatten()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let mut union_expanded = expanded_set(question_keywords.iter().chain(&answer_keywords));
        union_expanded.extend(expanded_set(&authored));

        let hints = if authored.is_empty() {
            hint_words(&question_keywords)
        } else {
            hint_words(&authored)
        };

        Self {
            question_folded: folded_set(&question_keywords),
            answer_folded: folded_set(&answer_keywords),
            question_words: hint_words(&question_keywords),
            question_lower,
            answer_lower,
            union_expanded,
            hints,
        }
    }
}

/// Immutable, ordered FAQ catalog.
#[derive(Debug, Clone)]
pub struct FaqCatalog {
    entries: Vec<FaqEntry>,
    prepared: Vec<PreparedEntry>,
}

impl FaqCatalog {
    /// Build a catalog from entries, validating that no text field is empty.
    pub fn new(entries: Vec<FaqEntry>) -> Result<Self, CatalogError> {
        for (index, entry) in entries.iter().enumerate() {
            if entry.question.trim().is_empty() {
                return Err(CatalogError::EmptyField {
                    index,
                    field: "question",
                });
            }
            if entry.answer.trim().is_empty() {
                return Err(CatalogError::EmptyField {
                    index,
                    field: "answer",
                });
            }
        }
        let prepared = entries.iter().map(PreparedEntry::from_entry).collect();
        Ok(Self { entries, prepared })
    }

    /// The catalog shipped with the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_toml_str(DEFAULT_CATALOG)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.entries)
    }

    /// Accepts either `{"entries": [...]}` or a bare array of entries.
    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let entries: Vec<FaqEntry> = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            serde_json::from_value::<CatalogFile>(value)?.entries
        };
        Self::new(entries)
    }

    /// Load from a file; `.json` files are parsed as JSON, everything else as TOML.
    pub fn load_from(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let catalog = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        tracing::debug!(path = %path.display(), entries = catalog.len(), "faq catalog loaded");
        Ok(catalog)
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&FaqEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry whose question equals `question`, ignoring case and surrounding whitespace.
    pub fn find_question(&self, question: &str) -> Option<&FaqEntry> {
        let wanted = question.trim().to_lowercase();
        self.entries
            .iter()
            .zip(&self.prepared)
            .find(|(_, p)| p.question_lower.trim() == wanted)
            .map(|(e, _)| e)
    }

    pub(crate) fn iter_prepared(&self) -> impl Iterator<Item = (usize, &FaqEntry, &PreparedEntry)> {
        self.entries
            .iter()
            .zip(&self.prepared)
            .enumerate()
            .map(|(i, (e, p))| (i, e, p))
    }
}
