//! Text preprocessing shared by the query and catalog sides of FAQ matching.
//!
//! Both sides go through the same pipeline so that plural and singular forms
//! fold onto the same key:
//!
//! 1. **Split** on whitespace and lowercase.
//! 2. **Strip** non-alphanumeric characters inside each token (`"pickup?"` → `"pickup"`).
//! 3. **Filter** tokens of [`MIN_KEYWORD_LEN`] characters or fewer and stop words.
//! 4. **Fold** plurals with [`normalize_word`] where a caller needs it.

use std::collections::HashSet;

/// Tokens this short or shorter carry no signal.
pub const MIN_KEYWORD_LEN: usize = 2;

/// Articles, prepositions and question words dropped before scoring.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "or", "that", "the", "to", "was", "will", "with", "you", "your", "do",
    "does", "how", "what", "when", "where", "why", "can", "have", "i", "we", "they", "if", "this",
    "but", "which",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Folds common English plural endings onto the singular form.
///
/// This is a suffix heuristic, not a stemmer: `babies → baby`,
/// `dresses → dress`, `boxes → box`, `books → book`. The `-oes` rule is
/// blunt (`shoes → sho`), so matchers also check raw-token containment.
/// Words ending in `ss` are left alone.
pub fn normalize_word(word: &str) -> String {
    let word = word.trim().to_lowercase();
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if ["sses", "ches", "xes", "zes", "oes"]
        .iter()
        .any(|suffix| word.ends_with(suffix))
    {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word
}

/// Extracts the meaningful keywords of `text`, in order, duplicates kept.
pub fn keywords(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|raw| {
            let token: String = raw
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if token.chars().count() <= MIN_KEYWORD_LEN || is_stop_word(&token) {
                return None;
            }
            Some(token)
        })
        .collect()
}

/// Raw and folded forms of every token, so either spelling can hit.
pub fn expanded_set<'a, I>(tokens: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut set = HashSet::new();
    for token in tokens {
        set.insert(normalize_word(token));
        set.insert(token.clone());
    }
    set
}

/// Folded forms only.
pub fn folded_set<'a, I>(tokens: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    tokens.into_iter().map(|t| normalize_word(t)).collect()
}

/// Number of characters that are not whitespace.
pub fn meaningful_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
