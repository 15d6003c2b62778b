//! FAQ matcher: ranks a fixed catalog against a free-text question.
//!
//! Two scoring modes share one implementation:
//!
//! - **Weighted** sums independent additive signals into an unbounded raw
//!   score. Any positive score is a match.
//! - **Confidence** sums two capped signal classes into `[0, 1]`. A match is
//!   reported only above [`MatcherSettings::confidence_floor`].
//!
//! Matching is a pure function of `(query, catalog, settings)`. The first
//! entry reaching the maximum score wins; later equal scores never replace it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::canonicalize::{expanded_set, folded_set, keywords, meaningful_len, normalize_word};
use super::catalog::{FaqCatalog, FaqEntry, HintWord, PreparedEntry};

pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.15;
pub const DEFAULT_RELATED_FLOOR: f64 = 0.1;
pub const DEFAULT_MIN_QUERY_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Raw additive score, unbounded.
    #[default]
    Weighted,
    /// Capped score in `[0, 1]` gated by a floor.
    Confidence,
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weighted => write!(f, "weighted"),
            Self::Confidence => write!(f, "confidence"),
        }
    }
}

/// Per-signal weights for [`ScoringMode::Weighted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Query token found among the question's tokens.
    pub question_token: f64,
    /// Query sub-phrase found verbatim in the question text.
    pub question_phrase: f64,
    /// Query token found among the answer's tokens.
    pub answer_token: f64,
    /// Overlap between query tokens and the entry's full token union.
    pub overlap: f64,
    /// Query sub-phrase found verbatim in the answer text.
    pub answer_phrase: f64,
    /// Flat bonus for "what is X service" style questions.
    pub domain_bonus: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            question_token: 100.0,
            question_phrase: 60.0,
            answer_token: 50.0,
            overlap: 30.0,
            answer_phrase: 25.0,
            domain_bonus: 20.0,
        }
    }
}

/// Signal weights and caps for [`ScoringMode::Confidence`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub keyword: f64,
    pub keyword_cap: f64,
    pub question_word: f64,
    pub question_word_cap: f64,
    /// Question words shorter than this are ignored.
    pub min_question_word_len: usize,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            keyword: 0.4,
            keyword_cap: 0.7,
            question_word: 0.1,
            question_word_cap: 0.3,
            min_question_word_len: 4,
        }
    }
}

/// Everything that tunes the matcher. Deserialized from the `[matcher]` config table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSettings {
    pub mode: ScoringMode,
    pub weights: Weights,
    pub confidence: ConfidenceWeights,
    /// Confidence mode reports a match only strictly above this.
    pub confidence_floor: f64,
    /// Confidence mode lists related questions only strictly above this.
    pub related_floor: f64,
    /// Queries with fewer non-whitespace characters are rejected up front.
    pub min_query_chars: usize,
    pub phrase_min_tokens: usize,
    pub phrase_max_tokens: usize,
    /// Question word that arms the domain bonus.
    pub domain_trigger: String,
    /// Any of these in the question completes the domain bonus pattern.
    pub domain_words: Vec<String>,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            mode: ScoringMode::Weighted,
            weights: Weights::default(),
            confidence: ConfidenceWeights::default(),
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            related_floor: DEFAULT_RELATED_FLOOR,
            min_query_chars: DEFAULT_MIN_QUERY_CHARS,
            phrase_min_tokens: 2,
            phrase_max_tokens: 3,
            domain_trigger: "what".into(),
            domain_words: vec!["service".into(), "clean".into()],
        }
    }
}

impl MatcherSettings {
    pub fn confidence() -> Self {
        Self {
            mode: ScoringMode::Confidence,
            ..Self::default()
        }
    }

    /// Checks the invariants the scoring relies on.
    pub fn validate(&self) -> Result<(), String> {
        let w = &self.weights;
        let all = [
            w.question_token,
            w.question_phrase,
            w.answer_token,
            w.overlap,
            w.answer_phrase,
            w.domain_bonus,
        ];
        if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("matcher weights must be finite and non-negative".into());
        }
        if !(w.question_token > w.question_phrase
            && w.question_phrase > w.answer_token
            && w.answer_token > w.overlap
            && w.overlap > w.answer_phrase)
        {
            return Err(
                "matcher weights must be ordered question_token > question_phrase > answer_token > overlap > answer_phrase"
                    .into(),
            );
        }
        for (name, floor) in [
            ("confidence_floor", self.confidence_floor),
            ("related_floor", self.related_floor),
        ] {
            if !(0.0..1.0).contains(&floor) {
                return Err(format!("{name} must be in [0, 1)"));
            }
        }
        if self.phrase_min_tokens == 0 || self.phrase_min_tokens > self.phrase_max_tokens {
            return Err("phrase token bounds must satisfy 1 <= min <= max".into());
        }
        Ok(())
    }
}

/// The winning (or a related) entry with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaqMatch {
    /// Position in the catalog.
    pub index: usize,
    pub question: String,
    pub answer: String,
    pub score: f64,
}

impl FaqMatch {
    fn new(index: usize, entry: &FaqEntry, score: f64) -> Self {
        Self {
            index,
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            score,
        }
    }
}

/// Tokenized view of one query, built once per call.
struct QueryTokens {
    ordered: Vec<String>,
    folded: Vec<String>,
    expanded: HashSet<String>,
    folded_set: HashSet<String>,
}

impl QueryTokens {
    fn new(query: &str) -> Self {
        let ordered = keywords(query);
        let folded = ordered.iter().map(|t| normalize_word(t)).collect();
        Self {
            expanded: expanded_set(&ordered),
            folded_set: folded_set(&ordered),
            ordered,
            folded,
        }
    }

    /// Folded forms agree, or a query token contains the word ("shoes" holds "shoe").
    fn contains(&self, word: &HintWord) -> bool {
        self.folded_set.contains(&word.folded)
            || self.ordered.iter().any(|t| t.contains(word.raw.as_str()))
    }
}

/// Parameterized FAQ matcher over an injected, read-only catalog.
#[derive(Debug, Clone)]
pub struct FaqMatcher {
    catalog: FaqCatalog,
    settings: MatcherSettings,
}

impl FaqMatcher {
    pub fn new(catalog: FaqCatalog, settings: MatcherSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn catalog(&self) -> &FaqCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &MatcherSettings {
        &self.settings
    }

    /// Score of every catalog entry, in catalog order.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let tokens = QueryTokens::new(query);
        self.catalog
            .iter_prepared()
            .map(|(_, _, prepared)| self.score_prepared(&tokens, prepared))
            .collect()
    }

    /// Best entry for `query`, or `None` when nothing clears the mode's threshold.
    ///
    /// No length check happens here; degenerate input simply scores zero.
    pub fn best_match(&self, query: &str) -> Option<FaqMatch> {
        let tokens = QueryTokens::new(query);
        if tokens.ordered.is_empty() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, _, prepared) in self.catalog.iter_prepared() {
            let score = self.score_prepared(&tokens, prepared);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((index, score));
            }
        }

        let (index, score) = best?;
        if !self.accepts(score) {
            return None;
        }
        let entry = self.catalog.get(index)?;
        Some(FaqMatch::new(index, entry, score))
    }

    /// Caller-facing lookup: rejects too-short queries, then delegates to [`best_match`].
    ///
    /// [`best_match`]: Self::best_match
    #[tracing::instrument(name = "faq_match", skip(self), fields(mode = %self.settings.mode))]
    pub fn answer(&self, query: &str) -> Option<FaqMatch> {
        if meaningful_len(query) < self.settings.min_query_chars {
            tracing::info!(reason = "too_short", "faq_no_match");
            return None;
        }
        let found = self.best_match(query);
        match &found {
            Some(m) => tracing::info!(index = m.index, score = m.score, "faq_matched"),
            None => tracing::info!(reason = "below_threshold", "faq_no_match"),
        }
        found
    }

    /// Other entries worth showing next to the best match, strongest first.
    pub fn related(&self, query: &str, limit: usize) -> Vec<FaqMatch> {
        if meaningful_len(query) < self.settings.min_query_chars {
            return Vec::new();
        }
        let best = self.best_match(query).map(|m| m.index);
        let floor = match self.settings.mode {
            ScoringMode::Weighted => 0.0,
            ScoringMode::Confidence => self.settings.related_floor,
        };

        let mut hits: Vec<FaqMatch> = self
            .scores(query)
            .into_iter()
            .enumerate()
            .filter(|(index, score)| *score > floor && Some(*index) != best)
            .filter_map(|(index, score)| {
                self.catalog
                    .get(index)
                    .map(|entry| FaqMatch::new(index, entry, score))
            })
            .collect();
        // stable: equal scores keep catalog order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        hits
    }

    fn accepts(&self, score: f64) -> bool {
        match self.settings.mode {
            ScoringMode::Weighted => score > 0.0,
            ScoringMode::Confidence => score > self.settings.confidence_floor,
        }
    }

    fn score_prepared(&self, tokens: &QueryTokens, entry: &PreparedEntry) -> f64 {
        if tokens.ordered.is_empty() {
            return 0.0;
        }
        match self.settings.mode {
            ScoringMode::Weighted => self.weighted_score(tokens, entry),
            ScoringMode::Confidence => self.confidence_score(tokens, entry),
        }
    }

    fn weighted_score(&self, tokens: &QueryTokens, entry: &PreparedEntry) -> f64 {
        let w = &self.settings.weights;
        let mut score = 0.0;

        let question_hits = tokens
            .folded
            .iter()
            .filter(|t| entry.question_folded.contains(*t))
            .count();
        let answer_hits = tokens
            .folded
            .iter()
            .filter(|t| entry.answer_folded.contains(*t))
            .count();
        score += question_hits as f64 * w.question_token;
        score += answer_hits as f64 * w.answer_token;

        for phrase in self.phrases(&tokens.ordered) {
            if entry.question_lower.contains(&phrase) {
                score += w.question_phrase;
            }
            if entry.answer_lower.contains(&phrase) {
                score += w.answer_phrase;
            }
        }

        let overlap = tokens.expanded.intersection(&entry.union_expanded).count();
        score += overlap as f64 * w.overlap;

        let direct = question_hits + answer_hits;
        if direct > 0
            && entry.question_lower.contains(&self.settings.domain_trigger)
            && self
                .settings
                .domain_words
                .iter()
                .any(|word| entry.question_lower.contains(word.as_str()))
        {
            score += w.domain_bonus;
        }

        score
    }

    fn confidence_score(&self, tokens: &QueryTokens, entry: &PreparedEntry) -> f64 {
        let c = &self.settings.confidence;

        let keyword_hits = entry.hints.iter().filter(|h| tokens.contains(h)).count();
        let question_hits = entry
            .question_words
            .iter()
            .filter(|w| w.raw.chars().count() >= c.min_question_word_len && tokens.contains(w))
            .count();

        let keyword_part = (keyword_hits as f64 * c.keyword).min(c.keyword_cap);
        let question_part = (question_hits as f64 * c.question_word).min(c.question_word_cap);
        (keyword_part + question_part).clamp(0.0, 1.0)
    }

    /// Contiguous sub-phrases of the query within the configured token bounds.
    fn phrases(&self, tokens: &[String]) -> Vec<String> {
        let (min, max) = (
            self.settings.phrase_min_tokens,
            self.settings.phrase_max_tokens,
        );
        let mut out = Vec::new();
        for start in 0..tokens.len() {
            for len in min..=max {
                let end = start + len;
                if end > tokens.len() {
                    break;
                }
                out.push(tokens[start..end].join(" "));
            }
        }
        out
    }
}
