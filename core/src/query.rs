use crate::index::SearchIndex;
use crate::normalize::normalize;
use crate::DocId;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Queries return at most this many ranked hits.
pub const RESULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// Sum of each query token's weighted term frequency times `idf_smooth`.
    WeightedSum,
    /// Cosine similarity between query and document TF-IDF vectors.
    Cosine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hit {
    pub doc_id: DocId,
    pub score: f64,
}

/// A scoring mode was requested that this index cannot serve. Degraded-mode
/// callers need to tell this apart from an empty result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    MagnitudesUnavailable,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::MagnitudesUnavailable => {
                write!(f, "document magnitudes not loaded; cosine scoring unavailable")
            }
        }
    }
}

impl std::error::Error for SearchError {}

impl SearchIndex {
    /// Rank documents for a free-text query. Unknown tokens and degenerate
    /// queries yield an empty list, never an error; the only error is
    /// requesting cosine scoring on an index loaded without magnitudes.
    pub fn search(
        &self,
        raw_query: &str,
        mode: ScoreMode,
        combinator: Combinator,
    ) -> Result<Vec<Hit>, SearchError> {
        let tokens = normalize(raw_query, true);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        match mode {
            ScoreMode::WeightedSum => Ok(self.weighted_sum(&tokens, combinator)),
            ScoreMode::Cosine => self.cosine(&tokens, combinator),
        }
    }

    /// Candidate documents for a token sequence. OR is the union over known
    /// tokens; AND intersects, with an index-absent token contributing an
    /// empty set (it is not dropped, so the whole intersection empties).
    fn candidates(&self, tokens: &[String], combinator: Combinator) -> BTreeSet<DocId> {
        match combinator {
            Combinator::Or => tokens
                .iter()
                .filter_map(|t| self.entry(t))
                .flat_map(|e| e.postings.keys().copied())
                .collect(),
            Combinator::And => {
                let mut common: Option<BTreeSet<DocId>> = None;
                for token in tokens {
                    let docs: BTreeSet<DocId> = match self.entry(token) {
                        Some(entry) => entry.postings.keys().copied().collect(),
                        None => BTreeSet::new(),
                    };
                    common = Some(match common {
                        Some(c) => c.intersection(&docs).copied().collect(),
                        None => docs,
                    });
                    if common.as_ref().is_some_and(|c| c.is_empty()) {
                        break;
                    }
                }
                common.unwrap_or_default()
            }
        }
    }

    fn weighted_sum(&self, tokens: &[String], combinator: Combinator) -> Vec<Hit> {
        let candidates = self.candidates(tokens, combinator);
        let mut scores: HashMap<DocId, f64> = HashMap::new();
        // Iterating the sequence, not a set: a token repeated in the query
        // contributes once per occurrence.
        for token in tokens {
            let Some(entry) = self.entry(token) else {
                continue;
            };
            for (&doc_id, &weighted_tf) in &entry.postings {
                if !candidates.contains(&doc_id) {
                    continue;
                }
                *scores.entry(doc_id).or_insert(0.0) += weighted_tf * entry.idf_smooth;
            }
        }
        rank(scores)
    }

    fn cosine(&self, tokens: &[String], combinator: Combinator) -> Result<Vec<Hit>, SearchError> {
        if !self.has_magnitudes() {
            return Err(SearchError::MagnitudesUnavailable);
        }

        // Query vector: token -> occurrence count * idf_smooth, over tokens
        // known to the index.
        let mut query_vector: HashMap<&str, f64> = HashMap::new();
        for token in tokens {
            if query_vector.contains_key(token.as_str()) {
                continue;
            }
            if let Some(entry) = self.entry(token) {
                let count = tokens.iter().filter(|t| *t == token).count() as f64;
                query_vector.insert(entry.token.as_str(), count * entry.idf_smooth);
            }
        }
        let query_magnitude = query_vector.values().map(|w| w * w).sum::<f64>().sqrt();
        if query_magnitude == 0.0 {
            return Ok(Vec::new());
        }

        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for doc_id in self.candidates(tokens, combinator) {
            let Some(doc_magnitude) = self.magnitude(doc_id).filter(|m| *m > 0.0) else {
                // Zero or missing magnitude: similarity is undefined.
                continue;
            };
            let mut dot = 0.0;
            for (&token, &query_weight) in &query_vector {
                if let Some(entry) = self.entry(token) {
                    if let Some(&weighted_tf) = entry.postings.get(&doc_id) {
                        dot += query_weight * weighted_tf * entry.idf_smooth;
                    }
                }
            }
            scores.insert(doc_id, dot / (query_magnitude * doc_magnitude));
        }
        Ok(rank(scores))
    }
}

/// Sort by score descending, ties by ascending document ordinal, keep the top
/// [`RESULT_LIMIT`].
fn rank(scores: HashMap<DocId, f64>) -> Vec<Hit> {
    let mut hits: Vec<Hit> = scores
        .into_iter()
        .map(|(doc_id, score)| Hit { doc_id, score })
        .collect();
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    hits.truncate(RESULT_LIMIT);
    hits
}
