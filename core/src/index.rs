use crate::corpus::{Document, FieldWeights};
use crate::normalize::normalize;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One unique token of a sealed index: its postings and corpus statistics.
///
/// `doc_freq` always equals `postings.len()`; the builder derives it at seal
/// time rather than maintaining it alongside mutations. `idf`/`idf_smooth`
/// only exist on sealed entries, so they cannot be read mid-build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub token: String,
    pub doc_freq: u32,
    /// Document ordinal -> accumulated weighted term frequency: the sum of
    /// field weights over every occurrence of the token in that document.
    pub postings: BTreeMap<DocId, f64>,
    pub idf: f64,
    pub idf_smooth: f64,
}

#[derive(Debug, Default)]
struct PendingEntry {
    postings: BTreeMap<DocId, f64>,
}

/// Unsealed index: a single-pass accumulator over the corpus. Statistics are
/// not available here; [`IndexBuilder::seal`] consumes the builder, which
/// makes the build/statistics barrier a compile-time guarantee.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    entries: HashMap<String, PendingEntry>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index an entire corpus snapshot with the given field weights.
    pub fn build(corpus: &[Document], weights: &FieldWeights) -> IndexBuilder {
        let mut builder = IndexBuilder::new();
        for (ordinal, doc) in corpus.iter().enumerate() {
            builder.add_document(ordinal as DocId, doc, weights);
        }
        builder
    }

    /// Accumulate one document's weighted fields into the postings.
    pub fn add_document(&mut self, doc_id: DocId, doc: &Document, weights: &FieldWeights) {
        for (field, weight) in weights.iter() {
            let Some(text) = doc.field_text(field) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            for token in normalize(&text, false) {
                let entry = self.entries.entry(token).or_default();
                *entry.postings.entry(doc_id).or_insert(0.0) += weight;
            }
        }
    }

    pub fn num_terms(&self) -> usize {
        self.entries.len()
    }

    /// Finalize statistics over the complete entry set and seal the index.
    ///
    /// For each entry: `idf = ln(N/df)`, `idf_smooth = ln(N/(1+df)) + 1`
    /// (both 0 for an empty entry). Document magnitudes are the L2 norms of
    /// the TF-IDF vectors, `tfidf = weighted_tf * idf_smooth`.
    pub fn seal(self, num_docs: u32) -> SearchIndex {
        let n = num_docs as f64;
        let mut entries: HashMap<String, IndexEntry> = HashMap::with_capacity(self.entries.len());
        for (token, pending) in self.entries {
            let doc_freq = pending.postings.len() as u32;
            let (idf, idf_smooth) = if doc_freq > 0 {
                (
                    (n / doc_freq as f64).ln(),
                    (n / (1.0 + doc_freq as f64)).ln() + 1.0,
                )
            } else {
                (0.0, 0.0)
            };
            entries.insert(
                token.clone(),
                IndexEntry {
                    token,
                    doc_freq,
                    postings: pending.postings,
                    idf,
                    idf_smooth,
                },
            );
        }

        let mut squared: HashMap<DocId, f64> = HashMap::new();
        for entry in entries.values() {
            for (&doc_id, &weighted_tf) in &entry.postings {
                let tfidf = weighted_tf * entry.idf_smooth;
                *squared.entry(doc_id).or_insert(0.0) += tfidf * tfidf;
            }
        }
        let magnitudes = (0..num_docs)
            .map(|doc_id| (doc_id, squared.get(&doc_id).copied().unwrap_or(0.0).sqrt()))
            .collect();

        SearchIndex {
            entries,
            magnitudes: Some(magnitudes),
            num_docs,
        }
    }
}

/// Sealed, read-only index: entries with finalized statistics, the document
/// magnitude table, and the corpus size. Shared freely across concurrent
/// queries; rebuilding produces a new value rather than mutating this one.
///
/// `magnitudes` is `None` when the magnitude artifact was absent at load
/// time; weighted-sum scoring still works, cosine reports unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchIndex {
    entries: HashMap<String, IndexEntry>,
    magnitudes: Option<HashMap<DocId, f64>>,
    num_docs: u32,
}

impl SearchIndex {
    pub(crate) fn from_parts(
        entries: Vec<IndexEntry>,
        magnitudes: Option<HashMap<DocId, f64>>,
        num_docs: u32,
    ) -> SearchIndex {
        SearchIndex {
            entries: entries.into_iter().map(|e| (e.token.clone(), e)).collect(),
            magnitudes,
            num_docs,
        }
    }

    pub fn entry(&self, token: &str) -> Option<&IndexEntry> {
        self.entries.get(token)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn num_terms(&self) -> usize {
        self.entries.len()
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn magnitude(&self, doc_id: DocId) -> Option<f64> {
        self.magnitudes.as_ref().and_then(|m| m.get(&doc_id).copied())
    }

    pub fn has_magnitudes(&self) -> bool {
        self.magnitudes.is_some()
    }

    pub(crate) fn magnitudes(&self) -> Option<&HashMap<DocId, f64>> {
        self.magnitudes.as_ref()
    }
}
