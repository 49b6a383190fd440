//! TF-IDF term-weight index with cosine similarity ranking
//!
//! The index is rebuilt from scratch over the whole corpus; there is no
//! incremental update. `SearchIndex` swaps a finished `TermIndex` in
//! atomically so readers see either the old or the new index, never a mix.

use crate::search::text::terms;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Scores must be strictly above this to count as a match
pub const MIN_SCORE: f64 = 0.001;

/// Terms in more than this share of documents are dropped (corpora of 2+ documents)
pub const MAX_DOCUMENT_FREQUENCY: f64 = 0.95;

/// Index-time projection of a stored page
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub domain: String,
}

impl Document {
    /// Title twice plus content, so title terms weigh double
    fn indexed_text(&self) -> String {
        format!("{} {} {}", self.title, self.title, self.content)
    }
}

/// A document matched by a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDocument {
    /// Position of the document in the index
    pub position: usize,
    pub score: f64,
}

/// Sparse L2-normalised vector as (term index, weight), sorted by term index
type SparseVector = Vec<(usize, f64)>;

/// Immutable vector-space model over a document set
#[derive(Debug, Default)]
pub struct TermIndex {
    documents: Vec<Document>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
}

impl TermIndex {
    /// Builds the model over `documents`
    ///
    /// # Arguments
    ///
    /// * `documents` - The full corpus, in stable order (ties rank in this order)
    /// * `max_features` - Vocabulary cap; the most frequent terms are kept
    pub fn build(documents: Vec<Document>, max_features: usize) -> Self {
        let doc_terms: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|doc| count_terms(terms(&doc.indexed_text())))
            .collect();

        let n = documents.len();
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        let mut corpus_frequency: HashMap<&str, usize> = HashMap::new();
        for counts in &doc_terms {
            for (term, count) in counts {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
                *corpus_frequency.entry(term.as_str()).or_insert(0) += count;
            }
        }

        let ceiling = MAX_DOCUMENT_FREQUENCY * n as f64;
        let mut candidates: Vec<(&str, usize)> = corpus_frequency
            .into_iter()
            .filter(|(term, _)| n < 2 || (document_frequency[term] as f64) <= ceiling)
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        candidates.truncate(max_features);

        let mut vocabulary = HashMap::with_capacity(candidates.len());
        let mut idf = Vec::with_capacity(candidates.len());
        for (position, (term, _)) in candidates.iter().enumerate() {
            vocabulary.insert(term.to_string(), position);
            let df = document_frequency[term] as f64;
            idf.push(((1.0 + n as f64) / (1.0 + df)).ln() + 1.0);
        }

        let vectors = doc_terms
            .iter()
            .map(|counts| weigh(counts, &vocabulary, &idf))
            .collect();

        tracing::debug!(
            "Built term index: {} documents, {} terms",
            n,
            vocabulary.len()
        );

        Self {
            documents,
            vocabulary,
            idf,
            vectors,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn document(&self, position: usize) -> Option<&Document> {
        self.documents.get(position)
    }

    /// Ranks documents against `query`
    ///
    /// A blank query matches every (filtered) document at score 1.0 in
    /// corpus order. Otherwise results are cosine scores above
    /// [`MIN_SCORE`], highest first, ties in corpus order. A domain filter
    /// of `None` or `"all"` means no filter.
    pub fn query(&self, query: &str, domain_filter: Option<&str>) -> Vec<ScoredDocument> {
        let filter = domain_filter
            .map(str::trim)
            .filter(|d| !d.is_empty() && !d.eq_ignore_ascii_case("all"));

        let candidates = self
            .documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| filter.map_or(true, |d| doc.domain.eq_ignore_ascii_case(d)))
            .map(|(position, _)| position);

        if query.trim().is_empty() {
            return candidates
                .map(|position| ScoredDocument {
                    position,
                    score: 1.0,
                })
                .collect();
        }

        let query_vector = weigh(&count_terms(terms(query)), &self.vocabulary, &self.idf);
        if query_vector.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<ScoredDocument> = candidates
            .map(|position| ScoredDocument {
                position,
                score: dot(&query_vector, &self.vectors[position]),
            })
            .filter(|scored| scored.score > MIN_SCORE)
            .collect();

        // Stable: equal scores keep corpus order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }
}

fn count_terms(terms: Vec<String>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for term in terms {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

fn weigh(
    counts: &HashMap<String, usize>,
    vocabulary: &HashMap<String, usize>,
    idf: &[f64],
) -> SparseVector {
    let mut vector: SparseVector = counts
        .iter()
        .filter_map(|(term, count)| {
            vocabulary
                .get(term)
                .map(|&index| (index, *count as f64 * idf[index]))
        })
        .collect();
    // Summation order fixes the rounding of the norm
    vector.sort_by_key(|(index, _)| *index);

    let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Vec::new();
    }
    for (_, weight) in vector.iter_mut() {
        *weight /= norm;
    }
    vector
}

fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Shared handle to the current index, replaced wholesale on rebuild
#[derive(Debug, Default)]
pub struct SearchIndex {
    current: RwLock<Arc<TermIndex>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current index; later rebuilds do not affect it
    pub fn snapshot(&self) -> Arc<TermIndex> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Builds a new index and swaps it in
    pub fn rebuild(&self, documents: Vec<Document>, max_features: usize) {
        let index = Arc::new(TermIndex::build(documents, max_features));
        tracing::info!(
            "Search index rebuilt: {} documents, {} terms",
            index.len(),
            index.vocabulary_size()
        );
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = index;
    }
}
