use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::corpus::normalize::strip_quotes;
use crate::corpus::GrantCorpus;
use crate::error::{RecommendError, Result};
use crate::vectorizer::sparse::SparseVec;
use crate::vectorizer::{TextVectorizer, VectorizerParams};

/// Default cosine threshold for a near-duplicate title
pub const DUPLICATE_THRESHOLD: f64 = 0.85;

/// Outcome of a near-duplicate check
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    /// 1.0 for an exact match, the cosine when above threshold, else 0.0
    pub score: f64,
}

impl DuplicateCheck {
    const NONE: Self = Self { is_duplicate: false, score: 0.0 };
}

/// Lowercased, quote-stripped form used for the exact-match fast path
fn exact_key(title: &str) -> String {
    strip_quotes(&title.to_lowercase()).to_string()
}

/// Cosine guarded against non-finite output, clamped to [0, 1]
fn checked_cosine(a: &SparseVec<f32>, b: &SparseVec<f32>) -> Result<f64> {
    let sim = a.cosine_similarity(b);
    if sim.is_finite() {
        Ok(sim.clamp(0.0, 1.0))
    } else {
        Err(RecommendError::Similarity(format!("non-finite cosine {sim}")))
    }
}

/// Title vectors of the whole corpus under a vectorizer fitted on those titles.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    vectorizer: TextVectorizer,
    title_vectors: IndexMap<String, SparseVec<f32>>,
}

impl SimilarityIndex {
    pub fn build(corpus: &GrantCorpus, params: VectorizerParams) -> Self {
        let titles = corpus.titles();
        let vectorizer: TextVectorizer = TextVectorizer::fit(&titles, params);
        let vectors = vectorizer.transform_many(&titles);
        let title_vectors: IndexMap<String, SparseVec<f32>> = titles
            .into_iter()
            .map(str::to_string)
            .zip(vectors)
            .collect();
        info!(
            titles = title_vectors.len(),
            vocabulary = vectorizer.vocabulary_len(),
            "similarity index built"
        );
        Self { vectorizer, title_vectors }
    }

    /// Vectorize arbitrary text in the title space
    #[inline]
    pub fn vectorize(&self, text: &str) -> SparseVec<f32> {
        self.vectorizer.transform(text)
    }

    /// Stored vector of a corpus title
    #[inline]
    pub fn title_vector(&self, title: &str) -> Option<&SparseVec<f32>> {
        self.title_vectors.get(title)
    }

    /// Cosine similarity of two texts, in [0, 1]
    pub fn similarity(&self, text_a: &str, text_b: &str) -> f64 {
        checked_cosine(&self.vectorize(text_a), &self.vectorize(text_b)).unwrap_or(0.0)
    }

    /// Cosine between a query vector and a corpus title.
    /// Titles outside the corpus are vectorized on the fly.
    pub fn similarity_to_title(&self, query: &SparseVec<f32>, title: &str) -> Result<f64> {
        match self.title_vector(title) {
            Some(vec) => checked_cosine(query, vec),
            None => checked_cosine(query, &self.vectorize(title)),
        }
    }

    /// Exact string match after lowercasing and quote stripping, falling back
    /// to cosine >= `threshold`.
    pub fn is_near_duplicate(&self, input: &str, candidate: &str, threshold: f64) -> DuplicateCheck {
        let query = self.vectorize(input);
        self.near_duplicate_with(input, &query, candidate, threshold)
            .unwrap_or(DuplicateCheck::NONE)
    }

    /// [`Self::is_near_duplicate`] with the input already vectorized.
    pub fn near_duplicate_with(
        &self,
        input: &str,
        query: &SparseVec<f32>,
        candidate: &str,
        threshold: f64,
    ) -> Result<DuplicateCheck> {
        if exact_key(input) == exact_key(candidate) {
            return Ok(DuplicateCheck { is_duplicate: true, score: 1.0 });
        }
        let sim = self.similarity_to_title(query, candidate)?;
        Ok(Self::duplicate_verdict(input, candidate, sim, threshold))
    }

    /// Near-duplicate decision for a cosine `sim` that is already known.
    pub fn duplicate_verdict(input: &str, candidate: &str, sim: f64, threshold: f64) -> DuplicateCheck {
        if exact_key(input) == exact_key(candidate) {
            DuplicateCheck { is_duplicate: true, score: 1.0 }
        } else if sim >= threshold {
            DuplicateCheck { is_duplicate: true, score: sim }
        } else {
            DuplicateCheck::NONE
        }
    }
}
