/// TF-IDF weighting strategy used by `TextVectorizer`.
pub trait TFIDFEngine {
    /// IDF weight of a term
    /// # Arguments
    /// * `doc_num` - number of documents the vectorizer was fitted on
    /// * `doc_freq` - number of those documents containing the term
    fn idf(doc_num: u64, doc_freq: u64) -> f64;

    /// TF weight of a term inside one document
    /// # Arguments
    /// * `count` - occurrences of the term in the document
    /// * `token_sum` - number of tokens in the document
    fn tf(count: u32, token_sum: u64) -> f64;
}

/// Default engine
/// raw counts for TF, smoothed IDF: ln((1 + n) / (1 + df)) + 1
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTFIDFEngine;

impl TFIDFEngine for DefaultTFIDFEngine {
    #[inline]
    fn idf(doc_num: u64, doc_freq: u64) -> f64 {
        ((1.0 + doc_num as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
    }

    #[inline]
    fn tf(count: u32, _token_sum: u64) -> f64 {
        count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothed_idf_is_one_for_terms_in_every_doc() {
        assert!((DefaultTFIDFEngine::idf(4, 4) - 1.0).abs() < 1e-12);
        assert!(DefaultTFIDFEngine::idf(4, 1) > DefaultTFIDFEngine::idf(4, 2));
    }
}
