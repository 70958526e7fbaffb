use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::vectorizer::token::TokenFrequency;

/// Per-term statistics gathered while fitting a vectorizer.
/// Keeps, for every token, the number of documents containing it
/// and the number of times it occurs across the whole corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentFrequency {
    doc_num: u64,
    #[serde(with = "indexmap::map::serde_seq")]
    term_stats: IndexMap<String, TermStat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStat {
    /// documents containing the term
    pub doc_freq: u64,
    /// occurrences across all documents
    pub corpus_count: u64,
}

impl DocumentFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one document's tokens
    pub fn add_doc(&mut self, doc: &TokenFrequency) {
        self.doc_num += 1;
        for (token, count) in doc.iter() {
            let stat = self.term_stats.entry(token.to_string()).or_default();
            stat.doc_freq += 1;
            stat.corpus_count += count as u64;
        }
    }

    /// Get the number of documents
    #[inline]
    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Get the current vocabulary size (number of unique terms)
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_stats.len()
    }

    pub fn doc_freq(&self, term: &str) -> u64 {
        self.term_stats.get(term).map_or(0, |s| s.doc_freq)
    }

    /// The `limit` most frequent terms by corpus count.
    /// Ties are broken alphabetically so the selection is deterministic.
    /// `None` keeps every term.
    pub fn top_terms(&self, limit: Option<usize>) -> Vec<&str> {
        let mut terms: Vec<(&str, u64)> = self
            .term_stats
            .iter()
            .map(|(t, s)| (t.as_str(), s.corpus_count))
            .collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        if let Some(limit) = limit {
            terms.truncate(limit);
        }
        terms.into_iter().map(|(t, _)| t).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_documents_not_occurrences() {
        let mut df = DocumentFrequency::new();
        df.add_doc(&TokenFrequency::from(&["quantum", "quantum", "error"][..]));
        df.add_doc(&TokenFrequency::from(&["quantum"][..]));
        assert_eq!(df.doc_num(), 2);
        assert_eq!(df.doc_freq("quantum"), 2);
        assert_eq!(df.doc_freq("error"), 1);
        assert_eq!(df.doc_freq("missing"), 0);
    }

    #[test]
    fn top_terms_orders_by_count_then_name() {
        let mut df = DocumentFrequency::new();
        df.add_doc(&TokenFrequency::from(&["beta", "alpha", "gamma", "gamma"][..]));
        assert_eq!(df.top_terms(None), vec!["gamma", "alpha", "beta"]);
        assert_eq!(df.top_terms(Some(2)), vec!["gamma", "alpha"]);
    }
}
