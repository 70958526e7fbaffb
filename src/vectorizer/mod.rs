pub mod corpus;
pub mod sparse;
pub mod tfidf;
pub mod token;
pub mod tokenizer;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::marker::PhantomData;
use std::path::Path;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RecommendError, Result};
use crate::vectorizer::{
    corpus::DocumentFrequency,
    sparse::SparseVec,
    tfidf::{DefaultTFIDFEngine, TFIDFEngine},
    tokenizer::token_frequency,
};

/// Fitting parameters of a `TextVectorizer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerParams {
    /// keep only the most frequent terms, `None` keeps all
    pub max_features: Option<usize>,
    /// drop English stop words
    pub stop_words: bool,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            max_features: None,
            stop_words: true,
        }
    }
}

/// TextVectorizer
/// Maps free text to L2-normalised TF-IDF sparse vectors over a vocabulary
/// frozen at `fit` time.
///
/// Tokens outside the vocabulary contribute nothing; text made only of such
/// tokens becomes the zero vector.
///
/// Two instances never share a vocabulary: the theme classifier ships its own
/// fitted instance, the similarity index fits another over corpus titles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextVectorizer<E = DefaultTFIDFEngine>
where
    E: TFIDFEngine,
{
    params: VectorizerParams,
    /// token -> column, columns assigned in alphabetical token order
    #[serde(with = "indexmap::map::serde_seq")]
    vocabulary: IndexMap<String, u32>,
    /// IDF weight per column
    idf: Vec<f32>,
    /// documents seen while fitting
    doc_num: u64,
    #[serde(skip)]
    _marker: PhantomData<E>,
}

impl<E> TextVectorizer<E>
where
    E: TFIDFEngine,
{
    /// Fit a vocabulary and IDF weights over `documents`.
    pub fn fit<T>(documents: &[T], params: VectorizerParams) -> Self
    where
        T: AsRef<str>,
    {
        let mut df = DocumentFrequency::new();
        for doc in documents {
            df.add_doc(&token_frequency(doc.as_ref(), params.stop_words));
        }

        let mut terms = df.top_terms(params.max_features);
        terms.sort_unstable();

        let vocabulary: IndexMap<String, u32> = terms
            .iter()
            .enumerate()
            .map(|(col, term)| (term.to_string(), col as u32))
            .collect();
        let idf = terms
            .iter()
            .map(|term| E::idf(df.doc_num(), df.doc_freq(term)) as f32)
            .collect();

        debug!(
            docs = df.doc_num(),
            seen_terms = df.vocab_size(),
            kept_terms = vocabulary.len(),
            "fitted text vectorizer"
        );

        Self {
            params,
            vocabulary,
            idf,
            doc_num: df.doc_num(),
            _marker: PhantomData,
        }
    }

    /// Vectorize `text` with the frozen vocabulary.
    pub fn transform(&self, text: &str) -> SparseVec<f32> {
        let freq = token_frequency(text, self.params.stop_words);
        let token_sum = freq.token_sum();
        let pairs = freq.iter().filter_map(|(token, count)| {
            self.vocabulary.get(token).map(|&col| {
                let weight = E::tf(count, token_sum) * self.idf[col as usize] as f64;
                (col, weight as f32)
            })
        });
        let mut vec = SparseVec::from_pairs(self.vocabulary.len(), pairs);
        vec.l2_normalize();
        vec
    }

    /// Vectorize many texts in parallel, output order matches input order.
    pub fn transform_many<T>(&self, texts: &[T]) -> Vec<SparseVec<f32>>
    where
        T: AsRef<str> + Sync,
        E: Sync,
    {
        texts.par_iter().map(|t| self.transform(t.as_ref())).collect()
    }

    #[inline]
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    #[inline]
    pub fn contains_token(&self, token: &str) -> bool {
        self.vocabulary.contains_key(token)
    }

    /// Columns must be a permutation of `0..len` and IDF must line up.
    fn check_shape(&self) -> std::result::Result<(), String> {
        if self.idf.len() != self.vocabulary.len() {
            return Err(format!(
                "idf has {} entries but vocabulary has {}",
                self.idf.len(),
                self.vocabulary.len()
            ));
        }
        let mut seen = vec![false; self.vocabulary.len()];
        for (token, &col) in &self.vocabulary {
            match seen.get_mut(col as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(format!("token {token:?} has invalid column {col}")),
            }
        }
        Ok(())
    }

    /// Load a fitted vectorizer from a CBOR artifact.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RecommendError::DataNotFound { path: path.to_path_buf() });
        }
        let reader = BufReader::new(File::open(path)?);
        let vectorizer: Self =
            serde_cbor::from_reader(reader).map_err(|e| RecommendError::model(path, e))?;
        vectorizer
            .check_shape()
            .map_err(|reason| RecommendError::model(path, reason))?;
        Ok(vectorizer)
    }

    /// Write this vectorizer as a CBOR artifact.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        serde_cbor::to_writer(writer, self).map_err(|e| RecommendError::model(path, e))
    }
}
