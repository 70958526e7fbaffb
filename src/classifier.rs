//! Theme prediction from free text.
//!
//! The classifier itself is an opaque capability: anything implementing
//! [`ThemeClassifier`] can be handed to the engine. [`LinearThemeModel`] is the
//! shipped implementation, a pre-trained logistic regression loaded read-only.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RecommendError, Result};
use crate::vectorizer::sparse::SparseVec;
use crate::vectorizer::TextVectorizer;

pub const THEME_VECTORIZER_FILE: &str = "theme_vectorizer.cbor";
pub const THEME_MODEL_FILE: &str = "theme_model.cbor";

/// One predicted label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeScore {
    pub theme: String,
    pub probability: f64,
}

/// Labels sorted by probability, highest first
pub type ThemePrediction = Vec<ThemeScore>;

/// Maps a feature vector in the classifier's own input space to labels.
pub trait ThemeClassifier: Send + Sync {
    /// All labels known to the classifier
    fn labels(&self) -> &[String];

    /// Every label with its probability, sorted descending
    fn predict(&self, features: &SparseVec<f32>) -> ThemePrediction;
}

/// Multinomial logistic regression.
/// `weights` is row-major `[labels x features]`. A model with two labels and a
/// single weight row is a binary model: the row scores the second label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearThemeModel {
    labels: Vec<String>,
    weights: Vec<Vec<f32>>,
    intercepts: Vec<f32>,
}

impl LinearThemeModel {
    pub fn new(labels: Vec<String>, weights: Vec<Vec<f32>>, intercepts: Vec<f32>) -> Result<Self> {
        let model = Self { labels, weights, intercepts };
        model
            .check_shape(None)
            .map_err(|reason| RecommendError::model(PathBuf::from("<memory>"), reason))?;
        Ok(model)
    }

    fn is_binary(&self) -> bool {
        self.labels.len() == 2 && self.weights.len() == 1
    }

    /// Rows must match labels, every row must have the same width,
    /// and that width must match `n_features` when given.
    fn check_shape(&self, n_features: Option<usize>) -> std::result::Result<(), String> {
        if self.labels.is_empty() {
            return Err("model has no labels".into());
        }
        let rows = if self.is_binary() { 1 } else { self.labels.len() };
        if self.weights.len() != rows || self.intercepts.len() != rows {
            return Err(format!(
                "expected {rows} weight rows and intercepts for {} labels, found {} and {}",
                self.labels.len(),
                self.weights.len(),
                self.intercepts.len()
            ));
        }
        let width = self.weights[0].len();
        if self.weights.iter().any(|row| row.len() != width) {
            return Err("weight rows have different widths".into());
        }
        if let Some(n) = n_features {
            if width != n {
                return Err(format!("model expects {width} features, vectorizer produces {n}"));
            }
        }
        Ok(())
    }

    fn decision(&self, row: usize, features: &SparseVec<f32>) -> f64 {
        let weights = &self.weights[row];
        let linear: f64 = features
            .iter()
            .filter_map(|(col, val)| weights.get(col as usize).map(|w| (*w as f64) * val as f64))
            .sum();
        linear + self.intercepts[row] as f64
    }

    /// Load a model from a CBOR artifact
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RecommendError::DataNotFound { path: path.to_path_buf() });
        }
        let reader = BufReader::new(File::open(path)?);
        let model: Self = serde_cbor::from_reader(reader).map_err(|e| RecommendError::model(path, e))?;
        model.check_shape(None).map_err(|reason| RecommendError::model(path, reason))?;
        Ok(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        serde_cbor::to_writer(writer, self).map_err(|e| RecommendError::model(path, e))
    }
}

impl ThemeClassifier for LinearThemeModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, features: &SparseVec<f32>) -> ThemePrediction {
        let probabilities: Vec<f64> = if self.is_binary() {
            let p = 1.0 / (1.0 + (-self.decision(0, features)).exp());
            vec![1.0 - p, p]
        } else {
            let scores: Vec<f64> = (0..self.labels.len()).map(|row| self.decision(row, features)).collect();
            // shift by max for a stable softmax
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
            let sum: f64 = exps.iter().sum();
            exps.into_iter().map(|e| e / sum).collect()
        };
        rank(&self.labels, probabilities)
    }
}

/// Pair labels with probabilities and sort descending.
/// Stable, so equal probabilities keep label order.
pub fn rank(labels: &[String], probabilities: Vec<f64>) -> ThemePrediction {
    let mut ranked: ThemePrediction = labels
        .iter()
        .cloned()
        .zip(probabilities)
        .map(|(theme, probability)| ThemeScore { theme, probability })
        .collect();
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    ranked
}

/// Theme vectorizer paired with its classifier.
/// Built once and shared read-only; tests swap in a stub classifier.
#[derive(Clone)]
pub struct ThemePredictor {
    vectorizer: Arc<TextVectorizer>,
    classifier: Arc<dyn ThemeClassifier>,
}

impl std::fmt::Debug for ThemePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemePredictor")
            .field("vocabulary_len", &self.vectorizer.vocabulary_len())
            .field("labels", &self.classifier.labels())
            .finish()
    }
}

impl ThemePredictor {
    pub fn new(vectorizer: TextVectorizer, classifier: Arc<dyn ThemeClassifier>) -> Self {
        Self {
            vectorizer: Arc::new(vectorizer),
            classifier,
        }
    }

    /// Load `theme_vectorizer.cbor` and `theme_model.cbor` from `model_dir`.
    /// Fails when either is missing, corrupt, or the two disagree on width.
    pub fn load(model_dir: impl AsRef<Path>) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        if !model_dir.is_dir() {
            return Err(RecommendError::DataNotFound { path: model_dir.to_path_buf() });
        }
        let vectorizer: TextVectorizer = TextVectorizer::load(model_dir.join(THEME_VECTORIZER_FILE))?;
        let model_path = model_dir.join(THEME_MODEL_FILE);
        let model = LinearThemeModel::load(&model_path)?;
        model
            .check_shape(Some(vectorizer.vocabulary_len()))
            .map_err(|reason| RecommendError::model(&model_path, reason))?;

        info!(
            labels = model.labels().len(),
            features = vectorizer.vocabulary_len(),
            "theme model loaded"
        );
        Ok(Self::new(vectorizer, Arc::new(model)))
    }

    /// Every label for `text`, sorted by probability
    pub fn predict(&self, text: &str) -> ThemePrediction {
        self.classifier.predict(&self.vectorizer.transform(text))
    }

    /// The `k` most probable labels for `text`
    pub fn top_k(&self, text: &str, k: usize) -> ThemePrediction {
        let mut ranked = self.predict(text);
        ranked.truncate(k);
        ranked
    }
}
