/// This crate recommends researchers for a new project proposal from a corpus
/// of historical grant records, using TF-IDF title similarity and a pre-trained
/// theme classifier.
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod profile;
pub mod similarity;
pub mod utils;
pub mod vectorizer;

/// Recommendation Engine
/// The top-level struct of this crate. Given a project title (and optionally a
/// theme), it ranks researchers by a four-part score:
/// - theme: projects in the resolved theme
/// - keyword: best title similarity, boosted for near-duplicates
/// - contribution: average share of credit in that theme
/// - recency: projects inside the lookback window
///
/// Internally, it holds:
/// - The grant corpus
/// - A researcher profile index
/// - A title similarity index
/// - A theme predictor (vectorizer + classifier)
///
/// Derived state is swapped atomically on `reload`/`append`, so requests in
/// flight never observe a half-built index.
pub use engine::RecommendationEngine;

/// Recommendation result and its entries
/// JSON-serialisable with camelCase keys.
pub use engine::result::{Recommendation, RecommendationResult, ThemeSource};

/// Score Breakdown
/// The four score components plus their sum, reported for every ranked
/// researcher so ranking decisions can be audited.
pub use engine::scoring::ScoreBreakdown;

/// Theme Classifier
/// `ThemeClassifier` is the opaque capability the engine consults;
/// `LinearThemeModel` is the shipped pre-trained implementation and
/// `ThemePredictor` pairs a classifier with its own fitted vectorizer.
pub use classifier::{LinearThemeModel, ThemeClassifier, ThemePrediction, ThemePredictor, ThemeScore};

/// Grant corpus
/// Immutable table of records, loaded from TSV by `corpus::loader::load_tsv`.
pub use corpus::{GrantCorpus, GrantRecord};

/// Researcher profiles derived from the corpus
pub use profile::{ProjectEntry, ResearcherProfile, ResearcherProfileIndex};

/// Title similarity and near-duplicate detection
pub use similarity::{DuplicateCheck, SimilarityIndex};

/// Text Vectorizer
/// Fits a capped vocabulary with IDF weights once and then maps text to
/// L2-normalised sparse vectors. Unknown tokens are ignored.
pub use vectorizer::{TextVectorizer, VectorizerParams};

pub use config::RecommenderConfig;
pub use error::{ErrorKind, ErrorPayload, RecommendError, Result};
