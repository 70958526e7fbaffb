//! Recommender configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RecommendError, Result};
use crate::similarity::DUPLICATE_THRESHOLD;
use crate::vectorizer::VectorizerParams;

/// Top-level configuration aggregating all sections.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RecommenderConfig {
    pub data: DataConfig,
    pub scoring: ScoringConfig,
    pub similarity: SimilarityConfig,
}

/// Where the corpus and model artifacts live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub grants_file: PathBuf,
    pub model_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            grants_file: PathBuf::from("grants_final.tsv"),
            model_dir: PathBuf::from("model_artifacts"),
        }
    }
}

/// Weights of the four score components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// points per historical project in the resolved theme
    pub theme_weight: f64,
    // keyword tiers
    pub duplicate_multiplier: f64,
    pub close_multiplier: f64,
    pub base_multiplier: f64,
    /// similarity strictly above this earns the close multiplier
    pub close_threshold: f64,
    /// upper bound of the contribution component
    pub contribution_scale: f64,
    pub recency_points: f64,
    pub recency_window_years: i32,
    pub current_year: i32,
    /// predictions fetched when resolving the theme; only the first decides
    pub theme_candidates: usize,
    pub default_top_n: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            theme_weight: 10.0,
            duplicate_multiplier: 200.0,
            close_multiplier: 150.0,
            base_multiplier: 100.0,
            close_threshold: 0.7,
            contribution_scale: 20.0,
            recency_points: 5.0,
            recency_window_years: 3,
            current_year: 2026,
            theme_candidates: 2,
            default_top_n: 5,
        }
    }
}

/// Title vectorizer and near-duplicate settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimilarityConfig {
    pub max_features: usize,
    pub duplicate_threshold: f64,
    pub stop_words: bool,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            max_features: 500,
            duplicate_threshold: DUPLICATE_THRESHOLD,
            stop_words: true,
        }
    }
}

impl SimilarityConfig {
    pub fn vectorizer_params(&self) -> VectorizerParams {
        VectorizerParams {
            max_features: Some(self.max_features),
            stop_words: self.stop_words,
        }
    }
}

impl RecommenderConfig {
    /// Parse from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| RecommendError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(RecommendError::DataNotFound { path: path.to_path_buf() });
        }
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        let positive = [
            ("scoring.theme_weight", s.theme_weight),
            ("scoring.duplicate_multiplier", s.duplicate_multiplier),
            ("scoring.close_multiplier", s.close_multiplier),
            ("scoring.base_multiplier", s.base_multiplier),
            ("scoring.contribution_scale", s.contribution_scale),
            ("scoring.recency_points", s.recency_points),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            return Err(RecommendError::Config(format!("{name} must be positive, got {value}")));
        }
        let unit = [
            ("scoring.close_threshold", s.close_threshold),
            ("similarity.duplicate_threshold", self.similarity.duplicate_threshold),
        ];
        if let Some((name, value)) = unit.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            return Err(RecommendError::Config(format!("{name} must be within [0, 1], got {value}")));
        }
        if s.recency_window_years < 0 {
            return Err(RecommendError::Config("scoring.recency_window_years must not be negative".into()));
        }
        if s.theme_candidates == 0 {
            return Err(RecommendError::Config("scoring.theme_candidates must be at least 1".into()));
        }
        if self.similarity.max_features == 0 {
            return Err(RecommendError::Config("similarity.max_features must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = RecommenderConfig::from_toml("").unwrap();
        assert_eq!(config, RecommenderConfig::default());
        assert_eq!(config.scoring.duplicate_multiplier, 200.0);
        assert_eq!(config.similarity.max_features, 500);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = RecommenderConfig::from_toml(
            "[scoring]\ncurrent_year = 2030\n\n[data]\nmodel_dir = \"artifacts\"\n",
        )
        .unwrap();
        assert_eq!(config.scoring.current_year, 2030);
        assert_eq!(config.scoring.theme_weight, 10.0);
        assert_eq!(config.data.model_dir, PathBuf::from("artifacts"));
        assert_eq!(config.data.grants_file, PathBuf::from("grants_final.tsv"));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = RecommenderConfig::from_toml("[similarity]\nduplicate_threshold = 1.5\n").unwrap_err();
        assert!(matches!(err, RecommendError::Config(_)));
        assert!(RecommenderConfig::from_toml("[scoring]\nbase_multiplier = 0.0\n").is_err());
        assert!(RecommenderConfig::from_toml("[scoring]\ntheme_candidates = 0\n").is_err());
        assert!(RecommenderConfig::from_toml("[scoring\n").is_err());
    }
}
