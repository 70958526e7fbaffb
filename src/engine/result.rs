use serde::Serialize;

use crate::classifier::ThemeScore;
use crate::engine::scoring::ScoreBreakdown;

/// How the resolved theme was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeSource {
    Explicit,
    Predicted,
}

/// One ranked researcher
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub researcher: String,
    /// equals `breakdown.total_score`
    pub score: f64,
    pub theme_projects: usize,
    pub total_projects: usize,
    pub breakdown: ScoreBreakdown,
    /// the researcher's titles in the resolved theme, for explanation only
    pub related_paper_titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub input_title: String,
    pub resolved_theme: String,
    pub theme_source: ThemeSource,
    /// top predictions when the theme was predicted, empty otherwise
    pub theme_candidates: Vec<ThemeScore>,
    pub recommendations: Vec<Recommendation>,
    /// researchers with a non-zero score, before truncation to top N
    pub total_candidates_scored: usize,
}

impl RecommendationResult {
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
