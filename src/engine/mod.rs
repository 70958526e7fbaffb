pub mod result;
pub mod scoring;

use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::classifier::{ThemePrediction, ThemePredictor};
use crate::config::{RecommenderConfig, ScoringConfig};
use crate::corpus::{loader, GrantCorpus, GrantRecord};
use crate::engine::result::{Recommendation, RecommendationResult, ThemeSource};
use crate::engine::scoring::{
    contribution_score, keyword_match, keyword_score, recency_score, theme_score, KeywordMatch, Query,
    ScoreBreakdown,
};
use crate::error::Result;
use crate::profile::{ResearcherProfile, ResearcherProfileIndex};
use crate::similarity::SimilarityIndex;

/// Theme used when the classifier returns no labels at all
pub const UNKNOWN_THEME: &str = "Unknown";

/// Everything derived from one corpus version.
/// Built as a unit and swapped as a unit.
#[derive(Debug)]
pub struct EngineState {
    pub corpus: Arc<GrantCorpus>,
    pub profiles: ResearcherProfileIndex,
    pub similarity: SimilarityIndex,
}

impl EngineState {
    pub fn build(corpus: Arc<GrantCorpus>, config: &RecommenderConfig) -> Self {
        let (profiles, similarity) = rayon::join(
            || ResearcherProfileIndex::build(&corpus),
            || SimilarityIndex::build(&corpus, config.similarity.vectorizer_params()),
        );
        info!(
            records = corpus.len(),
            researchers = profiles.len(),
            "engine state built"
        );
        Self { corpus, profiles, similarity }
    }
}

/// Ranks researchers for a new project title.
///
/// Requests read an `Arc` snapshot of [`EngineState`] taken once at the start,
/// so a concurrent [`reload`](Self::reload) is either fully visible or not at all.
pub struct RecommendationEngine {
    config: RecommenderConfig,
    predictor: ThemePredictor,
    state: RwLock<Arc<EngineState>>,
    /// serialises read-modify-write updates such as `append`
    writer: Mutex<()>,
}

impl std::fmt::Debug for RecommendationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("config", &self.config)
            .field("predictor", &self.predictor)
            .field("records", &self.snapshot().corpus.len())
            .finish()
    }
}

impl RecommendationEngine {
    pub fn new(config: RecommenderConfig, predictor: ThemePredictor, corpus: GrantCorpus) -> Result<Self> {
        config.validate()?;
        let state = EngineState::build(Arc::new(corpus), &config);
        Ok(Self {
            config,
            predictor,
            state: RwLock::new(Arc::new(state)),
            writer: Mutex::new(()),
        })
    }

    /// Load model artifacts and the grants table named by `config.data`.
    /// Fails before building anything if either is missing or corrupt.
    pub fn from_config(config: RecommenderConfig) -> Result<Self> {
        config.validate()?;
        let predictor = ThemePredictor::load(&config.data.model_dir)?;
        let corpus = loader::load_tsv(&config.data.grants_file)?;
        Self::new(config, predictor, corpus)
    }

    #[inline]
    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Current state; stays valid even if a reload happens meanwhile
    pub fn snapshot(&self) -> Arc<EngineState> {
        self.state.read().clone()
    }

    /// Replace the corpus, rebuilding profiles and similarity off-lock.
    pub fn reload(&self, corpus: GrantCorpus) {
        let _guard = self.writer.lock();
        self.swap_in(corpus);
    }

    /// Re-read a TSV file and reload from it
    pub fn reload_from(&self, path: impl AsRef<Path>) -> Result<()> {
        let corpus = loader::load_tsv(path)?;
        self.reload(corpus);
        Ok(())
    }

    /// Append one record in memory and rebuild
    pub fn append(&self, record: GrantRecord) {
        let _guard = self.writer.lock();
        let grown = self.snapshot().corpus.with_appended(record);
        self.swap_in(grown);
    }

    fn swap_in(&self, corpus: GrantCorpus) {
        let state = Arc::new(EngineState::build(Arc::new(corpus), &self.config));
        *self.state.write() = state;
    }

    /// Classifier's top `k` themes for `text`
    pub fn predict_themes(&self, text: &str, k: usize) -> ThemePrediction {
        self.predictor.top_k(text, k)
    }

    /// Rank researchers for `title`.
    ///
    /// `explicit_theme` is used verbatim when given; otherwise the most
    /// probable predicted theme is used. Researchers scoring exactly zero are
    /// dropped. Equal scores keep first-seen corpus order.
    pub fn recommend(&self, title: &str, explicit_theme: Option<&str>, top_n: usize) -> RecommendationResult {
        let state = self.snapshot();
        let scoring = &self.config.scoring;

        let (resolved_theme, theme_source, theme_candidates) = match explicit_theme {
            Some(theme) => (theme.to_string(), ThemeSource::Explicit, Vec::new()),
            None => {
                let candidates = self.predictor.top_k(title, scoring.theme_candidates);
                let best = candidates
                    .first()
                    .map_or_else(|| UNKNOWN_THEME.to_string(), |s| s.theme.clone());
                (best, ThemeSource::Predicted, candidates)
            }
        };
        debug!(theme = %resolved_theme, source = ?theme_source, "theme resolved");

        let query = Query::new(title, &state.similarity);
        let profiles: Vec<(&str, &ResearcherProfile)> =
            state.profiles.iter().filter(|(_, p)| !p.is_empty()).collect();

        let mut scored: Vec<(&str, &ResearcherProfile, ScoreBreakdown)> = profiles
            .par_iter()
            .map(|&(name, profile)| (name, profile, self.score(name, profile, &resolved_theme, &query, &state)))
            .filter(|(_, _, breakdown)| breakdown.total_score != 0.0)
            .collect();
        scored.sort_by(|a, b| b.2.total_score.total_cmp(&a.2.total_score));

        let total_candidates_scored = scored.len();
        debug!(candidates = profiles.len(), scored = total_candidates_scored, "researchers scored");

        let recommendations = scored
            .into_iter()
            .take(top_n)
            .map(|(name, profile, breakdown)| Recommendation {
                researcher: name.to_string(),
                score: breakdown.total_score,
                theme_projects: breakdown.theme_matches,
                total_projects: profile.projects.len(),
                breakdown,
                related_paper_titles: related_titles(&state.corpus, name, &resolved_theme),
            })
            .collect();

        RecommendationResult {
            input_title: title.to_string(),
            resolved_theme,
            theme_source,
            theme_candidates,
            recommendations,
            total_candidates_scored,
        }
    }

    fn score(
        &self,
        name: &str,
        profile: &ResearcherProfile,
        theme: &str,
        query: &Query<'_>,
        state: &EngineState,
    ) -> ScoreBreakdown {
        let cfg = &self.config.scoring;
        let matches = profile.theme_matches(theme);

        let matched = keyword_match(profile, query, &state.similarity, self.config.similarity.duplicate_threshold);
        let keyword = keyword_component(name, matched, cfg);

        let since = cfg.current_year - cfg.recency_window_years;
        ScoreBreakdown::new(
            matches,
            theme_score(matches, cfg),
            keyword,
            contribution_score(profile.average_share_in(theme), cfg),
            recency_score(profile.projects_since(since), cfg),
        )
    }
}

/// A failed similarity scores 0 for that researcher only; the request goes on.
fn keyword_component(researcher: &str, matched: Result<KeywordMatch>, cfg: &ScoringConfig) -> f64 {
    match matched {
        Ok(m) => keyword_score(m, cfg),
        Err(err) => {
            warn!(researcher, %err, "keyword similarity failed, scoring 0");
            0.0
        }
    }
}

/// Titles of records listing `researcher` whose theme is `theme`, in corpus order
fn related_titles(corpus: &GrantCorpus, researcher: &str, theme: &str) -> Vec<String> {
    corpus
        .records()
        .iter()
        .filter(|r| r.theme == theme && r.has_researcher(researcher))
        .map(|r| r.title.clone())
        .collect()
}
