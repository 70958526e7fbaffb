use serde::Serialize;

use crate::config::ScoringConfig;
use crate::error::Result;
use crate::profile::ResearcherProfile;
use crate::similarity::SimilarityIndex;
use crate::vectorizer::sparse::SparseVec;

/// Per-researcher score, always reported with its components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub theme_matches: usize,
    pub theme_score: f64,
    pub keyword_score: f64,
    pub contribution_score: f64,
    pub recency_score: f64,
    /// theme + keyword + contribution + recency
    pub total_score: f64,
}

impl ScoreBreakdown {
    pub fn new(
        theme_matches: usize,
        theme_score: f64,
        keyword_score: f64,
        contribution_score: f64,
        recency_score: f64,
    ) -> Self {
        Self {
            theme_matches,
            theme_score,
            keyword_score,
            contribution_score,
            recency_score,
            total_score: theme_score + keyword_score + contribution_score + recency_score,
        }
    }
}

/// Best title match of one researcher against the query
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeywordMatch {
    /// max cosine over the researcher's titles, raised by any duplicate score
    pub max_similarity: f64,
    pub near_duplicate: bool,
}

/// Three-tier keyword score:
/// near-duplicate, then similarity above `close_threshold`, then the base rate.
pub fn keyword_score(m: KeywordMatch, cfg: &ScoringConfig) -> f64 {
    let multiplier = if m.near_duplicate {
        cfg.duplicate_multiplier
    } else if m.max_similarity > cfg.close_threshold {
        cfg.close_multiplier
    } else {
        cfg.base_multiplier
    };
    m.max_similarity * multiplier
}

pub fn theme_score(theme_matches: usize, cfg: &ScoringConfig) -> f64 {
    theme_matches as f64 * cfg.theme_weight
}

/// `avg_share` is a percentage; zero when the researcher has no project in the theme
pub fn contribution_score(avg_share: Option<f64>, cfg: &ScoringConfig) -> f64 {
    avg_share.map_or(0.0, |share| share / 100.0 * cfg.contribution_scale)
}

pub fn recency_score(recent_projects: usize, cfg: &ScoringConfig) -> f64 {
    recent_projects as f64 * cfg.recency_points
}

/// Query text with its vector in the title space
#[derive(Debug, Clone)]
pub struct Query<'a> {
    pub text: &'a str,
    pub vector: SparseVec<f32>,
}

impl<'a> Query<'a> {
    pub fn new(text: &'a str, index: &SimilarityIndex) -> Self {
        Self { text, vector: index.vectorize(text) }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Scan every title of `profile` for the best similarity and any near-duplicate.
pub fn keyword_match(
    profile: &ResearcherProfile,
    query: &Query<'_>,
    index: &SimilarityIndex,
    duplicate_threshold: f64,
) -> Result<KeywordMatch> {
    let mut best = KeywordMatch::default();
    if query.is_blank() {
        return Ok(best);
    }
    for title in &profile.titles {
        let sim = index.similarity_to_title(&query.vector, title)?;
        best.max_similarity = best.max_similarity.max(sim);

        let dup = SimilarityIndex::duplicate_verdict(query.text, title, sim, duplicate_threshold);
        if dup.is_duplicate {
            best.near_duplicate = true;
            best.max_similarity = best.max_similarity.max(dup.score);
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{GrantCorpus, GrantRecord};
    use crate::error::RecommendError;
    use crate::similarity::DUPLICATE_THRESHOLD;
    use crate::vectorizer::VectorizerParams;
    use proptest::prelude::*;

    fn cfg() -> ScoringConfig {
        ScoringConfig::default()
    }

    fn m(max_similarity: f64, near_duplicate: bool) -> KeywordMatch {
        KeywordMatch { max_similarity, near_duplicate }
    }

    #[test]
    fn tier_switches_at_close_threshold() {
        assert!((keyword_score(m(0.7, false), &cfg()) - 70.0).abs() < 1e-9);
        assert!((keyword_score(m(0.71, false), &cfg()) - 106.5).abs() < 1e-9);
        assert!((keyword_score(m(0.3, false), &cfg()) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_tier_at_threshold_and_exact() {
        assert!((keyword_score(m(0.85, true), &cfg()) - 170.0).abs() < 1e-9);
        assert_eq!(keyword_score(m(1.0, true), &cfg()), 200.0);
        // just below 1.0 in the close tier stays under the duplicate floor
        assert!(keyword_score(m(0.99, false), &cfg()) < 170.0 - 20.0);
    }

    #[test]
    fn component_helpers() {
        assert_eq!(theme_score(3, &cfg()), 30.0);
        assert_eq!(contribution_score(Some(50.0), &cfg()), 10.0);
        assert_eq!(contribution_score(None, &cfg()), 0.0);
        assert_eq!(recency_score(2, &cfg()), 10.0);
    }

    fn title_index() -> (SimilarityIndex, ResearcherProfile) {
        let titles = ["Quantum Error Correction", "Quantum Sensing Networks", "Survey of Teacher Education"];
        let corpus = GrantCorpus::new(
            titles
                .iter()
                .enumerate()
                .map(|(i, t)| GrantRecord::new(i.to_string(), *t, "T", None, vec!["A B".into()], 1).unwrap())
                .collect(),
        );
        let index = SimilarityIndex::build(&corpus, VectorizerParams { max_features: None, stop_words: true });
        let profile = ResearcherProfile {
            titles: titles[..2].iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        };
        (index, profile)
    }

    #[test]
    fn keyword_match_takes_best_title_and_flags_duplicates() {
        let (index, profile) = title_index();
        let query = Query::new("quantum error correction", &index);
        let got = keyword_match(&profile, &query, &index, DUPLICATE_THRESHOLD).unwrap();
        assert!(got.near_duplicate);
        assert_eq!(got.max_similarity, 1.0);

        let query = Query::new("quantum sensing", &index);
        let got = keyword_match(&profile, &query, &index, DUPLICATE_THRESHOLD).unwrap();
        assert!(!got.near_duplicate);
        assert!(got.max_similarity > 0.0 && got.max_similarity < DUPLICATE_THRESHOLD);
    }

    #[test]
    fn nan_query_component_is_a_similarity_error() {
        let (index, profile) = title_index();
        let query = Query { text: "unrelated words", vector: SparseVec::from_pairs(1, [(0u32, f32::NAN)]) };
        let got = keyword_match(&profile, &query, &index, DUPLICATE_THRESHOLD);
        assert!(matches!(got, Err(RecommendError::Similarity(_))), "{got:?}");
    }

    proptest! {
        #[test]
        fn total_is_sum_of_components(
            matches in 0usize..50,
            kw in 0.0f64..200.0,
            share in proptest::option::of(0.0f64..=100.0),
            recent in 0usize..20,
        ) {
            let c = cfg();
            let b = ScoreBreakdown::new(matches, theme_score(matches, &c), kw, contribution_score(share, &c), recency_score(recent, &c));
            prop_assert_eq!(b.total_score, b.theme_score + b.keyword_score + b.contribution_score + b.recency_score);
        }

        #[test]
        fn keyword_monotone_within_tier(a in 0.0f64..=1.0, b in 0.0f64..=1.0, dup in any::<bool>()) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let c = cfg();
            let same_tier = dup || (lo > c.close_threshold) == (hi > c.close_threshold);
            prop_assume!(same_tier);
            prop_assert!(keyword_score(m(lo, dup), &c) <= keyword_score(m(hi, dup), &c));
        }
    }
}
