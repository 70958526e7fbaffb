//! End-to-end recommendation over on-disk corpora and model artifacts.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use grant_recommender::classifier::{THEME_MODEL_FILE, THEME_VECTORIZER_FILE};
use grant_recommender::{
    ErrorKind, GrantCorpus, GrantRecord, LinearThemeModel, RecommendError, RecommendationEngine,
    RecommenderConfig, TextVectorizer, ThemeSource, VectorizerParams,
};

const GRANTS: &str = "Code\tTime\tTheme\tTitle\tAuthors\n\
\"P-1\"\t2024\t\"Quantum\"\t'Quantum Error Correction'\t\"Alice Smith, Bob Lee\"\n\
\"P-2\"\t2015\t\"Education\"\t'Unrelated Survey'\t\"Carol White\"\n";

/// Theme model that maps "quantum" to Quantum and "survey" to Education.
fn write_artifacts(dir: &Path) {
    let vectorizer: TextVectorizer = TextVectorizer::fit(&["quantum", "survey"], VectorizerParams::default());
    vectorizer.save(dir.join(THEME_VECTORIZER_FILE)).unwrap();
    // columns: quantum(0) survey(1)
    LinearThemeModel::new(
        vec!["Education".into(), "Quantum".into()],
        vec![vec![0.0, 4.0], vec![4.0, 0.0]],
        vec![0.0, 0.0],
    )
    .unwrap()
    .save(dir.join(THEME_MODEL_FILE))
    .unwrap();
}

fn setup(grants: &str) -> (tempfile::TempDir, RecommenderConfig) {
    let dir = tempfile::tempdir().unwrap();
    let grants_path = dir.path().join("grants_final.tsv");
    std::fs::File::create(&grants_path)
        .unwrap()
        .write_all(grants.as_bytes())
        .unwrap();
    let model_dir = dir.path().join("model_artifacts");
    std::fs::create_dir(&model_dir).unwrap();
    write_artifacts(&model_dir);

    let mut config = RecommenderConfig::default();
    config.data.grants_file = grants_path;
    config.data.model_dir = model_dir;
    (dir, config)
}

#[test]
fn two_row_corpus_ranks_coauthors_at_duplicate_tier() {
    let (_dir, config) = setup(GRANTS);
    let engine = RecommendationEngine::from_config(config).unwrap();

    let result = engine.recommend("Quantum Error Correction", None, 2);
    assert_eq!(result.resolved_theme, "Quantum");
    assert_eq!(result.theme_source, ThemeSource::Predicted);
    assert_eq!(result.total_candidates_scored, 2);

    let names: Vec<&str> = result.recommendations.iter().map(|r| r.researcher.as_str()).collect();
    assert_eq!(names, vec!["Alice Smith", "Bob Lee"]);
    for rec in &result.recommendations {
        assert_eq!(rec.breakdown.keyword_score, 200.0);
        assert_eq!(rec.breakdown.theme_score, 10.0);
        assert!(rec.score >= 180.0);
        assert_eq!(rec.score, rec.breakdown.total_score);
        assert_eq!(rec.related_paper_titles, vec!["Quantum Error Correction"]);
        assert_eq!(rec.theme_projects, 1);
        assert_eq!(rec.total_projects, 1);
    }
    assert_eq!(result.recommendations[0].score, result.recommendations[1].score);
}

#[test]
fn explicit_theme_overrides_prediction() {
    let (_dir, config) = setup(GRANTS);
    let engine = RecommendationEngine::from_config(config).unwrap();

    let result = engine.recommend("Quantum Error Correction", Some("Education"), 5);
    assert_eq!(result.resolved_theme, "Education");
    assert_eq!(result.theme_source, ThemeSource::Explicit);
    assert!(result.theme_candidates.is_empty());
    // Carol now earns theme and contribution points
    let carol = result
        .recommendations
        .iter()
        .find(|r| r.researcher == "Carol White")
        .unwrap();
    assert_eq!(carol.breakdown.theme_score, 10.0);
    assert_eq!(carol.breakdown.contribution_score, 20.0);
}

#[test]
fn every_breakdown_sums_exactly() {
    let (_dir, config) = setup(GRANTS);
    let engine = RecommendationEngine::from_config(config).unwrap();
    for title in ["Quantum Error", "survey of quantum", "", "nothing matches here"] {
        let result = engine.recommend(title, None, 10);
        for rec in &result.recommendations {
            let b = rec.breakdown;
            assert_eq!(b.total_score, b.theme_score + b.keyword_score + b.contribution_score + b.recency_score);
            assert!(b.total_score > 0.0);
        }
    }
}

#[test]
fn result_serialises_to_camel_case_json() {
    let (_dir, config) = setup(GRANTS);
    let engine = RecommendationEngine::from_config(config).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&engine.recommend("Quantum Error Correction", None, 1).to_json(false).unwrap()).unwrap();
    assert_eq!(json["resolvedTheme"], "Quantum");
    assert_eq!(json["themeSource"], "predicted");
    assert_eq!(json["totalCandidatesScored"], 2);
    assert_eq!(json["recommendations"][0]["breakdown"]["keywordScore"], 200.0);
    assert!(json["recommendations"][0]["relatedPaperTitles"].is_array());
}

#[test]
fn missing_artifacts_fail_construction() {
    let (dir, mut config) = setup(GRANTS);
    config.data.model_dir = dir.path().join("no_such_dir");
    let err = RecommendationEngine::from_config(config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataNotFound);

    let (dir, config) = setup(GRANTS);
    std::fs::write(dir.path().join("model_artifacts").join(THEME_MODEL_FILE), b"\xff\x00garbage").unwrap();
    let err = RecommendationEngine::from_config(config).unwrap_err();
    assert!(matches!(err, RecommendError::ModelUnavailable { .. }));
}

#[test]
fn missing_grants_file_fails_construction() {
    let (dir, mut config) = setup(GRANTS);
    config.data.grants_file = dir.path().join("missing.tsv");
    let err = RecommendationEngine::from_config(config).unwrap_err();
    assert_eq!(err.payload().kind, ErrorKind::DataNotFound);
}

#[test]
fn reload_from_disk_picks_up_appended_rows() {
    let (dir, config) = setup(GRANTS);
    let grants_path = config.data.grants_file.clone();
    let engine = RecommendationEngine::from_config(config).unwrap();
    assert!(engine.snapshot().profiles.get("Dana Park").is_none());

    let mut file = std::fs::OpenOptions::new().append(true).open(&grants_path).unwrap();
    writeln!(file, "\"P-3\"\t2025\t\"Quantum\"\t'Topological Qubits'\t\"Dana Park\"").unwrap();
    drop(file);

    engine.reload_from(&grants_path).unwrap();
    let dana = engine.snapshot();
    let profile = dana.profiles.get("Dana Park").unwrap();
    assert_eq!(profile.theme_matches("Quantum"), 1);

    let result = engine.recommend("Topological Qubits", Some("Quantum"), 5);
    assert_eq!(result.recommendations[0].researcher, "Dana Park");
    drop(dir);
}

#[test]
fn concurrent_requests_see_whole_snapshots() {
    let (_dir, config) = setup(GRANTS);
    let engine = Arc::new(RecommendationEngine::from_config(config).unwrap());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let state = engine.snapshot();
                    // profiles and title vectors always derive from the corpus in the same snapshot
                    let records = state.corpus.records();
                    for record in records {
                        assert!(state.similarity.title_vector(&record.title).is_some(), "{}", record.title);
                    }
                    let researchers: HashSet<&str> =
                        records.iter().flat_map(|r| r.researchers.iter().map(String::as_str)).collect();
                    assert_eq!(state.profiles.len(), researchers.len());
                    for name in &researchers {
                        assert!(state.profiles.get(name).is_some(), "{name}");
                    }
                    let _ = engine.recommend("Quantum Error Correction", Some("Quantum"), 3);
                }
            })
        })
        .collect();

    for i in 0..10 {
        let record = GrantRecord::new(
            format!("N-{i}"),
            format!("Appended Study {i}"),
            "Quantum",
            Some(2025),
            vec![format!("New Person{i}")],
            0,
        )
        .unwrap();
        engine.append(record);
    }
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(engine.snapshot().corpus.len(), 12);

    engine.reload(GrantCorpus::default());
    let result = engine.recommend("Quantum Error Correction", None, 5);
    assert_eq!(result.total_candidates_scored, 0);
}
