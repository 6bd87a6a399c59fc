//! End-to-end tests for the analysis engine, using the hashing embedder so no
//! model download is needed

use resume_fit::config::{Config, EmbeddingBackend, ScoreWeights};
use resume_fit::processing::document::{DocumentRole, NormalizedDocument};
use resume_fit::processing::embeddings::{EmbeddingService, HashingEmbedder};
use resume_fit::processing::ontology::SkillOntology;
use resume_fit::processing::AnalysisEngine;
use resume_fit::EngineError;
use std::collections::HashSet;
use std::sync::Arc;

const SMALL_ONTOLOGY: &str = r#"
version = "test"

[[skills]]
canonical_id = "python"
display_name = "Python"
category = "programming_language"
default_weight = 0.6

[[skills]]
canonical_id = "sql"
display_name = "SQL"
category = "database"
default_weight = 0.4
"#;

fn hashing_config() -> Config {
    let mut config = Config::default();
    config.embedding.backend = EmbeddingBackend::Hashing;
    config
}

fn small_engine() -> AnalysisEngine {
    let config = hashing_config();
    let ontology = SkillOntology::from_toml_str(SMALL_ONTOLOGY).unwrap();
    let embeddings = EmbeddingService::new(Arc::new(HashingEmbedder::new(256)), &config.embedding);
    AnalysisEngine::new(config, Arc::new(ontology), Some(embeddings)).unwrap()
}

fn builtin_engine() -> AnalysisEngine {
    AnalysisEngine::from_config(hashing_config()).unwrap()
}

fn resume(text: &str) -> NormalizedDocument {
    NormalizedDocument::from_raw_text("resume", DocumentRole::Resume, text)
}

fn job(text: &str) -> NormalizedDocument {
    NormalizedDocument::from_raw_text("job", DocumentRole::Job, text)
}

#[test]
fn test_coverage_weighted_by_skill_importance() {
    let engine = small_engine();
    let result = engine
        .analyze(
            &resume("5 years of Python development"),
            &job("Requirements: Python and SQL."),
            None,
            None,
        )
        .unwrap();

    assert!((result.components.skill_coverage - 0.6).abs() < 1e-3);
    assert_eq!(result.matched_skills.len(), 1);
    assert_eq!(result.matched_skills[0].canonical_id, "python");

    assert_eq!(result.missing_skills.len(), 1);
    assert_eq!(result.missing_skills[0].display_name, "SQL");
    assert!((result.missing_skills[0].importance - 0.4).abs() < 1e-3);
    assert!(result.recommendations.iter().any(|r| r.contains("SQL")));
    assert!(!result.degraded);
}

#[test]
fn test_identical_documents_are_semantically_equal() {
    let engine = small_engine();
    let text = "Backend developer working with Python and SQL on data pipelines.";
    let result = engine.analyze(&resume(text), &job(text), None, None).unwrap();

    assert!((result.components.semantic_similarity - 1.0).abs() < 1e-4);
    assert!((result.components.skill_coverage - 1.0).abs() < 1e-6);
    assert!(result.missing_skills.is_empty());
}

#[test]
fn test_job_without_skills_has_full_coverage() {
    let engine = small_engine();
    let result = engine
        .analyze(
            &resume("Python developer"),
            &job("We value kindness and punctuality."),
            None,
            None,
        )
        .unwrap();

    assert_eq!(result.components.skill_coverage, 1.0);
    assert!(result.missing_skills.is_empty());
    assert!(result.nice_to_have_skills.is_empty());
    assert!(result.matched_skills.is_empty());
}

#[test]
fn test_sample_documents_partition_and_bounds() {
    let engine = builtin_engine();
    let resume_doc = resume(include_str!("fixtures/sample_resume.txt"));
    let job_doc = job(include_str!("fixtures/sample_job.txt"));

    let result = engine.analyze(&resume_doc, &job_doc, None, None).unwrap();
    assert!(result.score <= 100);
    for value in [
        result.components.semantic_similarity,
        result.components.skill_coverage,
        result.components.experience_alignment,
    ] {
        assert!((0.0..=1.0).contains(&value));
    }

    let matched: HashSet<&str> = result.matched_skills.iter().map(|s| s.canonical_id.as_str()).collect();
    let missing: HashSet<&str> = result.missing_skills.iter().map(|s| s.canonical_id.as_str()).collect();
    let nice: HashSet<&str> = result.nice_to_have_skills.iter().map(|s| s.canonical_id.as_str()).collect();
    assert!(matched.is_disjoint(&missing));
    assert!(matched.is_disjoint(&nice));
    assert!(missing.is_disjoint(&nice));

    assert!(matched.contains("python"));
    assert!(matched.contains("docker"));
    assert!(missing.contains("kubernetes"));
    assert!(nice.contains("terraform"));

    for pair in result.missing_skills.windows(2) {
        assert!(pair[0].importance >= pair[1].importance);
    }
}

#[test]
fn test_skill_listed_as_preferred_and_required_counts_as_required() {
    let engine = builtin_engine();
    let job_doc = job(
        "Backend Engineer\nNice to have\nKafka streaming. Kafka Connect. Kafka tuning.\nRequirements\nPython and Kafka\n",
    );
    let result = engine
        .analyze(&resume("Python developer, 6 years"), &job_doc, None, None)
        .unwrap();

    assert!(result.missing_skills.iter().any(|s| s.canonical_id == "kafka"));
    assert!(result.nice_to_have_skills.iter().all(|s| s.canonical_id != "kafka"));
    assert!(result.matched_skills.iter().any(|s| s.canonical_id == "python"));
    assert!(result.components.skill_coverage < 1.0);
}

#[test]
fn test_stop_word_resume_has_no_semantic_signal() {
    let engine = small_engine();
    let result = engine
        .analyze(&resume("to be or not to be"), &job("Python developer with SQL"), None, None)
        .unwrap();

    assert!(result.degraded);
    assert_eq!(result.components.semantic_similarity, 0.0);
}

#[test]
fn test_analysis_is_deterministic() {
    let engine = builtin_engine();
    let resume_doc = resume(include_str!("fixtures/sample_resume.txt"));
    let job_doc = job(include_str!("fixtures/sample_job.txt"));

    let first = engine.analyze(&resume_doc, &job_doc, None, None).unwrap();
    let second = engine.analyze(&resume_doc, &job_doc, None, None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_explicit_weights_override_presets() {
    let engine = small_engine();
    let weights = ScoreWeights::new(0.0, 1.0, 0.0);
    let result = engine
        .analyze(
            &resume("5 years of Python development"),
            &job("Requirements: Python and SQL."),
            Some("Machine Learning Engineer"),
            Some(weights),
        )
        .unwrap();

    assert_eq!(result.weights, weights);
    assert_eq!(result.score, 60);
}

#[test]
fn test_disabled_embeddings_degrade_instead_of_failing() {
    let mut config = Config::default();
    config.embedding.backend = EmbeddingBackend::Disabled;
    let engine = AnalysisEngine::from_config(config).unwrap();

    let result = engine
        .analyze(&resume("Python and Docker"), &job("Python, Docker"), None, None)
        .unwrap();
    assert!(result.degraded);
    assert_eq!(result.components.semantic_similarity, 0.0);
    assert!(result.risks.iter().any(|r| r.starts_with("Degraded result")));
}

#[test]
fn test_blank_resume_is_rejected() {
    let engine = small_engine();
    let err = engine
        .analyze(&resume("   \n\t"), &job("Python"), None, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptyInput(_)));
    assert!(!err.is_fatal());
}

#[test]
fn test_shared_engine_across_threads() {
    let engine = Arc::new(builtin_engine());
    let resume_doc = Arc::new(resume(include_str!("fixtures/sample_resume.txt")));
    let job_doc = Arc::new(job(include_str!("fixtures/sample_job.txt")));
    let expected = engine.analyze(&resume_doc, &job_doc, None, None).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let resume_doc = Arc::clone(&resume_doc);
            let job_doc = Arc::clone(&job_doc);
            std::thread::spawn(move || engine.analyze(&resume_doc, &job_doc, None, None).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
