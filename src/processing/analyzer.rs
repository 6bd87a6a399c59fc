//! Main analysis engine: runs skill extraction, embeddings and scoring for a
//! resume/job pair. Holds only read-only state, so one engine can serve any
//! number of concurrent analyses behind an `Arc`.

use crate::config::{Config, ScoreWeights};
use crate::error::{EngineError, Result};
use crate::processing::document::{DocumentRole, NormalizedDocument};
use crate::processing::embeddings::{cosine_similarity, EmbeddingService};
use crate::processing::ontology::SkillOntology;
use crate::processing::scoring::{ScoringEngine, ScoringInput, SemanticSignal};
use crate::processing::skill_extractor::SkillExtractor;
use crate::processing::types::{AnalysisResult, EngineWarning, SkillMention};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    config: Config,
    ontology: Arc<SkillOntology>,
    extractor: SkillExtractor,
    embeddings: Option<EmbeddingService>,
    scoring: ScoringEngine,
}

impl AnalysisEngine {
    pub fn new(
        config: Config,
        ontology: Arc<SkillOntology>,
        embeddings: Option<EmbeddingService>,
    ) -> Result<Self> {
        config.validate()?;

        let extractor = SkillExtractor::new(Arc::clone(&ontology), config.extraction.clone());
        let scoring = ScoringEngine::new(Arc::clone(&ontology), config.scoring.clone());

        Ok(Self {
            config,
            ontology,
            extractor,
            embeddings,
            scoring,
        })
    }

    /// Load the ontology and embedding backend named by `config`.
    /// A missing ontology is fatal; a missing embedding model only degrades results.
    pub fn from_config(config: Config) -> Result<Self> {
        let ontology = match &config.ontology.path {
            Some(path) => SkillOntology::from_path(path)?,
            None => SkillOntology::builtin()?,
        };
        info!(
            "Skill ontology {} ready with {} skills",
            ontology.version(),
            ontology.len()
        );

        let embeddings = match EmbeddingService::from_config(&config.embedding) {
            Ok(Some(service)) => {
                info!("Embedding backend: {}", service.backend_name());
                Some(service)
            }
            Ok(None) => {
                info!("Embedding backend disabled, semantic similarity will be skipped");
                None
            }
            Err(e) => {
                warn!("Continuing without semantic similarity: {}", e);
                None
            }
        };

        Self::new(config, Arc::new(ontology), embeddings)
    }

    /// Score `resume` against `job`. Explicit `weights` win over a role preset,
    /// and `target_role` falls back to the one attached to either document.
    pub fn analyze(
        &self,
        resume: &NormalizedDocument,
        job: &NormalizedDocument,
        target_role: Option<&str>,
        weights: Option<ScoreWeights>,
    ) -> Result<AnalysisResult> {
        expect_role(resume, DocumentRole::Resume)?;
        expect_role(job, DocumentRole::Job)?;
        for document in [resume, job] {
            if document.is_blank() {
                return Err(EngineError::EmptyInput(format!(
                    "{} '{}' contains no text",
                    document.role(),
                    document.id()
                )));
            }
        }

        let target_role = target_role
            .or_else(|| job.target_role())
            .or_else(|| resume.target_role());
        let weights = self.config.resolve_weights(target_role, weights)?;

        let start_time = Instant::now();
        let resume_mentions = self.extractor.extract_document(resume);
        let job_mentions = self.extractor.extract_document(job);
        debug!(
            "Extracted {} resume skills and {} job skills",
            resume_mentions.len(),
            job_mentions.len()
        );

        let semantic = self.semantic_signal(resume, job);

        let result = self.scoring.score(ScoringInput {
            resume,
            job,
            resume_mentions: &resume_mentions,
            job_mentions: &job_mentions,
            semantic,
            target_role,
            weights,
        });

        info!(
            "Analyzed '{}' against '{}' in {:.2?}: score {}{}",
            resume.id(),
            job.id(),
            start_time.elapsed(),
            result.score,
            if result.degraded { " (degraded)" } else { "" }
        );
        Ok(result)
    }

    fn semantic_signal(&self, resume: &NormalizedDocument, job: &NormalizedDocument) -> SemanticSignal {
        let Some(service) = &self.embeddings else {
            return SemanticSignal::Unavailable(EngineWarning::EmbeddingUnavailable {
                reason: "no embedding backend loaded".to_string(),
            });
        };

        let embeddings = match service.embed_many(&[resume.text(), job.text()]) {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!("Embedding failed, scoring without semantic similarity: {}", e);
                return SemanticSignal::Unavailable(EngineWarning::EmbeddingUnavailable {
                    reason: e.to_string(),
                });
            }
        };

        let (Some(resume_vec), Some(job_vec)) = (embeddings.first(), embeddings.get(1)) else {
            return SemanticSignal::Unavailable(EngineWarning::EmbeddingUnavailable {
                reason: "embedder returned too few vectors".to_string(),
            });
        };
        if resume_vec.has_no_magnitude() {
            return SemanticSignal::Unavailable(EngineWarning::EmptyEmbeddingInput {
                document: DocumentRole::Resume,
            });
        }
        if job_vec.has_no_magnitude() {
            return SemanticSignal::Unavailable(EngineWarning::EmptyEmbeddingInput {
                document: DocumentRole::Job,
            });
        }

        match cosine_similarity(&resume_vec.vector, &job_vec.vector) {
            Ok(similarity) => SemanticSignal::Similarity(similarity),
            Err(e) => SemanticSignal::Unavailable(EngineWarning::EmbeddingUnavailable {
                reason: e.to_string(),
            }),
        }
    }

    pub fn extract_skills(&self, document: &NormalizedDocument) -> Vec<SkillMention> {
        self.extractor.extract_document(document)
    }

    pub fn ontology(&self) -> &SkillOntology {
        &self.ontology
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn embedding_backend(&self) -> Option<&str> {
        self.embeddings.as_ref().map(EmbeddingService::backend_name)
    }
}

fn expect_role(document: &NormalizedDocument, expected: DocumentRole) -> Result<()> {
    if document.role() == expected {
        Ok(())
    } else {
        Err(EngineError::InvalidInput(format!(
            "document '{}' is a {}, expected a {}",
            document.id(),
            document.role(),
            expected
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingBackend;

    fn hashing_engine() -> AnalysisEngine {
        let mut config = Config::default();
        config.embedding.backend = EmbeddingBackend::Hashing;
        AnalysisEngine::from_config(config).unwrap()
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_is_shareable() {
        assert_send_sync::<AnalysisEngine>();
    }

    #[test]
    fn test_role_mismatch_rejected() {
        let engine = hashing_engine();
        let a = NormalizedDocument::new("a", DocumentRole::Job, "Python");
        let b = NormalizedDocument::new("b", DocumentRole::Job, "Python");
        let err = engine.analyze(&a, &b, None, None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn test_blank_document_is_empty_input() {
        let engine = hashing_engine();
        let resume = NormalizedDocument::new("r", DocumentRole::Resume, "  \n ");
        let job = NormalizedDocument::new("j", DocumentRole::Job, "Python developer");
        let err = engine.analyze(&resume, &job, None, None).unwrap_err();
        assert_eq!(err.code(), "empty_input");
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let engine = hashing_engine();
        let resume = NormalizedDocument::new("r", DocumentRole::Resume, "Python");
        let job = NormalizedDocument::new("j", DocumentRole::Job, "Python");
        let result = engine.analyze(&resume, &job, None, Some(ScoreWeights::new(0.9, 0.9, 0.9)));
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_target_role_falls_back_to_job_document() {
        let engine = hashing_engine();
        let resume = NormalizedDocument::new("r", DocumentRole::Resume, "PyTorch and Python");
        let job = NormalizedDocument::new("j", DocumentRole::Job, "PyTorch, Python")
            .with_target_role("Machine Learning Engineer");

        let result = engine.analyze(&resume, &job, None, None).unwrap();
        assert_eq!(result.weights, ScoreWeights::new(0.40, 0.55, 0.05));

        let overridden = engine
            .analyze(&resume, &job, Some("Backend Engineer"), None)
            .unwrap();
        assert_eq!(overridden.weights, ScoreWeights::default());
    }

    #[test]
    fn test_disabled_embeddings_degrade_result() {
        let mut config = Config::default();
        config.embedding.backend = EmbeddingBackend::Disabled;
        let engine = AnalysisEngine::from_config(config).unwrap();
        assert!(engine.embedding_backend().is_none());

        let resume = NormalizedDocument::new("r", DocumentRole::Resume, "Python");
        let job = NormalizedDocument::new("j", DocumentRole::Job, "Python");
        let result = engine.analyze(&resume, &job, None, None).unwrap();
        assert!(result.degraded);
        assert_eq!(result.components.semantic_similarity, 0.0);
    }

    #[test]
    fn test_zero_magnitude_embedding_degrades_result() {
        let engine = hashing_engine();
        let resume = NormalizedDocument::new("r", DocumentRole::Resume, "to be or not to be");
        let job = NormalizedDocument::new("j", DocumentRole::Job, "Python developer with SQL");
        let result = engine.analyze(&resume, &job, None, None).unwrap();

        assert!(result.degraded);
        assert_eq!(result.components.semantic_similarity, 0.0);
        assert!(result.warnings.contains(&EngineWarning::EmptyEmbeddingInput {
            document: DocumentRole::Resume,
        }));
    }

    #[test]
    fn test_missing_ontology_file_is_fatal() {
        let mut config = Config::default();
        config.embedding.backend = EmbeddingBackend::Disabled;
        config.ontology.path = Some("/no/such/ontology.toml".into());
        let err = AnalysisEngine::from_config(config).unwrap_err();
        assert!(err.is_fatal());
    }
}
