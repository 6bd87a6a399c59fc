//! Error handling for the analysis engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Ontology load error: {0}")]
    OntologyLoad(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Resolved through the tie-break policy and logged, never returned from an analysis.
    #[error("Ambiguous skill match: {0}")]
    AmbiguousSkillMatch(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

impl EngineError {
    /// Stable machine-readable code reported alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Io(_) => "io",
            EngineError::EmptyInput(_) => "empty_input",
            EngineError::OntologyLoad(_) => "ontology_load",
            EngineError::EmbeddingUnavailable(_) => "embedding_unavailable",
            EngineError::AmbiguousSkillMatch(_) => "ambiguous_skill_match",
            EngineError::Configuration(_) => "configuration",
            EngineError::UnsupportedFormat(_) => "unsupported_format",
            EngineError::Serialization(_) => "serialization",
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::TaskFailed(_) => "task_failed",
            EngineError::OutputFormatting(_) => "output_formatting",
        }
    }

    /// Whether the process can keep serving analyses after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::OntologyLoad(_) | EngineError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Model2Vec reports failures through anyhow; keep the whole context chain
impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::EmbeddingUnavailable(format!("{:#}", err))
    }
}
