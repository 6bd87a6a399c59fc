//! Skill extraction, embeddings and scoring

pub mod analyzer;
pub mod document;
pub mod embeddings;
pub mod ontology;
pub mod scoring;
pub mod seniority;
pub mod skill_extractor;
pub mod text_processor;
pub mod types;

pub use analyzer::AnalysisEngine;
pub use document::{DocumentRole, NormalizedDocument};
pub use ontology::SkillOntology;
pub use types::AnalysisResult;
