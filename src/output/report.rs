//! Report structures wrapping an analysis result with generation metadata

use crate::processing::analyzer::AnalysisEngine;
use crate::processing::document::NormalizedDocument;
use crate::processing::types::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete report handed to the formatters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Report metadata and generation info
    pub metadata: ReportMetadata,

    /// One-line verdict derived from the score
    pub verdict: Verdict,

    pub result: AnalysisResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub engine_version: String,
    pub ontology_version: String,
    /// None when semantic similarity was not computed
    pub embedding_backend: Option<String>,
    pub resume_id: String,
    pub job_id: String,
    pub target_role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    StrongMatch,
    GoodMatch,
    PartialMatch,
    WeakMatch,
}

impl Verdict {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=100 => Verdict::StrongMatch,
            60..=79 => Verdict::GoodMatch,
            40..=59 => Verdict::PartialMatch,
            _ => Verdict::WeakMatch,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Verdict::StrongMatch => "Strong match: the resume covers the role's core requirements",
            Verdict::GoodMatch => "Good match with a few gaps worth addressing",
            Verdict::PartialMatch => "Partial match: several important requirements are not evidenced",
            Verdict::WeakMatch => "Weak match: the resume and role diverge substantially",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::StrongMatch => "Strong match",
            Verdict::GoodMatch => "Good match",
            Verdict::PartialMatch => "Partial match",
            Verdict::WeakMatch => "Weak match",
        };
        write!(f, "{}", label)
    }
}

impl AnalysisReport {
    pub fn new(
        result: AnalysisResult,
        engine: &AnalysisEngine,
        resume: &NormalizedDocument,
        job: &NormalizedDocument,
        target_role: Option<&str>,
    ) -> Self {
        let target_role = target_role
            .or_else(|| job.target_role())
            .or_else(|| resume.target_role())
            .map(str::to_string);

        let metadata = ReportMetadata {
            generated_at: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            ontology_version: engine.ontology().version().to_string(),
            embedding_backend: engine.embedding_backend().map(str::to_string),
            resume_id: resume.id().to_string(),
            job_id: job.id().to_string(),
            target_role,
        };

        Self {
            verdict: Verdict::from_score(result.score),
            metadata,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_bands() {
        assert_eq!(Verdict::from_score(100), Verdict::StrongMatch);
        assert_eq!(Verdict::from_score(80), Verdict::StrongMatch);
        assert_eq!(Verdict::from_score(79), Verdict::GoodMatch);
        assert_eq!(Verdict::from_score(45), Verdict::PartialMatch);
        assert_eq!(Verdict::from_score(0), Verdict::WeakMatch);
        assert_eq!(Verdict::GoodMatch.to_string(), "Good match");
    }
}
