//! Data model shared by the extractor, scoring engine and orchestrator

use crate::config::ScoreWeights;
use crate::processing::document::DocumentRole;
use crate::processing::seniority::SenioritySignal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Section name to byte range in the document text
pub type SectionMap = BTreeMap<String, Range<usize>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    Exact,
    Pattern,
    Ner,
    Fuzzy,
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectionSource::Exact => "exact",
            DetectionSource::Pattern => "pattern",
            DetectionSource::Ner => "ner",
            DetectionSource::Fuzzy => "fuzzy",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Local match quality of the detection that produced this span
    pub quality: f32,
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMention {
    pub canonical_id: String,
    pub confidence: f32,
    /// Highest-confidence detector
    pub source: DetectionSource,
    /// Every detector that found the skill, in precedence order
    pub sources: Vec<DetectionSource>,
    /// Best evidence first, capped at `max_evidence`
    pub evidence: Vec<EvidenceSpan>,
    /// Every section any occurrence fell in, including ones whose evidence was dropped
    #[serde(default)]
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub semantic_similarity: f32,
    pub skill_coverage: f32,
    pub experience_alignment: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum SkillVerdict {
    Matched { confidence: f32 },
    Missing { importance: f32 },
    NiceToHave { importance: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSkill {
    pub canonical_id: String,
    pub display_name: String,
    pub confidence: f32,
    pub importance: f32,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGap {
    pub canonical_id: String,
    pub display_name: String,
    pub importance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub canonical_id: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snippets {
    pub resume: Vec<Snippet>,
    pub jd: Vec<Snippet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceAssessment {
    pub resume: SenioritySignal,
    pub job: SenioritySignal,
}

/// Non-fatal conditions that shaped a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    EmbeddingUnavailable { reason: String },
    EmptyEmbeddingInput { document: DocumentRole },
    NoSenioritySignal,
}

impl EngineWarning {
    /// Warnings that make the result degraded rather than merely low-confidence
    pub fn degrades_result(&self) -> bool {
        matches!(
            self,
            EngineWarning::EmbeddingUnavailable { .. } | EngineWarning::EmptyEmbeddingInput { .. }
        )
    }
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineWarning::EmbeddingUnavailable { reason } => {
                write!(f, "semantic similarity unavailable ({})", reason)
            }
            EngineWarning::EmptyEmbeddingInput { document } => {
                write!(f, "{} text produced no embedding", document)
            }
            EngineWarning::NoSenioritySignal => {
                write!(f, "no seniority requirement detected in the job description")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: u8,
    pub components: ScoreComponents,
    pub matched_skills: Vec<MatchedSkill>,
    pub missing_skills: Vec<SkillGap>,
    pub nice_to_have_skills: Vec<SkillGap>,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub recommendations: Vec<String>,
    pub snippets: Snippets,
    pub experience: ExperienceAssessment,
    pub weights: ScoreWeights,
    pub degraded: bool,
    pub warnings: Vec<EngineWarning>,
}
