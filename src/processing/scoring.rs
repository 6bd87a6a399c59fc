//! Scoring engine: turns extracted mentions and a semantic signal into the
//! final explainable result.

use crate::config::{ScoreWeights, ScoringConfig};
use crate::processing::document::NormalizedDocument;
use crate::processing::ontology::SkillOntology;
use crate::processing::seniority::{SeniorityDetector, SenioritySignal, SeniorityTier};
use crate::processing::types::{
    AnalysisResult, EngineWarning, EvidenceSpan, ExperienceAssessment, MatchedSkill,
    ScoreComponents, SkillGap, SkillMention, SkillVerdict, Snippet, Snippets,
};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub enum SemanticSignal {
    /// Raw cosine similarity in [-1, 1]
    Similarity(f32),
    Unavailable(EngineWarning),
}

pub struct ScoringInput<'a> {
    pub resume: &'a NormalizedDocument,
    pub job: &'a NormalizedDocument,
    pub resume_mentions: &'a [SkillMention],
    pub job_mentions: &'a [SkillMention],
    pub semantic: SemanticSignal,
    pub target_role: Option<&'a str>,
    pub weights: ScoreWeights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Required,
    Preferred,
}

/// A job-side skill with its importance and verdict against the resume
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSkill {
    pub canonical_id: String,
    pub display_name: String,
    pub importance: f32,
    pub placement: Placement,
    pub verdict: SkillVerdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Component {
    Coverage,
    Semantic,
    Experience,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum RiskCause {
    MissingSkill(String),
    Weak(Component),
    Degraded,
    NoSeniority,
}

#[derive(Debug, Clone)]
struct Risk {
    severity: f32,
    cause: RiskCause,
    message: String,
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    ontology: Arc<SkillOntology>,
    config: ScoringConfig,
    seniority: SeniorityDetector,
}

impl ScoringEngine {
    pub fn new(ontology: Arc<SkillOntology>, config: ScoringConfig) -> Self {
        let seniority = SeniorityDetector::new(config.seniority_year_thresholds);
        Self {
            ontology,
            config,
            seniority,
        }
    }

    pub fn score(&self, input: ScoringInput<'_>) -> AnalysisResult {
        let mut warnings = Vec::new();

        let (semantic, degraded) = match input.semantic {
            SemanticSignal::Similarity(similarity) => (rescale_similarity(similarity), false),
            SemanticSignal::Unavailable(warning) => {
                let degraded = warning.degrades_result();
                warnings.push(warning);
                (0.0, degraded)
            }
        };

        let classified = self.classify(input.job_mentions, input.resume_mentions);
        let coverage = skill_coverage(&classified, self.config.nice_to_have_bonus);

        let experience = self.assess_experience(input.resume, input.job, input.target_role);
        let experience_alignment = match experience.job.tier {
            Some(required) => self.experience_alignment(experience.resume.tier, required),
            None => {
                warnings.push(EngineWarning::NoSenioritySignal);
                1.0
            }
        };

        let components = ScoreComponents {
            semantic_similarity: semantic,
            skill_coverage: coverage,
            experience_alignment,
        };
        let score = overall_score(&components, &input.weights);

        debug!(
            "Scored {} vs {}: {} (semantic {:.3}, coverage {:.3}, experience {:.3})",
            input.resume.id(),
            input.job.id(),
            score,
            semantic,
            coverage,
            experience_alignment
        );

        let resume_by_id: HashMap<&str, &SkillMention> = input
            .resume_mentions
            .iter()
            .map(|m| (m.canonical_id.as_str(), m))
            .collect();
        let job_by_id: HashMap<&str, &SkillMention> = input
            .job_mentions
            .iter()
            .map(|m| (m.canonical_id.as_str(), m))
            .collect();

        let mut matched_skills = Vec::new();
        let mut missing_skills = Vec::new();
        let mut nice_to_have_skills = Vec::new();
        for skill in &classified {
            match skill.verdict {
                SkillVerdict::Matched { confidence } => matched_skills.push(MatchedSkill {
                    canonical_id: skill.canonical_id.clone(),
                    display_name: skill.display_name.clone(),
                    confidence,
                    importance: skill.importance,
                    evidence: resume_by_id
                        .get(skill.canonical_id.as_str())
                        .map(|m| m.evidence.iter().map(|e| e.text.clone()).collect())
                        .unwrap_or_default(),
                }),
                SkillVerdict::Missing { importance } => missing_skills.push(SkillGap {
                    canonical_id: skill.canonical_id.clone(),
                    display_name: skill.display_name.clone(),
                    importance,
                }),
                SkillVerdict::NiceToHave { importance } => nice_to_have_skills.push(SkillGap {
                    canonical_id: skill.canonical_id.clone(),
                    display_name: skill.display_name.clone(),
                    importance,
                }),
            }
        }

        let strengths = self.strengths(&matched_skills, &components, degraded, &warnings);
        let risks = self.risks(&missing_skills, &components, &experience, &warnings);
        let recommendations = self.recommendations(&risks, &experience, input.target_role);

        let snippets = Snippets {
            resume: self.snippets(&matched_skills, &resume_by_id, input.resume.text()),
            jd: self.snippets(&matched_skills, &job_by_id, input.job.text()),
        };

        AnalysisResult {
            score,
            components,
            matched_skills,
            missing_skills,
            nice_to_have_skills,
            strengths,
            risks: risks.into_iter().map(|risk| risk.message).collect(),
            recommendations,
            snippets,
            experience,
            weights: input.weights,
            degraded,
            warnings,
        }
    }

    /// Every job-side skill with its importance and verdict, most important first
    pub fn classify(
        &self,
        job_mentions: &[SkillMention],
        resume_mentions: &[SkillMention],
    ) -> Vec<ClassifiedSkill> {
        let resume_confidence: HashMap<&str, f32> = resume_mentions
            .iter()
            .map(|m| (m.canonical_id.as_str(), m.confidence))
            .collect();

        let mut classified: Vec<ClassifiedSkill> = job_mentions
            .iter()
            .filter_map(|mention| {
                let Some(entry) = self.ontology.get(&mention.canonical_id) else {
                    warn!("Ignoring job skill '{}' missing from the ontology", mention.canonical_id);
                    return None;
                };

                let (placement, boosted) = self.placement(&mention.sections);
                let importance = self.importance(entry.default_weight, mention.confidence, boosted);

                let verdict = match resume_confidence.get(mention.canonical_id.as_str()) {
                    Some(&confidence) if confidence >= self.config.match_threshold => {
                        SkillVerdict::Matched { confidence }
                    }
                    _ if placement == Placement::Preferred => SkillVerdict::NiceToHave { importance },
                    _ => SkillVerdict::Missing { importance },
                };

                Some(ClassifiedSkill {
                    canonical_id: mention.canonical_id.clone(),
                    display_name: entry.display_name.clone(),
                    importance,
                    placement,
                    verdict,
                })
            })
            .collect();

        classified.sort_by(|a, b| {
            b.importance
                .total_cmp(&a.importance)
                .then_with(|| a.canonical_id.cmp(&b.canonical_id))
        });
        classified
    }

    /// An occurrence in a requirements section wins over a preferred one; no
    /// section information means the skill is required without a boost.
    fn placement(&self, sections: &[String]) -> (Placement, bool) {
        let mut preferred = false;
        for section in sections {
            let section = section.to_lowercase();
            if section_matches(&section, &self.config.preferred_section_keywords) {
                preferred = true;
            } else if section_matches(&section, &self.config.requirement_section_keywords) {
                return (Placement::Required, true);
            }
        }
        if preferred {
            (Placement::Preferred, false)
        } else {
            (Placement::Required, false)
        }
    }

    fn importance(&self, default_weight: f32, job_confidence: f32, boosted: bool) -> f32 {
        let certainty = (job_confidence / self.config.importance_confidence_saturation).min(1.0);
        let boost = if boosted {
            self.config.requirements_boost
        } else {
            0.0
        };
        (default_weight * certainty + boost).clamp(0.0, 1.0)
    }

    fn assess_experience(
        &self,
        resume: &NormalizedDocument,
        job: &NormalizedDocument,
        target_role: Option<&str>,
    ) -> ExperienceAssessment {
        let resume_signal = self.seniority.detect(resume.text());
        let mut job_signal = self.seniority.detect(job.text());
        if let Some(role) = target_role {
            job_signal = job_signal.merge(self.seniority.detect(role));
        }
        ExperienceAssessment {
            resume: resume_signal,
            job: job_signal,
        }
    }

    /// Linear decay per tier of shortfall; an unreadable resume counts as entry level
    fn experience_alignment(&self, resume_tier: Option<SeniorityTier>, required: SeniorityTier) -> f32 {
        let have = resume_tier.unwrap_or(SeniorityTier::Entry);
        let shortfall = required.rank().saturating_sub(have.rank());
        (1.0 - self.config.seniority_decay * shortfall as f32).max(0.0)
    }

    fn strengths(
        &self,
        matched: &[MatchedSkill],
        components: &ScoreComponents,
        degraded: bool,
        warnings: &[EngineWarning],
    ) -> Vec<String> {
        let mut strengths: Vec<String> = matched
            .iter()
            .take(self.config.top_strengths)
            .map(|skill| {
                format!(
                    "Demonstrated {} experience (importance {:.2})",
                    skill.display_name, skill.importance
                )
            })
            .collect();

        let strong = self.config.strong_threshold;
        if components.skill_coverage >= strong {
            strengths.push(format!(
                "Strong skill coverage ({:.0}%)",
                components.skill_coverage * 100.0
            ));
        }
        if !degraded && components.semantic_similarity >= strong {
            strengths.push(format!(
                "Strong semantic alignment with the job description ({:.0}%)",
                components.semantic_similarity * 100.0
            ));
        }
        let seniority_scored = !warnings.contains(&EngineWarning::NoSenioritySignal);
        if seniority_scored && components.experience_alignment >= strong {
            strengths.push(format!(
                "Experience level meets the role ({:.0}%)",
                components.experience_alignment * 100.0
            ));
        }
        strengths
    }

    fn risks(
        &self,
        missing: &[SkillGap],
        components: &ScoreComponents,
        experience: &ExperienceAssessment,
        warnings: &[EngineWarning],
    ) -> Vec<Risk> {
        let mut risks: Vec<Risk> = missing
            .iter()
            .filter(|gap| gap.importance >= self.config.risk_importance_threshold)
            .map(|gap| Risk {
                severity: gap.importance,
                cause: RiskCause::MissingSkill(gap.canonical_id.clone()),
                message: format!(
                    "Missing required skill: {} (importance {:.2})",
                    gap.display_name, gap.importance
                ),
            })
            .collect();

        let degraded_warning = warnings.iter().find(|w| w.degrades_result());
        let weak = self.config.weak_threshold;

        if components.skill_coverage < weak {
            risks.push(Risk {
                severity: 1.0 - components.skill_coverage,
                cause: RiskCause::Weak(Component::Coverage),
                message: format!(
                    "Low skill coverage ({:.0}%)",
                    components.skill_coverage * 100.0
                ),
            });
        }
        if degraded_warning.is_none() && components.semantic_similarity < weak {
            risks.push(Risk {
                severity: 1.0 - components.semantic_similarity,
                cause: RiskCause::Weak(Component::Semantic),
                message: format!(
                    "Low semantic similarity to the job description ({:.0}%)",
                    components.semantic_similarity * 100.0
                ),
            });
        }
        if components.experience_alignment < weak {
            let required = experience.job.tier.map_or("required", SeniorityTier::label);
            risks.push(Risk {
                severity: 1.0 - components.experience_alignment,
                cause: RiskCause::Weak(Component::Experience),
                message: format!(
                    "Experience appears below the {} level the role expects ({:.0}% alignment)",
                    required,
                    components.experience_alignment * 100.0
                ),
            });
        }

        if let Some(warning) = degraded_warning {
            risks.push(Risk {
                severity: 0.0,
                cause: RiskCause::Degraded,
                message: format!("Degraded result: {}", warning),
            });
        }
        if warnings.contains(&EngineWarning::NoSenioritySignal) {
            risks.push(Risk {
                severity: 0.0,
                cause: RiskCause::NoSeniority,
                message: "Low confidence: no seniority requirement detected in the job description, experience alignment defaulted to 100%".to_string(),
            });
        }

        risks.sort_by(|a, b| {
            b.severity
                .total_cmp(&a.severity)
                .then_with(|| a.cause.cmp(&b.cause))
        });
        risks
    }

    fn recommendations(
        &self,
        risks: &[Risk],
        experience: &ExperienceAssessment,
        target_role: Option<&str>,
    ) -> Vec<String> {
        let has_missing_skill = risks
            .iter()
            .any(|risk| matches!(risk.cause, RiskCause::MissingSkill(_)));

        let mut seen: Vec<&RiskCause> = Vec::new();
        let mut recommendations = Vec::new();

        for risk in risks {
            if recommendations.len() >= self.config.max_recommendations {
                break;
            }
            if seen.contains(&&risk.cause) {
                continue;
            }
            seen.push(&risk.cause);

            let recommendation = match &risk.cause {
                RiskCause::MissingSkill(id) => Some(format!(
                    "Add demonstrated experience with {}",
                    self.ontology.display_name(id)
                )),
                RiskCause::Weak(Component::Experience) => {
                    Some(experience_recommendation(&experience.job, target_role))
                }
                RiskCause::Weak(Component::Semantic) => Some(
                    "Mirror the job description's terminology in your summary and experience sections"
                        .to_string(),
                ),
                RiskCause::Weak(Component::Coverage) if !has_missing_skill => Some(
                    "Expand your skills section with the technologies the role lists".to_string(),
                ),
                _ => None,
            };
            if let Some(recommendation) = recommendation {
                recommendations.push(recommendation);
            }
        }
        recommendations
    }

    fn snippets(
        &self,
        matched: &[MatchedSkill],
        mentions: &HashMap<&str, &SkillMention>,
        text: &str,
    ) -> Vec<Snippet> {
        matched
            .iter()
            .filter_map(|skill| {
                let span = mentions.get(skill.canonical_id.as_str())?.evidence.first()?;
                Some(Snippet {
                    canonical_id: skill.canonical_id.clone(),
                    text: snippet_window(text, span, self.config.snippet_window),
                    start: span.start,
                    end: span.end,
                })
            })
            .collect()
    }
}

fn experience_recommendation(job: &SenioritySignal, target_role: Option<&str>) -> String {
    match (job.years, target_role) {
        (Some(years), Some(role)) => {
            format!("Highlight {}+ years of experience as {}", years, role)
        }
        (Some(years), None) => format!("Highlight {}+ years of relevant experience", years),
        (None, _) => format!(
            "Highlight evidence of {}-level experience",
            job.tier.map_or("the required", SeniorityTier::label)
        ),
    }
}

fn section_matches(section: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|keyword| !keyword.is_empty() && section.contains(&keyword.to_lowercase()))
}

/// Map cosine similarity from [-1, 1] onto [0, 1]
pub fn rescale_similarity(similarity: f32) -> f32 {
    if similarity.is_nan() {
        return 0.0;
    }
    ((similarity + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Importance-weighted share of required skills the resume matches, plus a
/// small bonus for matched preferred skills. 1.0 when nothing is required.
pub fn skill_coverage(classified: &[ClassifiedSkill], nice_to_have_bonus: f32) -> f32 {
    let mut required = (0usize, 0usize, 0.0f32, 0.0f32);
    let mut preferred = (0usize, 0usize, 0.0f32, 0.0f32);

    for skill in classified {
        let bucket = match skill.placement {
            Placement::Required => &mut required,
            Placement::Preferred => &mut preferred,
        };
        bucket.0 += 1;
        bucket.2 += skill.importance;
        if matches!(skill.verdict, SkillVerdict::Matched { .. }) {
            bucket.1 += 1;
            bucket.3 += skill.importance;
        }
    }

    let ratio = |(total, matched, total_weight, matched_weight): (usize, usize, f32, f32)| {
        if total_weight > EPSILON {
            matched_weight / total_weight
        } else {
            matched as f32 / total as f32
        }
    };

    let base = if required.0 == 0 { 1.0 } else { ratio(required) };
    let bonus = if preferred.0 == 0 {
        0.0
    } else {
        nice_to_have_bonus * ratio(preferred)
    };
    (base + bonus).clamp(0.0, 1.0)
}

pub fn overall_score(components: &ScoreComponents, weights: &ScoreWeights) -> u8 {
    let weighted = weights.semantic * components.semantic_similarity
        + weights.skill_coverage * components.skill_coverage
        + weights.experience * components.experience_alignment;
    (100.0 * weighted).round().clamp(0.0, 100.0) as u8
}

/// The evidence span with up to `window` characters of context on each side,
/// snapped to word boundaries and whitespace-collapsed
fn snippet_window(text: &str, span: &EvidenceSpan, window: usize) -> String {
    let valid = span.start <= span.end
        && span.end <= text.len()
        && text.is_char_boundary(span.start)
        && text.is_char_boundary(span.end);
    if !valid {
        return span.text.clone();
    }

    let mut start = span.start;
    for (taken, (idx, _)) in text[..span.start].char_indices().rev().enumerate() {
        if taken >= window {
            break;
        }
        start = idx;
    }
    if start > 0 {
        if let Some(space) = text[start..span.start].find(char::is_whitespace) {
            start += space;
        }
    }

    let mut end = span.end;
    for (taken, (idx, ch)) in text[span.end..].char_indices().enumerate() {
        if taken >= window {
            break;
        }
        end = span.end + idx + ch.len_utf8();
    }
    if end < text.len() {
        if let Some(space) = text[span.end..end].rfind(char::is_whitespace) {
            end = span.end + space;
        }
    }

    let body = text[start..end].split_whitespace().collect::<Vec<_>>().join(" ");
    let prefix = if start > 0 { "..." } else { "" };
    let suffix = if end < text.len() { "..." } else { "" };
    format!("{}{}{}", prefix, body, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::document::DocumentRole;
    use crate::processing::types::DetectionSource;

    fn engine() -> ScoringEngine {
        let ontology = Arc::new(SkillOntology::builtin().unwrap());
        ScoringEngine::new(ontology, ScoringConfig::default())
    }

    fn mention(id: &str, confidence: f32, section: Option<&str>) -> SkillMention {
        SkillMention {
            canonical_id: id.to_string(),
            confidence,
            source: DetectionSource::Exact,
            sources: vec![DetectionSource::Exact],
            evidence: vec![EvidenceSpan {
                text: id.to_string(),
                start: 0,
                end: id.len(),
                quality: 1.0,
                section: section.map(str::to_string),
            }],
            sections: section.map(str::to_string).into_iter().collect(),
        }
    }

    fn classified(id: &str, importance: f32, placement: Placement, matched: bool) -> ClassifiedSkill {
        ClassifiedSkill {
            canonical_id: id.to_string(),
            display_name: id.to_string(),
            importance,
            placement,
            verdict: if matched {
                SkillVerdict::Matched { confidence: 0.9 }
            } else {
                SkillVerdict::Missing { importance }
            },
        }
    }

    #[test]
    fn test_rescale_similarity() {
        assert_eq!(rescale_similarity(1.0), 1.0);
        assert_eq!(rescale_similarity(-1.0), 0.0);
        assert_eq!(rescale_similarity(0.0), 0.5);
        assert_eq!(rescale_similarity(f32::NAN), 0.0);
    }

    #[test]
    fn test_coverage_weighted_by_importance() {
        let skills = vec![
            classified("python", 0.6, Placement::Required, true),
            classified("sql", 0.4, Placement::Required, false),
        ];
        assert!((skill_coverage(&skills, 0.05) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_coverage_edge_cases() {
        assert_eq!(skill_coverage(&[], 0.05), 1.0);

        let none_matched = vec![classified("sql", 0.4, Placement::Required, false)];
        assert_eq!(skill_coverage(&none_matched, 0.05), 0.0);

        let zero_weight = vec![
            classified("a", 0.0, Placement::Required, true),
            classified("b", 0.0, Placement::Required, false),
        ];
        assert!((skill_coverage(&zero_weight, 0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_preferred_skills_only_add_a_bonus() {
        let mut skills = vec![
            classified("python", 0.6, Placement::Required, true),
            classified("sql", 0.4, Placement::Required, false),
        ];
        skills.push(classified("kafka", 0.5, Placement::Preferred, false));
        assert!((skill_coverage(&skills, 0.05) - 0.6).abs() < 1e-6);

        skills[2] = classified("kafka", 0.5, Placement::Preferred, true);
        assert!((skill_coverage(&skills, 0.05) - 0.65).abs() < 1e-6);

        let all = vec![
            classified("python", 0.6, Placement::Required, true),
            classified("kafka", 0.5, Placement::Preferred, true),
        ];
        assert_eq!(skill_coverage(&all, 0.05), 1.0);
    }

    #[test]
    fn test_coverage_is_monotonic_in_matches() {
        let ids = ["a", "b", "c", "d"];
        let weights = [0.9, 0.3, 0.5, 0.7];
        let mut previous = -1.0;
        for matched_count in 0..=ids.len() {
            let skills: Vec<ClassifiedSkill> = ids
                .iter()
                .zip(weights)
                .enumerate()
                .map(|(i, (id, w))| classified(id, w, Placement::Required, i < matched_count))
                .collect();
            let coverage = skill_coverage(&skills, 0.05);
            assert!(coverage >= previous);
            previous = coverage;
        }
        assert_eq!(previous, 1.0);
    }

    #[test]
    fn test_classification_partition_and_ordering() {
        let engine = engine();
        let job = vec![
            mention("python", 0.95, Some("requirements")),
            mention("kafka", 0.95, Some("preferred")),
            mention("sql", 0.95, None),
            mention("docker", 0.95, Some("requirements")),
        ];
        let resume = vec![mention("python", 0.9, None), mention("docker", 0.3, None)];

        let result = engine.classify(&job, &resume);
        assert_eq!(result.len(), 4);

        let verdict = |id: &str| result.iter().find(|s| s.canonical_id == id).unwrap().verdict;
        assert!(matches!(verdict("python"), SkillVerdict::Matched { .. }));
        assert!(matches!(verdict("docker"), SkillVerdict::Missing { .. }));
        assert!(matches!(verdict("kafka"), SkillVerdict::NiceToHave { .. }));
        assert!(matches!(verdict("sql"), SkillVerdict::Missing { .. }));

        assert!(result
            .windows(2)
            .all(|w| w[0].importance > w[1].importance
                || (w[0].importance == w[1].importance && w[0].canonical_id < w[1].canonical_id)));
    }

    #[test]
    fn test_requirements_section_boosts_importance() {
        let engine = engine();
        let boosted = engine.classify(&[mention("python", 0.95, Some("requirements"))], &[]);
        let plain = engine.classify(&[mention("python", 0.95, None)], &[]);
        assert!(boosted[0].importance > plain[0].importance);
        assert!(boosted[0].importance <= 1.0);
    }

    #[test]
    fn test_requirements_occurrence_wins_over_preferred() {
        let engine = engine();
        let mut kafka = mention("kafka", 0.95, Some("preferred"));
        kafka.sections = vec!["preferred".to_string(), "requirements".to_string()];

        let result = engine.classify(&[kafka], &[]);
        assert_eq!(result[0].placement, Placement::Required);
        assert!(matches!(result[0].verdict, SkillVerdict::Missing { .. }));
    }

    #[test]
    fn test_unknown_job_skill_is_ignored() {
        let engine = engine();
        let result = engine.classify(&[mention("not_a_skill", 0.9, None)], &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_experience_alignment_decays_per_tier() {
        let engine = engine();
        assert_eq!(
            engine.experience_alignment(Some(SeniorityTier::Lead), SeniorityTier::Senior),
            1.0
        );
        assert!(
            (engine.experience_alignment(Some(SeniorityTier::Mid), SeniorityTier::Senior) - 0.75)
                .abs()
                < 1e-6
        );
        assert!(
            (engine.experience_alignment(None, SeniorityTier::Lead) - 0.25).abs() < 1e-6
        );
    }

    #[test]
    fn test_score_full_result() {
        let engine = engine();
        let resume = NormalizedDocument::new(
            "resume",
            DocumentRole::Resume,
            "Junior developer with Python",
        );
        let job = NormalizedDocument::new(
            "job",
            DocumentRole::Job,
            "Lead engineer, 6+ years. Python and Kubernetes required.",
        );
        let resume_mentions = vec![mention("python", 0.95, None)];
        let job_mentions = vec![mention("kubernetes", 0.95, None), mention("python", 0.95, None)];

        let result = engine.score(ScoringInput {
            resume: &resume,
            job: &job,
            resume_mentions: &resume_mentions,
            job_mentions: &job_mentions,
            semantic: SemanticSignal::Similarity(0.6),
            target_role: Some("Backend Engineer"),
            weights: ScoreWeights::default(),
        });

        assert!((result.components.semantic_similarity - 0.8).abs() < 1e-6);
        assert_eq!(result.matched_skills.len(), 1);
        assert_eq!(result.missing_skills[0].canonical_id, "kubernetes");
        assert_eq!(result.experience.job.years, Some(6));
        assert!(result.components.experience_alignment < 1.0);
        assert!(!result.degraded);
        assert!(result
            .recommendations
            .iter()
            .any(|r| r == "Add demonstrated experience with Kubernetes"));
        assert!(result
            .recommendations
            .iter()
            .any(|r| r == "Highlight 6+ years of experience as Backend Engineer"));
        assert!(result.score <= 100);
    }

    #[test]
    fn test_unavailable_semantics_degrade() {
        let engine = engine();
        let resume = NormalizedDocument::new("r", DocumentRole::Resume, "Python");
        let job = NormalizedDocument::new("j", DocumentRole::Job, "Python");
        let mentions = vec![mention("python", 0.95, None)];

        let result = engine.score(ScoringInput {
            resume: &resume,
            job: &job,
            resume_mentions: &mentions,
            job_mentions: &mentions,
            semantic: SemanticSignal::Unavailable(EngineWarning::EmbeddingUnavailable {
                reason: "model missing".to_string(),
            }),
            target_role: None,
            weights: ScoreWeights::default(),
        });

        assert!(result.degraded);
        assert_eq!(result.components.semantic_similarity, 0.0);
        assert!(result.risks.iter().any(|r| r.starts_with("Degraded result")));
        assert!(result.warnings.contains(&EngineWarning::NoSenioritySignal));
        assert_eq!(result.components.experience_alignment, 1.0);
    }

    #[test]
    fn test_snippet_window_trims_to_words() {
        let text = "Earlier work included many things. Built data pipelines in Python for analytics teams across the company.";
        let start = text.find("Python").unwrap();
        let span = EvidenceSpan {
            text: "Python".to_string(),
            start,
            end: start + 6,
            quality: 1.0,
            section: None,
        };
        let snippet = snippet_window(text, &span, 20);
        assert!(snippet.starts_with("..."));
        assert!(snippet.ends_with("..."));
        assert!(snippet.contains("Python"));
        assert!(snippet.len() <= 6 + 2 * 20 + 6);

        let whole = snippet_window("Python", &EvidenceSpan { start: 0, end: 6, ..span }, 20);
        assert_eq!(whole, "Python");
    }
}
