//! Configuration management for the analysis engine

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ontology: OntologyConfig,
    pub embedding: EmbeddingConfig,
    pub extraction: ExtractionConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyConfig {
    /// TOML or JSON file replacing the built-in skill table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Model2vec,
    Hashing,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// HuggingFace repo id or a directory under `models_dir`
    pub model: String,
    pub models_dir: PathBuf,
    /// Segment window in bytes
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
    pub length_weighted: bool,
    pub hashing_dimension: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub exact_confidence: f32,
    pub pattern_confidence: f32,
    pub ner_confidence: f32,
    pub fuzzy_confidence: f32,
    pub fuzzy_threshold: f32,
    pub fuzzy_min_token_len: usize,
    pub corroboration_bonus: f32,
    pub skills_section_bonus: f32,
    pub frequency_cap: f32,
    pub max_evidence: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub match_threshold: f32,
    /// Job-side confidence at which a skill carries its full ontology weight
    pub importance_confidence_saturation: f32,
    pub requirements_boost: f32,
    pub nice_to_have_bonus: f32,
    pub strong_threshold: f32,
    pub weak_threshold: f32,
    pub risk_importance_threshold: f32,
    pub top_strengths: usize,
    pub max_recommendations: usize,
    /// Alignment lost per seniority tier of shortfall
    pub seniority_decay: f32,
    /// Years of experience at which mid, senior and lead tiers start
    pub seniority_year_thresholds: [u32; 3],
    /// Characters kept on each side of a snippet's match
    pub snippet_window: usize,
    pub requirement_section_keywords: Vec<String>,
    pub preferred_section_keywords: Vec<String>,
    pub weights: ScoreWeights,
    pub role_presets: Vec<RoleWeightPreset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

/// Component weights for the overall score, constrained to sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub semantic: f32,
    pub skill_coverage: f32,
    pub experience: f32,
}

/// Weights applied when the target role mentions one of `keywords`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleWeightPreset {
    pub name: String,
    pub keywords: Vec<String>,
    pub weights: ScoreWeights,
}

impl ScoreWeights {
    pub const fn new(semantic: f32, skill_coverage: f32, experience: f32) -> Self {
        Self {
            semantic,
            skill_coverage,
            experience,
        }
    }

    pub fn sum(&self) -> f32 {
        self.semantic + self.skill_coverage + self.experience
    }

    pub fn validate(&self) -> Result<()> {
        let parts = [self.semantic, self.skill_coverage, self.experience];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::InvalidInput(format!(
                "Score weights must be finite and non-negative: {:?}",
                self
            )));
        }
        if (self.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::InvalidInput(format!(
                "Score weights must sum to 1.0, got {:.4}",
                self.sum()
            )));
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::new(0.3, 0.5, 0.2)
    }
}

impl RoleWeightPreset {
    fn new(name: &str, keywords: &[&str], weights: ScoreWeights) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            weights,
        }
    }

    /// Whole-word keyword match against a free-form role title
    pub fn matches(&self, role: &str) -> bool {
        let role = padded_words(role);
        self.keywords.iter().any(|keyword| {
            let keyword = padded_words(keyword);
            !keyword.trim().is_empty() && role.contains(&keyword)
        })
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn padded_words(text: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();
    format!(" {} ", words.join(" "))
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-fit")
            .join("models");

        Self {
            backend: EmbeddingBackend::Model2vec,
            model: "minishlab/potion-base-8M".to_string(),
            models_dir,
            chunk_size: 1500,
            chunk_overlap: 200,
            batch_size: 32,
            length_weighted: true,
            hashing_dimension: 256,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            exact_confidence: 0.95,
            pattern_confidence: 0.8,
            ner_confidence: 0.8,
            fuzzy_confidence: 0.6,
            fuzzy_threshold: 0.85,
            fuzzy_min_token_len: 4,
            corroboration_bonus: 0.05,
            skills_section_bonus: 0.05,
            frequency_cap: 0.99,
            max_evidence: 3,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.5,
            importance_confidence_saturation: 0.9,
            requirements_boost: 0.1,
            nice_to_have_bonus: 0.05,
            strong_threshold: 0.8,
            weak_threshold: 0.5,
            risk_importance_threshold: 0.3,
            top_strengths: 5,
            max_recommendations: 5,
            seniority_decay: 0.25,
            seniority_year_thresholds: [2, 5, 8],
            snippet_window: 60,
            requirement_section_keywords: to_strings(&[
                "requirement",
                "qualification",
                "must have",
                "required",
                "what you'll need",
                "what you need",
            ]),
            preferred_section_keywords: to_strings(&[
                "preferred",
                "nice to have",
                "nice-to-have",
                "bonus",
                "plus",
                "desired",
                "optional",
            ]),
            weights: ScoreWeights::default(),
            role_presets: vec![
                RoleWeightPreset::new(
                    "ml",
                    &["ml", "ai", "machine learning", "deep learning", "data scientist"],
                    ScoreWeights::new(0.40, 0.55, 0.05),
                ),
                RoleWeightPreset::new(
                    "security",
                    &["security", "infosec", "appsec", "cybersecurity"],
                    ScoreWeights::new(0.35, 0.50, 0.15),
                ),
                RoleWeightPreset::new(
                    "frontend",
                    &["frontend", "front end", "ui", "ux"],
                    ScoreWeights::new(0.50, 0.40, 0.10),
                ),
            ],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
        }
    }
}

impl Config {
    /// Load from the user config directory, writing defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| EngineError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            EngineError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-fit")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let config_err = |e: EngineError| EngineError::Configuration(e.to_string());

        self.scoring.weights.validate().map_err(config_err)?;
        for preset in &self.scoring.role_presets {
            preset.weights.validate().map_err(|e| {
                EngineError::Configuration(format!("Role preset '{}': {}", preset.name, e))
            })?;
        }

        let unit_values = [
            ("extraction.exact_confidence", self.extraction.exact_confidence),
            ("extraction.pattern_confidence", self.extraction.pattern_confidence),
            ("extraction.ner_confidence", self.extraction.ner_confidence),
            ("extraction.fuzzy_confidence", self.extraction.fuzzy_confidence),
            ("extraction.fuzzy_threshold", self.extraction.fuzzy_threshold),
            ("extraction.corroboration_bonus", self.extraction.corroboration_bonus),
            ("extraction.skills_section_bonus", self.extraction.skills_section_bonus),
            ("extraction.frequency_cap", self.extraction.frequency_cap),
            ("scoring.match_threshold", self.scoring.match_threshold),
            ("scoring.requirements_boost", self.scoring.requirements_boost),
            ("scoring.nice_to_have_bonus", self.scoring.nice_to_have_bonus),
            ("scoring.strong_threshold", self.scoring.strong_threshold),
            ("scoring.weak_threshold", self.scoring.weak_threshold),
            ("scoring.risk_importance_threshold", self.scoring.risk_importance_threshold),
            ("scoring.seniority_decay", self.scoring.seniority_decay),
        ];
        for (name, value) in unit_values {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if !(self.scoring.importance_confidence_saturation > 0.0
            && self.scoring.importance_confidence_saturation <= 1.0)
        {
            return Err(EngineError::Configuration(
                "scoring.importance_confidence_saturation must be within (0, 1]".to_string(),
            ));
        }

        let years = self.scoring.seniority_year_thresholds;
        if !(years[0] <= years[1] && years[1] <= years[2]) {
            return Err(EngineError::Configuration(format!(
                "scoring.seniority_year_thresholds must be ascending, got {:?}",
                years
            )));
        }

        if self.embedding.chunk_size == 0 || self.embedding.batch_size == 0 {
            return Err(EngineError::Configuration(
                "embedding.chunk_size and embedding.batch_size must be positive".to_string(),
            ));
        }
        if self.embedding.chunk_overlap >= self.embedding.chunk_size {
            return Err(EngineError::Configuration(
                "embedding.chunk_overlap must be smaller than embedding.chunk_size".to_string(),
            ));
        }
        if self.embedding.hashing_dimension == 0 {
            return Err(EngineError::Configuration(
                "embedding.hashing_dimension must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Explicit weights win, then a matching role preset, then the configured default
    pub fn resolve_weights(
        &self,
        target_role: Option<&str>,
        explicit: Option<ScoreWeights>,
    ) -> Result<ScoreWeights> {
        if let Some(weights) = explicit {
            weights.validate()?;
            return Ok(weights);
        }

        if let Some(role) = target_role {
            if let Some(preset) = self.scoring.role_presets.iter().find(|p| p.matches(role)) {
                log::debug!("Using '{}' weight preset for role '{}'", preset.name, role);
                return Ok(preset.weights);
            }
        }

        Ok(self.scoring.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = ScoreWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-6);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_weights_rejected() {
        assert!(ScoreWeights::new(0.5, 0.5, 0.5).validate().is_err());
        assert!(ScoreWeights::new(-0.2, 1.0, 0.2).validate().is_err());
        assert!(ScoreWeights::new(f32::NAN, 0.5, 0.5).validate().is_err());
    }

    #[test]
    fn test_role_preset_matching_is_whole_word() {
        let config = Config::default();
        let ml = &config.scoring.role_presets[0];
        assert!(ml.matches("Senior ML Engineer"));
        assert!(ml.matches("Machine Learning Researcher"));
        assert!(!ml.matches("HTML Developer"));

        let frontend = &config.scoring.role_presets[2];
        assert!(frontend.matches("Front-End Engineer"));
    }

    #[test]
    fn test_resolve_weights_precedence() {
        let config = Config::default();
        let explicit = ScoreWeights::new(0.2, 0.6, 0.2);

        assert_eq!(
            config.resolve_weights(Some("ML Engineer"), Some(explicit)).unwrap(),
            explicit
        );
        assert_eq!(
            config.resolve_weights(Some("ML Engineer"), None).unwrap(),
            ScoreWeights::new(0.40, 0.55, 0.05)
        );
        assert_eq!(
            config.resolve_weights(Some("Backend Engineer"), None).unwrap(),
            ScoreWeights::default()
        );
        assert!(config
            .resolve_weights(None, Some(ScoreWeights::new(1.0, 1.0, 0.0)))
            .is_err());
    }

    #[test]
    fn test_config_round_trip_through_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.scoring.match_threshold = 0.6;
        config.embedding.backend = EmbeddingBackend::Hashing;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scoring]\nmatch_threshold = 0.7\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.scoring.match_threshold, 0.7);
        assert_eq!(loaded.scoring.weights, ScoreWeights::default());
        assert_eq!(loaded.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_invalid_config_file_is_configuration_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[scoring.weights]\nsemantic = 0.9\nskill_coverage = 0.9\nexperience = 0.9\n",
        )
        .unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }
}
