//! CLI interface for the resume fit analyzer

use crate::config::{OutputFormat, ScoreWeights};
use crate::processing::ontology::SkillCategory;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Extensions the input pipeline can read
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text"];

#[derive(Parser)]
#[command(name = "resume-fit")]
#[command(version)]
#[command(about = "Resume and job description compatibility analyzer")]
#[command(long_about = "Score how well a resume fits a job description using skill extraction against a canonical ontology, semantic similarity and seniority alignment")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a resume against a job description
    Analyze {
        /// Path to resume file (TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Target role, used to pick a weight preset
        #[arg(long)]
        role: Option<String>,

        /// Explicit weights as "semantic,skills,experience", e.g. 0.3,0.5,0.2
        #[arg(short, long)]
        weights: Option<String>,

        /// Output detailed analysis
        #[arg(short, long)]
        detailed: bool,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file (a directory gets a generated file name)
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Analyze one resume against several job descriptions concurrently
    Batch {
        /// Path to resume file (TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Job description files
        #[arg(short, long, num_args = 1.., required = true)]
        jobs: Vec<PathBuf>,

        /// Target role applied to every job
        #[arg(long)]
        role: Option<String>,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Show the skills detected in a single document
    Extract {
        /// Document to scan
        file: PathBuf,

        /// Treat the document as a job description
        #[arg(long)]
        job: bool,
    },

    /// Skill ontology commands
    Ontology {
        #[command(subcommand)]
        action: OntologyAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum OntologyAction {
    /// List canonical skills
    List {
        /// Only show one category, e.g. database or cloud_platform
        #[arg(long)]
        category: Option<String>,
    },

    /// Load an ontology file and report problems
    Validate {
        /// TOML or JSON ontology file
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" | "text" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown",
            format
        )),
    }
}

/// Parse "semantic,skills,experience" into weights; the sum is checked later
pub fn parse_weights(value: &str) -> Result<ScoreWeights, String> {
    let parts = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|_| format!("Invalid weight '{}' in '{}'", part.trim(), value))
        })
        .collect::<Result<Vec<f32>, String>>()?;

    match parts.as_slice() {
        [semantic, skills, experience] => Ok(ScoreWeights::new(*semantic, *skills, *experience)),
        _ => Err(format!(
            "Expected three comma-separated weights (semantic,skills,experience), got {}",
            parts.len()
        )),
    }
}

pub fn parse_category(value: &str) -> Result<SkillCategory, String> {
    let key = value.trim().to_lowercase().replace(['-', ' '], "_");
    let category = match key.as_str() {
        "programming_language" | "language" => SkillCategory::ProgrammingLanguage,
        "web_technology" | "web" => SkillCategory::WebTechnology,
        "backend_framework" | "backend" => SkillCategory::BackendFramework,
        "database" => SkillCategory::Database,
        "cloud_platform" | "cloud" => SkillCategory::CloudPlatform,
        "devops" => SkillCategory::Devops,
        "ml_ai" | "ml" | "ai" => SkillCategory::MlAi,
        "data_analytics" | "data" => SkillCategory::DataAnalytics,
        "security" => SkillCategory::Security,
        "mobile_development" | "mobile" => SkillCategory::MobileDevelopment,
        "practice" => SkillCategory::Practice,
        "soft_skill" | "soft" => SkillCategory::SoftSkill,
        "other" => SkillCategory::Other,
        _ => return Err(format!("Unknown skill category: {}", value)),
    };
    Ok(category)
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
