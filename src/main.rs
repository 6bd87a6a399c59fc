//! resume-fit: explainable resume and job description compatibility scoring

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use resume_fit::cli::{self, Cli, Commands, ConfigAction, OntologyAction};
use resume_fit::config::{Config, EmbeddingBackend, OutputFormat};
use resume_fit::input::InputManager;
use resume_fit::output::{save_report_to_file, suggest_filename, AnalysisReport, ReportGenerator};
use resume_fit::processing::document::{DocumentRole, NormalizedDocument};
use resume_fit::processing::ontology::SkillOntology;
use resume_fit::processing::AnalysisEngine;
use resume_fit::{EngineError, Result};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {} [{}]", e, e.code());
            process::exit(1);
        }
    };

    // Execute command
    if let Err(e) = run_command(cli.command, config, cli.config).await {
        error!("Command failed: {} [{}]", e, e.code());
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Analyze {
            resume,
            job,
            role,
            weights,
            detailed,
            output,
            save,
        } => {
            validate_input(&resume, "Resume")?;
            validate_input(&job, "Job description")?;
            let output_format = resolve_format(output.as_deref(), &config)?;
            let weights = weights
                .as_deref()
                .map(cli::parse_weights)
                .transpose()
                .map_err(EngineError::InvalidInput)?;

            let mut input_manager = InputManager::new();
            let resume_doc = input_manager.load_document(&resume, DocumentRole::Resume).await?;
            let job_doc = input_manager.load_document(&job, DocumentRole::Job).await?;

            let detailed = detailed || config.output.detailed;
            let use_colors = config.output.color_output && save.is_none();
            let engine = build_engine(config).await?;

            let result = engine.analyze(&resume_doc, &job_doc, role.as_deref(), weights)?;
            let report = AnalysisReport::new(result, &engine, &resume_doc, &job_doc, role.as_deref());

            let generator = ReportGenerator::with_options(use_colors, detailed, true, true);
            let content = generator.generate_report(&report, &output_format)?;
            emit(&content, save.as_deref(), &output_format, &resume)?;
        }

        Commands::Batch {
            resume,
            jobs,
            role,
            output,
            save,
        } => {
            validate_input(&resume, "Resume")?;
            for job in &jobs {
                validate_input(job, "Job description")?;
            }
            let output_format = resolve_format(output.as_deref(), &config)?;
            let use_colors = config.output.color_output && save.is_none();

            let mut input_manager = InputManager::new();
            let resume_doc = Arc::new(input_manager.load_document(&resume, DocumentRole::Resume).await?);
            let mut job_docs = Vec::with_capacity(jobs.len());
            for job in &jobs {
                job_docs.push(input_manager.load_document(job, DocumentRole::Job).await?);
            }

            let engine = Arc::new(build_engine(config).await?);
            let reports = analyze_batch(&engine, &resume_doc, job_docs, role).await?;

            let generator = ReportGenerator::with_options(use_colors, false, true, true);
            let content = generator.generate_batch(&reports, &output_format)?;
            emit(&content, save.as_deref(), &output_format, &resume)?;
        }

        Commands::Extract { file, job } => {
            validate_input(&file, "Document")?;
            let role = if job { DocumentRole::Job } else { DocumentRole::Resume };

            let mut input_manager = InputManager::new();
            let document = input_manager.load_document(&file, role).await?;

            // Extraction never needs the embedding model
            let mut config = config;
            config.embedding.backend = EmbeddingBackend::Disabled;
            let engine = AnalysisEngine::from_config(config)?;

            let mentions = engine.extract_skills(&document);
            println!("{} {} skills found in {} '{}'", "🔍".bold(), mentions.len(), role, document.id());
            for mention in &mentions {
                let evidence = mention
                    .evidence
                    .first()
                    .map(|span| span.text.as_str())
                    .unwrap_or("");
                println!(
                    "  • {:<24} {:.2}  {:<8} \"{}\"",
                    engine.ontology().display_name(&mention.canonical_id).green(),
                    mention.confidence,
                    mention.source.to_string(),
                    evidence
                );
            }
        }

        Commands::Ontology { action } => match action {
            OntologyAction::List { category } => {
                let category = category
                    .as_deref()
                    .map(cli::parse_category)
                    .transpose()
                    .map_err(EngineError::InvalidInput)?;
                let ontology = match &config.ontology.path {
                    Some(path) => SkillOntology::from_path(path)?,
                    None => SkillOntology::builtin()?,
                };

                println!("📚 Skill ontology {} ({} skills)\n", ontology.version(), ontology.len());
                let mut entries: Vec<_> = ontology
                    .entries()
                    .iter()
                    .filter(|entry| category.map_or(true, |c| entry.category == c))
                    .collect();
                entries.sort_by(|a, b| {
                    a.category
                        .cmp(&b.category)
                        .then_with(|| a.canonical_id.cmp(&b.canonical_id))
                });

                let mut current = None;
                for entry in entries {
                    if current != Some(entry.category) {
                        println!("{}", entry.category.to_string().bold().blue());
                        current = Some(entry.category);
                    }
                    let aliases: Vec<&str> = entry.aliases.iter().map(String::as_str).collect();
                    println!(
                        "  • {} [{}] weight {:.2}{}",
                        entry.display_name,
                        entry.canonical_id,
                        entry.default_weight,
                        if aliases.is_empty() {
                            String::new()
                        } else {
                            format!(" ({})", aliases.join(", "))
                        }
                    );
                }
            }

            OntologyAction::Validate { path } => {
                let ontology = SkillOntology::from_path(&path)?;
                println!(
                    "✅ {} is valid: version {}, {} skills",
                    path.display(),
                    ontology.version(),
                    ontology.len()
                );
            }
        },

        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);
            match action.unwrap_or(ConfigAction::Show) {
                ConfigAction::Show => {
                    let content = toml::to_string_pretty(&config).map_err(|e| {
                        EngineError::Configuration(format!("Failed to serialize config: {}", e))
                    })?;
                    println!("# {}\n{}", path.display(), content);
                }
                ConfigAction::Reset => {
                    Config::default().save_to(&path)?;
                    println!("🔄 Configuration reset to defaults: {}", path.display());
                }
                ConfigAction::Path => {
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn validate_input(path: &Path, label: &str) -> Result<()> {
    cli::validate_file_extension(path, cli::SUPPORTED_EXTENSIONS)
        .map_err(|e| EngineError::InvalidInput(format!("{} file: {}", label, e)))
}

fn resolve_format(output: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match output {
        Some(format) => cli::parse_output_format(format).map_err(EngineError::InvalidInput),
        None => Ok(config.output.format),
    }
}

/// Model loading reads weights from disk, keep it off the async workers
async fn build_engine(config: Config) -> Result<AnalysisEngine> {
    tokio::task::spawn_blocking(move || AnalysisEngine::from_config(config))
        .await
        .map_err(|e| EngineError::TaskFailed(format!("engine initialization: {}", e)))?
}

async fn analyze_batch(
    engine: &Arc<AnalysisEngine>,
    resume: &Arc<NormalizedDocument>,
    jobs: Vec<NormalizedDocument>,
    role: Option<String>,
) -> Result<Vec<AnalysisReport>> {
    let progress_bar = ProgressBar::new(jobs.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| EngineError::OutputFormatting(e.to_string()))?,
    );

    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let engine = Arc::clone(engine);
            let resume = Arc::clone(resume);
            let role = role.clone();
            tokio::task::spawn_blocking(move || {
                let result = engine.analyze(&resume, &job, role.as_deref(), None)?;
                Ok::<_, EngineError>(AnalysisReport::new(result, &engine, &resume, &job, role.as_deref()))
            })
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    let mut last_error = None;
    for handle in handles {
        let outcome = handle
            .await
            .map_err(|e| EngineError::TaskFailed(e.to_string()))
            .and_then(|result| result);
        match outcome {
            Ok(report) => {
                progress_bar.set_message(report.metadata.job_id.clone());
                reports.push(report);
            }
            Err(e) => {
                warn!("Skipping job: {} [{}]", e, e.code());
                last_error = Some(e);
            }
        }
        progress_bar.inc(1);
    }
    progress_bar.finish_with_message("done");

    match (reports.is_empty(), last_error) {
        (true, Some(e)) => Err(e),
        _ => {
            info!("Batch complete: {} of {} jobs analyzed", reports.len(), progress_bar.length().unwrap_or(0));
            Ok(reports)
        }
    }
}

fn emit(content: &str, save: Option<&Path>, format: &OutputFormat, resume: &Path) -> Result<()> {
    match save {
        Some(path) => {
            let target = if path.is_dir() {
                path.join(suggest_filename(format, &resume.to_string_lossy(), true))
            } else {
                path.to_path_buf()
            };
            save_report_to_file(content, &target)?;
            println!("💾 Report saved to {}", target.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
