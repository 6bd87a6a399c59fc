//! Output formatters for console, JSON and Markdown reports

use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::report::AnalysisReport;
use crate::processing::seniority::SenioritySignal;
use crate::processing::types::{SkillGap, Snippet};
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for formatting analysis reports
pub trait OutputFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String>;
}

/// Console formatter with colors and score badges
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for API integration and structured data
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter for documentation and reports
pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Report generator that coordinates the formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

/// Matched skills shown before the list is cut short in non-detailed mode
const SUMMARY_SKILL_LIMIT: usize = 10;

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            3 => "▒",
            _ => "░",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Yellow,
            _ => Color::White,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: u8) -> String {
        let (badge, color) = match score {
            90..=100 => ("EXCELLENT", Color::Green),
            80..=89 => ("VERY GOOD", Color::BrightGreen),
            70..=79 => ("GOOD", Color::Yellow),
            60..=69 => ("FAIR", Color::BrightYellow),
            50..=59 => ("BELOW AVG", Color::Red),
            _ => ("POOR", Color::BrightRed),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_gaps(&self, title: &str, gaps: &[SkillGap], color: Color) -> String {
        let mut output = self.format_header(title, 3);
        for gap in gaps {
            output.push_str(&format!(
                "  • {} {}\n",
                self.colorize(&gap.display_name, color),
                self.colorize(&format!("(importance {:.2})", gap.importance), Color::BrightBlack)
            ));
        }
        output
    }

    fn format_snippets(&self, label: &str, snippets: &[Snippet]) -> String {
        let mut output = format!("{}:\n", self.colorize(label, Color::Cyan));
        for snippet in snippets {
            output.push_str(&format!(
                "  [{}] \"{}\" {}\n",
                snippet.canonical_id,
                snippet.text,
                self.colorize(&format!("@{}..{}", snippet.start, snippet.end), Color::BrightBlack)
            ));
        }
        output
    }

    /// Table of one line per job, best score first
    pub fn format_batch_summary(&self, reports: &[AnalysisReport]) -> String {
        let mut ranked: Vec<&AnalysisReport> = reports.iter().collect();
        ranked.sort_by(|a, b| {
            b.result
                .score
                .cmp(&a.result.score)
                .then_with(|| a.metadata.job_id.cmp(&b.metadata.job_id))
        });

        let mut output = self.format_header("📊 BATCH ANALYSIS", 1);
        if let Some(first) = ranked.first() {
            output.push_str(&format!("Resume: {}\n\n", first.metadata.resume_id));
        }
        for (i, report) in ranked.iter().enumerate() {
            output.push_str(&format!(
                "{:>2}. {:<32} {:>3}% {} {} missing{}\n",
                i + 1,
                report.metadata.job_id,
                report.result.score,
                self.format_score_badge(report.result.score),
                report.result.missing_skills.len(),
                if report.result.degraded {
                    self.colorize(" (degraded)", Color::Red)
                } else {
                    String::new()
                }
            ));
        }
        output
    }
}

fn format_seniority(signal: &SenioritySignal) -> String {
    match (signal.tier, signal.years) {
        (Some(tier), Some(years)) => format!("{} ({}+ years)", tier, years),
        (Some(tier), None) => tier.to_string(),
        (None, Some(years)) => format!("{}+ years", years),
        (None, None) => "not stated".to_string(),
    }
}

fn percent(value: f32) -> f32 {
    value * 100.0
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let result = &report.result;
        let mut output = String::new();

        // Header
        output.push_str(&self.format_header("📊 RESUME FIT ANALYSIS", 1));
        output.push_str(&format!(
            "Generated: {} | Resume: {} | Job: {}\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.resume_id,
            report.metadata.job_id
        ));
        if let Some(role) = &report.metadata.target_role {
            output.push_str(&format!("Target role: {}\n", role));
        }

        // Executive Summary
        output.push_str(&self.format_header("Executive Summary", 2));
        output.push_str(&format!(
            "Overall Score: {}% {}\n",
            result.score,
            self.format_score_badge(result.score)
        ));
        output.push_str(&format!(
            "Verdict: {}\n",
            self.colorize(report.verdict.description(), Color::Cyan)
        ));
        if result.degraded {
            output.push_str(&format!(
                "{}\n",
                self.colorize("Degraded result: semantic similarity was not computed", Color::Red)
            ));
        }

        // Score Breakdown
        output.push_str(&self.format_header("Score Breakdown", 3));
        output.push_str(&format!(
            "🎯 Semantic Similarity: {:.0}% (weight: {:.1}%)\n",
            percent(result.components.semantic_similarity),
            percent(result.weights.semantic)
        ));
        output.push_str(&format!(
            "🧩 Skill Coverage: {:.0}% (weight: {:.1}%)\n",
            percent(result.components.skill_coverage),
            percent(result.weights.skill_coverage)
        ));
        output.push_str(&format!(
            "📈 Experience Alignment: {:.0}% (weight: {:.1}%)\n",
            percent(result.components.experience_alignment),
            percent(result.weights.experience)
        ));

        if !result.matched_skills.is_empty() {
            output.push_str(&self.format_header("✅ Matched Skills", 3));
            let limit = if self.detailed {
                result.matched_skills.len()
            } else {
                SUMMARY_SKILL_LIMIT
            };
            for skill in result.matched_skills.iter().take(limit) {
                output.push_str(&format!(
                    "  • {} {}\n",
                    self.colorize(&skill.display_name, Color::Green),
                    self.colorize(
                        &format!(
                            "(confidence {:.2}, importance {:.2})",
                            skill.confidence, skill.importance
                        ),
                        Color::BrightBlack
                    )
                ));
            }
            let hidden = result.matched_skills.len().saturating_sub(limit);
            if hidden > 0 {
                output.push_str(&format!("  … and {} more (use --detailed)\n", hidden));
            }
        }

        if !result.missing_skills.is_empty() {
            output.push_str(&self.format_gaps("❌ Missing Skills", &result.missing_skills, Color::Red));
        }

        if !result.nice_to_have_skills.is_empty() {
            output.push_str(&self.format_gaps(
                "💡 Nice to Have",
                &result.nice_to_have_skills,
                Color::Yellow,
            ));
        }

        // Strengths
        if !result.strengths.is_empty() {
            output.push_str(&self.format_header("✅ Key Strengths", 3));
            for strength in &result.strengths {
                output.push_str(&format!("  • {}\n", self.colorize(strength, Color::Green)));
            }
        }

        if !result.risks.is_empty() {
            output.push_str(&self.format_header("⚠️ Risks", 3));
            for risk in &result.risks {
                output.push_str(&format!("  • {}\n", self.colorize(risk, Color::Yellow)));
            }
        }

        if !result.recommendations.is_empty() {
            output.push_str(&self.format_header("📋 Recommendations", 2));
            for (i, rec) in result.recommendations.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, rec));
            }
        }

        if self.detailed {
            output.push_str(&self.format_header("📊 Detailed Analysis", 2));

            output.push_str(&self.format_header("Experience", 3));
            output.push_str(&format!(
                "Resume: {}\nJob:    {}\n",
                format_seniority(&result.experience.resume),
                format_seniority(&result.experience.job)
            ));

            if !result.snippets.resume.is_empty() || !result.snippets.jd.is_empty() {
                output.push_str(&self.format_header("📎 Evidence Snippets", 3));
                output.push_str(&self.format_snippets("Resume", &result.snippets.resume));
                output.push_str(&self.format_snippets("Job description", &result.snippets.jd));
            }

            if !result.warnings.is_empty() {
                output.push_str(&self.format_header("Warnings", 3));
                for warning in &result.warnings {
                    output.push_str(&format!("  • {}\n", warning));
                }
            }
        }

        // Footer
        output.push_str(&format!(
            "\n{} Generated by resume-fit v{} | Ontology {} | Embeddings: {}\n",
            self.colorize("ℹ️", Color::Blue),
            report.metadata.engine_version,
            report.metadata.ontology_version,
            report.metadata.embedding_backend.as_deref().unwrap_or("none")
        ));

        Ok(output)
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        self.to_json(report)
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_score_badge(score: u8) -> &'static str {
        match score {
            90..=100 => "🟢 Excellent",
            80..=89 => "🟡 Very Good",
            70..=79 => "🟠 Good",
            60..=69 => "🔴 Fair",
            50..=59 => "🔴 Below Average",
            _ => "🔴 Poor",
        }
    }

    fn gap_table(title: &str, gaps: &[SkillGap]) -> String {
        let mut output = format!("### {}\n\n", title);
        output.push_str("| Skill | Importance |\n");
        output.push_str("|-------|------------|\n");
        for gap in gaps {
            output.push_str(&format!("| {} | {:.2} |\n", gap.display_name, gap.importance));
        }
        output.push('\n');
        output
    }

    fn bullet_list(title: &str, items: &[String]) -> String {
        let mut output = format!("### {}\n\n", title);
        for item in items {
            output.push_str(&format!("- {}\n", item));
        }
        output.push('\n');
        output
    }

    pub fn format_batch_summary(&self, reports: &[AnalysisReport]) -> String {
        let mut ranked: Vec<&AnalysisReport> = reports.iter().collect();
        ranked.sort_by(|a, b| b.result.score.cmp(&a.result.score));

        let mut output = String::from("# 📊 Batch Analysis\n\n");
        output.push_str("| Job | Score | Verdict | Missing |\n");
        output.push_str("|-----|-------|---------|---------|\n");
        for report in ranked {
            output.push_str(&format!(
                "| {} | {}% | {} | {} |\n",
                report.metadata.job_id,
                report.result.score,
                report.verdict,
                report.result.missing_skills.len()
            ));
        }
        output
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let result = &report.result;
        let mut output = String::new();

        output.push_str("# 📊 Resume Fit Analysis Report\n\n");

        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Ontology:** {}\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.metadata.ontology_version
            ));
            output.push_str(&format!(
                "**Resume:** `{}` | **Job:** `{}`\n\n",
                report.metadata.resume_id, report.metadata.job_id
            ));
        }

        // Executive Summary
        output.push_str("## Executive Summary\n\n");
        output.push_str(&format!(
            "**Overall Fit Score:** {}% {}\n\n",
            result.score,
            Self::markdown_score_badge(result.score)
        ));
        output.push_str(&format!("**Verdict:** {}\n\n", report.verdict.description()));
        if result.degraded {
            output.push_str("> ⚠️ Degraded result: semantic similarity was not computed.\n\n");
        }

        // Score Breakdown
        output.push_str("### Score Breakdown\n\n");
        output.push_str("| Component | Score | Weight |\n");
        output.push_str("|-----------|-------|--------|\n");
        output.push_str(&format!(
            "| 🎯 Semantic Similarity | {:.0}% | {:.1}% |\n",
            percent(result.components.semantic_similarity),
            percent(result.weights.semantic)
        ));
        output.push_str(&format!(
            "| 🧩 Skill Coverage | {:.0}% | {:.1}% |\n",
            percent(result.components.skill_coverage),
            percent(result.weights.skill_coverage)
        ));
        output.push_str(&format!(
            "| 📈 Experience Alignment | {:.0}% | {:.1}% |\n\n",
            percent(result.components.experience_alignment),
            percent(result.weights.experience)
        ));

        if !result.matched_skills.is_empty() {
            output.push_str("### ✅ Matched Skills\n\n");
            output.push_str("| Skill | Confidence | Importance | Evidence |\n");
            output.push_str("|-------|------------|------------|----------|\n");
            for skill in &result.matched_skills {
                output.push_str(&format!(
                    "| {} | {:.2} | {:.2} | {} |\n",
                    skill.display_name,
                    skill.confidence,
                    skill.importance,
                    skill.evidence.first().map(String::as_str).unwrap_or("")
                ));
            }
            output.push('\n');
        }

        if !result.missing_skills.is_empty() {
            output.push_str(&Self::gap_table("❌ Missing Skills", &result.missing_skills));
        }
        if !result.nice_to_have_skills.is_empty() {
            output.push_str(&Self::gap_table("💡 Nice to Have", &result.nice_to_have_skills));
        }
        if !result.strengths.is_empty() {
            output.push_str(&Self::bullet_list("✅ Key Strengths", &result.strengths));
        }
        if !result.risks.is_empty() {
            output.push_str(&Self::bullet_list("⚠️ Risks", &result.risks));
        }

        if !result.recommendations.is_empty() {
            output.push_str("## 📋 Recommendations\n\n");
            for (i, rec) in result.recommendations.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, rec));
            }
            output.push('\n');
        }

        output.push_str("## 📈 Experience\n\n");
        output.push_str(&format!(
            "- **Resume:** {}\n- **Job:** {}\n\n",
            format_seniority(&result.experience.resume),
            format_seniority(&result.experience.job)
        ));

        // Footer
        if self.include_metadata {
            output.push_str("---\n\n");
            output.push_str(&format!(
                "*Generated by resume-fit v{} using {}*\n",
                report.metadata.engine_version,
                report
                    .metadata
                    .embedding_backend
                    .as_deref()
                    .unwrap_or("skills-only scoring")
            ));
        }

        Ok(output)
    }
}

impl ReportGenerator {
    pub fn with_options(
        use_colors: bool,
        detailed: bool,
        pretty_json: bool,
        include_metadata: bool,
    ) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    pub fn generate_report(&self, report: &AnalysisReport, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
        }
    }

    /// One resume against many jobs; JSON keeps every full report
    pub fn generate_batch(&self, reports: &[AnalysisReport], format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => Ok(self.console_formatter.format_batch_summary(reports)),
            OutputFormat::Json => self.json_formatter.to_json(reports),
            OutputFormat::Markdown => Ok(self.markdown_formatter.format_batch_summary(reports)),
        }
    }
}

// Utility functions for saving reports
pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: &OutputFormat, resume_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("{}_analysis{}.txt", base_name, timestamp_suffix),
        OutputFormat::Json => format!("{}_analysis{}.json", base_name, timestamp_suffix),
        OutputFormat::Markdown => format!("{}_analysis{}.md", base_name, timestamp_suffix),
    }
}
