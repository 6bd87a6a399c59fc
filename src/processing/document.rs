//! Normalized documents and section detection

use crate::error::{EngineError, Result};
use crate::processing::text_processor::TextProcessor;
use crate::processing::types::SectionMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    Resume,
    Job,
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentRole::Resume => write!(f, "resume"),
            DocumentRole::Job => write!(f, "job description"),
        }
    }
}

/// Plain text plus optional section boundaries. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    id: String,
    role: DocumentRole,
    text: String,
    sections: SectionMap,
    target_role: Option<String>,
}

impl NormalizedDocument {
    pub fn new(id: impl Into<String>, role: DocumentRole, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            text: text.into(),
            sections: SectionMap::new(),
            target_role: None,
        }
    }

    /// Normalize raw extracted text and detect its section headers
    pub fn from_raw_text(id: impl Into<String>, role: DocumentRole, raw: &str) -> Self {
        let processor = TextProcessor::new();
        let text = processor.normalize_text(raw);
        let sections = detect_sections(&text);
        Self {
            id: id.into(),
            role,
            text,
            sections,
            target_role: None,
        }
    }

    /// Attach section boundaries; every range must lie on char boundaries inside the text
    pub fn with_sections(mut self, sections: SectionMap) -> Result<Self> {
        for (name, range) in &sections {
            let valid = range.start <= range.end
                && range.end <= self.text.len()
                && self.text.is_char_boundary(range.start)
                && self.text.is_char_boundary(range.end);
            if !valid {
                return Err(EngineError::InvalidInput(format!(
                    "Section '{}' of document '{}' has invalid range {:?}",
                    name, self.id, range
                )));
            }
        }
        self.sections = sections;
        Ok(self)
    }

    pub fn with_target_role(mut self, target_role: impl Into<String>) -> Self {
        self.target_role = Some(target_role.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> DocumentRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sections(&self) -> &SectionMap {
        &self.sections
    }

    pub fn target_role(&self) -> Option<&str> {
        self.target_role.as_deref()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Innermost section containing `offset`
pub fn section_at(sections: &SectionMap, offset: usize) -> Option<&str> {
    sections
        .iter()
        .filter(|(_, range)| range.contains(&offset))
        .min_by_key(|(_, range)| range.end - range.start)
        .map(|(name, _)| name.as_str())
}

const SECTION_HEADERS: &[(&str, &[&str])] = &[
    ("preferred", &["preferred qualifications", "preferred skills", "preferred", "nice to have", "nice-to-have", "bonus points", "bonus", "pluses"]),
    ("requirements", &["requirements", "minimum qualifications", "basic qualifications", "qualifications", "required skills", "what you'll need", "what you need", "must have", "must-have"]),
    ("responsibilities", &["responsibilities", "what you'll do", "what you will do", "the role", "duties"]),
    ("summary", &["summary", "professional summary", "profile", "objective", "about me", "about"]),
    ("experience", &["experience", "work experience", "professional experience", "work history", "employment", "career history"]),
    ("education", &["education", "academic background", "degrees"]),
    ("skills", &["skills", "technical skills", "core competencies", "competencies", "technologies", "tech stack", "expertise", "tools"]),
    ("projects", &["projects", "notable projects", "portfolio"]),
    ("certifications", &["certifications", "certificates", "licenses", "training"]),
];

/// Header lines ("Skills:", "## Experience", "2. EDUCATION") open a section that
/// runs until the next header or the end of the text.
pub fn detect_sections(text: &str) -> SectionMap {
    let mut headers: Vec<(String, usize)> = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if let Some(name) = classify_header(line) {
            let name = unique_name(&headers, name);
            headers.push((name, offset));
        }
        offset += line.len();
    }

    let mut sections = SectionMap::new();
    for (idx, (name, start)) in headers.iter().enumerate() {
        let end = headers.get(idx + 1).map(|(_, next)| *next).unwrap_or(text.len());
        let end = trim_trailing_whitespace(text, *start..end);
        sections.insert(name.clone(), *start..end);
    }
    sections
}

fn classify_header(line: &str) -> Option<&'static str> {
    let trimmed = line.trim();
    let stripped = trimmed
        .trim_start_matches(|c: char| c == '#' || c == '•' || c == '*' || c == '-' || c.is_ascii_digit() || c == '.' || c.is_whitespace())
        .trim_end_matches(|c: char| c == ':' || c == '*' || c.is_whitespace());

    if stripped.is_empty() || stripped.chars().count() > 40 || stripped.split_whitespace().count() > 4 {
        return None;
    }

    let lower = stripped.to_lowercase();
    for (name, phrases) in SECTION_HEADERS {
        for phrase in phrases.iter() {
            if lower == *phrase {
                return Some(*name);
            }
        }
    }
    None
}

fn unique_name(existing: &[(String, usize)], base: &str) -> String {
    let count = existing
        .iter()
        .filter(|(name, _)| name == base || name.starts_with(&format!("{}_", base)))
        .count();
    if count == 0 {
        base.to_string()
    } else {
        format!("{}_{}", base, count + 1)
    }
}

fn trim_trailing_whitespace(text: &str, range: Range<usize>) -> usize {
    range.start + text[range].trim_end().len()
}
