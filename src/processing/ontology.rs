//! Skill ontology: canonical skills, their aliases, and the lookup structures
//! the extractor matches against. Built once and shared read-only.

use crate::error::{EngineError, Result};
use crate::processing::text_processor::TextProcessor;
use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

const BUILTIN_ONTOLOGY: &str = include_str!("../../data/skill_ontology.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    ProgrammingLanguage,
    WebTechnology,
    BackendFramework,
    Database,
    CloudPlatform,
    Devops,
    MlAi,
    DataAnalytics,
    Security,
    MobileDevelopment,
    Practice,
    SoftSkill,
    Other,
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkillCategory::ProgrammingLanguage => "Programming Language",
            SkillCategory::WebTechnology => "Web Technology",
            SkillCategory::BackendFramework => "Backend Framework",
            SkillCategory::Database => "Database",
            SkillCategory::CloudPlatform => "Cloud Platform",
            SkillCategory::Devops => "DevOps",
            SkillCategory::MlAi => "ML / AI",
            SkillCategory::DataAnalytics => "Data & Analytics",
            SkillCategory::Security => "Security",
            SkillCategory::MobileDevelopment => "Mobile Development",
            SkillCategory::Practice => "Practice",
            SkillCategory::SoftSkill => "Soft Skill",
            SkillCategory::Other => "Other",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillOntologyEntry {
    #[serde(alias = "id")]
    pub canonical_id: String,
    pub display_name: String,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    #[serde(default = "default_category")]
    pub category: SkillCategory,
    #[serde(default = "default_weight")]
    pub default_weight: f32,
}

fn default_category() -> SkillCategory {
    SkillCategory::Other
}

fn default_weight() -> f32 {
    0.5
}

fn default_version() -> String {
    "unversioned".to_string()
}

impl SkillOntologyEntry {
    /// Canonical id followed by every alias
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical_id.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OntologyFile {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    skills: Vec<SkillOntologyEntry>,
}

/// One automaton pattern: a phrase key and every entry that claims it
#[derive(Debug, Clone)]
pub struct AliasPattern {
    pub key: String,
    pub entries: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct FuzzyCandidate {
    pub key: String,
    pub token_count: usize,
    pub entry: usize,
}

#[derive(Debug, Clone)]
pub struct SkillOntology {
    version: String,
    entries: Vec<SkillOntologyEntry>,
    by_id: HashMap<String, usize>,
    patterns: Vec<AliasPattern>,
    matcher: AhoCorasick,
    compact_index: HashMap<String, Vec<usize>>,
    fuzzy_candidates: Vec<FuzzyCandidate>,
}

impl SkillOntology {
    /// The table compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_ONTOLOGY)
    }

    /// Load a TOML or JSON ontology file, chosen by extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::OntologyLoad(format!("Cannot read {}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let ontology = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        log::info!(
            "Loaded skill ontology {} ({} skills) from {}",
            ontology.version,
            ontology.len(),
            path.display()
        );
        Ok(ontology)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: OntologyFile = toml::from_str(content)
            .map_err(|e| EngineError::OntologyLoad(format!("Invalid ontology TOML: {}", e)))?;
        Self::from_entries(file.version, file.skills)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: OntologyFile = serde_json::from_str(content)
            .map_err(|e| EngineError::OntologyLoad(format!("Invalid ontology JSON: {}", e)))?;
        Self::from_entries(file.version, file.skills)
    }

    pub fn from_entries(version: impl Into<String>, mut entries: Vec<SkillOntologyEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(EngineError::OntologyLoad("Ontology contains no skills".to_string()));
        }

        for entry in &mut entries {
            entry.canonical_id = entry.canonical_id.trim().to_string();
            if entry.canonical_id.is_empty() {
                return Err(EngineError::OntologyLoad(
                    "Ontology entry with empty canonical_id".to_string(),
                ));
            }
            if entry.display_name.trim().is_empty() {
                return Err(EngineError::OntologyLoad(format!(
                    "Skill '{}' has no display name",
                    entry.canonical_id
                )));
            }
            if !entry.default_weight.is_finite() || !(0.0..=1.0).contains(&entry.default_weight) {
                return Err(EngineError::OntologyLoad(format!(
                    "Skill '{}' has default_weight {} outside [0, 1]",
                    entry.canonical_id, entry.default_weight
                )));
            }
        }

        entries.sort_by(|a, b| a.canonical_id.cmp(&b.canonical_id));

        let mut by_id = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            if by_id.insert(entry.canonical_id.clone(), idx).is_some() {
                return Err(EngineError::OntologyLoad(format!(
                    "Duplicate canonical_id '{}'",
                    entry.canonical_id
                )));
            }
        }

        let processor = TextProcessor::new();
        let mut phrases: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        let mut compact: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        let mut fuzzy: BTreeSet<(String, usize)> = BTreeSet::new();

        for (idx, entry) in entries.iter().enumerate() {
            for term in entry.terms() {
                let key = processor.phrase_key(term);
                if key.is_empty() {
                    continue;
                }
                let token_count = key.split(' ').count();
                if token_count <= 2 {
                    fuzzy.insert((key.clone(), idx));
                }
                phrases.entry(key).or_default().insert(idx);

                let compact_key = processor.compact_key(term);
                if !compact_key.is_empty() {
                    compact.entry(compact_key).or_default().insert(idx);
                }
            }
        }

        let patterns: Vec<AliasPattern> = phrases
            .into_iter()
            .map(|(key, ids)| AliasPattern {
                key,
                entries: ids.into_iter().collect(),
            })
            .collect();

        let matcher = AhoCorasick::new(patterns.iter().map(|p| p.key.as_str()))
            .map_err(|e| EngineError::OntologyLoad(format!("Failed to build alias matcher: {}", e)))?;

        let compact_index = compact
            .into_iter()
            .map(|(key, ids)| (key, ids.into_iter().collect()))
            .collect();

        let fuzzy_candidates = fuzzy
            .into_iter()
            .map(|(key, entry)| FuzzyCandidate {
                token_count: key.split(' ').count(),
                key,
                entry,
            })
            .collect();

        Ok(Self {
            version: version.into(),
            entries,
            by_id,
            patterns,
            matcher,
            compact_index,
            fuzzy_candidates,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries sorted by canonical id
    pub fn entries(&self) -> &[SkillOntologyEntry] {
        &self.entries
    }

    pub fn get(&self, canonical_id: &str) -> Option<&SkillOntologyEntry> {
        self.by_id.get(canonical_id).map(|&idx| &self.entries[idx])
    }

    pub fn display_name<'a>(&'a self, canonical_id: &'a str) -> &'a str {
        self.get(canonical_id)
            .map(|entry| entry.display_name.as_str())
            .unwrap_or(canonical_id)
    }

    pub(crate) fn entry(&self, idx: usize) -> &SkillOntologyEntry {
        &self.entries[idx]
    }

    pub(crate) fn matcher(&self) -> &AhoCorasick {
        &self.matcher
    }

    pub(crate) fn pattern(&self, pattern_idx: usize) -> &AliasPattern {
        &self.patterns[pattern_idx]
    }

    /// Entries whose separator-free alias equals `compact_key`
    pub fn lookup_compact(&self, compact_key: &str) -> &[usize] {
        self.compact_index
            .get(compact_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn fuzzy_candidates(&self) -> &[FuzzyCandidate] {
        &self.fuzzy_candidates
    }

    /// Tie-break between entries claiming the same text: higher default weight,
    /// then alphabetically first canonical id
    pub fn compare_preference(&self, a: usize, b: usize) -> Ordering {
        let (ea, eb) = (&self.entries[a], &self.entries[b]);
        ea.default_weight
            .total_cmp(&eb.default_weight)
            .then_with(|| eb.canonical_id.cmp(&ea.canonical_id))
    }

    pub fn preferred(&self, candidates: &[usize]) -> Option<usize> {
        candidates
            .iter()
            .copied()
            .max_by(|&a, &b| self.compare_preference(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn entry(id: &str, aliases: &[&str], weight: f32) -> SkillOntologyEntry {
        SkillOntologyEntry {
            canonical_id: id.to_string(),
            display_name: id.to_uppercase(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            category: SkillCategory::Other,
            default_weight: weight,
        }
    }

    #[test]
    fn test_builtin_ontology_loads() {
        let ontology = SkillOntology::builtin().unwrap();
        assert!(ontology.len() >= 80);
        assert_eq!(ontology.version(), "2024.1");

        let k8s = ontology.get("kubernetes").unwrap();
        assert!(k8s.aliases.contains("k8s"));
        assert_eq!(k8s.category, SkillCategory::Devops);
        assert_eq!(ontology.display_name("golang"), "Go");
    }

    #[test]
    fn test_builtin_entries_are_sorted_and_weighted() {
        let ontology = SkillOntology::builtin().unwrap();
        let ids: Vec<&str> = ontology.entries().iter().map(|e| e.canonical_id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert!(ontology
            .entries()
            .iter()
            .all(|e| (0.0..=1.0).contains(&e.default_weight)));
    }

    #[test]
    fn test_compact_lookup() {
        let ontology = SkillOntology::builtin().unwrap();
        let hits = ontology.lookup_compact("nodejs");
        assert_eq!(hits.len(), 1);
        assert_eq!(ontology.entry(hits[0]).canonical_id, "nodejs");
        assert!(ontology.lookup_compact("notaskill").is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = SkillOntology::from_entries(
            "t",
            vec![entry("python", &[], 0.5), entry("python", &["py"], 0.6)],
        );
        assert!(matches!(result, Err(EngineError::OntologyLoad(_))));
    }

    #[test]
    fn test_weight_out_of_range_rejected() {
        let result = SkillOntology::from_entries("t", vec![entry("python", &[], 1.5)]);
        assert!(matches!(result, Err(EngineError::OntologyLoad(_))));
    }

    #[test]
    fn test_empty_ontology_rejected() {
        assert!(SkillOntology::from_entries("t", Vec::new()).is_err());
    }

    #[test]
    fn test_corrupt_toml_rejected() {
        let result = SkillOntology::from_toml_str("[[skills]]\ncanonical_id = ");
        assert!(matches!(result, Err(EngineError::OntologyLoad(_))));
    }

    #[test]
    fn test_missing_file_is_ontology_error() {
        let result = SkillOntology::from_path(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(EngineError::OntologyLoad(_))));
    }

    #[test]
    fn test_json_file_loads() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(
            file,
            r#"{{"version": "j1", "skills": [{{"id": "rust", "display_name": "Rust", "aliases": ["rustlang"], "category": "programming_language", "default_weight": 0.9}}]}}"#
        )
        .unwrap();

        let ontology = SkillOntology::from_path(file.path()).unwrap();
        assert_eq!(ontology.version(), "j1");
        assert_eq!(ontology.get("rust").unwrap().default_weight, 0.9);
    }

    #[test]
    fn test_preference_tie_break() {
        let ontology = SkillOntology::from_entries(
            "t",
            vec![
                entry("alpha", &["shared"], 0.4),
                entry("beta", &["shared"], 0.7),
                entry("gamma", &["shared"], 0.7),
            ],
        )
        .unwrap();

        let ids: Vec<usize> = (0..3).collect();
        let winner = ontology.preferred(&ids).unwrap();
        assert_eq!(ontology.entry(winner).canonical_id, "beta");
    }
}
