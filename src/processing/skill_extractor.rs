//! Multi-strategy skill extraction against the ontology.
//!
//! Four detectors run over the same text: exact alias matching (Aho-Corasick
//! over normalized tokens), context patterns ("experience with ..."), a
//! capitalization-based entity detector, and fuzzy matching for typos. Their
//! detections are merged per canonical skill into a single mention.

use crate::config::ExtractionConfig;
use crate::error::EngineError;
use crate::processing::document::{section_at, NormalizedDocument};
use crate::processing::ontology::SkillOntology;
use crate::processing::text_processor::{TextProcessor, Token};
use crate::processing::types::{DetectionSource, EvidenceSpan, SectionMap, SkillMention};
use log::{debug, trace};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

const MAX_PATTERN_PREFIX_TOKENS: usize = 4;
const MAX_ENTITY_TOKENS: usize = 3;
const FUZZY_MAX_LENGTH_DIFF: usize = 2;

#[derive(Debug, Clone, Copy)]
struct Detection {
    entry: usize,
    source: DetectionSource,
    start: usize,
    end: usize,
    quality: f32,
}

#[derive(Debug, Clone)]
pub struct SkillExtractor {
    ontology: Arc<SkillOntology>,
    config: ExtractionConfig,
    processor: TextProcessor,
    context_patterns: Vec<Regex>,
    list_separator: Regex,
}

impl SkillExtractor {
    pub fn new(ontology: Arc<SkillOntology>, config: ExtractionConfig) -> Self {
        let context_patterns = vec![
            Regex::new(
                r"(?i)\b(?:experience|experienced|proficient|proficiency|skilled|expertise|fluent|familiar|familiarity|knowledge)\s+(?:with|in|using|of)\s+([^.;:\n]{1,120})",
            )
            .expect("valid experience pattern"),
            Regex::new(
                r"(?i)\b(?:tech\s+stack|stack|technologies|tools|languages|frameworks)\s*:\s*([^.\n]{1,160})",
            )
            .expect("valid stack pattern"),
            Regex::new(
                r"(?i)\b(?:built|developed|implemented|designed|wrote|created|deployed)\s+(?:[\w-]+\s+){0,4}?(?:using|with|in|on)\s+([^.;:\n]{1,120})",
            )
            .expect("valid built-with pattern"),
            Regex::new(r"(?i)\bcertified\s+(?:in|as)\s+([^.;\n]{1,80})")
                .expect("valid certification pattern"),
        ];

        Self {
            ontology,
            config,
            processor: TextProcessor::new(),
            context_patterns,
            list_separator: Regex::new(r"(?i)\s*(?:[,/;|&()]|\band\b|\bor\b)\s*")
                .expect("valid list separator"),
        }
    }

    pub fn ontology(&self) -> &SkillOntology {
        &self.ontology
    }

    pub fn extract_document(&self, document: &NormalizedDocument) -> Vec<SkillMention> {
        self.extract(document.text(), document.sections())
    }

    /// Mentions sorted by canonical id; empty text yields no mentions
    pub fn extract(&self, text: &str, sections: &SectionMap) -> Vec<SkillMention> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let tokens = self.processor.tokenize(text);
        let mut covered = vec![false; tokens.len()];
        let mut detections = self.detect_exact(&tokens, &mut covered);
        detections.extend(self.detect_patterns(text));
        detections.extend(self.detect_entities(text, &tokens, &mut covered));
        detections.extend(self.detect_fuzzy(text, &tokens, &covered));

        trace!("{} raw skill detections", detections.len());
        self.merge(text, &detections, sections)
    }

    fn detect_exact(&self, tokens: &[Token], covered: &mut [bool]) -> Vec<Detection> {
        let mut haystack = String::new();
        let mut token_starts = HashMap::with_capacity(tokens.len());
        let mut token_ends = HashMap::with_capacity(tokens.len());
        for (idx, token) in tokens.iter().enumerate() {
            if idx > 0 {
                haystack.push(' ');
            }
            token_starts.insert(haystack.len(), idx);
            haystack.push_str(&token.normalized);
            token_ends.insert(haystack.len(), idx);
        }

        // (first token, last token, pattern)
        let mut candidates: Vec<(usize, usize, usize)> = self
            .ontology
            .matcher()
            .find_overlapping_iter(&haystack)
            .filter_map(|m| {
                let first = *token_starts.get(&m.start())?;
                let last = *token_ends.get(&m.end())?;
                Some((first, last, m.pattern().as_usize()))
            })
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0).then((b.1 - b.0).cmp(&(a.1 - a.0))));

        let mut detections = Vec::new();
        let mut next_free = 0;
        for (first, last, pattern_idx) in candidates {
            if first < next_free {
                continue;
            }
            next_free = last + 1;

            let pattern = self.ontology.pattern(pattern_idx);
            let Some(entry) = self.resolve(&pattern.entries, &pattern.key) else {
                continue;
            };
            covered[first..=last].iter_mut().for_each(|c| *c = true);
            detections.push(Detection {
                entry,
                source: DetectionSource::Exact,
                start: tokens[first].span.start,
                end: tokens[last].span.end,
                quality: 1.0,
            });
        }
        detections
    }

    fn detect_patterns(&self, text: &str) -> Vec<Detection> {
        let mut detections = Vec::new();

        for pattern in &self.context_patterns {
            for caps in pattern.captures_iter(text) {
                let Some(list) = caps.get(1) else { continue };
                for (piece_offset, piece) in self.split_list(list.as_str()) {
                    let base = list.start() + piece_offset;
                    if let Some((entry, start, end)) = self.resolve_prefix(piece) {
                        detections.push(Detection {
                            entry,
                            source: DetectionSource::Pattern,
                            start: base + start,
                            end: base + end,
                            quality: 1.0,
                        });
                    }
                }
            }
        }
        detections
    }

    fn split_list<'t>(&self, list: &'t str) -> Vec<(usize, &'t str)> {
        let mut pieces = Vec::new();
        let mut last = 0;
        for sep in self.list_separator.find_iter(list) {
            pieces.push((last, &list[last..sep.start()]));
            last = sep.end();
        }
        pieces.push((last, &list[last..]));
        pieces.retain(|(_, piece)| !piece.trim().is_empty());
        pieces
    }

    /// Longest leading run of tokens whose compact form names a skill
    fn resolve_prefix(&self, piece: &str) -> Option<(usize, usize, usize)> {
        let tokens = self.processor.tokenize(piece);
        let max = tokens.len().min(MAX_PATTERN_PREFIX_TOKENS);
        for n in (1..=max).rev() {
            let (start, end) = (tokens[0].span.start, tokens[n - 1].span.end);
            let key = self.processor.compact_key(&piece[start..end]);
            let candidates = self.ontology.lookup_compact(&key);
            if let Some(entry) = self.resolve(candidates, &key) {
                return Some((entry, start, end));
            }
        }
        None
    }

    fn detect_entities(&self, text: &str, tokens: &[Token], covered: &mut [bool]) -> Vec<Detection> {
        let mut detections = Vec::new();
        let mut idx = 0;

        while idx < tokens.len() {
            if !is_entity_like(&text[tokens[idx].span.clone()]) {
                idx += 1;
                continue;
            }

            let mut run_end = idx + 1;
            while run_end < tokens.len()
                && is_entity_like(&text[tokens[run_end].span.clone()])
                && text[tokens[run_end - 1].span.end..tokens[run_end].span.start]
                    .chars()
                    .all(char::is_whitespace)
            {
                run_end += 1;
            }

            let mut pos = idx;
            while pos < run_end {
                let max = (run_end - pos).min(MAX_ENTITY_TOKENS);
                let mut consumed = 1;
                for n in (1..=max).rev() {
                    if covered[pos..pos + n].iter().any(|&c| c) {
                        continue;
                    }
                    let (start, end) = (tokens[pos].span.start, tokens[pos + n - 1].span.end);
                    let key = self.processor.compact_key(&text[start..end]);
                    if let Some(entry) = self.resolve(self.ontology.lookup_compact(&key), &key) {
                        covered[pos..pos + n].iter_mut().for_each(|c| *c = true);
                        detections.push(Detection {
                            entry,
                            source: DetectionSource::Ner,
                            start,
                            end,
                            quality: 1.0,
                        });
                        consumed = n;
                        break;
                    }
                }
                pos += consumed;
            }
            idx = run_end;
        }
        detections
    }

    fn detect_fuzzy(&self, text: &str, tokens: &[Token], covered: &[bool]) -> Vec<Detection> {
        let mut used = covered.to_vec();
        let mut detections = Vec::new();

        for idx in 0..tokens.len().saturating_sub(1) {
            if used[idx] || used[idx + 1] {
                continue;
            }
            let gap = &text[tokens[idx].span.end..tokens[idx + 1].span.start];
            if !gap.chars().all(char::is_whitespace) {
                continue;
            }
            let key = format!("{} {}", tokens[idx].normalized, tokens[idx + 1].normalized);
            if let Some((entry, similarity)) = self.best_fuzzy(&key, 2) {
                used[idx] = true;
                used[idx + 1] = true;
                detections.push(Detection {
                    entry,
                    source: DetectionSource::Fuzzy,
                    start: tokens[idx].span.start,
                    end: tokens[idx + 1].span.end,
                    quality: similarity,
                });
            }
        }

        for (idx, token) in tokens.iter().enumerate() {
            if used[idx] || token.normalized.chars().count() < self.config.fuzzy_min_token_len {
                continue;
            }
            if let Some((entry, similarity)) = self.best_fuzzy(&token.normalized, 1) {
                detections.push(Detection {
                    entry,
                    source: DetectionSource::Fuzzy,
                    start: token.span.start,
                    end: token.span.end,
                    quality: similarity,
                });
            }
        }
        detections
    }

    fn best_fuzzy(&self, key: &str, token_count: usize) -> Option<(usize, f32)> {
        let key_len = key.chars().count();
        let mut best: Option<(usize, f32)> = None;

        for candidate in self.ontology.fuzzy_candidates() {
            if candidate.token_count != token_count {
                continue;
            }
            let candidate_len = candidate.key.chars().count();
            if candidate_len < self.config.fuzzy_min_token_len
                || candidate_len.abs_diff(key_len) > FUZZY_MAX_LENGTH_DIFF
            {
                continue;
            }

            let similarity = strsim::normalized_levenshtein(key, &candidate.key) as f32;
            if similarity < self.config.fuzzy_threshold {
                continue;
            }

            best = match best {
                Some((entry, score))
                    if score > similarity
                        || (score == similarity
                            && self.ontology.compare_preference(entry, candidate.entry).is_ge()) =>
                {
                    Some((entry, score))
                }
                _ => Some((candidate.entry, similarity)),
            };
        }
        best
    }

    /// Pick one entry from the candidates claiming `text`, logging ambiguity
    fn resolve(&self, candidates: &[usize], text: &str) -> Option<usize> {
        let chosen = self.ontology.preferred(candidates)?;
        if candidates.len() > 1 {
            let ids: Vec<&str> = candidates
                .iter()
                .map(|&idx| self.ontology.entry(idx).canonical_id.as_str())
                .collect();
            debug!(
                "{}",
                EngineError::AmbiguousSkillMatch(format!(
                    "'{}' matches {:?}, using '{}'",
                    text,
                    ids,
                    self.ontology.entry(chosen).canonical_id
                ))
            );
        }
        Some(chosen)
    }

    fn base_confidence(&self, source: DetectionSource) -> f32 {
        match source {
            DetectionSource::Exact => self.config.exact_confidence,
            DetectionSource::Pattern => self.config.pattern_confidence,
            DetectionSource::Ner => self.config.ner_confidence,
            DetectionSource::Fuzzy => self.config.fuzzy_confidence,
        }
    }

    fn merge(&self, text: &str, detections: &[Detection], sections: &SectionMap) -> Vec<SkillMention> {
        let mut by_entry: BTreeMap<usize, Vec<&Detection>> = BTreeMap::new();
        for detection in detections {
            by_entry.entry(detection.entry).or_default().push(detection);
        }

        by_entry
            .into_iter()
            .map(|(entry, group)| self.merge_group(text, entry, &group, sections))
            .collect()
    }

    fn merge_group(
        &self,
        text: &str,
        entry: usize,
        group: &[&Detection],
        sections: &SectionMap,
    ) -> SkillMention {
        // source -> start offset -> best quality
        let mut per_source: BTreeMap<DetectionSource, BTreeMap<usize, f32>> = BTreeMap::new();
        let mut spans: BTreeMap<usize, (usize, f32)> = BTreeMap::new();

        for detection in group {
            let offsets = per_source.entry(detection.source).or_default();
            let quality = offsets.entry(detection.start).or_insert(0.0);
            *quality = quality.max(detection.quality);

            let span = spans.entry(detection.start).or_insert((detection.end, 0.0));
            if detection.quality > span.1 {
                *span = (detection.end, detection.quality);
            }
        }

        let mut best: Option<(DetectionSource, f32)> = None;
        for (source, offsets) in &per_source {
            let best_quality = offsets.values().copied().fold(0.0f32, f32::max);
            let single = self.base_confidence(*source) * best_quality;
            let repeated = 1.0 - (1.0 - single).powi(offsets.len() as i32);
            let confidence = repeated.min(self.config.frequency_cap);
            if best.map_or(true, |(_, current)| confidence > current) {
                best = Some((*source, confidence));
            }
        }
        let (source, best_confidence) = best.unwrap_or((DetectionSource::Exact, 0.0));

        let corroboration =
            self.config.corroboration_bonus * per_source.len().saturating_sub(1) as f32;
        let in_skills_section = spans.keys().any(|&start| {
            section_at(sections, start).map_or(false, |name| name.contains("skill"))
        });
        let section_bonus = if in_skills_section {
            self.config.skills_section_bonus
        } else {
            0.0
        };
        let confidence = (best_confidence + corroboration + section_bonus).clamp(0.0, 1.0);

        let occurrence_sections: BTreeSet<&str> = spans
            .keys()
            .filter_map(|&start| section_at(sections, start))
            .collect();

        let mut evidence: Vec<EvidenceSpan> = spans
            .into_iter()
            .map(|(start, (end, quality))| EvidenceSpan {
                text: text[start..end].to_string(),
                start,
                end,
                quality,
                section: section_at(sections, start).map(str::to_string),
            })
            .collect();
        evidence.sort_by(|a, b| b.quality.total_cmp(&a.quality).then(a.start.cmp(&b.start)));
        evidence.truncate(self.config.max_evidence);

        SkillMention {
            canonical_id: self.ontology.entry(entry).canonical_id.clone(),
            confidence,
            source,
            sources: per_source.keys().copied().collect(),
            evidence,
            sections: occurrence_sections.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Capitalized, CamelCase, all-caps, alphanumeric or dotted/symbolic tokens
fn is_entity_like(raw: &str) -> bool {
    let mut chars = raw.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let has_alpha = raw.chars().any(char::is_alphabetic);
    let has_digit = raw.chars().any(|c| c.is_ascii_digit());

    first.is_uppercase()
        || chars.any(char::is_uppercase)
        || (has_alpha && has_digit)
        || raw.contains(['.', '+', '#'])
}
