//! Text normalization and offset-preserving tokenization

use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// A token with its lookup form and byte span in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub normalized: String,
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct TextProcessor {
    stop_words: HashSet<&'static str>,
    inline_whitespace: Regex,
    blank_lines: Regex,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            inline_whitespace: Regex::new(r"[ \t\u{00A0}]+").expect("valid whitespace regex"),
            blank_lines: Regex::new(r"\n{3,}").expect("valid blank line regex"),
        }
    }

    /// Split text into tokens, keeping the characters that make up technical
    /// names ("c++", "c#", "node.js", "scikit-learn") inside a single token.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut start: Option<usize> = None;

        for (idx, ch) in text.char_indices() {
            if is_token_char(ch) {
                if start.is_none() {
                    start = Some(idx);
                }
            } else if let Some(token_start) = start.take() {
                push_token(text, token_start, idx, &mut tokens);
            }
        }
        if let Some(token_start) = start {
            push_token(text, token_start, text.len(), &mut tokens);
        }

        tokens
    }

    /// Case- and punctuation-normalized key for a phrase: tokens joined by a single space
    pub fn phrase_key(&self, phrase: &str) -> String {
        self.tokenize(phrase)
            .into_iter()
            .map(|t| t.normalized)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Separator-free key, so "Node JS", "node-js" and "NodeJS" compare equal
    pub fn compact_key(&self, phrase: &str) -> String {
        phrase
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '+' | '#'))
            .flat_map(char::to_lowercase)
            .collect()
    }

    /// Byte ranges of non-blank sentences
    pub fn sentence_spans(&self, text: &str) -> Vec<Range<usize>> {
        text.split_sentence_bound_indices()
            .filter_map(|(start, sentence)| {
                let trimmed = sentence.trim_end();
                let lead = trimmed.len() - trimmed.trim_start().len();
                if trimmed.trim().is_empty() {
                    None
                } else {
                    Some(start + lead..start + trimmed.len())
                }
            })
            .collect()
    }

    /// Lowercased content words, used by the hashing embedder
    pub fn content_words(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(|w| w.to_lowercase())
            .filter(|w| !self.stop_words.contains(w.as_str()))
            .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
            .collect()
    }

    /// Normalize typography and whitespace while keeping line structure intact
    pub fn normalize_text(&self, text: &str) -> String {
        let text = self.normalize_unicode(&text.replace("\r\n", "\n").replace('\r', "\n"));

        let lines: Vec<String> = text
            .lines()
            .map(|line| self.inline_whitespace.replace_all(line.trim(), " ").to_string())
            .collect();

        self.blank_lines
            .replace_all(&lines.join("\n"), "\n\n")
            .trim()
            .to_string()
    }

    fn normalize_unicode(&self, text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201C}' | '\u{201D}' => '"',
                '\u{2013}' | '\u{2014}' => '-',
                '\u{2022}' | '\u{2023}' | '\u{25E6}' => '•',
                '\u{2026}' => '.',
                _ => c,
            })
            .collect()
    }
}

fn is_token_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '+' | '#' | '.' | '-' | '_')
}

fn push_token(text: &str, start: usize, end: usize, tokens: &mut Vec<Token>) {
    let bytes = text.as_bytes();
    let mut core_start = start;
    let mut core_end = end;

    // sentence periods and dangling hyphens
    while core_end > core_start && matches!(bytes[core_end - 1], b'.' | b'-' | b'_') {
        core_end -= 1;
    }
    while core_start < core_end && matches!(bytes[core_start], b'-' | b'_' | b'+' | b'#') {
        core_start += 1;
    }
    // a leading dot survives only on dotted names like ".net"
    if core_start < core_end && bytes[core_start] == b'.' {
        let rest = &text[core_start + 1..core_end];
        if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_alphabetic()) {
            core_start += 1;
        }
    }
    if core_start >= core_end {
        return;
    }

    let core = &text[core_start..core_end];
    if !core.chars().any(char::is_alphanumeric) {
        return;
    }

    tokens.push(Token {
        normalized: core.to_lowercase(),
        span: core_start..core_end,
    });
}

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
    "it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "this", "but",
    "they", "have", "had", "what", "which", "she", "do", "how", "their", "if", "up", "out",
    "then", "them", "these", "so", "some", "her", "would", "into", "him", "more", "no",
    "could", "my", "than", "been", "who", "now", "did", "get", "may", "our", "we", "you",
    "your", "or", "not", "all", "can", "also", "i", "me", "us", "were", "there", "about",
];
