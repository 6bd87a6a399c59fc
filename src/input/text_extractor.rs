//! Text extraction from supported file formats

use crate::error::Result;
use pulldown_cmark::{Event, Options, Parser, Tag};
use std::path::Path;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path).await?;
        Ok(content)
    }
}

/// Reads markdown and keeps only its text. Headings, paragraphs and list
/// items end up on their own lines so section detection still sees them.
pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let markdown_content = fs::read_to_string(path).await?;
        Ok(Self::strip_markup(&markdown_content))
    }
}

impl MarkdownExtractor {
    pub fn strip_markup(markdown: &str) -> String {
        let mut text = String::new();
        let mut in_code_block = false;

        for event in Parser::new_ext(markdown, Options::ENABLE_TABLES) {
            match event {
                // code listings are not prose and may hold lines that look like headers
                Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                Event::End(Tag::CodeBlock(_)) => {
                    in_code_block = false;
                    end_line(&mut text);
                }
                Event::Start(Tag::Item) => {
                    end_line(&mut text);
                    text.push_str("• ");
                }
                Event::Text(content) | Event::Code(content) if !in_code_block => {
                    text.push_str(&content);
                }
                Event::SoftBreak | Event::HardBreak | Event::Rule => end_line(&mut text),
                Event::End(Tag::Heading(..) | Tag::Paragraph | Tag::Item | Tag::TableHead | Tag::TableRow) => {
                    end_line(&mut text);
                }
                Event::End(Tag::TableCell) => text.push(' '),
                _ => {}
            }
        }

        text.lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn end_line(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}
