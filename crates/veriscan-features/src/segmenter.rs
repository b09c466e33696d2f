//! Sentence segmentation for English prose
//!
//! Boundaries inside a paragraph come from sakurs' English rules, which keep
//! abbreviations, initials and decimals together but still split after an
//! abbreviation when the next word starts a new sentence. Blank lines always
//! separate sentences so headings stay on their own.

use sakurs_core::{Input, SentenceProcessor};
use std::sync::Arc;
use tracing::warn;
use veriscan_core::{Error, InputError, Result, Sentence};

/// Splits text into ordered sentences
#[derive(Clone)]
pub struct SentenceSegmenter {
    processor: Arc<SentenceProcessor>,
}

impl SentenceSegmenter {
    pub fn new() -> Result<Self> {
        let processor = SentenceProcessor::with_language("en")
            .map_err(|e| Error::config(format!("Failed to build sentence processor: {}", e)))?;
        Ok(Self {
            processor: Arc::new(processor),
        })
    }

    /// Segment a document into 1-indexed sentences.
    ///
    /// Fails with `EmptyInput` for blank text and `NoSentencesFound` when no
    /// segment contains a letter or digit.
    pub fn segment(&self, text: &str) -> Result<Vec<Sentence>> {
        if text.trim().is_empty() {
            return Err(InputError::EmptyInput.into());
        }

        let sentences: Vec<Sentence> = self
            .split(text)
            .into_iter()
            .enumerate()
            .map(|(i, s)| Sentence::new(i + 1, s))
            .collect();

        if sentences.is_empty() {
            return Err(InputError::NoSentencesFound.into());
        }
        Ok(sentences)
    }

    /// Split into trimmed sentence strings, dropping segments without any
    /// alphanumeric character
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        for paragraph in paragraphs(text) {
            self.split_paragraph(paragraph, &mut sentences);
        }
        sentences
    }

    fn split_paragraph(&self, paragraph: &str, out: &mut Vec<String>) {
        let output = match self.processor.process(Input::from_text(paragraph)) {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "Sentence boundary detection failed, keeping paragraph whole");
                push_sentence(out, paragraph);
                return;
            }
        };

        let mut start = 0;
        for boundary in &output.boundaries {
            if boundary.offset <= start {
                continue;
            }
            if let Some(sentence) = paragraph.get(start..boundary.offset) {
                push_sentence(out, sentence);
                start = boundary.offset;
            }
        }
        if let Some(rest) = paragraph.get(start..) {
            push_sentence(out, rest);
        }
    }
}

impl std::fmt::Debug for SentenceSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceSegmenter")
            .field("config", self.processor.config())
            .finish()
    }
}

/// Runs of non-blank lines
fn paragraphs(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut pos = 0;

    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                out.push(&text[s..end]);
            }
        } else {
            start.get_or_insert(pos);
            end = pos + line.len();
        }
        pos += line.len();
    }
    if let Some(s) = start {
        out.push(&text[s..end]);
    }
    out
}

fn push_sentence(out: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if trimmed.chars().any(char::is_alphanumeric) {
        out.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> Vec<String> {
        SentenceSegmenter::new().unwrap().split(text)
    }

    #[test]
    fn test_basic_split() {
        assert_eq!(
            split("The cat sat. The dog ran! Did it?"),
            vec!["The cat sat.", "The dog ran!", "Did it?"]
        );
    }

    #[test]
    fn test_abbreviation_before_sentence_starter_ends_sentence() {
        assert_eq!(
            split("Dr. Smith went to the U.S.A. He bought a new car. The car cost $25,000! Isn't that expensive?"),
            vec![
                "Dr. Smith went to the U.S.A.",
                "He bought a new car.",
                "The car cost $25,000!",
                "Isn't that expensive?",
            ]
        );
        assert_eq!(
            split("Work at Corp. He said it was fine."),
            vec!["Work at Corp.", "He said it was fine."]
        );
        assert_eq!(
            split("He moved to the U.S. He liked it."),
            vec!["He moved to the U.S.", "He liked it."]
        );
    }

    #[test]
    fn test_abbreviation_before_name_does_not_split() {
        assert_eq!(
            split("Call Dr. Johnson about the issue."),
            vec!["Call Dr. Johnson about the issue."]
        );
    }

    #[test]
    fn test_blank_line_is_a_boundary() {
        assert_eq!(
            split("Introduction\n\nThis is the body"),
            vec!["Introduction", "This is the body"]
        );
        assert_eq!(
            split("Title\n   \n\nFirst line\ncontinues here"),
            vec!["Title", "First line\ncontinues here"]
        );
    }

    #[test]
    fn test_trailing_text_without_terminator() {
        assert_eq!(split("no terminator at all"), vec!["no terminator at all"]);
    }

    #[test]
    fn test_paragraphs() {
        assert_eq!(paragraphs("a\n\n\nb\nc\n"), vec!["a\n", "b\nc\n"]);
        assert!(paragraphs(" \n\t\n").is_empty());
    }

    #[test]
    fn test_segment_indexes_from_one() {
        let sentences = SentenceSegmenter::new()
            .unwrap()
            .segment("A first. A second.")
            .unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].index, 1);
        assert_eq!(sentences[1].index, 2);
        assert_eq!(sentences[1].text, "A second.");
    }

    #[test]
    fn test_segment_errors() {
        let segmenter = SentenceSegmenter::new().unwrap();
        assert_eq!(segmenter.segment("   \n ").unwrap_err().code(), "EMPTY_TEXT");
        assert_eq!(segmenter.segment("... !!! ??").unwrap_err().code(), "NO_SENTENCES");
    }
}
