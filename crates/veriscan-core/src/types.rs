//! Core types for veriscan

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Default width of the semantic embedding block
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Number of sentence-level stylometric features
pub const STYLOMETRIC_DIM: usize = 13;

/// Number of chunk-level perplexity features
pub const PERPLEXITY_DIM: usize = 1;

/// An ordered, 1-indexed sentence of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Position within the document, starting at 1
    pub index: usize,

    /// Sentence text
    pub text: String,
}

impl Sentence {
    /// Create a new sentence
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// A contiguous window of sentences sharing one embedding and perplexity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk within the document, starting at 0
    pub index: usize,

    /// Range of member sentences as 0-based positions in the sentence list
    pub range: Range<usize>,

    /// Space-joined member sentence text
    pub text: String,
}

impl Chunk {
    /// Member sentences of this chunk
    pub fn members<'a>(&self, sentences: &'a [Sentence]) -> &'a [Sentence] {
        &sentences[self.range.clone()]
    }

    /// Number of member sentences
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the chunk has no members
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Column layout of a feature row.
///
/// `[embedding (E)] ++ [stylometry (13)] ++ [perplexity (1)]`. The order is
/// the pretrained classifier's training-time layout and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLayout {
    /// Width E of the embedding block
    pub embedding_dim: usize,
}

impl FeatureLayout {
    /// Create a layout for the given embedding width
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    /// Total row width, E + 14
    pub fn width(&self) -> usize {
        self.embedding_dim + STYLOMETRIC_DIM + PERPLEXITY_DIM
    }

    /// Offset of the first stylometric column
    pub fn stylometry_offset(&self) -> usize {
        self.embedding_dim
    }

    /// Offset of the perplexity column
    pub fn perplexity_offset(&self) -> usize {
        self.embedding_dim + STYLOMETRIC_DIM
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

/// A fixed-width numeric row fed to the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Concatenate the three feature blocks in layout order.
    ///
    /// The embedding block is zero-padded or truncated to the layout's
    /// embedding width, so the row width is always `layout.width()`.
    pub fn assemble(
        layout: &FeatureLayout,
        embedding: &[f32],
        stylometry: &[f32; STYLOMETRIC_DIM],
        perplexity: f32,
    ) -> Self {
        let mut row = Vec::with_capacity(layout.width());
        let take = embedding.len().min(layout.embedding_dim);
        row.extend_from_slice(&embedding[..take]);
        row.resize(layout.embedding_dim, 0.0);
        row.extend_from_slice(stylometry);
        row.push(perplexity);
        Self(row)
    }

    /// Raw values
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Row width
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the raw values
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Classifier output for one row, as fractions summing to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub human: f32,
    pub ai: f32,
    pub over_polished: f32,
}

impl ClassProbabilities {
    pub fn new(human: f32, ai: f32, over_polished: f32) -> Self {
        Self {
            human,
            ai,
            over_polished,
        }
    }

    /// Rescale to percent for the labeling rules
    pub fn to_percent(&self) -> PercentScores {
        PercentScores {
            human: f64::from(self.human) * 100.0,
            ai: f64::from(self.ai) * 100.0,
            polish: f64::from(self.over_polished) * 100.0,
        }
    }
}

/// Per-sentence probabilities scaled to percent (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentScores {
    pub human: f64,
    pub ai: f64,
    pub polish: f64,
}

impl PercentScores {
    /// Arguments follow the field order: human, ai, polish
    pub fn new(human: f64, ai: f64, polish: f64) -> Self {
        Self { human, ai, polish }
    }
}

/// Authorship label for a sentence or a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "Human")]
    Human,
    #[serde(rename = "AI")]
    Ai,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "Human",
            Self::Ai => "AI",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result for one sentence, in report form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceResult {
    /// 1-based sentence position
    pub index: usize,
    pub sentence: String,
    pub human_probability: f64,
    pub ai_probability: f64,
    pub over_polished_probability: f64,
    pub final_label: Label,
}

/// Document-level summary of all sentence results
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentVerdict {
    pub overall_human_pct: f64,
    pub overall_ai_pct: f64,
    pub label: Label,
}

/// Complete classification of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub overall_human_probability: f64,
    pub overall_ai_probability: f64,
    pub final_document_label: Label,
    pub sentences: Vec<SentenceResult>,
    pub sentences_processed: usize,
    pub sentences_received: usize,
}

/// Round to two decimals for presentation
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
