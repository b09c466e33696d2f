//! Veriscan Core
//!
//! Core types and error handling shared across veriscan components.
//!
//! This crate provides:
//! - Document units (sentences, chunks) and the classifier feature layout
//! - Per-sentence and per-document classification result types
//! - The error taxonomy with stable client-facing codes

pub mod error;
pub mod types;

pub use error::{Error, InputError, Result};
pub use types::{
    round2, Chunk, ClassProbabilities, ClassificationReport, DocumentVerdict, FeatureLayout,
    FeatureVector, Label, PercentScores, Sentence, SentenceResult, DEFAULT_EMBEDDING_DIM,
    PERPLEXITY_DIM, STYLOMETRIC_DIM,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, InputError, Result};
    pub use crate::types::{
        Chunk, ClassProbabilities, FeatureLayout, FeatureVector, Label, PercentScores, Sentence,
    };
}
