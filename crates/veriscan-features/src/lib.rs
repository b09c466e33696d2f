//! Veriscan Features
//!
//! Turns a document into classifier feature rows.
//!
//! The pipeline splits text into sentences, groups them into fixed-size
//! chunks, embeds each chunk with a transformer encoder, scores chunk
//! perplexity with a causal language model and computes thirteen
//! stylometric statistics per sentence. Chunk-level values are memoized in
//! bounded LRU caches shared by all requests.
//!
//! Model inference runs on CPU (or CUDA/Metal) via Candle behind the
//! `ml-models` feature. Without it only the disabled backends are available.

pub mod assembler;
pub mod cache;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod model_loader;
pub mod perplexity;
pub mod segmenter;
pub mod stylometry;

pub use assembler::{FeatureAssembler, FeatureBatch, FeatureCacheStats};
pub use cache::{BoundedCache, CacheStats};
pub use chunker::build_chunks;
pub use config::{
    CacheConfig, DeviceSpec, EmbeddingBackendKind, EmbeddingConfig, FeatureConfig,
    ModelSourceSpec, PerplexityConfig,
};
pub use embedding::{clean_text, DegradedReason, Embedder, EmbeddingBackend, EmbeddingOutcome};
pub use model_loader::{DeviceType, ModelArtifacts, ModelSource};
pub use perplexity::{build_scorer, DisabledPerplexity, PerplexityScorer};
pub use segmenter::SentenceSegmenter;
pub use stylometry::{StyleProfile, StylometricAnalyzer};

#[cfg(feature = "ml-models")]
pub use embedding::BertBackend;
#[cfg(feature = "ml-models")]
pub use perplexity::Gpt2Perplexity;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::assembler::{FeatureAssembler, FeatureBatch};
    pub use crate::chunker::build_chunks;
    pub use crate::config::FeatureConfig;
    pub use crate::embedding::{Embedder, EmbeddingBackend};
    pub use crate::perplexity::PerplexityScorer;
    pub use crate::segmenter::SentenceSegmenter;
    pub use crate::stylometry::StylometricAnalyzer;
}
