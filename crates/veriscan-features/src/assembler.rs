//! Feature assembly
//!
//! Each sentence row is `[chunk embedding] ++ [sentence stylometry] ++
//! [chunk perplexity]`. The heavy chunk-level values are computed once per
//! chunk and memoized by chunk text; stylometry is computed per sentence.

use crate::cache::{BoundedCache, CacheStats};
use crate::config::FeatureConfig;
use crate::embedding::{Embedder, EmbeddingOutcome};
use crate::perplexity::{build_scorer, DisabledPerplexity, PerplexityScorer};
use crate::stylometry::StylometricAnalyzer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use veriscan_core::{Chunk, FeatureLayout, FeatureVector, Result, Sentence};

/// Feature rows for one document
#[derive(Debug, Clone)]
pub struct FeatureBatch {
    /// One row per sentence, in document order
    pub rows: Vec<FeatureVector>,

    /// Chunks whose embedding fell back to zeros after a backend failure
    pub degraded_chunks: usize,
}

/// Statistics of both chunk-level caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCacheStats {
    pub embedding: CacheStats,
    pub perplexity: CacheStats,
}

/// Builds classifier rows from sentences and chunks
pub struct FeatureAssembler {
    layout: FeatureLayout,
    embedder: Embedder,
    perplexity: Arc<dyn PerplexityScorer>,
    perplexity_cache: BoundedCache<f32>,
    stylometry: StylometricAnalyzer,
}

impl FeatureAssembler {
    pub fn new(
        embedder: Embedder,
        perplexity: Arc<dyn PerplexityScorer>,
        perplexity_capacity: usize,
    ) -> Result<Self> {
        Ok(Self {
            layout: FeatureLayout::new(embedder.dimension()),
            embedder,
            perplexity,
            perplexity_cache: BoundedCache::new(perplexity_capacity),
            stylometry: StylometricAnalyzer::new()?,
        })
    }

    /// Build from configuration. Fails with `BackendUnavailable` when an
    /// enabled backend's artifacts cannot be resolved.
    pub fn from_config(config: &FeatureConfig) -> Result<Self> {
        config.validate()?;

        let embedder = Embedder::from_config(&config.embedding, config.cache.embedding_capacity)?;
        let perplexity = build_scorer(&config.perplexity)?;

        info!(
            embedding_backend = embedder.backend_name(),
            embedding_dim = embedder.dimension(),
            perplexity = perplexity.name(),
            "Feature assembler ready"
        );

        Self::new(embedder, perplexity, config.cache.perplexity_capacity)
    }

    /// An assembler with zero embeddings and no perplexity, for tests and
    /// offline stylometry
    pub fn stylometry_only(embedding_dim: usize) -> Result<Self> {
        Self::new(
            Embedder::disabled(embedding_dim, 0),
            Arc::new(DisabledPerplexity),
            0,
        )
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    /// One row per sentence, in order. Never fails: embedding and
    /// perplexity failures degrade to zeros and are logged.
    pub fn assemble(&self, sentences: &[Sentence], chunks: &[Chunk]) -> FeatureBatch {
        let mut rows = Vec::with_capacity(sentences.len());
        let mut degraded_chunks = 0;

        for chunk in chunks {
            let embedding = self.embed_chunk(chunk);
            if embedding.failure().is_some() {
                degraded_chunks += 1;
            }
            let perplexity = self.chunk_perplexity(&chunk.text);

            for sentence in chunk.members(sentences) {
                let style = self.stylometry.analyze(&sentence.text);
                rows.push(FeatureVector::assemble(
                    &self.layout,
                    embedding.vector(),
                    &style,
                    perplexity,
                ));
            }
        }

        debug!(
            sentences = sentences.len(),
            chunks = chunks.len(),
            degraded_chunks,
            "Assembled feature rows"
        );

        FeatureBatch {
            rows,
            degraded_chunks,
        }
    }

    /// Single row for a whole text: its own embedding, stylometry and
    /// perplexity
    pub fn span_features(&self, text: &str) -> FeatureVector {
        let embedding = self.embedder.embed(text);
        if let Some(reason) = embedding.failure() {
            warn!(reason, "Span embedding degraded to zeros");
        }
        let style = self.stylometry.analyze(text);
        let perplexity = self.chunk_perplexity(text);
        FeatureVector::assemble(&self.layout, embedding.vector(), &style, perplexity)
    }

    fn embed_chunk(&self, chunk: &Chunk) -> EmbeddingOutcome {
        let outcome = self.embedder.embed(&chunk.text);
        if let Some(reason) = outcome.failure() {
            warn!(
                chunk = chunk.index,
                sentences = chunk.len(),
                reason,
                "Chunk embedding degraded to zeros"
            );
        }
        outcome
    }

    fn chunk_perplexity(&self, text: &str) -> f32 {
        self.perplexity_cache
            .get_or_try_insert_with(text, || match self.perplexity.score(text) {
                Ok(value) if value.is_finite() => Ok(value),
                Ok(value) => {
                    warn!(value, "Non-finite perplexity replaced with 0");
                    Err(())
                }
                Err(e) => {
                    warn!(error = %e, "Perplexity scoring failed, using 0");
                    Err(())
                }
            })
            .unwrap_or(0.0)
    }

    /// Load model sessions eagerly
    pub fn warmup(&self) -> Result<()> {
        self.embedder.warmup()?;
        self.perplexity.warmup()?;
        Ok(())
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    pub fn cache_stats(&self) -> FeatureCacheStats {
        FeatureCacheStats {
            embedding: self.embedder.cache_stats(),
            perplexity: self.perplexity_cache.stats(),
        }
    }

    /// Empty both chunk-level caches and zero their counters
    pub fn reset_caches(&self) {
        self.embedder.clear_cache();
        self.perplexity_cache.clear();
    }
}

impl std::fmt::Debug for FeatureAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureAssembler")
            .field("layout", &self.layout)
            .field("embedder", &self.embedder)
            .field("perplexity", &self.perplexity.name())
            .finish()
    }
}
