//! Chunk embeddings
//!
//! The [`Embedder`] turns a chunk of text into a fixed-width vector. It
//! cleans the text, splits it into character spans the backend can digest,
//! fits every span vector to the configured width and averages them.
//! Inference failures never fail the request: they produce a zero vector
//! tagged with the reason, which the caller logs.

#[cfg(feature = "ml-models")]
mod bert;

#[cfg(feature = "ml-models")]
pub use bert::BertBackend;

use crate::cache::{BoundedCache, CacheStats};
use crate::config::{EmbeddingBackendKind, EmbeddingConfig};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use veriscan_core::Result;

/// A model that maps one span of cleaned text to a vector
pub trait EmbeddingBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Embed one span. The returned width may differ from the configured
    /// dimension; the caller pads or truncates.
    fn embed_span(&self, span: &str) -> Result<Vec<f32>>;

    /// Load sessions eagerly
    fn warmup(&self) -> Result<()> {
        Ok(())
    }
}

/// Why an embedding is a zero vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedReason {
    /// No backend is configured
    Disabled,
    /// Nothing left after cleaning
    EmptyText,
    /// The backend failed on some span
    BackendFailure(String),
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("embedding backend disabled"),
            Self::EmptyText => f.write_str("text empty after cleaning"),
            Self::BackendFailure(msg) => write!(f, "backend failure: {}", msg),
        }
    }
}

/// Result of embedding one text
#[derive(Debug, Clone)]
pub enum EmbeddingOutcome {
    Computed(Arc<[f32]>),
    Degraded {
        vector: Arc<[f32]>,
        reason: DegradedReason,
    },
}

impl EmbeddingOutcome {
    fn degraded(dimension: usize, reason: DegradedReason) -> Self {
        Self::Degraded {
            vector: vec![0.0; dimension].into(),
            reason,
        }
    }

    /// The vector, real or zero
    pub fn vector(&self) -> &[f32] {
        match self {
            Self::Computed(vector) | Self::Degraded { vector, .. } => &vector[..],
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The failure reason, if the backend failed
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Degraded {
                reason: DegradedReason::BackendFailure(msg),
                ..
            } => Some(msg),
            _ => None,
        }
    }
}

/// Lowercase, collapse whitespace, drop everything except word characters,
/// whitespace and `.,!?`, then trim
pub fn clean_text(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            if !in_space {
                collapsed.push(' ');
            }
            in_space = true;
        } else {
            collapsed.push(c);
            in_space = false;
        }
    }

    collapsed
        .chars()
        .filter(|&c| c.is_alphanumeric() || matches!(c, '_' | ' ' | '.' | ',' | '!' | '?'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Consecutive pieces of at most `span_chars` characters
pub fn char_spans(text: &str, span_chars: usize) -> Vec<&str> {
    let starts: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .step_by(span_chars.max(1))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(k, &start)| {
            let end = starts.get(k + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}

/// Memoizing, degrading front end over an [`EmbeddingBackend`]
pub struct Embedder {
    backend: Option<Arc<dyn EmbeddingBackend>>,
    dimension: usize,
    span_chars: usize,
    cache: BoundedCache<EmbeddingOutcome>,
}

impl Embedder {
    pub fn new(
        backend: Arc<dyn EmbeddingBackend>,
        dimension: usize,
        span_chars: usize,
        cache_capacity: usize,
    ) -> Self {
        Self {
            backend: Some(backend),
            dimension,
            span_chars,
            cache: BoundedCache::new(cache_capacity),
        }
    }

    /// An embedder that always yields zero vectors
    pub fn disabled(dimension: usize, cache_capacity: usize) -> Self {
        Self {
            backend: None,
            dimension,
            span_chars: 1,
            cache: BoundedCache::new(cache_capacity),
        }
    }

    /// Build from configuration, resolving model artifacts for active backends.
    ///
    /// Fails with `BackendUnavailable` when artifacts cannot be located.
    pub fn from_config(config: &EmbeddingConfig, cache_capacity: usize) -> Result<Self> {
        if !config.is_active() {
            info!("Embedding backend disabled, using zero vectors");
            return Ok(Self::disabled(config.dimension, cache_capacity));
        }

        match config.backend {
            EmbeddingBackendKind::Bert => {
                let backend = Self::bert_backend(config)?;
                Ok(Self::new(
                    backend,
                    config.dimension,
                    config.span_chars,
                    cache_capacity,
                ))
            }
            EmbeddingBackendKind::Disabled => Ok(Self::disabled(config.dimension, cache_capacity)),
        }
    }

    #[cfg(feature = "ml-models")]
    fn bert_backend(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingBackend>> {
        Ok(Arc::new(BertBackend::from_config(config)?))
    }

    #[cfg(not(feature = "ml-models"))]
    fn bert_backend(_config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingBackend>> {
        Err(veriscan_core::Error::backend_unavailable(
            "BERT backend requires the ml-models feature",
        ))
    }

    /// Embed `text`, memoized by the raw text.
    ///
    /// Backend failures yield an uncached zero vector tagged with the error.
    pub fn embed(&self, text: &str) -> EmbeddingOutcome {
        self.cache
            .get_or_try_insert_with(text, || {
                let outcome = self.compute(text);
                if outcome.failure().is_some() {
                    Err(outcome)
                } else {
                    Ok(outcome)
                }
            })
            .unwrap_or_else(|degraded| degraded)
    }

    fn compute(&self, text: &str) -> EmbeddingOutcome {
        let Some(backend) = &self.backend else {
            return EmbeddingOutcome::degraded(self.dimension, DegradedReason::Disabled);
        };

        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return EmbeddingOutcome::degraded(self.dimension, DegradedReason::EmptyText);
        }

        let spans = char_spans(&cleaned, self.span_chars);
        let mut sum = vec![0.0f32; self.dimension];
        for span in &spans {
            match backend.embed_span(span) {
                Ok(vector) => {
                    for (acc, v) in sum.iter_mut().zip(vector.iter()) {
                        *acc += v;
                    }
                }
                Err(e) => {
                    return EmbeddingOutcome::degraded(
                        self.dimension,
                        DegradedReason::BackendFailure(e.to_string()),
                    );
                }
            }
        }

        let n = spans.len() as f32;
        sum.iter_mut().for_each(|v| *v /= n);
        debug!(spans = spans.len(), backend = backend.name(), "Computed embedding");
        EmbeddingOutcome::Computed(sum.into())
    }

    /// Load the backend session now instead of on first use
    pub fn warmup(&self) -> Result<()> {
        match &self.backend {
            Some(backend) => {
                backend.warmup()?;
                info!(backend = backend.name(), "Embedding backend warmed up");
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn backend_name(&self) -> &str {
        self.backend.as_ref().map_or("disabled", |b| b.name())
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl fmt::Debug for Embedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Embedder")
            .field("backend", &self.backend_name())
            .field("dimension", &self.dimension)
            .field("span_chars", &self.span_chars)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use veriscan_core::Error;

    /// Embeds a span as `[chars, 1.0]`
    struct LengthBackend {
        calls: AtomicUsize,
    }

    impl EmbeddingBackend for LengthBackend {
        fn name(&self) -> &str {
            "length"
        }

        fn embed_span(&self, span: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![span.chars().count() as f32, 1.0])
        }
    }

    struct FailingBackend;

    impl EmbeddingBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn embed_span(&self, _span: &str) -> Result<Vec<f32>> {
            Err(Error::classifier("session crashed"))
        }
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Hello,\n\tWORLD!  (really) "), "hello, world! really");
        assert_eq!(clean_text("a - b"), "a  b");
        assert_eq!(clean_text("@#$%"), "");
    }

    #[test]
    fn test_char_spans_respect_char_boundaries() {
        assert_eq!(char_spans("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(char_spans("héllo", 2), vec!["hé", "ll", "o"]);
        assert!(char_spans("", 3).is_empty());
    }

    #[test]
    fn test_spans_are_averaged_and_fitted() {
        let backend = Arc::new(LengthBackend {
            calls: AtomicUsize::new(0),
        });
        let embedder = Embedder::new(backend.clone(), 4, 3, 8);

        // "abcdefg" -> spans of 3, 3, 1 chars
        let outcome = embedder.embed("abcdefg");
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.vector(), &[7.0 / 3.0, 1.0, 0.0, 0.0]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_embedding_is_memoized() {
        let backend = Arc::new(LengthBackend {
            calls: AtomicUsize::new(0),
        });
        let embedder = Embedder::new(backend.clone(), 2, 100, 8);

        embedder.embed("same chunk");
        embedder.embed("same chunk");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(embedder.cache_stats().hits, 1);

        embedder.clear_cache();
        embedder.embed("same chunk");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failure_degrades_without_caching() {
        let embedder = Embedder::new(Arc::new(FailingBackend), 5, 100, 8);
        let outcome = embedder.embed("some text");

        assert!(outcome.is_degraded());
        assert_eq!(outcome.vector(), &[0.0; 5]);
        assert!(outcome.failure().is_some_and(|m| m.contains("session crashed")));
        assert_eq!(embedder.cache_stats().entries, 0);
    }

    #[test]
    fn test_disabled_and_empty_yield_zeros() {
        let disabled = Embedder::disabled(3, 8);
        assert_eq!(disabled.embed("text").vector(), &[0.0; 3]);
        assert_eq!(disabled.backend_name(), "disabled");

        let backend = Arc::new(LengthBackend {
            calls: AtomicUsize::new(0),
        });
        let embedder = Embedder::new(backend.clone(), 3, 10, 8);
        let outcome = embedder.embed("%%%");
        assert!(matches!(
            outcome,
            EmbeddingOutcome::Degraded {
                reason: DegradedReason::EmptyText,
                ..
            }
        ));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }
}
