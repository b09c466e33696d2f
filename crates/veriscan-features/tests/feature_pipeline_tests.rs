//! Feature pipeline tests with deterministic mock backends
//!
//! No model downloads: embeddings and perplexity come from mocks that
//! count their calls, so chunk sharing and memoization can be asserted.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use veriscan_core::{Error, Result};
use veriscan_features::{
    build_chunks, Embedder, EmbeddingBackend, FeatureAssembler, PerplexityScorer,
    SentenceSegmenter,
};

/// Embeds a span as `[chars, words, 1.0]`
struct CountingBackend {
    calls: AtomicU32,
    fail: bool,
}

impl CountingBackend {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail: true,
        }
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingBackend for CountingBackend {
    fn name(&self) -> &str {
        "counting"
    }

    fn embed_span(&self, span: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::classifier("simulated inference failure"));
        }
        Ok(vec![
            span.chars().count() as f32,
            span.split_whitespace().count() as f32,
            1.0,
        ])
    }
}

/// Perplexity equal to the number of words
struct WordCountPerplexity {
    calls: AtomicU32,
}

impl PerplexityScorer for WordCountPerplexity {
    fn name(&self) -> &str {
        "word-count"
    }

    fn score(&self, text: &str) -> Result<f32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(text.split_whitespace().count() as f32)
    }
}

const DOCUMENT: &str = "One two three. Four five. Six seven eight nine. Ten.";

fn assembler_with(
    backend: Arc<CountingBackend>,
    scorer: Arc<WordCountPerplexity>,
) -> FeatureAssembler {
    let embedder = Embedder::new(backend, 4, 2000, 16);
    FeatureAssembler::new(embedder, scorer, 16).unwrap()
}

#[test]
fn test_sentences_in_a_chunk_share_embedding_and_perplexity() {
    let backend = Arc::new(CountingBackend::new());
    let scorer = Arc::new(WordCountPerplexity {
        calls: AtomicU32::new(0),
    });
    let assembler = assembler_with(backend.clone(), scorer.clone());

    let sentences = SentenceSegmenter::new().unwrap().segment(DOCUMENT).unwrap();
    let chunks = build_chunks(&sentences, 2);
    assert_eq!(chunks.len(), 2);

    let batch = assembler.assemble(&sentences, &chunks);
    let layout = assembler.layout();
    let rows: Vec<&[f32]> = batch.rows.iter().map(|r| r.as_slice()).collect();

    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[0][..4], &rows[1][..4]);
    assert_eq!(&rows[2][..4], &rows[3][..4]);
    assert_ne!(&rows[0][..4], &rows[2][..4]);

    // Chunk 0 is "One two three. Four five." -> 5 words
    assert_eq!(rows[0][layout.perplexity_offset()], 5.0);
    assert_eq!(rows[1][layout.perplexity_offset()], 5.0);
    assert_eq!(rows[3][layout.perplexity_offset()], 5.0);

    // Stylometry is per sentence
    assert_eq!(rows[0][layout.stylometry_offset()], 3.0);
    assert_eq!(rows[1][layout.stylometry_offset()], 2.0);

    assert_eq!(backend.call_count(), 2);
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_repeated_document_hits_caches() {
    let backend = Arc::new(CountingBackend::new());
    let scorer = Arc::new(WordCountPerplexity {
        calls: AtomicU32::new(0),
    });
    let assembler = assembler_with(backend.clone(), scorer.clone());

    let sentences = SentenceSegmenter::new().unwrap().segment(DOCUMENT).unwrap();
    let chunks = build_chunks(&sentences, 15);

    let first = assembler.assemble(&sentences, &chunks);
    let second = assembler.assemble(&sentences, &chunks);

    assert_eq!(
        first.rows.iter().map(|r| r.as_slice()).collect::<Vec<_>>(),
        second.rows.iter().map(|r| r.as_slice()).collect::<Vec<_>>()
    );
    assert_eq!(backend.call_count(), 1);
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);

    let stats = assembler.cache_stats();
    assert_eq!(stats.embedding.hits, 1);
    assert_eq!(stats.perplexity.hits, 1);

    assembler.reset_caches();
    assembler.assemble(&sentences, &chunks);
    assert_eq!(backend.call_count(), 2);
}

#[test]
fn test_backend_failure_degrades_and_is_retried() {
    let backend = Arc::new(CountingBackend::failing());
    let scorer = Arc::new(WordCountPerplexity {
        calls: AtomicU32::new(0),
    });
    let assembler = assembler_with(backend.clone(), scorer);

    let sentences = SentenceSegmenter::new().unwrap().segment(DOCUMENT).unwrap();
    let chunks = build_chunks(&sentences, 3);

    let batch = assembler.assemble(&sentences, &chunks);
    assert_eq!(batch.rows.len(), sentences.len());
    assert_eq!(batch.degraded_chunks, 2);

    let layout = assembler.layout();
    for row in &batch.rows {
        assert_eq!(row.len(), layout.width());
        assert!(row.as_slice()[..4].iter().all(|v| *v == 0.0));
        assert!(row.as_slice()[layout.stylometry_offset()] > 0.0);
    }

    // Failures are not memoized, so the next request tries again
    assembler.assemble(&sentences, &chunks);
    assert_eq!(backend.call_count(), 4);
}

/// Always fails, counting attempts
struct UnavailablePerplexity {
    calls: AtomicU32,
}

impl PerplexityScorer for UnavailablePerplexity {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn score(&self, _text: &str) -> Result<f32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::classifier("language model offline"))
    }
}

#[test]
fn test_perplexity_failure_is_zero_and_retried() {
    let scorer = Arc::new(UnavailablePerplexity {
        calls: AtomicU32::new(0),
    });
    let assembler = FeatureAssembler::new(
        Embedder::new(Arc::new(CountingBackend::new()), 4, 2000, 16),
        scorer.clone(),
        16,
    )
    .unwrap();

    let sentences = SentenceSegmenter::new().unwrap().segment(DOCUMENT).unwrap();
    let chunks = build_chunks(&sentences, 15);

    let batch = assembler.assemble(&sentences, &chunks);
    let perplexity_col = assembler.layout().perplexity_offset();
    assert!(batch.rows.iter().all(|row| row.as_slice()[perplexity_col] == 0.0));
    assert_eq!(assembler.cache_stats().perplexity.entries, 0);

    assembler.assemble(&sentences, &chunks);
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 2);
}
