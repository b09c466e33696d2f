//! Request metrics
//!
//! Counters are kept locally for snapshots and mirrored to the `metrics`
//! facade so an installed recorder can export them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared, cloneable counters for the detection service
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    requests: AtomicU64,
    failures: AtomicU64,
    sentences: AtomicU64,
    degraded_chunks: AtomicU64,
    total_latency_us: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Register metric descriptions with the installed recorder
    pub fn describe() {
        ::metrics::describe_counter!("veriscan_requests_total", "Classification requests completed");
        ::metrics::describe_counter!(
            "veriscan_failures_total",
            "Classification requests that failed, by error code"
        );
        ::metrics::describe_counter!("veriscan_sentences_total", "Sentences classified");
        ::metrics::describe_counter!(
            "veriscan_degraded_chunks_total",
            "Chunks whose embedding fell back to zeros"
        );
        ::metrics::describe_histogram!(
            "veriscan_pipeline_latency_us",
            ::metrics::Unit::Microseconds,
            "Feature extraction and inference latency"
        );
    }

    /// Record a completed classification
    pub fn record_classification(&self, sentences: usize, degraded_chunks: usize, latency: Duration) {
        let latency_us = latency.as_micros() as u64;

        self.inner.requests.fetch_add(1, Ordering::Relaxed);
        self.inner
            .sentences
            .fetch_add(sentences as u64, Ordering::Relaxed);
        self.inner
            .degraded_chunks
            .fetch_add(degraded_chunks as u64, Ordering::Relaxed);
        self.inner
            .total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);

        ::metrics::counter!("veriscan_requests_total").increment(1);
        ::metrics::counter!("veriscan_sentences_total").increment(sentences as u64);
        if degraded_chunks > 0 {
            ::metrics::counter!("veriscan_degraded_chunks_total").increment(degraded_chunks as u64);
        }
        ::metrics::histogram!("veriscan_pipeline_latency_us").record(latency_us as f64);
    }

    /// Record a failed request by error code
    pub fn record_failure(&self, code: &'static str) {
        self.inner.failures.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("veriscan_failures_total", "code" => code).increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.inner.requests.load(Ordering::Relaxed),
            failures: self.inner.failures.load(Ordering::Relaxed),
            sentences: self.inner.sentences.load(Ordering::Relaxed),
            degraded_chunks: self.inner.degraded_chunks.load(Ordering::Relaxed),
            total_latency_us: self.inner.total_latency_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MetricsCollector")
            .field(&self.snapshot())
            .finish()
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub failures: u64,
    pub sentences: u64,
    pub degraded_chunks: u64,
    pub total_latency_us: u64,
}

impl MetricsSnapshot {
    pub fn avg_latency_us(&self) -> u64 {
        if self.requests == 0 {
            0
        } else {
            self.total_latency_us / self.requests
        }
    }

    pub fn avg_sentences(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.sentences as f64 / self.requests as f64
        }
    }
}
