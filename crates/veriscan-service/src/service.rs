//! Quota-gated detection entry points
//!
//! A request is validated and segmented first, so malformed input never
//! costs a token. The debit happens next and is not refunded if the
//! pipeline fails afterwards. The pipeline itself runs on a blocking
//! thread, and a scan record is written in the background once it succeeds.

use crate::quota::QuotaGate;
use crate::upload::{ExtractedText, UploadHandler};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use veriscan_classifier::{Detector, PreparedDocument};
use veriscan_core::{ClassificationReport, Error, FeatureVector, Result};
use veriscan_telemetry::{MetricsCollector, MetricsSnapshot, ScanLogSink, ScanRecord};

/// Classification result returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    /// Balance after this request's debit
    pub tokens_left: u64,

    #[serde(flatten)]
    pub report: ClassificationReport,
}

/// The detector plus its collaborators
pub struct DetectionService {
    detector: Arc<Detector>,
    quota: Arc<dyn QuotaGate>,
    scan_log: Arc<dyn ScanLogSink>,
    uploads: UploadHandler,
    metrics: MetricsCollector,
    history_limit: usize,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl DetectionService {
    pub fn new(
        detector: Arc<Detector>,
        quota: Arc<dyn QuotaGate>,
        scan_log: Arc<dyn ScanLogSink>,
        uploads: UploadHandler,
        history_limit: usize,
    ) -> Self {
        Self {
            detector,
            quota,
            scan_log,
            uploads,
            metrics: MetricsCollector::new(),
            history_limit,
            pending_writes: Mutex::new(Vec::new()),
        }
    }

    /// Classify `text` on behalf of `user_id`, consuming one quota token
    pub async fn classify(&self, text: &str, user_id: &str) -> Result<ClassifyResponse> {
        let result = self.classify_inner(text, user_id).await;
        if let Err(e) = &result {
            self.metrics.record_failure(e.code());
        }
        result
    }

    /// Extract text from an upload and classify it
    pub async fn classify_upload(
        &self,
        filename: &str,
        bytes: &[u8],
        user_id: &str,
    ) -> Result<ClassifyResponse> {
        let text = match self.uploads.extract_upload(filename, bytes) {
            Ok(text) => text,
            Err(e) => {
                self.metrics.record_failure(e.code());
                return Err(e);
            }
        };
        self.classify(&text, user_id).await
    }

    async fn classify_inner(&self, text: &str, user_id: &str) -> Result<ClassifyResponse> {
        let doc = self.detector.prepare(text)?;
        let tokens_before = self.quota.debit_one_token(user_id).await?;

        let (analysis, doc) = self.run_pipeline(doc).await?;
        let report = analysis.report;

        self.metrics.record_classification(
            report.sentences_processed,
            analysis.degraded_chunks,
            analysis.elapsed,
        );

        self.log_scan(ScanRecord::new(
            user_id,
            doc.text(),
            report.final_document_label,
            report.overall_ai_probability,
            report.overall_human_probability,
        ));

        info!(
            user_id,
            sentences = report.sentences_processed,
            chunks = analysis.chunks,
            degraded_chunks = analysis.degraded_chunks,
            elapsed_ms = analysis.elapsed.as_millis() as u64,
            label = %report.final_document_label,
            "Classification complete"
        );

        Ok(ClassifyResponse {
            tokens_left: tokens_before.saturating_sub(1),
            report,
        })
    }

    async fn run_pipeline(
        &self,
        doc: PreparedDocument,
    ) -> Result<(veriscan_classifier::Analysis, PreparedDocument)> {
        let detector = self.detector.clone();
        tokio::task::spawn_blocking(move || {
            let analysis = detector.classify_prepared(&doc)?;
            Ok((analysis, doc))
        })
        .await
        .map_err(|e| Error::internal(format!("Classification task failed: {}", e)))?
    }

    fn log_scan(&self, record: ScanRecord) {
        let sink = self.scan_log.clone();
        let handle = tokio::spawn(async move {
            let id = record.id.clone();
            if let Err(e) = sink.record(record).await {
                warn!(id, error = %e, "Failed to write scan record");
            }
        });

        let mut pending = self.pending_writes.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait for background scan records to be written
    pub async fn flush(&self) {
        let handles: Vec<_> = self.pending_writes.lock().drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Scan record task failed");
            }
        }
    }

    /// Text of an upload, without classification or quota
    pub fn extract_text(&self, filename: &str, bytes: &[u8]) -> Result<ExtractedText> {
        self.uploads.extract_text(filename, bytes)
    }

    /// Classifier input rows for `text`, without quota
    pub async fn extract_features(&self, text: &str) -> Result<Vec<FeatureVector>> {
        let detector = self.detector.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || detector.extract_features(&text))
            .await
            .map_err(|e| Error::internal(format!("Feature extraction task failed: {}", e)))?
    }

    /// The user's most recent scans, newest first
    pub async fn history(&self, user_id: &str) -> Result<Vec<ScanRecord>> {
        self.scan_log.history(user_id, self.history_limit).await
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }
}

impl std::fmt::Debug for DetectionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionService")
            .field("detector", &self.detector)
            .field("uploads", &self.uploads)
            .field("history_limit", &self.history_limit)
            .finish()
    }
}
