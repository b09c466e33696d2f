//! Process startup
//!
//! Every failure here is fatal: a missing classifier artifact, unresolvable
//! model files for an enabled backend, or a classifier whose input width
//! differs from the feature layout.

use crate::config::ServiceConfig;
use crate::quota::QuotaGate;
use crate::service::DetectionService;
use crate::upload::UploadHandler;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use veriscan_classifier::{Detector, GradientBoostedClassifier};
use veriscan_core::Result;
use veriscan_features::FeatureAssembler;
use veriscan_telemetry::{InMemoryScanLog, JsonLinesScanLog, ScanLogSink};

/// Load the classifier and feature backends and wire the detector
pub fn build_detector(config: &ServiceConfig) -> Result<Detector> {
    let start = Instant::now();

    let classifier = GradientBoostedClassifier::from_file(&config.classifier_model_path)?;
    let assembler = FeatureAssembler::from_config(&config.features)?;
    let detector = Detector::new(assembler, Arc::new(classifier), config.detector_settings())?;

    if config.warmup {
        detector.warmup()?;
    }

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        warmup = config.warmup,
        "Detector built"
    );
    Ok(detector)
}

/// Scan log sink selected by configuration
pub fn build_scan_log(config: &ServiceConfig) -> Result<Arc<dyn ScanLogSink>> {
    Ok(match &config.scan_log_path {
        Some(path) => Arc::new(JsonLinesScanLog::new(path)?),
        None => {
            info!("No scan log path configured, keeping scan records in memory");
            Arc::new(InMemoryScanLog::new())
        }
    })
}

/// Full service from configuration and a quota backend
pub fn build_service(config: &ServiceConfig, quota: Arc<dyn QuotaGate>) -> Result<DetectionService> {
    config.validate()?;

    let detector = Arc::new(build_detector(config)?);
    let scan_log = build_scan_log(config)?;

    Ok(DetectionService::new(
        detector,
        quota,
        scan_log,
        UploadHandler::new(config.max_upload_bytes),
        config.history_limit,
    ))
}
