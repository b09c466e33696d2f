//! Veriscan Service
//!
//! The quota-gated entry point to the detection pipeline.
//!
//! [`DetectionService::classify`] validates and segments the text, debits
//! one quota token, runs feature extraction and inference off the async
//! runtime and records the scan. Uploads go through [`UploadHandler`] first.
//! [`build_service`] resolves everything from a [`ServiceConfig`] at startup.

pub mod bootstrap;
pub mod config;
pub mod quota;
pub mod service;
pub mod upload;

pub use bootstrap::{build_detector, build_scan_log, build_service};
pub use config::ServiceConfig;
pub use quota::{InMemoryQuotaGate, QuotaGate};
pub use service::{ClassifyResponse, DetectionService};
pub use upload::{DocumentFormat, ExtractedText, PlainTextExtractor, TextExtractor, UploadHandler};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::ServiceConfig;
    pub use crate::quota::QuotaGate;
    pub use crate::service::{ClassifyResponse, DetectionService};
    pub use crate::upload::{TextExtractor, UploadHandler};
}
