//! Veriscan Telemetry
//!
//! What happened to each request after it was classified:
//! - Scan records and the sinks that store them (in memory or as JSON lines)
//! - A user's recent scan history, newest first
//! - Request, sentence, degradation and latency counters

pub mod metrics;
pub mod record;
pub mod scan_log;

pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use record::ScanRecord;
pub use scan_log::{InMemoryScanLog, JsonLinesScanLog, ScanLogSink, DEFAULT_HISTORY_LIMIT};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::MetricsCollector;
    pub use crate::record::ScanRecord;
    pub use crate::scan_log::ScanLogSink;
}
