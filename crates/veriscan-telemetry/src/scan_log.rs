//! Scan log sinks
//!
//! Records are written only after a successful classification. Reads return
//! a user's records newest first.

use crate::record::ScanRecord;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use veriscan_core::{Error, Result};

/// Records returned by a history query when no limit is given
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Storage for completed scans
#[async_trait]
pub trait ScanLogSink: Send + Sync {
    /// Append one record
    async fn record(&self, record: ScanRecord) -> Result<()>;

    /// Up to `limit` of the user's records, newest first
    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<ScanRecord>>;
}

/// Newest first; records with equal timestamps keep reverse insertion order
fn newest_first(mut records: Vec<ScanRecord>, limit: usize) -> Vec<ScanRecord> {
    records.reverse();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(limit);
    records
}

/// Process-local scan log
#[derive(Debug, Default)]
pub struct InMemoryScanLog {
    records: RwLock<Vec<ScanRecord>>,
}

impl InMemoryScanLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl ScanLogSink for InMemoryScanLog {
    async fn record(&self, record: ScanRecord) -> Result<()> {
        self.records.write().push(record);
        Ok(())
    }

    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<ScanRecord>> {
        let records = self
            .records
            .read()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(records, limit))
    }
}

/// Append-only JSON-lines file, one record per line
pub struct JsonLinesScanLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesScanLog {
    /// Use `path`, creating its parent directory if needed
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::config(format!(
                    "Failed to create scan log directory {:?}: {}",
                    parent, e
                ))
            })?;
        }

        info!(path = %path.display(), "Scan log opened");
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ScanLogSink for JsonLinesScanLog {
    async fn record(&self, record: ScanRecord) -> Result<()> {
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(id = %record.id, "Scan record appended");
        Ok(())
    }

    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<ScanRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ScanRecord>(line) {
                Ok(record) if record.user_id == user_id => records.push(record),
                Ok(_) => {}
                Err(e) => warn!(line = number + 1, error = %e, "Skipping malformed scan record"),
            }
        }

        Ok(newest_first(records, limit))
    }
}

impl std::fmt::Debug for JsonLinesScanLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesScanLog")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use veriscan_core::Label;

    fn record(user: &str, text: &str, minutes_ago: i64) -> ScanRecord {
        ScanRecord::new(user, text, Label::Human, 10.0, 90.0)
            .at(Utc::now() - Duration::minutes(minutes_ago))
    }

    #[tokio::test]
    async fn test_in_memory_history_is_per_user_and_newest_first() {
        let log = InMemoryScanLog::new();
        log.record(record("alice", "old", 30)).await.unwrap();
        log.record(record("bob", "other", 5)).await.unwrap();
        log.record(record("alice", "new", 1)).await.unwrap();
        log.record(record("alice", "middle", 10)).await.unwrap();

        let history = log.history("alice", DEFAULT_HISTORY_LIMIT).await.unwrap();
        let texts: Vec<&str> = history.iter().map(|r| r.scanned_text.as_str()).collect();
        assert_eq!(texts, vec!["new", "middle", "old"]);

        let limited = log.history("alice", 2).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert!(log.history("carol", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_timestamp_latest_insert_first() {
        let log = InMemoryScanLog::new();
        let now = Utc::now();
        log.record(record("alice", "first", 0).at(now)).await.unwrap();
        log.record(record("alice", "second", 0).at(now)).await.unwrap();

        let history = log.history("alice", 10).await.unwrap();
        assert_eq!(history[0].scanned_text, "second");
    }

    #[tokio::test]
    async fn test_json_lines_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonLinesScanLog::new(dir.path().join("logs/scans.jsonl")).unwrap();
        assert!(log.history("alice", 10).await.unwrap().is_empty());
    }
}
