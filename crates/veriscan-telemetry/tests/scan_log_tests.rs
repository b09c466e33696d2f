//! JSON-lines scan log behavior on disk

use chrono::{Duration, Utc};
use std::sync::Arc;
use veriscan_core::Label;
use veriscan_telemetry::{JsonLinesScanLog, ScanLogSink, ScanRecord, DEFAULT_HISTORY_LIMIT};

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scans.jsonl");

    {
        let log = JsonLinesScanLog::new(&path).unwrap();
        let earlier = Utc::now() - Duration::hours(1);
        log.record(ScanRecord::new("alice", "first", Label::Human, 20.0, 80.0).at(earlier))
            .await
            .unwrap();
        log.record(ScanRecord::new("alice", "second", Label::Ai, 70.0, 25.0))
            .await
            .unwrap();
        log.record(ScanRecord::new("bob", "elsewhere", Label::Human, 1.0, 99.0))
            .await
            .unwrap();
    }

    let log = JsonLinesScanLog::new(&path).unwrap();
    let history = log.history("alice", DEFAULT_HISTORY_LIMIT).await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].scanned_text, "second");
    assert_eq!(history[0].result, Label::Ai);
    assert_eq!(history[1].scanned_text, "first");
}

#[tokio::test]
async fn test_malformed_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scans.jsonl");

    let log = JsonLinesScanLog::new(&path).unwrap();
    log.record(ScanRecord::new("alice", "kept", Label::Human, 5.0, 95.0))
        .await
        .unwrap();

    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("{not json\n\n");
    std::fs::write(&path, content).unwrap();

    let history = log.history("alice", 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].scanned_text, "kept");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_do_not_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(JsonLinesScanLog::new(dir.path().join("scans.jsonl")).unwrap());

    let mut handles = Vec::new();
    for i in 0..32 {
        let log = log.clone();
        handles.push(tokio::spawn(async move {
            let text = format!("document {} {}", i, "x".repeat(512));
            log.record(ScanRecord::new("alice", text, Label::Human, 10.0, 90.0))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let history = log.history("alice", DEFAULT_HISTORY_LIMIT).await.unwrap();
    assert_eq!(history.len(), 32);
}
