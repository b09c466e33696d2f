//! Scan log records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use veriscan_core::Label;

/// One completed classification, as stored in a user's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Unique record ID
    pub id: String,

    #[serde(rename = "uid")]
    pub user_id: String,

    pub scanned_text: String,

    /// Document label
    pub result: Label,

    pub ai_percent: f64,
    pub human_percent: f64,
    pub timestamp: DateTime<Utc>,
}

impl ScanRecord {
    /// Record stamped with a fresh ID and the current time
    pub fn new(
        user_id: impl Into<String>,
        scanned_text: impl Into<String>,
        result: Label,
        ai_percent: f64,
        human_percent: f64,
    ) -> Self {
        Self {
            id: format!("scan_{}", uuid::Uuid::new_v4()),
            user_id: user_id.into(),
            scanned_text: scanned_text.into(),
            result,
            ai_percent,
            human_percent,
            timestamp: Utc::now(),
        }
    }

    /// Override the timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let record = ScanRecord::new("user-1", "Some text.", Label::Ai, 61.5, 30.25);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["uid"], "user-1");
        assert_eq!(json["result"], "AI");
        assert_eq!(json["ai_percent"], 61.5);
        assert!(json["id"].as_str().unwrap().starts_with("scan_"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = ScanRecord::new("u", "t", Label::Human, 0.0, 100.0);
        let b = ScanRecord::new("u", "t", Label::Human, 0.0, 100.0);
        assert_ne!(a.id, b.id);
    }
}
