//! Service configuration
//!
//! Resolved once at startup from an optional YAML file followed by
//! environment overrides prefixed `VERISCAN__`, with `__` separating nested
//! keys (`VERISCAN__FEATURES__CHUNK_SIZE=10`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use veriscan_classifier::{DetectorSettings, DEFAULT_MAX_TEXT_CHARS};
use veriscan_core::{Error, Result};
use veriscan_features::FeatureConfig;
use veriscan_telemetry::DEFAULT_HISTORY_LIMIT;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "VERISCAN";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Maximum characters of trimmed input text
    pub max_text_chars: usize,

    /// Maximum upload size in bytes
    pub max_upload_bytes: usize,

    /// XGBoost JSON model file
    pub classifier_model_path: PathBuf,

    /// Load model sessions at startup instead of on first request
    pub warmup: bool,

    /// JSON-lines scan log; records are kept in memory when unset
    pub scan_log_path: Option<PathBuf>,

    /// Records returned by a history query
    pub history_limit: usize,

    pub features: FeatureConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            max_upload_bytes: 2 * 1024 * 1024,
            classifier_model_path: PathBuf::from("models/classifier.json"),
            warmup: false,
            scan_log_path: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            features: FeatureConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from `path` (if given) and the environment, then validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.is_file() {
                return Err(Error::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::config(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        debug!(?config, "Configuration resolved");
        Ok(config)
    }

    /// Parse YAML without environment overrides
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_text_chars == 0 {
            return Err(Error::config("max_text_chars must be at least 1"));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::config("max_upload_bytes must be at least 1"));
        }
        if self.history_limit == 0 {
            return Err(Error::config("history_limit must be at least 1"));
        }
        self.features.validate()
    }

    pub fn detector_settings(&self) -> DetectorSettings {
        DetectorSettings {
            chunk_size: self.features.chunk_size,
            max_text_chars: self.max_text_chars,
        }
    }

    /// Default scan log under the user's local data directory
    pub fn default_scan_log_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("veriscan").join("scans.jsonl"))
    }
}
