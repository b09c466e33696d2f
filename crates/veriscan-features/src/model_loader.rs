//! Artifact resolution for Candle-based encoders and language models
//!
//! A model is three files: `config.json`, `tokenizer.json` and
//! `model.safetensors`. They come either from a local directory or from a
//! Hugging Face Hub repository. When downloads are disabled the local Hub
//! cache is consulted instead, so a pre-seeded cache keeps working offline.

use hf_hub::{api::sync::Api, Cache, Repo, RepoType};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use veriscan_core::{Error, Result};

/// Model configuration file name
pub const CONFIG_FILE: &str = "config.json";

/// Tokenizer definition file name
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Weights file name
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// Source location for model artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Directory on the local file system
    LocalPath(PathBuf),

    /// Hugging Face Hub repository
    HuggingFace { repo_id: String, revision: String },
}

impl ModelSource {
    /// Short human-readable identifier for logs
    pub fn describe(&self) -> String {
        match self {
            Self::LocalPath(path) => path.display().to_string(),
            Self::HuggingFace { repo_id, revision } => format!("{}@{}", repo_id, revision),
        }
    }
}

/// Device type for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize),
    /// Metal (Apple Silicon)
    Metal(usize),
}

/// Resolved on-disk paths of a model's artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifacts {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelArtifacts {
    /// Locate all artifacts for `source`.
    ///
    /// Fails with [`Error::BackendUnavailable`] naming what is missing.
    pub fn resolve(source: &ModelSource, allow_download: bool) -> Result<Self> {
        match source {
            ModelSource::LocalPath(dir) => Self::from_dir(dir),
            ModelSource::HuggingFace { repo_id, revision } => {
                if allow_download {
                    Self::from_hub(repo_id, revision)
                } else {
                    Self::from_hub_cache(repo_id, revision)
                }
            }
        }
    }

    /// Artifacts from a local directory
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::backend_unavailable(format!(
                "Model directory not found: {:?}",
                dir
            )));
        }

        let artifacts = Self {
            config: dir.join(CONFIG_FILE),
            tokenizer: dir.join(TOKENIZER_FILE),
            weights: dir.join(WEIGHTS_FILE),
        };

        let missing = artifacts.missing();
        if !missing.is_empty() {
            return Err(Error::backend_unavailable(format!(
                "Model directory {:?} is missing: {}",
                dir,
                missing.join(", ")
            )));
        }

        debug!(dir = %dir.display(), "Resolved local model artifacts");
        Ok(artifacts)
    }

    fn from_hub(repo_id: &str, revision: &str) -> Result<Self> {
        let api = Api::new()
            .map_err(|e| Error::backend_unavailable(format!("Failed to initialize HF API: {}", e)))?;

        let repo = api.repo(Repo::with_revision(
            repo_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));

        let fetch = |filename: &str| {
            repo.get(filename).map_err(|e| {
                Error::backend_unavailable(format!(
                    "Failed to download {} from {}: {}",
                    filename, repo_id, e
                ))
            })
        };

        let artifacts = Self {
            config: fetch(CONFIG_FILE)?,
            tokenizer: fetch(TOKENIZER_FILE)?,
            weights: fetch(WEIGHTS_FILE)?,
        };

        info!(repo = repo_id, revision, "Resolved model artifacts from Hugging Face Hub");
        Ok(artifacts)
    }

    fn from_hub_cache(repo_id: &str, revision: &str) -> Result<Self> {
        let cache = Cache::default();
        let repo = cache.repo(Repo::with_revision(
            repo_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));

        let cached = |filename: &str| {
            repo.get(filename).ok_or_else(|| {
                Error::backend_unavailable(format!(
                    "{} for {}@{} is not cached locally and downloads are disabled",
                    filename, repo_id, revision
                ))
            })
        };

        Ok(Self {
            config: cached(CONFIG_FILE)?,
            tokenizer: cached(TOKENIZER_FILE)?,
            weights: cached(WEIGHTS_FILE)?,
        })
    }

    fn missing(&self) -> Vec<&'static str> {
        [
            (CONFIG_FILE, &self.config),
            (TOKENIZER_FILE, &self.tokenizer),
            (WEIGHTS_FILE, &self.weights),
        ]
        .into_iter()
        .filter(|(_, path)| !path.is_file())
        .map(|(name, _)| name)
        .collect()
    }
}

/// A model session built on first use and kept for the process lifetime
pub struct LazyModel<T> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> Default for LazyModel<T> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<T> LazyModel<T> {
    /// Return the loaded session, running `load` once if needed.
    ///
    /// A failed load leaves the slot empty so the next call retries.
    pub fn get_or_try_load(&self, load: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        if let Some(session) = self.slot.read().as_ref() {
            return Ok(Arc::clone(session));
        }

        let mut slot = self.slot.write();
        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }

        let session = Arc::new(load()?);
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().is_some()
    }
}

/// Create Candle device from device type
#[cfg(feature = "ml-models")]
pub fn create_device(device_type: DeviceType) -> Result<candle_core::Device> {
    use candle_core::Device;

    match device_type {
        DeviceType::Cpu => Ok(Device::Cpu),
        DeviceType::Cuda(idx) => Device::new_cuda(idx)
            .map_err(|e| Error::backend_unavailable(format!("Failed to create CUDA device: {}", e))),
        DeviceType::Metal(idx) => Device::new_metal(idx)
            .map_err(|e| Error::backend_unavailable(format!("Failed to create Metal device: {}", e))),
    }
}
