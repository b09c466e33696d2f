//! Configuration for feature extraction and model loading

use crate::model_loader::{DeviceType, ModelSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use veriscan_core::{Error, Result, DEFAULT_EMBEDDING_DIM};

/// Configuration for the whole feature pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Sentences per chunk
    pub chunk_size: usize,

    /// Embedding subsystem settings
    pub embedding: EmbeddingConfig,

    /// Perplexity scorer settings
    pub perplexity: PerplexityConfig,

    /// Memoization capacities
    pub cache: CacheConfig,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            chunk_size: 15,
            embedding: EmbeddingConfig::default(),
            perplexity: PerplexityConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl FeatureConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)
            .map_err(|e| Error::config(format!("Failed to parse feature config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the feature layout or chunking
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size must be at least 1"));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::config("embedding.dimension must be at least 1"));
        }
        if self.embedding.max_tokens == 0 || self.perplexity.max_tokens == 0 {
            return Err(Error::config("max_tokens must be at least 1"));
        }
        if self.embedding.span_chars == 0 {
            return Err(Error::config("embedding.span_chars must be at least 1"));
        }
        Ok(())
    }
}

/// Which inference backend produces embeddings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackendKind {
    /// BERT-style encoder run with Candle
    Bert,
    /// No inference; every embedding is a zero vector
    Disabled,
}

/// Embedding subsystem configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Master switch; false behaves like the disabled backend
    pub enabled: bool,

    /// Backend kind
    pub backend: EmbeddingBackendKind,

    /// Target width E of every embedding
    pub dimension: usize,

    /// Token budget per forward pass
    pub max_tokens: usize,

    /// Raw-character length of the sub-spans a long text is split into
    pub span_chars: usize,

    /// Where the encoder artifacts live
    pub source: ModelSourceSpec,

    /// Fetch missing artifacts from the Hugging Face Hub
    pub allow_download: bool,

    /// Inference device
    pub device: DeviceSpec,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: EmbeddingBackendKind::Bert,
            dimension: DEFAULT_EMBEDDING_DIM,
            max_tokens: 512,
            span_chars: 2000,
            source: ModelSourceSpec::HuggingFace {
                repo: "bert-base-uncased".to_string(),
                revision: default_revision(),
            },
            allow_download: true,
            device: DeviceSpec::Cpu,
        }
    }
}

impl EmbeddingConfig {
    /// Whether an inference backend must be loaded
    pub fn is_active(&self) -> bool {
        self.enabled && self.backend != EmbeddingBackendKind::Disabled
    }
}

/// Perplexity scorer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerplexityConfig {
    /// Compute perplexity; when false the column is always 0
    pub enabled: bool,

    /// Where the causal language model artifacts live
    pub source: ModelSourceSpec,

    /// Token budget per scored text
    pub max_tokens: usize,

    /// Fetch missing artifacts from the Hugging Face Hub
    pub allow_download: bool,

    /// Inference device
    pub device: DeviceSpec,
}

impl Default for PerplexityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source: ModelSourceSpec::HuggingFace {
                repo: "gpt2".to_string(),
                revision: default_revision(),
            },
            max_tokens: 512,
            allow_download: true,
            device: DeviceSpec::Cpu,
        }
    }
}

/// Capacities of the process-wide memoization caches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Chunk text -> embedding entries
    pub embedding_capacity: usize,

    /// Chunk text -> perplexity entries
    pub perplexity_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            embedding_capacity: 512,
            perplexity_capacity: 512,
        }
    }
}

/// Model source specification (for config files)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelSourceSpec {
    /// Directory holding config.json, tokenizer.json and model.safetensors
    Local { path: PathBuf },

    /// Hugging Face Hub repository
    HuggingFace {
        repo: String,
        #[serde(default = "default_revision")]
        revision: String,
    },
}

impl ModelSourceSpec {
    /// Convert to the runtime model source
    pub fn to_model_source(&self) -> ModelSource {
        match self {
            Self::Local { path } => ModelSource::LocalPath(path.clone()),
            Self::HuggingFace { repo, revision } => ModelSource::HuggingFace {
                repo_id: repo.clone(),
                revision: revision.clone(),
            },
        }
    }
}

fn default_revision() -> String {
    "main".to_string()
}

/// Device specification (for config files)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSpec {
    #[default]
    Cpu,
    Cuda {
        index: Option<usize>,
    },
    Metal {
        index: Option<usize>,
    },
}

impl DeviceSpec {
    /// Convert to DeviceType
    pub fn to_device_type(&self) -> DeviceType {
        match self {
            DeviceSpec::Cpu => DeviceType::Cpu,
            DeviceSpec::Cuda { index } => DeviceType::Cuda(index.unwrap_or(0)),
            DeviceSpec::Metal { index } => DeviceType::Metal(index.unwrap_or(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FeatureConfig::default();
        assert_eq!(config.chunk_size, 15);
        assert_eq!(config.embedding.dimension, 768);
        assert_eq!(config.embedding.max_tokens, 512);
        assert_eq!(config.embedding.span_chars, 2000);
        assert!(config.embedding.is_active());
        assert!(!config.perplexity.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_feature_config_yaml() {
        let yaml = r#"
chunk_size: 10
embedding:
  backend: disabled
  dimension: 384
  source:
    type: local
    path: ./models/minilm
perplexity:
  enabled: true
cache:
  embedding_capacity: 64
"#;

        let config = FeatureConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.embedding.dimension, 384);
        assert!(!config.embedding.is_active());
        assert!(config.perplexity.enabled);
        assert_eq!(config.cache.embedding_capacity, 64);
        assert_eq!(config.cache.perplexity_capacity, 512);
        assert!(matches!(
            config.embedding.source.to_model_source(),
            ModelSource::LocalPath(_)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let config = FeatureConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_device_spec() {
        let cuda_device = DeviceSpec::Cuda { index: Some(1) }.to_device_type();
        assert!(matches!(cuda_device, DeviceType::Cuda(1)));

        let metal_device = DeviceSpec::Metal { index: None }.to_device_type();
        assert!(matches!(metal_device, DeviceType::Metal(0)));
    }
}
