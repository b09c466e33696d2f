//! BERT encoder backend using Candle

use super::EmbeddingBackend;
use crate::config::EmbeddingConfig;
use crate::model_loader::{create_device, DeviceType, LazyModel, ModelArtifacts};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;
use veriscan_core::{Error, Result};

/// Tokenizer, weights and device, loaded together
struct BertSession {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl BertSession {
    fn load(artifacts: &ModelArtifacts, device: DeviceType, max_tokens: usize) -> Result<Self> {
        let device = create_device(device)?;

        let config_str = std::fs::read_to_string(&artifacts.config)?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| Error::backend_unavailable(format!("Failed to parse BERT config: {}", e)))?;

        // Safety: the weights file is not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&artifacts.weights], DType::F32, &device)
        }
        .map_err(|e| Error::backend_unavailable(format!("Failed to load BERT weights: {}", e)))?;

        let model = BertModel::load(vb, &config)
            .map_err(|e| Error::backend_unavailable(format!("Failed to build BERT model: {}", e)))?;

        let mut tokenizer = Tokenizer::from_file(&artifacts.tokenizer)
            .map_err(|e| Error::backend_unavailable(format!("Failed to load tokenizer: {}", e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                ..Default::default()
            }))
            .map_err(|e| Error::backend_unavailable(format!("Failed to configure truncation: {}", e)))?;
        tokenizer.with_padding(None);

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// Hidden state of the leading `[CLS]` token
    fn cls_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::classifier(format!("Tokenization failed: {}", e)))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(inference_error)?;
        let token_type_ids = Tensor::new(encoding.get_type_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(inference_error)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(inference_error)?;

        // [batch, seq_len, hidden]
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(inference_error)?;

        hidden
            .get(0)
            .and_then(|seq| seq.get(0))
            .and_then(|cls| cls.to_vec1::<f32>())
            .map_err(inference_error)
    }
}

fn inference_error(e: candle_core::Error) -> Error {
    Error::classifier(format!("BERT inference failed: {}", e))
}

/// BERT-style encoder producing `[CLS]` embeddings.
///
/// Artifacts are resolved up front; the session itself loads on first use.
pub struct BertBackend {
    artifacts: ModelArtifacts,
    device: DeviceType,
    max_tokens: usize,
    session: LazyModel<BertSession>,
}

impl BertBackend {
    pub fn new(artifacts: ModelArtifacts, device: DeviceType, max_tokens: usize) -> Self {
        Self {
            artifacts,
            device,
            max_tokens,
            session: LazyModel::default(),
        }
    }

    /// Resolve artifacts for the configured source
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let source = config.source.to_model_source();
        let artifacts = ModelArtifacts::resolve(&source, config.allow_download)?;
        info!(source = %source.describe(), "Resolved BERT artifacts");
        Ok(Self::new(
            artifacts,
            config.device.to_device_type(),
            config.max_tokens,
        ))
    }

    fn session(&self) -> Result<std::sync::Arc<BertSession>> {
        self.session.get_or_try_load(|| {
            let session = BertSession::load(&self.artifacts, self.device, self.max_tokens)?;
            info!(
                weights = %self.artifacts.weights.display(),
                max_tokens = self.max_tokens,
                "BERT session loaded"
            );
            Ok(session)
        })
    }
}

impl EmbeddingBackend for BertBackend {
    fn name(&self) -> &str {
        "bert"
    }

    fn embed_span(&self, span: &str) -> Result<Vec<f32>> {
        self.session()?.cls_embedding(span)
    }

    fn warmup(&self) -> Result<()> {
        self.session().map(|_| ())
    }
}
