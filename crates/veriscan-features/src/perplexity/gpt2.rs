//! GPT-2 perplexity using Candle
//!
//! A minimal GPT-2 forward pass (token + position embeddings, pre-norm
//! transformer blocks, tied LM head) sufficient to compute the mean token
//! cross-entropy of a text.

use super::PerplexityScorer;
use crate::config::PerplexityConfig;
use crate::model_loader::{create_device, DeviceType, LazyModel, ModelArtifacts};
use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::{Embedding, LayerNorm, VarBuilder};
use serde::Deserialize;
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;
use veriscan_core::{Error, Result};

type CandleResult<T> = candle_core::Result<T>;

/// Subset of the Hugging Face GPT-2 `config.json`
#[derive(Debug, Clone, Deserialize)]
struct Gpt2Config {
    vocab_size: usize,
    n_positions: usize,
    n_embd: usize,
    n_layer: usize,
    n_head: usize,
    #[serde(default = "default_layer_norm_epsilon")]
    layer_norm_epsilon: f64,
}

fn default_layer_norm_epsilon() -> f64 {
    1e-5
}

/// Dense layer with `[in, out]` weights
struct Conv1D {
    weight: Tensor,
    bias: Tensor,
}

impl Conv1D {
    fn load(vb: VarBuilder, in_features: usize, out_features: usize) -> CandleResult<Self> {
        Ok(Self {
            weight: vb.get((in_features, out_features), "weight")?,
            bias: vb.get(out_features, "bias")?,
        })
    }

    fn forward(&self, x: &Tensor) -> CandleResult<Tensor> {
        x.broadcast_matmul(&self.weight)?.broadcast_add(&self.bias)
    }
}

struct Attention {
    c_attn: Conv1D,
    c_proj: Conv1D,
    n_head: usize,
}

impl Attention {
    fn load(vb: VarBuilder, config: &Gpt2Config) -> CandleResult<Self> {
        Ok(Self {
            c_attn: Conv1D::load(vb.pp("c_attn"), config.n_embd, 3 * config.n_embd)?,
            c_proj: Conv1D::load(vb.pp("c_proj"), config.n_embd, config.n_embd)?,
            n_head: config.n_head,
        })
    }

    fn forward(&self, x: &Tensor, causal_mask: &Tensor) -> CandleResult<Tensor> {
        let (batch, seq_len, embd) = x.dims3()?;
        let head_dim = embd / self.n_head;

        let qkv = self.c_attn.forward(x)?;
        let split_heads = |t: Tensor| -> CandleResult<Tensor> {
            t.reshape((batch, seq_len, self.n_head, head_dim))?
                .transpose(1, 2)?
                .contiguous()
        };
        let q = split_heads(qkv.narrow(D::Minus1, 0, embd)?)?;
        let k = split_heads(qkv.narrow(D::Minus1, embd, embd)?)?;
        let v = split_heads(qkv.narrow(D::Minus1, 2 * embd, embd)?)?;

        let scores = (q.matmul(&k.t()?.contiguous()?)? / (head_dim as f64).sqrt())?;
        let weights = candle_nn::ops::softmax_last_dim(&scores.broadcast_add(causal_mask)?)?;

        let context = weights
            .matmul(&v)?
            .transpose(1, 2)?
            .reshape((batch, seq_len, embd))?;
        self.c_proj.forward(&context)
    }
}

struct Mlp {
    c_fc: Conv1D,
    c_proj: Conv1D,
}

impl Mlp {
    fn load(vb: VarBuilder, config: &Gpt2Config) -> CandleResult<Self> {
        Ok(Self {
            c_fc: Conv1D::load(vb.pp("c_fc"), config.n_embd, 4 * config.n_embd)?,
            c_proj: Conv1D::load(vb.pp("c_proj"), 4 * config.n_embd, config.n_embd)?,
        })
    }

    fn forward(&self, x: &Tensor) -> CandleResult<Tensor> {
        self.c_proj.forward(&self.c_fc.forward(x)?.gelu()?)
    }
}

struct Block {
    ln_1: LayerNorm,
    attn: Attention,
    ln_2: LayerNorm,
    mlp: Mlp,
}

impl Block {
    fn load(vb: VarBuilder, config: &Gpt2Config) -> CandleResult<Self> {
        let eps = config.layer_norm_epsilon;
        Ok(Self {
            ln_1: candle_nn::layer_norm(config.n_embd, eps, vb.pp("ln_1"))?,
            attn: Attention::load(vb.pp("attn"), config)?,
            ln_2: candle_nn::layer_norm(config.n_embd, eps, vb.pp("ln_2"))?,
            mlp: Mlp::load(vb.pp("mlp"), config)?,
        })
    }

    fn forward(&self, x: &Tensor, causal_mask: &Tensor) -> CandleResult<Tensor> {
        let x = (x + self.attn.forward(&self.ln_1.forward(x)?, causal_mask)?)?;
        let mlp = self.mlp.forward(&self.ln_2.forward(&x)?)?;
        x + mlp
    }
}

struct Gpt2Model {
    wte: Embedding,
    wpe: Embedding,
    blocks: Vec<Block>,
    ln_f: LayerNorm,
}

impl Gpt2Model {
    fn load(vb: VarBuilder, config: &Gpt2Config) -> CandleResult<Self> {
        // Checkpoints saved from GPT2LMHeadModel nest everything under "transformer"
        let vb = if vb.contains_tensor("transformer.wte.weight") {
            vb.pp("transformer")
        } else {
            vb
        };

        let blocks = (0..config.n_layer)
            .map(|i| Block::load(vb.pp(format!("h.{}", i)), config))
            .collect::<CandleResult<Vec<_>>>()?;

        Ok(Self {
            wte: candle_nn::embedding(config.vocab_size, config.n_embd, vb.pp("wte"))?,
            wpe: candle_nn::embedding(config.n_positions, config.n_embd, vb.pp("wpe"))?,
            blocks,
            ln_f: candle_nn::layer_norm(config.n_embd, config.layer_norm_epsilon, vb.pp("ln_f"))?,
        })
    }

    /// Logits of shape `[batch, seq_len, vocab]`
    fn forward(&self, input_ids: &Tensor) -> CandleResult<Tensor> {
        let (_batch, seq_len) = input_ids.dims2()?;
        let device = input_ids.device();

        let positions = Tensor::arange(0u32, seq_len as u32, device)?.unsqueeze(0)?;
        let mut x = self
            .wte
            .forward(input_ids)?
            .broadcast_add(&self.wpe.forward(&positions)?)?;

        let mask = causal_mask(seq_len, device)?;
        for block in &self.blocks {
            x = block.forward(&x, &mask)?;
        }

        let x = self.ln_f.forward(&x)?;
        x.broadcast_matmul(&self.wte.embeddings().t()?)
    }
}

/// `[seq_len, seq_len]` additive mask hiding future positions
fn causal_mask(seq_len: usize, device: &Device) -> CandleResult<Tensor> {
    let mask: Vec<f32> = (0..seq_len)
        .flat_map(|i| (0..seq_len).map(move |j| if j > i { f32::NEG_INFINITY } else { 0.0 }))
        .collect();
    Tensor::from_vec(mask, (seq_len, seq_len), device)
}

struct Gpt2Session {
    model: Gpt2Model,
    tokenizer: Tokenizer,
    device: Device,
}

impl Gpt2Session {
    fn load(artifacts: &ModelArtifacts, device: DeviceType, max_tokens: usize) -> Result<Self> {
        let device = create_device(device)?;

        let config_str = std::fs::read_to_string(&artifacts.config)?;
        let config: Gpt2Config = serde_json::from_str(&config_str)
            .map_err(|e| Error::backend_unavailable(format!("Failed to parse GPT-2 config: {}", e)))?;

        // Safety: the weights file is not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&artifacts.weights], DType::F32, &device)
        }
        .map_err(|e| Error::backend_unavailable(format!("Failed to load GPT-2 weights: {}", e)))?;

        let model = Gpt2Model::load(vb, &config)
            .map_err(|e| Error::backend_unavailable(format!("Failed to build GPT-2 model: {}", e)))?;

        let mut tokenizer = Tokenizer::from_file(&artifacts.tokenizer)
            .map_err(|e| Error::backend_unavailable(format!("Failed to load tokenizer: {}", e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens.min(config.n_positions),
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

    fn perplexity(&self, text: &str) -> Result<f32> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| Error::classifier(format!("Tokenization failed: {}", e)))?;

        let ids = encoding.get_ids();
        if ids.len() < 2 {
            return Ok(0.0);
        }

        self.mean_loss(ids)
            .and_then(|loss| loss.exp())
            .and_then(|ppl| ppl.to_scalar::<f32>())
            .map_err(|e| Error::classifier(format!("GPT-2 inference failed: {}", e)))
    }

    fn mean_loss(&self, ids: &[u32]) -> CandleResult<Tensor> {
        let seq_len = ids.len();
        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let logits = self.model.forward(&input_ids)?.squeeze(0)?;

        // Position t predicts token t + 1
        let logits = logits.narrow(0, 0, seq_len - 1)?;
        let targets = input_ids.squeeze(0)?.narrow(0, 1, seq_len - 1)?;
        candle_nn::loss::cross_entropy(&logits, &targets)
    }
}

/// Perplexity under a pretrained GPT-2, `exp(mean token cross-entropy)`
pub struct Gpt2Perplexity {
    artifacts: ModelArtifacts,
    device: DeviceType,
    max_tokens: usize,
    session: LazyModel<Gpt2Session>,
}

impl Gpt2Perplexity {
    pub fn new(artifacts: ModelArtifacts, device: DeviceType, max_tokens: usize) -> Self {
        Self {
            artifacts,
            device,
            max_tokens,
            session: LazyModel::default(),
        }
    }

    pub fn from_config(config: &PerplexityConfig) -> Result<Self> {
        let source = config.source.to_model_source();
        let artifacts = ModelArtifacts::resolve(&source, config.allow_download)?;
        info!(source = %source.describe(), "Resolved GPT-2 artifacts");
        Ok(Self::new(
            artifacts,
            config.device.to_device_type(),
            config.max_tokens,
        ))
    }

    fn session(&self) -> Result<Arc<Gpt2Session>> {
        self.session.get_or_try_load(|| {
            let session = Gpt2Session::load(&self.artifacts, self.device, self.max_tokens)?;
            info!(weights = %self.artifacts.weights.display(), "GPT-2 session loaded");
            Ok(session)
        })
    }
}

impl PerplexityScorer for Gpt2Perplexity {
    fn name(&self) -> &str {
        "gpt2"
    }

    fn score(&self, text: &str) -> Result<f32> {
        self.session()?.perplexity(text)
    }

    fn warmup(&self) -> Result<()> {
        self.session().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_causal_mask_hides_future() {
        let mask = causal_mask(3, &Device::Cpu).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(mask[0][0], 0.0);
        assert!(mask[0][1].is_infinite());
        assert!(mask[1][2].is_infinite());
        assert_eq!(mask[2][0], 0.0);
        assert_eq!(mask[2][2], 0.0);
    }

    #[test]
    fn test_config_defaults_epsilon() {
        let config: Gpt2Config = serde_json::from_str(
            r#"{"vocab_size": 50257, "n_positions": 1024, "n_embd": 768, "n_layer": 12, "n_head": 12}"#,
        )
        .unwrap();
        assert_eq!(config.layer_norm_epsilon, 1e-5);
    }
}
