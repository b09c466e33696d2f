//! Language-model perplexity scoring

#[cfg(feature = "ml-models")]
mod gpt2;

#[cfg(feature = "ml-models")]
pub use gpt2::Gpt2Perplexity;

use crate::config::PerplexityConfig;
use std::sync::Arc;
use tracing::info;
use veriscan_core::Result;

/// Scores how predictable a text is to a causal language model
pub trait PerplexityScorer: Send + Sync {
    fn name(&self) -> &str;

    /// Perplexity of `text`; 0 when there is nothing to score
    fn score(&self, text: &str) -> Result<f32>;

    fn warmup(&self) -> Result<()> {
        Ok(())
    }
}

/// Scorer used when perplexity is turned off; always 0
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPerplexity;

impl PerplexityScorer for DisabledPerplexity {
    fn name(&self) -> &str {
        "disabled"
    }

    fn score(&self, _text: &str) -> Result<f32> {
        Ok(0.0)
    }
}

/// Build the configured scorer, resolving artifacts when enabled
pub fn build_scorer(config: &PerplexityConfig) -> Result<Arc<dyn PerplexityScorer>> {
    if !config.enabled {
        return Ok(Arc::new(DisabledPerplexity));
    }
    enabled_scorer(config)
}

#[cfg(feature = "ml-models")]
fn enabled_scorer(config: &PerplexityConfig) -> Result<Arc<dyn PerplexityScorer>> {
    let scorer = Gpt2Perplexity::from_config(config)?;
    info!(max_tokens = config.max_tokens, "Perplexity scoring enabled");
    Ok(Arc::new(scorer))
}

#[cfg(not(feature = "ml-models"))]
fn enabled_scorer(_config: &PerplexityConfig) -> Result<Arc<dyn PerplexityScorer>> {
    info!("Perplexity requested without the ml-models feature");
    Err(veriscan_core::Error::backend_unavailable(
        "perplexity scoring requires the ml-models feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_scorer() {
        let scorer = build_scorer(&PerplexityConfig::default()).unwrap();
        assert_eq!(scorer.name(), "disabled");
        assert_eq!(scorer.score("anything at all").unwrap(), 0.0);
    }
}
