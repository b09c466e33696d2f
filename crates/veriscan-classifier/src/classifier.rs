//! Classifier contract

use veriscan_core::{ClassProbabilities, FeatureVector, Result};

/// A pretrained model mapping feature rows to (human, ai, over-polished)
/// probabilities.
///
/// Inference is synchronous and CPU-bound; callers on an async runtime run
/// it on a blocking thread.
pub trait ProbabilisticClassifier: Send + Sync {
    /// Classifier name for logs
    fn name(&self) -> &str;

    /// Row width the model was trained on
    fn num_features(&self) -> usize;

    /// One probability triple per row, in row order
    fn predict_probabilities(&self, rows: &[FeatureVector]) -> Result<Vec<ClassProbabilities>>;
}
