//! Veriscan Classifier
//!
//! The pretrained sentence classifier and the pipeline that feeds it.
//!
//! [`GradientBoostedClassifier`] evaluates an XGBoost JSON tree ensemble
//! over feature rows. [`Detector`] wires segmentation, feature assembly,
//! inference, the labeling ladder and aggregation into one call.

pub mod classifier;
pub mod detector;
pub mod gbdt;

pub use classifier::ProbabilisticClassifier;
pub use detector::{
    Analysis, Detector, DetectorSettings, PreparedDocument, DEFAULT_MAX_TEXT_CHARS,
};
pub use gbdt::{GradientBoostedClassifier, NUM_CLASSES};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::ProbabilisticClassifier;
    pub use crate::detector::{Analysis, Detector, DetectorSettings};
    pub use crate::gbdt::GradientBoostedClassifier;
}
