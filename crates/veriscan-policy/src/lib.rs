//! Veriscan Policy
//!
//! Turns classifier probabilities into labels.
//!
//! Sentence labels come from a first-match-wins ladder of rules over the
//! (ai, human, polish) percentages. The document verdict is a plain
//! comparison of the mean ai and human percentages.

pub mod aggregate;
pub mod rule;

pub use aggregate::aggregate;
pub use rule::{Decision, LabelRule, LabelingPolicy};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aggregate::aggregate;
    pub use crate::rule::{Decision, LabelingPolicy};
}
