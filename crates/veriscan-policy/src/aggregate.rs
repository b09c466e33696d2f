//! Document verdict from sentence scores

use veriscan_core::{DocumentVerdict, InputError, Label, PercentScores, Result};

/// Unweighted mean of the sentences' ai and human percentages. The document
/// is AI when mean ai strictly exceeds mean human.
///
/// Fails with [`InputError::NoSentencesFound`] for an empty slice.
pub fn aggregate(scores: &[PercentScores]) -> Result<DocumentVerdict> {
    if scores.is_empty() {
        return Err(InputError::NoSentencesFound.into());
    }

    let n = scores.len() as f64;
    let overall_ai_pct = scores.iter().map(|s| s.ai).sum::<f64>() / n;
    let overall_human_pct = scores.iter().map(|s| s.human).sum::<f64>() / n;

    let label = if overall_ai_pct > overall_human_pct {
        Label::Ai
    } else {
        Label::Human
    };

    tracing::debug!(
        sentences = scores.len(),
        overall_ai_pct,
        overall_human_pct,
        %label,
        "Aggregated document verdict"
    );

    Ok(DocumentVerdict {
        overall_human_pct,
        overall_ai_pct,
        label,
    })
}
