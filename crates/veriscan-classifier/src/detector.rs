//! Document classification pipeline
//!
//! `prepare` does the cheap, fallible input work (trim, length cap,
//! segmentation, chunking) and `classify_prepared` runs the expensive part
//! (features, inference, labeling, aggregation). Callers that debit quota do
//! it between the two.

use crate::classifier::ProbabilisticClassifier;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use veriscan_core::{
    round2, Chunk, ClassificationReport, DocumentVerdict, Error, FeatureVector, InputError,
    Result, Sentence, SentenceResult,
};
use veriscan_features::{build_chunks, FeatureAssembler, FeatureCacheStats, SentenceSegmenter};
use veriscan_policy::{aggregate, LabelingPolicy};

/// Default input cap in characters
pub const DEFAULT_MAX_TEXT_CHARS: usize = 30_000;

/// Pipeline limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorSettings {
    /// Sentences per chunk
    pub chunk_size: usize,

    /// Maximum characters of trimmed input
    pub max_text_chars: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            chunk_size: 15,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }
}

/// Validated, segmented input ready for classification
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    text: String,
    sentences: Vec<Sentence>,
    chunks: Vec<Chunk>,
}

impl PreparedDocument {
    /// Trimmed input text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }
}

/// Classification output plus pipeline diagnostics
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: ClassificationReport,

    /// Unrounded document verdict
    pub verdict: DocumentVerdict,

    pub chunks: usize,

    /// Chunks whose embedding degraded to zeros
    pub degraded_chunks: usize,

    pub elapsed: Duration,
}

/// Segmenter, feature assembler, classifier and labeling policy wired
/// together. Shared across requests; all methods take `&self`.
pub struct Detector {
    segmenter: SentenceSegmenter,
    assembler: FeatureAssembler,
    classifier: Arc<dyn ProbabilisticClassifier>,
    policy: LabelingPolicy,
    settings: DetectorSettings,
}

impl Detector {
    /// Fails with `BackendUnavailable` when the classifier was trained on a
    /// different row width than the assembler produces.
    pub fn new(
        assembler: FeatureAssembler,
        classifier: Arc<dyn ProbabilisticClassifier>,
        settings: DetectorSettings,
    ) -> Result<Self> {
        if settings.chunk_size == 0 {
            return Err(Error::config("chunk_size must be at least 1"));
        }

        let width = assembler.layout().width();
        if classifier.num_features() != width {
            return Err(Error::backend_unavailable(format!(
                "Classifier {} expects {} features but the feature layout has {}",
                classifier.name(),
                classifier.num_features(),
                width
            )));
        }

        info!(
            classifier = classifier.name(),
            width,
            chunk_size = settings.chunk_size,
            max_text_chars = settings.max_text_chars,
            "Detector ready"
        );

        Ok(Self {
            segmenter: SentenceSegmenter::new()?,
            assembler,
            classifier,
            policy: LabelingPolicy::standard(),
            settings,
        })
    }

    /// Replace the labeling ladder
    pub fn with_policy(mut self, policy: LabelingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn settings(&self) -> DetectorSettings {
        self.settings
    }

    /// Validate and segment input. Never touches a model.
    pub fn prepare(&self, text: &str) -> Result<PreparedDocument> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(InputError::EmptyInput.into());
        }

        let chars = trimmed.chars().count();
        if chars > self.settings.max_text_chars {
            return Err(InputError::TextTooLarge {
                max: self.settings.max_text_chars,
                actual: chars,
            }
            .into());
        }

        let sentences = self.segmenter.segment(trimmed)?;
        let chunks = build_chunks(&sentences, self.settings.chunk_size);

        Ok(PreparedDocument {
            text: trimmed.to_string(),
            sentences,
            chunks,
        })
    }

    /// Features, inference, labeling and aggregation for a prepared document
    pub fn classify_prepared(&self, doc: &PreparedDocument) -> Result<Analysis> {
        let start = Instant::now();

        let batch = self.assembler.assemble(&doc.sentences, &doc.chunks);
        let probabilities = self.classifier.predict_probabilities(&batch.rows)?;
        if probabilities.len() != doc.sentences.len() {
            return Err(Error::classifier(format!(
                "Classifier returned {} predictions for {} sentences",
                probabilities.len(),
                doc.sentences.len()
            )));
        }

        let mut percents = Vec::with_capacity(probabilities.len());
        let mut sentences = Vec::with_capacity(probabilities.len());
        for (sentence, probs) in doc.sentences.iter().zip(&probabilities) {
            let scores = probs.to_percent();
            let label = self.policy.label(&scores);
            sentences.push(SentenceResult {
                index: sentence.index,
                sentence: sentence.text.clone(),
                human_probability: round2(scores.human),
                ai_probability: round2(scores.ai),
                over_polished_probability: round2(scores.polish),
                final_label: label,
            });
            percents.push(scores);
        }

        let verdict = aggregate(&percents)?;
        let elapsed = start.elapsed();

        debug!(
            sentences = sentences.len(),
            chunks = doc.chunks.len(),
            degraded_chunks = batch.degraded_chunks,
            elapsed_ms = elapsed.as_millis() as u64,
            label = %verdict.label,
            "Document classified"
        );

        let report = ClassificationReport {
            overall_human_probability: round2(verdict.overall_human_pct),
            overall_ai_probability: round2(verdict.overall_ai_pct),
            final_document_label: verdict.label,
            sentences_processed: sentences.len(),
            sentences_received: doc.sentences.len(),
            sentences,
        };

        Ok(Analysis {
            report,
            verdict,
            chunks: doc.chunks.len(),
            degraded_chunks: batch.degraded_chunks,
            elapsed,
        })
    }

    /// `prepare` followed by `classify_prepared`
    pub fn analyze(&self, text: &str) -> Result<Analysis> {
        let doc = self.prepare(text)?;
        self.classify_prepared(&doc)
    }

    /// Classifier input rows for `text`, one per sentence
    pub fn extract_features(&self, text: &str) -> Result<Vec<FeatureVector>> {
        let doc = self.prepare(text)?;
        Ok(self.assembler.assemble(&doc.sentences, &doc.chunks).rows)
    }

    /// One row describing the whole text
    pub fn span_features(&self, text: &str) -> Result<FeatureVector> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(InputError::EmptyInput.into());
        }
        Ok(self.assembler.span_features(trimmed))
    }

    /// Load model sessions eagerly
    pub fn warmup(&self) -> Result<()> {
        let start = Instant::now();
        self.assembler.warmup()?;
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "Warmup complete");
        Ok(())
    }

    pub fn cache_stats(&self) -> FeatureCacheStats {
        self.assembler.cache_stats()
    }

    pub fn clear_caches(&self) {
        self.assembler.reset_caches();
    }

    pub fn assembler(&self) -> &FeatureAssembler {
        &self.assembler
    }

    pub fn classifier(&self) -> &dyn ProbabilisticClassifier {
        self.classifier.as_ref()
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("assembler", &self.assembler)
            .field("classifier", &self.classifier.name())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veriscan_core::ClassProbabilities;

    struct Uniform(usize);

    impl ProbabilisticClassifier for Uniform {
        fn name(&self) -> &str {
            "uniform"
        }

        fn num_features(&self) -> usize {
            self.0
        }

        fn predict_probabilities(
            &self,
            rows: &[FeatureVector],
        ) -> Result<Vec<ClassProbabilities>> {
            Ok(rows
                .iter()
                .map(|_| ClassProbabilities::new(0.5, 0.3, 0.2))
                .collect())
        }
    }

    fn detector(max_text_chars: usize) -> Detector {
        let assembler = FeatureAssembler::stylometry_only(8).unwrap();
        let width = assembler.layout().width();
        Detector::new(
            assembler,
            Arc::new(Uniform(width)),
            DetectorSettings {
                chunk_size: 2,
                max_text_chars,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_prepare_rejects_bad_input() {
        let detector = detector(20);
        let code = |text: &str| detector.prepare(text).unwrap_err().code();

        assert_eq!(code(""), "EMPTY_TEXT");
        assert_eq!(code("   \n\t "), "EMPTY_TEXT");
        assert_eq!(code(&"a".repeat(21)), "TEXT_TOO_LARGE");
        assert_eq!(code("... !!! ???"), "NO_SENTENCES");
    }

    #[test]
    fn test_cap_counts_trimmed_chars() {
        let detector = detector(10);
        let doc = detector.prepare("   Hi there.   ").unwrap();
        assert_eq!(doc.text(), "Hi there.");
    }

    #[test]
    fn test_width_mismatch_is_fatal() {
        let assembler = FeatureAssembler::stylometry_only(8).unwrap();
        let err = Detector::new(assembler, Arc::new(Uniform(782)), DetectorSettings::default())
            .unwrap_err();
        assert_eq!(err.code(), "BACKEND_UNAVAILABLE");
    }

    #[test]
    fn test_report_shape() {
        let detector = detector(1000);
        let analysis = detector.analyze("One. Two. Three.").unwrap();
        let report = &analysis.report;

        assert_eq!(report.sentences_processed, 3);
        assert_eq!(report.sentences_received, 3);
        assert_eq!(analysis.chunks, 2);
        assert_eq!(report.sentences[0].index, 1);
        assert_eq!(report.sentences[0].human_probability, 50.0);
        assert_eq!(report.sentences[0].ai_probability, 30.0);
        assert_eq!(report.overall_ai_probability, 30.0);
        assert_eq!(report.final_document_label, veriscan_core::Label::Human);
    }
}
