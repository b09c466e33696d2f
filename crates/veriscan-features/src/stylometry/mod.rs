//! Sentence-level stylometric features
//!
//! Thirteen surface statistics computed from a single text, in this fixed
//! order: word count, sentence count, mean sentence length, sentence-length
//! variance, burstiness, stopword ratio, unigram repetition, bigram
//! repetition, noun ratio, verb ratio, adjective ratio, punctuation ratio and
//! Flesch reading ease. Every value is finite and empty input yields zeros
//! apart from the readability baseline.

mod lexicon;
mod readability;
mod tagger;
mod tokenize;

pub use readability::{flesch_reading_ease, syllable_count};
pub use tagger::{PosClass, PosTagger};
pub use tokenize::WordTokenizer;

use crate::segmenter::SentenceSegmenter;
use lexicon::STOPWORDS;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use veriscan_core::{Result, STYLOMETRIC_DIM};

/// Named view of the thirteen stylometric values
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    pub num_words: f32,
    pub num_sentences: f32,
    pub avg_sentence_len: f32,
    pub sentence_len_variance: f32,
    pub burstiness: f32,
    pub stopword_ratio: f32,
    pub unigram_repetition: f32,
    pub bigram_repetition: f32,
    pub noun_ratio: f32,
    pub verb_ratio: f32,
    pub adjective_ratio: f32,
    pub punctuation_ratio: f32,
    pub readability: f32,
}

impl StyleProfile {
    /// Values in classifier column order
    pub fn to_array(&self) -> [f32; STYLOMETRIC_DIM] {
        [
            self.num_words,
            self.num_sentences,
            self.avg_sentence_len,
            self.sentence_len_variance,
            self.burstiness,
            self.stopword_ratio,
            self.unigram_repetition,
            self.bigram_repetition,
            self.noun_ratio,
            self.verb_ratio,
            self.adjective_ratio,
            self.punctuation_ratio,
            self.readability,
        ]
    }
}

/// Computes [`StyleProfile`]s. Pure and cheap; safe to share across threads.
#[derive(Debug, Clone)]
pub struct StylometricAnalyzer {
    tokenizer: WordTokenizer,
    segmenter: SentenceSegmenter,
    tagger: PosTagger,
    stopwords: HashSet<&'static str>,
}

impl StylometricAnalyzer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tokenizer: WordTokenizer::new()?,
            segmenter: SentenceSegmenter::new()?,
            tagger: PosTagger::new(),
            stopwords: STOPWORDS.iter().copied().collect(),
        })
    }

    /// Feature block for `text` in column order
    pub fn analyze(&self, text: &str) -> [f32; STYLOMETRIC_DIM] {
        self.profile(text).to_array()
    }

    pub fn profile(&self, text: &str) -> StyleProfile {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = self
            .tokenizer
            .tokenize(&lowered)
            .into_iter()
            .filter(|w| w.chars().all(char::is_alphabetic))
            .collect();
        let num_words = words.len();

        let sentences = self.segmenter.split(text);
        let lengths: Vec<f64> = sentences
            .iter()
            .map(|s| self.tokenizer.tokenize(s).len() as f64)
            .collect();

        let avg_sentence_len = mean(&lengths);
        let sentence_len_variance = if lengths.len() > 1 {
            population_variance(&lengths, avg_sentence_len)
        } else {
            0.0
        };
        let burstiness = if avg_sentence_len > 0.0 {
            sentence_len_variance / avg_sentence_len
        } else {
            0.0
        };

        let ratio = |count: usize| {
            if num_words == 0 {
                0.0
            } else {
                count as f64 / num_words as f64
            }
        };

        let stopwords = words.iter().filter(|w| self.stopwords.contains(*w)).count();

        let distinct: HashSet<&str> = words.iter().copied().collect();
        let unigram_repetition = if num_words == 0 {
            0.0
        } else {
            1.0 - distinct.len() as f64 / num_words as f64
        };

        let mut bigrams: HashMap<(&str, &str), usize> = HashMap::new();
        for pair in words.windows(2) {
            *bigrams.entry((pair[0], pair[1])).or_default() += 1;
        }
        let bigram_repetition = if bigrams.is_empty() {
            0.0
        } else {
            bigrams.values().filter(|&&c| c > 1).count() as f64 / bigrams.len() as f64
        };

        let tags = self.tagger.tag(&words);
        let count_tag = |class: PosClass| tags.iter().filter(|&&t| t == class).count();

        let char_count = text.chars().count();
        let punctuation = text.chars().filter(char::is_ascii_punctuation).count();

        StyleProfile {
            num_words: num_words as f32,
            num_sentences: sentences.len() as f32,
            avg_sentence_len: avg_sentence_len as f32,
            sentence_len_variance: sentence_len_variance as f32,
            burstiness: burstiness as f32,
            stopword_ratio: ratio(stopwords) as f32,
            unigram_repetition: unigram_repetition as f32,
            bigram_repetition: bigram_repetition as f32,
            noun_ratio: ratio(count_tag(PosClass::Noun)) as f32,
            verb_ratio: ratio(count_tag(PosClass::Verb)) as f32,
            adjective_ratio: ratio(count_tag(PosClass::Adjective)) as f32,
            punctuation_ratio: (punctuation as f64 / char_count.max(1) as f64) as f32,
            readability: flesch_reading_ease(text, sentences.len()),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn population_variance(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> StylometricAnalyzer {
        StylometricAnalyzer::new().unwrap()
    }

    #[test]
    fn test_empty_text() {
        let features = analyzer().analyze("");
        assert_eq!(&features[..12], &[0.0; 12]);
        assert_eq!(features[12], 206.835);
    }

    #[test]
    fn test_counts_and_lengths() {
        let profile = analyzer().profile("The cat sat. The cat ran away quickly.");

        assert_eq!(profile.num_words, 7.0);
        assert_eq!(profile.num_sentences, 2.0);
        // Token counts per sentence are 4 and 6 (punctuation included)
        assert_eq!(profile.avg_sentence_len, 5.0);
        assert_eq!(profile.sentence_len_variance, 1.0);
        assert!((profile.burstiness - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_repetition() {
        let profile = analyzer().profile("the cat the cat the dog");
        // 6 words, 3 distinct
        assert!((profile.unigram_repetition - 0.5).abs() < 1e-6);
        // bigrams: (the,cat)x2, (cat,the)x2, (the,dog)x1
        assert!((profile.bigram_repetition - 2.0 / 3.0).abs() < 1e-6);
        assert!((profile.stopword_ratio - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_single_sentence_has_no_variance() {
        let profile = analyzer().profile("Just one sentence here.");
        assert_eq!(profile.sentence_len_variance, 0.0);
        assert_eq!(profile.burstiness, 0.0);
    }

    #[test]
    fn test_punctuation_ratio() {
        let profile = analyzer().profile("Hi, you!");
        assert!((profile.punctuation_ratio - 2.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_values_are_finite() {
        let inputs = ["!!!", "a", "12 34 56.", "Hello\n\nworld", "— … ?"];
        for input in inputs {
            assert!(analyzer().analyze(input).iter().all(|v| v.is_finite()), "{input}");
        }
    }
}
