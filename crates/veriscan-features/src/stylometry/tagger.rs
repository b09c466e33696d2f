//! Coarse part-of-speech tagging
//!
//! Only three open classes matter for the stylometric ratios, so the tagger
//! resolves each word to noun, verb, adjective or other. Closed-class words
//! come from lexicons; open-class words are resolved from the preceding word
//! and then from derivational suffixes. Unknown words default to noun.

use super::lexicon::{
    AUXILIARIES, COMMON_ADJECTIVES, COMMON_VERBS, DETERMINERS, FUNCTION_WORDS, MODALS,
};
use std::collections::HashSet;

/// Coarse word class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosClass {
    Noun,
    Verb,
    Adjective,
    Other,
}

const NOUN_SUFFIXES: &[&str] = &[
    "tion", "sion", "ment", "ness", "ity", "ism", "ist", "ship", "hood", "ance", "ence", "dom",
];
const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ous", "ful", "ive", "able", "ible", "less", "ish", "ical", "ic", "ary", "al",
];
const VERB_SUFFIXES: &[&str] = &["ing", "ed", "ize", "ise", "ify", "ate", "en"];

/// Lexicon- and suffix-driven tagger
#[derive(Debug, Clone)]
pub struct PosTagger {
    auxiliaries: HashSet<&'static str>,
    modals: HashSet<&'static str>,
    determiners: HashSet<&'static str>,
    function_words: HashSet<&'static str>,
    verbs: HashSet<&'static str>,
    adjectives: HashSet<&'static str>,
}

impl Default for PosTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl PosTagger {
    pub fn new() -> Self {
        let set = |words: &[&'static str]| words.iter().copied().collect::<HashSet<_>>();
        Self {
            auxiliaries: set(AUXILIARIES),
            modals: set(MODALS),
            determiners: set(DETERMINERS),
            function_words: set(FUNCTION_WORDS),
            verbs: set(COMMON_VERBS),
            adjectives: set(COMMON_ADJECTIVES),
        }
    }

    /// Tag a sequence of lowercase words
    pub fn tag<S: AsRef<str>>(&self, words: &[S]) -> Vec<PosClass> {
        let mut previous: Option<(&str, PosClass)> = None;
        words
            .iter()
            .map(|word| {
                let word = word.as_ref();
                let class = self.classify(word, previous);
                previous = Some((word, class));
                class
            })
            .collect()
    }

    fn classify(&self, word: &str, previous: Option<(&str, PosClass)>) -> PosClass {
        let previous_class = previous.map(|(_, class)| class);
        let previous = previous.map(|(word, _)| word);

        if self.auxiliaries.contains(word) {
            return PosClass::Verb;
        }
        if self.modals.contains(word)
            || self.determiners.contains(word)
            || self.function_words.contains(word)
        {
            return PosClass::Other;
        }
        if self.adjectives.contains(word) {
            return PosClass::Adjective;
        }

        let after_modal = previous.is_some_and(|p| self.modals.contains(p) || p == "to");
        if after_modal || self.verbs.contains(word) {
            return PosClass::Verb;
        }

        // "fox jumps": an -s form right after a noun is read as a present verb
        if previous_class == Some(PosClass::Noun) && is_third_person_singular(word) {
            return PosClass::Verb;
        }

        if word.len() <= 3 {
            return PosClass::Noun;
        }
        if has_suffix(word, NOUN_SUFFIXES) {
            return PosClass::Noun;
        }
        if has_suffix(word, ADJECTIVE_SUFFIXES) {
            return PosClass::Adjective;
        }
        if word.ends_with("ly") {
            return PosClass::Other;
        }

        let after_determiner = previous.is_some_and(|p| self.determiners.contains(p));
        if !after_determiner && has_suffix(word, VERB_SUFFIXES) {
            return PosClass::Verb;
        }

        PosClass::Noun
    }
}

fn is_third_person_singular(word: &str) -> bool {
    word.len() > 3
        && word.ends_with('s')
        && !["ss", "us", "is", "ous"].iter().any(|end| word.ends_with(end))
}

fn has_suffix(word: &str, suffixes: &[&str]) -> bool {
    suffixes
        .iter()
        .any(|suffix| word.len() > suffix.len() + 1 && word.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_tags() {
        let tagger = PosTagger::new();
        let tags = tagger.tag(&["the", "quick", "fox", "jumped", "over", "lazy", "dogs"]);
        assert_eq!(
            tags,
            vec![
                PosClass::Other,
                PosClass::Adjective,
                PosClass::Noun,
                PosClass::Verb,
                PosClass::Other,
                PosClass::Adjective,
                PosClass::Noun,
            ]
        );
    }

    #[test]
    fn test_context_and_suffixes() {
        let tagger = PosTagger::new();
        let tags = tagger.tag(&["we", "should", "optimize", "the", "information", "quickly"]);
        assert_eq!(tags[2], PosClass::Verb);
        assert_eq!(tags[4], PosClass::Noun);
        assert_eq!(tags[5], PosClass::Other);

        assert_eq!(tagger.tag(&["a", "wonderful", "painting"])[1], PosClass::Adjective);
        assert_eq!(tagger.tag(&["the", "painting"])[1], PosClass::Noun);
        assert_eq!(tagger.tag(&["is"])[0], PosClass::Verb);
    }

    #[test]
    fn test_present_verb_after_noun() {
        let tagger = PosTagger::new();
        assert_eq!(tagger.tag(&["the", "fox", "jumps"])[2], PosClass::Verb);
        assert_eq!(tagger.tag(&["the", "lazy", "dogs"])[2], PosClass::Noun);
        assert_eq!(tagger.tag(&["the", "status"])[1], PosClass::Noun);
    }

    /// NLTK averaged-perceptron tags collapsed to the coarse classes
    fn perceptron_reference(tags: &[&str]) -> Vec<PosClass> {
        tags.iter()
            .map(|tag| match *tag {
                "NN" | "NNS" | "NNP" | "NNPS" => PosClass::Noun,
                "VB" | "VBD" | "VBG" | "VBN" | "VBP" | "VBZ" => PosClass::Verb,
                "JJ" | "JJR" | "JJS" => PosClass::Adjective,
                _ => PosClass::Other,
            })
            .collect()
    }

    #[test]
    fn test_agreement_with_perceptron_tags() {
        let tagger = PosTagger::new();

        let words = ["the", "cat", "sat", "on", "the", "mat"];
        let reference = perceptron_reference(&["DT", "NN", "VBD", "IN", "DT", "NN"]);
        assert_eq!(tagger.tag(&words), reference);

        // The perceptron tags "brown" as a noun here; the color lexicon says adjective
        let words = ["the", "quick", "brown", "fox", "jumps", "over", "the", "lazy", "dog"];
        let reference =
            perceptron_reference(&["DT", "JJ", "NN", "NN", "VBZ", "IN", "DT", "JJ", "NN"]);
        let disagreements: Vec<&str> = tagger
            .tag(&words)
            .iter()
            .zip(&reference)
            .zip(words)
            .filter(|((ours, theirs), _)| ours != theirs)
            .map(|(_, word)| word)
            .collect();
        assert_eq!(disagreements, vec!["brown"]);
    }
}
