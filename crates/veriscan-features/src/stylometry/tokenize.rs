//! Treebank-style word tokenization

use regex::Regex;
use veriscan_core::{Error, Result};

/// Numbers with separators, words with inner apostrophes, or single symbols
const WORD_PATTERN: &str = r"\d+(?:[.,]\d+)+|\w+(?:['’]\w+)*|[^\w\s]";

/// Splits text into word and punctuation tokens.
///
/// Contractions are split the Treebank way: `don't` becomes `do` + `n't`
/// and `it's` becomes `it` + `'s`.
#[derive(Debug, Clone)]
pub struct WordTokenizer {
    pattern: Regex,
}

impl WordTokenizer {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(WORD_PATTERN)
            .map_err(|e| Error::internal(format!("Invalid word pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    pub fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut tokens = Vec::new();
        for m in self.pattern.find_iter(text) {
            split_contraction(m.as_str(), &mut tokens);
        }
        tokens
    }
}

fn split_contraction<'a>(token: &'a str, out: &mut Vec<&'a str>) {
    let Some(apostrophe) = token.find(['\'', '’']) else {
        out.push(token);
        return;
    };

    let lower_has_nt = token.len() > 3
        && token[..apostrophe].ends_with(['n', 'N'])
        && token[apostrophe..].chars().skip(1).collect::<String>().eq_ignore_ascii_case("t");

    if lower_has_nt {
        let split = apostrophe - 1;
        if split > 0 {
            out.push(&token[..split]);
        }
        out.push(&token[split..]);
    } else if apostrophe > 0 {
        out.push(&token[..apostrophe]);
        out.push(&token[apostrophe..]);
    } else {
        out.push(token);
    }
}
