//! Flesch reading ease

/// `206.835 - 1.015 * (words / sentences) - 84.6 * (syllables / words)`,
/// rounded to two decimals. Text without words scores 206.835.
pub fn flesch_reading_ease(text: &str, sentence_count: usize) -> f32 {
    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .collect();

    if words.is_empty() {
        return 206.835;
    }

    let syllables: usize = words.iter().map(|w| syllable_count(w)).sum();
    let words_per_sentence = words.len() as f64 / sentence_count.max(1) as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;

    let score = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;
    ((score * 100.0).round() / 100.0) as f32
}

/// Estimated syllables in one word: vowel groups, less a silent final `e`,
/// at least one
pub fn syllable_count(word: &str) -> usize {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();

    if letters.is_empty() {
        return 0;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut groups = 0;
    let mut in_group = false;
    for &c in &letters {
        let vowel = is_vowel(c);
        if vowel && !in_group {
            groups += 1;
        }
        in_group = vowel;
    }

    let n = letters.len();
    let silent_e = n > 2 && letters[n - 1] == 'e' && !(letters[n - 2] == 'l' && !is_vowel(letters[n - 3]));
    if silent_e && groups > 1 {
        groups -= 1;
    }

    groups.max(1)
}
