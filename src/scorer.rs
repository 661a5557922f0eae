use serde::Serialize;
use std::collections::BTreeSet;

use crate::util::percentage;

/// Overlap between a reference unit and a transcript, counted over word sets
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MatchResult {
    pub matched_count: usize,
    pub total_count: usize,
    pub missing_words: BTreeSet<String>,
}

impl MatchResult {
    /// Recall percentage, or `None` when the reference has no scorable words
    pub fn recall(&self) -> Option<f64> {
        (self.total_count > 0).then(|| percentage(self.matched_count, self.total_count))
    }

    pub fn is_perfect(&self) -> bool {
        self.missing_words.is_empty()
    }
}

/// One transcript token with whether the reference contains it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightedToken {
    pub token: String,
    pub matched: bool,
}

/// Lowercase a token and drop ASCII punctuation
pub fn normalize_word(token: &str) -> String {
    token
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .to_lowercase()
}

/// Vocabulary of `text`: punctuation stripped, lowercased, split on whitespace
pub fn normalize(text: &str) -> BTreeSet<String> {
    normalize_word(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Bag-of-words recall of `reference` in `transcript`.
///
/// Extra transcript words are not penalised and repeated words count once.
pub fn score(reference: &str, transcript: &str) -> MatchResult {
    let reference_words = normalize(reference);
    let transcript_words = normalize(transcript);

    let missing_words: BTreeSet<String> = reference_words
        .difference(&transcript_words)
        .cloned()
        .collect();

    MatchResult {
        matched_count: reference_words.len() - missing_words.len(),
        total_count: reference_words.len(),
        missing_words,
    }
}

/// Mark each transcript token, in spoken order and original spelling,
/// by whether its normalised form is in the reference vocabulary.
pub fn highlight(reference: &str, transcript: &str) -> Vec<HighlightedToken> {
    let reference_words = normalize(reference);

    transcript
        .split_whitespace()
        .map(|token| {
            let word = normalize_word(token);
            HighlightedToken {
                token: token.to_string(),
                matched: !word.is_empty() && reference_words.contains(&word),
            }
        })
        .collect()
}
