use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SegmentError;

pub const DEFAULT_MAX_LENGTH: usize = 125;
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", ".", ";", ",", "?"];

/// Length budget and separator priority used to split a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub max_length: usize,
    pub separators: Vec<String>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SegmentConfig {
    pub fn segment(&self, text: &str) -> Result<Vec<ReadingUnit>, SegmentError> {
        split_document(text, self)
    }
}

/// One bounded-length piece of a document, presented to be read aloud
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingUnit {
    text: String,
    position: usize,
    max_length: usize,
}

impl ReadingUnit {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// A single word longer than the budget is the only unit allowed to exceed it
    pub fn is_oversized(&self) -> bool {
        char_len(&self.text) > self.max_length
    }
}

/// Split `text` into units using `config`, numbering them in reading order
pub fn split_document(text: &str, config: &SegmentConfig) -> Result<Vec<ReadingUnit>, SegmentError> {
    let units = segment(text, config.max_length, &config.separators)?
        .into_iter()
        .enumerate()
        .map(|(position, text)| ReadingUnit {
            text,
            position,
            max_length: config.max_length,
        })
        .collect::<Vec<_>>();

    debug!(units = units.len(), max_length = config.max_length, "document segmented");
    Ok(units)
}

/// Split `text` on `separators` (highest priority first), then enforce `max_length`
/// by comma sub-splitting and finally greedy word packing.
pub fn segment<S: AsRef<str>>(
    text: &str,
    max_length: usize,
    separators: &[S],
) -> Result<Vec<String>, SegmentError> {
    if max_length == 0 {
        return Err(SegmentError::ZeroMaxLength);
    }
    if separators.iter().any(|s| s.as_ref().is_empty()) {
        return Err(SegmentError::EmptySeparator);
    }

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut units = Vec::new();

    for piece in split_on_separators(&text, separators) {
        let piece = piece.replace('\n', " ");
        let piece = piece.trim();

        if char_len(piece) <= max_length {
            units.push(piece.to_string());
        } else {
            split_oversized(piece, max_length, &mut units);
        }
    }

    Ok(units)
}

fn split_on_separators<S: AsRef<str>>(text: &str, separators: &[S]) -> Vec<String> {
    let Some((separator, rest)) = separators.split_first() else {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            vec![]
        } else {
            vec![trimmed.to_string()]
        };
    };

    let separator = separator.as_ref();
    let parts: Vec<&str> = text.split(separator).collect();
    let last = parts.len() - 1;

    parts
        .iter()
        .enumerate()
        .flat_map(|(i, part)| {
            let piece = if i < last {
                format!("{}{}", part.trim(), separator)
            } else {
                part.trim().to_string()
            };
            split_on_separators(&piece, rest)
        })
        .collect()
}

fn split_oversized(unit: &str, max_length: usize, out: &mut Vec<String>) {
    let parts: Vec<&str> = unit.split(',').collect();
    let last = parts.len() - 1;

    for (i, part) in parts.iter().enumerate() {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let piece = if i < last {
            format!("{part},")
        } else {
            part.to_string()
        };

        if char_len(&piece) <= max_length {
            out.push(piece);
        } else {
            pack_words(&piece, max_length, out);
        }
    }
}

fn pack_words(text: &str, max_length: usize, out: &mut Vec<String>) {
    let mut buffer = String::new();

    for word in text.split_whitespace() {
        if char_len(&buffer) + char_len(word) + 1 <= max_length {
            if !buffer.is_empty() {
                buffer.push(' ');
            }
            buffer.push_str(word);
        } else {
            let full = std::mem::replace(&mut buffer, word.to_string());
            if !full.is_empty() {
                out.push(full);
            }
        }
    }

    if !buffer.is_empty() {
        out.push(buffer);
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn defaults(text: &str) -> Vec<String> {
        segment(text, DEFAULT_MAX_LENGTH, &DEFAULT_SEPARATORS).unwrap()
    }

    #[test]
    fn test_splits_sentences_then_packs_words() {
        let units = segment("Hello world. How are you?", 10, &[".", "?"]).unwrap();
        assert_eq!(units, vec!["Hello", "world.", "How are", "you?"]);
    }

    #[test]
    fn test_short_pieces_are_kept_whole() {
        let units = segment("Hello world. How are you?", 20, &[".", "?"]).unwrap();
        assert_eq!(units, vec!["Hello world.", "How are you?"]);
    }

    #[test]
    fn test_default_separator_priority() {
        let units = defaults("First sentence. Second one; third, fourth?\n\nNew paragraph.");
        assert_eq!(
            units,
            vec![
                "First sentence.",
                "Second one;",
                "third,",
                "fourth?",
                "New paragraph."
            ]
        );
    }

    #[test]
    fn test_separator_order_changes_result() {
        let text = "a, b. c";
        let by_period = segment(text, 100, &[".", ","]).unwrap();
        let by_comma = segment(text, 100, &[","]).unwrap();
        assert_eq!(by_period, vec!["a,", "b.", "c"]);
        assert_eq!(by_comma, vec!["a,", "b. c"]);
    }

    #[test]
    fn test_newlines_become_spaces() {
        let units = segment("one line\nand another.", 100, &["."]).unwrap();
        assert_eq!(units, vec!["one line and another."]);
    }

    #[test]
    fn test_crlf_paragraph_break() {
        let units = segment("first part\r\n\r\nsecond part", 100, &["\n\n"]).unwrap();
        assert_eq!(units, vec!["first part", "second part"]);
    }

    #[test]
    fn test_bare_carriage_return_is_a_line_break() {
        let units = segment("first part\r\rsecond\rpart", 100, &["\n\n"]).unwrap();
        assert_eq!(units, vec!["first part", "second part"]);
    }

    #[test]
    fn test_comma_sub_split_when_not_a_separator() {
        let units = segment("alpha beta, gamma delta", 12, &["."]).unwrap();
        assert_eq!(units, vec!["alpha beta,", "gamma delta"]);
    }

    #[test]
    fn test_comma_sub_split_skips_empty_pieces() {
        let units = segment("alpha beta,, gamma delta", 12, &["."]).unwrap();
        assert_eq!(units, vec!["alpha beta,", "gamma delta"]);
    }

    #[test]
    fn test_single_long_word_overflows_alone() {
        let units = segment("a supercalifragilistic word", 10, &["."]).unwrap();
        assert_eq!(units, vec!["a", "supercalifragilistic", "word"]);
    }

    #[test]
    fn test_leading_long_word_emits_no_empty_unit() {
        let units = segment("extraordinarily so", 10, &["."]).unwrap();
        assert_eq!(units, vec!["extraordinarily", "so"]);
        assert!(units.iter().all(|u| !u.is_empty()));
    }

    #[test]
    fn test_word_of_exact_budget_gets_its_own_unit() {
        let units = segment("abcde fg", 5, &["."]).unwrap();
        assert_eq!(units, vec!["abcde", "fg"]);
    }

    #[test]
    fn test_consecutive_separators_keep_punctuation() {
        let units = segment("wait.. what", 100, &["."]).unwrap();
        assert_eq!(units, vec!["wait.", ".", "what"]);
    }

    #[test]
    fn test_empty_and_blank_documents() {
        assert!(defaults("").is_empty());
        assert!(defaults("   \n\n  \t").is_empty());
    }

    #[test]
    fn test_invalid_parameters() {
        assert_matches!(
            segment("text", 0, &DEFAULT_SEPARATORS),
            Err(SegmentError::ZeroMaxLength)
        );
        assert_matches!(segment("text", 10, &["."; 0][..]), Ok(_));
        assert_matches!(
            segment("text", 10, &[".", ""]),
            Err(SegmentError::EmptySeparator)
        );
    }

    #[test]
    fn test_no_separators_uses_whole_text() {
        let units = segment("  just some words  ", 100, &[] as &[&str]).unwrap();
        assert_eq!(units, vec!["just some words"]);
    }

    #[test]
    fn test_length_bound_holds() {
        let text = "The quick brown fox jumps over the lazy dog while the cat, who was \
                    entirely unimpressed, watched from a windowsill and considered \
                    a nap; birds sang. Incomprehensibilities abound?";
        for max_length in [5, 12, 20, 40] {
            for unit in segment(text, max_length, &DEFAULT_SEPARATORS).unwrap() {
                let single_word = unit.split_whitespace().count() == 1;
                assert!(
                    unit.chars().count() <= max_length || single_word,
                    "unit {unit:?} exceeds {max_length}"
                );
            }
        }
    }

    #[test]
    fn test_non_whitespace_content_is_preserved() {
        let text = "Once upon a time, there was a reader.\n\nShe read; aloud? Yes.";
        let units = segment(text, 8, &DEFAULT_SEPARATORS).unwrap();
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(strip(&units.concat()), strip(text));
    }

    #[test]
    fn test_length_is_counted_in_chars() {
        let units = segment("ação é boa", 10, &["."]).unwrap();
        assert_eq!(units, vec!["ação é boa"]);
    }

    #[test]
    fn test_split_document_numbers_units() {
        let config = SegmentConfig {
            max_length: 10,
            separators: vec![".".into()],
        };
        let units = split_document("Short. Incomprehensible", &config).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].text(), "Short.");
        assert_eq!(units[0].position(), 0);
        assert_eq!(units[1].position(), 1);
        assert_eq!(units[1].max_length(), 10);
        assert!(!units[0].is_oversized());
        assert!(units[1].is_oversized());
    }

    #[test]
    fn test_segment_config_default() {
        let config = SegmentConfig::default();
        assert_eq!(config.max_length, 125);
        assert_eq!(config.separators, vec!["\n\n", ".", ";", ",", "?"]);
        assert_eq!(config.segment("").unwrap(), vec![]);
    }
}
