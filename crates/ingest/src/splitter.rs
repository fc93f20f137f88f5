use regex::Regex;
use std::sync::LazyLock;

// A run of terminal punctuation followed by whitespace ends a sentence.
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?]+)\s+").expect("valid sentence boundary regex"));

pub struct SentenceSplitter;

impl SentenceSplitter {
    /// Split text into trimmed sentences, keeping their terminal punctuation.
    ///
    /// Never returns an empty list: text without any non-blank sentence comes
    /// back as a single element.
    pub fn split(text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut last = 0;

        for caps in SENTENCE_BOUNDARY.captures_iter(text) {
            let (Some(whole), Some(punct)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            Self::push_trimmed(&mut sentences, &text[last..punct.end()]);
            last = whole.end();
        }
        Self::push_trimmed(&mut sentences, &text[last..]);

        if sentences.is_empty() {
            sentences.push(text.trim().to_string());
        }

        sentences
    }

    fn push_trimmed(sentences: &mut Vec<String>, piece: &str) {
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_punctuation_runs() {
        let sentences = SentenceSplitter::split("First one. Second?! Third!\nFourth");
        assert_eq!(sentences, vec!["First one.", "Second?!", "Third!", "Fourth"]);
    }

    #[test]
    fn test_punctuation_without_whitespace_does_not_split() {
        let sentences = SentenceSplitter::split("Version 1.2 is out. See example.com now.");
        assert_eq!(sentences, vec!["Version 1.2 is out.", "See example.com now."]);
    }

    #[test]
    fn test_blank_input_yields_single_element() {
        assert_eq!(SentenceSplitter::split("   "), vec![String::new()]);
        assert_eq!(SentenceSplitter::split("no boundary"), vec!["no boundary"]);
    }
}
