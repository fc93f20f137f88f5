use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.,!?;:'"()]"#).expect("valid punctuation regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Resolves surface variants of an entity name to one canonical key.
#[derive(Default)]
pub struct EntityNormalizer {
    /// Maps normalized name -> canonical name
    aliases: HashMap<String, String>,
}

impl EntityNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize entity name: lowercase, strip punctuation, collapse whitespace,
    /// then resolve against names seen so far.
    pub fn normalize(&mut self, name: &str) -> String {
        let lowered = name.trim().to_lowercase();
        let stripped = PUNCTUATION.replace_all(&lowered, "");
        let normalized = WHITESPACE.replace_all(stripped.trim(), " ").to_string();

        if let Some(canonical) = self.aliases.get(&normalized) {
            return canonical.clone();
        }

        let found_canonical = self
            .aliases
            .iter()
            .find(|(existing, _)| Self::are_similar(&normalized, existing))
            .map(|(_, canonical)| canonical.clone());

        let canonical = found_canonical.unwrap_or_else(|| normalized.clone());
        self.aliases.insert(normalized, canonical.clone());
        canonical
    }

    /// Multi-word names sharing more than 70% of their words are the same entity.
    fn are_similar(a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }

        let words_a: Vec<&str> = a.split_whitespace().collect();
        let words_b: Vec<&str> = b.split_whitespace().collect();

        if words_a.len() > 1 && words_b.len() > 1 {
            let common = words_a.iter().filter(|w| words_b.contains(w)).count();
            let total = words_a.len().max(words_b.len());
            return common as f64 / total as f64 > 0.7;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let mut normalizer = EntityNormalizer::new();

        assert_eq!(normalizer.normalize("GraphRAG"), "graphrag");
        assert_eq!(normalizer.normalize("GraphRAG!"), "graphrag");
        assert_eq!(normalizer.normalize("  Graph   RAG  "), "graph rag");
    }

    #[test]
    fn test_alias_resolution() {
        let mut normalizer = EntityNormalizer::new();

        let n1 = normalizer.normalize("Rust Programming Language Foundation");
        let n2 = normalizer.normalize("The Rust Programming Language Foundation");
        assert_eq!(n1, n2);
    }

    #[test]
    fn test_short_names_are_not_merged_by_substring() {
        let mut normalizer = EntityNormalizer::new();

        let n1 = normalizer.normalize("AI");
        let n2 = normalizer.normalize("Air");
        assert_ne!(n1, n2);
    }
}
