use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Raw input document. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub source: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            source: source.into(),
            metadata: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub content: String,
    pub document_id: String,
    /// Sub-chunks encode their lineage as `parent * 100 + child`.
    pub chunk_index: usize,
    pub start_index: usize,
    pub end_index: usize,
    /// 0.0 until scored, then in [0, 1].
    #[serde(default)]
    pub relevance_score: f32,
}

impl DocumentChunk {
    pub fn new(
        document_id: String,
        content: String,
        chunk_index: usize,
        offset: (usize, usize), // [start, end] character positions
    ) -> Self {
        let id = Self::generate_chunk_id(&document_id, &content, chunk_index, offset);

        Self {
            id,
            content,
            document_id,
            chunk_index,
            start_index: offset.0,
            end_index: offset.1,
            relevance_score: 0.0,
        }
    }

    /// Sentence-level child of this chunk. Offsets are inherited from the parent.
    pub fn child(&self, child_index: usize, content: String) -> Self {
        Self::new(
            self.document_id.clone(),
            content,
            self.chunk_index * 100 + child_index,
            (self.start_index, self.end_index),
        )
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.relevance_score = score.clamp(0.0, 1.0);
        self
    }

    fn generate_chunk_id(
        document_id: &str,
        content: &str,
        chunk_index: usize,
        offset: (usize, usize),
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(document_id.as_bytes());
        hasher.update(content.as_bytes());
        hasher.update(chunk_index.to_string().as_bytes());
        hasher.update(offset.0.to_string().as_bytes());
        hasher.update(offset.1.to_string().as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16]) // Use first 16 bytes (32 hex chars)
    }
}

/// Whitespace-separated word count, used for token approximation.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_is_stable() {
        let a = DocumentChunk::new("doc_0".into(), "Hello.".into(), 0, (0, 6));
        let b = DocumentChunk::new("doc_0".into(), "Hello.".into(), 0, (0, 6));
        let c = DocumentChunk::new("doc_1".into(), "Hello.".into(), 0, (0, 6));

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 32);
    }

    #[test]
    fn test_child_keeps_lineage() {
        let parent = DocumentChunk::new("doc_0".into(), "One. Two.".into(), 3, (10, 19));
        let child = parent.child(1, "Two.".into());

        assert_eq!(child.chunk_index, 301);
        assert_eq!(child.document_id, "doc_0");
        assert_eq!((child.start_index, child.end_index), (10, 19));
        assert_eq!(child.relevance_score, 0.0);
    }

    #[test]
    fn test_score_is_clamped() {
        let chunk = DocumentChunk::new("d".into(), "x".into(), 0, (0, 1));
        assert_eq!(chunk.clone().with_score(1.7).relevance_score, 1.0);
        assert_eq!(chunk.with_score(-0.2).relevance_score, 0.0);
    }
}
