use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use crate::chunk::{Document, DocumentChunk};
use crate::splitter::SentenceSplitter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Target upper bound on chunk length, in characters.
    pub chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { chunk_size: 1000 }
    }
}

pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Group the document's sentences into at most `max_chunks` chunks.
    ///
    /// A chunk is sealed when the next sentence would push it past
    /// `chunk_size`; a single oversized sentence still becomes its own chunk.
    /// Offsets are character positions in the sentence stream joined by
    /// single spaces.
    pub fn chunk(&self, document: &Document, max_chunks: usize) -> Result<Vec<DocumentChunk>> {
        ensure!(self.config.chunk_size > 0, "chunk_size must be positive");

        let mut chunks = Vec::new();
        if max_chunks == 0 {
            return Ok(chunks);
        }

        let mut buffer = String::new();
        let mut buffer_chars = 0;
        let mut buffer_start = 0;
        let mut offset = 0;

        for sentence in SentenceSplitter::split(&document.content) {
            if sentence.is_empty() {
                continue;
            }
            let sentence_chars = sentence.chars().count();

            // If adding this sentence exceeds the target, flush buffer
            if !buffer.is_empty() && buffer_chars + 1 + sentence_chars > self.config.chunk_size {
                chunks.push(self.seal(document, &buffer, chunks.len(), buffer_start));
                buffer.clear();
                buffer_chars = 0;

                if chunks.len() >= max_chunks {
                    break;
                }
            }

            if buffer.is_empty() {
                buffer_start = offset;
            } else {
                buffer.push(' ');
                buffer_chars += 1;
            }
            buffer.push_str(&sentence);
            buffer_chars += sentence_chars;
            offset += sentence_chars + 1;
        }

        // Flush remaining buffer
        if !buffer.trim().is_empty() && chunks.len() < max_chunks {
            chunks.push(self.seal(document, &buffer, chunks.len(), buffer_start));
        }

        tracing::debug!(document = %document.id, chunks = chunks.len(), "chunked document");
        Ok(chunks)
    }

    fn seal(&self, document: &Document, buffer: &str, index: usize, start: usize) -> DocumentChunk {
        let content = buffer.trim().to_string();
        let end = start + content.chars().count();
        DocumentChunk::new(document.id.clone(), content, index, (start, end))
    }
}
