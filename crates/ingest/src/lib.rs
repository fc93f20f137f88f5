pub mod chunk;
pub mod chunker;
pub mod splitter;

pub use chunk::{Document, DocumentChunk, word_count};
pub use chunker::{Chunker, ChunkerConfig};
pub use splitter::SentenceSplitter;

use anyhow::{Result, ensure};

/// Wrap raw request strings into `Document` records, one per entry.
pub fn load_documents(raw: &[String]) -> Result<Vec<Document>> {
    ensure!(!raw.is_empty(), "no documents supplied");

    let documents = raw
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let mut doc = Document::new(format!("doc_{}", i), content.clone(), "request");
            doc.metadata.insert("index".to_string(), i.into());
            doc
        })
        .collect();

    Ok(documents)
}
