use futures::future::{BoxFuture, FutureExt};
use ingest::{DocumentChunk, SentenceSplitter};
use tracing::debug;

use crate::scorer::RelevanceScorer;

/// Chunks longer than this (in characters) are broken into sentences.
pub const PARAGRAPH_THRESHOLD: usize = 200;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefinedChunks {
    pub chunks: Vec<DocumentChunk>,
    /// Deepest level any branch descended to.
    pub levels: usize,
}

pub struct RecursiveRefiner<'a> {
    scorer: &'a RelevanceScorer,
}

impl<'a> RecursiveRefiner<'a> {
    pub fn new(scorer: &'a RelevanceScorer) -> Self {
        Self { scorer }
    }

    /// Drill into long chunks sentence by sentence, at most `depth` levels deep.
    ///
    /// A long chunk is replaced by its refined surviving sentences; when it
    /// has a single sentence or none of them score, it is kept as is.
    pub fn refine<'s>(
        &'s self,
        query: &'s str,
        chunks: Vec<DocumentChunk>,
        depth: usize,
    ) -> BoxFuture<'s, RefinedChunks> {
        async move {
            if depth == 0 || chunks.is_empty() {
                return RefinedChunks { chunks, levels: 0 };
            }

            let mut refined = Vec::with_capacity(chunks.len());
            let mut levels = 0;

            for chunk in chunks {
                if chunk.content.chars().count() <= PARAGRAPH_THRESHOLD {
                    refined.push(chunk);
                    continue;
                }

                let sentences = SentenceSplitter::split(&chunk.content);
                if sentences.len() <= 1 {
                    refined.push(chunk);
                    continue;
                }

                let children: Vec<DocumentChunk> = sentences
                    .into_iter()
                    .enumerate()
                    .map(|(i, sentence)| chunk.child(i, sentence))
                    .collect();

                let survivors = self.scorer.score(query, &children).await;
                if survivors.is_empty() {
                    refined.push(chunk);
                    continue;
                }

                debug!(
                    chunk_index = chunk.chunk_index,
                    sentences = children.len(),
                    survivors = survivors.len(),
                    depth,
                    "descending into chunk"
                );

                let branch = self.refine(query, survivors, depth - 1).await;
                levels = levels.max(branch.levels + 1);
                refined.extend(branch.chunks);
            }

            RefinedChunks { chunks: refined, levels }
        }
        .boxed()
    }
}
