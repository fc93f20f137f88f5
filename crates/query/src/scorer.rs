use extract::{TextGenerator, json};
use ingest::DocumentChunk;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Chunks must score strictly above this to be retained.
pub const RELEVANCE_THRESHOLD: f32 = 0.3;

const SCORING_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringStrategy {
    /// Ask the model, falling back to keyword overlap on failure.
    #[default]
    Llm,
    /// Keyword overlap only.
    Heuristic,
}

#[derive(Debug, Error)]
pub enum ScoreParseError {
    #[error("relevance generation failed: {0}")]
    Generation(anyhow::Error),

    #[error("no JSON array in relevance response")]
    NoJsonArray,

    #[error("invalid relevance JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A validated score for the chunk at `index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredIndex {
    pub index: usize,
    pub score: f32,
}

/// One entry as the model wrote it. Indices are signed so a stray negative
/// entry is dropped on its own instead of failing the whole array.
#[derive(Debug, Deserialize)]
struct RawScore {
    index: i64,
    score: f32,
}

pub struct RelevanceScorer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl RelevanceScorer {
    pub fn new(generator: Arc<dyn TextGenerator>, strategy: ScoringStrategy) -> Self {
        let generator = match strategy {
            ScoringStrategy::Llm => Some(generator),
            ScoringStrategy::Heuristic => None,
        };
        Self { generator }
    }

    pub fn heuristic() -> Self {
        Self { generator: None }
    }

    /// Score `chunks` against `query` and keep the best ones.
    ///
    /// Retained chunks score above [`RELEVANCE_THRESHOLD`], are ordered by
    /// descending score (ties keep input order) and number at most half the
    /// input, so repeated scoring always shrinks the candidate set.
    pub async fn score(&self, query: &str, chunks: &[DocumentChunk]) -> Vec<DocumentChunk> {
        if chunks.is_empty() {
            return Vec::new();
        }

        let scores = match &self.generator {
            Some(generator) => match Self::llm_scores(generator.as_ref(), query, chunks).await {
                Ok(scores) => scores,
                Err(e) => {
                    warn!(error = %e, chunks = chunks.len(), "falling back to keyword relevance");
                    Self::heuristic_scores(query, chunks)
                }
            },
            None => Self::heuristic_scores(query, chunks),
        };

        let selected = Self::select(chunks, scores);
        debug!(candidates = chunks.len(), retained = selected.len(), "scored chunks");
        selected
    }

    /// Fraction of query words occurring in the lower-cased content.
    pub fn heuristic_score(query: &str, content: &str) -> f32 {
        let words = query_words(query);
        if words.is_empty() {
            return 0.0;
        }

        let text = content.to_lowercase();
        let matches = words.iter().filter(|w| text.contains(w.as_str())).count();
        matches as f32 / words.len() as f32
    }

    fn heuristic_scores(query: &str, chunks: &[DocumentChunk]) -> Vec<ScoredIndex> {
        chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| ScoredIndex {
                index,
                score: Self::heuristic_score(query, &chunk.content),
            })
            .filter(|s| s.score > RELEVANCE_THRESHOLD)
            .collect()
    }

    async fn llm_scores(
        generator: &dyn TextGenerator,
        query: &str,
        chunks: &[DocumentChunk],
    ) -> Result<Vec<ScoredIndex>, ScoreParseError> {
        let prompt = build_scoring_prompt(query, chunks);
        let response = generator
            .generate(&prompt, SCORING_TEMPERATURE)
            .await
            .map_err(ScoreParseError::Generation)?;

        let body = json::json_array(&response).ok_or(ScoreParseError::NoJsonArray)?;
        let parsed: Vec<RawScore> = serde_json::from_str(body)?;

        let scores = parsed
            .into_iter()
            .filter_map(|raw| {
                let index = usize::try_from(raw.index).ok().filter(|&i| i < chunks.len());
                if index.is_none() {
                    warn!(index = raw.index, chunks = chunks.len(), "ignoring out-of-range chunk index");
                }
                Some(ScoredIndex {
                    index: index?,
                    score: if raw.score.is_nan() { 0.0 } else { raw.score.clamp(0.0, 1.0) },
                })
            })
            .filter(|s| s.score > RELEVANCE_THRESHOLD)
            .collect();

        Ok(scores)
    }

    fn select(chunks: &[DocumentChunk], mut scores: Vec<ScoredIndex>) -> Vec<DocumentChunk> {
        // Input order first so the stable sort below breaks ties by position
        scores.sort_by_key(|s| s.index);
        scores.dedup_by_key(|s| s.index);
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores.truncate(chunks.len() / 2);

        scores
            .into_iter()
            .map(|s| chunks[s.index].clone().with_score(s.score))
            .collect()
    }
}

fn query_words(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

fn build_scoring_prompt(query: &str, chunks: &[DocumentChunk]) -> String {
    let mut listing = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        listing.push_str(&format!("[{}] {}\n\n", i, chunk.content));
    }

    format!(
        r#"Rate how relevant each text chunk is to the query.

QUERY: {}

CHUNKS:
{}
INSTRUCTIONS:
- Score each chunk from 0.0 (irrelevant) to 1.0 (directly answers the query)
- Only include chunks scoring above {}
- Output ONLY a JSON array like [{{"index": 0, "score": 0.85}}], no explanations

RELEVANCE SCORES:"#,
        query, listing, RELEVANCE_THRESHOLD
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::testing::{FailingGenerator, ScriptedGenerator};

    fn chunk(i: usize, content: &str) -> DocumentChunk {
        DocumentChunk::new("doc_0".into(), content.into(), i, (0, content.len()))
    }

    fn corpus() -> Vec<DocumentChunk> {
        vec![
            chunk(0, "Rust has a borrow checker."),
            chunk(1, "Bananas are yellow."),
            chunk(2, "The borrow checker enforces ownership in Rust."),
            chunk(3, "Ownership is moved on assignment."),
        ]
    }

    #[test]
    fn test_heuristic_score() {
        let score = RelevanceScorer::heuristic_score("Rust borrow checker?", "The Rust borrow rules");
        assert!((score - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(RelevanceScorer::heuristic_score("", "anything"), 0.0);
        assert_eq!(RelevanceScorer::heuristic_score("?! ...", "anything"), 0.0);
    }

    #[tokio::test]
    async fn test_heuristic_ranking_and_halving() {
        let scorer = RelevanceScorer::heuristic();
        let scored = scorer.score("rust borrow checker", &corpus()).await;

        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].chunk_index, 0);
        assert_eq!(scored[1].chunk_index, 2);
        assert!(scored.iter().all(|c| (0.0..=1.0).contains(&c.relevance_score)));
    }

    #[tokio::test]
    async fn test_empty_query_retains_nothing() {
        let scored = RelevanceScorer::heuristic().score("", &corpus()).await;
        assert!(scored.is_empty());
    }

    #[tokio::test]
    async fn test_llm_scores_are_validated() {
        let generator = ScriptedGenerator::new(vec![
            r#"Here you go: [{"index": 3, "score": 0.9}, {"index": 7, "score": 1.0}, {"index": 1, "score": 0.2}, {"index": 0, "score": 4.0}]"#
                .to_string(),
        ]);
        let scorer = RelevanceScorer::new(Arc::new(generator), ScoringStrategy::Llm);
        let scored = scorer.score("anything", &corpus()).await;

        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].chunk_index, 0);
        assert_eq!(scored[0].relevance_score, 1.0);
        assert_eq!(scored[1].chunk_index, 3);
    }

    #[tokio::test]
    async fn test_negative_index_is_dropped_not_fatal() {
        let generator = ScriptedGenerator::new(vec![
            r#"[{"index": 1, "score": 0.9}, {"index": -1, "score": 0.5}]"#.to_string(),
        ]);
        let scorer = RelevanceScorer::new(Arc::new(generator), ScoringStrategy::Llm);
        let bananas: Vec<_> = (0..4).map(|i| chunk(i, "Bananas are yellow.")).collect();

        let scored = scorer.score("rust", &bananas).await;

        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].chunk_index, 1);
        assert_eq!(scored[0].relevance_score, 0.9);
    }

    #[tokio::test]
    async fn test_falls_back_on_generation_failure() {
        let scorer = RelevanceScorer::new(Arc::new(FailingGenerator), ScoringStrategy::Llm);
        let fallback = scorer.score("rust borrow checker", &corpus()).await;
        let heuristic = RelevanceScorer::heuristic().score("rust borrow checker", &corpus()).await;

        assert_eq!(fallback, heuristic);
    }

    #[tokio::test]
    async fn test_falls_back_on_unparseable_response() {
        let generator = Arc::new(ScriptedGenerator::new(vec!["chunk 0 looks good".to_string()]));
        let scorer = RelevanceScorer::new(generator.clone(), ScoringStrategy::Llm);
        let scored = scorer.score("rust borrow checker", &corpus()).await;

        assert_eq!(generator.calls(), 1);
        assert_eq!(scored.len(), 2);
    }

    #[tokio::test]
    async fn test_heuristic_strategy_never_calls_model() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let scorer = RelevanceScorer::new(generator.clone(), ScoringStrategy::Heuristic);
        scorer.score("rust", &corpus()).await;

        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_never_more_than_half() {
        let scorer = RelevanceScorer::heuristic();
        for n in 1..6 {
            let chunks: Vec<_> = (0..n).map(|i| chunk(i, "rust rust rust")).collect();
            let scored = scorer.score("rust", &chunks).await;
            assert_eq!(scored.len(), n / 2);
        }
    }
}
