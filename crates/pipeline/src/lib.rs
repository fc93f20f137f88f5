pub mod config;
pub mod error;
pub mod metered;
pub mod request;
pub mod stream;

pub use config::ProcessorConfig;
pub use error::{ProcessError, Stage};
pub use metered::MeteredGenerator;
pub use request::{AgenticRagRequest, AgenticRagResponse, ProcessingMetadata, ProcessingOptions};

use extract::{KnowledgeGraphExtractor, ProcessedChunk, TextGenerator};
use ingest::{Chunker, ChunkerConfig};
use query::{AnswerSynthesizer, RecursiveRefiner, RelevanceScorer};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use verify::FactVerifier;

/// Request options with configuration defaults applied.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResolvedOptions {
    max_chunks: usize,
    recursive_depth: usize,
    temperature: f32,
    knowledge_graph: bool,
    fact_verification: bool,
}

/// Runs one request through chunking, scoring, refinement, synthesis and
/// the optional graph and verification stages.
pub struct Processor {
    generator: Arc<dyn TextGenerator>,
    config: ProcessorConfig,
}

impl Processor {
    pub fn new(generator: Arc<dyn TextGenerator>, config: ProcessorConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub async fn process(
        &self,
        request: AgenticRagRequest,
    ) -> Result<AgenticRagResponse, ProcessError> {
        let started = Instant::now();
        let options = self.resolve(&request.options);
        let query = request.query.as_str();

        // Every stage shares one meter so the metadata sees all model calls
        let meter = Arc::new(MeteredGenerator::new(self.generator.clone()));
        let generator: Arc<dyn TextGenerator> = meter.clone();

        info!(
            documents = request.documents.len(),
            max_chunks = options.max_chunks,
            depth = options.recursive_depth,
            "processing request"
        );

        // Step 1: Wrap raw documents
        let documents =
            ingest::load_documents(&request.documents).map_err(ProcessError::at(Stage::DocumentLoading))?;

        // Step 2: Chunk every document
        let chunker = Chunker::new(ChunkerConfig {
            chunk_size: self.config.chunk_size,
        });
        let mut chunks = Vec::new();
        for document in &documents {
            let document_chunks = chunker
                .chunk(document, options.max_chunks)
                .map_err(ProcessError::at(Stage::Chunking))?;
            chunks.extend(document_chunks);
        }
        let chunks_processed = chunks.len();

        // Step 3: Initial relevance filter
        let scorer = RelevanceScorer::new(generator.clone(), self.config.scoring);
        let relevant = scorer.score(query, &chunks).await;
        debug!(chunks = chunks_processed, relevant = relevant.len(), "initial relevance");

        // Step 4: Drill down
        let refiner = RecursiveRefiner::new(&scorer);
        let refined = refiner.refine(query, relevant, options.recursive_depth).await;

        // Step 5: Answer
        let answer = AnswerSynthesizer::new(generator.clone())
            .generate(query, &refined.chunks, options.temperature)
            .await
            .map_err(ProcessError::at(Stage::AnswerSynthesis))?;

        // Step 6: Knowledge graph
        let knowledge_graph = if options.knowledge_graph {
            KnowledgeGraphExtractor::new(generator.clone(), self.config.knowledge_graph.clone())
                .extract(&refined.chunks)
                .await
                .map_err(ProcessError::at(Stage::KnowledgeGraphExtraction))?
        } else {
            None
        };

        // Step 7: Fact verification
        let fact_verification = if options.fact_verification {
            FactVerifier::new(generator.clone())
                .verify(&answer.text, &refined.chunks)
                .await
                .map_err(ProcessError::at(Stage::FactVerification))?
        } else {
            None
        };

        let relevant_chunks = match &knowledge_graph {
            Some(graph) => graph.attribute(&refined.chunks),
            None => refined.chunks.into_iter().map(ProcessedChunk::from).collect(),
        };

        let processing_metadata = ProcessingMetadata {
            chunks_processed,
            recursive_levels: refined.levels,
            model_calls: meter.calls(),
            tokens_used: meter.tokens(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            relevant_chunks = relevant_chunks.len(),
            levels = processing_metadata.recursive_levels,
            model_calls = processing_metadata.model_calls,
            elapsed_ms = processing_metadata.processing_time_ms,
            "request processed"
        );

        Ok(AgenticRagResponse {
            answer: answer.text,
            relevant_chunks,
            knowledge_graph,
            fact_verification,
            processing_metadata,
        })
    }

    fn resolve(&self, options: &ProcessingOptions) -> ResolvedOptions {
        ResolvedOptions {
            max_chunks: options
                .max_chunks
                .filter(|&n| n > 0)
                .unwrap_or(self.config.max_chunks),
            recursive_depth: options.recursive_depth.unwrap_or(self.config.recursive_depth),
            temperature: options.temperature.unwrap_or(self.config.temperature),
            knowledge_graph: options.enable_knowledge_graph && self.config.knowledge_graph.enabled,
            fact_verification: options.enable_fact_verification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::testing::ScriptedGenerator;

    fn processor(config: ProcessorConfig) -> Processor {
        Processor::new(Arc::new(ScriptedGenerator::new(vec![])), config)
    }

    #[test]
    fn test_defaults_fill_unset_options() {
        let resolved = processor(ProcessorConfig::default()).resolve(&ProcessingOptions::default());

        assert_eq!(resolved.max_chunks, 20);
        assert_eq!(resolved.recursive_depth, 3);
        assert_eq!(resolved.temperature, 0.7);
        assert!(!resolved.knowledge_graph);
        assert!(!resolved.fact_verification);
    }

    #[test]
    fn test_explicit_options_win() {
        let options = ProcessingOptions {
            max_chunks: Some(0),
            recursive_depth: Some(0),
            temperature: Some(0.0),
            enable_knowledge_graph: true,
            enable_fact_verification: true,
        };
        let resolved = processor(ProcessorConfig::default()).resolve(&options);

        assert_eq!(resolved.max_chunks, 20);
        assert_eq!(resolved.recursive_depth, 0);
        assert_eq!(resolved.temperature, 0.0);
        assert!(resolved.knowledge_graph);
        assert!(resolved.fact_verification);
    }

    #[test]
    fn test_graph_needs_config_flag_too() {
        let mut config = ProcessorConfig::default();
        config.knowledge_graph.enabled = false;
        let options = ProcessingOptions {
            enable_knowledge_graph: true,
            ..Default::default()
        };

        assert!(!processor(config).resolve(&options).knowledge_graph);
    }
}
