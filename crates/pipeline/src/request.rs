use extract::{KnowledgeGraph, ProcessedChunk};
use serde::{Deserialize, Serialize};
use verify::FactVerification;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgenticRagRequest {
    pub query: String,
    pub documents: Vec<String>,
    #[serde(default)]
    pub options: ProcessingOptions,
}

/// Per-request overrides. Unset values fall back to the processor config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Per document. `Some(0)` counts as unset.
    pub max_chunks: Option<usize>,
    /// `Some(0)` disables refinement.
    pub recursive_depth: Option<usize>,
    pub enable_knowledge_graph: bool,
    pub enable_fact_verification: bool,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgenticRagResponse {
    pub answer: String,
    pub relevant_chunks: Vec<ProcessedChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact_verification: Option<FactVerification>,
    pub processing_metadata: ProcessingMetadata,
}

/// Observational counters; nothing reads them to make decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub chunks_processed: usize,
    pub recursive_levels: usize,
    /// Every generator call made for the request, failed ones included.
    pub model_calls: usize,
    /// Word-count approximation over successful calls.
    pub tokens_used: usize,
    pub processing_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_request() {
        let request: AgenticRagRequest =
            serde_json::from_str(r#"{"query": "What is X?", "documents": ["X is a letter."]}"#).unwrap();

        assert_eq!(request.documents.len(), 1);
        assert!(request.options.max_chunks.is_none());
        assert!(!request.options.enable_knowledge_graph);
    }

    #[test]
    fn test_optional_sections_are_omitted() {
        let response = AgenticRagResponse {
            answer: "a".to_string(),
            relevant_chunks: Vec::new(),
            knowledge_graph: None,
            fact_verification: None,
            processing_metadata: ProcessingMetadata::default(),
        };
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("knowledge_graph").is_none());
        assert!(json.get("fact_verification").is_none());
        assert_eq!(json["processing_metadata"]["model_calls"], 0);
    }
}
