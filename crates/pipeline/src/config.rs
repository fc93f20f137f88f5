use extract::KnowledgeGraphConfig;
use query::ScoringStrategy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Target chunk length in characters.
    pub chunk_size: usize,
    pub max_chunks: usize,
    pub recursive_depth: usize,
    pub temperature: f32,
    pub scoring: ScoringStrategy,
    pub knowledge_graph: KnowledgeGraphConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            max_chunks: 20,
            recursive_depth: 3,
            temperature: 0.7,
            scoring: ScoringStrategy::Llm,
            knowledge_graph: KnowledgeGraphConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: ProcessorConfig =
            serde_json::from_str(r#"{"recursive_depth": 1, "scoring": "heuristic"}"#).unwrap();

        assert_eq!(config.recursive_depth, 1);
        assert_eq!(config.scoring, ScoringStrategy::Heuristic);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.max_chunks, 20);
        assert!(config.knowledge_graph.enabled);
    }
}
