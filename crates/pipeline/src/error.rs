use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DocumentLoading,
    Chunking,
    AnswerSynthesis,
    KnowledgeGraphExtraction,
    FactVerification,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::DocumentLoading => "document loading",
            Stage::Chunking => "chunking",
            Stage::AnswerSynthesis => "answer synthesis",
            Stage::KnowledgeGraphExtraction => "knowledge graph extraction",
            Stage::FactVerification => "fact verification",
        };
        f.write_str(name)
    }
}

/// A fatal pipeline failure, tagged with the stage that raised it.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct ProcessError {
    pub stage: Stage,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl ProcessError {
    pub fn new(stage: Stage, error: anyhow::Error) -> Self {
        Self {
            stage,
            source: error.into(),
        }
    }

    /// Adapter for `map_err`.
    pub fn at(stage: Stage) -> impl FnOnce(anyhow::Error) -> Self {
        move |error| Self::new(stage, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_stage() {
        let error = ProcessError::new(Stage::Chunking, anyhow::anyhow!("chunk_size must be positive"));
        assert_eq!(error.to_string(), "chunking failed: chunk_size must be positive");
        assert_eq!(error.stage, Stage::Chunking);
    }
}
