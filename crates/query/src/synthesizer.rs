use anyhow::{Context, Result};
use extract::TextGenerator;
use ingest::{DocumentChunk, word_count};
use std::sync::Arc;

/// Answer returned when refinement left nothing to answer from.
pub const INSUFFICIENT_INFORMATION: &str =
    "I don't have enough information in the provided documents to answer this question.";

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// `words(prompt) + words(response)`; the generator reports no usage.
    pub tokens_used: usize,
}

pub struct AnswerSynthesizer {
    generator: Arc<dyn TextGenerator>,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate(
        &self,
        query: &str,
        chunks: &[DocumentChunk],
        temperature: f32,
    ) -> Result<Answer> {
        if chunks.is_empty() {
            return Ok(Answer {
                text: INSUFFICIENT_INFORMATION.to_string(),
                tokens_used: 0,
            });
        }

        let context = build_context(chunks);
        let prompt = format!(
            r#"You are a helpful assistant answering questions based on the provided context.

CONTEXT:
{}
USER QUESTION: {}

INSTRUCTIONS:
- Answer the question using only information from the context above
- Cite the sources you rely on as [Source N]
- If the context doesn't contain enough information, state explicitly what is missing
- Keep your answer concise and factual

ANSWER:"#,
            context, query
        );

        let response = self
            .generator
            .generate(&prompt, temperature)
            .await
            .context("Failed to generate answer")?;

        let text = response.trim().to_string();
        Ok(Answer {
            tokens_used: word_count(&prompt) + word_count(&text),
            text,
        })
    }
}

fn build_context(chunks: &[DocumentChunk]) -> String {
    let mut context = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        context.push_str(&format!(
            "[Source {}] (document {}, chunk {})\n{}\n\n",
            i + 1,
            chunk.document_id,
            chunk.chunk_index,
            chunk.content
        ));
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::testing::{FailingGenerator, ScriptedGenerator};

    #[tokio::test]
    async fn test_empty_chunks_is_insufficient_information() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let synthesizer = AnswerSynthesizer::new(generator.clone());

        let answer = synthesizer.generate("What is X?", &[], 0.7).await.unwrap();
        assert_eq!(answer.text, INSUFFICIENT_INFORMATION);
        assert_eq!(answer.tokens_used, 0);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_carries_context_and_tokens_are_counted() {
        let generator = Arc::new(ScriptedGenerator::new(vec![" X is a letter [Source 1]. ".to_string()]));
        let synthesizer = AnswerSynthesizer::new(generator.clone());
        let chunks = vec![DocumentChunk::new("doc_3".into(), "X is a letter.".into(), 2, (0, 14))];

        let answer = synthesizer.generate("What is X?", &chunks, 0.2).await.unwrap();

        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("[Source 1] (document doc_3, chunk 2)\nX is a letter."));
        assert!(prompt.contains("USER QUESTION: What is X?"));
        assert_eq!(answer.text, "X is a letter [Source 1].");
        assert_eq!(answer.tokens_used, word_count(prompt) + 6);
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(FailingGenerator));
        let chunks = vec![DocumentChunk::new("doc_0".into(), "text".into(), 0, (0, 4))];

        assert!(synthesizer.generate("q", &chunks, 0.7).await.is_err());
    }
}
