use anyhow::Result;
use async_trait::async_trait;
use extract::TextGenerator;
use ingest::word_count;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts calls and approximate tokens for one request.
pub struct MeteredGenerator {
    inner: Arc<dyn TextGenerator>,
    calls: AtomicUsize,
    tokens: AtomicUsize,
}

impl MeteredGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            tokens: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn tokens(&self) -> usize {
        self.tokens.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TextGenerator for MeteredGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let response = self.inner.generate(prompt, temperature).await?;
        self.tokens
            .fetch_add(word_count(prompt) + word_count(&response), Ordering::Relaxed);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::testing::{FailingGenerator, ScriptedGenerator};

    #[tokio::test]
    async fn test_counts_calls_and_tokens() {
        let meter = MeteredGenerator::new(Arc::new(ScriptedGenerator::new(vec![
            "three word reply".to_string(),
        ])));

        meter.generate("a two", 0.5).await.unwrap();
        assert!(meter.generate("again", 0.5).await.is_err());

        assert_eq!(meter.calls(), 2);
        assert_eq!(meter.tokens(), 5);
    }

    #[tokio::test]
    async fn test_failed_calls_add_no_tokens() {
        let meter = MeteredGenerator::new(Arc::new(FailingGenerator));
        assert!(meter.generate("prompt words", 0.5).await.is_err());
        assert_eq!(meter.calls(), 1);
        assert_eq!(meter.tokens(), 0);
    }
}
