//! Deterministic generators for exercising LLM-backed stages without a model.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm::TextGenerator;

/// Replays canned responses.
///
/// Routes are checked first: the first route whose marker occurs in the prompt
/// answers it. Otherwise the next queued response is returned, and an empty
/// queue is a generation error.
#[derive(Default)]
pub struct ScriptedGenerator {
    queue: Mutex<VecDeque<String>>,
    routes: Vec<(String, String)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            queue: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    /// Answer any prompt containing `marker` with `response`.
    pub fn with_route(mut self, marker: impl Into<String>, response: impl Into<String>) -> Self {
        self.routes.push((marker.into(), response.into()));
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, _temperature: f32) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some((_, response)) = self.routes.iter().find(|(marker, _)| prompt.contains(marker)) {
            return Ok(response.clone());
        }

        match self.queue.lock().unwrap().pop_front() {
            Some(response) => Ok(response),
            None => bail!("scripted generator has no response left"),
        }
    }
}

/// Fails every call, as an unreachable model would.
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<String> {
        bail!("model unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_win_over_queue() {
        let generator = ScriptedGenerator::new(vec!["queued".to_string()])
            .with_route("ANSWER:", "routed");

        assert_eq!(generator.generate("... ANSWER:", 0.0).await.unwrap(), "routed");
        assert_eq!(generator.generate("other", 0.0).await.unwrap(), "queued");
        assert!(generator.generate("other", 0.0).await.is_err());
        assert_eq!(generator.calls(), 3);
    }
}
