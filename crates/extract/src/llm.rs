use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque text generation capability consumed by every LLM-backed stage.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String>;
}

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check that the Ollama server answers.
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client
            .get(&url)
            .send()
            .await
            .context("Failed to reach Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama health check failed: {}", response.status());
        }
        Ok(())
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(
            "http://localhost:11434".to_string(),
            "llama3".to_string(),
        )
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions { temperature },
        };

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama request failed: {}", response.status());
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(ollama_response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = OllamaRequest {
            model: "llama3".to_string(),
            prompt: "hi".to_string(),
            stream: false,
            options: OllamaOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.5);
    }
}
