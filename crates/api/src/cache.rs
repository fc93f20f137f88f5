use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use extract::TextGenerator;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Model responses keyed by prompt and temperature.
pub struct Cache {
    llm_responses: Arc<DashMap<String, String>>,
    max_entries: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl Cache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            llm_responses: Arc::new(DashMap::new()),
            max_entries,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Cache an LLM response
    pub fn set_llm_response(&self, prompt: &str, temperature: f32, response: String) {
        if self.max_entries == 0 {
            return;
        }
        if self.llm_responses.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self.llm_responses.iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.llm_responses.remove(&key);
            }
        }
        let key = self.key(prompt, temperature);
        self.llm_responses.insert(key, response);
    }

    pub fn get_llm_response(&self, prompt: &str, temperature: f32) -> Option<String> {
        let key = self.key(prompt, temperature);
        let found = self.llm_responses.get(&key).map(|r| r.value().clone());
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn key(&self, prompt: &str, temperature: f32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        hasher.update(temperature.to_bits().to_le_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            llm_responses_cached: self.llm_responses.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct CacheStats {
    pub llm_responses_cached: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Serves repeated prompts from the cache.
pub struct CachingGenerator {
    inner: Arc<dyn TextGenerator>,
    cache: Arc<Cache>,
}

impl CachingGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>, cache: Arc<Cache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl TextGenerator for CachingGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        if let Some(response) = self.cache.get_llm_response(prompt, temperature) {
            return Ok(response);
        }
        let response = self.inner.generate(prompt, temperature).await?;
        self.cache.set_llm_response(prompt, temperature, response.clone());
        Ok(response)
    }
}
