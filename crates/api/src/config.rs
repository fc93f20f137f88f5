use pipeline::ProcessorConfig;
use query::ScoringStrategy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub mode: OperationMode,
    pub bind_addr: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub concurrency: ConcurrencyConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub processor: ProcessorConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Fast,      // Shallow refinement, keyword scoring, cache aggressively
    Accurate,  // Deep refinement, always fresh responses
    Balanced,  // Default: cache when available, standard depth
}

impl OperationMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fast" => Some(Self::Fast),
            "accurate" => Some(Self::Accurate),
            "balanced" => Some(Self::Balanced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub max_concurrent_requests: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: OperationMode::Balanced,
            bind_addr: "0.0.0.0:3000".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3".to_string(),
            concurrency: ConcurrencyConfig {
                max_concurrent_requests: 4,
                request_timeout_secs: 120,
            },
            retry: RetryConfig {
                max_retries: 3,
                initial_backoff_ms: 1000,
                max_backoff_ms: 10000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 10000,
            },
            processor: ProcessorConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn fast_mode() -> Self {
        let defaults = Self::default();
        Self {
            mode: OperationMode::Fast,
            concurrency: ConcurrencyConfig {
                max_concurrent_requests: 16,
                request_timeout_secs: 30,
            },
            retry: RetryConfig {
                max_retries: 2,
                initial_backoff_ms: 500,
                max_backoff_ms: 5000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 50000,
            },
            processor: ProcessorConfig {
                recursive_depth: 1,
                scoring: ScoringStrategy::Heuristic,
                ..defaults.processor.clone()
            },
            ..defaults
        }
    }

    pub fn accurate_mode() -> Self {
        let defaults = Self::default();
        Self {
            mode: OperationMode::Accurate,
            concurrency: ConcurrencyConfig {
                max_concurrent_requests: 2,
                request_timeout_secs: 300,
            },
            retry: RetryConfig {
                max_retries: 5,
                initial_backoff_ms: 2000,
                max_backoff_ms: 20000,
            },
            cache: CacheConfig {
                enabled: false,
                max_entries: 0,
            },
            processor: ProcessorConfig {
                recursive_depth: 4,
                ..defaults.processor.clone()
            },
            ..defaults
        }
    }

    pub fn for_mode(mode: OperationMode) -> Self {
        match mode {
            OperationMode::Fast => Self::fast_mode(),
            OperationMode::Accurate => Self::accurate_mode(),
            OperationMode::Balanced => Self::default(),
        }
    }

    /// Build from `AGENTIC_RAG_MODE`, `BIND_ADDR`, `OLLAMA_URL` and `OLLAMA_MODEL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mode = match lookup("AGENTIC_RAG_MODE") {
            Some(value) => OperationMode::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "unknown AGENTIC_RAG_MODE, using balanced");
                OperationMode::Balanced
            }),
            None => OperationMode::Balanced,
        };

        let mut config = Self::for_mode(mode);
        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            config.ollama_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            config.ollama_model = model;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.mode, OperationMode::Balanced);
        assert_eq!(config.processor.recursive_depth, 3);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_mode_and_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("AGENTIC_RAG_MODE", "Fast"),
            ("OLLAMA_URL", "http://gpu-box:11434/"),
            ("OLLAMA_MODEL", "mistral"),
        ]));

        assert_eq!(config.mode, OperationMode::Fast);
        assert_eq!(config.processor.recursive_depth, 1);
        assert_eq!(config.processor.scoring, ScoringStrategy::Heuristic);
        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.ollama_model, "mistral");
    }

    #[test]
    fn test_accurate_mode_disables_cache() {
        let config = AppConfig::from_lookup(lookup(&[("AGENTIC_RAG_MODE", "accurate")]));
        assert!(!config.cache.enabled);
        assert_eq!(config.processor.recursive_depth, 4);
    }

    #[test]
    fn test_unknown_mode_falls_back() {
        let config = AppConfig::from_lookup(lookup(&[("AGENTIC_RAG_MODE", "turbo")]));
        assert_eq!(config.mode, OperationMode::Balanced);
    }
}
