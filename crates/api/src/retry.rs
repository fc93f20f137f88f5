use anyhow::Result;
use async_trait::async_trait;
use extract::TextGenerator;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{warn, info};

use crate::config::RetryConfig;

pub struct RetryPolicy {
    max_retries: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.initial_backoff_ms, config.max_backoff_ms)
    }

    /// Retry a future with exponential backoff
    pub async fn retry<F, Fut, T, E>(&self, operation_name: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            "Operation succeeded after retries"
                        );
                    }
                    return Ok(result);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        warn!(
                            operation = operation_name,
                            attempts = attempt,
                            error = %e,
                            "Operation failed after max retries"
                        );
                        return Err(e);
                    }

                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis(),
                        error = %e,
                        "Operation failed, retrying"
                    );

                    sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, self.max_backoff);
                }
            }
        }
    }
}

/// Retries a single generator; it never switches providers.
pub struct RetryingGenerator {
    inner: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl RetryingGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl TextGenerator for RetryingGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.policy
            .retry("generate", || self.inner.generate(prompt, temperature))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::testing::{FailingGenerator, ScriptedGenerator};

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        // Two failures, then success
        let policy = RetryPolicy::new(3, 0, 0);
        let mut failures = 2;
        let result: Result<&str, String> = policy
            .retry("flaky", || {
                let outcome = if failures > 0 {
                    failures -= 1;
                    Err("transient".to_string())
                } else {
                    Ok("done")
                };
                async move { outcome }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(failures, 0);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let inner = Arc::new(ScriptedGenerator::new(vec![]));
        let generator = RetryingGenerator::new(inner.clone(), RetryPolicy::new(2, 0, 0));

        assert!(generator.generate("p", 0.5).await.is_err());
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_passes_success_through() {
        let generator = RetryingGenerator::new(
            Arc::new(ScriptedGenerator::new(vec!["ok".to_string()])),
            RetryPolicy::new(2, 0, 0),
        );
        assert_eq!(generator.generate("p", 0.5).await.unwrap(), "ok");

        let failing = RetryingGenerator::new(Arc::new(FailingGenerator), RetryPolicy::new(0, 0, 0));
        assert!(failing.generate("p", 0.5).await.is_err());
    }
}
