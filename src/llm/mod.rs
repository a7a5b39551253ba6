//! The LLM gateway: a concurrency-bounded, retrying `generate(prompt) -> String` capability
//! shared by query expansion, pairwise reranking, final intent ranking, MADL enrichment and
//! dedupe verification.

pub mod client;
pub mod error;
pub mod mock;

pub use client::{GenaiClient, LlmClient};
pub use error::LlmError;
pub use mock::MockLlmClient;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Wraps an [`LlmClient`] with a concurrency cap and bounded retries, matching the
/// teacher's tiered-cache gateway's role as the single point every caller routes through.
pub struct LlmGateway<C: LlmClient> {
    client: C,
    model: String,
    semaphore: Arc<Semaphore>,
    retries: usize,
    rate_limit_sleep: Duration,
}

impl<C: LlmClient> LlmGateway<C> {
    pub fn new(client: C, model: impl Into<String>, max_concurrency: usize, retries: usize, rate_limit_sleep: Duration) -> Self {
        Self {
            client,
            model: model.into(),
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            retries,
            rate_limit_sleep,
        }
    }

    /// Runs `prompt` through the wrapped client, bounded by the concurrency semaphore,
    /// rate-limited by a fixed inter-call sleep, and retried up to `retries` times with
    /// the same sleep between attempts.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| LlmError::SemaphoreClosed)?;

        if !self.rate_limit_sleep.is_zero() {
            tokio::time::sleep(self.rate_limit_sleep).await;
        }

        let mut last_error = None;
        let attempts = self.retries + 1;

        for attempt in 1..=attempts {
            match self.client.generate(&self.model, prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "LLM call failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.rate_limit_sleep).await;
                    }
                }
            }
        }

        debug!(attempts, "LLM gateway exhausted retries");
        Err(LlmError::ProviderFailed {
            attempts,
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}
