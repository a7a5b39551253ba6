//! LLM gateway error types.

use thiserror::Error;

/// Errors that can occur while dispatching a completion through the LLM gateway.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The upstream provider returned an error after exhausting retries.
    #[error("provider request failed after {attempts} attempt(s): {message}")]
    ProviderFailed { attempts: usize, message: String },

    /// The provider returned a response with no text content.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// No API key is configured; the gateway cannot make live calls.
    #[error("LLM gateway is not configured (missing API key)")]
    NotConfigured,

    /// The bounded dispatch task failed to join.
    #[error("LLM dispatch task panicked: {0}")]
    TaskJoinFailed(String),

    /// The concurrency semaphore was closed.
    #[error("LLM concurrency semaphore closed")]
    SemaphoreClosed,
}
