//! The raw LLM capability: a single prompt in, a single completion out.

use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};

use super::error::LlmError;

/// A single-shot text completion capability. One call, one response, no chat history,
/// no streaming and no tool calling — everything the pipeline needs from an LLM reduces
/// to this.
pub trait LlmClient: Send + Sync {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}

/// Wraps a [`genai::Client`] behind [`LlmClient`].
#[derive(Clone)]
pub struct GenaiClient {
    client: Client,
}

impl GenaiClient {
    pub fn new() -> Self {
        Self {
            client: Client::default(),
        }
    }
}

impl Default for GenaiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmClient for GenaiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);

        let response = self
            .client
            .exec_chat(model, request, None)
            .await
            .map_err(|e| LlmError::ProviderFailed {
                attempts: 1,
                message: e.to_string(),
            })?;

        response
            .first_text()
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
