//! A scriptable [`LlmClient`] for tests, mirroring the teacher's `mock_provider` escape
//! hatch but generalized past chat-completion wire shapes to plain text.

use std::sync::Mutex;

use super::client::LlmClient;
use super::error::LlmError;

enum Scripted {
    Text(String),
    Fail(String),
}

/// Replays a fixed queue of responses, falling back to echoing the prompt once the
/// queue is drained.
pub struct MockLlmClient {
    queue: Mutex<Vec<Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for r in responses {
            mock.push_text(r);
        }
        mock
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.queue.lock().unwrap().push(Scripted::Text(text.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.queue
            .lock()
            .unwrap()
            .push(Scripted::Fail(message.into()));
    }

    /// Every prompt passed to [`LlmClient::generate`], in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmClient for MockLlmClient {
    async fn generate(&self, _model: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(prompt.to_string());

        let next = {
            let mut queue = self.queue.lock().unwrap();
            if queue.is_empty() {
                None
            } else {
                Some(queue.remove(0))
            }
        };

        match next {
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Fail(message)) => Err(LlmError::ProviderFailed {
                attempts: 1,
                message,
            }),
            None => Ok(format!("echo: {prompt}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_queued_responses_in_order() {
        let mock = MockLlmClient::with_responses(["first", "second"]);
        assert_eq!(mock.generate("any", "p1").await.unwrap(), "first");
        assert_eq!(mock.generate("any", "p2").await.unwrap(), "second");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn falls_back_to_echo_once_drained() {
        let mock = MockLlmClient::new();
        assert_eq!(mock.generate("any", "hello").await.unwrap(), "echo: hello");
    }

    #[tokio::test]
    async fn replays_scripted_failures() {
        let mock = MockLlmClient::new();
        mock.push_failure("boom");
        let err = mock.generate("any", "p").await.unwrap_err();
        assert!(matches!(err, LlmError::ProviderFailed { .. }));
    }
}
