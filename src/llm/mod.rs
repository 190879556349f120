//! LLM Gateway (C7): a small trait over "send chat messages, get text
//! back plus token usage", backed by an HTTP adapter for this crate's
//! production path and a recording fake for tests.

pub mod models;
pub mod yaml;

use crate::errors::RunError;
use crate::prompt::Messages;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

pub trait Gateway {
    fn call(&self, messages: &Messages, max_tokens: u32) -> Result<Completion, RunError>;
}

/// OpenAI-chat-completions-shaped HTTP adapter. Other providers that
/// speak the same wire shape (most OpenAI-compatible gateways) work
/// without modification; provider-specific quirks belong in a
/// dedicated adapter, not branches here.
#[derive(Debug)]
pub struct HttpGateway {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    provider_model_id: String,
}

impl HttpGateway {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model_alias: &str, timeout: Duration) -> Result<Self, RunError> {
        let spec = models::resolve(model_alias)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            provider_model_id: spec.provider_id.to_string(),
        })
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl Gateway for HttpGateway {
    fn call(&self, messages: &Messages, max_tokens: u32) -> Result<Completion, RunError> {
        let body = ChatRequest {
            model: &self.provider_model_id,
            messages: vec![
                ChatMessage { role: "system", content: &messages.system },
                ChatMessage { role: "user", content: &messages.user },
            ],
            max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?
            .error_for_status()?;

        let parsed: ChatResponse = response.json()?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RunError::Gateway("provider returned no choices".to_string()))?;

        let usage = parsed.usage.unwrap_or_default();
        Ok(Completion {
            text: choice.message.content,
            usage: Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeGateway {
        replies: RefCell<Vec<String>>,
    }

    impl Gateway for FakeGateway {
        fn call(&self, _messages: &Messages, _max_tokens: u32) -> Result<Completion, RunError> {
            let text = self.replies.borrow_mut().pop().ok_or_else(|| RunError::Gateway("no more canned replies".to_string()))?;
            Ok(Completion { text, usage: Usage::default() })
        }
    }

    #[test]
    fn fake_gateway_returns_canned_replies_in_order() {
        let gw = FakeGateway { replies: RefCell::new(vec!["second".to_string(), "first".to_string()]) };
        let messages = Messages { system: String::new(), user: String::new() };
        let first = gw.call(&messages, 100).unwrap();
        assert_eq!(first.text, "first");
        let second = gw.call(&messages, 100).unwrap();
        assert_eq!(second.text, "second");
    }

    #[test]
    fn unknown_alias_fails_before_any_client_is_built() {
        let err = HttpGateway::new("http://localhost", "key", "nonexistent-model", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }
}
