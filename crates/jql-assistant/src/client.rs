use std::time::Duration;

use async_trait::async_trait;
use jql_core::error::truncate_body;
use jql_core::{AssistantError, QueryAssistant};
use serde_json::Value;
use tracing::debug;

use crate::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::prompts;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DERIVE_MAX_TOKENS: u32 = 120;
const ANSWER_MAX_TOKENS: u32 = 400;
/// Longest search payload excerpt sent for summarization.
const PAYLOAD_LIMIT: usize = 48_000;

fn request_err(e: impl std::fmt::Display) -> AssistantError {
    AssistantError::Request(e.to_string())
}

#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl AssistantSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.2,
            timeout: Duration::from_secs(60),
        }
    }

    /// Empty values keep the default.
    pub fn with_model(mut self, model: &str) -> Self {
        if !model.trim().is_empty() {
            self.model = model.trim().to_string();
        }
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        if !base_url.trim().is_empty() {
            self.base_url = base_url.trim().trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Chat completions client for any OpenAI-compatible endpoint.
pub struct OpenAiAssistant {
    http: reqwest::Client,
    settings: AssistantSettings,
}

impl OpenAiAssistant {
    /// `None` when no API key is configured: the assistant is optional.
    pub fn from_settings(settings: AssistantSettings) -> Result<Option<Self>, AssistantError> {
        if settings.api_key.trim().is_empty() {
            return Ok(None);
        }
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(request_err)?;
        Ok(Some(Self { http, settings }))
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    async fn complete(
        &self,
        system: &str,
        user: String,
        max_tokens: u32,
    ) -> Result<String, AssistantError> {
        let request = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: self.settings.temperature,
            max_tokens,
        };
        let url = format!("{}/chat/completions", self.settings.base_url);
        debug!(model = %self.settings.model, max_tokens, "chat completion request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(request_err)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AssistantError::Request(format!(
                "{}: {}",
                status,
                truncate_body(&body, jql_core::ERROR_BODY_LIMIT)
            )));
        }
        let parsed: ChatCompletionResponse = resp.json().await.map_err(request_err)?;
        parsed.first_content().ok_or(AssistantError::NoChoices)
    }
}

fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[async_trait]
impl QueryAssistant for OpenAiAssistant {
    async fn derive_query(&self, raw_text: &str) -> Result<String, AssistantError> {
        let raw_text = raw_text.trim();
        if raw_text.is_empty() {
            return Err(AssistantError::EmptyInput("request"));
        }
        self.complete(prompts::DERIVE_SYSTEM, prompts::derive_user(raw_text), DERIVE_MAX_TOKENS)
            .await
    }

    async fn summarize(
        &self,
        raw_text: &str,
        query: &str,
        payload: &Value,
    ) -> Result<String, AssistantError> {
        if is_empty_payload(payload) {
            return Err(AssistantError::EmptyInput("search results"));
        }
        let payload = truncate_body(&payload.to_string(), PAYLOAD_LIMIT);
        self.complete(
            prompts::SUMMARIZE_SYSTEM,
            prompts::summarize_user(raw_text, query, &payload),
            ANSWER_MAX_TOKENS,
        )
        .await
    }

    async fn follow_up(&self, context: &str, command: &str) -> Result<String, AssistantError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(AssistantError::EmptyInput("command"));
        }
        self.complete(
            prompts::FOLLOW_UP_SYSTEM,
            prompts::follow_up_user(context, command),
            ANSWER_MAX_TOKENS,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_key_disables_assistant() {
        assert!(OpenAiAssistant::from_settings(AssistantSettings::new("  "))
            .unwrap()
            .is_none());
        let on = OpenAiAssistant::from_settings(AssistantSettings::new("sk-test").with_model(""))
            .unwrap()
            .unwrap();
        assert_eq!(on.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_base_url_normalized() {
        let s = AssistantSettings::new("k").with_base_url("http://localhost:11434/v1/");
        assert_eq!(s.base_url, "http://localhost:11434/v1");
        assert_eq!(AssistantSettings::new("k").with_base_url(" ").base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_empty_payloads() {
        assert!(is_empty_payload(&Value::Null));
        assert!(is_empty_payload(&json!([])));
        assert!(is_empty_payload(&json!({})));
        assert!(!is_empty_payload(&json!({ "issues": [] })));
    }

    #[tokio::test]
    async fn test_empty_inputs_rejected_before_request() {
        let assistant = OpenAiAssistant::from_settings(
            AssistantSettings::new("k").with_base_url("http://127.0.0.1:9"),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            assistant.derive_query("   ").await,
            Err(AssistantError::EmptyInput("request"))
        );
        assert_eq!(
            assistant.summarize("q", "jql", &json!([])).await,
            Err(AssistantError::EmptyInput("search results"))
        );
        assert_eq!(
            assistant.follow_up("ctx", "").await,
            Err(AssistantError::EmptyInput("command"))
        );
    }
}
