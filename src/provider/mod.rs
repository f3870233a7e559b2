//! Chat-completions provider client.
//!
//! Speaks the OpenAI chat-completions wire format over HTTP. The rest of
//! the crate only sees the role/content list abstraction
//! ([`ProviderRequest`]) and a `String`-or-error result; everything
//! wire-specific stays in this module.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppConfig;
use crate::{RafiqError, Result};

/// Connect timeout; total request timeout comes from config.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Entry role in a chat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged entry of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A fully built provider request, minus the model identifier (the
/// client attaches its configured model on send).
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

// ─── Wire types ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

// ─── Client ─────────────────────────────────────────────────────────

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// No automatic retries: a submission maps to exactly one request, and
/// the explicit timeout guarantees every request eventually resolves.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl ChatClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("rafiq/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and return the reply text.
    ///
    /// An empty or absent message payload is returned as an empty
    /// string; classifying that as a soft failure is the caller's job.
    pub async fn complete(&self, api_key: &str, request: ProviderRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(
            "sending chat request: model={}, entries={}",
            self.model,
            request.messages.len()
        );

        let wire = ChatRequest {
            model: self.model.clone(),
            messages: request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&wire)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;

        let response = Self::check_response_status(response).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| RafiqError::Api(format!("malformed response body: {e}")))?;

        Ok(chat_response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }

    async fn check_response_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = Self::truncate_error_detail(&Self::extract_error_detail(&body), 500);
        if detail.is_empty() {
            Err(RafiqError::Api(format!("API error {status}")))
        } else {
            Err(RafiqError::Api(format!("API error {status}: {detail}")))
        }
    }

    /// Pull a human-readable message out of an error body.
    fn extract_error_detail(body: &str) -> String {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if let Some(msg) = value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
            {
                return msg.to_string();
            }
            if let Some(msg) = value.get("message").and_then(|m| m.as_str()) {
                return msg.to_string();
            }
        }

        trimmed.to_string()
    }

    fn truncate_error_detail(detail: &str, max_chars: usize) -> String {
        if detail.chars().count() <= max_chars {
            return detail.to_string();
        }

        let mut truncated = detail.chars().take(max_chars).collect::<String>();
        truncated.push_str("... [truncated]");
        truncated
    }

    fn map_reqwest_error(e: reqwest::Error) -> RafiqError {
        if e.is_timeout() {
            RafiqError::Api(format!("timeout: {e}"))
        } else if e.is_connect() {
            RafiqError::Api(format!("network: {e}"))
        } else {
            RafiqError::Api(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        let msg = ChatMessage::system("تعليمات");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "system");

        assert_eq!(
            serde_json::to_value(ChatMessage::user("س")).unwrap()["role"],
            "user"
        );
        assert_eq!(
            serde_json::to_value(ChatMessage::assistant("ج")).unwrap()["role"],
            "assistant"
        );
    }

    #[test]
    fn test_wire_request_shape() {
        let wire = ChatRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![ChatMessage::user("مرحبا")],
            max_tokens: 2000,
            temperature: 0.7,
            stream: false,
        };
        let value = serde_json::to_value(&wire).unwrap();
        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["max_tokens"], 2000);
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["content"], "مرحبا");
    }

    #[test]
    fn test_response_parses_with_missing_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());

        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn test_extract_error_detail_from_json() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#;
        assert_eq!(ChatClient::extract_error_detail(body), "Invalid API key");

        let body = r#"{"message": "rate limited"}"#;
        assert_eq!(ChatClient::extract_error_detail(body), "rate limited");
    }

    #[test]
    fn test_extract_error_detail_plain_text() {
        assert_eq!(ChatClient::extract_error_detail("  oops  "), "oops");
        assert_eq!(ChatClient::extract_error_detail(""), "");
    }

    #[test]
    fn test_truncate_error_detail() {
        let long = "x".repeat(600);
        let truncated = ChatClient::truncate_error_detail(&long, 500);
        assert!(truncated.ends_with("... [truncated]"));
        assert!(truncated.chars().count() < 600);

        assert_eq!(ChatClient::truncate_error_detail("short", 500), "short");
    }

    #[test]
    fn test_client_normalizes_base_url() {
        let config = AppConfig {
            base_url: "https://api.openai.com/v1/".to_string(),
            ..AppConfig::default()
        };
        let client = ChatClient::new(&config);
        assert_eq!(client.base_url(), "https://api.openai.com/v1");
    }
}
