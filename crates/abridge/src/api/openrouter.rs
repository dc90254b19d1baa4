//! Minimal OpenRouter chat-completions client.
//!
//! The pipeline only ever sends a system message plus a user message and
//! reads back one choice, so the wire types cover exactly that.

use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model for all generation calls.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
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
}

/// Request body. Exactly one of `model` / `models` is set; `models` is an
/// ordered fallback chain.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl ChatRequest {
    fn model_label(&self) -> &str {
        self.model
            .as_deref()
            .or_else(|| self.models.as_ref().and_then(|m| m.first()).map(String::as_str))
            .unwrap_or("(none)")
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    error: Option<WireError>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireError {
    message: String,
}

/// The first choice of a completion.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: Option<String>,
    /// `"length"` when generation stopped at `max_tokens`.
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl Completion {
    pub fn hit_token_limit(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}

/// Decode a response body, surfacing in-band API errors.
fn decode(body: &str) -> Result<Completion, GenerationError> {
    let wire: WireResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Decode(e.to_string()))?;
    if let Some(err) = wire.error {
        return Err(GenerationError::Api(err.message));
    }
    let choice = wire.choices.into_iter().next();
    Ok(Completion {
        finish_reason: choice.as_ref().and_then(|c| c.finish_reason.clone()),
        text: choice.and_then(|c| c.message.content),
        usage: wire.usage,
    })
}

// ── Client ─────────────────────────────────────────────────────────

/// HTTP client for OpenRouter.
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        Self::with_headers(api_key, "https://crates.io/crates/abridge", "abridge")
    }

    /// Read the key from `OPENROUTER_KEY`.
    pub fn from_env() -> Result<Self, GenerationError> {
        let api_key =
            std::env::var("OPENROUTER_KEY").map_err(|_| GenerationError::MissingApiKey)?;
        Self::new(api_key)
    }

    /// Client with custom `HTTP-Referer` and `X-Title` attribution headers.
    pub fn with_headers(
        api_key: impl Into<String>,
        referer: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("abridge/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            referer: referer.into(),
            title: title.into(),
        })
    }

    /// Send one completion request.
    pub async fn complete(&self, body: &ChatRequest) -> Result<Completion, GenerationError> {
        debug!(
            "Completion request: model={}, max_tokens={}, temperature={}",
            body.model_label(),
            body.max_tokens,
            body.temperature
        );
        trace!(
            "Content sizes: {:?}",
            body.messages.iter().map(|m| m.content.len()).collect::<Vec<_>>()
        );
        let started = Instant::now();

        let resp = self
            .http
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GenerationError::Transport(format!("failed to read response: {e}")))?;
        debug!(
            "HTTP {} after {:.1}s ({} bytes)",
            status,
            started.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(GenerationError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let completion = decode(&text)?;
        if let Some(usage) = completion.usage {
            debug!(
                "Tokens: prompt={}, completion={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(model: Option<&str>, models: Option<Vec<String>>) -> ChatRequest {
        ChatRequest {
            model: model.map(str::to_string),
            models,
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("body")],
            max_tokens: 256,
            temperature: 0.3,
            top_p: 0.9,
        }
    }

    #[test]
    fn request_serializes_single_model() {
        let json = serde_json::to_value(request(Some("m/one"), None)).unwrap();
        assert_eq!(json["model"], "m/one");
        assert!(json.get("models").is_none());
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 256);
    }

    #[test]
    fn model_label_prefers_primary_then_chain() {
        assert_eq!(request(Some("a"), None).model_label(), "a");
        let chain = request(None, Some(vec!["b".into(), "c".into()]));
        assert_eq!(chain.model_label(), "b");
        assert_eq!(request(None, None).model_label(), "(none)");
    }

    #[test]
    fn decodes_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"Done."},"finish_reason":"length"}],
                       "usage":{"prompt_tokens":12,"completion_tokens":3}}"#;
        let completion = decode(body).unwrap();
        assert_eq!(completion.text.as_deref(), Some("Done."));
        assert!(completion.hit_token_limit());
        assert_eq!(completion.usage.map(|u| u.completion_tokens), Some(3));
    }

    #[test]
    fn decodes_in_band_error() {
        let err = decode(r#"{"error":{"message":"model overloaded"}}"#).unwrap_err();
        assert!(matches!(err, GenerationError::Api(ref m) if m == "model overloaded"));
        assert!(err.is_transient());
    }

    #[test]
    fn empty_choices_yield_no_text() {
        let completion = decode(r#"{"choices":[]}"#).unwrap();
        assert!(completion.text.is_none());
        assert!(!completion.hit_token_limit());
    }

    #[test]
    fn garbage_is_decode_error() {
        assert!(matches!(decode("<html>"), Err(GenerationError::Decode(_))));
    }
}
