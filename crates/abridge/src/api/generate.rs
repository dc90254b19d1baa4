//! The generation collaborator contract.
//!
//! Every model call the pipeline makes goes through [`Generator::generate`]:
//! instructions plus content in, text out. The trait keeps the pipeline
//! independent of any provider; [`OpenRouterGenerator`] is the bundled
//! implementation.

use crate::api::openrouter::{ChatMessage, ChatRequest, Completion, OpenRouterClient};
use crate::api::retry::{RetryConfig, retry_call};
use crate::error::GenerationError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

/// Boxed future returned by [`Generator::generate`].
pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;

/// A single generation call: `generate(instructions, content, maxTokens, temperature, topP)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// System-level instructions.
    pub instructions: String,
    /// User content the instructions apply to.
    pub content: String,
    /// Output token budget.
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl GenerationRequest {
    /// Create a request with neutral sampling defaults (1024 tokens, 0.3, 0.9).
    pub fn new(instructions: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            content: content.into(),
            max_tokens: 1024,
            temperature: 0.3,
            top_p: 0.9,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }
}

/// The external text-generation service.
///
/// Implementations may fail with transport or timeout errors; the pipeline
/// propagates them unchanged. Implementations must be shareable across the
/// concurrent chunk fan-out, hence `Send + Sync`.
pub trait Generator: Send + Sync {
    fn generate(&self, request: GenerationRequest) -> GenerateFuture<'_>;
}

impl<G: Generator + ?Sized> Generator for Arc<G> {
    fn generate(&self, request: GenerationRequest) -> GenerateFuture<'_> {
        (**self).generate(request)
    }
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, request: GenerationRequest) -> GenerateFuture<'_> {
        (**self).generate(request)
    }
}

// ── OpenRouter backend ─────────────────────────────────────────────

/// [`Generator`] backed by the OpenRouter chat completions API.
pub struct OpenRouterGenerator {
    client: OpenRouterClient,
    model: String,
    fallback_models: Vec<String>,
    retry: RetryConfig,
}

impl OpenRouterGenerator {
    pub fn new(client: OpenRouterClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            fallback_models: Vec::new(),
            retry: RetryConfig::default(),
        }
    }

    /// Models tried in order if the primary is unavailable.
    pub fn with_fallback_models(mut self, models: Vec<String>) -> Self {
        self.fallback_models = models;
        self
    }

    /// Transport retry policy. Default: no retries.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the chat request body for a generation call.
    pub fn build_request(&self, request: &GenerationRequest) -> ChatRequest {
        let (model, models) = if self.fallback_models.is_empty() {
            (Some(self.model.clone()), None)
        } else {
            let mut chain = vec![self.model.clone()];
            chain.extend(self.fallback_models.iter().cloned());
            (None, Some(chain))
        };
        ChatRequest {
            model,
            models,
            messages: vec![
                ChatMessage::system(request.instructions.clone()),
                ChatMessage::user(request.content.clone()),
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
        }
    }
}

impl Generator for OpenRouterGenerator {
    fn generate(&self, request: GenerationRequest) -> GenerateFuture<'_> {
        Box::pin(async move {
            let body = self.build_request(&request);
            let completion = retry_call(&self.retry, || self.client.complete(&body)).await?;
            if completion.hit_token_limit() {
                warn!(
                    "Generation stopped at the token limit ({} tokens); output may be cut off",
                    request.max_tokens
                );
            }
            Ok(completion_text(completion))
        })
    }
}

/// The completion's text, or an empty string when the model returned none.
///
/// Empty output is an ordinary result: the length enforcer counts it as a
/// zero-word attempt and the truncation repair falls back to trimming.
fn completion_text(completion: Completion) -> String {
    let text = completion.text.unwrap_or_default();
    if text.trim().is_empty() {
        warn!("Generation returned no text");
    } else {
        debug!("Generated {} chars", text.len());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Generator for Echo {
        fn generate(&self, request: GenerationRequest) -> GenerateFuture<'_> {
            Box::pin(async move { Ok(format!("{}|{}", request.instructions, request.content)) })
        }
    }

    #[test]
    fn request_builder_sets_sampling() {
        let req = GenerationRequest::new("sys", "body")
            .with_max_tokens(512)
            .with_temperature(0.1)
            .with_top_p(0.95);
        assert_eq!(req.max_tokens, 512);
        assert!((req.temperature - 0.1).abs() < f32::EPSILON);
        assert!((req.top_p - 0.95).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn arc_and_ref_generators_delegate() {
        let shared: Arc<Echo> = Arc::new(Echo);
        let out = shared
            .generate(GenerationRequest::new("a", "b"))
            .await
            .unwrap();
        assert_eq!(out, "a|b");

        let borrowed = &Echo;
        let out = borrowed
            .generate(GenerationRequest::new("c", "d"))
            .await
            .unwrap();
        assert_eq!(out, "c|d");
    }

    #[test]
    fn build_request_uses_fallback_chain() {
        let client = OpenRouterClient::new("test-key").unwrap();
        let generator = OpenRouterGenerator::new(client, "primary/model")
            .with_fallback_models(vec!["backup/model".into()]);
        let body = generator.build_request(&GenerationRequest::new("sys", "user"));
        assert!(body.model.is_none());
        assert_eq!(
            body.models.as_deref(),
            Some(&["primary/model".to_string(), "backup/model".to_string()][..])
        );
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].content, "sys");
        assert!((body.top_p - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_completion_text_is_empty_output() {
        assert_eq!(completion_text(Completion::default()), "");
        let blank = Completion {
            text: Some("  \n".into()),
            ..Completion::default()
        };
        assert_eq!(completion_text(blank).trim(), "");
        let done = Completion {
            text: Some("Done.".into()),
            ..Completion::default()
        };
        assert_eq!(completion_text(done), "Done.");
    }

    #[test]
    fn build_request_single_model() {
        let client = OpenRouterClient::new("test-key").unwrap();
        let generator = OpenRouterGenerator::new(client, "primary/model");
        let body = generator.build_request(&GenerationRequest::new("sys", "user"));
        assert_eq!(body.model.as_deref(), Some("primary/model"));
        assert!(body.models.is_none());
    }
}
