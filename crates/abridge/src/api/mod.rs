//! Generation layer: the collaborator contract, the OpenRouter backend, and
//! transport retry.
//!
//! - [`generate`] — the [`Generator`] trait every pipeline stage calls through,
//!   [`GenerationRequest`], and [`OpenRouterGenerator`].
//! - [`openrouter`] — the HTTP client and wire types for chat completions.
//! - [`retry`] — transient error retry with exponential backoff and jitter.
//!   Never retries 400/401 errors. Off by default so the pipeline sees
//!   transport failures unchanged.

pub mod generate;
pub mod openrouter;
pub mod retry;

pub use generate::{GenerateFuture, GenerationRequest, Generator, OpenRouterGenerator};
pub use openrouter::{DEFAULT_MODEL, OpenRouterClient};
pub use retry::RetryConfig;
