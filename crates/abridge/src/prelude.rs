//! Convenience re-exports for common `abridge` types.
//!
//! ```ignore
//! use abridge::prelude::*;
//! ```
//!
//! Pulls in the generator contract and its OpenRouter backend, the pipeline
//! with its config and event handlers, requests/responses, and ingestion.
//! Stage internals (chunk planning, enforcement helpers, truncation rules)
//! stay in their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{DEFAULT_MODEL, OpenRouterClient};

// ── Generation ──────────────────────────────────────────────────────
pub use crate::api::{GenerateFuture, GenerationRequest, Generator, OpenRouterGenerator, RetryConfig};

// ── Pipeline ────────────────────────────────────────────────────────
pub use crate::pipeline::events::FnEventHandler;
pub use crate::pipeline::{
    EventHandler, LoggingHandler, NoopHandler, PipelineConfig, PipelineEvent,
    SummarizationPipeline, SummaryPath, SummaryRequest,
};

// ── Output ──────────────────────────────────────────────────────────
pub use crate::format::{OutputFormat, SummaryMeta, SummaryResponse};

// ── Ingestion ───────────────────────────────────────────────────────
pub use crate::ingest::{ExtractedDocument, PlainTextExtractor, TextExtractor};

// ── Errors ──────────────────────────────────────────────────────────
pub use crate::error::{ConfigError, GenerationError, IngestError, SummarizeError};
