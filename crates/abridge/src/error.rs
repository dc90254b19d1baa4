//! Typed error hierarchy for the summarization pipeline.
//!
//! Four enums cover the four concerns:
//! - `GenerationError` — failures of the generation collaborator (transport, HTTP, decoding)
//! - `SummarizeError` — fatal pipeline failures surfaced to callers
//! - `IngestError` — reading a source document from disk
//! - `ConfigError` — loading or validating a [`PipelineConfig`](crate::pipeline::PipelineConfig)

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`Generator`](crate::api::Generator) call.
///
/// The pipeline never retries these itself; they propagate to the caller
/// unchanged. Transport-level retry is the generator's own business (see
/// [`api::retry`](crate::api::retry)).
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("API HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("failed to parse response: {0}")]
    Decode(String),

    #[error("empty response from generation service")]
    Empty,

    #[error("OPENROUTER_KEY not set")]
    MissingApiKey,

    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Whether the failure is worth retrying (rate limits, 5xx, network blips).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Api(msg) | Self::Other(msg) => {
                let lower = msg.to_lowercase();
                ["connection reset", "timed out", "timeout", "overloaded"]
                    .iter()
                    .any(|p| lower.contains(p))
            }
            Self::Decode(_) | Self::Empty | Self::MissingApiKey => false,
        }
    }

    /// Whether the failure can never succeed on retry (bad request, auth).
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 400 | 401 | 403 | 404 | 422),
            Self::MissingApiKey => true,
            _ => false,
        }
    }
}

/// Fatal errors from the summarization pipeline.
///
/// Missing the word target is *not* an error: the pipeline degrades to its
/// best attempt and reports `within_target = false` in the metadata.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("document has {words} words but at least {min} are required")]
    DocumentTooShort { words: usize, min: usize },

    #[error("chunk planning produced no chunks for a {words}-word document")]
    NoChunks { words: usize },

    #[error("chunk {index} produced no partial summary")]
    MissingPartial { index: usize },

    #[error("draft contains no words")]
    EmptyDraft,

    #[error("generation returned no usable text after {attempts} attempt(s)")]
    EmptySummary { attempts: u32 },

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors from the ingestion collaborator.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type for {path} (expected .txt, .md or .markdown)")]
    UnsupportedExtension { path: PathBuf },

    #[error("{path} is {size_bytes} bytes, larger than the {max_bytes}-byte limit")]
    TooLarge {
        path: PathBuf,
        size_bytes: u64,
        max_bytes: u64,
    },

    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: PathBuf },
}

/// Errors from loading or validating pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_detected() {
        assert!(GenerationError::Timeout.is_transient());
        assert!(GenerationError::Transport("connection reset".into()).is_transient());
        assert!(
            GenerationError::Http {
                status: 429,
                body: "rate limited".into()
            }
            .is_transient()
        );
        assert!(
            GenerationError::Http {
                status: 502,
                body: String::new()
            }
            .is_transient()
        );
    }

    #[test]
    fn permanent_errors_detected() {
        let bad = GenerationError::Http {
            status: 400,
            body: "bad request".into(),
        };
        assert!(bad.is_permanent());
        assert!(!bad.is_transient());
        assert!(GenerationError::MissingApiKey.is_permanent());
    }

    #[test]
    fn generation_error_is_transparent_in_summarize_error() {
        let err: SummarizeError = GenerationError::Timeout.into();
        assert_eq!(err.to_string(), "request timed out");
    }

    #[test]
    fn too_short_message_names_both_counts() {
        let err = SummarizeError::DocumentTooShort { words: 7, min: 20 };
        assert_eq!(
            err.to_string(),
            "document has 7 words but at least 20 are required"
        );
    }
}
