//! Configuration for the [`SummarizationPipeline`](super::SummarizationPipeline).
//!
//! Every tuning constant lives in one [`PipelineConfig`] value handed to the
//! pipeline constructor. Each stage gets its own nested struct with a
//! `Default` carrying the canonical values, plus builder methods for the
//! knobs callers change most.
//!
//! # Examples
//!
//! Defaults:
//!
//! ```ignore
//! let config = PipelineConfig::default();
//! ```
//!
//! Builder overrides:
//!
//! ```ignore
//! let config = PipelineConfig::default()
//!     .with_chunk_size(800)
//!     .with_concurrency(5)
//!     .with_tolerance(0.05);
//! ```
//!
//! Partial JSON file (missing keys keep their defaults):
//!
//! ```ignore
//! // {"fanout": {"concurrency": 4}, "enforcement": {"tolerance": 0.1}}
//! let config = PipelineConfig::from_json_file("abridge.json")?;
//! ```

use crate::error::ConfigError;
use crate::text::TruncationRules;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ── Target resolution ──────────────────────────────────────────────

/// Knobs for [`resolve_target`](super::target::resolve_target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Documents strictly below this many words take the direct path. Default: 500.
    pub small_doc_threshold: usize,
    /// Documents below this many words are rejected. Default: 20.
    pub min_document_words: usize,
    /// Target for small documents with no explicit signal. Default: 100.
    pub small_doc_default: usize,
    /// Target ratio for large documents with no explicit signal. Default: 0.20.
    pub auto_ratio: f64,
    /// Lowest target ever resolved (unless the document is shorter). Default: 20.
    pub min_target_words: usize,
    /// Highest target ever resolved. Default: 2000.
    pub max_target_words: usize,
    /// Documents below this many words accept smaller prompt targets. Default: 50.
    pub short_doc_words: usize,
    /// Smallest prompt-embedded target accepted for short documents. Default: 5.
    pub prompt_min_short: usize,
    /// Smallest prompt-embedded target accepted otherwise. Default: 10.
    pub prompt_min: usize,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            small_doc_threshold: 500,
            min_document_words: 20,
            small_doc_default: 100,
            auto_ratio: 0.20,
            min_target_words: 20,
            max_target_words: 2000,
            short_doc_words: 50,
            prompt_min_short: 5,
            prompt_min: 10,
        }
    }
}

// ── Chunking ───────────────────────────────────────────────────────

/// Knobs for [`plan_spans`](super::chunking::plan_spans).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Nominal chunk size in words. Default: 1000.
    pub chunk_size: usize,
    /// Fraction of each chunk repeated at the start of the next. Default: 0.12.
    pub overlap: f64,
    /// Chunk sizes below this are raised to it. Default: 50.
    pub min_chunk_size: usize,
    /// Smallest step between chunk starts, at most the effective chunk size.
    /// Default: 10.
    pub min_stride: usize,
    /// A final span shorter than this fraction of the chunk size is folded
    /// into its predecessor. Default: 0.40.
    pub tail_merge_fraction: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 0.12,
            min_chunk_size: 50,
            min_stride: 10,
            tail_merge_fraction: 0.40,
        }
    }
}

// ── Fan-out ────────────────────────────────────────────────────────

/// Knobs for the [`ChunkSummarizer`](super::fanout::ChunkSummarizer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanOutConfig {
    /// Per-chunk compression ratio. Default: 0.20.
    pub ratio: f64,
    /// Maximum generation calls in flight. Default: 3.
    pub concurrency: usize,
    /// Token budget cap for one chunk call. Default: 600.
    pub max_tokens_per_chunk: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            ratio: 0.20,
            concurrency: 3,
            max_tokens_per_chunk: 600,
            temperature: 0.3,
            top_p: 0.9,
        }
    }
}

// ── Length enforcement ─────────────────────────────────────────────

/// Knobs for the [`LengthEnforcer`](super::enforce::LengthEnforcer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforcementConfig {
    /// Acceptance band half-width as a fraction of the target. Default: 0.08.
    pub tolerance: f64,
    /// Attempts when summarizing a small document directly. Default: 3.
    pub direct_attempts: u32,
    /// Attempts when condensing the merged draft. Default: 2.
    pub synthesis_attempts: u32,
    /// Absolute cap on the output token budget. Default: 8000.
    pub max_tokens: u32,
    /// Temperature of the first attempt. Default: 0.3.
    pub base_temperature: f32,
    /// Temperature reduction per later attempt. Default: 0.1.
    pub temperature_step: f32,
    /// Temperature never drops below this. Default: 0.1.
    pub min_temperature: f32,
    pub top_p: f32,
    /// Ask the generator to finish a cut-off draft before trimming locally.
    /// Default: true.
    pub continuation_repair: bool,
    /// Words of trailing context sent with a continuation call. Default: 80.
    pub continuation_tail_words: usize,
    /// Token budget of a continuation call. Default: 400.
    pub continuation_max_tokens: u32,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.08,
            direct_attempts: 3,
            synthesis_attempts: 2,
            max_tokens: 8000,
            base_temperature: 0.3,
            temperature_step: 0.1,
            min_temperature: 0.1,
            top_p: 0.9,
            continuation_repair: true,
            continuation_tail_words: 80,
            continuation_max_tokens: 400,
        }
    }
}

impl EnforcementConfig {
    /// Temperature for a 1-based attempt number.
    pub fn temperature_for_attempt(&self, attempt: u32) -> f32 {
        let steps = attempt.saturating_sub(1) as f32;
        (self.base_temperature - self.temperature_step * steps).max(self.min_temperature)
    }
}

// ── Top level ──────────────────────────────────────────────────────

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub target: TargetConfig,
    pub chunking: ChunkingConfig,
    pub fanout: FanOutConfig,
    pub enforcement: EnforcementConfig,
    pub truncation: TruncationRules,
}

impl PipelineConfig {
    /// Load a (possibly partial) JSON config file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.chunking.chunk_size == 0 {
            return invalid("chunking.chunk_size must be positive".into());
        }
        let span = self.chunking.chunk_size.max(self.chunking.min_chunk_size);
        if self.chunking.min_stride == 0 || self.chunking.min_stride > span {
            return invalid(format!(
                "chunking.min_stride must be in [1, {span}] (the effective chunk size), got {}",
                self.chunking.min_stride
            ));
        }
        if !(0.0..1.0).contains(&self.chunking.overlap) {
            return invalid(format!(
                "chunking.overlap must be in [0, 1), got {}",
                self.chunking.overlap
            ));
        }
        if !(0.0..=1.0).contains(&self.chunking.tail_merge_fraction) {
            return invalid(format!(
                "chunking.tail_merge_fraction must be in [0, 1], got {}",
                self.chunking.tail_merge_fraction
            ));
        }
        if self.fanout.concurrency == 0 {
            return invalid("fanout.concurrency must be positive".into());
        }
        for (name, ratio) in [
            ("fanout.ratio", self.fanout.ratio),
            ("target.auto_ratio", self.target.auto_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return invalid(format!("{name} must be in (0, 1], got {ratio}"));
            }
        }
        if self.enforcement.direct_attempts == 0 || self.enforcement.synthesis_attempts == 0 {
            return invalid("enforcement attempt counts must be positive".into());
        }
        let tol = self.enforcement.tolerance;
        if !(tol > 0.0 && tol < 1.0) {
            return invalid(format!("enforcement.tolerance must be in (0, 1), got {tol}"));
        }
        if self.target.min_target_words > self.target.max_target_words {
            return invalid(format!(
                "target.min_target_words ({}) exceeds target.max_target_words ({})",
                self.target.min_target_words, self.target.max_target_words
            ));
        }
        Ok(())
    }

    pub fn with_chunk_size(mut self, words: usize) -> Self {
        self.chunking.chunk_size = words;
        self
    }

    pub fn with_overlap(mut self, overlap: f64) -> Self {
        self.chunking.overlap = overlap;
        self
    }

    /// Maximum concurrent chunk calls.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.fanout.concurrency = concurrency;
        self
    }

    /// Acceptance band half-width, e.g. `0.08` for ±8%.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.enforcement.tolerance = tolerance;
        self
    }

    pub fn with_direct_attempts(mut self, attempts: u32) -> Self {
        self.enforcement.direct_attempts = attempts;
        self
    }

    pub fn with_synthesis_attempts(mut self, attempts: u32) -> Self {
        self.enforcement.synthesis_attempts = attempts;
        self
    }

    pub fn with_small_doc_threshold(mut self, words: usize) -> Self {
        self.target.small_doc_threshold = words;
        self
    }

    pub fn with_continuation_repair(mut self, enabled: bool) -> Self {
        self.enforcement.continuation_repair = enabled;
        self
    }
}
