//! Response assembly in the requested representation.
//!
//! The finalized text is Markdown. [`OutputFormat::Structured`] passes it
//! through, [`OutputFormat::Plain`] converts it with [`markdown_to_plain`],
//! and [`OutputFormat::Both`] returns both. Unknown format names fall back to
//! structured output with a warning in the metadata.

pub mod plain;

pub use plain::markdown_to_plain;

use crate::pipeline::SummaryPath;
use crate::pipeline::enforce::FinalizedSummary;
use crate::pipeline::target::TargetMode;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Requested output representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown, unchanged.
    #[default]
    Structured,
    Plain,
    Both,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" | "markdown" | "md" => Ok(Self::Structured),
            "plain" | "text" | "txt" => Ok(Self::Plain),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

impl OutputFormat {
    /// Parse a caller-supplied name, falling back to `Structured` with a
    /// warning message instead of failing.
    pub fn parse_or_default(name: &str) -> (Self, Option<String>) {
        match name.parse() {
            Ok(format) => (format, None),
            Err(_) => (
                Self::Structured,
                Some(format!(
                    "Unknown format '{}', defaulted to structured (markdown).",
                    name.trim()
                )),
            ),
        }
    }

    fn wants_markdown(self) -> bool {
        matches!(self, Self::Structured | Self::Both)
    }

    fn wants_plain(self) -> bool {
        matches!(self, Self::Plain | Self::Both)
    }
}

/// How the summary was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMeta {
    pub source: Option<String>,
    pub requested_target_words: Option<usize>,
    pub resolved_target_words: usize,
    pub target_mode: TargetMode,
    pub prompt_target_words: Option<usize>,
    pub prompt_overrode_param: bool,
    pub path: SummaryPath,
    /// Zero on the direct path.
    pub chunk_count: usize,
    /// Word count of the merged draft (chunked path only).
    pub merged_words: Option<usize>,
    pub enforcement_attempts: u32,
    pub within_target: bool,
    pub truncation_repaired: bool,
    /// `|summary_words - resolved_target_words|`.
    pub final_deviation: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format_warning: Option<String>,
}

/// The pipeline's result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResponse {
    pub original_words: usize,
    pub summary_words: usize,
    /// `summary_words / original_words` (1.0 for an empty original).
    pub percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_summary: Option<String>,
    pub meta: SummaryMeta,
}

/// Render `summary` in `format`.
pub fn format_output(
    summary: &FinalizedSummary,
    original_words: usize,
    format: OutputFormat,
    meta: SummaryMeta,
) -> SummaryResponse {
    let percent = if original_words > 0 {
        summary.summary_words as f64 / original_words as f64
    } else {
        1.0
    };
    SummaryResponse {
        original_words,
        summary_words: summary.summary_words,
        percent,
        markdown_summary: format.wants_markdown().then(|| summary.text.clone()),
        plain_summary: format.wants_plain().then(|| markdown_to_plain(&summary.text)),
        meta,
    }
}
