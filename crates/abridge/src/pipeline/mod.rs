//! The adaptive summarization pipeline.
//!
//! ```text
//! clean ─► resolve target ─┬─ small ─► enforce(document) ───────────────────────┐
//!                          └─ large ─► plan chunks ─► fan-out ─► merge ─► enforce(draft) ─┴─► format
//! ```
//!
//! Every stage produces a new value; the only concurrent region is the chunk
//! fan-out. Stages are exposed as submodules so each can be used and tested
//! on its own:
//!
//! - [`target`] — word target resolution
//! - [`chunking`] — overlapping word-window planning
//! - [`fanout`] — bounded-concurrency chunk compression
//! - [`merge`] — index-ordered reassembly
//! - [`enforce`] — the length-convergence loop and truncation repair
//! - [`prompts`] — generation instructions
//! - [`events`] — progress events and handlers
//! - [`config`] — [`PipelineConfig`]

pub mod chunking;
pub mod config;
pub mod enforce;
pub mod events;
pub mod fanout;
pub mod merge;
pub mod prompts;
pub mod target;

pub use config::PipelineConfig;
pub use events::{EventHandler, LoggingHandler, NoopHandler, PipelineEvent};

use crate::api::Generator;
use crate::error::SummarizeError;
use crate::format::{OutputFormat, SummaryMeta, SummaryResponse, format_output};
use crate::ingest::ExtractedDocument;
use crate::text::{clean_text, count_words};
use chunking::plan_chunks;
use enforce::LengthEnforcer;
use fanout::ChunkSummarizer;
use merge::merge_partials;
use prompts::DraftKind;
use serde::Serialize;
use target::{is_small_document, resolve_target};
use tracing::debug;

/// Which route a document took through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPath {
    /// Summarized in one enforcement loop.
    Direct,
    /// Chunked, compressed, merged, then condensed.
    Chunked,
}

impl std::fmt::Display for SummaryPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::Chunked => "chunked",
        })
    }
}

/// A cleaned source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub text: String,
    pub word_count: usize,
    pub source: Option<String>,
}

impl Document {
    /// Clean `raw` and count its words.
    pub fn new(raw: &str, source: Option<String>) -> Self {
        let text = clean_text(raw);
        let word_count = count_words(&text);
        Self {
            text,
            word_count,
            source,
        }
    }
}

/// Input to [`SummarizationPipeline::summarize_document`].
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub text: String,
    /// Explicit word target. Non-positive values count as absent.
    pub target_words: Option<i64>,
    /// `structured`/`markdown`, `plain` or `both`. Unknown names fall back to structured.
    pub format: String,
    /// Free-form instruction, which may embed a length ("in about 200 words").
    pub instruction: Option<String>,
    pub source: Option<String>,
}

impl SummaryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_words: None,
            format: "structured".into(),
            instruction: None,
            source: None,
        }
    }

    pub fn with_target_words(mut self, words: i64) -> Self {
        self.target_words = Some(words);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Summarizes documents to a word target through a [`Generator`].
///
/// ```ignore
/// let pipeline = SummarizationPipeline::new(&generator, PipelineConfig::default())
///     .with_event_handler(&LoggingHandler);
/// let response = pipeline
///     .summarize_document(SummaryRequest::new(text).with_target_words(300))
///     .await?;
/// ```
pub struct SummarizationPipeline<'a, G: Generator + ?Sized> {
    generator: &'a G,
    config: PipelineConfig,
    events: &'a dyn EventHandler,
}

impl<'a, G: Generator + ?Sized> SummarizationPipeline<'a, G> {
    pub fn new(generator: &'a G, config: PipelineConfig) -> Self {
        Self {
            generator,
            config,
            events: &NoopHandler,
        }
    }

    pub fn with_event_handler(mut self, events: &'a dyn EventHandler) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Summarize already-extracted text.
    pub async fn summarize_document(
        &self,
        request: SummaryRequest,
    ) -> Result<SummaryResponse, SummarizeError> {
        self.config.validate()?;
        let cfg = &self.config;
        let (format, output_format_warning) = OutputFormat::parse_or_default(&request.format);
        let instruction = request.instruction.as_deref();

        let document = Document::new(&request.text, request.source);
        if document.word_count == 0 {
            return Err(SummarizeError::EmptyDocument);
        }
        if document.word_count < cfg.target.min_document_words {
            return Err(SummarizeError::DocumentTooShort {
                words: document.word_count,
                min: cfg.target.min_document_words,
            });
        }

        let target = resolve_target(
            document.word_count,
            request.target_words,
            instruction,
            &cfg.target,
        );
        let path = if is_small_document(document.word_count, &cfg.target) {
            SummaryPath::Direct
        } else {
            SummaryPath::Chunked
        };
        self.events.on_event(&PipelineEvent::TargetResolved {
            original_words: document.word_count,
            target_words: target.resolved_words,
            mode: target.mode,
            path,
        });

        let enforcer = LengthEnforcer::new(self.generator, &cfg.enforcement, &cfg.truncation)
            .with_event_handler(self.events);

        let (summary, report, chunk_count, merged_words) = match path {
            SummaryPath::Direct => {
                let (summary, report) = enforcer
                    .enforce(
                        &document.text,
                        target.resolved_words,
                        DraftKind::Document,
                        cfg.enforcement.direct_attempts,
                        instruction,
                    )
                    .await?;
                (summary, report, 0, None)
            }
            SummaryPath::Chunked => {
                let chunks = plan_chunks(&document.text, &cfg.chunking);
                if chunks.is_empty() {
                    return Err(SummarizeError::NoChunks {
                        words: document.word_count,
                    });
                }
                self.events.on_event(&PipelineEvent::ChunksPlanned {
                    count: chunks.len(),
                    chunk_size: cfg.chunking.chunk_size,
                });

                let partials = ChunkSummarizer::new(self.generator, &cfg.fanout)
                    .with_event_handler(self.events)
                    .summarize_all(&chunks)
                    .await?;
                let draft = merge_partials(&partials, Some(document.word_count));
                debug!(
                    "Merged draft: {} words, combined ratio {:?}",
                    draft.total_words, draft.combined_ratio
                );
                self.events.on_event(&PipelineEvent::DraftMerged {
                    partial_count: draft.partial_count,
                    total_words: draft.total_words,
                });

                let (summary, report) = enforcer
                    .enforce(
                        &draft.text,
                        target.resolved_words,
                        DraftKind::SectionSummaries,
                        cfg.enforcement.synthesis_attempts,
                        instruction,
                    )
                    .await?;
                (summary, report, chunks.len(), Some(draft.total_words))
            }
        };

        self.events.on_event(&PipelineEvent::Finished {
            summary_words: summary.summary_words,
            target_words: target.resolved_words,
            within_target: report.within_target,
        });

        let meta = SummaryMeta {
            source: document.source.clone(),
            requested_target_words: target.requested_words,
            resolved_target_words: target.resolved_words,
            target_mode: target.mode,
            prompt_target_words: target.prompt_target,
            prompt_overrode_param: target.prompt_overrode_param,
            path,
            chunk_count,
            merged_words,
            enforcement_attempts: report.attempts_used,
            within_target: report.within_target,
            truncation_repaired: report.truncation_repaired,
            final_deviation: report.deviation,
            output_format_warning,
        };
        Ok(format_output(&summary, document.word_count, format, meta))
    }

    /// Summarize a document produced by a [`TextExtractor`](crate::ingest::TextExtractor).
    pub async fn summarize_extracted(
        &self,
        document: &ExtractedDocument,
        target_words: Option<i64>,
        format: &str,
        instruction: Option<&str>,
    ) -> Result<SummaryResponse, SummarizeError> {
        let mut request = SummaryRequest::new(document.text.clone())
            .with_format(format)
            .with_source(document.meta.source_name.clone());
        request.target_words = target_words;
        request.instruction = instruction.map(str::to_string);
        self.summarize_document(request).await
    }
}
