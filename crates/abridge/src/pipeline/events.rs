//! Progress events emitted by the [`SummarizationPipeline`](super::SummarizationPipeline).
//!
//! The pipeline reports each stage through [`PipelineEvent`] variants.
//! Callers implement [`EventHandler`] to observe them for logging, progress
//! bars or metrics.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or fire-and-forget runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures for simple callbacks |
//! | Custom `impl EventHandler` | Full control |

use super::SummaryPath;
use super::target::TargetMode;
use tracing::{debug, info, warn};

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted during a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// The word target was resolved and the path chosen.
    TargetResolved {
        original_words: usize,
        target_words: usize,
        mode: TargetMode,
        path: SummaryPath,
    },
    /// The document was split for the chunked path.
    ChunksPlanned { count: usize, chunk_size: usize },
    /// One chunk finished compressing. Arrives in completion order.
    ChunkSummarized {
        index: usize,
        chunk_words: usize,
        summary_words: usize,
    },
    /// Partial summaries were reassembled into a draft.
    DraftMerged {
        partial_count: usize,
        total_words: usize,
    },
    /// One length-enforcement attempt finished.
    AttemptFinished {
        attempt: u32,
        max_attempts: u32,
        words: usize,
        target_words: usize,
        within_target: bool,
    },
    /// A cut-off draft was repaired.
    TruncationRepaired { attempt: u32, by_continuation: bool },
    /// The run finished.
    Finished {
        summary_words: usize,
        target_words: usize,
        within_target: bool,
    },
}

/// Observer for [`PipelineEvent`]s.
///
/// Chunk events are emitted from concurrent futures, so handlers must be
/// `Send + Sync`. The default implementation ignores everything.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &PipelineEvent) {
        let _ = event;
    }
}

/// Discards all events.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
///
/// ```ignore
/// let handler = FnEventHandler::new(|event| {
///     if let PipelineEvent::ChunkSummarized { index, .. } = event {
///         eprintln!("chunk {index} done");
///     }
/// });
/// ```
pub struct FnEventHandler<F>(F)
where
    F: Fn(&PipelineEvent) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    fn on_event(&self, event: &PipelineEvent) {
        (self.0)(event)
    }
}

/// Renders events through `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::TargetResolved {
                original_words,
                target_words,
                mode,
                path,
            } => {
                info!(
                    "Target {target_words} words ({mode}) for a {original_words}-word document, {path} path"
                );
            }
            PipelineEvent::ChunksPlanned { count, chunk_size } => {
                info!("Planned {count} chunk(s) of ~{chunk_size} words");
            }
            PipelineEvent::ChunkSummarized {
                index,
                chunk_words,
                summary_words,
            } => {
                debug!("Chunk {index}: {chunk_words} -> {summary_words} words");
            }
            PipelineEvent::DraftMerged {
                partial_count,
                total_words,
            } => {
                info!("Merged {partial_count} partial summaries into a {total_words}-word draft");
            }
            PipelineEvent::AttemptFinished {
                attempt,
                max_attempts,
                words,
                target_words,
                within_target,
            } => {
                if *within_target {
                    info!("[attempt {attempt}/{max_attempts}] {words} words, target {target_words}: accepted");
                } else {
                    debug!("[attempt {attempt}/{max_attempts}] {words} words, target {target_words}: out of range");
                }
            }
            PipelineEvent::TruncationRepaired {
                attempt,
                by_continuation,
            } => {
                let how = if *by_continuation {
                    "continuation"
                } else {
                    "local trim"
                };
                debug!("[attempt {attempt}] Repaired truncated draft by {how}");
            }
            PipelineEvent::Finished {
                summary_words,
                target_words,
                within_target,
            } => {
                if *within_target {
                    info!("Summary finished: {summary_words} words (target {target_words})");
                } else {
                    warn!(
                        "Summary finished outside the target band: {summary_words} words (target {target_words})"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn fn_handler_receives_events() {
        let seen = Mutex::new(Vec::new());
        let handler = FnEventHandler::new(|event| {
            seen.lock().unwrap().push(event.clone());
        });
        handler.on_event(&PipelineEvent::ChunksPlanned {
            count: 3,
            chunk_size: 1000,
        });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn noop_and_logging_handlers_accept_every_event() {
        let events = [
            PipelineEvent::TargetResolved {
                original_words: 3000,
                target_words: 600,
                mode: TargetMode::AutoRatio,
                path: SummaryPath::Chunked,
            },
            PipelineEvent::DraftMerged {
                partial_count: 3,
                total_words: 600,
            },
            PipelineEvent::TruncationRepaired {
                attempt: 1,
                by_continuation: false,
            },
            PipelineEvent::Finished {
                summary_words: 590,
                target_words: 600,
                within_target: true,
            },
        ];
        for event in &events {
            NoopHandler.on_event(event);
            LoggingHandler.on_event(event);
        }
    }
}
