//! Bounded-concurrency chunk compression.
//!
//! Every chunk is compressed by one generation call. Calls run concurrently
//! up to `FanOutConfig::concurrency`, gated by a [`tokio::sync::Semaphore`],
//! and results land in a slot addressed by `Chunk::index` so the output order
//! never depends on completion order. The first failed call fails the whole
//! batch and drops the calls still in flight.

use super::chunking::Chunk;
use super::config::FanOutConfig;
use super::events::{EventHandler, NoopHandler, PipelineEvent};
use super::prompts;
use crate::api::{GenerationRequest, Generator};
use crate::error::{GenerationError, SummarizeError};
use crate::text::{LengthConstraint, count_words};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

/// The compressed form of one chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialSummary {
    pub chunk_id: String,
    pub index: usize,
    pub text: String,
    pub word_count: usize,
    /// `word_count / chunk word count`.
    pub compression_ratio: f64,
}

/// Compresses chunks through a [`Generator`].
pub struct ChunkSummarizer<'a, G: Generator + ?Sized> {
    generator: &'a G,
    config: &'a FanOutConfig,
    events: &'a dyn EventHandler,
}

impl<'a, G: Generator + ?Sized> ChunkSummarizer<'a, G> {
    pub fn new(generator: &'a G, config: &'a FanOutConfig) -> Self {
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

    /// Word goal for a chunk of `chunk_words` words (at least 1).
    pub fn chunk_target(&self, chunk_words: usize) -> usize {
        ((chunk_words as f64 * self.config.ratio).round() as usize).max(1)
    }

    /// Build the generation request for one chunk.
    pub fn build_request(&self, chunk: &Chunk) -> GenerationRequest {
        let target = self.chunk_target(chunk.word_count);
        let budget = LengthConstraint::Words(target)
            .token_budget()
            .min(self.config.max_tokens_per_chunk);
        GenerationRequest::new(
            prompts::chunk_instructions(target, self.config.ratio),
            chunk.text.clone(),
        )
        .with_max_tokens(budget)
        .with_temperature(self.config.temperature)
        .with_top_p(self.config.top_p)
    }

    /// Compress a single chunk.
    pub async fn summarize_chunk(&self, chunk: &Chunk) -> Result<PartialSummary, GenerationError> {
        let request = self.build_request(chunk);
        trace!(
            "Chunk {} ({} words): budget {} tokens",
            chunk.index, chunk.word_count, request.max_tokens
        );
        let raw = self.generator.generate(request).await?;
        let text = raw.trim().to_string();
        let word_count = count_words(&text);
        let compression_ratio = if chunk.word_count > 0 {
            word_count as f64 / chunk.word_count as f64
        } else {
            1.0
        };

        self.events.on_event(&PipelineEvent::ChunkSummarized {
            index: chunk.index,
            chunk_words: chunk.word_count,
            summary_words: word_count,
        });

        Ok(PartialSummary {
            chunk_id: chunk.id.clone(),
            index: chunk.index,
            text,
            word_count,
            compression_ratio,
        })
    }

    /// Compress every chunk, at most `concurrency` at a time.
    ///
    /// Returns one partial summary per chunk, ordered by chunk index. Any
    /// generation failure is returned unchanged as [`SummarizeError::Generation`].
    pub async fn summarize_all(&self, chunks: &[Chunk]) -> Result<Vec<PartialSummary>, SummarizeError> {
        let permits = Semaphore::new(self.config.concurrency.max(1));
        debug!(
            "Summarizing {} chunk(s), concurrency {}",
            chunks.len(),
            self.config.concurrency
        );

        let calls = chunks.iter().map(|chunk| {
            let permits = &permits;
            async move {
                let _permit = permits
                    .acquire()
                    .await
                    .map_err(|e| GenerationError::Other(format!("fan-out gate closed: {e}")))?;
                self.summarize_chunk(chunk).await
            }
        });
        let finished = futures::future::try_join_all(calls).await?;

        let mut slots: Vec<Option<PartialSummary>> = vec![None; chunks.len()];
        for partial in finished {
            if let Some(slot) = slots.get_mut(partial.index) {
                *slot = Some(partial);
            }
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(SummarizeError::MissingPartial { index }))
            .collect()
    }
}
