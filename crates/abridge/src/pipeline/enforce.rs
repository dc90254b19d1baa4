//! Length enforcement: drive a draft toward the target word count.
//!
//! Each attempt asks the generator for a summary of the draft, repairs it if
//! it stopped mid-thought, strips boilerplate lead-ins, and counts words. The
//! first attempt inside the acceptance band wins. When every attempt misses,
//! the one closest to the target is returned with `within_target = false`;
//! missing the band is never an error.
//!
//! Attempts are strictly sequential because each one's instructions depend on
//! how the previous one missed.

use super::config::EnforcementConfig;
use super::events::{EventHandler, NoopHandler, PipelineEvent};
use super::prompts::{self, DraftKind};
use crate::api::{GenerationRequest, Generator};
use crate::error::{GenerationError, SummarizeError};
use crate::text::{
    LengthConstraint, TruncationRules, count_words, is_truncated, seal, split_words, strip_lead_in,
};
use serde::Serialize;
use tracing::{debug, warn};

/// The summary handed to the output formatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedSummary {
    pub text: String,
    pub summary_words: usize,
    pub target_words: usize,
    /// `summary_words / target_words`.
    pub achieved_ratio: f64,
}

/// How the enforcement loop went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnforcementReport {
    pub attempts_used: u32,
    pub within_target: bool,
    /// Any attempt needed truncation repair.
    pub truncation_repaired: bool,
    /// `|summary_words - target_words|` of the returned attempt.
    pub deviation: usize,
}

/// One finished attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub number: u32,
    pub text: String,
    pub words: usize,
    pub deviation: usize,
    pub repaired: bool,
}

/// `[round(target × (1 − tolerance)), round(target × (1 + tolerance))]`.
pub fn acceptance_band(target_words: usize, tolerance: f64) -> (usize, usize) {
    let t = target_words as f64;
    (
        (t * (1.0 - tolerance)).round() as usize,
        (t * (1.0 + tolerance)).round() as usize,
    )
}

/// Output token budget for a target: the padded word budget scaled by a
/// multiplier that grows with the target, capped at `cap`.
pub fn token_budget(target_words: usize, cap: u32) -> u32 {
    // Multiplier in tenths: 1.8x, 2.1x, 2.4x.
    let multiplier: u32 = match target_words {
        0..=500 => 18,
        501..=1500 => 21,
        _ => 24,
    };
    let base = LengthConstraint::Words(target_words).token_budget();
    base.saturating_mul(multiplier).div_ceil(10).min(cap)
}

/// The non-empty attempt with the smallest deviation; the earliest wins ties.
pub fn best_attempt(attempts: &[Attempt]) -> Option<&Attempt> {
    attempts
        .iter()
        .filter(|a| a.words > 0)
        .fold(None, |best: Option<&Attempt>, a| match best {
            Some(b) if b.deviation <= a.deviation => Some(b),
            _ => Some(a),
        })
}

/// Drives drafts to a word target through a [`Generator`].
pub struct LengthEnforcer<'a, G: Generator + ?Sized> {
    generator: &'a G,
    config: &'a EnforcementConfig,
    rules: &'a TruncationRules,
    events: &'a dyn EventHandler,
}

impl<'a, G: Generator + ?Sized> LengthEnforcer<'a, G> {
    pub fn new(generator: &'a G, config: &'a EnforcementConfig, rules: &'a TruncationRules) -> Self {
        Self {
            generator,
            config,
            rules,
            events: &NoopHandler,
        }
    }

    pub fn with_event_handler(mut self, events: &'a dyn EventHandler) -> Self {
        self.events = events;
        self
    }

    /// Summarize `draft` to `target_words` in at most `max_attempts` attempts.
    ///
    /// Errors only for a draft with no words, a run where every attempt came
    /// back empty, or a generation failure (propagated unchanged).
    pub async fn enforce(
        &self,
        draft: &str,
        target_words: usize,
        kind: DraftKind,
        max_attempts: u32,
        user_instruction: Option<&str>,
    ) -> Result<(FinalizedSummary, EnforcementReport), SummarizeError> {
        if count_words(draft) == 0 {
            return Err(SummarizeError::EmptyDraft);
        }
        let max_attempts = max_attempts.max(1);
        let band = acceptance_band(target_words, self.config.tolerance);
        let in_band = |words: usize| words >= band.0 && words <= band.1;
        let content = match kind {
            DraftKind::Document => draft.to_string(),
            DraftKind::SectionSummaries => prompts::synthesis_content(draft),
        };
        let max_tokens = token_budget(target_words, self.config.max_tokens);
        debug!(
            "Enforcing {target_words} words (band {}-{}), up to {max_attempts} attempt(s), {max_tokens} tokens each",
            band.0, band.1
        );

        let mut attempts: Vec<Attempt> = Vec::with_capacity(max_attempts as usize);
        for number in 1..=max_attempts {
            let previous = attempts.last().map(|a| a.words);
            let request = GenerationRequest::new(
                prompts::enforcement_instructions(kind, target_words, band, previous, user_instruction),
                content.clone(),
            )
            .with_max_tokens(max_tokens)
            .with_temperature(self.config.temperature_for_attempt(number))
            .with_top_p(self.config.top_p);

            let raw = self.generate_or_empty(request).await?;
            let (completed, repaired) = self.complete(raw.trim(), number).await?;
            let text = strip_lead_in(&completed, self.rules);
            let words = count_words(&text);
            let within = in_band(words);

            self.events.on_event(&PipelineEvent::AttemptFinished {
                attempt: number,
                max_attempts,
                words,
                target_words,
                within_target: within,
            });
            attempts.push(Attempt {
                number,
                text,
                words,
                deviation: words.abs_diff(target_words),
                repaired,
            });
            if within {
                break;
            }
        }

        let accepted = attempts.last().filter(|a| in_band(a.words));
        let within_target = accepted.is_some();
        let chosen = accepted
            .filter(|a| a.words > 0)
            .or_else(|| best_attempt(&attempts))
            .ok_or(SummarizeError::EmptySummary {
                attempts: attempts.len() as u32,
            })?;

        if !within_target {
            warn!(
                "No attempt landed in {}-{} words; using attempt {} ({} words)",
                band.0, band.1, chosen.number, chosen.words
            );
        }

        let report = EnforcementReport {
            attempts_used: attempts.len() as u32,
            within_target,
            truncation_repaired: attempts.iter().any(|a| a.repaired),
            deviation: chosen.deviation,
        };
        let summary = FinalizedSummary {
            text: chosen.text.clone(),
            summary_words: chosen.words,
            target_words,
            achieved_ratio: if target_words > 0 {
                chosen.words as f64 / target_words as f64
            } else {
                0.0
            },
        };
        Ok((summary, report))
    }

    /// Return `raw` unchanged if it ends cleanly, otherwise repaired.
    ///
    /// Repair first asks the generator to continue from the trailing words
    /// (when enabled); if that still leaves the text cut off, it is trimmed
    /// back to its last complete sentence.
    async fn complete(&self, raw: &str, attempt: u32) -> Result<(String, bool), SummarizeError> {
        if !is_truncated(raw, self.rules) {
            return Ok((raw.to_string(), false));
        }
        debug!("[attempt {attempt}] Draft appears cut off, repairing");

        let mut candidate = raw.to_string();
        if self.config.continuation_repair {
            let words = split_words(raw);
            let tail_start = words.len().saturating_sub(self.config.continuation_tail_words);
            let tail = words.get(tail_start..).unwrap_or_default().join(" ");
            let request = GenerationRequest::new(prompts::continuation_instructions(), tail)
                .with_max_tokens(self.config.continuation_max_tokens)
                .with_temperature(self.config.min_temperature)
                .with_top_p(self.config.top_p);

            let continuation = self.generate_or_empty(request).await?;
            candidate = join_continuation(raw, continuation.trim());
            if !is_truncated(&candidate, self.rules) {
                self.events.on_event(&PipelineEvent::TruncationRepaired {
                    attempt,
                    by_continuation: true,
                });
                return Ok((candidate, true));
            }
        }

        self.events.on_event(&PipelineEvent::TruncationRepaired {
            attempt,
            by_continuation: false,
        });
        Ok((seal(&candidate, self.rules), true))
    }

    /// One generation call, with an empty response counted as empty text.
    async fn generate_or_empty(&self, request: GenerationRequest) -> Result<String, SummarizeError> {
        match self.generator.generate(request).await {
            Ok(text) => Ok(text),
            Err(GenerationError::Empty) => {
                debug!("Generator returned nothing");
                Ok(String::new())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Append a continuation, without a space when it starts with punctuation.
fn join_continuation(text: &str, continuation: &str) -> String {
    if continuation.is_empty() {
        return text.to_string();
    }
    let glue = continuation
        .chars()
        .next()
        .is_some_and(|c| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')'));
    if glue {
        format!("{text}{continuation}")
    } else {
        format!("{text} {continuation}")
    }
}
