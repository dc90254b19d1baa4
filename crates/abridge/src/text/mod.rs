//! Text primitives shared by every pipeline stage.
//!
//! - Word counting: [`count_words`] is the single definition of "length"
//!   used everywhere a target is checked.
//! - Token estimation: [`LengthConstraint`] and [`estimate_tokens`] convert
//!   word or character goals into output token budgets.
//! - [`preprocess`] — noise removal before counting.
//! - [`truncation`] — cut-off detection and repair heuristics.

pub mod preprocess;
pub mod truncation;

pub use preprocess::clean_text;
pub use truncation::{TruncationRules, is_truncated, seal, strip_lead_in, trim_to_last_sentence};

use serde::{Deserialize, Serialize};

/// Words per token for English prose (tokens ≈ words / 0.75).
pub const WORDS_PER_TOKEN: f64 = 0.75;

/// Characters per token for English prose.
pub const CHARS_PER_TOKEN: f64 = 3.0;

/// Headroom added to every budget so a response can close its last sentence.
const BUDGET_PADDING_TOKENS: u32 = 50;

/// Smallest budget ever requested from the generator.
const MIN_BUDGET_TOKENS: u32 = 100;

/// Count whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split text into whitespace-separated words.
pub fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Coarse token estimate for a run of words (at least 1).
pub fn estimate_tokens(word_count: usize) -> usize {
    ((word_count as f64 / WORDS_PER_TOKEN) as usize).max(1)
}

/// Desired output length, in the unit the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum LengthConstraint {
    Words(usize),
    Characters(usize),
}

impl LengthConstraint {
    /// Output token budget for this constraint, padded and floored.
    pub fn token_budget(&self) -> u32 {
        let raw = match *self {
            LengthConstraint::Words(n) => n as f64 / WORDS_PER_TOKEN,
            LengthConstraint::Characters(n) => n as f64 / CHARS_PER_TOKEN,
        };
        (raw.ceil() as u32)
            .saturating_add(BUDGET_PADDING_TOKENS)
            .max(MIN_BUDGET_TOKENS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_words_across_mixed_whitespace() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \n\t "), 0);
        assert_eq!(count_words("one  two\nthree\tfour "), 4);
    }

    #[test]
    fn token_estimate_is_at_least_one() {
        assert_eq!(estimate_tokens(0), 1);
        assert_eq!(estimate_tokens(75), 100);
        assert_eq!(estimate_tokens(1000), 1333);
    }

    #[test]
    fn word_budget_pads_and_floors() {
        assert_eq!(LengthConstraint::Words(10).token_budget(), 100);
        assert_eq!(LengthConstraint::Words(300).token_budget(), 450);
    }

    #[test]
    fn character_budget_uses_char_ratio() {
        assert_eq!(LengthConstraint::Characters(900).token_budget(), 350);
    }

    #[test]
    fn constraint_deserializes_from_tagged_map() {
        let c: LengthConstraint =
            serde_json::from_str(r#"{"type":"words","value":250}"#).unwrap();
        assert_eq!(c, LengthConstraint::Words(250));
        let c: LengthConstraint =
            serde_json::from_str(r#"{"type":"characters","value":80}"#).unwrap();
        assert_eq!(c, LengthConstraint::Characters(80));
    }
}
