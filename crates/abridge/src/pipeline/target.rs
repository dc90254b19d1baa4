//! Target resolution: how many words the final summary should have.
//!
//! Precedence, highest first:
//!
//! 1. A length request embedded in the free-form instruction
//!    ("summarize this in about 250 words"), if it is plausible for the
//!    document.
//! 2. An explicit positive target from the caller, capped to the document
//!    length.
//! 3. A fixed default for small documents, or a ratio of the document length
//!    for large ones.
//!
//! The result is then held inside `[min_target_words, max_target_words]` and
//! never above the document's own word count. Resolution is pure and never
//! fails; non-positive explicit targets count as "not provided".

use super::config::TargetConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Length-request patterns, tried in order.
static PROMPT_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\b(?:in|into|about|around|approximately|approx\.?)\s+(\d{2,5})\s+words?\b")
            .expect("approximate-length regex"),
        Regex::new(r"(?i)\bsummary\s+of\s+(\d{2,5})\s+words?\b").expect("summary-of regex"),
        Regex::new(r"(?i)\b(\d{2,5})[\s-]+words?\b").expect("bare-length regex"),
    ]
});

/// How the resolved target was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    UserAbsolute,
    UserAbsoluteCapped,
    PromptExtracted,
    SmallDocDefault,
    AutoRatio,
}

impl TargetMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserAbsolute => "user_absolute",
            Self::UserAbsoluteCapped => "user_absolute_capped",
            Self::PromptExtracted => "prompt_extracted",
            Self::SmallDocDefault => "small_doc_default",
            Self::AutoRatio => "auto_ratio",
        }
    }
}

impl std::fmt::Display for TargetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolved word goal for a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSpec {
    /// Positive explicit target from the caller, if any.
    pub requested_words: Option<usize>,
    pub resolved_words: usize,
    pub mode: TargetMode,
    pub original_words: usize,
    /// Length found in the instruction, whether or not it won.
    pub prompt_target: Option<usize>,
    /// The instruction's length replaced an explicit caller target.
    pub prompt_overrode_param: bool,
}

/// Whether a document of `words` words takes the direct (unchunked) path.
pub fn is_small_document(words: usize, config: &TargetConfig) -> bool {
    words < config.small_doc_threshold
}

/// Find a plausible word count in a free-form instruction.
///
/// Each pattern contributes its first match; the first candidate inside
/// `[min_allowed, original_words]` wins.
pub fn extract_prompt_target(
    instruction: &str,
    original_words: usize,
    config: &TargetConfig,
) -> Option<usize> {
    let min_allowed = if original_words < config.short_doc_words {
        config.prompt_min_short
    } else {
        config.prompt_min
    };
    PROMPT_PATTERNS
        .iter()
        .filter_map(|re| re.captures(instruction))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<usize>().ok())
        .find(|&n| n >= min_allowed && n <= original_words)
}

/// Resolve the target for a document of `original_words` words.
pub fn resolve_target(
    original_words: usize,
    explicit: Option<i64>,
    instruction: Option<&str>,
    config: &TargetConfig,
) -> TargetSpec {
    let requested = explicit
        .filter(|&n| n > 0)
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX));
    let prompt_target = instruction
        .and_then(|text| extract_prompt_target(text, original_words, config));

    let (raw, mode) = match (prompt_target, requested) {
        (Some(n), _) => (n, TargetMode::PromptExtracted),
        (None, Some(n)) if n > original_words => (original_words, TargetMode::UserAbsoluteCapped),
        (None, Some(n)) => (n, TargetMode::UserAbsolute),
        (None, None) if is_small_document(original_words, config) => {
            (config.small_doc_default, TargetMode::SmallDocDefault)
        }
        (None, None) => (
            (original_words as f64 * config.auto_ratio).round() as usize,
            TargetMode::AutoRatio,
        ),
    };

    let resolved = raw
        .clamp(config.min_target_words, config.max_target_words)
        .min(original_words);

    TargetSpec {
        requested_words: requested,
        resolved_words: resolved,
        mode,
        original_words,
        prompt_target,
        prompt_overrode_param: prompt_target.is_some() && requested.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> TargetConfig {
        TargetConfig::default()
    }

    #[test]
    fn small_document_gets_default() {
        let resolved = resolve_target(300, None, None, &cfg());
        assert_eq!(resolved.resolved_words, 100);
        assert_eq!(resolved.mode, TargetMode::SmallDocDefault);
    }

    #[test]
    fn large_document_gets_ratio() {
        let resolved = resolve_target(3000, None, None, &cfg());
        assert_eq!(resolved.resolved_words, 600);
        assert_eq!(resolved.mode, TargetMode::AutoRatio);
    }

    #[test]
    fn ratio_is_bounded_by_ceiling() {
        let resolved = resolve_target(50_000, None, None, &cfg());
        assert_eq!(resolved.resolved_words, 2000);
        assert_eq!(resolved.mode, TargetMode::AutoRatio);
    }

    #[test]
    fn explicit_target_above_length_is_capped() {
        let resolved = resolve_target(450, Some(5000), None, &cfg());
        assert_eq!(resolved.resolved_words, 450);
        assert_eq!(resolved.mode, TargetMode::UserAbsoluteCapped);
        assert_eq!(resolved.requested_words, Some(5000));
    }

    #[test]
    fn explicit_target_used_as_is() {
        let resolved = resolve_target(3000, Some(300), None, &cfg());
        assert_eq!(resolved.resolved_words, 300);
        assert_eq!(resolved.mode, TargetMode::UserAbsolute);
    }

    #[test]
    fn non_positive_explicit_target_ignored() {
        for bad in [0, -5] {
            let resolved = resolve_target(3000, Some(bad), None, &cfg());
            assert_eq!(resolved.mode, TargetMode::AutoRatio);
            assert_eq!(resolved.requested_words, None);
        }
    }

    #[test]
    fn prompt_target_extracted() {
        let resolved = resolve_target(3000, None, Some("summarize this in about 250 words"), &cfg());
        assert_eq!(resolved.resolved_words, 250);
        assert_eq!(resolved.mode, TargetMode::PromptExtracted);
        assert!(!resolved.prompt_overrode_param);
    }

    #[test]
    fn prompt_target_overrides_explicit_param() {
        let resolved = resolve_target(3000, Some(400), Some("Give me a summary of 150 words"), &cfg());
        assert_eq!(resolved.resolved_words, 150);
        assert_eq!(resolved.mode, TargetMode::PromptExtracted);
        assert_eq!(resolved.prompt_target, Some(150));
        assert!(resolved.prompt_overrode_param);
    }

    #[test]
    fn hyphenated_word_count_is_recognized() {
        assert_eq!(
            extract_prompt_target("Write a 120-word abstract", 1000, &cfg()),
            Some(120)
        );
    }

    #[test]
    fn implausible_prompt_target_falls_through() {
        let resolved = resolve_target(400, Some(80), Some("in about 900 words please"), &cfg());
        assert_eq!(resolved.mode, TargetMode::UserAbsolute);
        assert_eq!(resolved.resolved_words, 80);
        assert_eq!(resolved.prompt_target, None);
    }

    #[test]
    fn short_documents_accept_smaller_prompt_targets() {
        assert_eq!(extract_prompt_target("about 08 words", 40, &cfg()), Some(8));
        assert_eq!(extract_prompt_target("about 08 words", 400, &cfg()), None);
    }

    #[test]
    fn floor_applies_but_never_exceeds_document() {
        let resolved = resolve_target(1000, Some(5), None, &cfg());
        assert_eq!(resolved.resolved_words, 20);

        let resolved = resolve_target(25, None, None, &cfg());
        assert_eq!(resolved.resolved_words, 25);
        assert!(resolved.resolved_words <= resolved.original_words);
    }

    #[test]
    fn small_document_threshold_is_strict() {
        assert!(is_small_document(499, &cfg()));
        assert!(!is_small_document(500, &cfg()));
    }
}
