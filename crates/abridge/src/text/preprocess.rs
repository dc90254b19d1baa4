//! Document normalization before counting and chunking.
//!
//! Extracted text carries noise that inflates word counts and wastes model
//! context: page markers, decorative rules, bullet glyphs and ragged spacing.
//! [`clean_text`] removes it line by line and is deterministic.

use regex::Regex;
use std::sync::LazyLock;

// Literal patterns; compiled once.
static PAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:page|pg)\s*\d+\s*$").expect("page marker regex"));

static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-=_]{4,})$").expect("rule regex"));

static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]\s+|\d+\.\s+)").expect("bullet regex"));

/// Normalize raw extracted text.
///
/// Drops blank lines, standalone page markers ("Page 3") and horizontal
/// rules, strips simple bullet markers while keeping their content, collapses
/// runs of whitespace inside each line, and rejoins with single newlines.
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !PAGE_MARKER.is_match(line))
        .filter(|line| !HORIZONTAL_RULE.is_match(line.trim()))
        .map(|line| {
            let stripped = BULLET_MARKER.replace(line, "");
            stripped.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
