//! Cut-off detection and repair for generated text.
//!
//! Models stop mid-sentence when the token budget runs out or when they lose
//! track of the length target. Everything here is a pure function of the text
//! and a [`TruncationRules`] word list, so the heuristics are testable without
//! any generation call:
//!
//! - [`is_truncated`] — does the text end mid-thought?
//! - [`trim_to_last_sentence`] — longest prefix that ends cleanly.
//! - [`seal`] — always returns text that [`is_truncated`] accepts.
//! - [`strip_lead_in`] — drop "Here is a summary:" style preambles.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#{1,6}(?:\s|$)").expect("heading regex"));

static BARE_LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+•]|\d+[.)])\s*$").expect("list marker regex"));

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+•]|\d+[.)])\s+(.*)$").expect("list item regex"));

static COUNTED_LEAD_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*here(?:'s|’s| is)\s+(?:a|an|the|your)\s+(?:(?:concise|brief|short)\s+)?(?:\d+[- ]words?\s+)?summary(?:\s+of\s+the\s+(?:text|document|draft|sections?))?\s*:",
    )
    .expect("lead-in regex")
});

/// Characters that may close a sentence after its terminal punctuation.
const CLOSERS: &[char] = &['"', '\'', '”', '’', ')', ']', '*', '_', '»', '`'];

/// A list item with at least this many words and a clean last word counts as complete.
const MIN_LIST_ITEM_WORDS: usize = 3;

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Word lists driving the truncation heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruncationRules {
    /// Words a complete sentence never ends on (conjunctions, prepositions, articles).
    pub dangling_words: Vec<String>,
    /// Preambles removed from the start of generated text (ASCII, case-insensitive).
    pub lead_in_phrases: Vec<String>,
}

impl Default for TruncationRules {
    fn default() -> Self {
        let dangling = [
            "and", "or", "but", "nor", "so", "yet", "however", "therefore", "because",
            "although", "though", "while", "whereas", "if", "then", "than", "that", "which",
            "who", "whose", "to", "of", "in", "on", "at", "by", "for", "with", "from", "into",
            "onto", "about", "as", "the", "a", "an", "including", "such",
        ];
        let lead_ins = [
            "Here's a summary of the text:",
            "Here is a summary of the text:",
            "Here's a summary of the document:",
            "Here is a summary of the document:",
            "Here's a summary:",
            "Here is a summary:",
            "The following is a summary:",
            "This is a summary of the text:",
            "Below is a summary:",
            "Summary:",
        ];
        Self {
            dangling_words: dangling.iter().map(|s| (*s).to_string()).collect(),
            lead_in_phrases: lead_ins.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl TruncationRules {
    fn is_dangling(&self, word: &str) -> bool {
        let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
        !bare.is_empty()
            && self
                .dangling_words
                .iter()
                .any(|d| d.eq_ignore_ascii_case(bare))
    }
}

/// Whether `text` appears cut off mid-thought.
///
/// Empty text is not truncated. Otherwise it is truncated when any of these hold:
/// - the last line is a heading or a bare list marker;
/// - the final word is a dangling conjunction/preposition (questions excepted);
/// - the last visible character, ignoring closing quotes/brackets/emphasis, is
///   not `.`, `!` or `?` and the last line is neither a table row nor a list
///   item of at least three words.
pub fn is_truncated(text: &str, rules: &TruncationRules) -> bool {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return false;
    }
    let last_line = trimmed.lines().last().unwrap_or(trimmed);

    if HEADING_LINE.is_match(last_line) || BARE_LIST_MARKER.is_match(last_line) {
        return true;
    }

    let core = trimmed.trim_end_matches(CLOSERS);
    let is_question = core.ends_with('?');
    if !is_question
        && let Some(last_word) = trimmed.split_whitespace().last()
        && rules.is_dangling(last_word)
    {
        return true;
    }

    if core.chars().last().is_some_and(is_terminal) {
        return false;
    }

    let line = last_line.trim();
    if line.len() > 1 && line.starts_with('|') && line.ends_with('|') {
        return false;
    }
    if let Some(caps) = LIST_ITEM.captures(last_line) {
        let item = caps.get(1).map_or("", |m| m.as_str());
        if item.split_whitespace().count() >= MIN_LIST_ITEM_WORDS {
            return false;
        }
    }
    true
}

/// Byte offsets where a complete prefix could end: after terminal punctuation
/// (plus closers) followed by whitespace, and at every line break.
fn boundary_offsets(text: &str) -> Vec<usize> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (pos, c) = chars[i];
        if c == '\n' {
            out.push(pos);
        } else if is_terminal(c) {
            let mut j = i + 1;
            while j < chars.len() && CLOSERS.contains(&chars[j].1) {
                j += 1;
            }
            let end = chars.get(j).map_or(text.len(), |&(p, _)| p);
            let at_break = chars.get(j).is_none_or(|&(_, next)| next.is_whitespace());
            if at_break {
                out.push(end);
            }
            i = j;
            continue;
        }
        i += 1;
    }
    out
}

/// The longest proper prefix of `text` that ends cleanly, if any.
pub fn trim_to_last_sentence(text: &str, rules: &TruncationRules) -> Option<String> {
    let trimmed = text.trim_end();
    boundary_offsets(trimmed)
        .into_iter()
        .rev()
        .filter(|&end| end < trimmed.len())
        .filter_map(|end| trimmed.get(..end))
        .map(str::trim_end)
        .find(|prefix| !prefix.is_empty() && !is_truncated(prefix, rules))
        .map(str::to_string)
}

/// Return a version of `text` that does not end mid-thought.
///
/// Complete text passes through (trailing whitespace removed). Truncated text
/// is cut back to its last complete sentence; when there is none, trailing
/// dangling words and markup are dropped and a single period closes the
/// fragment. Line breaks and list bullets in the fragment survive.
pub fn seal(text: &str, rules: &TruncationRules) -> String {
    if !is_truncated(text, rules) {
        return text.trim_end().to_string();
    }
    if let Some(prefix) = trim_to_last_sentence(text, rules) {
        return prefix;
    }

    // Keep line layout and leading list markers, drop heading hashes, then
    // peel dangling words and stray markup off the end.
    let mut lines: Vec<(Option<&str>, Vec<&str>)> = text
        .lines()
        .filter_map(|line| {
            let mut tokens: Vec<&str> = line.split_whitespace().collect();
            let marker = (tokens.len() > 1 && BARE_LIST_MARKER.is_match(tokens[0]))
                .then(|| tokens.remove(0));
            tokens.retain(|w| !w.chars().all(|c| c == '#'));
            (!tokens.is_empty()).then_some((marker, tokens))
        })
        .collect();
    while let Some((_, words)) = lines.last_mut() {
        match words.last() {
            Some(w) if is_markup(w) || rules.is_dangling(w) => {
                words.pop();
            }
            Some(_) => break,
            None => {
                lines.pop();
            }
        }
    }
    if lines.is_empty() {
        return String::new();
    }

    let joined = lines
        .iter()
        .map(|(marker, words)| match marker {
            Some(marker) => format!("{marker} {}", words.join(" ")),
            None => words.join(" "),
        })
        .collect::<Vec<_>>()
        .join("\n");
    let mut sealed = joined
        .trim_end_matches(|c: char| {
            c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.' | '-' | '–' | '—')
        })
        .to_string();
    sealed.push('.');
    sealed
}

/// A token that carries no words: list bullets, numbering, rules, dashes.
fn is_markup(word: &str) -> bool {
    BARE_LIST_MARKER.is_match(word)
        || word
            .chars()
            .all(|c| matches!(c, '#' | '-' | '*' | '+' | '•' | '|' | '–' | '—'))
}

/// Remove a boilerplate preamble such as "Here is a summary:" from the start.
pub fn strip_lead_in(text: &str, rules: &TruncationRules) -> String {
    let trimmed = text.trim_start();

    if let Some(m) = COUNTED_LEAD_IN.find(trimmed) {
        return tidy_after_lead_in(trimmed.get(m.end()..).unwrap_or(""));
    }

    for phrase in &rules.lead_in_phrases {
        let matches = trimmed
            .get(..phrase.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(phrase));
        if matches {
            return tidy_after_lead_in(trimmed.get(phrase.len()..).unwrap_or(""));
        }
    }
    trimmed.to_string()
}

fn tidy_after_lead_in(rest: &str) -> String {
    rest.trim_start_matches(|c: char| c == ':' || c == '—' || c == '–' || c.is_whitespace())
        .to_string()
}
