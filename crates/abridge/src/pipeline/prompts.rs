//! Instructions for every generation call the pipeline makes.
//!
//! Each builder returns the system-level instructions for one call; the
//! document text always travels separately as the call's content. The numeric
//! target is stated first so it is unambiguous, then the acceptance range and
//! any escalation for later attempts.

use std::fmt::Write;

/// Shared persona for all summarization calls.
const SUMMARIZER_PERSONA: &str = "\
You are a careful summarization assistant. You compress text faithfully, \
preserving key facts, entities, numbers, causal links, and structure. \
Always produce clean, well-structured Markdown.";

const COMPLETENESS_RULES: &str = "\
Rules:
- Return ONLY the summary. No preamble such as \"Here is a summary\".
- Do not add a title unless one is clearly inherent in the text.
- Do not invent facts.
- Finish every sentence. Never end mid-sentence or on a conjunction.";

/// Which draft the length enforcer is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    /// The whole (small) source document.
    Document,
    /// Merged per-chunk summaries of a large document.
    SectionSummaries,
}

/// Instructions for compressing one chunk.
pub fn chunk_instructions(target_words: usize, ratio: f64) -> String {
    format!(
        "{SUMMARIZER_PERSONA}\n\n\
         Summarize the text you are given into approximately {target_words} words \
         (~{}% of its original length). Use bullet lists or short paragraphs where helpful.\n\n\
         {COMPLETENESS_RULES}",
        (ratio * 100.0).round() as u32
    )
}

/// Instructions for one length-enforcement attempt.
///
/// `previous_words` is the word count of the previous attempt; when present
/// the instructions say the range was missed and in which direction.
pub fn enforcement_instructions(
    kind: DraftKind,
    target_words: usize,
    band: (usize, usize),
    previous_words: Option<usize>,
    user_instruction: Option<&str>,
) -> String {
    let (low, high) = band;
    let mut out = String::from(SUMMARIZER_PERSONA);
    out.push_str("\n\n");

    match kind {
        DraftKind::Document => {
            let _ = write!(
                out,
                "Write a summary of approximately {target_words} words of the document you are given."
            );
        }
        DraftKind::SectionSummaries => {
            let _ = write!(
                out,
                "Write one unified summary of approximately {target_words} words from the \
                 section summaries you are given. They cover consecutive parts of a single \
                 document. Integrate all key points, remove redundancy, and keep a logical flow."
            );
        }
    }
    let _ = write!(
        out,
        " The result MUST contain between {low} and {high} words."
    );

    if let Some(prev) = previous_words {
        let direction = if prev < low {
            "too short. Add supporting detail"
        } else {
            "too long. Cut secondary detail"
        };
        let _ = write!(
            out,
            "\n\nA previous attempt produced {prev} words, outside the required range of \
             {low}-{high}. That was {direction} and aim for exactly {target_words}."
        );
    }

    if let Some(extra) = user_instruction.map(str::trim).filter(|s| !s.is_empty()) {
        let _ = write!(out, "\n\nAdditional instructions from the user:\n{extra}");
    }

    out.push_str("\n\n");
    out.push_str(COMPLETENESS_RULES);
    out
}

/// Wrap merged section summaries as content for the synthesis call.
pub fn synthesis_content(merged: &str) -> String {
    format!("SECTION SUMMARIES:\n\n{merged}")
}

/// Instructions for finishing a draft that stopped mid-thought.
pub fn continuation_instructions() -> String {
    format!(
        "{SUMMARIZER_PERSONA}\n\n\
         CONTINUE the text you are given. It was cut off mid-thought. Write only the \
         missing words needed to finish the final sentence (and at most one short \
         concluding sentence). Do not repeat any of the given text."
    )
}
