//! Markdown → readable plain text.
//!
//! Deterministic and line-oriented. Fenced code blocks are lifted out first
//! so nothing inside them is rewritten, then put back as an indented block
//! under a `[code block <lang>]` header.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```([A-Za-z0-9_+-]*)[ \t]*\n(.*?)```").expect("code fence regex")
});
static CODE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@@CODEBLOCK(\d+)@@").expect("placeholder regex"));
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>\n]+>").expect("html regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[([^\]]+)\]\(([^)]+)\)").expect("link regex"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#{1,6}\s+").expect("heading regex"));
static BLOCKQUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*>\s?").expect("blockquote regex"));
static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s+(.*)$").expect("ordered item regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+•]\s+").expect("bullet regex"));
static TABLE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\|?\s*:?-{3,}:?\s*(?:\|\s*:?-{3,}:?\s*)*\|?\s*$").expect("separator regex")
});
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank regex"));

/// Inline markers stripped in order, keeping the inner text.
static INLINE_MARKERS: LazyLock<[Regex; 6]> = LazyLock::new(|| {
    [
        Regex::new(r"\*\*(.+?)\*\*").expect("bold regex"),
        Regex::new(r"\*(.+?)\*").expect("italic regex"),
        Regex::new(r"__(.+?)__").expect("underscore bold regex"),
        Regex::new(r"\b_(.+?)_\b").expect("underscore italic regex"),
        Regex::new(r"~~(.+?)~~").expect("strikethrough regex"),
        Regex::new(r"`([^`]+)`").expect("inline code regex"),
    ]
});

struct CodeBlock {
    lang: String,
    body: String,
}

enum Line {
    Text(String),
    Row(Vec<String>),
}

/// Convert Markdown to plain text.
///
/// Headings keep their text, emphasis markers go, links become
/// `label (url)`, bullets become `- `, ordered lists are renumbered from 1
/// (blank lines do not break a list, any other line does), table separator
/// rows are dropped and cells are space-aligned and joined with ` | `, and
/// runs of blank lines collapse to one.
pub fn markdown_to_plain(markdown: &str) -> String {
    let normalized = markdown.replace("\r\n", "\n");

    let mut blocks: Vec<CodeBlock> = Vec::new();
    let lifted = CODE_FENCE.replace_all(&normalized, |caps: &Captures| {
        blocks.push(CodeBlock {
            lang: caps.get(1).map_or("", |m| m.as_str()).trim().to_string(),
            body: caps.get(2).map_or("", |m| m.as_str()).trim_end().to_string(),
        });
        format!("\n@@CODEBLOCK{}@@\n", blocks.len() - 1)
    });
    let without_html = HTML_TAG.replace_all(&lifted, "");
    let text = LINK.replace_all(&without_html, "$1 ($2)");

    let mut lines: Vec<Line> = Vec::new();
    let mut counter = 1usize;
    for raw in text.lines() {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            lines.push(Line::Text(String::new()));
            continue;
        }
        if TABLE_SEPARATOR.is_match(line) {
            continue;
        }
        let line = HEADING.replace(line, "");
        let line = BLOCKQUOTE.replace(&line, "").into_owned();

        let line = if let Some(caps) = ORDERED_ITEM.captures(&line) {
            let item = format!("{counter}. {}", caps.get(1).map_or("", |m| m.as_str()));
            counter += 1;
            item
        } else {
            counter = 1;
            BULLET.replace(&line, "- ").into_owned()
        };

        let line = strip_inline(&line);
        lines.push(match table_cells(&line) {
            Some(cells) => Line::Row(cells),
            None => Line::Text(line),
        });
    }

    let joined = render(lines).join("\n");
    let restored = CODE_PLACEHOLDER.replace_all(&joined, |caps: &Captures| {
        caps.get(1)
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .and_then(|i| blocks.get(i))
            .map(render_code_block)
            .unwrap_or_default()
    });
    BLANK_RUN.replace_all(&restored, "\n\n").trim().to_string()
}

fn strip_inline(line: &str) -> String {
    INLINE_MARKERS
        .iter()
        .fold(line.to_string(), |acc, re| re.replace_all(&acc, "$1").into_owned())
}

fn table_cells(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    let is_row = trimmed.starts_with('|')
        || trimmed.ends_with('|')
        || trimmed.matches('|').count() >= 2;
    if !is_row {
        return None;
    }
    Some(
        trimmed
            .trim_matches('|')
            .split('|')
            .map(|cell| cell.trim().to_string())
            .collect(),
    )
}

/// Flatten lines, aligning each run of consecutive table rows.
fn render(lines: Vec<Line>) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    let mut table: Vec<Vec<String>> = Vec::new();
    for line in lines {
        match line {
            Line::Row(cells) => table.push(cells),
            Line::Text(text) => {
                out.extend(align_table(std::mem::take(&mut table)));
                out.push(text);
            }
        }
    }
    out.extend(align_table(table));
    out
}

fn align_table(rows: Vec<Vec<String>>) -> Vec<String> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();
    rows.into_iter()
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        })
        .collect()
}

fn render_code_block(block: &CodeBlock) -> String {
    let header = if block.lang.is_empty() {
        "[code block]".to_string()
    } else {
        format!("[code block {}]", block.lang)
    };
    let body = block
        .body
        .lines()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                format!("    {l}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{header}\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_headings_emphasis_and_links() {
        let md = "## Findings\n\nThe **budget** rose *sharply* per [the report](https://x.io/r).";
        assert_eq!(
            markdown_to_plain(md),
            "Findings\n\nThe budget rose sharply per the report (https://x.io/r)."
        );
    }

    #[test]
    fn renumbers_ordered_lists() {
        let md = "1. first\n1. second\n3. third";
        assert_eq!(markdown_to_plain(md), "1. first\n2. second\n3. third");
    }

    #[test]
    fn blank_lines_keep_numbering_other_lines_reset_it() {
        let md = "1. a\n\n5. b\nIntervening text.\n4. c";
        assert_eq!(markdown_to_plain(md), "1. a\n\n2. b\nIntervening text.\n1. c");
    }

    #[test]
    fn normalizes_bullets() {
        let md = "* one\n+ two\n  - three";
        assert_eq!(markdown_to_plain(md), "- one\n- two\n- three");
    }

    #[test]
    fn converts_tables() {
        let md = "| Name | Qty | Price |\n|------|:---:|-------|\n| Apple | 3 | 1.50 |\n| Kiwi | 12 | 0.25 |";
        assert_eq!(
            markdown_to_plain(md),
            "Name  | Qty | Price\nApple | 3   | 1.50\nKiwi  | 12  | 0.25"
        );
    }

    #[test]
    fn preserves_code_blocks() {
        let md = "Before.\n\n```rust\nfn main() {\n    let _x = **y**;\n}\n```\n\nAfter.";
        assert_eq!(
            markdown_to_plain(md),
            "Before.\n\n[code block rust]\n    fn main() {\n        let _x = **y**;\n    }\n\nAfter."
        );
        let bare = markdown_to_plain("```\nplain\n```");
        assert_eq!(bare, "[code block]\n    plain");
    }

    #[test]
    fn collapses_blank_runs_and_strips_html() {
        let md = "One <b>bold</b>.\n\n\n\n\nTwo > three.";
        assert_eq!(markdown_to_plain(md), "One bold.\n\nTwo > three.");
    }

    #[test]
    fn keeps_snake_case_and_quotes() {
        let md = "> Use snake_case_names and ~~old~~ `new_api`.";
        assert_eq!(markdown_to_plain(md), "Use snake_case_names and old new_api.");
    }
}
