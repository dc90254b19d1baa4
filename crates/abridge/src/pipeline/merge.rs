//! Deterministic reassembly of partial summaries.

use super::fanout::PartialSummary;
use serde::Serialize;

/// Index-ordered concatenation of partial summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedDraft {
    pub text: String,
    pub total_words: usize,
    pub partial_count: usize,
    pub original_words: Option<usize>,
    /// `total_words / original_words`, when the original length is known.
    pub combined_ratio: Option<f64>,
}

/// Merge partial summaries in chunk-index order, each under its own
/// "Summary of Chunk N" heading (N is 1-based).
///
/// The output depends only on the set of partials, never on their arrival
/// order. An empty set yields an empty draft.
pub fn merge_partials(partials: &[PartialSummary], original_words: Option<usize>) -> MergedDraft {
    let mut ordered: Vec<&PartialSummary> = partials.iter().collect();
    ordered.sort_by_key(|p| p.index);

    let mut lines = Vec::with_capacity(ordered.len() * 3);
    for partial in &ordered {
        lines.push(format!("## Summary of Chunk {}", partial.index + 1));
        lines.push(partial.text.trim().to_string());
        lines.push(String::new());
    }
    let text = lines.join("\n").trim_end().to_string();

    let total_words: usize = ordered.iter().map(|p| p.word_count).sum();
    let combined_ratio = original_words.map(|orig| {
        if orig > 0 {
            total_words as f64 / orig as f64
        } else {
            0.0
        }
    });

    MergedDraft {
        text,
        total_words,
        partial_count: ordered.len(),
        original_words,
        combined_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(index: usize, text: &str) -> PartialSummary {
        PartialSummary {
            chunk_id: format!("c{index}"),
            index,
            text: text.to_string(),
            word_count: text.split_whitespace().count(),
            compression_ratio: 0.2,
        }
    }

    #[test]
    fn empty_input_gives_empty_draft() {
        let draft = merge_partials(&[], Some(100));
        assert_eq!(draft.text, "");
        assert_eq!(draft.total_words, 0);
        assert_eq!(draft.partial_count, 0);
        assert_eq!(draft.combined_ratio, Some(0.0));
        assert_eq!(merge_partials(&[], None).combined_ratio, None);
    }

    #[test]
    fn sections_are_ordered_by_index() {
        let draft = merge_partials(
            &[partial(1, "Second part."), partial(0, "First part here.")],
            Some(50),
        );
        assert_eq!(
            draft.text,
            "## Summary of Chunk 1\nFirst part here.\n\n## Summary of Chunk 2\nSecond part."
        );
        assert_eq!(draft.total_words, 5);
        assert_eq!(draft.partial_count, 2);
        assert_eq!(draft.combined_ratio, Some(0.1));
    }

    #[test]
    fn merge_is_order_independent() {
        let parts = vec![
            partial(0, "Alpha beta."),
            partial(1, "Gamma delta epsilon."),
            partial(2, "Zeta."),
            partial(3, "Eta theta iota kappa."),
        ];
        let expected = merge_partials(&parts, Some(1000));
        let permutations: [[usize; 4]; 4] = [[3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1], [0, 2, 1, 3]];
        for order in permutations {
            let shuffled: Vec<PartialSummary> = order.iter().map(|&i| parts[i].clone()).collect();
            let draft = merge_partials(&shuffled, Some(1000));
            assert_eq!(draft.text, expected.text);
            assert_eq!(draft.total_words, expected.total_words);
        }
    }
}
