//! Deterministic word-window chunk planning.
//!
//! Spans are half-open word-index ranges `[start, end)` walked with a fixed
//! stride so consecutive spans overlap. A short final remainder is folded into
//! its predecessor instead of becoming a tiny chunk of its own.

use super::config::ChunkingConfig;
use crate::text::{estimate_tokens, split_words};
use serde::Serialize;

/// A contiguous, possibly overlapping slice of the source document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub id: String,
    pub index: usize,
    pub text: String,
    pub word_count: usize,
    pub token_estimate: usize,
}

/// Plan `[start, end)` word spans for a document of `total` words.
///
/// Guarantees: spans cover `[0, total)` without gaps, starts strictly
/// increase, no span is empty, and `total <= chunk_size` yields one span. Only
/// a tail-merged last span may exceed the nominal chunk size.
pub fn plan_spans(total: usize, config: &ChunkingConfig) -> Vec<(usize, usize)> {
    if total == 0 {
        return Vec::new();
    }
    let size = config.chunk_size.max(config.min_chunk_size);
    let overlap = (size as f64 * config.overlap).floor() as usize;
    let stride = size.saturating_sub(overlap).max(config.min_stride);

    let mut spans = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(total);
        spans.push((start, end));
        if end >= total {
            break;
        }
        start += stride;
    }

    let min_tail = (size as f64 * config.tail_merge_fraction).floor() as usize;
    if spans.len() > 1
        && let Some(&(tail_start, tail_end)) = spans.last()
        && tail_end - tail_start < min_tail
    {
        spans.pop();
        if let Some(prev) = spans.last_mut() {
            prev.1 = total;
        }
    }
    spans
}

/// Split `text` into chunks along the planned spans.
pub fn plan_chunks(text: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    let words = split_words(text);
    plan_spans(words.len(), config)
        .into_iter()
        .enumerate()
        .filter_map(|(index, (start, end))| {
            let slice = words.get(start..end)?;
            Some(Chunk {
                id: short_id(),
                index,
                text: slice.join(" "),
                word_count: slice.len(),
                token_estimate: estimate_tokens(slice.len()),
            })
        })
        .collect()
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string().chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ChunkingConfig {
        ChunkingConfig::default()
    }

    fn assert_covers(spans: &[(usize, usize)], total: usize) {
        assert_eq!(spans.first().map(|s| s.0), Some(0));
        assert_eq!(spans.last().map(|s| s.1), Some(total));
        for pair in spans.windows(2) {
            assert!(pair[1].0 > pair[0].0, "starts must increase");
            assert!(pair[1].0 <= pair[0].1, "gap between {pair:?}");
        }
        assert!(spans.iter().all(|(s, e)| e > s));
    }

    #[test]
    fn empty_document_has_no_spans() {
        assert!(plan_spans(0, &cfg()).is_empty());
    }

    #[test]
    fn short_document_is_one_span() {
        for total in [1, 10, 999, 1000] {
            assert_eq!(plan_spans(total, &cfg()), vec![(0, total)]);
        }
    }

    #[test]
    fn spans_cover_with_overlap() {
        let config = cfg();
        for total in (1..6000).step_by(37) {
            let spans = plan_spans(total, &config);
            assert_covers(&spans, total);
            let last = spans.len() - 1;
            for (i, (s, e)) in spans.iter().enumerate() {
                if i != last {
                    assert!(e - s <= config.chunk_size);
                }
            }
        }
    }

    #[test]
    fn stride_follows_overlap() {
        // 1000-word chunks, 120-word overlap, 880-word stride.
        let spans = plan_spans(3100, &cfg());
        assert_eq!(spans, vec![(0, 1000), (880, 1880), (1760, 2760), (2640, 3100)]);
    }

    #[test]
    fn short_tail_is_merged_into_predecessor() {
        // Naive walk: (0,1000), (880,1880), (1760,1900). The 140-word tail is
        // under 400 words and folds into the previous span.
        let spans = plan_spans(1900, &cfg());
        assert_eq!(spans, vec![(0, 1000), (880, 1900)]);
        assert_covers(&spans, 1900);
    }

    #[test]
    fn tail_merge_removes_exactly_one_chunk() {
        let config = cfg();
        let size = config.chunk_size;
        let stride = size - (size as f64 * config.overlap).floor() as usize;
        for total in (size + 1)..(4 * size) {
            let naive = 1 + (total - size).div_ceil(stride);
            let tail = total - (naive - 1) * stride;
            let merged = plan_spans(total, &config).len();
            if tail < (size as f64 * config.tail_merge_fraction) as usize {
                assert_eq!(merged, naive - 1, "total={total}");
            } else {
                assert_eq!(merged, naive, "total={total}");
            }
        }
    }

    #[test]
    fn tiny_chunk_size_is_raised_to_minimum() {
        let config = ChunkingConfig {
            chunk_size: 5,
            ..cfg()
        };
        let spans = plan_spans(120, &config);
        assert_eq!(spans[0], (0, 50));
        assert_covers(&spans, 120);
    }

    #[test]
    fn chunks_carry_text_and_estimates() {
        let text = (0..2500).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let chunks = plan_chunks(&text, &cfg());
        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.id.len(), 12);
            assert_eq!(chunk.word_count, chunk.text.split_whitespace().count());
            assert!(chunk.token_estimate >= chunk.word_count);
        }
        assert!(chunks[0].text.starts_with("w0 w1"));
        assert!(chunks[1].text.starts_with("w880 "));
        assert!(chunks[2].text.ends_with("w2499"));
    }
}
