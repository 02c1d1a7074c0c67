//! Highlight range merging
//!
//! Keeps the stored highlight set minimal: sorted by start, no two ranges
//! overlapping or touching. `merge` is the single place this invariant is
//! produced; the record store runs it on every highlight addition.

use crate::models::Highlight;

/// Collapse an arbitrary collection of ranges into the minimal sorted set of
/// disjoint, non-adjacent ranges covering the same points.
///
/// Two ranges merge when the next one starts at or before the current one
/// ends, so `[1,5]` and `[5,8]` become `[1,8]`. Idempotent: merging an
/// already-merged set returns it unchanged.
pub fn merge(mut ranges: Vec<Highlight>) -> Vec<Highlight> {
    if ranges.is_empty() {
        return ranges;
    }

    ranges.sort_by_key(|r| r.start);

    let mut merged: Vec<Highlight> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(current) if range.start <= current.end => {
                current.end = current.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(start: i64, end: i64) -> Highlight {
        Highlight { start, end }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(merge(vec![]), vec![]);
    }

    #[test]
    fn single_range_passes_through() {
        assert_eq!(merge(vec![h(1, 5)]), vec![h(1, 5)]);
    }

    #[test]
    fn touching_ranges_merge() {
        assert_eq!(merge(vec![h(1, 5), h(5, 8)]), vec![h(1, 8)]);
    }

    #[test]
    fn unsorted_overlapping_input_merges() {
        assert_eq!(
            merge(vec![h(1, 3), h(10, 12), h(2, 5)]),
            vec![h(1, 5), h(10, 12)]
        );
    }

    #[test]
    fn contained_range_is_absorbed() {
        assert_eq!(merge(vec![h(1, 10), h(3, 4)]), vec![h(1, 10)]);
    }

    #[test]
    fn disjoint_ranges_stay_separate_and_sorted() {
        assert_eq!(
            merge(vec![h(20, 30), h(0, 5), h(10, 15)]),
            vec![h(0, 5), h(10, 15), h(20, 30)]
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let once = merge(vec![h(4, 9), h(1, 5), h(15, 20), h(9, 11)]);
        assert_eq!(merge(once.clone()), once);
    }

    #[test]
    fn output_is_pairwise_non_adjacent() {
        let merged = merge(vec![h(0, 2), h(2, 4), h(7, 9), h(12, 14), h(13, 18)]);
        for pair in merged.windows(2) {
            assert!(pair[1].start > pair[0].end);
        }
    }
}
