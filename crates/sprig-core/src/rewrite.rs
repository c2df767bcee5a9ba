//! Range-removal rewriter
//!
//! Deletes byte ranges from a source text. Ranges are sorted, overlapping and
//! adjacent ranges are merged, and the gaps between them are copied through.
//! Offsets are UTF-8 byte offsets, the unit tree-sitter reports.

use serde::{Deserialize, Serialize};

use crate::error::SprigError;

/// Half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        ByteRange { start, end }
    }
}

impl From<(usize, usize)> for ByteRange {
    fn from((start, end): (usize, usize)) -> Self {
        ByteRange { start, end }
    }
}

/// Output of a removal pass.
#[derive(Debug)]
pub struct Removal {
    pub text: String,
    /// Ranges that were skipped because they could not be applied safely.
    pub rejected: Vec<SprigError>,
}

/// Remove `ranges` from `source`.
///
/// Malformed ranges (reversed, out of bounds, or splitting a UTF-8 sequence)
/// are rejected one by one; the remaining ranges are still applied.
pub fn remove_ranges(source: &str, ranges: &[ByteRange]) -> Removal {
    let mut rejected = Vec::new();
    let mut valid: Vec<ByteRange> = Vec::with_capacity(ranges.len());

    for range in ranges {
        match validate(source, *range) {
            Ok(()) => valid.push(*range),
            Err(e) => {
                tracing::warn!("Skipping range removal: {}", e);
                rejected.push(e);
            }
        }
    }

    let merged = merge(valid);

    let mut text = String::with_capacity(source.len());
    let mut cursor = 0;
    for range in &merged {
        text.push_str(&source[cursor..range.start]);
        cursor = range.end;
    }
    text.push_str(&source[cursor..]);

    Removal { text, rejected }
}

/// Convenience wrapper returning only the rewritten text.
pub fn remove(source: &str, ranges: &[ByteRange]) -> String {
    remove_ranges(source, ranges).text
}

fn validate(source: &str, range: ByteRange) -> Result<(), SprigError> {
    let invalid = |reason| SprigError::InvalidRange {
        start: range.start,
        end: range.end,
        len: source.len(),
        reason,
    };

    if range.end < range.start {
        return Err(invalid("end precedes start"));
    }
    if range.end > source.len() {
        return Err(invalid("range exceeds text"));
    }
    if !source.is_char_boundary(range.start) || !source.is_char_boundary(range.end) {
        return Err(invalid("range splits a UTF-8 sequence"));
    }
    Ok(())
}

/// Sort by start and fold every range that starts at or before the running end.
fn merge(mut ranges: Vec<ByteRange>) -> Vec<ByteRange> {
    ranges.sort();

    let mut merged: Vec<ByteRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGITS: &str = "0123456789";

    fn ranges(pairs: &[(usize, usize)]) -> Vec<ByteRange> {
        pairs.iter().copied().map(ByteRange::from).collect()
    }

    #[test]
    fn test_no_ranges_returns_input() {
        assert_eq!(remove(DIGITS, &[]), DIGITS);
    }

    #[test]
    fn test_full_span_removes_everything() {
        assert_eq!(remove(DIGITS, &ranges(&[(0, 10)])), "");
    }

    #[test]
    fn test_inner_span() {
        assert_eq!(remove(DIGITS, &ranges(&[(1, 9)])), "09");
    }

    #[test]
    fn test_disjoint_ranges() {
        assert_eq!(remove(DIGITS, &ranges(&[(0, 1), (4, 6), (9, 10)])), "123678");
    }

    #[test]
    fn test_adjacent_ranges_merge() {
        assert_eq!(remove(DIGITS, &ranges(&[(0, 2), (2, 3)])), "3456789");
    }

    #[test]
    fn test_overlapping_ranges_merge() {
        assert_eq!(remove(DIGITS, &ranges(&[(0, 3), (2, 5)])), "56789");
    }

    #[test]
    fn test_contained_range_does_not_shrink_merge() {
        assert_eq!(remove(DIGITS, &ranges(&[(1, 8), (2, 4)])), "089");
    }

    #[test]
    fn test_input_order_is_irrelevant() {
        let shuffled = remove(DIGITS, &ranges(&[(8, 9), (2, 4), (6, 8)]));
        let sorted = remove(DIGITS, &ranges(&[(2, 4), (6, 8), (8, 9)]));
        assert_eq!(shuffled, "01459");
        assert_eq!(shuffled, sorted);
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(remove("", &ranges(&[(0, 0)])), "");
    }

    #[test]
    fn test_malformed_ranges_rejected_individually() {
        let out = remove_ranges(DIGITS, &ranges(&[(5, 3), (0, 2), (8, 42)]));
        assert_eq!(out.text, "23456789");
        assert_eq!(out.rejected.len(), 2);
        assert!(matches!(
            out.rejected[0],
            SprigError::InvalidRange { start: 5, end: 3, .. }
        ));
    }

    #[test]
    fn test_multibyte_boundaries_respected() {
        let source = "aé b";
        // 'é' occupies bytes 1..3
        let out = remove_ranges(source, &ranges(&[(2, 3), (1, 3)]));
        assert_eq!(out.text, "a b");
        assert_eq!(out.rejected.len(), 1);
    }
}
