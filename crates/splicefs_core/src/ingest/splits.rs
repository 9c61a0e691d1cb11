//! Split offset parsing and segment planning.

use crate::error::{CoreError, CoreResult};
use serde::Deserialize;
use std::ops::Range;

/// A line-delimited split record; only `offset` is read.
#[derive(Debug, Deserialize)]
struct OffsetRecord {
    offset: u64,
}

/// Parses split offsets from text.
///
/// Accepted forms, tried in order:
///
/// 1. a JSON array of integers: `[10, 20, 50]`
/// 2. one record per line, either a JSON object with an `offset` field or
///    any text followed by ` {` and such an object (CDXJ style)
/// 3. a single line of comma-separated integers: `10,20,50`
///
/// Offsets are returned in input order, unsorted.
///
/// # Errors
///
/// Returns [`CoreError::UnparsableSplits`] if no form matches.
pub fn parse_split_points(text: &str) -> CoreResult<Vec<u64>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::unparsable_splits("no split offsets given"));
    }

    if let Ok(offsets) = serde_json::from_str::<Vec<u64>>(trimmed) {
        return Ok(offsets);
    }
    if let Some(offsets) = parse_records(trimmed) {
        return Ok(offsets);
    }
    if let Some(offsets) = parse_csv(trimmed) {
        return Ok(offsets);
    }

    let first = trimmed.lines().next().unwrap_or_default();
    Err(CoreError::unparsable_splits(format!(
        "unrecognised format starting with {:?}",
        first.chars().take(40).collect::<String>()
    )))
}

fn parse_records(text: &str) -> Option<Vec<u64>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_record)
        .collect()
}

fn parse_record(line: &str) -> Option<u64> {
    if let Ok(record) = serde_json::from_str::<OffsetRecord>(line) {
        return Some(record.offset);
    }
    let start = line.find(" {")?;
    serde_json::from_str::<OffsetRecord>(&line[start + 1..])
        .ok()
        .map(|r| r.offset)
}

fn parse_csv(text: &str) -> Option<Vec<u64>> {
    if text.lines().count() != 1 {
        return None;
    }
    text.split(',').map(|v| v.trim().parse().ok()).collect()
}

/// A half-open byte range of the ingestion source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// First byte.
    pub start: u64,
    /// One past the last byte.
    pub end: u64,
}

impl Segment {
    /// Segment length in bytes.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Returns whether the segment holds no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The segment as a range.
    #[must_use]
    pub const fn range(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Turns raw split offsets into consecutive segments covering `[0, total)`.
///
/// An offset of `0` means "the end of the source". Offsets are sorted and
/// the source length closes the last segment. A zero-length source yields
/// one empty segment.
///
/// # Errors
///
/// Returns [`CoreError::SplitOutOfRange`] for an offset past `total` and
/// [`CoreError::EmptySegment`] when a repeated offset would leave an empty
/// segment before the end.
pub fn plan_segments(total: u64, offsets: &[u64]) -> CoreResult<Vec<Segment>> {
    let mut bounds = Vec::with_capacity(offsets.len() + 1);
    for &offset in offsets {
        let offset = if offset == 0 { total } else { offset };
        if offset > total {
            return Err(CoreError::SplitOutOfRange { offset, total });
        }
        if offset < total {
            bounds.push(offset);
        }
    }
    bounds.sort_unstable();
    bounds.push(total);

    let mut segments = Vec::with_capacity(bounds.len());
    let mut start = 0;
    for end in bounds {
        if end == start && end != total {
            return Err(CoreError::EmptySegment { offset: start });
        }
        segments.push(Segment { start, end });
        start = end;
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(segments: &[Segment]) -> Vec<(u64, u64)> {
        segments.iter().map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn parse_json_array() {
        assert_eq!(parse_split_points("[10,20,50]").unwrap(), vec![10, 20, 50]);
        assert_eq!(parse_split_points(" [ 3 ]\n").unwrap(), vec![3]);
    }

    #[test]
    fn parse_line_records() {
        let text = "{\"offset\":10}\nprefix {\"offset\":20}\n";
        assert_eq!(parse_split_points(text).unwrap(), vec![10, 20]);
    }

    #[test]
    fn parse_cdxj_lines() {
        let text = "com,example)/ 20200101000000 {\"url\": \"http://example.com/\", \"offset\": 0, \"length\": 512}\n\
                    com,example)/page 20200101000001 {\"url\": \"http://example.com/page\", \"offset\": 512, \"length\": 300}\n\
                    \n";
        assert_eq!(parse_split_points(text).unwrap(), vec![0, 512]);
    }

    #[test]
    fn parse_comma_separated() {
        assert_eq!(parse_split_points("10,20,50").unwrap(), vec![10, 20, 50]);
        assert_eq!(parse_split_points("7").unwrap(), vec![7]);
        assert_eq!(parse_split_points("1, 2 ,3").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn reject_garbage() {
        for text in ["", "hello", "[1, -2]", "1,2\n3,4", "{\"length\": 3}", "1.5,2"] {
            assert!(
                matches!(
                    parse_split_points(text),
                    Err(CoreError::UnparsableSplits { .. })
                ),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn plan_appends_total() {
        let segments = plan_segments(100, &[40, 70]).unwrap();
        assert_eq!(spans(&segments), vec![(0, 40), (40, 70), (70, 100)]);
        assert_eq!(segments.iter().map(Segment::len).sum::<u64>(), 100);
    }

    #[test]
    fn plan_sorts_offsets() {
        let segments = plan_segments(100, &[70, 40]).unwrap();
        assert_eq!(spans(&segments), vec![(0, 40), (40, 70), (70, 100)]);
    }

    #[test]
    fn zero_and_total_mean_end() {
        let segments = plan_segments(100, &[0, 50, 100]).unwrap();
        assert_eq!(spans(&segments), vec![(0, 50), (50, 100)]);

        let segments = plan_segments(100, &[]).unwrap();
        assert_eq!(spans(&segments), vec![(0, 100)]);
    }

    #[test]
    fn out_of_range_offset() {
        assert!(matches!(
            plan_segments(100, &[101]),
            Err(CoreError::SplitOutOfRange {
                offset: 101,
                total: 100
            })
        ));
    }

    #[test]
    fn repeated_interior_offset_is_empty_segment() {
        assert!(matches!(
            plan_segments(100, &[40, 40]),
            Err(CoreError::EmptySegment { offset: 40 })
        ));
    }

    #[test]
    fn empty_source_has_one_empty_segment() {
        let segments = plan_segments(0, &[0]).unwrap();
        assert_eq!(spans(&segments), vec![(0, 0)]);
        assert!(segments[0].is_empty());
    }
}
