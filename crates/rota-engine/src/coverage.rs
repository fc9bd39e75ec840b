//! Working-hours coverage on a single date.
//!
//! Sorts the candidate intervals of a date by start time, merges overlapping or
//! touching ranges into contiguous working blocks, then answers whether a
//! booking lies entirely inside one of those blocks.

use chrono::NaiveTime;

use crate::interval::TimeRange;

/// Merge overlapping or adjacent ranges.
///
/// Returns a sorted, non-overlapping list of `(start, end)` blocks.
pub fn merge_ranges(ranges: &[TimeRange]) -> Vec<(NaiveTime, NaiveTime)> {
    let mut intervals: Vec<(NaiveTime, NaiveTime)> =
        ranges.iter().map(|r| (r.start(), r.end())).collect();

    if intervals.is_empty() {
        return Vec::new();
    }

    intervals.sort();

    let mut merged: Vec<(NaiveTime, NaiveTime)> = Vec::new();
    for (start, end) in intervals {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                // Overlapping or back-to-back: one continuous block.
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}

/// True when `target` fits inside a single merged block of `ranges`.
pub fn is_covered(ranges: &[TimeRange], target: &TimeRange) -> bool {
    merge_ranges(ranges)
        .into_iter()
        .filter_map(|(start, end)| TimeRange::new(start, end).ok())
        .any(|block| block.contains(target))
}
