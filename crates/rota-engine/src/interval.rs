//! Day-scoped, half-open time intervals.
//!
//! A [`TimeRange`] is `[start, end)` within a single day. Two ranges overlap iff
//! `a.start < b.end && b.start < a.end`, so ranges that merely touch
//! (`a.end == b.start`) do NOT overlap.

use chrono::NaiveTime;
use serde::Serialize;

use crate::error::{Result, ScheduleError};

/// A validated `[start, end)` time-of-day range with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    /// Build a range, rejecting empty or inverted ranges with `InvalidTime`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        validate(start, end)?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        overlaps(self, other)
    }

    /// True when `other` lies entirely inside this range (endpoints inclusive).
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Half-open overlap test. Symmetric; touching endpoints are not an overlap.
pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
    a.start < b.end && b.start < a.end
}

/// Fails with `InvalidTime` when `start >= end`.
pub fn validate(start: NaiveTime, end: NaiveTime) -> Result<()> {
    if start >= end {
        return Err(ScheduleError::InvalidTime(format!(
            "start_time {} must be before end_time {}",
            start.format("%H:%M"),
            end.format("%H:%M")
        )));
    }
    Ok(())
}
