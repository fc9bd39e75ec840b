//! Recurrence expansion -- decides on which calendar dates a [`ScheduleEntry`]
//! is active, and turns stored rule text into those dates.
//!
//! An entry is active on every date that
//! - falls inside the resolved window (`start_date ..= end_date`, or
//!   `start_date + default_horizon_days` when `end_date` is absent),
//! - has the entry's weekday, and
//! - lies in a week whose offset from the week containing `start_date` is a
//!   multiple of `repeat_every_n_weeks`.
//!
//! Weeks start on Monday, matching RFC 5545 `FREQ=WEEKLY;WKST=MO`.
//! [`is_active`] answers that question for one date in constant time and is what
//! conflict detection uses. Materializing every date goes through the `rrule`
//! crate ([`expand_rule`]), which is what rota generation uses.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rrule::RRuleSet;
use serde::Serialize;
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::{Result, ScheduleError};
use crate::schedule::ScheduleEntry;

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Returns `None` when `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Smallest window containing both.
    pub fn union(&self, other: &DateWindow) -> DateWindow {
        DateWindow {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Number of days from `start` to `end`; zero for a single-day window.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// The window an entry covers on its own: its explicit `end_date`, or the
/// default horizon counted from `start_date`.
pub fn entry_window(entry: &ScheduleEntry, default_horizon_days: u32) -> DateWindow {
    let end = entry.end_date.unwrap_or_else(|| {
        entry
            .start_date
            .checked_add_days(Days::new(u64::from(default_horizon_days)))
            .unwrap_or(NaiveDate::MAX)
    });
    DateWindow {
        start: entry.start_date,
        end,
    }
}

/// [`entry_window`], rejecting windows wider than `config.max_window_days`
/// with `INVALID_DATE`.
pub fn bounded_entry_window(entry: &ScheduleEntry, config: &EngineConfig) -> Result<DateWindow> {
    let window = entry_window(entry, config.default_horizon_days);
    if window.span_days() > i64::from(config.max_window_days) {
        return Err(ScheduleError::InvalidDate(format!(
            "date range {} to {} spans {} days, the limit is {}",
            window.start,
            window.end,
            window.span_days(),
            config.max_window_days
        )));
    }
    Ok(window)
}

/// The overall window of a schedule: earliest start to latest resolved end.
/// `None` for an empty schedule.
pub fn schedule_window(entries: &[ScheduleEntry], default_horizon_days: u32) -> Option<DateWindow> {
    entries
        .iter()
        .map(|e| entry_window(e, default_horizon_days))
        .reduce(|acc, w| acc.union(&w))
}

/// Whether `entry` is active on `date`.
pub fn is_active(entry: &ScheduleEntry, date: NaiveDate, default_horizon_days: u32) -> bool {
    if !entry_window(entry, default_horizon_days).contains(date) {
        return false;
    }
    if date.weekday() != entry.day_of_week.weekday() {
        return false;
    }
    let weeks = (week_start(date) - week_start(entry.start_date)).num_days() / 7;
    weeks % i64::from(entry.repeat_every_n_weeks.get()) == 0
}

/// Expand RFC 5545 weekly rule text (no DTSTART or UNTIL) over `window`.
///
/// DTSTART is pinned to `window.start`, which also anchors the interval count
/// on that date's `WKST=MO` week. When DTSTART is not itself an instance of the
/// rule it is dropped, so only dates on `weekday` are returned.
pub fn expand_rule(rule: &str, weekday: Weekday, window: DateWindow) -> Result<Vec<NaiveDate>> {
    if rule.is_empty() {
        return Err(ScheduleError::InvalidRecurrence("empty rule text".to_string()));
    }

    let text = format!(
        "DTSTART;TZID=UTC:{}T000000\nRRULE:{};UNTIL={}T235959Z",
        window.start.format("%Y%m%d"),
        rule,
        window.end.format("%Y%m%d"),
    );
    let set: RRuleSet = text
        .parse()
        .map_err(|e| ScheduleError::InvalidRecurrence(format!("{}: {}", rule, e)))?;

    // At most one instance per week, plus the unsynchronized DTSTART.
    let limit = u16::try_from(window.span_days() / 7 + 3).unwrap_or(u16::MAX);
    let result = set.all(limit);
    if result.limited {
        warn!(
            rule,
            start = %window.start,
            end = %window.end,
            "Rule expansion stopped at {} instances",
            limit
        );
    }

    Ok(result
        .dates
        .iter()
        .map(|dt| dt.date_naive())
        .filter(|date| date.weekday() == weekday && window.contains(*date))
        .collect())
}

/// Active dates of `entry` over its own window, ascending.
pub fn entry_occurrences(entry: &ScheduleEntry, default_horizon_days: u32) -> Result<Vec<NaiveDate>> {
    expand_rule(
        &entry.to_rrule(),
        entry.day_of_week.weekday(),
        entry_window(entry, default_horizon_days),
    )
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(NaiveDate::MIN)
}
