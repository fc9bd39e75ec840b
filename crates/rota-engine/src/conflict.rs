//! Conflict detection for a candidate schedule.
//!
//! Three independent checks, all run on every call so one report is complete:
//!
//! 1. **Self-overlap**: two entries on the same weekday whose time ranges
//!    overlap.
//! 2. **Rota conflict**: a manually placed rota entry on a date where a
//!    candidate entry is active, with overlapping times. Confirmed bookings
//!    inside that rota slot are attached for context.
//! 3. **Booking conflict**: a confirmed booking in the schedule window that no
//!    candidate working block on its date covers.
//!
//! The report is `self_overlap ++ rota_conflict ++ booking_conflict`. Detection
//! is a pure function of its inputs.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::debug;

use crate::coverage;
use crate::expander::{is_active, schedule_window};
use crate::interval::TimeRange;
use crate::schedule::{DayOfWeek, ScheduleEntry};
use crate::store::{Booking, BookingStatus, RotaEntry};

/// Points back at an entry of the submitted schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRef {
    /// Position in the submitted schedule.
    pub index: usize,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl EntryRef {
    fn new(index: usize, entry: &ScheduleEntry) -> Self {
        Self {
            index,
            day_of_week: entry.day_of_week,
            start_time: entry.time.start(),
            end_time: entry.time.end(),
        }
    }
}

/// The parts of a booking a caller needs to render a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingSummary {
    pub booking_id: i64,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub service_name: Option<String>,
    pub customer_name: Option<String>,
}

impl From<&Booking> for BookingSummary {
    fn from(b: &Booking) -> Self {
        Self {
            booking_id: b.id,
            booking_date: b.booking_date,
            start_time: b.start_time,
            end_time: b.end_time,
            service_name: b.service_name.clone(),
            customer_name: b.customer_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConflictRecord {
    SelfOverlap {
        day_of_week: DayOfWeek,
        first: EntryRef,
        second: EntryRef,
    },
    RotaConflict {
        rota_entry_id: i64,
        business_id: i64,
        rota_date: NaiveDate,
        rota_start_time: NaiveTime,
        rota_end_time: NaiveTime,
        entry: EntryRef,
        bookings: Vec<BookingSummary>,
    },
    BookingConflict {
        booking: BookingSummary,
    },
}

impl ConflictRecord {
    /// The wire tag: `self_overlap`, `rota_conflict` or `booking_conflict`.
    pub fn kind(&self) -> &'static str {
        match self {
            ConflictRecord::SelfOverlap { .. } => "self_overlap",
            ConflictRecord::RotaConflict { .. } => "rota_conflict",
            ConflictRecord::BookingConflict { .. } => "booking_conflict",
        }
    }
}

/// Result of the check operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictRecord>,
}

impl ConflictReport {
    pub fn new(conflicts: Vec<ConflictRecord>) -> Self {
        Self {
            has_conflicts: !conflicts.is_empty(),
            conflicts,
        }
    }
}

/// Run all three checks and concatenate their results.
pub fn detect_conflicts(
    entries: &[ScheduleEntry],
    rota: &[RotaEntry],
    bookings: &[Booking],
    default_horizon_days: u32,
) -> ConflictReport {
    let mut conflicts = find_self_overlaps(entries);
    conflicts.extend(find_rota_conflicts(entries, rota, bookings, default_horizon_days));
    conflicts.extend(find_booking_conflicts(entries, bookings, default_horizon_days));
    debug!(
        "Conflict detection over {} entries produced {} records",
        entries.len(),
        conflicts.len()
    );
    ConflictReport::new(conflicts)
}

/// Every overlapping pair of entries sharing a weekday, Monday first, then in
/// submission order.
pub fn find_self_overlaps(entries: &[ScheduleEntry]) -> Vec<ConflictRecord> {
    let mut by_day: BTreeMap<DayOfWeek, Vec<(usize, &ScheduleEntry)>> = BTreeMap::new();
    for (index, entry) in entries.iter().enumerate() {
        by_day.entry(entry.day_of_week).or_default().push((index, entry));
    }

    let mut conflicts = Vec::new();
    for (day, group) in &by_day {
        for (i, (index_a, a)) in group.iter().enumerate() {
            for (index_b, b) in &group[i + 1..] {
                if a.time.overlaps(&b.time) {
                    conflicts.push(ConflictRecord::SelfOverlap {
                        day_of_week: *day,
                        first: EntryRef::new(*index_a, a),
                        second: EntryRef::new(*index_b, b),
                    });
                }
            }
        }
    }
    conflicts
}

/// Manual rota entries that collide with a candidate entry active on the same
/// date. One record per (rota entry, candidate entry) pair.
///
/// Generated rota entries are ignored: applying a schedule replaces them.
pub fn find_rota_conflicts(
    entries: &[ScheduleEntry],
    rota: &[RotaEntry],
    bookings: &[Booking],
    default_horizon_days: u32,
) -> Vec<ConflictRecord> {
    let mut conflicts = Vec::new();
    for slot in rota.iter().filter(|r| !r.is_generated) {
        let Some(slot_range) = slot.time_range() else {
            debug!("Skipping rota entry {} with an empty time range", slot.id);
            continue;
        };

        for (index, entry) in entries.iter().enumerate() {
            if !is_active(entry, slot.rota_date, default_horizon_days)
                || !entry.time.overlaps(&slot_range)
            {
                continue;
            }
            conflicts.push(ConflictRecord::RotaConflict {
                rota_entry_id: slot.id,
                business_id: slot.business_id,
                rota_date: slot.rota_date,
                rota_start_time: slot.start_time,
                rota_end_time: slot.end_time,
                entry: EntryRef::new(index, entry),
                bookings: bookings_within(bookings, slot.rota_date, &slot_range),
            });
        }
    }
    conflicts
}

/// Confirmed bookings inside the schedule window that would fall outside every
/// proposed working block on their date.
pub fn find_booking_conflicts(
    entries: &[ScheduleEntry],
    bookings: &[Booking],
    default_horizon_days: u32,
) -> Vec<ConflictRecord> {
    let Some(window) = schedule_window(entries, default_horizon_days) else {
        return Vec::new();
    };

    bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed && window.contains(b.booking_date))
        .filter(|b| {
            let Some(booked) = b.time_range() else {
                return false;
            };
            let working: Vec<TimeRange> = entries
                .iter()
                .filter(|e| is_active(e, b.booking_date, default_horizon_days))
                .map(|e| e.time)
                .collect();
            !coverage::is_covered(&working, &booked)
        })
        .map(|b| ConflictRecord::BookingConflict {
            booking: BookingSummary::from(b),
        })
        .collect()
}

fn bookings_within(bookings: &[Booking], date: NaiveDate, range: &TimeRange) -> Vec<BookingSummary> {
    bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed && b.booking_date == date)
        .filter(|b| b.time_range().is_some_and(|t| t.overlaps(range)))
        .map(BookingSummary::from)
        .collect()
}
