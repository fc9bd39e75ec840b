use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

use crate::interval::TimeRange;
use crate::schedule::{DayOfWeek, ScheduleEntry};

/// One concrete calendar slot for a staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotaEntry {
    pub id: i64,
    pub staff_id: i64,
    pub business_id: i64,
    pub rota_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Derived from a schedule rule. Manual entries (`false`) are never
    /// replaced in bulk.
    pub is_generated: bool,
}

impl RotaEntry {
    /// `None` for a stored row with an empty or inverted range.
    pub fn time_range(&self) -> Option<TimeRange> {
        TimeRange::new(self.start_time, self.end_time).ok()
    }
}

/// Fields for inserting a rota row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewRotaEntry {
    pub staff_id: i64,
    pub business_id: i64,
    pub rota_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_generated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A customer booking, with the names used to enrich conflict reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub id: i64,
    pub staff_id: i64,
    pub business_id: i64,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub service_name: Option<String>,
    pub customer_name: Option<String>,
}

impl Booking {
    pub fn time_range(&self) -> Option<TimeRange> {
        TimeRange::new(self.start_time, self.end_time).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub staff_id: i64,
    pub business_id: i64,
    pub service_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
}

/// A persisted recurrence rule: one applied schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRule {
    pub id: i64,
    pub staff_id: i64,
    pub business_id: i64,
    /// Index of the entry in the schedule that was applied.
    pub position: usize,
    pub entry: ScheduleEntry,
    pub rrule: String,
}

impl ToSql for DayOfWeek {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for DayOfWeek {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for BookingStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BookingStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
