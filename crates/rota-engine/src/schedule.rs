//! Schedule input: raw request payloads and their validated, strongly-typed form.
//!
//! Callers hand in loosely-typed JSON ([`ScheduleRequest`] / [`RawScheduleEntry`]).
//! [`ScheduleRequest::validate`] turns that into a [`ValidatedRequest`] or fails
//! with `MISSING_FIELDS`, `INVALID_DAY`, `INVALID_TIME`, `INVALID_DATE` or
//! `INVALID_RECURRENCE`, all before any storage is touched.
//! [`ScheduleRequest::validate_with`] also enforces the configured limit on how
//! many days one entry may span.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{Result, ScheduleError};
use crate::expander::bounded_entry_window;
use crate::interval::TimeRange;

/// Recurrence used when an entry omits `repeat_every_n_weeks`: every week.
///
/// An absent value never means "single occurrence". A one-off slot is expressed
/// with `end_date` inside the first week instead.
pub const DEFAULT_REPEAT_WEEKS: u32 = 1;

/// The seven days of the week. Stored and serialized as lowercase English names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }

    /// Two-letter RFC 5545 `BYDAY` code.
    pub fn rrule_code(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MO",
            DayOfWeek::Tuesday => "TU",
            DayOfWeek::Wednesday => "WE",
            DayOfWeek::Thursday => "TH",
            DayOfWeek::Friday => "FR",
            DayOfWeek::Saturday => "SA",
            DayOfWeek::Sunday => "SU",
        }
    }

    pub fn weekday(self) -> Weekday {
        match self {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = ScheduleError;

    /// Accepts full English names and three-letter abbreviations, any case.
    fn from_str(s: &str) -> Result<Self> {
        let day = match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => DayOfWeek::Monday,
            "tuesday" | "tue" => DayOfWeek::Tuesday,
            "wednesday" | "wed" => DayOfWeek::Wednesday,
            "thursday" | "thu" => DayOfWeek::Thursday,
            "friday" | "fri" => DayOfWeek::Friday,
            "saturday" | "sat" => DayOfWeek::Saturday,
            "sunday" | "sun" => DayOfWeek::Sunday,
            _ => return Err(ScheduleError::InvalidDay(s.to_string())),
        };
        Ok(day)
    }
}

/// One schedule entry as received from a caller, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScheduleEntry {
    pub day_of_week: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub repeat_every_n_weeks: Option<i64>,
}

/// Payload of both the check and the apply operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub business_id: Option<i64>,
    pub staff_id: Option<i64>,
    #[serde(default)]
    pub schedule: Vec<RawScheduleEntry>,
}

/// A validated recurring availability block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub day_of_week: DayOfWeek,
    pub time: TimeRange,
    pub start_date: NaiveDate,
    /// Inclusive upper bound. `None` means the configured default horizon.
    pub end_date: Option<NaiveDate>,
    /// Always resolved; an omitted input becomes [`DEFAULT_REPEAT_WEEKS`].
    pub repeat_every_n_weeks: NonZeroU32,
}

/// A request whose identifiers are present and whose entries all validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub business_id: i64,
    pub staff_id: i64,
    pub entries: Vec<ScheduleEntry>,
}

impl ScheduleRequest {
    /// Structural validation. Fails on the first problem found, in entry order.
    pub fn validate(&self) -> Result<ValidatedRequest> {
        let business_id = self
            .business_id
            .ok_or_else(|| ScheduleError::MissingFields("business_id".to_string()))?;
        let staff_id = self
            .staff_id
            .ok_or_else(|| ScheduleError::MissingFields("staff_id".to_string()))?;
        if self.schedule.is_empty() {
            return Err(ScheduleError::MissingFields("schedule".to_string()));
        }

        let entries = self
            .schedule
            .iter()
            .enumerate()
            .map(|(index, raw)| ScheduleEntry::from_raw(index, raw))
            .collect::<Result<Vec<_>>>()?;

        Ok(ValidatedRequest {
            business_id,
            staff_id,
            entries,
        })
    }

    /// [`validate`](Self::validate), then reject any entry whose resolved date
    /// range is longer than `config.max_window_days` with `INVALID_DATE`.
    pub fn validate_with(&self, config: &EngineConfig) -> Result<ValidatedRequest> {
        let request = self.validate()?;
        for (index, entry) in request.entries.iter().enumerate() {
            bounded_entry_window(entry, config).map_err(|err| match err {
                ScheduleError::InvalidDate(msg) => {
                    ScheduleError::InvalidDate(format!("schedule[{}]: {}", index, msg))
                }
                other => other,
            })?;
        }
        Ok(request)
    }
}

impl ScheduleEntry {
    /// Build an entry from typed parts, checking the time range, the date range
    /// and the recurrence interval.
    pub fn new(
        day_of_week: DayOfWeek,
        start_time: NaiveTime,
        end_time: NaiveTime,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        repeat_every_n_weeks: Option<u32>,
    ) -> Result<Self> {
        let time = TimeRange::new(start_time, end_time)?;

        if let Some(end) = end_date {
            if end < start_date {
                return Err(ScheduleError::InvalidDate(format!(
                    "end_date {} is before start_date {}",
                    end, start_date
                )));
            }
        }

        let weeks = repeat_every_n_weeks.unwrap_or(DEFAULT_REPEAT_WEEKS);
        let repeat_every_n_weeks = NonZeroU32::new(weeks).ok_or_else(|| {
            ScheduleError::InvalidRecurrence("repeat_every_n_weeks must be at least 1".to_string())
        })?;

        Ok(Self {
            day_of_week,
            time,
            start_date,
            end_date,
            repeat_every_n_weeks,
        })
    }

    /// Validate one raw entry. `index` only feeds error messages.
    pub fn from_raw(index: usize, raw: &RawScheduleEntry) -> Result<Self> {
        let day = required(index, "day_of_week", &raw.day_of_week)?;
        let start_time = required(index, "start_time", &raw.start_time)?;
        let end_time = required(index, "end_time", &raw.end_time)?;
        let start_date = required(index, "start_date", &raw.start_date)?;

        let day_of_week: DayOfWeek = day.parse()?;
        let start_time = parse_time(start_time)?;
        let end_time = parse_time(end_time)?;
        let start_date = parse_date(start_date)?;
        let end_date = raw.end_date.as_deref().map(parse_date).transpose()?;

        let repeat = match raw.repeat_every_n_weeks {
            None => None,
            Some(n) if (1..=u32::MAX as i64).contains(&n) => Some(n as u32),
            Some(n) => {
                return Err(ScheduleError::InvalidRecurrence(format!(
                    "schedule[{}]: repeat_every_n_weeks must be a positive integer, got {}",
                    index, n
                )))
            }
        };

        Self::new(day_of_week, start_time, end_time, start_date, end_date, repeat)
    }

    /// RFC 5545 rule text for this entry, without DTSTART or UNTIL.
    pub fn to_rrule(&self) -> String {
        format!(
            "FREQ=WEEKLY;INTERVAL={};BYDAY={};WKST=MO",
            self.repeat_every_n_weeks,
            self.day_of_week.rrule_code()
        )
    }
}

fn required<'a>(index: usize, field: &str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ScheduleError::MissingFields(format!(
            "schedule[{}].{}",
            index, field
        ))),
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| ScheduleError::InvalidTime(format!("unrecognized time of day: {}", s)))
}

/// Parse an ISO `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(format!("unrecognized date: {}", s)))
}
