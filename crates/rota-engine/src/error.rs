//! Error types for rota-engine operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::DayOfWeek;

/// Status codes surfaced to callers of the check and apply operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    Success,
    MissingFields,
    InvalidDay,
    InvalidTime,
    InvalidDate,
    InvalidRecurrence,
    ScheduleOverlap,
    ScheduleConflict,
    Unauthorized,
    InvalidStaff,
    ServerError,
}

impl ResponseCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseCode::Success => "SUCCESS",
            ResponseCode::MissingFields => "MISSING_FIELDS",
            ResponseCode::InvalidDay => "INVALID_DAY",
            ResponseCode::InvalidTime => "INVALID_TIME",
            ResponseCode::InvalidDate => "INVALID_DATE",
            ResponseCode::InvalidRecurrence => "INVALID_RECURRENCE",
            ResponseCode::ScheduleOverlap => "SCHEDULE_OVERLAP",
            ResponseCode::ScheduleConflict => "SCHEDULE_CONFLICT",
            ResponseCode::Unauthorized => "UNAUTHORIZED",
            ResponseCode::InvalidStaff => "INVALID_STAFF",
            ResponseCode::ServerError => "SERVER_ERROR",
        }
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    /// A required request or entry field was absent (or the schedule was empty).
    #[error("Missing required field: {0}")]
    MissingFields(String),

    #[error("Invalid day of week: {0}")]
    InvalidDay(String),

    /// Unparseable time of day, or `start_time >= end_time`.
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    /// Two entries of the candidate schedule overlap on the same weekday.
    #[error("Schedule has {count} overlapping entry pair(s), first on {day}")]
    ScheduleOverlap { day: DayOfWeek, count: usize },

    /// Strict apply found collisions with manual rota entries or bookings.
    #[error("Schedule conflicts with {0} existing calendar item(s)")]
    ScheduleConflict(usize),

    #[error("Actor {actor_id} does not own business {business_id}")]
    Unauthorized { actor_id: i64, business_id: i64 },

    #[error("Staff {staff_id} is not a member of business {business_id}")]
    InvalidStaff { staff_id: i64, business_id: i64 },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl ScheduleError {
    /// The string code reported to callers for this error.
    pub fn code(&self) -> ResponseCode {
        match self {
            ScheduleError::MissingFields(_) => ResponseCode::MissingFields,
            ScheduleError::InvalidDay(_) => ResponseCode::InvalidDay,
            ScheduleError::InvalidTime(_) => ResponseCode::InvalidTime,
            ScheduleError::InvalidDate(_) => ResponseCode::InvalidDate,
            ScheduleError::InvalidRecurrence(_) => ResponseCode::InvalidRecurrence,
            ScheduleError::ScheduleOverlap { .. } => ResponseCode::ScheduleOverlap,
            ScheduleError::ScheduleConflict(_) => ResponseCode::ScheduleConflict,
            ScheduleError::Unauthorized { .. } => ResponseCode::Unauthorized,
            ScheduleError::InvalidStaff { .. } => ResponseCode::InvalidStaff,
            ScheduleError::Storage(_) => ResponseCode::ServerError,
        }
    }

    /// Message safe to hand back to a caller. Storage detail never leaks.
    pub fn public_message(&self) -> String {
        match self {
            ScheduleError::Storage(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
