//! # rota-engine
//!
//! Conflict detection and transactional application of recurring staff
//! availability schedules for a service-booking platform.
//!
//! Given a proposed weekly schedule for a staff member, the engine reports
//! whether it collides with itself, with manually placed rota entries, or with
//! confirmed bookings, and if asked, replaces the staff member's applied
//! schedule in one all-or-nothing transaction.
//!
//! ## Modules
//!
//! - [`interval`]: half-open time-of-day ranges and the overlap predicate
//! - [`schedule`]: raw request payloads, validation, the weekday enum
//! - [`expander`]: active-date test and RFC 5545 rule expansion
//! - [`coverage`]: merge working blocks, test booking containment
//! - [`conflict`]: self-overlap, rota and booking conflict checks
//! - [`applier`]: validated, transactional schedule replacement
//! - [`generator`]: stored rules → generated rota rows
//! - [`service`]: CheckConflicts / ApplySchedule with authorization
//! - [`access`]: owner and staff-membership lookups
//! - [`store`]: SQLite persistence
//! - [`config`]: engine settings
//! - [`error`]: error types and response codes

pub mod access;
pub mod applier;
pub mod config;
pub mod conflict;
pub mod coverage;
pub mod error;
pub mod expander;
pub mod generator;
pub mod interval;
pub mod schedule;
pub mod service;
pub mod store;

pub use access::AccessDirectory;
pub use applier::ApplyOutcome;
pub use config::{ApplyStrictness, EngineConfig};
pub use conflict::{detect_conflicts, ConflictRecord, ConflictReport};
pub use error::{ResponseCode, ScheduleError};
pub use expander::{entry_occurrences, expand_rule, is_active, DateWindow};
pub use generator::generate_rota;
pub use interval::{overlaps, TimeRange};
pub use schedule::{DayOfWeek, RawScheduleEntry, ScheduleEntry, ScheduleRequest};
pub use service::ScheduleService;
pub use store::Database;
