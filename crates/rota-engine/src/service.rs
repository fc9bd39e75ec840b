//! The two caller-facing operations, CheckConflicts and ApplySchedule.
//!
//! Order of work on both paths: structural validation (no store access), then
//! authorization through the injected [`AccessDirectory`], then storage. Store
//! failures are logged with their cause and surfaced as `SERVER_ERROR`.

use serde::Serialize;
use tracing::error;

use crate::access::AccessDirectory;
use crate::applier::{self, ApplyOutcome};
use crate::config::EngineConfig;
use crate::conflict::{detect_conflicts, ConflictRecord, ConflictReport};
use crate::error::{ResponseCode, Result, ScheduleError};
use crate::expander::schedule_window;
use crate::schedule::{ScheduleRequest, ValidatedRequest};
use crate::store::{queries, Database};

pub struct ScheduleService<'a> {
    db: &'a Database,
    access: &'a dyn AccessDirectory,
    config: EngineConfig,
}

impl<'a> ScheduleService<'a> {
    pub fn new(db: &'a Database, access: &'a dyn AccessDirectory, config: EngineConfig) -> Self {
        Self { db, access, config }
    }

    /// Use the store's own business and staff tables for authorization.
    pub fn with_store(db: &'a Database, config: EngineConfig) -> Self {
        Self::new(db, db, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Report every conflict of the proposed schedule. Never writes.
    ///
    /// The rota and booking reads share one read transaction, so the report is a
    /// consistent snapshot. It is not a guarantee against a later apply racing it.
    pub fn check_conflicts(&self, actor_id: i64, request: &ScheduleRequest) -> Result<ConflictReport> {
        let request = request.validate_with(&self.config)?;
        self.authorize(actor_id, &request)?;
        logged("check_conflicts", self.load_and_detect(&request))
    }

    /// Validate, then atomically replace the staff member's applied schedule.
    pub fn apply_schedule(&self, actor_id: i64, request: &ScheduleRequest) -> Result<ApplyOutcome> {
        let request = request.validate_with(&self.config)?;
        self.authorize(actor_id, &request)?;
        logged(
            "apply_schedule",
            applier::apply_schedule(self.db, &request, &self.config),
        )
    }

    fn load_and_detect(&self, request: &ValidatedRequest) -> Result<ConflictReport> {
        let horizon = self.config.default_horizon_days;
        let Some(window) = schedule_window(&request.entries, horizon) else {
            return Ok(ConflictReport::new(Vec::new()));
        };

        let tx = self.db.begin_read()?;
        let rota = queries::manual_rota_entries(&tx, request.staff_id, window)?;
        let bookings = queries::confirmed_bookings(&tx, request.staff_id, window)?;
        tx.commit()?;

        Ok(detect_conflicts(&request.entries, &rota, &bookings, horizon))
    }

    fn authorize(&self, actor_id: i64, request: &ValidatedRequest) -> Result<()> {
        let business_id = request.business_id;
        if !logged(
            "is_business_owner",
            self.access.is_business_owner(actor_id, business_id),
        )? {
            return Err(ScheduleError::Unauthorized {
                actor_id,
                business_id,
            });
        }
        if !logged(
            "is_staff_of_business",
            self.access.is_staff_of_business(request.staff_id, business_id),
        )? {
            return Err(ScheduleError::InvalidStaff {
                staff_id: request.staff_id,
                business_id,
            });
        }
        Ok(())
    }
}

/// Log the cause of a store failure for operators before it becomes a
/// generic `SERVER_ERROR`.
fn logged<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(ScheduleError::Storage(cause)) = &result {
        error!(operation, error = %cause, "Store failure");
    }
    result
}

// ── Response envelopes ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    pub status: ResponseCode,
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictRecord>,
}

impl From<ConflictReport> for CheckResponse {
    fn from(report: ConflictReport) -> Self {
        Self {
            status: ResponseCode::Success,
            has_conflicts: report.has_conflicts,
            conflicts: report.conflicts,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyResponse {
    pub status: ResponseCode,
    pub committed: bool,
}

impl From<ApplyOutcome> for ApplyResponse {
    fn from(outcome: ApplyOutcome) -> Self {
        Self {
            status: ResponseCode::Success,
            committed: outcome.committed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: ResponseCode,
    pub message: String,
}

impl From<&ScheduleError> for ErrorResponse {
    fn from(err: &ScheduleError) -> Self {
        Self {
            status: err.code(),
            message: err.public_message(),
        }
    }
}
