//! Transactional replacement of a staff member's applied schedule.
//!
//! Validation happens before the store is touched. Everything after that runs
//! inside one `BEGIN IMMEDIATE` transaction: remove the generated rota rows for
//! the (staff, business) pair, replace the stored schedule rules, commit. Any
//! failure drops the transaction, which rolls it back, so callers observe either
//! the complete new schedule or the untouched old one.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ApplyStrictness, EngineConfig};
use crate::conflict::{detect_conflicts, find_self_overlaps, ConflictRecord};
use crate::error::{Result, ScheduleError};
use crate::expander::schedule_window;
use crate::schedule::ValidatedRequest;
use crate::store::{queries, Database};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    pub committed: bool,
    pub rules_written: usize,
    pub generated_removed: usize,
}

/// Replace the schedule of `request.staff_id` in `request.business_id`.
///
/// Self-overlapping schedules are always rejected with `SCHEDULE_OVERLAP` before
/// any write. Rota and booking conflicts only block the write under
/// [`ApplyStrictness::Strict`], where they fail with `SCHEDULE_CONFLICT`.
pub fn apply_schedule(
    db: &Database,
    request: &ValidatedRequest,
    config: &EngineConfig,
) -> Result<ApplyOutcome> {
    let overlaps = find_self_overlaps(&request.entries);
    if let Some(ConflictRecord::SelfOverlap { day_of_week, .. }) = overlaps.first() {
        warn!(
            staff_id = request.staff_id,
            business_id = request.business_id,
            "Rejecting schedule with {} overlapping pair(s)",
            overlaps.len()
        );
        return Err(ScheduleError::ScheduleOverlap {
            day: *day_of_week,
            count: overlaps.len(),
        });
    }

    let tx = db.begin_write()?;

    if config.apply_strictness == ApplyStrictness::Strict {
        if let Some(window) = schedule_window(&request.entries, config.default_horizon_days) {
            let rota = queries::manual_rota_entries(&tx, request.staff_id, window)?;
            let bookings = queries::confirmed_bookings(&tx, request.staff_id, window)?;
            let report = detect_conflicts(
                &request.entries,
                &rota,
                &bookings,
                config.default_horizon_days,
            );
            if report.has_conflicts {
                warn!(
                    staff_id = request.staff_id,
                    business_id = request.business_id,
                    "Strict apply rejected: {} conflict(s)",
                    report.conflicts.len()
                );
                return Err(ScheduleError::ScheduleConflict(report.conflicts.len()));
            }
        }
    }

    let generated_removed =
        queries::delete_generated_rota(&tx, request.staff_id, request.business_id)?;
    queries::delete_schedule_rules(&tx, request.staff_id, request.business_id)?;
    for (position, entry) in request.entries.iter().enumerate() {
        queries::insert_schedule_rule(
            &tx,
            request.staff_id,
            request.business_id,
            position,
            entry,
        )?;
    }
    tx.commit()?;

    info!(
        staff_id = request.staff_id,
        business_id = request.business_id,
        "Applied schedule: {} rule(s) written, {} generated rota row(s) removed",
        request.entries.len(),
        generated_removed
    );

    Ok(ApplyOutcome {
        committed: true,
        rules_written: request.entries.len(),
        generated_removed,
    })
}
