//! Rota generation: expand the stored schedule rules of a staff member into
//! concrete, generated rota rows.
//!
//! Each rule's stored RFC 5545 text is expanded through the `rrule` crate over
//! the rule's own window, which must fit within `max_window_days`. Runs in one
//! immediate transaction. Prior generated rows for the pair are replaced;
//! occurrences that would overlap a manual rota entry of the same staff member
//! (in any business) are skipped.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::expander::{bounded_entry_window, expand_rule, DateWindow};
use crate::interval::TimeRange;
use crate::store::{queries, Database, NewRotaEntry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub rules: usize,
    pub removed: usize,
    pub created: usize,
    pub skipped: usize,
}

pub fn generate_rota(
    db: &Database,
    staff_id: i64,
    business_id: i64,
    config: &EngineConfig,
) -> Result<GenerationSummary> {
    let tx = db.begin_write()?;

    let rules = queries::load_schedule_rules(&tx, staff_id, business_id)?;
    let mut summary = GenerationSummary {
        rules: rules.len(),
        removed: queries::delete_generated_rota(&tx, staff_id, business_id)?,
        ..GenerationSummary::default()
    };

    let mut window: Option<DateWindow> = None;
    let mut slots: Vec<(NaiveDate, usize, TimeRange)> = Vec::new();
    for rule in &rules {
        let rule_window = bounded_entry_window(&rule.entry, config)?;
        let weekday = rule.entry.day_of_week.weekday();
        for date in expand_rule(&rule.rrule, weekday, rule_window)? {
            slots.push((date, rule.position, rule.entry.time));
        }
        window = Some(window.map_or(rule_window, |w| w.union(&rule_window)));
    }
    slots.sort_by_key(|(date, position, _)| (*date, *position));

    if let Some(window) = window {
        let manual = queries::manual_rota_entries(&tx, staff_id, window)?;

        for (date, _, time) in slots {
            let blocked = manual
                .iter()
                .any(|m| m.rota_date == date && m.time_range().is_some_and(|r| r.overlaps(&time)));
            if blocked {
                warn!(
                    staff_id,
                    business_id,
                    %date,
                    "Skipping generated slot overlapping a manual rota entry"
                );
                summary.skipped += 1;
                continue;
            }

            queries::insert_rota_entry(
                &tx,
                &NewRotaEntry {
                    staff_id,
                    business_id,
                    rota_date: date,
                    start_time: time.start(),
                    end_time: time.end(),
                    is_generated: true,
                },
            )?;
            summary.created += 1;
        }
    }

    tx.commit()?;
    info!(
        staff_id,
        business_id,
        "Generated rota: {} created, {} skipped, {} replaced",
        summary.created,
        summary.skipped,
        summary.removed
    );
    Ok(summary)
}
