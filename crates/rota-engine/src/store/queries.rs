use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use tracing::debug;

use super::models::*;
use super::sqlite::Database;
use crate::expander::DateWindow;
use crate::schedule::{DayOfWeek, ScheduleEntry};

// ── Reads ────────────────────────────────────────────────────────────

fn rota_from_row(row: &Row<'_>) -> Result<RotaEntry> {
    Ok(RotaEntry {
        id: row.get(0)?,
        staff_id: row.get(1)?,
        business_id: row.get(2)?,
        rota_date: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        is_generated: row.get(6)?,
    })
}

const ROTA_COLUMNS: &str =
    "id, staff_id, business_id, rota_date, start_time, end_time, is_generated";

/// Manually placed rota entries for a staff member, across all businesses.
pub(crate) fn manual_rota_entries(
    conn: &Connection,
    staff_id: i64,
    window: DateWindow,
) -> Result<Vec<RotaEntry>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {ROTA_COLUMNS} FROM rota_entry \
         WHERE staff_id = ?1 AND is_generated = 0 AND rota_date BETWEEN ?2 AND ?3 \
         ORDER BY rota_date, start_time, id"
    ))?;
    let rows = stmt
        .query_map(params![staff_id, window.start, window.end], rota_from_row)?
        .collect::<Result<Vec<_>>>()?;
    debug!("Loaded {} manual rota entries for staff {}", rows.len(), staff_id);
    Ok(rows)
}

pub(crate) fn rota_entries_for(
    conn: &Connection,
    staff_id: i64,
    business_id: i64,
) -> Result<Vec<RotaEntry>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {ROTA_COLUMNS} FROM rota_entry \
         WHERE staff_id = ?1 AND business_id = ?2 \
         ORDER BY rota_date, start_time, id"
    ))?;
    let rows = stmt
        .query_map(params![staff_id, business_id], rota_from_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(rows)
}

/// Confirmed bookings for a staff member inside the window, with service and
/// customer names joined in.
pub(crate) fn confirmed_bookings(
    conn: &Connection,
    staff_id: i64,
    window: DateWindow,
) -> Result<Vec<Booking>> {
    let mut stmt = conn.prepare_cached(
        "SELECT b.id, b.staff_id, b.business_id, b.booking_date, b.start_time, b.end_time, \
                b.status, s.name, c.name \
         FROM booking b \
         LEFT JOIN service s ON s.id = b.service_id \
         LEFT JOIN customer c ON c.id = b.customer_id \
         WHERE b.staff_id = ?1 AND b.status = 'confirmed' \
           AND b.booking_date BETWEEN ?2 AND ?3 \
         ORDER BY b.booking_date, b.start_time, b.id",
    )?;
    let rows = stmt
        .query_map(params![staff_id, window.start, window.end], |row| {
            Ok(Booking {
                id: row.get(0)?,
                staff_id: row.get(1)?,
                business_id: row.get(2)?,
                booking_date: row.get(3)?,
                start_time: row.get(4)?,
                end_time: row.get(5)?,
                status: row.get(6)?,
                service_name: row.get(7)?,
                customer_name: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    debug!("Loaded {} confirmed bookings for staff {}", rows.len(), staff_id);
    Ok(rows)
}

pub(crate) fn load_schedule_rules(
    conn: &Connection,
    staff_id: i64,
    business_id: i64,
) -> Result<Vec<ScheduleRule>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, staff_id, business_id, position, day_of_week, start_time, end_time, \
                start_date, end_date, repeat_every_n_weeks, rrule \
         FROM schedule_rule WHERE staff_id = ?1 AND business_id = ?2 \
         ORDER BY position, id",
    )?;
    let rows = stmt
        .query_map(params![staff_id, business_id], |row| {
            let day: DayOfWeek = row.get(4)?;
            let start_time: NaiveTime = row.get(5)?;
            let end_time: NaiveTime = row.get(6)?;
            let start_date: NaiveDate = row.get(7)?;
            let end_date: Option<NaiveDate> = row.get(8)?;
            let repeat: u32 = row.get(9)?;
            let entry = ScheduleEntry::new(
                day,
                start_time,
                end_time,
                start_date,
                end_date,
                Some(repeat),
            )
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
            let position: i64 = row.get(3)?;
            Ok(ScheduleRule {
                id: row.get(0)?,
                staff_id: row.get(1)?,
                business_id: row.get(2)?,
                position: position as usize,
                entry,
                rrule: row.get(10)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn is_business_owner(conn: &Connection, actor_id: i64, business_id: i64) -> Result<bool> {
    let owner: Option<i64> = conn
        .query_row(
            "SELECT owner_id FROM business WHERE id = ?1",
            params![business_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(owner == Some(actor_id))
}

pub(crate) fn is_staff_of_business(conn: &Connection, staff_id: i64, business_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM business_staff WHERE business_id = ?1 AND staff_id = ?2",
            params![business_id, staff_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

// ── Writes ───────────────────────────────────────────────────────────

pub(crate) fn delete_generated_rota(conn: &Connection, staff_id: i64, business_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM rota_entry WHERE staff_id = ?1 AND business_id = ?2 AND is_generated = 1",
        params![staff_id, business_id],
    )
}

pub(crate) fn delete_schedule_rules(conn: &Connection, staff_id: i64, business_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM schedule_rule WHERE staff_id = ?1 AND business_id = ?2",
        params![staff_id, business_id],
    )
}

pub(crate) fn insert_schedule_rule(
    conn: &Connection,
    staff_id: i64,
    business_id: i64,
    position: usize,
    entry: &ScheduleEntry,
) -> Result<i64> {
    let now = chrono::Utc::now().to_rfc3339();
    let mut stmt = conn.prepare_cached(
        "INSERT INTO schedule_rule (staff_id, business_id, position, day_of_week, start_time, \
             end_time, start_date, end_date, repeat_every_n_weeks, rrule, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )?;
    stmt.execute(params![
        staff_id,
        business_id,
        position as i64,
        entry.day_of_week,
        entry.time.start(),
        entry.time.end(),
        entry.start_date,
        entry.end_date,
        entry.repeat_every_n_weeks.get(),
        entry.to_rrule(),
        now,
    ])?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_rota_entry(conn: &Connection, entry: &NewRotaEntry) -> Result<i64> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO rota_entry (staff_id, business_id, rota_date, start_time, end_time, is_generated) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    stmt.execute(params![
        entry.staff_id,
        entry.business_id,
        entry.rota_date,
        entry.start_time,
        entry.end_time,
        entry.is_generated,
    ])?;
    Ok(conn.last_insert_rowid())
}

// ── Database API ─────────────────────────────────────────────────────
//
// Rows owned by other parts of the platform (businesses, staff membership,
// services, customers, bookings, manual rota entries) are written here only
// for seeding and tests.

impl Database {
    pub fn insert_business(&self, name: &str, owner_id: i64) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO business (name, owner_id) VALUES (?1, ?2)",
            params![name, owner_id],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn add_staff(&self, business_id: i64, staff_id: i64) -> Result<()> {
        self.connection().execute(
            "INSERT OR IGNORE INTO business_staff (business_id, staff_id) VALUES (?1, ?2)",
            params![business_id, staff_id],
        )?;
        Ok(())
    }

    pub fn insert_service(&self, business_id: i64, name: &str) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO service (business_id, name) VALUES (?1, ?2)",
            params![business_id, name],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn insert_customer(&self, name: &str) -> Result<i64> {
        self.connection()
            .execute("INSERT INTO customer (name) VALUES (?1)", params![name])?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn insert_booking(&self, booking: &NewBooking) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO booking (staff_id, business_id, service_id, customer_id, booking_date, \
                 start_time, end_time, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                booking.staff_id,
                booking.business_id,
                booking.service_id,
                booking.customer_id,
                booking.booking_date,
                booking.start_time,
                booking.end_time,
                booking.status,
            ],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn insert_rota_entry(&self, entry: &NewRotaEntry) -> Result<i64> {
        insert_rota_entry(self.connection(), entry)
    }

    /// All rota rows (manual and generated) for a staff member in one business.
    pub fn rota_entries(&self, staff_id: i64, business_id: i64) -> Result<Vec<RotaEntry>> {
        rota_entries_for(self.connection(), staff_id, business_id)
    }

    /// The currently applied schedule for a staff member in one business.
    pub fn schedule_rules(&self, staff_id: i64, business_id: i64) -> Result<Vec<ScheduleRule>> {
        load_schedule_rules(self.connection(), staff_id, business_id)
    }
}
