//! End-to-end tests for CheckConflicts and ApplySchedule against an in-memory
//! store.

use chrono::{NaiveDate, NaiveTime};
use rota_engine::access::AccessDirectory;
use rota_engine::config::EngineConfig;
use rota_engine::error::{ResponseCode, Result, ScheduleError};
use rota_engine::generator::generate_rota;
use rota_engine::schedule::{parse_time, DayOfWeek, RawScheduleEntry, ScheduleRequest};
use rota_engine::service::{ApplyResponse, CheckResponse, ErrorResponse, ScheduleService};
use rota_engine::store::{BookingStatus, Database, NewBooking, NewRotaEntry};

// ── Helpers ─────────────────────────────────────────────────────────────────

const OWNER: i64 = 100;
const STAFF: i64 = 7;

struct Fixture {
    db: Database,
    business_id: i64,
}

fn fixture() -> Fixture {
    let db = Database::open_in_memory().unwrap();
    let business_id = db.insert_business("Salon", OWNER).unwrap();
    db.add_staff(business_id, STAFF).unwrap();
    Fixture { db, business_id }
}

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn t(s: &str) -> NaiveTime {
    parse_time(s).unwrap()
}

fn raw(day: &str, start: &str, end: &str, start_date: &str) -> RawScheduleEntry {
    RawScheduleEntry {
        day_of_week: Some(day.to_string()),
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
        start_date: Some(start_date.to_string()),
        ..Default::default()
    }
}

fn request(f: &Fixture, schedule: Vec<RawScheduleEntry>) -> ScheduleRequest {
    ScheduleRequest {
        business_id: Some(f.business_id),
        staff_id: Some(STAFF),
        schedule,
    }
}

fn confirmed_booking(f: &Fixture, date: &str, start: &str, end: &str) -> i64 {
    let service_id = f.db.insert_service(f.business_id, "Haircut").unwrap();
    let customer_id = f.db.insert_customer("Ada Lovelace").unwrap();
    f.db
        .insert_booking(&NewBooking {
            staff_id: STAFF,
            business_id: f.business_id,
            service_id: Some(service_id),
            customer_id: Some(customer_id),
            booking_date: d(date),
            start_time: t(start),
            end_time: t(end),
            status: BookingStatus::Confirmed,
        })
        .unwrap()
}

fn manual_rota(f: &Fixture, business_id: i64, date: &str, start: &str, end: &str) -> i64 {
    f.db
        .insert_rota_entry(&NewRotaEntry {
            staff_id: STAFF,
            business_id,
            rota_date: d(date),
            start_time: t(start),
            end_time: t(end),
            is_generated: false,
        })
        .unwrap()
}

type RuleRow = (DayOfWeek, NaiveTime, NaiveTime, NaiveDate, Option<NaiveDate>, u32);
type RotaRow = (NaiveDate, NaiveTime, NaiveTime, bool);

/// Stored state for the fixture pair, without row ids.
fn snapshot(f: &Fixture) -> (Vec<RuleRow>, Vec<RotaRow>) {
    let rules = f
        .db
        .schedule_rules(STAFF, f.business_id)
        .unwrap()
        .into_iter()
        .map(|r| {
            (
                r.entry.day_of_week,
                r.entry.time.start(),
                r.entry.time.end(),
                r.entry.start_date,
                r.entry.end_date,
                r.entry.repeat_every_n_weeks.get(),
            )
        })
        .collect();
    let rota = f
        .db
        .rota_entries(STAFF, f.business_id)
        .unwrap()
        .into_iter()
        .map(|r| (r.rota_date, r.start_time, r.end_time, r.is_generated))
        .collect();
    (rules, rota)
}

/// Fails the test if authorization is ever consulted.
struct UnreachableDirectory;

impl AccessDirectory for UnreachableDirectory {
    fn is_business_owner(&self, _actor_id: i64, _business_id: i64) -> Result<bool> {
        panic!("authorization consulted before validation finished");
    }

    fn is_staff_of_business(&self, _staff_id: i64, _business_id: i64) -> Result<bool> {
        panic!("authorization consulted before validation finished");
    }
}

// ── Scenario A ──────────────────────────────────────────────────────────────

#[test]
fn clean_schedule_reports_no_conflicts() {
    let f = fixture();
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());
    let req = request(&f, vec![raw("Monday", "09:00", "12:00", "2024-01-01")]);

    let report = service.check_conflicts(OWNER, &req).unwrap();
    assert!(!report.has_conflicts);

    let response = CheckResponse::from(report);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "SUCCESS");
    assert_eq!(json["has_conflicts"], false);
}

// ── Scenario B ──────────────────────────────────────────────────────────────

#[test]
fn overlapping_entries_reported_by_check_and_rejected_by_apply() {
    let f = fixture();
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());

    // Existing applied schedule plus generated rota rows.
    let existing = request(&f, vec![raw("Tuesday", "10:00", "16:00", "2024-01-02")]);
    service.apply_schedule(OWNER, &existing).unwrap();
    generate_rota(&f.db, STAFF, f.business_id, service.config()).unwrap();
    let before = snapshot(&f);
    assert!(!before.1.is_empty());

    let req = request(
        &f,
        vec![
            raw("Monday", "09:00", "12:00", "2024-01-01"),
            raw("Monday", "11:00", "14:00", "2024-01-01"),
        ],
    );

    let report = service.check_conflicts(OWNER, &req).unwrap();
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].kind(), "self_overlap");

    let err = service.apply_schedule(OWNER, &req).unwrap_err();
    assert_eq!(err.code(), ResponseCode::ScheduleOverlap);
    assert_eq!(snapshot(&f), before, "rejected apply must not write");
}

// ── Scenario C ──────────────────────────────────────────────────────────────

#[test]
fn booking_coverage_follows_proposed_hours() {
    let f = fixture();
    let booking_id = confirmed_booking(&f, "2024-01-08", "10:00", "11:00");
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());

    let covered = request(&f, vec![raw("Monday", "09:00", "12:00", "2024-01-01")]);
    assert!(!service.check_conflicts(OWNER, &covered).unwrap().has_conflicts);

    let uncovered = request(&f, vec![raw("Monday", "13:00", "17:00", "2024-01-01")]);
    let report = service.check_conflicts(OWNER, &uncovered).unwrap();
    assert_eq!(report.conflicts.len(), 1);

    let json = serde_json::to_value(&report).unwrap();
    let record = &json["conflicts"][0];
    assert_eq!(record["type"], "booking_conflict");
    assert_eq!(record["booking"]["booking_id"], booking_id);
    assert_eq!(record["booking"]["service_name"], "Haircut");
    assert_eq!(record["booking"]["customer_name"], "Ada Lovelace");
    assert_eq!(record["booking"]["booking_date"], "2024-01-08");
}

// ── Scenarios D and E ───────────────────────────────────────────────────────

#[test]
fn unknown_day_fails_before_any_store_access() {
    let f = fixture();
    let service = ScheduleService::new(&f.db, &UnreachableDirectory, EngineConfig::default());
    let req = request(&f, vec![raw("Funday", "09:00", "12:00", "2024-01-01")]);

    let err = service.check_conflicts(OWNER, &req).unwrap_err();
    assert_eq!(err.code(), ResponseCode::InvalidDay);
    let err = service.apply_schedule(OWNER, &req).unwrap_err();
    assert_eq!(err.code(), ResponseCode::InvalidDay);
    assert_eq!(ErrorResponse::from(&err).status.as_str(), "INVALID_DAY");
}

#[test]
fn missing_end_time_is_missing_fields() {
    let f = fixture();
    let service = ScheduleService::new(&f.db, &UnreachableDirectory, EngineConfig::default());
    let mut entry = raw("Monday", "09:00", "12:00", "2024-01-01");
    entry.end_time = None;

    let err = service
        .apply_schedule(OWNER, &request(&f, vec![entry]))
        .unwrap_err();
    assert_eq!(err.code(), ResponseCode::MissingFields);
}

#[test]
fn missing_identifiers_and_empty_schedule_are_missing_fields() {
    let f = fixture();
    let service = ScheduleService::new(&f.db, &UnreachableDirectory, EngineConfig::default());

    let mut no_staff = request(&f, vec![raw("Monday", "09:00", "12:00", "2024-01-01")]);
    no_staff.staff_id = None;
    assert_eq!(
        service.check_conflicts(OWNER, &no_staff).unwrap_err().code(),
        ResponseCode::MissingFields
    );

    let empty = request(&f, vec![]);
    assert_eq!(
        service.check_conflicts(OWNER, &empty).unwrap_err().code(),
        ResponseCode::MissingFields
    );
}

#[test]
fn inverted_times_are_invalid_time() {
    let f = fixture();
    let service = ScheduleService::new(&f.db, &UnreachableDirectory, EngineConfig::default());
    let req = request(&f, vec![raw("Monday", "12:00", "09:00", "2024-01-01")]);
    assert_eq!(
        service.check_conflicts(OWNER, &req).unwrap_err().code(),
        ResponseCode::InvalidTime
    );
}

fn until(mut entry: RawScheduleEntry, end_date: &str) -> RawScheduleEntry {
    entry.end_date = Some(end_date.to_string());
    entry
}

#[test]
fn far_future_end_date_is_invalid_date_before_any_store_access() {
    let f = fixture();
    let service = ScheduleService::new(&f.db, &UnreachableDirectory, EngineConfig::default());
    let week: Vec<RawScheduleEntry> = DayOfWeek::ALL
        .iter()
        .map(|day| until(raw(day.as_str(), "09:00", "10:00", "2024-01-01"), "9999-12-31"))
        .collect();
    let req = request(&f, week);

    let err = service.check_conflicts(OWNER, &req).unwrap_err();
    assert_eq!(err.code(), ResponseCode::InvalidDate);
    let err = service.apply_schedule(OWNER, &req).unwrap_err();
    assert_eq!(err.code(), ResponseCode::InvalidDate);
    assert_eq!(snapshot(&f), (vec![], vec![]));
}

#[test]
fn date_range_up_to_the_limit_is_accepted() {
    let f = fixture();
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());
    // 2024 is a leap year: 366 days from 2024-01-01.
    let req = request(
        &f,
        vec![until(raw("Monday", "09:00", "12:00", "2024-01-01"), "2025-01-01")],
    );
    assert!(!service.check_conflicts(OWNER, &req).unwrap().has_conflicts);

    let req = request(
        &f,
        vec![until(raw("Monday", "09:00", "12:00", "2024-01-01"), "2025-01-02")],
    );
    assert_eq!(
        service.check_conflicts(OWNER, &req).unwrap_err().code(),
        ResponseCode::InvalidDate
    );
}

#[test]
fn configured_window_limit_also_bounds_the_default_horizon() {
    let f = fixture();
    let config = EngineConfig {
        max_window_days: 14,
        ..EngineConfig::default()
    };
    let service = ScheduleService::new(&f.db, &UnreachableDirectory, config);

    let open_ended = request(&f, vec![raw("Monday", "09:00", "12:00", "2024-01-01")]);
    assert_eq!(
        service.check_conflicts(OWNER, &open_ended).unwrap_err().code(),
        ResponseCode::InvalidDate
    );
}

// ── Authorization ───────────────────────────────────────────────────────────

#[test]
fn non_owner_is_unauthorized() {
    let f = fixture();
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());
    let req = request(&f, vec![raw("Monday", "09:00", "12:00", "2024-01-01")]);
    assert_eq!(
        service.check_conflicts(999, &req).unwrap_err().code(),
        ResponseCode::Unauthorized
    );
    assert_eq!(
        service.apply_schedule(999, &req).unwrap_err().code(),
        ResponseCode::Unauthorized
    );
}

#[test]
fn non_member_staff_is_invalid_staff() {
    let f = fixture();
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());
    let mut req = request(&f, vec![raw("Monday", "09:00", "12:00", "2024-01-01")]);
    req.staff_id = Some(8);
    assert_eq!(
        service.apply_schedule(OWNER, &req).unwrap_err().code(),
        ResponseCode::InvalidStaff
    );
    assert!(f.db.schedule_rules(8, f.business_id).unwrap().is_empty());
}

// ── Check path ──────────────────────────────────────────────────────────────

#[test]
fn check_is_repeatable_and_read_only() {
    let f = fixture();
    confirmed_booking(&f, "2024-01-09", "10:00", "11:00");
    manual_rota(&f, f.business_id, "2024-01-08", "10:00", "13:00");
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());
    let req = request(
        &f,
        vec![
            raw("Monday", "09:00", "12:00", "2024-01-01"),
            raw("mon", "10:00", "10:30", "2024-01-01"),
        ],
    );
    let before = snapshot(&f);

    let first = service.check_conflicts(OWNER, &req).unwrap();
    let second = service.check_conflicts(OWNER, &req).unwrap();
    assert_eq!(first, second);
    let kinds: Vec<&str> = first.conflicts.iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, vec!["self_overlap", "rota_conflict", "rota_conflict", "booking_conflict"]);
    assert_eq!(snapshot(&f), before);
}

#[test]
fn manual_rota_in_another_business_still_conflicts() {
    let f = fixture();
    let spa = f.db.insert_business("Spa", 200).unwrap();
    f.db.add_staff(spa, STAFF).unwrap();
    manual_rota(&f, spa, "2024-01-15", "08:00", "10:00");

    let service = ScheduleService::with_store(&f.db, EngineConfig::default());
    let req = request(&f, vec![raw("Monday", "09:00", "12:00", "2024-01-01")]);
    let report = service.check_conflicts(OWNER, &req).unwrap();
    assert_eq!(report.conflicts.len(), 1);
    match &report.conflicts[0] {
        rota_engine::ConflictRecord::RotaConflict { business_id, .. } => {
            assert_eq!(*business_id, spa)
        }
        other => panic!("expected rota_conflict, got {:?}", other),
    }
}

// ── Apply path ──────────────────────────────────────────────────────────────

#[test]
fn apply_replaces_generated_rows_and_keeps_manual_rows() {
    let f = fixture();
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());
    manual_rota(&f, f.business_id, "2024-01-06", "09:00", "12:00");

    let first = request(&f, vec![raw("Monday", "09:00", "12:00", "2024-01-01")]);
    service.apply_schedule(OWNER, &first).unwrap();
    let generated = generate_rota(&f.db, STAFF, f.business_id, service.config()).unwrap();
    assert_eq!(generated.created, 5);

    let second = request(
        &f,
        vec![
            raw("Wednesday", "13:00", "17:00", "2024-01-03"),
            raw("Friday", "09:00", "11:00", "2024-01-05"),
        ],
    );
    let outcome = service.apply_schedule(OWNER, &second).unwrap();
    assert!(outcome.committed);
    assert_eq!(outcome.generated_removed, 5);
    assert_eq!(outcome.rules_written, 2);
    assert_eq!(
        serde_json::to_value(ApplyResponse::from(outcome)).unwrap(),
        serde_json::json!({"status": "SUCCESS", "committed": true})
    );

    let (rules, rota) = snapshot(&f);
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].0, DayOfWeek::Wednesday);
    assert_eq!(rules[1].0, DayOfWeek::Friday);
    assert_eq!(rota, vec![(d("2024-01-06"), t("09:00"), t("12:00"), false)]);
}

#[test]
fn failed_write_rolls_back_everything() {
    let f = fixture();
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());
    service
        .apply_schedule(OWNER, &request(&f, vec![raw("Monday", "09:00", "12:00", "2024-01-01")]))
        .unwrap();
    generate_rota(&f.db, STAFF, f.business_id, service.config()).unwrap();
    let before = snapshot(&f);

    // Fail the second rule insert, after the delete and first insert succeeded.
    f.db.connection()
        .execute_batch(
            "CREATE TRIGGER fail_sunday BEFORE INSERT ON schedule_rule \
             WHEN NEW.day_of_week = 'sunday' \
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
        )
        .unwrap();

    let req = request(
        &f,
        vec![
            raw("Saturday", "09:00", "12:00", "2024-01-06"),
            raw("Sunday", "09:00", "12:00", "2024-01-07"),
        ],
    );
    let err = service.apply_schedule(OWNER, &req).unwrap_err();
    assert!(matches!(err, ScheduleError::Storage(_)));
    assert_eq!(err.code(), ResponseCode::ServerError);

    let response = ErrorResponse::from(&err);
    assert_eq!(response.status, ResponseCode::ServerError);
    assert!(!response.message.contains("injected"), "store detail must not leak");

    assert_eq!(snapshot(&f), before, "state must be untouched after rollback");
}

#[test]
fn applying_same_schedule_twice_is_idempotent() {
    let f = fixture();
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());
    let mut fortnightly = raw("Thursday", "08:00", "12:30", "2024-01-04");
    fortnightly.repeat_every_n_weeks = Some(2);
    fortnightly.end_date = Some("2024-03-28".to_string());
    let req = request(&f, vec![raw("Monday", "09:00", "12:00", "2024-01-01"), fortnightly]);

    service.apply_schedule(OWNER, &req).unwrap();
    generate_rota(&f.db, STAFF, f.business_id, service.config()).unwrap();
    let once = snapshot(&f);

    service.apply_schedule(OWNER, &req).unwrap();
    generate_rota(&f.db, STAFF, f.business_id, service.config()).unwrap();
    let twice = snapshot(&f);

    assert_eq!(once, twice);
    assert_eq!(once.0.len(), 2);
}

#[test]
fn default_apply_commits_despite_booking_conflicts() {
    let f = fixture();
    confirmed_booking(&f, "2024-01-08", "10:00", "11:00");
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());
    let req = request(&f, vec![raw("Monday", "13:00", "17:00", "2024-01-01")]);

    assert!(service.check_conflicts(OWNER, &req).unwrap().has_conflicts);
    assert!(service.apply_schedule(OWNER, &req).unwrap().committed);
    assert_eq!(f.db.schedule_rules(STAFF, f.business_id).unwrap().len(), 1);
}

#[test]
fn strict_apply_rejects_booking_and_rota_conflicts() {
    let f = fixture();
    confirmed_booking(&f, "2024-01-08", "10:00", "11:00");
    let service = ScheduleService::with_store(&f.db, EngineConfig::strict());

    let uncovered = request(&f, vec![raw("Monday", "13:00", "17:00", "2024-01-01")]);
    let err = service.apply_schedule(OWNER, &uncovered).unwrap_err();
    assert_eq!(err.code(), ResponseCode::ScheduleConflict);
    assert!(f.db.schedule_rules(STAFF, f.business_id).unwrap().is_empty());

    manual_rota(&f, f.business_id, "2024-01-15", "08:00", "09:30");
    let clashing = request(&f, vec![raw("Monday", "09:00", "12:00", "2024-01-01")]);
    assert_eq!(
        service.apply_schedule(OWNER, &clashing).unwrap_err().code(),
        ResponseCode::ScheduleConflict
    );

    let clean = request(&f, vec![raw("Monday", "09:30", "12:00", "2024-01-01")]);
    assert!(service.apply_schedule(OWNER, &clean).unwrap().committed);
}

#[test]
fn stored_rules_keep_resolved_recurrence_and_rule_text() {
    let f = fixture();
    let service = ScheduleService::with_store(&f.db, EngineConfig::default());
    let mut entry = raw("Friday", "09:00", "11:00", "2024-01-05");
    entry.repeat_every_n_weeks = Some(3);
    service.apply_schedule(OWNER, &request(&f, vec![entry])).unwrap();

    let rules = f.db.schedule_rules(STAFF, f.business_id).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].position, 0);
    assert_eq!(rules[0].entry.repeat_every_n_weeks.get(), 3);
    assert_eq!(rules[0].rrule, "FREQ=WEEKLY;INTERVAL=3;BYDAY=FR;WKST=MO");
    assert_eq!(rules[0].entry.end_date, None);
}
