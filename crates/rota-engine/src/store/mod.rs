//! SQLite-backed persistence for businesses, bookings, rota entries and
//! applied schedule rules.

pub mod models;
pub(crate) mod queries;
pub mod sqlite;

pub use models::{Booking, BookingStatus, NewBooking, NewRotaEntry, RotaEntry, ScheduleRule};
pub use sqlite::Database;
