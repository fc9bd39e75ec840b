//! Authorization lookups consumed by the service layer.
//!
//! The engine does not decide policy; it asks an [`AccessDirectory`] two yes/no
//! questions and maps the answers to `UNAUTHORIZED` and `INVALID_STAFF`.

use crate::error::Result;
use crate::store::{queries, Database};

pub trait AccessDirectory {
    /// Does `actor_id` own `business_id`?
    fn is_business_owner(&self, actor_id: i64, business_id: i64) -> Result<bool>;

    /// Is `staff_id` a staff member of `business_id`?
    fn is_staff_of_business(&self, staff_id: i64, business_id: i64) -> Result<bool>;
}

impl AccessDirectory for Database {
    fn is_business_owner(&self, actor_id: i64, business_id: i64) -> Result<bool> {
        Ok(queries::is_business_owner(
            self.connection(),
            actor_id,
            business_id,
        )?)
    }

    fn is_staff_of_business(&self, staff_id: i64, business_id: i64) -> Result<bool> {
        Ok(queries::is_staff_of_business(
            self.connection(),
            staff_id,
            business_id,
        )?)
    }
}
