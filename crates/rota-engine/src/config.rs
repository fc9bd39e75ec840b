//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Horizon used for entries without an `end_date`.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Longest date range, in days, a single entry may cover once its end is
/// resolved. Wider entries are rejected with `INVALID_DATE`.
pub const DEFAULT_MAX_WINDOW_DAYS: u32 = 366;

/// Which checks gate the apply (write) path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStrictness {
    /// Reject only self-overlapping schedules. A schedule that collides with
    /// manual rota entries or confirmed bookings is still committed.
    #[default]
    SelfOverlapOnly,
    /// Also reject schedules with rota or booking conflicts (`SCHEDULE_CONFLICT`).
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_horizon_days: u32,
    pub max_window_days: u32,
    pub apply_strictness: ApplyStrictness,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_horizon_days: DEFAULT_HORIZON_DAYS,
            max_window_days: DEFAULT_MAX_WINDOW_DAYS,
            apply_strictness: ApplyStrictness::default(),
        }
    }
}

impl EngineConfig {
    pub fn strict() -> Self {
        Self {
            apply_strictness: ApplyStrictness::Strict,
            ..Self::default()
        }
    }
}
