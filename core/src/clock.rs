//! The per-company game clock and day-key arithmetic.
//!
//! One clock row per company; the row is mutated only by the day
//! advancement orchestrator. Advancement is guarded by an optimistic
//! version counter: the UPDATE carries the version the caller observed,
//! and a zero-row result means another request advanced the clock first.

use crate::types::{DayKey, EntityId};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameClock {
    pub company_id:       EntityId,
    pub current_day:      DayKey,
    pub version:          i64,
    pub last_advanced_at: Option<String>,
}

/// The day after `day`.
pub fn next_day(day: DayKey) -> DayKey {
    day + Duration::days(1)
}

/// The day before `day`.
pub fn prev_day(day: DayKey) -> DayKey {
    day - Duration::days(1)
}

/// Day-of-month (1-31), used for schedule trigger checks.
pub fn day_of_month(day: DayKey) -> u32 {
    day.day()
}

/// Monthly cycle key (`YYYY-MM`) for cycle-scoped idempotency keys.
pub fn cycle_key(day: DayKey) -> String {
    day.format("%Y-%m").to_string()
}

/// Canonical serialized form (`YYYY-MM-DD`).
pub fn format_day_key(day: DayKey) -> String {
    day.format("%Y-%m-%d").to_string()
}

pub fn parse_day_key(raw: &str) -> Option<DayKey> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Stable ordinal for RNG stream derivation.
pub fn day_ordinal(day: DayKey) -> i64 {
    day.num_days_from_ce() as i64
}
