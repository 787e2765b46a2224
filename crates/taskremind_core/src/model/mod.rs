//! Domain model for tasks and reminder deliveries.
//!
//! # Responsibility
//! - Define the task shape read by the reminder engine.
//! - Define reminder kinds, events and delivery records.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - All timestamps are Unix epoch milliseconds (`EpochMs`).

pub mod reminder;
pub mod task;

use std::time::{SystemTime, UNIX_EPOCH};

/// Unix epoch milliseconds.
pub type EpochMs = i64;

/// Current wall-clock time; clamps to `0` before the epoch.
pub fn current_epoch_ms() -> EpochMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(EpochMs::MAX)
        })
}
