//! Delivery log retention helpers.
//!
//! Both functions are pure; callers decide when to run them and persist the
//! result.

use crate::model::reminder::DeliveryRecord;
use crate::model::task::{Task, TaskId};
use crate::model::EpochMs;
use std::collections::HashSet;

const MS_PER_DAY: i64 = 86_400 * 1000;

/// Default retention window for delivery records.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Keeps records with `delivered_at >= now - retention_days`.
pub fn purge_expired(
    records: &[DeliveryRecord],
    now: EpochMs,
    retention_days: u32,
) -> Vec<DeliveryRecord> {
    let cutoff = retention_cutoff(now, retention_days);
    records
        .iter()
        .filter(|record| record.delivered_at >= cutoff)
        .cloned()
        .collect()
}

/// Oldest `delivered_at` that survives a purge at `now`.
pub fn retention_cutoff(now: EpochMs, retention_days: u32) -> EpochMs {
    now.saturating_sub(i64::from(retention_days).saturating_mul(MS_PER_DAY))
}

/// Keeps only records whose task is still present and pending.
pub fn retain_active(records: &[DeliveryRecord], tasks: &[Task]) -> Vec<DeliveryRecord> {
    let active: HashSet<TaskId> = tasks
        .iter()
        .filter(|task| task.is_pending())
        .map(|task| task.id)
        .collect();
    records
        .iter()
        .filter(|record| active.contains(&record.task_id))
        .cloned()
        .collect()
}
