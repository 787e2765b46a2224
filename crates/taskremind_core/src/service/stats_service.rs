//! Task statistics for dashboards.
//!
//! # Responsibility
//! - Report completion rates over a trailing window, overall and per priority.
//! - Report daily created/finished counts and the pending/completed split.
//!
//! # Invariants
//! - A rate is `finished / created * 100` and `0.0` when nothing was created.
//!   Tasks created before the window but finished inside it still count as
//!   finished, so a rate may exceed 100.
//! - Trend days are calendar dates at the caller's UTC offset, oldest first.

use crate::model::task::{TaskPriority, TaskStatus};
use crate::model::EpochMs;
use crate::repo::RepoError;
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MS_PER_DAY: i64 = 86_400 * 1000;
const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

/// Failure of a statistics query.
#[derive(Debug)]
pub enum StatsError {
    /// Offset outside `-18h..=18h`.
    InvalidUtcOffset(i32),
    Repo(RepoError),
}

impl Display for StatsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUtcOffset(minutes) => {
                write!(f, "utc offset of {minutes} minutes is out of range")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StatsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidUtcOffset(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for StatsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for StatsError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

pub type StatsResult<T> = Result<T, StatsError>;

/// Created vs. finished counts for one slice of tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CompletionRate {
    pub created: u64,
    pub finished: u64,
    pub rate_percent: f64,
}

impl CompletionRate {
    fn new(created: u64, finished: u64) -> Self {
        let rate_percent = if created == 0 {
            0.0
        } else {
            finished as f64 / created as f64 * 100.0
        };
        Self {
            created,
            finished,
            rate_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionStats {
    pub window_days: u32,
    /// Window start; tasks at or after this instant are counted.
    pub since: EpochMs,
    pub overall: CompletionRate,
    /// One entry per priority, most urgent first.
    pub by_priority: Vec<(TaskPriority, CompletionRate)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub created: u64,
    pub finished: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusDistribution {
    pub pending: u64,
    pub completed: u64,
}

/// Read-only statistics over the Task Store.
pub struct StatsService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> StatsService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Completion rates for tasks created or finished in the last `days` days.
    pub fn completion(&self, now: EpochMs, days: u32) -> StatsResult<CompletionStats> {
        let since = now.saturating_sub(i64::from(days).saturating_mul(MS_PER_DAY));

        let created = self.count_by_priority(
            "SELECT priority, COUNT(*) FROM tasks WHERE created_at >= ?1 GROUP BY priority;",
            since,
        )?;
        let finished = self.count_by_priority(
            "SELECT priority, COUNT(*) FROM tasks
             WHERE status = 'completed' AND finished_at >= ?1
             GROUP BY priority;",
            since,
        )?;

        let by_priority: Vec<(TaskPriority, CompletionRate)> = TaskPriority::ALL
            .into_iter()
            .map(|priority| {
                let rate = CompletionRate::new(
                    created.get(&priority).copied().unwrap_or(0),
                    finished.get(&priority).copied().unwrap_or(0),
                );
                (priority, rate)
            })
            .collect();
        let overall = CompletionRate::new(created.values().sum(), finished.values().sum());

        info!(
            "event=stats_completion module=stats status=ok days={days} created={} finished={}",
            overall.created, overall.finished
        );
        Ok(CompletionStats {
            window_days: days,
            since,
            overall,
            by_priority,
        })
    }

    /// Daily created/finished counts for the `days` calendar days ending today.
    ///
    /// # Errors
    /// - `InvalidUtcOffset` when the offset is beyond +/-18 hours.
    pub fn trend(
        &self,
        now: EpochMs,
        days: u32,
        utc_offset_minutes: i32,
    ) -> StatsResult<Vec<TrendPoint>> {
        let offset = utc_offset(utc_offset_minutes)?;
        let Some(today) = local_date(now, offset) else {
            return Ok(Vec::new());
        };
        let dates: Vec<NaiveDate> = (0..days)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
            .collect();
        let Some(first) = dates.first().copied() else {
            return Ok(Vec::new());
        };
        let window_start = first
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.and_local_timezone(offset).single())
            .map_or(EpochMs::MIN, |start| start.timestamp_millis());

        let created = self.count_by_local_date(
            "SELECT created_at FROM tasks WHERE created_at >= ?1;",
            window_start,
            offset,
        )?;
        let finished = self.count_by_local_date(
            "SELECT finished_at FROM tasks
             WHERE status = 'completed' AND finished_at >= ?1;",
            window_start,
            offset,
        )?;

        Ok(dates
            .into_iter()
            .map(|date| TrendPoint {
                date,
                created: created.get(&date).copied().unwrap_or(0),
                finished: finished.get(&date).copied().unwrap_or(0),
            })
            .collect())
    }

    /// Pending vs. completed counts over all tasks.
    pub fn distribution(&self) -> StatsResult<StatusDistribution> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status;")?;
        let mut rows = stmt.query([])?;
        let mut distribution = StatusDistribution::default();

        while let Some(row) = rows.next()? {
            let status_text: String = row.get(0)?;
            let count = count_column(row.get(1)?);
            match TaskStatus::parse(&status_text) {
                Some(TaskStatus::Pending) => distribution.pending = count,
                Some(TaskStatus::Completed) => distribution.completed = count,
                None => {
                    return Err(RepoError::InvalidData(format!(
                        "invalid task status `{status_text}` in tasks.status"
                    ))
                    .into())
                }
            }
        }

        Ok(distribution)
    }

    fn count_by_priority(
        &self,
        sql: &str,
        since: EpochMs,
    ) -> StatsResult<HashMap<TaskPriority, u64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([since])?;
        let mut counts = HashMap::new();

        while let Some(row) = rows.next()? {
            let priority_text: String = row.get(0)?;
            let priority = TaskPriority::parse(&priority_text).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid task priority `{priority_text}` in tasks.priority"
                ))
            })?;
            counts.insert(priority, count_column(row.get(1)?));
        }

        Ok(counts)
    }

    fn count_by_local_date(
        &self,
        sql: &str,
        since: EpochMs,
        offset: FixedOffset,
    ) -> StatsResult<HashMap<NaiveDate, u64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([since])?;
        let mut counts: HashMap<NaiveDate, u64> = HashMap::new();

        while let Some(row) = rows.next()? {
            let at: EpochMs = row.get(0)?;
            if let Some(date) = local_date(at, offset) {
                *counts.entry(date).or_default() += 1;
            }
        }

        Ok(counts)
    }
}

fn utc_offset(minutes: i32) -> StatsResult<FixedOffset> {
    if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        return Err(StatsError::InvalidUtcOffset(minutes));
    }
    FixedOffset::east_opt(minutes * 60).ok_or(StatsError::InvalidUtcOffset(minutes))
}

fn local_date(at: EpochMs, offset: FixedOffset) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(at).map(|utc| utc.with_timezone(&offset).date_naive())
}

fn count_column(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
