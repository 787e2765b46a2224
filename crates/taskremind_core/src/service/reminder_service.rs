//! Reminder tick orchestration.
//!
//! # Responsibility
//! - Run one evaluation cycle against a consistent store snapshot.
//! - Persist new delivery records before handing events to a sink.
//! - Expose the global reminder switch and policy settings.
//!
//! # Invariants
//! - Tasks, records and settings for one tick are read inside one
//!   transaction, and new records are appended in that same transaction.
//! - A store failure aborts the tick without writing anything.
//! - Sink failures are logged and counted, never rolled back.

use crate::model::reminder::ReminderEvent;
use crate::model::EpochMs;
use crate::notify::NotificationSink;
use crate::reminder::config::{ReminderConfig, ReminderSettings};
use crate::reminder::evaluator::evaluate;
use crate::reminder::retention::{retain_active, retention_cutoff};
use crate::repo::delivery_repo::{DeliveryLogRepository, SqliteDeliveryLogRepository};
use crate::repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
use crate::repo::RepoError;
use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Failure of a reminder cycle at the store boundary.
#[derive(Debug)]
pub enum ReminderServiceError {
    Repo(RepoError),
}

impl Display for ReminderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "reminder store unavailable: {err}"),
        }
    }
}

impl Error for ReminderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ReminderServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ReminderServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

pub type ReminderServiceResult<T> = Result<T, ReminderServiceError>;

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// `true` when reminders are switched off and nothing was evaluated.
    pub skipped: bool,
    /// Events recorded as delivered during this tick.
    pub events: Vec<ReminderEvent>,
    /// Number of events the sink rejected.
    pub sink_failures: usize,
}

/// Reminder cycle runner over one SQLite connection.
pub struct ReminderService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ReminderService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Runs one evaluation cycle at `now` and delivers due events to `sink`.
    ///
    /// # Errors
    /// - Returns `ReminderServiceError` when any store read or write fails; in
    ///   that case no record is written and no event reaches the sink.
    pub fn tick(
        &self,
        now: EpochMs,
        sink: &dyn NotificationSink,
    ) -> ReminderServiceResult<TickReport> {
        let started_at = Instant::now();
        let events = match self.record_due_events(now) {
            Ok(Some(events)) => events,
            Ok(None) => {
                info!("event=reminder_tick module=reminder status=skipped reason=disabled");
                return Ok(TickReport {
                    skipped: true,
                    ..TickReport::default()
                });
            }
            Err(err) => {
                error!(
                    "event=reminder_tick module=reminder status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                return Err(err);
            }
        };

        let mut sink_failures = 0;
        for event in &events {
            if let Err(err) = sink.deliver(event) {
                sink_failures += 1;
                warn!(
                    "event=reminder_deliver module=reminder status=error task_id={} kind={} error={err}",
                    event.task_id,
                    event.kind.as_str()
                );
            }
        }

        info!(
            "event=reminder_tick module=reminder status=ok events={} sink_failures={} duration_ms={}",
            events.len(),
            sink_failures,
            started_at.elapsed().as_millis()
        );

        Ok(TickReport {
            skipped: false,
            events,
            sink_failures,
        })
    }

    // Returns `None` when reminders are disabled.
    fn record_due_events(&self, now: EpochMs) -> ReminderServiceResult<Option<Vec<ReminderEvent>>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let settings = SqliteSettingsRepository::new(&tx).load_reminder_settings()?;
        if !settings.enabled {
            return Ok(None);
        }

        let tasks = SqliteTaskRepository::new(&tx).list_tasks(&TaskListQuery::default())?;
        let log = SqliteDeliveryLogRepository::new(&tx);
        let records = log.load_records()?;

        let evaluation = evaluate(now, &tasks, &records, &settings.config);
        if evaluation.is_empty() {
            return Ok(Some(Vec::new()));
        }

        log.append_records(&evaluation.new_records)?;
        tx.commit()?;
        Ok(Some(evaluation.events))
    }

    /// Drops expired records and records of completed or deleted tasks.
    ///
    /// Returns the number of removed records.
    pub fn collect_garbage(&self, now: EpochMs) -> ReminderServiceResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let settings = SqliteSettingsRepository::new(&tx).load_reminder_settings()?;
        let log = SqliteDeliveryLogRepository::new(&tx);
        let expired = log.purge_before(retention_cutoff(now, settings.config.retention_days))?;

        let tasks = SqliteTaskRepository::new(&tx).list_tasks(&TaskListQuery::default())?;
        let records = log.load_records()?;
        let kept = retain_active(&records, &tasks);
        let inactive = records.len() - kept.len();
        if inactive > 0 {
            log.replace_records(&kept)?;
        }
        tx.commit()?;

        let removed = expired + inactive;
        info!(
            "event=reminder_gc module=reminder status=ok expired={expired} inactive={inactive} kept={}",
            kept.len()
        );
        Ok(removed)
    }

    pub fn settings(&self) -> ReminderServiceResult<ReminderSettings> {
        Ok(SqliteSettingsRepository::new(self.conn).load_reminder_settings()?)
    }

    /// Turns the global reminder switch on or off.
    pub fn set_enabled(&self, enabled: bool) -> ReminderServiceResult<ReminderSettings> {
        let repo = SqliteSettingsRepository::new(self.conn);
        let mut settings = repo.load_reminder_settings()?;
        settings.enabled = enabled;
        repo.save_reminder_settings(&settings)?;
        info!("event=reminder_settings module=reminder status=ok enabled={enabled}");
        Ok(settings)
    }

    pub fn update_config(&self, config: ReminderConfig) -> ReminderServiceResult<ReminderSettings> {
        let repo = SqliteSettingsRepository::new(self.conn);
        let mut settings = repo.load_reminder_settings()?;
        settings.config = config;
        repo.save_reminder_settings(&settings)?;
        Ok(settings)
    }
}
