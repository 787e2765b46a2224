//! Core domain logic for task reminders.
//! This crate owns the reminder rule and the stores it reads from.

pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod reminder;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::reminder::{DeliveryRecord, ReminderEvent, ReminderKind};
pub use model::task::{Task, TaskId, TaskPriority, TaskStatus, TaskValidationError};
pub use model::{current_epoch_ms, EpochMs};
pub use notify::{LogSink, MemorySink, NotificationSink, SinkError};
pub use reminder::config::{ConfigError, ReminderConfig, ReminderSettings};
pub use reminder::evaluator::{evaluate, Evaluation};
pub use reminder::retention::{
    purge_expired, retain_active, retention_cutoff, DEFAULT_RETENTION_DAYS,
};
pub use repo::delivery_repo::{DeliveryLogRepository, SqliteDeliveryLogRepository};
pub use repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository, TaskSort};
pub use repo::{RepoError, RepoResult};
pub use service::reminder_service::{
    ReminderService, ReminderServiceError, ReminderServiceResult, TickReport,
};
pub use service::stats_service::{
    CompletionRate, CompletionStats, StatsError, StatsResult, StatsService, StatusDistribution,
    TrendPoint,
};
pub use service::task_service::{NewTask, TaskService};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
