//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task and reminder use cases to Dart via FRB.
//! - Convert core errors into plain response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens its own connection; no connection outlives a call.

use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use taskremind_core::db::open_db;
use taskremind_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CompletionRate, LogSink, NewTask, ReminderEvent, ReminderService, StatsService, Task,
    TaskListQuery, TaskPriority, TaskService, TaskSort, TaskStatus,
};
use uuid::Uuid;

const STORE_DB_FILE_NAME: &str = "taskremind.sqlite3";
static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path for rolling logs.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the SQLite file used by all later calls.
///
/// # FFI contract
/// - Must be called before any store-backed call to take effect.
/// - Repeating the same path is a no-op; a different path is rejected.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_store(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = STORE_DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "store already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Affected task ID, when the action targets one task.
    pub task_id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, task_id: Option<String>) -> Self {
        Self {
            ok: true,
            task_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Task row as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    /// `high|medium|low`.
    pub priority: String,
    /// `pending|completed`.
    pub status: String,
    pub deadline_ms: Option<i64>,
    pub created_at_ms: i64,
    pub finished_at_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    pub items: Vec<TaskItem>,
    pub message: String,
}

/// Reminder handed to the UI banner or notification layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub task_id: String,
    /// `before_due|at_due|overdue`.
    pub kind: String,
    pub title: String,
    pub message: String,
    pub due_at_ms: i64,
    pub generated_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderTickResponse {
    pub ok: bool,
    /// `true` when reminders are switched off.
    pub skipped: bool,
    pub reminders: Vec<ReminderItem>,
    pub message: String,
}

/// Completion rate for one priority, or overall when `priority` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRateItem {
    pub priority: String,
    pub created: u64,
    pub finished: u64,
    pub rate_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsCompletionResponse {
    pub ok: bool,
    pub overall: Option<CompletionRateItem>,
    pub by_priority: Vec<CompletionRateItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendItem {
    /// `yyyy-MM-dd` at the requested UTC offset.
    pub date: String,
    pub created: u64,
    pub finished: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsTrendResponse {
    pub ok: bool,
    pub items: Vec<TrendItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsDistributionResponse {
    pub ok: bool,
    pub pending: u64,
    pub completed: u64,
    pub message: String,
}

/// Creates a pending task.
///
/// # FFI contract
/// - `priority`: `high|medium|low`; empty or `None` means `medium`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_create(
    title: String,
    description: Option<String>,
    priority: Option<String>,
    deadline_ms: Option<i64>,
) -> ActionResponse {
    let priority = match parse_priority(priority.as_deref()) {
        Ok(priority) => priority,
        Err(message) => return ActionResponse::failure(message),
    };
    let new_task = NewTask {
        title,
        description,
        priority,
        deadline: deadline_ms,
    };
    match with_task_service(|service| service.create(&new_task)) {
        Ok(task) => ActionResponse::success("Task created.", Some(task.id.to_string())),
        Err(err) => ActionResponse::failure(format!("task_create failed: {err}")),
    }
}

/// Moves a completed task back to pending.
#[flutter_rust_bridge::frb(sync)]
pub fn task_reopen(task_id: String) -> ActionResponse {
    let id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(message) => return ActionResponse::failure(message),
    };
    match with_task_service(|service| service.reopen_task(id)) {
        Ok(task) => ActionResponse::success("Task reopened.", Some(task.id.to_string())),
        Err(err) => ActionResponse::failure(format!("task_reopen failed: {err}")),
    }
}

/// Marks a task completed; its pending reminders stop.
#[flutter_rust_bridge::frb(sync)]
pub fn task_complete(task_id: String) -> ActionResponse {
    let id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(message) => return ActionResponse::failure(message),
    };
    match with_task_service(|service| service.complete_task(id)) {
        Ok(task) => ActionResponse::success("Task completed.", Some(task.id.to_string())),
        Err(err) => ActionResponse::failure(format!("task_complete failed: {err}")),
    }
}

/// Deletes a task and its delivery history.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(task_id: String) -> ActionResponse {
    let id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(message) => return ActionResponse::failure(message),
    };
    match with_task_service(|service| service.delete_task(id)) {
        Ok(()) => ActionResponse::success("Task deleted.", Some(id.to_string())),
        Err(err) => ActionResponse::failure(format!("task_delete failed: {err}")),
    }
}

/// Lists tasks, optionally hiding completed ones.
///
/// # FFI contract
/// - `sort`: `latest|due_time|priority`; anything else means `latest`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list(include_completed: bool, sort: Option<String>) -> TaskListResponse {
    let query = TaskListQuery {
        status: (!include_completed).then_some(TaskStatus::Pending),
        sort: sort
            .as_deref()
            .map_or(TaskSort::default(), |code| TaskSort::parse_or_default(code.trim())),
        ..TaskListQuery::default()
    };
    match with_task_service(|service| service.list_tasks(&query)) {
        Ok(tasks) => {
            let items: Vec<TaskItem> = tasks.into_iter().map(to_task_item).collect();
            TaskListResponse {
                ok: true,
                message: format!("Found {} task(s).", items.len()),
                items,
            }
        }
        Err(err) => TaskListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("task_list failed: {err}"),
        },
    }
}

/// Runs one reminder cycle at `now_ms` and returns the new reminders.
///
/// # FFI contract
/// - The host drives the timer; a 30-60 s interval matches the UI polling.
/// - Returned reminders are already recorded as delivered.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_tick(now_ms: i64) -> ReminderTickResponse {
    let result = with_reminder_service(|service| service.tick(now_ms, &LogSink));
    match result {
        Ok(report) => ReminderTickResponse {
            ok: true,
            skipped: report.skipped,
            message: if report.skipped {
                "Reminders are disabled.".to_string()
            } else {
                format!("{} new reminder(s).", report.events.len())
            },
            reminders: report.events.into_iter().map(to_reminder_item).collect(),
        },
        Err(message) => {
            warn!("event=ffi_reminder_tick module=ffi status=error");
            ReminderTickResponse {
                ok: false,
                skipped: false,
                reminders: Vec::new(),
                message: format!("reminder_tick failed: {message}"),
            }
        }
    }
}

/// Turns the global reminder switch on or off.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_set_enabled(enabled: bool) -> ActionResponse {
    match with_reminder_service(|service| service.set_enabled(enabled)) {
        Ok(settings) if settings.enabled => ActionResponse::success("Reminders enabled.", None),
        Ok(_) => ActionResponse::success("Reminders disabled.", None),
        Err(message) => ActionResponse::failure(format!("reminder_set_enabled failed: {message}")),
    }
}

/// Purges expired delivery records and records of inactive tasks.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_collect_garbage(now_ms: i64) -> ActionResponse {
    match with_reminder_service(|service| service.collect_garbage(now_ms)) {
        Ok(removed) => ActionResponse::success(format!("Removed {removed} record(s)."), None),
        Err(message) => {
            ActionResponse::failure(format!("reminder_collect_garbage failed: {message}"))
        }
    }
}

/// Completion rate over the last `days` days.
#[flutter_rust_bridge::frb(sync)]
pub fn stats_completion(now_ms: i64, days: u32) -> StatsCompletionResponse {
    match with_stats_service(|service| service.completion(now_ms, days)) {
        Ok(stats) => StatsCompletionResponse {
            ok: true,
            overall: Some(to_rate_item("", stats.overall)),
            by_priority: stats
                .by_priority
                .into_iter()
                .map(|(priority, rate)| to_rate_item(priority.as_str(), rate))
                .collect(),
            message: format!("Completion over {days} day(s)."),
        },
        Err(message) => StatsCompletionResponse {
            ok: false,
            overall: None,
            by_priority: Vec::new(),
            message: format!("stats_completion failed: {message}"),
        },
    }
}

/// Daily created/finished counts for the last `days` calendar days.
///
/// # FFI contract
/// - `utc_offset_minutes`: the host's local offset, e.g. `480` for UTC+8.
#[flutter_rust_bridge::frb(sync)]
pub fn stats_trend(now_ms: i64, days: u32, utc_offset_minutes: i32) -> StatsTrendResponse {
    match with_stats_service(|service| service.trend(now_ms, days, utc_offset_minutes)) {
        Ok(points) => StatsTrendResponse {
            ok: true,
            message: format!("{} day(s).", points.len()),
            items: points
                .into_iter()
                .map(|point| TrendItem {
                    date: point.date.to_string(),
                    created: point.created,
                    finished: point.finished,
                })
                .collect(),
        },
        Err(message) => StatsTrendResponse {
            ok: false,
            items: Vec::new(),
            message: format!("stats_trend failed: {message}"),
        },
    }
}

/// Pending vs. completed task counts.
#[flutter_rust_bridge::frb(sync)]
pub fn stats_distribution() -> StatsDistributionResponse {
    match with_stats_service(|service| service.distribution()) {
        Ok(distribution) => StatsDistributionResponse {
            ok: true,
            pending: distribution.pending,
            completed: distribution.completed,
            message: String::new(),
        },
        Err(message) => StatsDistributionResponse {
            ok: false,
            pending: 0,
            completed: 0,
            message: format!("stats_distribution failed: {message}"),
        },
    }
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("TASKREMIND_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STORE_DB_FILE_NAME)
        })
        .clone()
}

fn parse_task_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid task id `{}`", raw.trim()))
}

fn parse_priority(raw: Option<&str>) -> Result<TaskPriority, String> {
    match raw.map(str::trim).filter(|code| !code.is_empty()) {
        None => Ok(TaskPriority::default()),
        Some(code) => TaskPriority::parse(code).ok_or_else(|| format!("invalid priority `{code}`")),
    }
}

fn with_task_service<T>(
    f: impl FnOnce(&TaskService<'_>) -> taskremind_core::RepoResult<T>,
) -> Result<T, String> {
    let conn = open_db(resolve_store_db_path()).map_err(|err| format!("store open failed: {err}"))?;
    let service = TaskService::new(&conn);
    f(&service).map_err(|err| err.to_string())
}

fn with_stats_service<T>(
    f: impl FnOnce(&StatsService<'_>) -> taskremind_core::StatsResult<T>,
) -> Result<T, String> {
    let conn = open_db(resolve_store_db_path()).map_err(|err| format!("store open failed: {err}"))?;
    let service = StatsService::new(&conn);
    f(&service).map_err(|err| err.to_string())
}

fn with_reminder_service<T>(
    f: impl FnOnce(&ReminderService<'_>) -> taskremind_core::ReminderServiceResult<T>,
) -> Result<T, String> {
    let conn = open_db(resolve_store_db_path()).map_err(|err| format!("store open failed: {err}"))?;
    let service = ReminderService::new(&conn);
    f(&service).map_err(|err| err.to_string())
}

fn to_task_item(task: Task) -> TaskItem {
    TaskItem {
        task_id: task.id.to_string(),
        priority: task.priority.as_str().to_string(),
        status: task.status.as_str().to_string(),
        title: task.title,
        description: task.description,
        deadline_ms: task.deadline,
        created_at_ms: task.created_at,
        finished_at_ms: task.finished_at,
    }
}

fn to_rate_item(priority: &str, rate: CompletionRate) -> CompletionRateItem {
    CompletionRateItem {
        priority: priority.to_string(),
        created: rate.created,
        finished: rate.finished,
        rate_percent: rate.rate_percent,
    }
}

fn to_reminder_item(event: ReminderEvent) -> ReminderItem {
    ReminderItem {
        task_id: event.task_id.to_string(),
        kind: event.kind.as_str().to_string(),
        title: event.title,
        message: event.message,
        due_at_ms: event.due_at,
        generated_at_ms: event.generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        configure_store, core_version, init_logging, ping, reminder_collect_garbage,
        reminder_set_enabled, reminder_tick, stats_distribution, stats_trend, task_complete,
        task_create, task_delete, task_list, task_reopen,
    };
    use taskremind_core::current_epoch_ms as now_ms;

    const MINUTE_MS: i64 = 60 * 1000;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn configure_store_rejects_empty_path() {
        assert!(!configure_store("  ".to_string()).is_empty());
    }

    #[test]
    fn task_create_rejects_blank_title() {
        let response = task_create("   ".to_string(), None, None, None);
        assert!(!response.ok);
        assert!(response.message.contains("blank"));
    }

    #[test]
    fn task_create_rejects_unknown_priority() {
        let response = task_create("x".to_string(), None, Some("urgent".to_string()), None);
        assert!(!response.ok);
        assert!(response.message.contains("invalid priority"));
    }

    #[test]
    fn stats_trend_rejects_bad_offset_and_returns_requested_days() {
        assert!(!stats_trend(now_ms(), 7, 20 * 60).ok);
        let trend = stats_trend(now_ms(), 7, 0);
        assert!(trend.ok, "{}", trend.message);
        assert_eq!(trend.items.len(), 7);
        assert_eq!(trend.items[6].date.len(), "yyyy-MM-dd".len());
    }

    #[test]
    fn task_complete_rejects_malformed_id() {
        let response = task_complete("not-a-uuid".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("invalid task id"));
    }

    #[test]
    fn created_task_is_listed_until_deleted() {
        let created = task_create(
            "bridge list".to_string(),
            Some("from dart".to_string()),
            Some("high".to_string()),
            Some(now_ms() + 60 * MINUTE_MS),
        );
        assert!(created.ok, "{}", created.message);
        let task_id = created.task_id.expect("create should return task_id");

        let listed = task_list(false, Some("priority".to_string()));
        assert!(listed.ok, "{}", listed.message);
        let item = listed
            .items
            .iter()
            .find(|item| item.task_id == task_id)
            .expect("created task should be listed");
        assert_eq!(item.priority, "high");
        assert_eq!(item.description.as_deref(), Some("from dart"));

        let completed = task_complete(task_id.clone());
        assert!(completed.ok, "{}", completed.message);
        assert!(!task_list(false, None)
            .items
            .iter()
            .any(|item| item.task_id == task_id));
        assert!(task_list(true, None).items.iter().any(|item| {
            item.task_id == task_id && item.status == "completed" && item.finished_at_ms.is_some()
        }));
        assert!(stats_distribution().completed >= 1);

        assert!(task_reopen(task_id.clone()).ok);
        assert!(task_list(false, None)
            .items
            .iter()
            .any(|item| item.task_id == task_id && item.finished_at_ms.is_none()));

        let deleted = task_delete(task_id.clone());
        assert!(deleted.ok, "{}", deleted.message);
        assert!(!task_delete(task_id).ok);
    }

    #[test]
    fn reminder_tick_returns_before_due_reminder_once() {
        assert!(reminder_set_enabled(true).ok);
        let now = now_ms();
        let created = task_create("bridge tick".to_string(), None, None, Some(now + 10 * MINUTE_MS));
        let task_id = created.task_id.expect("create should return task_id");

        let first = reminder_tick(now);
        assert!(first.ok, "{}", first.message);
        let reminder = first
            .reminders
            .iter()
            .find(|item| item.task_id == task_id)
            .expect("new task should be reminded");
        assert_eq!(reminder.kind, "before_due");
        assert_eq!(reminder.title, "bridge tick");

        let second = reminder_tick(now + 1);
        assert!(!second.reminders.iter().any(|item| item.task_id == task_id));

        assert!(reminder_collect_garbage(now).ok);
    }
}
