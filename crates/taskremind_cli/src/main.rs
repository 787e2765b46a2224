//! Operator CLI for the task reminder core.
//!
//! # Responsibility
//! - Manage tasks and run reminder cycles against a SQLite store.
//! - Keep output line-oriented for quick local checks and scripting.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use taskremind_core::db::{open_db, Connection};
use taskremind_core::{
    current_epoch_ms as now_ms, init_logging, NewTask, NotificationSink, ReminderConfig,
    ReminderEvent, ReminderService, SinkError, StatsService, TaskListQuery, TaskPriority,
    TaskService, TaskSort, TaskStatus,
};
use uuid::Uuid;

const MINUTE_MS: i64 = 60 * 1000;

#[derive(Parser, Debug)]
#[command(name = "taskremind")]
#[command(author, version, about = "Task reminder store and scheduler", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// SQLite store path
    #[arg(long, global = true, env = "TASKREMIND_DB_PATH", default_value = "taskremind.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging stays off when unset
    #[arg(long, global = true, env = "TASKREMIND_LOG_DIR")]
    log_dir: Option<String>,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the core library is linked
    Ping,

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Run one reminder cycle and print new reminders
    Tick {
        /// Evaluation instant in epoch milliseconds (defaults to now)
        #[arg(long)]
        now: Option<i64>,
    },

    /// Purge expired and stale delivery records
    Gc {
        #[arg(long)]
        now: Option<i64>,
    },

    /// Show or change reminder settings
    #[command(subcommand)]
    Reminders(RemindersCommand),

    /// Print completion rate, daily trend and status split
    Stats {
        /// Trailing window in days
        #[arg(long, default_value_t = 7)]
        days: u32,
        /// Local UTC offset in minutes for the daily trend
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        utc_offset_minutes: i32,
        #[arg(long)]
        now: Option<i64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PriorityArg {
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for TaskPriority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::High => Self::High,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::Low => Self::Low,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Latest,
    Due,
    Priority,
}

impl From<SortArg> for TaskSort {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Latest => Self::Latest,
            SortArg::Due => Self::DueTime,
            SortArg::Priority => Self::Priority,
        }
    }
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Create a pending task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum, default_value_t = PriorityArg::Medium)]
        priority: PriorityArg,
        /// Deadline in epoch milliseconds
        #[arg(long, conflicts_with = "due_in")]
        deadline: Option<i64>,
        /// Deadline relative to now, in minutes
        #[arg(long, allow_hyphen_values = true)]
        due_in: Option<i64>,
    },
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(long)]
        all: bool,
        #[arg(long, value_enum, default_value_t = SortArg::Latest)]
        sort: SortArg,
    },
    /// Mark a task completed
    Done { id: Uuid },
    /// Move a completed task back to pending
    Reopen { id: Uuid },
    /// Delete a task
    Rm { id: Uuid },
}

#[derive(Subcommand, Debug)]
enum RemindersCommand {
    On,
    Off,
    Show,
    /// Replace the reminder policy with values from a TOML file
    LoadConfig { path: PathBuf },
}

/// Prints each reminder as one line on stdout.
struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn deliver(&self, event: &ReminderEvent) -> Result<(), SinkError> {
        println!(
            "reminder task_id={} kind={} due_at={} title={:?} message={:?}",
            event.task_id,
            event.kind.as_str(),
            event.due_at,
            event.title,
            event.message
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, log_dir).context("failed to initialize logging")?;
    }

    match cli.command {
        Command::Ping => {
            println!("taskremind_core ping={}", taskremind_core::ping());
            println!("taskremind_core version={}", taskremind_core::core_version());
            Ok(())
        }
        Command::Task(command) => run_task(&cli.db, command),
        Command::Tick { now } => {
            let conn = open_store(&cli.db)?;
            let report = ReminderService::new(&conn)
                .tick(now.unwrap_or_else(now_ms), &StdoutSink)
                .context("reminder tick failed")?;
            if report.skipped {
                println!("reminders disabled; tick skipped");
            } else {
                println!(
                    "tick events={} sink_failures={}",
                    report.events.len(),
                    report.sink_failures
                );
            }
            Ok(())
        }
        Command::Gc { now } => {
            let conn = open_store(&cli.db)?;
            let removed = ReminderService::new(&conn)
                .collect_garbage(now.unwrap_or_else(now_ms))
                .context("garbage collection failed")?;
            println!("removed={removed}");
            Ok(())
        }
        Command::Reminders(command) => run_reminders(&cli.db, command),
        Command::Stats {
            days,
            utc_offset_minutes,
            now,
        } => run_stats(&cli.db, now.unwrap_or_else(now_ms), days, utc_offset_minutes),
    }
}

fn run_task(db: &Path, command: TaskCommand) -> Result<()> {
    let conn = open_store(db)?;
    let service = TaskService::new(&conn);

    match command {
        TaskCommand::Add {
            title,
            description,
            priority,
            deadline,
            due_in,
        } => {
            let new_task = NewTask {
                title,
                description,
                priority: priority.into(),
                deadline: deadline.or_else(|| due_in.map(|minutes| deadline_in(now_ms(), minutes))),
            };
            let task = service.create(&new_task).context("failed to create task")?;
            println!("{}", task.id);
        }
        TaskCommand::List { all, sort } => {
            let query = TaskListQuery {
                status: (!all).then_some(TaskStatus::Pending),
                sort: sort.into(),
                ..TaskListQuery::default()
            };
            for task in service.list_tasks(&query).context("failed to list tasks")? {
                let deadline = task
                    .deadline
                    .map_or_else(|| "-".to_string(), |value| value.to_string());
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    task.id,
                    task.status.as_str(),
                    task.priority.as_str(),
                    deadline,
                    task.title
                );
            }
        }
        TaskCommand::Done { id } => {
            service
                .complete_task(id)
                .with_context(|| format!("failed to complete task {id}"))?;
        }
        TaskCommand::Reopen { id } => {
            service
                .reopen_task(id)
                .with_context(|| format!("failed to reopen task {id}"))?;
        }
        TaskCommand::Rm { id } => {
            service
                .delete_task(id)
                .with_context(|| format!("failed to delete task {id}"))?;
        }
    }
    Ok(())
}

fn run_reminders(db: &Path, command: RemindersCommand) -> Result<()> {
    let conn = open_store(db)?;
    let service = ReminderService::new(&conn);

    let settings = match command {
        RemindersCommand::On => service.set_enabled(true)?,
        RemindersCommand::Off => service.set_enabled(false)?,
        RemindersCommand::Show => service.settings()?,
        RemindersCommand::LoadConfig { path } => {
            let config = ReminderConfig::load_from_path(&path)?;
            service.update_config(config)?
        }
    };

    let config = settings.config;
    println!("enabled={}", settings.enabled);
    println!("lead_minutes={}", config.lead_minutes);
    println!("due_tolerance_minutes={}", config.due_tolerance_minutes);
    println!("overdue_interval_hours={}", config.overdue_interval_hours);
    println!("max_overdue_repeats={}", config.max_overdue_repeats);
    println!("retention_days={}", config.retention_days);
    Ok(())
}

fn run_stats(db: &Path, now: i64, days: u32, utc_offset_minutes: i32) -> Result<()> {
    let conn = open_store(db)?;
    let service = StatsService::new(&conn);

    let completion = service
        .completion(now, days)
        .context("failed to compute completion rate")?;
    println!(
        "completion days={days} created={} finished={} rate={:.1}%",
        completion.overall.created, completion.overall.finished, completion.overall.rate_percent
    );
    for (priority, rate) in &completion.by_priority {
        println!(
            "completion priority={} created={} finished={} rate={:.1}%",
            priority.as_str(),
            rate.created,
            rate.finished,
            rate.rate_percent
        );
    }

    for point in service
        .trend(now, days, utc_offset_minutes)
        .context("failed to compute trend")?
    {
        println!(
            "trend date={} created={} finished={}",
            point.date, point.created, point.finished
        );
    }

    let distribution = service
        .distribution()
        .context("failed to compute distribution")?;
    println!(
        "distribution pending={} completed={}",
        distribution.pending, distribution.completed
    );
    Ok(())
}

fn open_store(db: &Path) -> Result<Connection> {
    open_db(db).with_context(|| format!("failed to open store `{}`", db.display()))
}

/// Deadline `minutes` after `now`, clamped to the `i64` range.
fn deadline_in(now: i64, minutes: i64) -> i64 {
    now.saturating_add(minutes.saturating_mul(MINUTE_MS))
}

#[cfg(test)]
mod tests {
    use super::{deadline_in, Cli, MINUTE_MS};
    use clap::Parser;

    #[test]
    fn relative_deadline_saturates() {
        assert_eq!(deadline_in(1_000, 2), 1_000 + 2 * MINUTE_MS);
        assert_eq!(deadline_in(1_000, -1), 1_000 - MINUTE_MS);
        assert_eq!(deadline_in(1_000, i64::MAX), i64::MAX);
        assert_eq!(deadline_in(-1_000, i64::MIN), i64::MIN);
    }

    #[test]
    fn add_accepts_extreme_due_in() {
        let parsed = Cli::try_parse_from([
            "taskremind",
            "task",
            "add",
            "someday",
            "--due-in",
            "9223372036854775807",
        ]);
        assert!(parsed.is_ok());
    }
}
