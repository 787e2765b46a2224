//! Task use-case service.
//!
//! # Responsibility
//! - Provide task lifecycle entry points for host callers.
//! - Invalidate delivery records when a task leaves the reminder cycle.
//!
//! # Invariants
//! - Completing, rescheduling or deleting a task drops its delivery records.
//! - The task write and the record drop commit together or not at all.
//! - Service APIs never bypass repository validation.

use crate::model::current_epoch_ms;
use crate::model::task::{Task, TaskId, TaskPriority};
use crate::model::EpochMs;
use crate::repo::delivery_repo::{DeliveryLogRepository, SqliteDeliveryLogRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
use crate::repo::{with_transaction, RepoError, RepoResult};
use log::info;
use rusqlite::Connection;

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub deadline: Option<EpochMs>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Use-case service for task CRUD over one SQLite connection.
pub struct TaskService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> TaskService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a pending medium-priority task and returns its stable ID.
    pub fn create_task(
        &self,
        title: impl Into<String>,
        deadline: Option<EpochMs>,
    ) -> RepoResult<TaskId> {
        let new_task = NewTask {
            deadline,
            ..NewTask::new(title)
        };
        Ok(self.create(&new_task)?.id)
    }

    /// Creates a pending task from `new_task`.
    pub fn create(&self, new_task: &NewTask) -> RepoResult<Task> {
        let mut task = Task::new(new_task.title.trim(), new_task.deadline);
        task.description = new_task
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned);
        task.priority = new_task.priority;

        SqliteTaskRepository::new(self.conn).create_task(&task)?;
        info!(
            "event=task_create module=service status=ok task_id={} priority={} has_deadline={}",
            task.id,
            task.priority.as_str(),
            task.deadline.is_some()
        );
        Ok(task)
    }

    pub fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        SqliteTaskRepository::new(self.conn).get_task(id)
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        SqliteTaskRepository::new(self.conn).list_tasks(query)
    }

    /// Marks a task completed now and drops its delivery records.
    pub fn complete_task(&self, id: TaskId) -> RepoResult<Task> {
        self.complete_task_at(id, current_epoch_ms())
    }

    /// Marks a task completed at `finished_at` and drops its delivery records.
    pub fn complete_task_at(&self, id: TaskId, finished_at: EpochMs) -> RepoResult<Task> {
        let (task, dropped) = with_transaction(self.conn, |conn| {
            let task = update_with(conn, id, |task| task.complete(finished_at))?;
            let dropped = SqliteDeliveryLogRepository::new(conn).delete_records_for_task(id)?;
            Ok((task, dropped))
        })?;
        info!("event=task_complete module=service status=ok task_id={id} dropped_records={dropped}");
        Ok(task)
    }

    /// Moves a completed task back to pending and clears its finish time.
    pub fn reopen_task(&self, id: TaskId) -> RepoResult<Task> {
        with_transaction(self.conn, |conn| update_with(conn, id, Task::reopen))
    }

    /// Replaces the deadline and restarts the reminder cycle.
    pub fn reschedule_task(&self, id: TaskId, deadline: Option<EpochMs>) -> RepoResult<Task> {
        with_transaction(self.conn, |conn| {
            let task = update_with(conn, id, |task| task.deadline = deadline)?;
            SqliteDeliveryLogRepository::new(conn).delete_records_for_task(id)?;
            Ok(task)
        })
    }

    pub fn rename_task(&self, id: TaskId, title: impl Into<String>) -> RepoResult<Task> {
        let title = title.into();
        with_transaction(self.conn, |conn| {
            update_with(conn, id, |task| task.title = title)
        })
    }

    /// Replaces the description; blank text clears it.
    pub fn describe_task(&self, id: TaskId, description: Option<String>) -> RepoResult<Task> {
        let description = description
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());
        with_transaction(self.conn, |conn| {
            update_with(conn, id, |task| task.description = description)
        })
    }

    pub fn set_priority(&self, id: TaskId, priority: TaskPriority) -> RepoResult<Task> {
        with_transaction(self.conn, |conn| {
            update_with(conn, id, |task| task.priority = priority)
        })
    }

    /// Hard-deletes a task and its delivery records.
    pub fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let dropped = with_transaction(self.conn, |conn| {
            SqliteTaskRepository::new(conn).delete_task(id)?;
            SqliteDeliveryLogRepository::new(conn).delete_records_for_task(id)
        })?;
        info!("event=task_delete module=service status=ok task_id={id} dropped_records={dropped}");
        Ok(())
    }
}

fn update_with(conn: &Connection, id: TaskId, edit: impl FnOnce(&mut Task)) -> RepoResult<Task> {
    let repo = SqliteTaskRepository::new(conn);
    let mut task = repo.get_task(id)?.ok_or(RepoError::NotFound(id))?;
    edit(&mut task);
    repo.update_task(&task)?;
    Ok(task)
}
