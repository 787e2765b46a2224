//! Task Store contracts and SQLite implementation.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - `list_tasks` order is deterministic for a given table state.
//! - `created_at` is written once on insert and never updated.

use crate::model::current_epoch_ms;
use crate::model::task::{Task, TaskId, TaskPriority, TaskStatus};
use crate::repo::{parse_task_id, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    uuid, title, description, priority, status, deadline, created_at, finished_at
FROM tasks";

/// Sort order for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSort {
    /// Newest first.
    #[default]
    Latest,
    /// Earliest deadline first; undated tasks last, newest first on ties.
    DueTime,
    /// Most urgent first, newest first on ties.
    Priority,
}

impl TaskSort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::DueTime => "due_time",
            Self::Priority => "priority",
        }
    }

    /// Parses a sort code; unknown codes fall back to [`TaskSort::Latest`].
    pub fn parse_or_default(value: &str) -> Self {
        match value {
            "due_time" => Self::DueTime,
            "priority" => Self::Priority,
            _ => Self::Latest,
        }
    }

    fn order_by_sql(self) -> &'static str {
        match self {
            Self::Latest => " ORDER BY created_at DESC, uuid ASC",
            Self::DueTime => {
                " ORDER BY deadline IS NULL, deadline ASC, created_at DESC, uuid ASC"
            }
            Self::Priority => {
                " ORDER BY CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
                    created_at DESC, uuid ASC"
            }
        }
    }
}

/// Query options for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub sort: TaskSort,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for task CRUD operations.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                uuid, title, description, priority, status, deadline,
                created_at, updated_at, finished_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                task.priority.as_str(),
                task.status.as_str(),
                task.deadline,
                task.created_at,
                task.finished_at,
            ],
        )?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                priority = ?3,
                status = ?4,
                deadline = ?5,
                finished_at = ?6,
                updated_at = ?7
             WHERE uuid = ?8;",
            params![
                task.title.as_str(),
                task.description.as_deref(),
                task.priority.as_str(),
                task.status.as_str(),
                task.deadline,
                task.finished_at,
                current_epoch_ms(),
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(priority) = query.priority {
            sql.push_str(" AND priority = ?");
            bind_values.push(Value::Text(priority.as_str().to_string()));
        }

        sql.push_str(query.sort.order_by_sql());

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_task_id(&uuid_text, "tasks.uuid")?;

    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let priority_text: String = row.get("priority")?;
    let priority = TaskPriority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid task priority `{priority_text}` in tasks.priority"
        ))
    })?;

    let task = Task {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        priority,
        status,
        deadline: row.get("deadline")?,
        created_at: row.get("created_at")?,
        finished_at: row.get("finished_at")?,
    };
    task.validate()?;
    Ok(task)
}
