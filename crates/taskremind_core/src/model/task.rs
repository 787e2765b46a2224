//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record owned by the Task Store.
//! - Provide lifecycle helpers for completion state.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is never blank and at most `TITLE_MAX_CHARS` characters.
//! - `finished_at` is set exactly when the task is `Completed`.
//! - A `Completed` task never produces reminder events.

use crate::model::{current_epoch_ms, EpochMs};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for tasks.
pub type TaskId = Uuid;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Still actionable; eligible for reminders.
    Pending,
    /// Done; never reminded again.
    Completed,
}

impl TaskStatus {
    /// Stable storage code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// Parses a storage code produced by [`TaskStatus::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 50;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Task urgency. Ordered from most to least urgent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl TaskPriority {
    /// All priorities from most to least urgent.
    pub const ALL: [TaskPriority; 3] = [Self::High, Self::Medium, Self::Low];

    /// Stable storage code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Validation failures for task writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    NilId,
    EmptyTitle,
    TitleTooLong { max_chars: usize },
    DescriptionTooLong { max_chars: usize },
    /// `finished_at` disagrees with `status`.
    FinishedAtMismatch,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
            Self::EmptyTitle => write!(f, "task title must not be blank"),
            Self::TitleTooLong { max_chars } => {
                write!(f, "task title must not exceed {max_chars} characters")
            }
            Self::DescriptionTooLong { max_chars } => {
                write!(f, "task description must not exceed {max_chars} characters")
            }
            Self::FinishedAtMismatch => {
                write!(f, "finished_at must be set exactly when the task is completed")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Task as seen by the reminder engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub status: TaskStatus,
    /// `None` means the task never triggers reminders.
    pub deadline: Option<EpochMs>,
    #[serde(default)]
    pub created_at: EpochMs,
    /// When the task was last completed; cleared on reopen.
    #[serde(default)]
    pub finished_at: Option<EpochMs>,
}

impl Task {
    /// Creates a pending task with a generated ID.
    pub fn new(title: impl Into<String>, deadline: Option<EpochMs>) -> Self {
        Self::with_id(Uuid::new_v4(), title, deadline)
    }

    /// Creates a pending task with a caller-provided ID, stamped with the
    /// current clock.
    ///
    /// Does not validate; call [`Task::validate`] before persisting.
    pub fn with_id(id: TaskId, title: impl Into<String>, deadline: Option<EpochMs>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            priority: TaskPriority::default(),
            status: TaskStatus::Pending,
            deadline,
            created_at: current_epoch_ms(),
            finished_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        if self.title.chars().count() > TITLE_MAX_CHARS {
            return Err(TaskValidationError::TitleTooLong {
                max_chars: TITLE_MAX_CHARS,
            });
        }
        if self
            .description
            .as_deref()
            .is_some_and(|text| text.chars().count() > DESCRIPTION_MAX_CHARS)
        {
            return Err(TaskValidationError::DescriptionTooLong {
                max_chars: DESCRIPTION_MAX_CHARS,
            });
        }
        if (self.status == TaskStatus::Completed) != self.finished_at.is_some() {
            return Err(TaskValidationError::FinishedAtMismatch);
        }
        Ok(())
    }

    /// Marks the task completed at `at`.
    pub fn complete(&mut self, at: EpochMs) {
        self.status = TaskStatus::Completed;
        self.finished_at = Some(at);
    }

    pub fn reopen(&mut self) {
        self.status = TaskStatus::Pending;
        self.finished_at = None;
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskPriority, TaskStatus, TaskValidationError, TITLE_MAX_CHARS};
    use uuid::Uuid;

    #[test]
    fn new_task_starts_pending() {
        let task = Task::new("write report", Some(1_700_000_000_000));
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.is_pending());
        assert!(task.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_title_and_nil_id() {
        let blank = Task::new("   ", None);
        assert_eq!(blank.validate(), Err(TaskValidationError::EmptyTitle));

        let nil = Task::with_id(Uuid::nil(), "title", None);
        assert_eq!(nil.validate(), Err(TaskValidationError::NilId));
    }

    #[test]
    fn validate_enforces_length_limits() {
        let long_title = Task::new("x".repeat(TITLE_MAX_CHARS + 1), None);
        assert!(matches!(
            long_title.validate(),
            Err(TaskValidationError::TitleTooLong { .. })
        ));

        let mut wordy = Task::new("notes", None);
        wordy.description = Some("é".repeat(500));
        assert!(wordy.validate().is_ok());
        wordy.description = Some("é".repeat(501));
        assert!(matches!(
            wordy.validate(),
            Err(TaskValidationError::DescriptionTooLong { max_chars: 500 })
        ));
    }

    #[test]
    fn complete_and_reopen_track_finished_at() {
        let mut task = Task::new("ship", None);
        assert_eq!(task.priority, TaskPriority::Medium);

        task.complete(1_700_000_000_123);
        assert_eq!(task.finished_at, Some(1_700_000_000_123));
        assert!(task.validate().is_ok());

        task.reopen();
        assert_eq!(task.finished_at, None);
        assert!(task.is_pending());

        task.finished_at = Some(1);
        assert_eq!(task.validate(), Err(TaskValidationError::FinishedAtMismatch));
    }

    #[test]
    fn priority_codes_parse_back_and_sort_by_urgency() {
        for priority in TaskPriority::ALL {
            assert_eq!(TaskPriority::parse(priority.as_str()), Some(priority));
        }
        assert!(TaskPriority::High < TaskPriority::Low);
        assert_eq!(TaskPriority::parse("urgent"), None);
    }

    #[test]
    fn status_codes_parse_back() {
        for status in [TaskStatus::Pending, TaskStatus::Completed] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("done"), None);
    }
}
