//! Reminder kinds, events and delivery records.
//!
//! # Invariants
//! - One `DeliveryRecord` exists per delivered `ReminderEvent`.
//! - `Overdue` may have several records per task, bounded by config.

use crate::model::task::TaskId;
use crate::model::EpochMs;
use serde::{Deserialize, Serialize};

/// Reminder categories, listed in evaluation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Deadline is inside the lead window and still ahead.
    BeforeDue,
    /// Deadline is within the tolerance window around now.
    AtDue,
    /// Deadline has passed; repeats at the overdue interval.
    Overdue,
}

impl ReminderKind {
    /// Priority order used when more than one kind triggers.
    pub const PRIORITY: [ReminderKind; 3] = [Self::BeforeDue, Self::AtDue, Self::Overdue];

    /// Stable storage code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeDue => "before_due",
            Self::AtDue => "at_due",
            Self::Overdue => "overdue",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "before_due" => Some(Self::BeforeDue),
            "at_due" => Some(Self::AtDue),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }

    /// Default user-facing text for this kind.
    pub fn message(self, lead_minutes: u32) -> String {
        match self {
            Self::BeforeDue => format!("Task is due within {lead_minutes} minutes"),
            Self::AtDue => "Task is due now".to_string(),
            Self::Overdue => "Task is overdue".to_string(),
        }
    }
}

/// One entry of the delivery log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub task_id: TaskId,
    pub kind: ReminderKind,
    pub delivered_at: EpochMs,
}

/// Unit handed to a notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEvent {
    pub task_id: TaskId,
    pub kind: ReminderKind,
    pub due_at: EpochMs,
    pub generated_at: EpochMs,
    /// Task title at evaluation time.
    pub title: String,
    pub message: String,
}

impl ReminderEvent {
    /// Log record matching this event.
    pub fn to_record(&self) -> DeliveryRecord {
        DeliveryRecord {
            task_id: self.task_id,
            kind: self.kind,
            delivered_at: self.generated_at,
        }
    }
}
