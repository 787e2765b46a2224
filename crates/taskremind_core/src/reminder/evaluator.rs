//! Pure reminder evaluation.
//!
//! # Responsibility
//! - Map `(now, tasks, prior records, config)` to new events and records.
//!
//! # Invariants
//! - A completed task or a task without deadline never yields an event.
//! - At most one event per task per call, chosen in `ReminderKind::PRIORITY` order.
//! - A task with a record delivered exactly at `now` yields nothing, so a
//!   re-run at the same instant with merged records is a no-op. Records dated
//!   after `now` (clock skew) do not suppress a task.
//! - Window bounds: `BeforeDue` is `0 < ttd <= lead`, `AtDue` is
//!   `-tol <= ttd <= tol`, `Overdue` is `ttd < 0`.

use crate::model::reminder::{DeliveryRecord, ReminderEvent, ReminderKind};
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::model::EpochMs;
use crate::reminder::config::ReminderConfig;
use std::collections::HashMap;

/// Output of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Events to hand to the notification sink, in task snapshot order.
    pub events: Vec<ReminderEvent>,
    /// Records the caller must append to the delivery log.
    pub new_records: Vec<DeliveryRecord>,
}

impl Evaluation {
    /// `true` when nothing is due and the caller should skip the log write.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Per-task summary of the delivery log.
#[derive(Debug, Default)]
struct DeliveryHistory {
    before_due: bool,
    at_due: bool,
    overdue_count: u32,
    last_overdue: Option<EpochMs>,
    delivered_at: Vec<EpochMs>,
}

impl DeliveryHistory {
    fn record(&mut self, record: &DeliveryRecord) {
        match record.kind {
            ReminderKind::BeforeDue => self.before_due = true,
            ReminderKind::AtDue => self.at_due = true,
            ReminderKind::Overdue => {
                self.overdue_count = self.overdue_count.saturating_add(1);
                self.last_overdue = Some(
                    self.last_overdue
                        .map_or(record.delivered_at, |last| last.max(record.delivered_at)),
                );
            }
        }
        self.delivered_at.push(record.delivered_at);
    }

    fn delivered_at_instant(&self, now: EpochMs) -> bool {
        self.delivered_at.contains(&now)
    }
}

/// Computes the reminder events due at `now`.
///
/// Never mutates `prior_records`. When the result is empty the caller should
/// perform no write.
pub fn evaluate(
    now: EpochMs,
    tasks: &[Task],
    prior_records: &[DeliveryRecord],
    config: &ReminderConfig,
) -> Evaluation {
    let mut histories: HashMap<TaskId, DeliveryHistory> = HashMap::new();
    for record in prior_records {
        histories.entry(record.task_id).or_default().record(record);
    }

    let empty = DeliveryHistory::default();
    let mut evaluation = Evaluation::default();

    for task in tasks {
        if task.status == TaskStatus::Completed {
            continue;
        }
        let Some(deadline) = task.deadline else {
            continue;
        };

        let history = histories.get(&task.id).unwrap_or(&empty);
        if history.delivered_at_instant(now) {
            continue;
        }

        let time_to_deadline = deadline.saturating_sub(now);
        let Some(kind) = ReminderKind::PRIORITY
            .into_iter()
            .find(|kind| triggers(*kind, time_to_deadline, now, history, config))
        else {
            continue;
        };

        let event = ReminderEvent {
            task_id: task.id,
            kind,
            due_at: deadline,
            generated_at: now,
            title: task.title.clone(),
            message: kind.message(config.lead_minutes),
        };
        evaluation.new_records.push(event.to_record());
        evaluation.events.push(event);
    }

    evaluation
}

fn triggers(
    kind: ReminderKind,
    time_to_deadline: i64,
    now: EpochMs,
    history: &DeliveryHistory,
    config: &ReminderConfig,
) -> bool {
    match kind {
        ReminderKind::BeforeDue => {
            !history.before_due && time_to_deadline > 0 && time_to_deadline <= config.lead_ms()
        }
        ReminderKind::AtDue => {
            let tolerance = config.due_tolerance_ms();
            !history.at_due && (-tolerance..=tolerance).contains(&time_to_deadline)
        }
        ReminderKind::Overdue => {
            time_to_deadline < 0
                && history.overdue_count < config.max_overdue_repeats
                && history.last_overdue.map_or(true, |last| {
                    now.saturating_sub(last) >= config.overdue_interval_ms()
                })
        }
    }
}
