//! Notification sink contracts.
//!
//! # Responsibility
//! - Define the seam through which reminder events leave the core.
//! - Provide a log-backed sink and an in-memory sink for polling hosts.
//!
//! # Invariants
//! - A sink failure never un-delivers an event; the delivery log is written
//!   before any sink is called.

use crate::model::reminder::ReminderEvent;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;

/// Delivery failure reported by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    pub message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "notification delivery failed: {}", self.message)
    }
}

impl Error for SinkError {}

/// Platform-specific delivery target (desktop notification, banner, push).
pub trait NotificationSink {
    fn deliver(&self, event: &ReminderEvent) -> Result<(), SinkError>;
}

/// Sink that records each event as a metadata-only log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, event: &ReminderEvent) -> Result<(), SinkError> {
        info!(
            "event=reminder_delivered module=notify status=ok task_id={} kind={} due_at={} generated_at={}",
            event.task_id,
            event.kind.as_str(),
            event.due_at,
            event.generated_at
        );
        Ok(())
    }
}

/// Sink that buffers events until the host drains them.
#[derive(Debug, Default)]
pub struct MemorySink {
    pending: Mutex<Vec<ReminderEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every buffered event in delivery order.
    pub fn drain(&self) -> Vec<ReminderEvent> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        match self.pending.lock() {
            Ok(pending) => pending.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for MemorySink {
    fn deliver(&self, event: &ReminderEvent) -> Result<(), SinkError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| SinkError::new("memory sink lock poisoned"))?;
        pending.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySink, NotificationSink};
    use crate::model::reminder::{ReminderEvent, ReminderKind};
    use uuid::Uuid;

    fn event(kind: ReminderKind) -> ReminderEvent {
        ReminderEvent {
            task_id: Uuid::new_v4(),
            kind,
            due_at: 1_000,
            generated_at: 500,
            title: "pay rent".to_string(),
            message: kind.message(30),
        }
    }

    #[test]
    fn memory_sink_drains_in_order() {
        let sink = MemorySink::new();
        sink.deliver(&event(ReminderKind::BeforeDue)).unwrap();
        sink.deliver(&event(ReminderKind::Overdue)).unwrap();
        assert_eq!(sink.len(), 2);

        let drained = sink.drain();
        assert_eq!(drained[0].kind, ReminderKind::BeforeDue);
        assert_eq!(drained[1].kind, ReminderKind::Overdue);
        assert!(sink.is_empty());
    }
}
