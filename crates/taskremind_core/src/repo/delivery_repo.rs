//! Delivery Log Store contracts and SQLite implementation.
//!
//! # Invariants
//! - Appends are atomic: either every record of a batch lands or none does.
//! - An empty batch performs no write.
//! - `load_records` returns records in delivery order.

use crate::model::reminder::{DeliveryRecord, ReminderKind};
use crate::model::task::TaskId;
use crate::model::EpochMs;
use crate::repo::{parse_task_id, with_transaction, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

/// Persisted log of delivered reminders.
pub trait DeliveryLogRepository {
    fn load_records(&self) -> RepoResult<Vec<DeliveryRecord>>;
    fn append_records(&self, records: &[DeliveryRecord]) -> RepoResult<()>;
    /// Replaces the whole log with `records`.
    fn replace_records(&self, records: &[DeliveryRecord]) -> RepoResult<()>;
    /// Deletes records delivered strictly before `cutoff`; returns the count.
    fn purge_before(&self, cutoff: EpochMs) -> RepoResult<usize>;
    fn delete_records_for_task(&self, task_id: TaskId) -> RepoResult<usize>;
}

/// SQLite-backed delivery log.
pub struct SqliteDeliveryLogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDeliveryLogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DeliveryLogRepository for SqliteDeliveryLogRepository<'_> {
    fn load_records(&self) -> RepoResult<Vec<DeliveryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT task_uuid, kind, delivered_at
             FROM reminder_deliveries
             ORDER BY delivered_at ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn append_records(&self, records: &[DeliveryRecord]) -> RepoResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        with_transaction(self.conn, |conn| insert_records(conn, records))
    }

    fn replace_records(&self, records: &[DeliveryRecord]) -> RepoResult<()> {
        with_transaction(self.conn, |conn| {
            conn.execute("DELETE FROM reminder_deliveries;", [])?;
            insert_records(conn, records)
        })
    }

    fn purge_before(&self, cutoff: EpochMs) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM reminder_deliveries WHERE delivered_at < ?1;",
            [cutoff],
        )?;
        Ok(removed)
    }

    fn delete_records_for_task(&self, task_id: TaskId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM reminder_deliveries WHERE task_uuid = ?1;",
            [task_id.to_string()],
        )?;
        Ok(removed)
    }
}

fn insert_records(conn: &Connection, records: &[DeliveryRecord]) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO reminder_deliveries (task_uuid, kind, delivered_at) VALUES (?1, ?2, ?3);",
    )?;
    for record in records {
        stmt.execute(params![
            record.task_id.to_string(),
            record.kind.as_str(),
            record.delivered_at,
        ])?;
    }
    Ok(())
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<DeliveryRecord> {
    let uuid_text: String = row.get("task_uuid")?;
    let task_id = parse_task_id(&uuid_text, "reminder_deliveries.task_uuid")?;

    let kind_text: String = row.get("kind")?;
    let kind = ReminderKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid reminder kind `{kind_text}` in reminder_deliveries.kind"
        ))
    })?;

    Ok(DeliveryRecord {
        task_id,
        kind,
        delivered_at: row.get("delivered_at")?,
    })
}
