//! Reminder settings persistence over the `settings` key-value table.

use crate::model::current_epoch_ms;
use crate::reminder::config::{ReminderConfig, ReminderSettings};
use crate::repo::{with_transaction, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

const KEY_REMINDER_ENABLED: &str = "reminder.enabled";
const KEY_REMINDER_CONFIG: &str = "reminder.config";

pub trait SettingsRepository {
    /// Returns stored settings; absent keys fall back to defaults.
    fn load_reminder_settings(&self) -> RepoResult<ReminderSettings>;
    fn save_reminder_settings(&self, settings: &ReminderSettings) -> RepoResult<()>;
}

/// SQLite-backed settings repository.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn get_value(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1;", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }
}

fn put_value(conn: &Connection, key: &str, value: &str) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at;",
        params![key, value, current_epoch_ms()],
    )?;
    Ok(())
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn load_reminder_settings(&self) -> RepoResult<ReminderSettings> {
        let enabled = match self.get_value(KEY_REMINDER_ENABLED)?.as_deref() {
            None => ReminderSettings::default().enabled,
            Some("true") => true,
            Some("false") => false,
            Some(other) => {
                return Err(RepoError::InvalidData(format!(
                    "invalid boolean `{other}` in settings.{KEY_REMINDER_ENABLED}"
                )));
            }
        };

        let config = match self.get_value(KEY_REMINDER_CONFIG)? {
            None => ReminderConfig::default(),
            Some(json) => serde_json::from_str(&json).map_err(|err| {
                RepoError::InvalidData(format!(
                    "invalid json in settings.{KEY_REMINDER_CONFIG}: {err}"
                ))
            })?,
        };

        Ok(ReminderSettings { enabled, config })
    }

    fn save_reminder_settings(&self, settings: &ReminderSettings) -> RepoResult<()> {
        let config_json = serde_json::to_string(&settings.config).map_err(|err| {
            RepoError::InvalidData(format!("failed to encode reminder config: {err}"))
        })?;
        let enabled = if settings.enabled { "true" } else { "false" };
        with_transaction(self.conn, |conn| {
            put_value(conn, KEY_REMINDER_ENABLED, enabled)?;
            put_value(conn, KEY_REMINDER_CONFIG, &config_json)
        })
    }
}
