//! Reminder policy configuration.
//!
//! Every field has a default, so a TOML or JSON document may override any
//! subset of them.

use crate::reminder::retention::DEFAULT_RETENTION_DAYS;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Window sizes and repeat policy for reminder evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Lead window before the deadline for `BeforeDue`.
    pub lead_minutes: u32,
    /// Symmetric tolerance around the deadline for `AtDue`.
    pub due_tolerance_minutes: u32,
    /// Minimum spacing between `Overdue` repeats.
    pub overdue_interval_hours: u32,
    /// Upper bound on `Overdue` deliveries per task.
    pub max_overdue_repeats: u32,
    /// Delivery records older than this are purged.
    pub retention_days: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            lead_minutes: 30,
            due_tolerance_minutes: 1,
            overdue_interval_hours: 24,
            max_overdue_repeats: 3,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl ReminderConfig {
    pub fn lead_ms(&self) -> i64 {
        i64::from(self.lead_minutes) * MS_PER_MINUTE
    }

    pub fn due_tolerance_ms(&self) -> i64 {
        i64::from(self.due_tolerance_minutes) * MS_PER_MINUTE
    }

    pub fn overdue_interval_ms(&self) -> i64 {
        i64::from(self.overdue_interval_hours) * MS_PER_HOUR
    }

    pub fn retention_ms(&self) -> i64 {
        i64::from(self.retention_days) * MS_PER_DAY
    }

    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|err| ConfigError::Parse {
            path: None,
            message: err.to_string(),
        })
    }

    /// Reads and parses a TOML config file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            source: err,
        })?;
        toml::from_str(&source).map_err(|err| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            message: err.to_string(),
        })
    }
}

/// User-facing reminder settings persisted by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// Global switch; when off, ticks evaluate nothing.
    pub enabled: bool,
    pub config: ReminderConfig,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            config: ReminderConfig::default(),
        }
    }
}

/// Config loading failures.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: Option<PathBuf>,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse {
                path: Some(path),
                message,
            } => write!(f, "invalid config `{}`: {message}", path.display()),
            Self::Parse {
                path: None,
                message,
            } => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ReminderConfig};
    use crate::reminder::retention::DEFAULT_RETENTION_DAYS;

    #[test]
    fn defaults_match_canonical_policy() {
        let config = ReminderConfig::default();
        assert_eq!(config.lead_ms(), 30 * 60 * 1000);
        assert_eq!(config.due_tolerance_ms(), 60 * 1000);
        assert_eq!(config.overdue_interval_ms(), 24 * 3600 * 1000);
        assert_eq!(config.max_overdue_repeats, 3);
        assert_eq!(config.retention_ms(), 7 * 86_400 * 1000);
        assert_eq!(config.retention_days, DEFAULT_RETENTION_DAYS);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = ReminderConfig::from_toml_str("lead_minutes = 10\nmax_overdue_repeats = 5\n")
            .expect("partial config should parse");
        assert_eq!(config.lead_minutes, 10);
        assert_eq!(config.max_overdue_repeats, 5);
        assert_eq!(config.due_tolerance_minutes, 1);
        assert_eq!(config.overdue_interval_hours, 24);
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = ReminderConfig::from_toml_str("lead_minutes = \"soon\"")
            .expect_err("string lead should be rejected");
        assert!(matches!(err, ConfigError::Parse { path: None, .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReminderConfig::load_from_path(dir.path().join("absent.toml"))
            .expect_err("missing file should fail");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.toml");
        std::fs::write(&path, "overdue_interval_hours = 12\n").unwrap();

        let config = ReminderConfig::load_from_path(&path).unwrap();
        assert_eq!(config.overdue_interval_hours, 12);
        assert_eq!(config.lead_minutes, 30);
    }
}
