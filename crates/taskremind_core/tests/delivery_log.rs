use taskremind_core::db::open_db_in_memory;
use taskremind_core::{
    DeliveryLogRepository, DeliveryRecord, ReminderConfig, ReminderKind, ReminderSettings,
    RepoError, SettingsRepository, SqliteDeliveryLogRepository, SqliteSettingsRepository,
};
use uuid::Uuid;

const NOW: i64 = 1_700_000_000_000;

fn record(kind: ReminderKind, delivered_at: i64) -> DeliveryRecord {
    DeliveryRecord {
        task_id: Uuid::new_v4(),
        kind,
        delivered_at,
    }
}

#[test]
fn append_and_load_preserve_delivery_order() {
    let conn = open_db_in_memory().unwrap();
    let log = SqliteDeliveryLogRepository::new(&conn);

    let later = record(ReminderKind::Overdue, NOW);
    let earlier = record(ReminderKind::BeforeDue, NOW - 5_000);
    log.append_records(&[later.clone(), earlier.clone()]).unwrap();

    assert_eq!(log.load_records().unwrap(), vec![earlier, later]);
}

#[test]
fn empty_append_is_a_noop() {
    let conn = open_db_in_memory().unwrap();
    let log = SqliteDeliveryLogRepository::new(&conn);

    log.append_records(&[]).unwrap();
    assert!(log.load_records().unwrap().is_empty());
}

#[test]
fn purge_before_removes_only_older_records() {
    let conn = open_db_in_memory().unwrap();
    let log = SqliteDeliveryLogRepository::new(&conn);

    let old = record(ReminderKind::AtDue, NOW - 10);
    let edge = record(ReminderKind::AtDue, NOW);
    log.append_records(&[old, edge.clone()]).unwrap();

    assert_eq!(log.purge_before(NOW).unwrap(), 1);
    assert_eq!(log.load_records().unwrap(), vec![edge]);
}

#[test]
fn replace_records_swaps_the_whole_log() {
    let conn = open_db_in_memory().unwrap();
    let log = SqliteDeliveryLogRepository::new(&conn);

    log.append_records(&[record(ReminderKind::AtDue, NOW), record(ReminderKind::AtDue, NOW)])
        .unwrap();
    let keep = record(ReminderKind::Overdue, NOW + 1);
    log.replace_records(std::slice::from_ref(&keep)).unwrap();

    assert_eq!(log.load_records().unwrap(), vec![keep]);
}

#[test]
fn corrupt_task_uuid_is_reported() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO reminder_deliveries (task_uuid, kind, delivered_at) VALUES ('nope', 'at_due', 0);",
        [],
    )
    .unwrap();

    let log = SqliteDeliveryLogRepository::new(&conn);
    assert!(matches!(log.load_records(), Err(RepoError::InvalidData(_))));
}

#[test]
fn settings_default_when_absent_and_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSettingsRepository::new(&conn);

    assert_eq!(
        repo.load_reminder_settings().unwrap(),
        ReminderSettings::default()
    );

    let custom = ReminderSettings {
        enabled: false,
        config: ReminderConfig {
            lead_minutes: 45,
            ..ReminderConfig::default()
        },
    };
    repo.save_reminder_settings(&custom).unwrap();
    repo.save_reminder_settings(&custom).unwrap();

    assert_eq!(repo.load_reminder_settings().unwrap(), custom);
}

#[test]
fn corrupt_settings_value_is_reported() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO settings (key, value) VALUES ('reminder.enabled', 'maybe');",
        [],
    )
    .unwrap();

    let repo = SqliteSettingsRepository::new(&conn);
    assert!(matches!(
        repo.load_reminder_settings(),
        Err(RepoError::InvalidData(message)) if message.contains("maybe")
    ));
}
