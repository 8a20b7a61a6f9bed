//! Row-locking clause rendering and rejection.

use crate::ast::*;
use crate::error::CoreError;
use crate::resolver::{Dialect, ToSql, locking_sql};
use pretty_assertions::assert_eq;

#[test]
fn test_postgres_locking_grid() {
    let modes = [
        (LockMode::Update, "FOR UPDATE"),
        (LockMode::NoKeyUpdate, "FOR NO KEY UPDATE"),
        (LockMode::Share, "FOR SHARE"),
        (LockMode::KeyShare, "FOR KEY SHARE"),
    ];
    let waits = [
        (WaitMode::Default, ""),
        (WaitMode::NoWait, " NOWAIT"),
        (WaitMode::SkipLocked, " SKIP LOCKED"),
    ];
    for (mode, mode_sql) in modes {
        for (wait, wait_sql) in waits {
            let entry = LockingEntry::new(mode).wait(wait);
            assert_eq!(
                locking_sql(Dialect::Postgres, &entry).unwrap(),
                format!("{}{}", mode_sql, wait_sql)
            );

            let entry = entry.of("jobs");
            assert_eq!(
                locking_sql(Dialect::Postgres, &entry).unwrap(),
                format!("{} OF jobs{}", mode_sql, wait_sql)
            );
        }
    }
}

#[test]
fn test_locking_renders_after_paging() {
    let q = Select::from_table("jobs")
        .filter(col("state").eq("queued"))
        .limit(1)
        .lock(LockingEntry::new(LockMode::Update).wait(WaitMode::SkipLocked));
    assert_eq!(
        q.to_sql(Dialect::Postgres).unwrap(),
        "SELECT * FROM jobs WHERE state = 'queued' LIMIT 1 FOR UPDATE SKIP LOCKED"
    );
}

#[test]
fn test_multiple_locking_entries() {
    let q = Select::from_table("a")
        .lock(LockingEntry::new(LockMode::Update).of("a"))
        .lock(LockingEntry::new(LockMode::Share).of("b").wait(WaitMode::NoWait));
    assert_eq!(
        q.to_sql(Dialect::Postgres).unwrap(),
        "SELECT * FROM a FOR UPDATE OF a FOR SHARE OF b NOWAIT"
    );
}

#[test]
fn test_locking_rejected_off_postgres() {
    let q = Select::from_table("t").lock(LockingEntry::new(LockMode::Update));
    for dialect in [Dialect::Sqlite, Dialect::SqlServer] {
        let err = q.to_sql(dialect).unwrap_err();
        assert_eq!(err, CoreError::unsupported(dialect, "FOR UPDATE"));
    }
}

#[test]
fn test_unknown_modes_rejected() {
    let entry: LockingEntry =
        serde_json::from_str(r#"{"mode":"Exclusive","table":null,"wait":"Default"}"#).unwrap();
    assert_eq!(entry.mode, LockMode::Unknown);
    let err = locking_sql(Dialect::Postgres, &entry).unwrap_err();
    assert!(err.is_unsupported());

    let entry: LockingEntry =
        serde_json::from_str(r#"{"mode":"Update","wait":"WaitForever"}"#).unwrap();
    assert_eq!(entry.wait, WaitMode::Unknown);
    let q = Select::from_table("t").lock(entry);
    assert!(q.to_sql(Dialect::Postgres).unwrap_err().is_unsupported());
}
