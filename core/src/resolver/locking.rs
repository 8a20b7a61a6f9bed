//! Row-locking clauses (`FOR UPDATE` and friends).

use super::Dialect;
use super::writer::SqlWriter;
use crate::ast::{LockMode, LockingClause, LockingEntry, WaitMode};
use crate::error::{CoreError, CoreResult};

/// Render one locking entry: `FOR <mode>[ OF <table>][ NOWAIT | SKIP LOCKED]`.
pub fn locking_sql(dialect: Dialect, entry: &LockingEntry) -> CoreResult<String> {
    if !dialect.supports_row_locking() {
        return Err(CoreError::unsupported(dialect, format!("FOR {}", entry.mode)));
    }

    let mode = match entry.mode {
        LockMode::Update => "UPDATE",
        LockMode::NoKeyUpdate => "NO KEY UPDATE",
        LockMode::Share => "SHARE",
        LockMode::KeyShare => "KEY SHARE",
        LockMode::Unknown => {
            return Err(CoreError::unsupported(dialect, "unknown lock mode"));
        }
    };

    let mut sql = format!("FOR {}", mode);
    if let Some(table) = &entry.table {
        sql.push_str(" OF ");
        sql.push_str(&dialect.quote_identifier(table));
    }
    match entry.wait {
        WaitMode::Default => {}
        WaitMode::NoWait => sql.push_str(" NOWAIT"),
        WaitMode::SkipLocked => sql.push_str(" SKIP LOCKED"),
        WaitMode::Unknown => {
            return Err(CoreError::unsupported(dialect, "unknown lock wait mode"));
        }
    }
    Ok(sql)
}

impl SqlWriter {
    pub(crate) fn write_locking(&mut self, locking: &LockingClause) -> CoreResult<()> {
        for entry in &locking.entries {
            let sql = locking_sql(self.dialect(), entry)?;
            self.push(" ");
            self.push(&sql);
        }
        Ok(())
    }
}
