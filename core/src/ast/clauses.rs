//! Clause building blocks: FROM, WITH, locking, ordering.

use crate::ast::{Expr, JoinKind, LockMode, Select, SortOrder, WaitMode};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// What a FROM entry reads from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableSource {
    /// Raw table name, optionally schema-qualified (`schema.table`)
    Table(String),
    /// Expression usable as a relation (table function, VALUES, ...)
    Expr(Expr),
    /// Nested SELECT
    Subquery(Box<Select>),
}

/// Join attached to a FROM entry after the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    /// Join condition; `None` for CROSS JOIN
    pub on: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromEntry {
    pub source: TableSource,
    pub alias: Option<String>,
    /// Explicit column names: `source AS alias(c1, c2)`
    #[serde(default)]
    pub columns: Vec<String>,
    /// `None` joins with a comma
    #[serde(default)]
    pub join: Option<Join>,
}

impl FromEntry {
    pub fn table(name: impl Into<String>) -> Self {
        Self::new(TableSource::Table(name.into()))
    }

    pub fn subquery(query: Select) -> Self {
        Self::new(TableSource::Subquery(Box::new(query)))
    }

    pub fn expr(expr: Expr) -> Self {
        Self::new(TableSource::Expr(expr))
    }

    pub fn new(source: TableSource) -> Self {
        Self {
            source,
            alias: None,
            columns: vec![],
            join: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn join(mut self, kind: JoinKind, on: Option<Expr>) -> Self {
        self.join = Some(Join { kind, on });
        self
    }

    /// Entry names its columns inline; some engines need a WITH rewrite.
    pub fn is_column_named(&self) -> bool {
        !self.columns.is_empty()
    }

    /// The name other clauses use to refer to this entry.
    pub fn reference_name(&self) -> Option<&str> {
        match (&self.alias, &self.source) {
            (Some(alias), _) => Some(alias),
            (None, TableSource::Table(name)) => Some(name),
            _ => None,
        }
    }
}

/// FROM clause: ordered entries, possibly empty (`SELECT 1`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FromClause {
    pub entries: Vec<FromEntry>,
}

impl FromClause {
    pub fn push(&mut self, entry: FromEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_column_named(&self) -> bool {
        self.entries.iter().any(FromEntry::is_column_named)
    }

    pub fn validate(&self) -> CoreResult<()> {
        for entry in &self.entries {
            match &entry.source {
                TableSource::Table(name) if name.trim().is_empty() => {
                    return Err(CoreError::invalid("FROM entry with empty table name"));
                }
                TableSource::Subquery(query) => query.validate()?,
                _ => {}
            }
            if entry.is_column_named() && entry.alias.is_none() {
                return Err(CoreError::invalid("column-named FROM entry without an alias"));
            }
        }
        if self.entries.first().is_some_and(|e| e.join.is_some()) {
            return Err(CoreError::invalid("first FROM entry cannot carry a join"));
        }
        Ok(())
    }
}

/// One common table expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithEntry {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    pub query: Box<Select>,
    #[serde(default)]
    pub recursive: bool,
}

impl WithEntry {
    pub fn new(name: impl Into<String>, query: Select) -> Self {
        Self {
            name: name.into(),
            columns: vec![],
            query: Box::new(query),
            recursive: false,
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WithClause {
    pub entries: Vec<WithEntry>,
}

impl WithClause {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_recursive(&self) -> bool {
        self.entries.iter().any(|e| e.recursive)
    }

    pub fn validate(&self) -> CoreResult<()> {
        for entry in &self.entries {
            if entry.name.trim().is_empty() {
                return Err(CoreError::invalid("WITH entry without a name"));
            }
            entry.query.validate()?;
        }
        Ok(())
    }
}

/// `FOR <mode> [OF <table>] [NOWAIT | SKIP LOCKED]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockingEntry {
    pub mode: LockMode,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub wait: WaitMode,
}

impl LockingEntry {
    pub fn new(mode: LockMode) -> Self {
        Self {
            mode,
            table: None,
            wait: WaitMode::Default,
        }
    }

    pub fn of(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn wait(mut self, wait: WaitMode) -> Self {
        self.wait = wait;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockingClause {
    pub entries: Vec<LockingEntry>,
}

impl LockingClause {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub expr: Expr,
    #[serde(default)]
    pub order: SortOrder,
}

/// Projected expression with optional alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_named_marker() {
        let mut from = FromClause::default();
        from.push(FromEntry::table("t").alias("a"));
        assert!(!from.has_column_named());

        from.push(FromEntry::table("u").alias("b").columns(["x", "y"]));
        assert!(from.has_column_named());
        assert!(from.entries[1].is_column_named());
        assert_eq!(from.entries[1].reference_name(), Some("b"));
        assert_eq!(from.entries[0].reference_name(), Some("a"));
    }
}
