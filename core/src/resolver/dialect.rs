//! Supported SQL dialects and their per-engine syntax rules.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// SQL reserved words that must be quoted when used as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "order",
    "group",
    "user",
    "table",
    "select",
    "from",
    "where",
    "join",
    "left",
    "right",
    "inner",
    "outer",
    "on",
    "and",
    "or",
    "not",
    "null",
    "true",
    "false",
    "limit",
    "offset",
    "as",
    "in",
    "is",
    "like",
    "between",
    "having",
    "union",
    "all",
    "distinct",
    "case",
    "when",
    "then",
    "else",
    "end",
    "create",
    "alter",
    "drop",
    "insert",
    "update",
    "delete",
    "index",
    "key",
    "primary",
    "foreign",
    "references",
    "default",
    "constraint",
    "check",
    "with",
    "for",
    "values",
    "set",
    "using",
];

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    Postgres,
    Sqlite,
    /// T-SQL engines (SQL Server, Azure SQL)
    SqlServer,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "PostgreSQL"),
            Dialect::Sqlite => write!(f, "SQLite"),
            Dialect::SqlServer => write!(f, "SQL Server"),
        }
    }
}

impl Dialect {
    /// Quote an identifier if it's a reserved word or contains special chars.
    /// Dotted identifiers (`schema.table`) are quoted per part.
    pub fn quote_identifier(&self, name: &str) -> String {
        if name.contains('.') {
            return name
                .split('.')
                .map(|part| self.quote_single(part))
                .collect::<Vec<_>>()
                .join(".");
        }
        self.quote_single(name)
    }

    fn quote_single(&self, name: &str) -> String {
        let lower = name.to_lowercase();
        let needs_escaping = name.is_empty()
            || RESERVED_WORDS.contains(&lower.as_str())
            || name.chars().any(|c| !c.is_alphanumeric() && c != '_')
            || name.chars().next().is_some_and(|c| c.is_numeric());

        if !needs_escaping {
            return name.to_string();
        }
        match self {
            Dialect::SqlServer => format!("[{}]", name.replace(']', "]]")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Parameter placeholder for the 1-based `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::Sqlite => "?".to_string(),
            Dialect::SqlServer => format!("@p{}", index),
        }
    }

    pub fn bool_literal(&self, val: bool) -> &'static str {
        match (self, val) {
            (Dialect::Postgres, true) => "true",
            (Dialect::Postgres, false) => "false",
            (_, true) => "1",
            (_, false) => "0",
        }
    }

    pub fn concat_operator(&self) -> &'static str {
        match self {
            Dialect::SqlServer => "+",
            Dialect::Postgres | Dialect::Sqlite => "||",
        }
    }

    /// `SELECT ... FOR UPDATE` and friends.
    pub fn supports_row_locking(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// `FROM t AS a(c1, c2)`; engines without it get a WITH rewrite.
    pub fn supports_inline_column_aliases(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Whether UPDATE/DELETE targets may carry an alias in their own position.
    pub fn allows_dml_target_alias(&self) -> bool {
        !matches!(self, Dialect::Sqlite)
    }

    /// Whether INSERT targets may carry an alias (`INSERT INTO t AS a`).
    pub fn allows_insert_target_alias(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// `DELETE ... USING <sources>`
    pub fn supports_delete_using(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// `value::type` instead of `CAST(value AS type)`.
    pub fn supports_postfix_cast(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// `TIMESTAMP '...'`, `DATE '...'` typed literals.
    pub fn has_typed_datetime_literals(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Server-side scrollable cursors (`DECLARE ... SCROLL CURSOR`).
    pub fn supports_scroll_cursors(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Cheapest statement that still makes a server round-trip.
    pub fn keepalive_sql(&self) -> &'static str {
        "SELECT 1"
    }

    /// Scalar query returning the server backend id, if the engine has one.
    pub fn process_id_sql(&self) -> Option<&'static str> {
        match self {
            Dialect::Postgres => Some("SELECT pg_backend_pid()"),
            Dialect::SqlServer => Some("SELECT @@SPID"),
            Dialect::Sqlite => None,
        }
    }

    /// Subscribe the session to a notification channel.
    pub fn listen_sql(&self, channel: &str) -> CoreResult<String> {
        match self {
            Dialect::Postgres => Ok(format!("LISTEN {}", self.quote_identifier(channel))),
            _ => Err(CoreError::unsupported(*self, "LISTEN")),
        }
    }

    pub fn unlisten_sql(&self, channel: &str) -> CoreResult<String> {
        match self {
            Dialect::Postgres => Ok(format!("UNLISTEN {}", self.quote_identifier(channel))),
            _ => Err(CoreError::unsupported(*self, "UNLISTEN")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(Dialect::Postgres.quote_identifier("users"), "users");
        assert_eq!(Dialect::Postgres.quote_identifier("user"), "\"user\"");
        assert_eq!(Dialect::Sqlite.quote_identifier("order"), "\"order\"");
        assert_eq!(Dialect::SqlServer.quote_identifier("order"), "[order]");
        assert_eq!(Dialect::SqlServer.quote_identifier("a]b"), "[a]]b]");
        assert_eq!(
            Dialect::Postgres.quote_identifier("public.user"),
            "public.\"user\""
        );
        assert_eq!(Dialect::Postgres.quote_identifier("1st"), "\"1st\"");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Postgres.placeholder(2), "$2");
        assert_eq!(Dialect::Sqlite.placeholder(2), "?");
        assert_eq!(Dialect::SqlServer.placeholder(2), "@p2");
    }

    #[test]
    fn test_listen_only_on_postgres() {
        assert_eq!(
            Dialect::Postgres.listen_sql("orders").unwrap(),
            "LISTEN orders"
        );
        assert!(Dialect::Sqlite.listen_sql("orders").is_err());
    }
}
