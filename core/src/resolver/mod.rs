//! Dialect resolver for statement trees.
//!
//! One walker renders every dialect; wherever engines diverge the writer
//! matches on [`Dialect`]. Trees that an engine cannot express directly are
//! first rewritten into an owned copy (see `rewrite`), so the caller's tree
//! is never touched.
//!
//! Canonical clause order: WITH, keyword, select list, FROM/target, WHERE,
//! GROUP BY, HAVING, set operations, ORDER BY, paging, locking.

pub mod dialect;
mod dml;
mod expr;
mod functions;
mod literals;
mod locking;
mod rewrite;
mod types;
mod writer;

#[cfg(test)]
mod tests;

use crate::ast::{Delete, Insert, Select, Statement, Update, Value};
use crate::error::CoreResult;

pub use dialect::Dialect;
pub use functions::function_name;
pub use locking::locking_sql;
pub use types::type_name;
use writer::SqlWriter;

/// Rendered statement: SQL text plus parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Render a statement for `dialect`.
///
/// Fails with `UnsupportedConstruct` when a node has no rendering for the
/// dialect, or `InvalidStatement` when required parts are missing. No
/// partial text is ever returned.
pub fn resolve(dialect: Dialect, statement: &Statement) -> CoreResult<Resolved> {
    statement.validate()?;
    let mut w = SqlWriter::new(dialect);
    match statement {
        Statement::Select(s) => w.write_select(s)?,
        Statement::Update(u) => w.write_update(u)?,
        Statement::Delete(d) => w.write_delete(d)?,
        Statement::Insert(i) => w.write_insert(i)?,
    }
    Ok(w.finish())
}

/// Trait for converting statement nodes to SQL.
pub trait ToSql {
    fn resolve(&self, dialect: Dialect) -> CoreResult<Resolved>;

    /// SQL text only, discarding the parameter list.
    fn to_sql(&self, dialect: Dialect) -> CoreResult<String> {
        Ok(self.resolve(dialect)?.sql)
    }
}

impl ToSql for Statement {
    fn resolve(&self, dialect: Dialect) -> CoreResult<Resolved> {
        resolve(dialect, self)
    }
}

impl ToSql for Select {
    fn resolve(&self, dialect: Dialect) -> CoreResult<Resolved> {
        self.validate()?;
        let mut w = SqlWriter::new(dialect);
        w.write_select(self)?;
        Ok(w.finish())
    }
}

impl ToSql for Update {
    fn resolve(&self, dialect: Dialect) -> CoreResult<Resolved> {
        self.validate()?;
        let mut w = SqlWriter::new(dialect);
        w.write_update(self)?;
        Ok(w.finish())
    }
}

impl ToSql for Delete {
    fn resolve(&self, dialect: Dialect) -> CoreResult<Resolved> {
        self.validate()?;
        let mut w = SqlWriter::new(dialect);
        w.write_delete(self)?;
        Ok(w.finish())
    }
}

impl ToSql for Insert {
    fn resolve(&self, dialect: Dialect) -> CoreResult<Resolved> {
        self.validate()?;
        let mut w = SqlWriter::new(dialect);
        w.write_insert(self)?;
        Ok(w.finish())
    }
}
