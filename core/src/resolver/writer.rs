//! Output buffer shared by every rendering rule.
//!
//! Rendering methods are split across modules as `impl SqlWriter` blocks:
//! - `expr.rs` - expressions and operators
//! - `literals.rs` - inline values, date/time formats
//! - `functions.rs` - canonical function aliasing
//! - `locking.rs` - FOR UPDATE / SHARE
//! - `dml/` - SELECT, UPDATE, DELETE, INSERT

use super::{Dialect, Resolved};
use crate::ast::Value;
use crate::error::CoreResult;

pub(crate) struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
    /// Statement nesting level; 0 while writing the outermost statement.
    depth: usize,
}

impl SqlWriter {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::with_capacity(256),
            params: Vec::new(),
            depth: 0,
        }
    }

    pub(crate) fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn is_nested(&self) -> bool {
        self.depth > 0
    }

    /// Run `f` one statement level deeper.
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CoreResult<T>,
    ) -> CoreResult<T> {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub(crate) fn push_ident(&mut self, name: &str) {
        let quoted = self.dialect.quote_identifier(name);
        self.sql.push_str(&quoted);
    }

    /// Bind a value and emit its placeholder.
    pub(crate) fn push_param(&mut self, value: &Value) {
        self.params.push(value.clone());
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    /// Write `items` separated by `sep`.
    pub(crate) fn separated<T>(
        &mut self,
        items: &[T],
        sep: &str,
        mut f: impl FnMut(&mut Self, &T) -> CoreResult<()>,
    ) -> CoreResult<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(sep);
            }
            f(self, item)?;
        }
        Ok(())
    }

    pub(crate) fn push_ident_list(&mut self, names: &[String], sep: &str) {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(sep);
            }
            self.push_ident(name);
        }
    }

    pub(crate) fn finish(self) -> Resolved {
        Resolved {
            sql: self.sql,
            params: self.params,
        }
    }
}
