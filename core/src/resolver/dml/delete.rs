//! DELETE SQL generation.

use crate::ast::Delete;
use crate::error::CoreResult;
use crate::resolver::Dialect;
use crate::resolver::rewrite;
use crate::resolver::writer::SqlWriter;

impl SqlWriter {
    pub(crate) fn write_delete(&mut self, delete: &Delete) -> CoreResult<()> {
        let dialect = self.dialect();
        let delete = rewrite::delete(dialect, delete)?;
        let target = &delete.target;

        self.write_with(&delete.with)?;
        match dialect {
            // DELETE a FROM t AS a, u
            Dialect::SqlServer if target.alias.is_some() || !delete.using.is_empty() => {
                self.push("DELETE ");
                self.push_ident(target.reference_name());
                self.push(" FROM ");
                self.push_ident(&target.name);
                if let Some(alias) = &target.alias {
                    self.push(" AS ");
                    self.push_ident(alias);
                }
                self.write_from_entries(&delete.using.entries, true)?;
            }
            _ => {
                self.push("DELETE FROM ");
                self.push_ident(&target.name);
                if let Some(alias) = &target.alias {
                    self.push(" AS ");
                    self.push_ident(alias);
                }
                if !delete.using.is_empty() {
                    // Only Postgres keeps USING past the rewrite.
                    debug_assert!(dialect.supports_delete_using());
                    self.push(" USING ");
                    self.write_from_entries(&delete.using.entries, false)?;
                }
            }
        }

        if let Some(filter) = &delete.filter {
            self.push(" WHERE ");
            self.write_expr(filter)?;
        }
        Ok(())
    }
}
