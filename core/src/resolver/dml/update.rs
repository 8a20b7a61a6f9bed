//! UPDATE SQL generation.

use crate::ast::Update;
use crate::error::CoreResult;
use crate::resolver::Dialect;
use crate::resolver::rewrite;
use crate::resolver::writer::SqlWriter;

impl SqlWriter {
    /// `UPDATE t [AS a] SET c = v [FROM ..] [WHERE ..]`
    ///
    /// T-SQL names the alias after UPDATE and declares it in FROM:
    /// `UPDATE a SET .. FROM t AS a, ..`.
    pub(crate) fn write_update(&mut self, update: &Update) -> CoreResult<()> {
        let dialect = self.dialect();
        let update = rewrite::update(dialect, update)?;
        let target = &update.target;

        self.write_with(&update.with)?;
        self.push("UPDATE ");
        let aliased_in_from = dialect == Dialect::SqlServer && target.alias.is_some();
        match &target.alias {
            Some(alias) if aliased_in_from => self.push_ident(alias),
            Some(alias) => {
                self.push_ident(&target.name);
                self.push(" AS ");
                self.push_ident(alias);
            }
            None => self.push_ident(&target.name),
        }

        self.push(" SET ");
        self.separated(&update.assignments, ", ", |w, (column, value)| {
            w.push_ident(column);
            w.push(" = ");
            w.write_expr(value)
        })?;

        if aliased_in_from {
            self.push(" FROM ");
            self.push_ident(&target.name);
            self.push(" AS ");
            self.push_ident(target.reference_name());
            self.write_from_entries(&update.from.entries, true)?;
        } else if !update.from.is_empty() {
            self.push(" FROM ");
            self.write_from_entries(&update.from.entries, false)?;
        }

        if let Some(filter) = &update.filter {
            self.push(" WHERE ");
            self.write_expr(filter)?;
        }
        Ok(())
    }
}
