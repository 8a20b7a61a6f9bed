//! Statement-level rendering, one file per statement kind.
//!
//! The pieces shared between statements live here: WITH prefixes and
//! FROM entry lists.

mod delete;
mod insert;
mod select;
mod update;

use super::Dialect;
use super::writer::SqlWriter;
use crate::ast::{FromEntry, JoinKind, TableSource, WithClause};
use crate::error::{CoreError, CoreResult};

impl SqlWriter {
    /// `WITH [RECURSIVE] a(c1,c2) AS (...), b AS (...) ` including the
    /// trailing space. Writes nothing for an empty clause.
    pub(crate) fn write_with(&mut self, with: &WithClause) -> CoreResult<()> {
        if with.is_empty() {
            return Ok(());
        }
        if self.is_nested() && self.dialect() == Dialect::SqlServer {
            return Err(CoreError::unsupported(self.dialect(), "WITH in a nested query"));
        }
        self.push("WITH ");
        // T-SQL CTEs are recursive without the keyword.
        if with.is_recursive() && self.dialect() != Dialect::SqlServer {
            self.push("RECURSIVE ");
        }
        self.separated(&with.entries, ", ", |w, entry| {
            w.push_ident(&entry.name);
            if !entry.columns.is_empty() {
                w.push("(");
                w.push_ident_list(&entry.columns, ",");
                w.push(")");
            }
            w.push(" AS (");
            w.nested(|w| w.write_select(&entry.query))?;
            w.push(")");
            Ok(())
        })?;
        self.push(" ");
        Ok(())
    }

    /// Write FROM entries. With `continuing` set the list extends entries
    /// already written, so the first one is preceded by its join or a comma.
    pub(crate) fn write_from_entries(
        &mut self,
        entries: &[FromEntry],
        continuing: bool,
    ) -> CoreResult<()> {
        for (i, entry) in entries.iter().enumerate() {
            let leading = i == 0 && !continuing;
            match &entry.join {
                _ if leading => {}
                None => self.push(", "),
                Some(join) => {
                    self.push(" ");
                    self.push(&join.kind.to_string());
                    self.push(" ");
                }
            }
            self.write_from_entry(entry)?;

            let Some(join) = entry.join.as_ref().filter(|_| !leading) else {
                continue;
            };
            match (join.kind, &join.on) {
                (JoinKind::Cross, None) => {}
                (JoinKind::Cross, Some(_)) => {
                    return Err(CoreError::invalid("CROSS JOIN with an ON condition"));
                }
                (_, Some(on)) => {
                    self.push(" ON ");
                    self.write_expr(on)?;
                }
                (kind, None) => {
                    return Err(CoreError::invalid(format!("{} without ON condition", kind)));
                }
            }
        }
        Ok(())
    }

    fn write_from_entry(&mut self, entry: &FromEntry) -> CoreResult<()> {
        match &entry.source {
            TableSource::Table(name) => self.push_ident(name),
            TableSource::Expr(expr) => self.write_expr(expr)?,
            TableSource::Subquery(query) => {
                self.push("(");
                self.nested(|w| w.write_select(query))?;
                self.push(")");
            }
        }
        if let Some(alias) = &entry.alias {
            self.push(" AS ");
            self.push_ident(alias);
        }
        if entry.is_column_named() {
            let dialect = self.dialect();
            let derived = matches!(entry.source, TableSource::Subquery(_));
            let inline = dialect.supports_inline_column_aliases()
                || (derived && dialect == Dialect::SqlServer);
            if !inline {
                return Err(CoreError::unsupported(dialect, "FROM entry column aliases"));
            }
            self.push("(");
            self.push_ident_list(&entry.columns, ", ");
            self.push(")");
        }
        Ok(())
    }
}
