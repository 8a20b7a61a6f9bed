//! INSERT SQL generation.

use crate::ast::{Insert, InsertSource};
use crate::error::CoreResult;
use crate::resolver::rewrite;
use crate::resolver::writer::SqlWriter;

impl SqlWriter {
    pub(crate) fn write_insert(&mut self, insert: &Insert) -> CoreResult<()> {
        let insert = rewrite::insert(self.dialect(), insert);

        self.write_with(&insert.with)?;
        self.push("INSERT INTO ");
        self.push_ident(&insert.target.name);
        if let Some(alias) = &insert.target.alias {
            self.push(" AS ");
            self.push_ident(alias);
        }
        if !insert.columns.is_empty() {
            self.push(" (");
            self.push_ident_list(&insert.columns, ", ");
            self.push(")");
        }

        match &insert.source {
            InsertSource::Values(rows) => {
                self.push(" VALUES ");
                self.separated(rows, ", ", |w, row| {
                    w.push("(");
                    w.separated(row, ", ", |w, value| w.write_expr(value))?;
                    w.push(")");
                    Ok(())
                })?;
            }
            InsertSource::Select(query) => {
                self.push(" ");
                self.nested(|w| w.write_select(query))?;
            }
            InsertSource::DefaultValues => self.push(" DEFAULT VALUES"),
        }
        Ok(())
    }
}
