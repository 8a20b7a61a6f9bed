//! SELECT SQL generation.

use crate::ast::{Select, SelectItem, SortOrder};
use crate::error::CoreResult;
use crate::resolver::Dialect;
use crate::resolver::rewrite;
use crate::resolver::writer::SqlWriter;

impl SqlWriter {
    pub(crate) fn write_select(&mut self, select: &Select) -> CoreResult<()> {
        let dialect = self.dialect();
        let select = rewrite::select(dialect, select, self.is_nested())?;

        self.write_with(&select.with)?;
        self.push("SELECT ");
        if select.distinct {
            self.push("DISTINCT ");
        }

        // T-SQL: TOP (n) when there is nothing to skip; OFFSET/FETCH otherwise.
        let use_top = dialect == Dialect::SqlServer
            && select.limit.is_some()
            && select.offset.is_none()
            && select.set_ops.is_empty();
        if let Some(n) = select.limit.filter(|_| use_top) {
            self.push(&format!("TOP ({}) ", n));
        }

        if select.columns.is_empty() {
            self.push("*");
        } else {
            self.separated(&select.columns, ", ", |w, item| w.write_select_item(item))?;
        }

        if !select.from.is_empty() {
            self.push(" FROM ");
            self.write_from_entries(&select.from.entries, false)?;
        }

        if let Some(filter) = &select.filter {
            self.push(" WHERE ");
            self.write_expr(filter)?;
        }

        if !select.group_by.is_empty() {
            self.push(" GROUP BY ");
            self.separated(&select.group_by, ", ", |w, e| w.write_expr(e))?;
        }

        if let Some(having) = &select.having {
            self.push(" HAVING ");
            self.write_expr(having)?;
        }

        for (op, operand) in &select.set_ops {
            self.push(&format!(" {} ", op));
            self.write_set_operand(operand)?;
        }

        if !select.order_by.is_empty() {
            self.push(" ORDER BY ");
            self.separated(&select.order_by, ", ", |w, order| {
                w.write_expr(&order.expr)?;
                if order.order == SortOrder::Desc {
                    w.push(" DESC");
                }
                Ok(())
            })?;
        }

        if !use_top {
            self.write_paging(&select)?;
        }

        self.write_locking(&select.locking)
    }

    fn write_select_item(&mut self, item: &SelectItem) -> CoreResult<()> {
        self.write_expr(&item.expr)?;
        if let Some(alias) = &item.alias {
            self.push(" AS ");
            self.push_ident(alias);
        }
        Ok(())
    }

    /// An operand carrying its own WITH, ordering, paging or set operations
    /// must be isolated. Postgres takes a parenthesized operand; the other
    /// engines need a derived table.
    fn write_set_operand(&mut self, operand: &Select) -> CoreResult<()> {
        let dialect = self.dialect();
        let isolated = !operand.with.is_empty()
            || !operand.order_by.is_empty()
            || operand.limit.is_some()
            || operand.offset.is_some()
            || !operand.set_ops.is_empty()
            || (!dialect.supports_inline_column_aliases() && operand.from.has_column_named());

        if !isolated {
            return self.write_select(operand);
        }
        match dialect {
            Dialect::Postgres => {
                self.push("(");
                self.nested(|w| w.write_select(operand))?;
                self.push(")");
            }
            Dialect::Sqlite | Dialect::SqlServer => {
                self.push("SELECT * FROM (");
                self.nested(|w| w.write_select(operand))?;
                self.push(") AS _setop");
            }
        }
        Ok(())
    }

    fn write_paging(&mut self, select: &Select) -> CoreResult<()> {
        match self.dialect() {
            Dialect::Postgres => {
                if let Some(n) = select.limit {
                    self.push(&format!(" LIMIT {}", n));
                }
                if let Some(m) = select.offset {
                    self.push(&format!(" OFFSET {}", m));
                }
            }
            Dialect::Sqlite => match (select.limit, select.offset) {
                (Some(n), Some(m)) => self.push(&format!(" LIMIT {} OFFSET {}", n, m)),
                (Some(n), None) => self.push(&format!(" LIMIT {}", n)),
                // SQLite has no OFFSET without LIMIT.
                (None, Some(m)) => self.push(&format!(" LIMIT -1 OFFSET {}", m)),
                (None, None) => {}
            },
            Dialect::SqlServer => {
                if select.limit.is_none() && select.offset.is_none() {
                    // T-SQL rejects ORDER BY in a derived table, CTE or
                    // subquery unless it is paged.
                    if self.is_nested() && !select.order_by.is_empty() {
                        self.push(" OFFSET 0 ROWS");
                    }
                    return Ok(());
                }
                if select.order_by.is_empty() {
                    self.push(" ORDER BY (SELECT NULL)");
                }
                self.push(&format!(" OFFSET {} ROWS", select.offset.unwrap_or(0)));
                if let Some(n) = select.limit {
                    self.push(&format!(" FETCH NEXT {} ROWS ONLY", n));
                }
            }
        }
        Ok(())
    }
}
