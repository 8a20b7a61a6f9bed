//! Fluent constructors for statements.

use crate::ast::{
    Delete, Expr, FromEntry, Insert, InsertSource, LockingEntry, OrderBy, Select, SelectItem,
    SetOp, SortOrder, TableRef, Update, WithEntry,
};

/// AND a new predicate onto an optional existing one.
fn and_filter(existing: Option<Expr>, expr: Expr) -> Option<Expr> {
    Some(match existing {
        Some(prev) => prev.and(expr),
        None => expr,
    })
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: impl Into<String>) -> Self {
        Self::new().from(FromEntry::table(table))
    }

    pub fn from(mut self, entry: FromEntry) -> Self {
        self.from.push(entry);
        self
    }

    pub fn column(mut self, expr: Expr) -> Self {
        self.columns.push(SelectItem { expr, alias: None });
        self
    }

    pub fn column_as(mut self, expr: Expr, alias: impl Into<String>) -> Self {
        self.columns.push(SelectItem {
            expr,
            alias: Some(alias.into()),
        });
        self
    }

    /// Project plain column names.
    pub fn columns<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self = self.column(super::col(name));
        }
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Add a WHERE predicate; repeated calls are ANDed.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = and_filter(self.filter.take(), expr);
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    pub fn having(mut self, expr: Expr) -> Self {
        self.having = and_filter(self.having.take(), expr);
        self
    }

    pub fn order_by(mut self, expr: Expr, order: SortOrder) -> Self {
        self.order_by.push(OrderBy { expr, order });
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn lock(mut self, entry: LockingEntry) -> Self {
        self.locking.entries.push(entry);
        self
    }

    pub fn with(mut self, entry: WithEntry) -> Self {
        self.with.entries.push(entry);
        self
    }

    pub fn set_op(mut self, op: SetOp, other: Select) -> Self {
        self.set_ops.push((op, Box::new(other)));
        self
    }

    pub fn union(self, other: Select) -> Self {
        self.set_op(SetOp::Union, other)
    }

    pub fn union_all(self, other: Select) -> Self {
        self.set_op(SetOp::UnionAll, other)
    }
}

impl Update {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            with: Default::default(),
            target: TableRef::new(name),
            assignments: vec![],
            from: Default::default(),
            filter: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.target.alias = Some(alias.into());
        self
    }

    pub fn set(mut self, column: impl Into<String>, value: Expr) -> Self {
        self.assignments.push((column.into(), value));
        self
    }

    pub fn from(mut self, entry: FromEntry) -> Self {
        self.from.push(entry);
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = and_filter(self.filter.take(), expr);
        self
    }

    pub fn with(mut self, entry: WithEntry) -> Self {
        self.with.entries.push(entry);
        self
    }
}

impl Delete {
    pub fn from_table(name: impl Into<String>) -> Self {
        Self {
            with: Default::default(),
            target: TableRef::new(name),
            using: Default::default(),
            filter: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.target.alias = Some(alias.into());
        self
    }

    pub fn using(mut self, entry: FromEntry) -> Self {
        self.using.push(entry);
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = and_filter(self.filter.take(), expr);
        self
    }
}

impl Insert {
    pub fn into(name: impl Into<String>) -> Self {
        Self {
            with: Default::default(),
            target: TableRef::new(name),
            columns: vec![],
            source: InsertSource::DefaultValues,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.target.alias = Some(alias.into());
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

    /// Append one VALUES row.
    pub fn values(mut self, row: impl IntoIterator<Item = Expr>) -> Self {
        let row: Vec<Expr> = row.into_iter().collect();
        match &mut self.source {
            InsertSource::Values(rows) => rows.push(row),
            _ => self.source = InsertSource::Values(vec![row]),
        }
        self
    }

    pub fn select(mut self, query: Select) -> Self {
        self.source = InsertSource::Select(Box::new(query));
        self
    }

    pub fn default_values(mut self) -> Self {
        self.source = InsertSource::DefaultValues;
        self
    }
}
