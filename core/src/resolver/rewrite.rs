//! Copy-on-rewrite passes for trees an engine cannot express directly.
//!
//! Every pass returns `Cow::Borrowed` when nothing needs to change, so the
//! common case costs nothing and the caller's tree is never mutated.

use super::Dialect;
use crate::ast::{
    Delete, Expr, FromClause, FromEntry, Insert, Select, TableSource, Update, WithClause,
    WithEntry, lit,
};
use crate::error::{CoreError, CoreResult};
use std::borrow::Cow;

/// Select-level rewrites.
///
/// Column-named FROM entries become WITH entries on engines without inline
/// column aliasing. A nested SELECT on SQL Server cannot own a WITH clause,
/// so there the source becomes a derived table instead, which T-SQL allows
/// to carry a column list.
pub(crate) fn select<'a>(
    dialect: Dialect,
    select: &'a Select,
    nested: bool,
) -> CoreResult<Cow<'a, Select>> {
    if dialect.supports_inline_column_aliases() || !select.from.has_column_named() {
        return Ok(Cow::Borrowed(select));
    }

    let mut owned = select.clone();
    if nested && dialect == Dialect::SqlServer {
        derive_column_named(&mut owned.from)?;
    } else {
        hoist_column_named(&mut owned.with, &mut owned.from)?;
    }
    Ok(Cow::Owned(owned))
}

pub(crate) fn update<'a>(dialect: Dialect, update: &'a Update) -> CoreResult<Cow<'a, Update>> {
    let clear_alias = update.target.alias.is_some() && !dialect.allows_dml_target_alias();
    let hoist = !dialect.supports_inline_column_aliases() && update.from.has_column_named();
    if !clear_alias && !hoist {
        return Ok(Cow::Borrowed(update));
    }

    let mut owned = update.clone();
    if hoist {
        hoist_column_named(&mut owned.with, &mut owned.from)?;
    }
    if let Some(alias) = owned.target.alias.take_if(|_| clear_alias) {
        let name = owned.target.name.clone();
        for (_, value) in &mut owned.assignments {
            requalify_expr(value, &alias, &name);
        }
        if let Some(filter) = &mut owned.filter {
            requalify_expr(filter, &alias, &name);
        }
        requalify_from(&mut owned.from, &alias, &name);
    }
    Ok(Cow::Owned(owned))
}

/// DELETE rewrites.
///
/// SQLite has neither a target alias nor `USING`: the alias is cleared and
/// the sources move into `WHERE EXISTS (SELECT 1 FROM <sources> WHERE ..)`.
pub(crate) fn delete<'a>(dialect: Dialect, delete: &'a Delete) -> CoreResult<Cow<'a, Delete>> {
    let clear_alias = delete.target.alias.is_some() && !dialect.allows_dml_target_alias();
    let fold_using = !delete.using.is_empty() && dialect == Dialect::Sqlite;
    let hoist = !dialect.supports_inline_column_aliases()
        && !fold_using
        && delete.using.has_column_named();
    if !clear_alias && !fold_using && !hoist {
        return Ok(Cow::Borrowed(delete));
    }

    let mut owned = delete.clone();
    if let Some(alias) = owned.target.alias.take_if(|_| clear_alias) {
        let name = owned.target.name.clone();
        if let Some(filter) = &mut owned.filter {
            requalify_expr(filter, &alias, &name);
        }
        requalify_from(&mut owned.using, &alias, &name);
    }
    if fold_using {
        let sources = std::mem::take(&mut owned.using);
        let probe = Select {
            columns: vec![crate::ast::SelectItem {
                expr: lit(1),
                alias: None,
            }],
            from: sources,
            filter: owned.filter.take(),
            ..Default::default()
        };
        owned.filter = Some(Expr::Exists {
            query: Box::new(probe),
            negated: false,
        });
    }
    if hoist {
        hoist_column_named(&mut owned.with, &mut owned.using)?;
    }
    Ok(Cow::Owned(owned))
}

pub(crate) fn insert<'a>(dialect: Dialect, insert: &'a Insert) -> Cow<'a, Insert> {
    if insert.target.alias.is_none() || dialect.allows_insert_target_alias() {
        return Cow::Borrowed(insert);
    }
    let mut owned = insert.clone();
    owned.target.alias = None;
    Cow::Owned(owned)
}

/// The query a column-named entry's source stands for.
fn source_query(source: TableSource) -> Select {
    match source {
        TableSource::Table(name) => Select::from_table(name),
        TableSource::Subquery(query) => *query,
        TableSource::Expr(expr) => Select::new().from(FromEntry::expr(expr)),
    }
}

fn require_alias(entry: &mut FromEntry) -> CoreResult<String> {
    entry
        .alias
        .take()
        .ok_or_else(|| CoreError::invalid("column-named FROM entry without an alias"))
}

/// Move column-named entries into the WITH clause, last to first, each
/// prepended so the WITH order follows the FROM order.
fn hoist_column_named(with: &mut WithClause, from: &mut FromClause) -> CoreResult<()> {
    for entry in from.entries.iter_mut().rev() {
        if !entry.is_column_named() {
            continue;
        }
        let alias = require_alias(entry)?;
        // A CTE named after a table its own query reads would refer to itself.
        let name = if source_reads(&entry.source, &alias) {
            let renamed = format!("_{}", alias);
            entry.alias = Some(alias);
            renamed
        } else {
            alias
        };
        let source = std::mem::replace(&mut entry.source, TableSource::Table(name.clone()));
        let columns = std::mem::take(&mut entry.columns);
        with.entries.insert(
            0,
            WithEntry {
                name,
                columns,
                query: Box::new(source_query(source)),
                recursive: false,
            },
        );
    }
    Ok(())
}

fn source_reads(source: &TableSource, table: &str) -> bool {
    match source {
        TableSource::Table(name) => name == table,
        TableSource::Subquery(query) => select_reads(query, table),
        TableSource::Expr(_) => false,
    }
}

fn select_reads(select: &Select, table: &str) -> bool {
    select.from.entries.iter().any(|e| source_reads(&e.source, table))
        || select.set_ops.iter().any(|(_, operand)| select_reads(operand, table))
}

/// Wrap column-named sources in a derived table, keeping alias and columns.
fn derive_column_named(from: &mut FromClause) -> CoreResult<()> {
    for entry in from.entries.iter_mut().filter(|e| e.is_column_named()) {
        if entry.alias.is_none() {
            return Err(CoreError::invalid("column-named FROM entry without an alias"));
        }
        if matches!(entry.source, TableSource::Subquery(_)) {
            continue;
        }
        let source = std::mem::replace(&mut entry.source, TableSource::Table(String::new()));
        entry.source = TableSource::Subquery(Box::new(source_query(source)));
    }
    Ok(())
}

/// Point references qualified with `alias` at `name` instead.
fn requalify_expr(expr: &mut Expr, alias: &str, name: &str) {
    match expr {
        Expr::Column { table: Some(t), .. } | Expr::Star { table: Some(t) } if t.as_str() == alias => {
            *t = name.to_string();
        }
        Expr::Function { args, .. } => {
            for arg in args {
                requalify_expr(arg, alias, name);
            }
        }
        Expr::Cast { expr, .. } | Expr::Not(expr) | Expr::IsNull { expr, .. } => {
            requalify_expr(expr, alias, name);
        }
        Expr::Binary { left, right, .. } => {
            requalify_expr(left, alias, name);
            requalify_expr(right, alias, name);
        }
        Expr::Subquery(query) | Expr::Exists { query, .. } => {
            requalify_select(query, alias, name);
        }
        _ => {}
    }
}

fn requalify_from(from: &mut FromClause, alias: &str, name: &str) {
    for entry in &mut from.entries {
        match &mut entry.source {
            TableSource::Subquery(query) => requalify_select(query, alias, name),
            TableSource::Expr(expr) => requalify_expr(expr, alias, name),
            TableSource::Table(_) => {}
        }
        if let Some(on) = entry.join.as_mut().and_then(|j| j.on.as_mut()) {
            requalify_expr(on, alias, name);
        }
    }
}

fn requalify_select(select: &mut Select, alias: &str, name: &str) {
    // An inner entry with the same name shadows the outer alias.
    if select
        .from
        .entries
        .iter()
        .any(|e| e.reference_name() == Some(alias))
    {
        return;
    }
    for item in &mut select.columns {
        requalify_expr(&mut item.expr, alias, name);
    }
    requalify_from(&mut select.from, alias, name);
    for expr in select
        .filter
        .iter_mut()
        .chain(select.having.iter_mut())
        .chain(select.group_by.iter_mut())
    {
        requalify_expr(expr, alias, name);
    }
    for order in &mut select.order_by {
        requalify_expr(&mut order.expr, alias, name);
    }
    for (_, operand) in &mut select.set_ops {
        requalify_select(operand, alias, name);
    }
}
