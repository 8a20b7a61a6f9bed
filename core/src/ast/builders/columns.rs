//! Column and basic expression builders.

use crate::ast::{Expr, Func, SqlType};

/// Create an unqualified column reference expression
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        name: name.to_string(),
    }
}

/// Create a column reference qualified by a table or alias (`t.c`)
pub fn qcol(table: &str, name: &str) -> Expr {
    Expr::Column {
        table: Some(table.to_string()),
        name: name.to_string(),
    }
}

/// Create a star (*) expression for SELECT *
pub fn star() -> Expr {
    Expr::Star { table: None }
}

/// Call a function by canonical name
/// # Example
/// ```ignore
/// func(Func::TrimStart, [col("name")])  // LTRIM(name)
/// ```
pub fn func(func: Func, args: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Function {
        func,
        args: args.into_iter().collect(),
    }
}

/// Cast an expression to a canonical type
pub fn cast(expr: Expr, ty: SqlType) -> Expr {
    expr.cast(ty)
}
