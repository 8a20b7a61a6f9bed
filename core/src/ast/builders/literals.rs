//! Literal value builders.

use crate::ast::{Expr, Value};

/// Create an inline literal expression
pub fn lit<V: Into<Value>>(value: V) -> Expr {
    Expr::Literal(value.into())
}

/// Create a bound parameter; rendered as a placeholder and collected in order
pub fn param<V: Into<Value>>(value: V) -> Expr {
    Expr::Param(value.into())
}

/// Create a NULL literal
pub fn null() -> Expr {
    Expr::Literal(Value::Null)
}
