//! Expression rendering.

use super::writer::SqlWriter;
use super::{Dialect, type_name};
use crate::ast::{BinaryOp, Expr, SqlType};
use crate::error::CoreResult;

/// Binding strength; higher binds tighter.
fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::And => 2,
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge
        | BinaryOp::Like => 3,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Concat => 4,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 5,
    }
}

fn is_arithmetic(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
    )
}

/// Engines disagree on where concatenation sits relative to arithmetic
/// (Postgres below `+`, SQLite above `*`), so a child crossing that line is
/// always parenthesized.
fn crosses_concat(parent: BinaryOp, child: &Expr) -> bool {
    let Expr::Binary { op: child, .. } = child else {
        return false;
    };
    (parent == BinaryOp::Concat && is_arithmetic(*child))
        || (is_arithmetic(parent) && *child == BinaryOp::Concat)
}

impl SqlWriter {
    pub(crate) fn write_expr(&mut self, expr: &Expr) -> CoreResult<()> {
        match expr {
            Expr::Literal(value) => self.write_literal(value)?,
            Expr::Param(value) => self.push_param(value),
            Expr::Column { table, name } => {
                if let Some(t) = table {
                    self.push_ident(t);
                    self.push(".");
                }
                self.push_ident(name);
            }
            Expr::Star { table } => {
                if let Some(t) = table {
                    self.push_ident(t);
                    self.push(".");
                }
                self.push("*");
            }
            Expr::Function { func, args } => self.write_function(func, args)?,
            Expr::Cast { expr, ty } => self.write_cast(expr, ty)?,
            Expr::Binary { left, op, right } => self.write_binary(left, *op, right)?,
            Expr::Not(inner) => {
                self.push("NOT ");
                self.write_operand(inner, 6, false)?;
            }
            Expr::IsNull { expr, negated } => {
                self.write_operand(expr, 4, false)?;
                self.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::Subquery(query) => {
                self.push("(");
                self.nested(|w| w.write_select(query))?;
                self.push(")");
            }
            Expr::Exists { query, negated } => {
                if *negated {
                    self.push("NOT ");
                }
                self.push("EXISTS (");
                self.nested(|w| w.write_select(query))?;
                self.push(")");
            }
        }
        Ok(())
    }

    fn write_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> CoreResult<()> {
        let prec = precedence(op);
        // AND / OR are associative, everything else keeps right-nesting explicit.
        let assoc = matches!(op, BinaryOp::And | BinaryOp::Or);
        if crosses_concat(op, left) {
            self.write_parenthesized(left)?;
        } else {
            self.write_operand(left, prec, false)?;
        }
        match op {
            BinaryOp::Concat => {
                let token = self.dialect().concat_operator();
                self.push(" ");
                self.push(token);
                self.push(" ");
            }
            other => self.push(&format!(" {} ", other)),
        }
        if crosses_concat(op, right) {
            self.write_parenthesized(right)?;
        } else {
            self.write_operand(right, prec, !assoc)?;
        }
        Ok(())
    }

    fn write_parenthesized(&mut self, expr: &Expr) -> CoreResult<()> {
        self.push("(");
        self.write_expr(expr)?;
        self.push(")");
        Ok(())
    }

    /// Write a child of an operator, parenthesized when it binds looser.
    fn write_operand(&mut self, expr: &Expr, parent: u8, strict: bool) -> CoreResult<()> {
        let wrap = match expr {
            Expr::Binary { op, .. } => {
                let child = precedence(*op);
                child < parent || (strict && child == parent)
            }
            Expr::Not(_) | Expr::IsNull { .. } => parent >= 3,
            _ => false,
        };
        if wrap {
            self.write_parenthesized(expr)
        } else {
            self.write_expr(expr)
        }
    }

    fn write_cast(&mut self, expr: &Expr, ty: &SqlType) -> CoreResult<()> {
        let dialect = self.dialect();
        let target = type_name(dialect, ty);
        if dialect.supports_postfix_cast() {
            if expr.is_atomic() {
                self.write_expr(expr)?;
            } else {
                self.push("(");
                self.write_expr(expr)?;
                self.push(")");
            }
            self.push("::");
            self.push(target);
        } else {
            debug_assert!(matches!(dialect, Dialect::Sqlite | Dialect::SqlServer));
            self.push("CAST(");
            self.write_expr(expr)?;
            self.push(" AS ");
            self.push(target);
            self.push(")");
        }
        Ok(())
    }
}
