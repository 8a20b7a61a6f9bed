use crate::ast::{Select, SqlType, Value};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Binary operators for expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Like,
    Add,
    Sub,
    Mul,
    Div,
    /// Modulo (%)
    Rem,
    /// String concatenation; spelling depends on the dialect
    Concat,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Eq => write!(f, "="),
            BinaryOp::Ne => write!(f, "<>"),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Le => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::Ge => write!(f, ">="),
            BinaryOp::And => write!(f, "AND"),
            BinaryOp::Or => write!(f, "OR"),
            BinaryOp::Like => write!(f, "LIKE"),
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Rem => write!(f, "%"),
            BinaryOp::Concat => write!(f, "||"),
        }
    }
}

/// Canonical (engine-neutral) function name.
///
/// Engine spellings are chosen by the resolver; a tree never carries
/// `LTRIM` or `SUBSTR`, only `TrimStart` or `Substring`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Func {
    /// Trim both sides
    Trim,
    TrimStart,
    TrimEnd,
    Substring,
    Length,
    Upper,
    Lower,
    Coalesce,
    Now,
    Count,
    Sum,
    Min,
    Max,
    Avg,
    /// Engine function passed through verbatim
    Custom(String),
}

impl Func {
    /// The canonical name, as used in serialized trees.
    pub fn canonical_name(&self) -> &str {
        match self {
            Func::Trim => "Trim",
            Func::TrimStart => "TrimStart",
            Func::TrimEnd => "TrimEnd",
            Func::Substring => "Substring",
            Func::Length => "Length",
            Func::Upper => "Upper",
            Func::Lower => "Lower",
            Func::Coalesce => "Coalesce",
            Func::Now => "Now",
            Func::Count => "Count",
            Func::Sum => "Sum",
            Func::Min => "Min",
            Func::Max => "Max",
            Func::Avg => "Avg",
            Func::Custom(name) => name,
        }
    }
}

impl FromStr for Func {
    type Err = std::convert::Infallible;

    /// Map a canonical name to its function; unknown names become `Custom`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let func = match s {
            "Trim" => Func::Trim,
            "TrimStart" => Func::TrimStart,
            "TrimEnd" => Func::TrimEnd,
            "Substring" => Func::Substring,
            "Length" => Func::Length,
            "Upper" => Func::Upper,
            "Lower" => Func::Lower,
            "Coalesce" => Func::Coalesce,
            "Now" => Func::Now,
            "Count" => Func::Count,
            "Sum" => Func::Sum,
            "Min" => Func::Min,
            "Max" => Func::Max,
            "Avg" => Func::Avg,
            other => Func::Custom(other.to_string()),
        };
        Ok(func)
    }
}

impl std::fmt::Display for Func {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Inline literal, rendered into the SQL text
    Literal(Value),
    /// Bound parameter, rendered as a placeholder
    Param(Value),
    /// Column reference, optionally qualified by a table or alias
    Column {
        table: Option<String>,
        name: String,
    },
    /// All columns (`*` or `t.*`)
    Star { table: Option<String> },
    /// Function call by canonical name
    Function { func: Func, args: Vec<Expr> },
    /// Type cast to a canonical type
    Cast { expr: Box<Expr>, ty: SqlType },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<Expr>, negated: bool },
    /// Scalar subquery: (SELECT ...)
    Subquery(Box<Select>),
    /// EXISTS subquery: [NOT] EXISTS (SELECT ...)
    Exists { query: Box<Select>, negated: bool },
}

#[allow(clippy::should_implement_trait)]
impl Expr {
    fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Expr {
        Expr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    pub fn eq(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Eq, right)
    }

    pub fn ne(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Ne, right)
    }

    pub fn lt(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Lt, right)
    }

    pub fn le(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Le, right)
    }

    pub fn gt(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Gt, right)
    }

    pub fn ge(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Ge, right)
    }

    pub fn and(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::And, right)
    }

    pub fn or(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Or, right)
    }

    pub fn like(self, pattern: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Like, pattern)
    }

    pub fn add(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Add, right)
    }

    pub fn sub(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Sub, right)
    }

    pub fn mul(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Mul, right)
    }

    pub fn div(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Div, right)
    }

    pub fn concat(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Concat, right)
    }

    pub fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    pub fn cast(self, ty: SqlType) -> Expr {
        Expr::Cast {
            expr: Box::new(self),
            ty,
        }
    }

    /// True for nodes that render as a single token or call, so a postfix
    /// operator can be attached without parentheses.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Expr::Literal(_)
                | Expr::Param(_)
                | Expr::Column { .. }
                | Expr::Star { .. }
                | Expr::Function { .. }
                | Expr::Subquery(_)
        )
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Literal(v)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::Literal(Value::Int(n))
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::Literal(Value::Int(n as i64))
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Literal(Value::Bool(b))
    }
}

/// Strings become literals; use [`crate::ast::col`] for column references.
impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Literal(Value::Text(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::col;

    #[test]
    fn test_canonical_names_round_trip() {
        for func in [
            Func::Trim,
            Func::TrimStart,
            Func::TrimEnd,
            Func::Substring,
            Func::Length,
            Func::Coalesce,
            Func::Now,
        ] {
            let parsed: Func = func.canonical_name().parse().unwrap();
            assert_eq!(parsed, func);
        }
        let custom: Func = "json_agg".parse().unwrap();
        assert_eq!(custom, Func::Custom("json_agg".to_string()));
    }

    #[test]
    fn test_atomic() {
        assert!(col("a").is_atomic());
        assert!(!col("a").add(1).is_atomic());
        assert!(!col("a").cast(SqlType::Text).is_atomic());
    }
}
