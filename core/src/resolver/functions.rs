//! Canonical function names to engine spellings.

use super::Dialect;
use super::writer::SqlWriter;
use crate::ast::{Expr, Func};
use crate::error::{CoreError, CoreResult};

/// Engine spelling of a canonical function.
///
/// Fails for functions the engine has no direct spelling for (SQL Server has
/// no two-sided TRIM; the writer composes it from LTRIM/RTRIM instead).
pub fn function_name(dialect: Dialect, func: &Func) -> CoreResult<&str> {
    let name = match func {
        Func::Trim => match dialect {
            Dialect::SqlServer => return Err(CoreError::unsupported(dialect, "TRIM")),
            Dialect::Postgres | Dialect::Sqlite => "TRIM",
        },
        Func::TrimStart => "LTRIM",
        Func::TrimEnd => "RTRIM",
        Func::Substring => match dialect {
            Dialect::Sqlite => "SUBSTR",
            Dialect::Postgres | Dialect::SqlServer => "SUBSTRING",
        },
        Func::Length => match dialect {
            Dialect::SqlServer => "LEN",
            Dialect::Postgres | Dialect::Sqlite => "LENGTH",
        },
        Func::Upper => "UPPER",
        Func::Lower => "LOWER",
        Func::Coalesce => "COALESCE",
        Func::Now => match dialect {
            Dialect::Postgres => "NOW",
            Dialect::Sqlite => "CURRENT_TIMESTAMP",
            Dialect::SqlServer => "SYSDATETIME",
        },
        Func::Count => "COUNT",
        Func::Sum => "SUM",
        Func::Min => "MIN",
        Func::Max => "MAX",
        Func::Avg => "AVG",
        Func::Custom(name) => name,
    };
    Ok(name)
}

/// Allowed argument counts, inclusive. `None` as the upper bound means any.
fn arity(func: &Func) -> (usize, Option<usize>) {
    match func {
        Func::Trim | Func::TrimStart | Func::TrimEnd => (1, Some(2)),
        Func::Substring => (2, Some(3)),
        Func::Length | Func::Upper | Func::Lower => (1, Some(1)),
        Func::Sum | Func::Min | Func::Max | Func::Avg => (1, Some(1)),
        Func::Count => (0, Some(1)),
        Func::Now => (0, Some(0)),
        Func::Coalesce => (1, None),
        Func::Custom(_) => (0, None),
    }
}

fn check_arity(func: &Func, args: &[Expr]) -> CoreResult<()> {
    let (min, max) = arity(func);
    let n = args.len();
    if n < min || max.is_some_and(|max| n > max) {
        return Err(CoreError::invalid(format!(
            "{} called with {} argument(s)",
            func, n
        )));
    }
    Ok(())
}

impl SqlWriter {
    pub(crate) fn write_function(&mut self, func: &Func, args: &[Expr]) -> CoreResult<()> {
        check_arity(func, args)?;
        let dialect = self.dialect();

        match (dialect, func) {
            (Dialect::SqlServer, Func::Trim) => {
                if args.len() > 1 {
                    return Err(CoreError::unsupported(dialect, "TRIM with a character set"));
                }
                // LTRIM(RTRIM(x))
                let composed = Expr::Function {
                    func: Func::TrimStart,
                    args: vec![Expr::Function {
                        func: Func::TrimEnd,
                        args: args.to_vec(),
                    }],
                };
                return self.write_expr(&composed);
            }
            (Dialect::SqlServer, Func::TrimStart | Func::TrimEnd) if args.len() > 1 => {
                return Err(CoreError::unsupported(
                    dialect,
                    format!("{} with a character set", func),
                ));
            }
            (Dialect::SqlServer, Func::Substring) if args.len() == 2 => {
                // SUBSTRING requires a length on SQL Server.
                let mut full = args.to_vec();
                full.push(Expr::Function {
                    func: Func::Length,
                    args: vec![args[0].clone()],
                });
                return self.write_function(func, &full);
            }
            (Dialect::Sqlite, Func::Now) => {
                self.push(function_name(dialect, func)?);
                return Ok(());
            }
            (_, Func::Count) if args.is_empty() => {
                self.push("COUNT(*)");
                return Ok(());
            }
            _ => {}
        }

        let name = function_name(dialect, func)?;
        self.push(name);
        self.push("(");
        self.separated(args, ", ", |w, arg| w.write_expr(arg))?;
        self.push(")");
        Ok(())
    }
}
