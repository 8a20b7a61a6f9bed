//! Dialect-neutral SQL statement trees and a per-engine resolver.
//!
//! Build statements as a tree, never as strings, then resolve the same tree
//! against PostgreSQL, SQLite or a T-SQL engine.
//!
//! ```ignore
//! use sqlweave_core::prelude::*;
//! let q = Select::from_table("users").columns(["id", "name"]).filter(col("id").eq(param(7)));
//! let resolved = q.resolve(Dialect::Postgres)?;
//! assert_eq!(resolved.sql, "SELECT id, name FROM users WHERE id = $1");
//! ```

pub mod ast;
pub mod error;
pub mod resolver;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::error::*;
    pub use crate::resolver::{Dialect, Resolved, ToSql, resolve};
}
