//! Ergonomic builders for statement trees.
//!
//! ```ignore
//! use sqlweave_core::ast::*;
//! let q = Select::from_table("users")
//!     .column(func(Func::TrimStart, [col("name")]))
//!     .filter(col("active").eq(param(true)));
//! ```

mod columns;
mod literals;
mod statements;

pub use columns::*;
pub use literals::*;
