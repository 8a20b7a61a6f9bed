//! Statement model: an immutable-by-convention tree of clauses and expressions.
//!
//! Trees only carry canonical, engine-neutral names; nothing here knows how a
//! particular engine spells a function or a type.

pub mod builders;
pub mod clauses;
pub mod expr;
pub mod operators;
pub mod statement;
pub mod values;

pub use builders::*;
pub use clauses::*;
pub use expr::*;
pub use operators::*;
pub use statement::*;
pub use values::*;
