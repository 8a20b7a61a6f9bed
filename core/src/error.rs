//! Error types for statement building and resolution.

use crate::resolver::Dialect;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A node has no rendering rule for the active dialect.
    #[error("{construct} is not supported by {dialect}")]
    UnsupportedConstruct {
        dialect: Dialect,
        construct: String,
    },

    /// The tree is missing a required part or combines parts illegally.
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),
}

impl CoreError {
    /// Create an unsupported-construct error for the given dialect.
    pub fn unsupported(dialect: Dialect, construct: impl Into<String>) -> Self {
        Self::UnsupportedConstruct {
            dialect,
            construct: construct.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidStatement(message.into())
    }

    /// True for errors raised because the dialect cannot express a node.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedConstruct { .. })
    }
}

/// Result type alias for statement operations.
pub type CoreResult<T> = Result<T, CoreError>;
