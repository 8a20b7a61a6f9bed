//! Error types for connection, listener and cursor operations.

use crate::context::ContextState;
use crate::driver::DriverError;
use sqlweave_core::error::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnError {
    /// The statement could not be rendered for the connection's dialect.
    #[error(transparent)]
    Resolve(#[from] CoreError),

    /// The physical connection is gone; the context must be replaced.
    #[error("Connection broken: {0}")]
    ConnectionBroken(DriverError),

    #[error("Cursor limit exceeded: at most {limit} open cursors")]
    CursorLimitExceeded { limit: usize },

    /// The statement failed but the connection is still usable.
    #[error("Execution failed: {0}")]
    TransientExecution(DriverError),

    #[error("Connection context is {0}, not open")]
    InvalidState(ContextState),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl ConnError {
    pub fn is_connection_broken(&self) -> bool {
        matches!(self, Self::ConnectionBroken(_))
    }

    /// The driver error underneath, if any.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::ConnectionBroken(e) | Self::TransientExecution(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for connection operations.
pub type ConnResult<T> = Result<T, ConnError>;
