//! Native driver collaborator contract.
//!
//! The wire protocol, TLS and authentication live in the driver. This crate
//! only needs to connect, run text statements with bound values, receive
//! server-pushed events and tell a broken connection from a failed statement.

use crate::args::{ConnectionArguments, ConnectionPurpose, ConnectionString};
use crate::events::ConnectionEvents;
use async_trait::async_trait;
use sqlweave_core::ast::Value;
use sqlweave_core::resolver::Dialect;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Coarse classification a driver attaches to its errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// The driver knows the session is gone.
    Disconnected,
    /// Socket-level failure.
    Io(ErrorKind),
    /// The server rejected the statement.
    Statement,
    /// The driver has no implementation for the request.
    Unsupported,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverError {
    pub kind: DriverErrorKind,
    /// Engine error code: SQLSTATE on Postgres, error number on SQL Server.
    pub code: Option<String>,
    pub message: String,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Disconnected, message)
    }

    pub fn statement(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Statement, message).with_code(code)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Unsupported, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        Self::new(DriverErrorKind::Io(e.kind()), e.to_string())
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

/// One result row, values in select-list order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An open physical connection.
#[async_trait]
pub trait NativeConnection: Send {
    /// Backend process id reported during the handshake, if the driver has it.
    fn process_id(&self) -> Option<i32> {
        None
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> DriverResult<Vec<Row>>;

    /// Run a statement, returning the affected row count.
    async fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<u64>;

    /// Start forwarding notifications and info messages to `sink`.
    fn wire_events(&mut self, sink: Arc<dyn ConnectionEvents>);

    fn unwire_events(&mut self);

    /// Block until the server pushes a message or `timeout` elapses.
    /// Returns whether anything arrived.
    async fn wait(&mut self, timeout: Option<Duration>) -> DriverResult<bool> {
        let _ = timeout;
        Err(DriverError::unsupported("native wait"))
    }

    async fn close(&mut self) -> DriverResult<()>;
}

/// Factory for native connections of one engine.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    type Connection: NativeConnection + 'static;

    fn dialect(&self) -> Dialect;

    /// Build the normalized connection string for `purpose`.
    fn connection_string(
        &self,
        args: &ConnectionArguments,
        purpose: ConnectionPurpose,
    ) -> ConnectionString {
        args.connection_string(self.dialect(), purpose)
    }

    async fn connect(&self, connection_string: &ConnectionString)
    -> DriverResult<Self::Connection>;
}

const BROKEN_IO_KINDS: &[ErrorKind] = &[
    ErrorKind::BrokenPipe,
    ErrorKind::ConnectionReset,
    ErrorKind::ConnectionAborted,
    ErrorKind::ConnectionRefused,
    ErrorKind::NotConnected,
    ErrorKind::UnexpectedEof,
];

/// SQLSTATE codes outside class 08 that still end the session.
const PG_SHUTDOWN_CODES: &[&str] = &["57P01", "57P02", "57P03"];

/// SQL Server transport-level error numbers.
const SQL_SERVER_TRANSPORT_ERRORS: &[&str] = &[
    "2", "53", "64", "121", "233", "10053", "10054", "10060", "40613",
];

/// Message fragments from drivers that report nothing but text.
const LEGACY_BROKEN_MESSAGES: &[&str] = &[
    "broken pipe",
    "connection reset",
    "connection refused",
    "connection is closed",
    "server closed the connection",
    "terminating connection",
    "transport-level error",
    "physical connection is not usable",
    "no connection to the server",
];

/// Whether `err` means the connection is unusable.
///
/// Native signals (error kind, engine code) decide first. Text matching is
/// only consulted for errors that carry neither.
pub fn is_connection_broken(dialect: Dialect, err: &DriverError) -> bool {
    match err.kind {
        DriverErrorKind::Disconnected => return true,
        DriverErrorKind::Io(kind) if BROKEN_IO_KINDS.contains(&kind) => return true,
        DriverErrorKind::Io(_) => return false,
        _ => {}
    }

    if let Some(code) = err.code.as_deref() {
        return match dialect {
            Dialect::Postgres => code.starts_with("08") || PG_SHUTDOWN_CODES.contains(&code),
            Dialect::SqlServer => SQL_SERVER_TRANSPORT_ERRORS.contains(&code),
            Dialect::Sqlite => false,
        };
    }

    let message = err.message.to_ascii_lowercase();
    LEGACY_BROKEN_MESSAGES.iter().any(|m| message.contains(m))
}
