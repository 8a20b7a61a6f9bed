//! Connection context: one physical connection and its lifecycle.
//!
//! Every use of the connection is serialized behind the context lock, which
//! also guards the lifecycle state and the cached process id.

use crate::args::ConnectionString;
use crate::driver::{self, Driver, DriverError, NativeConnection, Row};
use crate::error::{ConnError, ConnResult};
use crate::events::ConnectionEvents;
use sqlweave_core::ast::{Statement, Value};
use sqlweave_core::resolver::{Dialect, resolve};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Created,
    Open,
    /// The connection failed underneath; only `close` is meaningful.
    Broken,
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextState::Created => write!(f, "created"),
            ContextState::Open => write!(f, "open"),
            ContextState::Broken => write!(f, "broken"),
            ContextState::Closed => write!(f, "closed"),
        }
    }
}

struct Inner<C> {
    state: ContextState,
    conn: Option<C>,
    process_id: Option<i32>,
}

impl<C> Inner<C> {
    fn connection(&mut self) -> ConnResult<&mut C> {
        match (self.state, self.conn.as_mut()) {
            (ContextState::Open, Some(conn)) => Ok(conn),
            (state, _) => Err(ConnError::InvalidState(state)),
        }
    }
}

pub struct ConnectionContext<D: Driver> {
    driver: Arc<D>,
    connection_string: ConnectionString,
    events: Arc<dyn ConnectionEvents>,
    inner: Mutex<Inner<D::Connection>>,
}

impl<D: Driver> ConnectionContext<D> {
    pub fn new(
        driver: Arc<D>,
        connection_string: ConnectionString,
        events: Arc<dyn ConnectionEvents>,
    ) -> Self {
        Self {
            driver,
            connection_string,
            events,
            inner: Mutex::new(Inner {
                state: ContextState::Created,
                conn: None,
                process_id: None,
            }),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.driver.dialect()
    }

    pub fn connection_string(&self) -> &ConnectionString {
        &self.connection_string
    }

    pub async fn state(&self) -> ContextState {
        self.inner.lock().await.state
    }

    /// Connect and wire event forwarding. Opening an open context is a no-op.
    pub async fn open(&self) -> ConnResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            ContextState::Open => return Ok(()),
            ContextState::Created => {}
            state => return Err(ConnError::InvalidState(state)),
        }

        let mut conn = match self.driver.connect(&self.connection_string).await {
            Ok(conn) => conn,
            Err(err) => return Err(self.classify(err)),
        };
        conn.wire_events(self.events.clone());
        inner.process_id = conn.process_id();
        inner.conn = Some(conn);
        inner.state = ContextState::Open;
        tracing::debug!(
            "Opened {} connection (process id {:?})",
            self.dialect(),
            inner.process_id
        );
        Ok(())
    }

    /// Unwire events, close the connection and forget the process id.
    /// Idempotent; close failures are logged, never returned.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(mut conn) = inner.conn.take() {
            conn.unwire_events();
            if let Err(e) = conn.close().await {
                tracing::warn!("Error closing {} connection: {}", self.dialect(), e);
            }
            tracing::debug!("Closed {} connection", self.dialect());
        }
        inner.process_id = None;
        inner.state = ContextState::Closed;
    }

    /// Server process id of the open connection.
    ///
    /// Uses the id reported at connect time, otherwise fetches it once with a
    /// scalar query. `None` when not open or the engine has no such id.
    pub async fn process_id(&self) -> Option<i32> {
        let mut inner = self.inner.lock().await;
        if inner.state != ContextState::Open {
            return None;
        }
        if inner.process_id.is_some() {
            return inner.process_id;
        }

        let sql = self.dialect().process_id_sql()?;
        let conn = inner.connection().ok()?;
        match conn.query(sql, &[]).await {
            Ok(rows) => {
                let pid = rows
                    .first()
                    .and_then(|row| row.get(0))
                    .and_then(Value::as_i64)
                    .and_then(|n| i32::try_from(n).ok());
                inner.process_id = pid;
                pid
            }
            Err(err) => {
                let err = self.fail(&mut inner, err);
                tracing::debug!("Could not fetch process id: {}", err);
                None
            }
        }
    }

    pub async fn query(&self, sql: &str, params: &[Value]) -> ConnResult<Vec<Row>> {
        let mut inner = self.inner.lock().await;
        let conn = inner.connection()?;
        match conn.query(sql, params).await {
            Ok(rows) => Ok(rows),
            Err(err) => Err(self.fail(&mut inner, err)),
        }
    }

    pub async fn execute(&self, sql: &str, params: &[Value]) -> ConnResult<u64> {
        let mut inner = self.inner.lock().await;
        let conn = inner.connection()?;
        match conn.execute(sql, params).await {
            Ok(affected) => Ok(affected),
            Err(err) => Err(self.fail(&mut inner, err)),
        }
    }

    /// Resolve a statement for this connection's dialect and run it.
    pub async fn query_statement(&self, statement: &Statement) -> ConnResult<Vec<Row>> {
        let resolved = resolve(self.dialect(), statement)?;
        self.query(&resolved.sql, &resolved.params).await
    }

    pub async fn execute_statement(&self, statement: &Statement) -> ConnResult<u64> {
        let resolved = resolve(self.dialect(), statement)?;
        self.execute(&resolved.sql, &resolved.params).await
    }

    /// Cheapest round-trip the engine offers. Pending notifications are
    /// delivered through the wired events while it runs.
    pub async fn keepalive(&self) -> ConnResult<()> {
        self.query(self.dialect().keepalive_sql(), &[]).await?;
        Ok(())
    }

    /// Driver-native wait for a server-pushed message.
    pub async fn wait_for_notification(&self, timeout: Option<Duration>) -> ConnResult<bool> {
        let mut inner = self.inner.lock().await;
        let conn = inner.connection()?;
        match conn.wait(timeout).await {
            Ok(arrived) => Ok(arrived),
            Err(err) => Err(self.fail(&mut inner, err)),
        }
    }

    pub fn is_connection_broken(&self, err: &DriverError) -> bool {
        driver::is_connection_broken(self.dialect(), err)
    }

    fn classify(&self, err: DriverError) -> ConnError {
        if self.is_connection_broken(&err) {
            ConnError::ConnectionBroken(err)
        } else {
            ConnError::TransientExecution(err)
        }
    }

    /// Classify a failure, dropping the connection when it is broken.
    fn fail(&self, inner: &mut Inner<D::Connection>, err: DriverError) -> ConnError {
        let err = self.classify(err);
        if err.is_connection_broken() {
            tracing::warn!("{} connection broken: {}", self.dialect(), err);
            if let Some(mut conn) = inner.conn.take() {
                conn.unwire_events();
            }
            inner.process_id = None;
            inner.state = ContextState::Broken;
        }
        err
    }
}
