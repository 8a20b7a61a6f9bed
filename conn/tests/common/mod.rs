//! In-memory driver that interprets the handful of statements the crate
//! itself issues (keepalive, process id, cursor and paging queries) and
//! serves everything else from registered datasets.

#![allow(dead_code)]

use async_trait::async_trait;
use sqlweave_conn::{
    ConnectionEvents, ConnectionString, Driver, DriverError, DriverResult,
    NativeConnection, Row,
};
use sqlweave_core::ast::Value;
use sqlweave_core::resolver::Dialect;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
pub struct FakeState {
    pub connects: AtomicUsize,
    pub open_connections: AtomicUsize,
    pub connection_strings: Mutex<Vec<String>>,
    pub log: Mutex<Vec<String>>,
    datasets: Mutex<HashMap<String, Vec<Row>>>,
    failures: Mutex<HashMap<String, DriverError>>,
    pending: Mutex<Vec<(String, String)>>,
    generation: AtomicUsize,
    refuse_connects: AtomicUsize,
    pub eager_pid: AtomicBool,
}

pub const FAKE_PID: i32 = 4242;

impl FakeState {
    /// Serve `rows` for statements whose SQL is exactly `sql`.
    pub fn dataset(&self, sql: &str, rows: Vec<Row>) {
        self.datasets.lock().unwrap().insert(sql.to_string(), rows);
    }

    /// Fail the next statement whose SQL is exactly `sql`.
    pub fn fail_once(&self, sql: &str, err: DriverError) {
        self.failures.lock().unwrap().insert(sql.to_string(), err);
    }

    /// Queue a notification for the next keepalive or wait.
    pub fn notify(&self, channel: &str, payload: &str) {
        self.pending
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.to_string()));
    }

    /// Break every connection opened so far.
    pub fn kill_connections(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn refuse_connects(&self, n: usize) {
        self.refuse_connects.store(n, Ordering::SeqCst);
    }

    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count_statements(&self, prefix: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.starts_with(prefix))
            .count()
    }

    pub fn open_connections(&self) -> usize {
        self.open_connections.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn rows_for(&self, sql: &str) -> Vec<Row> {
        self.datasets
            .lock()
            .unwrap()
            .get(sql)
            .cloned()
            .unwrap_or_default()
    }
}

/// `n` single-column rows holding `0..n`.
pub fn numbered_rows(n: i64) -> Vec<Row> {
    (0..n).map(|i| Row::new(vec![Value::Int(i)])).collect()
}

pub fn row_ints(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .filter_map(|r| r.get(0).and_then(Value::as_i64))
        .collect()
}

pub struct FakeDriver {
    pub dialect: Dialect,
    pub state: Arc<FakeState>,
}

impl FakeDriver {
    pub fn new(dialect: Dialect) -> (Self, Arc<FakeState>) {
        let state = Arc::new(FakeState::default());
        (
            Self {
                dialect,
                state: state.clone(),
            },
            state,
        )
    }
}

#[async_trait]
impl Driver for FakeDriver {
    type Connection = FakeConnection;

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn connect(&self, connection_string: &ConnectionString) -> DriverResult<FakeConnection> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        self.state
            .connection_strings
            .lock()
            .unwrap()
            .push(connection_string.to_string());

        let refused = self
            .state
            .refuse_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into());
        }

        self.state.open_connections.fetch_add(1, Ordering::SeqCst);
        Ok(FakeConnection {
            dialect: self.dialect,
            state: self.state.clone(),
            generation: self.state.generation.load(Ordering::SeqCst),
            sink: None,
            cursors: HashMap::new(),
        })
    }
}

struct ServerCursor {
    rows: Vec<Row>,
    position: usize,
}

pub struct FakeConnection {
    dialect: Dialect,
    state: Arc<FakeState>,
    generation: usize,
    sink: Option<Arc<dyn ConnectionEvents>>,
    cursors: HashMap<String, ServerCursor>,
}

impl FakeConnection {
    fn check_alive(&self) -> DriverResult<()> {
        if self.state.generation.load(Ordering::SeqCst) != self.generation {
            return Err(DriverError::disconnected("server closed the connection"));
        }
        Ok(())
    }

    fn deliver_pending(&self) -> bool {
        let pending = std::mem::take(&mut *self.state.pending.lock().unwrap());
        let delivered = !pending.is_empty();
        if let Some(sink) = &self.sink {
            for (channel, payload) in pending {
                sink.on_notify(FAKE_PID, &channel, &payload);
            }
        }
        delivered
    }

    fn run(&mut self, sql: &str) -> DriverResult<Vec<Row>> {
        self.state.log.lock().unwrap().push(sql.to_string());
        self.check_alive()?;
        if let Some(err) = self.state.failures.lock().unwrap().remove(sql) {
            return Err(err);
        }

        if sql == "SELECT pg_backend_pid()" || sql == "SELECT @@SPID" {
            return Ok(vec![Row::new(vec![Value::Int(FAKE_PID as i64)])]);
        }
        if sql == "SELECT 1" {
            self.deliver_pending();
            return Ok(vec![Row::new(vec![Value::Int(1)])]);
        }
        if sql.starts_with("LISTEN ") {
            return Ok(vec![]);
        }
        if let Some(inner) = sql
            .strip_prefix("SELECT COUNT(*) FROM (")
            .and_then(|s| s.strip_suffix(") AS _count"))
        {
            let n = self.state.rows_for(inner).len() as i64;
            return Ok(vec![Row::new(vec![Value::Int(n)])]);
        }
        if let Some(rest) = sql.strip_prefix("DECLARE ") {
            let (name, inner) = rest
                .split_once(" SCROLL CURSOR WITH HOLD FOR ")
                .ok_or_else(|| DriverError::statement("42601", "bad DECLARE"))?;
            let rows = self.state.rows_for(inner);
            self.cursors
                .insert(name.to_string(), ServerCursor { rows, position: 0 });
            return Ok(vec![]);
        }
        if let Some(rest) = sql.strip_prefix("MOVE ABSOLUTE ") {
            let (n, name) = rest
                .split_once(" IN ")
                .ok_or_else(|| DriverError::statement("42601", "bad MOVE"))?;
            let cursor = self.cursor(name)?;
            cursor.position = n.parse().unwrap();
            return Ok(vec![]);
        }
        if let Some(rest) = sql.strip_prefix("FETCH FORWARD ") {
            let (n, name) = rest
                .split_once(" FROM ")
                .ok_or_else(|| DriverError::statement("42601", "bad FETCH"))?;
            let n: usize = n.parse().unwrap();
            let cursor = self.cursor(name)?;
            let start = cursor.position.min(cursor.rows.len());
            let end = (start + n).min(cursor.rows.len());
            cursor.position = end;
            return Ok(cursor.rows[start..end].to_vec());
        }
        if let Some(name) = sql.strip_prefix("CLOSE ") {
            self.cursors
                .remove(name)
                .ok_or_else(|| DriverError::statement("34000", "cursor does not exist"))?;
            return Ok(vec![]);
        }
        if let Some(rest) = sql.strip_prefix("SELECT * FROM (")
            && let Some((inner, paging)) = rest.rsplit_once(") AS _window ")
        {
            let (offset, limit) = parse_paging(self.dialect, paging);
            let rows = self.state.rows_for(inner);
            return Ok(rows.into_iter().skip(offset).take(limit).collect());
        }

        Ok(self.state.rows_for(sql))
    }

    fn cursor(&mut self, name: &str) -> DriverResult<&mut ServerCursor> {
        self.cursors
            .get_mut(name)
            .ok_or_else(|| DriverError::statement("34000", "cursor does not exist"))
    }
}

/// Returns `(offset, limit)` from a window query's paging tail.
fn parse_paging(dialect: Dialect, paging: &str) -> (usize, usize) {
    match dialect {
        Dialect::SqlServer => {
            let rest = paging
                .strip_prefix("ORDER BY (SELECT NULL) OFFSET ")
                .unwrap();
            let (offset, rest) = rest.split_once(" ROWS FETCH NEXT ").unwrap();
            let limit = rest.strip_suffix(" ROWS ONLY").unwrap();
            (offset.parse().unwrap(), limit.parse().unwrap())
        }
        Dialect::Postgres | Dialect::Sqlite => {
            let rest = paging.strip_prefix("LIMIT ").unwrap();
            let (limit, offset) = rest.split_once(" OFFSET ").unwrap();
            (offset.parse().unwrap(), limit.parse().unwrap())
        }
    }
}

#[async_trait]
impl NativeConnection for FakeConnection {
    fn process_id(&self) -> Option<i32> {
        self.state
            .eager_pid
            .load(Ordering::SeqCst)
            .then_some(FAKE_PID)
    }

    async fn query(&mut self, sql: &str, _params: &[Value]) -> DriverResult<Vec<Row>> {
        self.run(sql)
    }

    async fn execute(&mut self, sql: &str, _params: &[Value]) -> DriverResult<u64> {
        self.run(sql).map(|rows| rows.len() as u64)
    }

    fn wire_events(&mut self, sink: Arc<dyn ConnectionEvents>) {
        self.sink = Some(sink);
    }

    fn unwire_events(&mut self) {
        self.sink = None;
    }

    async fn wait(&mut self, timeout: Option<Duration>) -> DriverResult<bool> {
        self.state.log.lock().unwrap().push("WAIT".to_string());
        let deadline = tokio::time::Instant::now() + timeout.unwrap_or(Duration::from_secs(60));
        loop {
            self.check_alive()?;
            if self.deliver_pending() {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.state.log.lock().unwrap().push("DISCONNECT".to_string());
        Ok(())
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.state.open_connections.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Poll `cond` until it holds or a second passes.
pub async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
