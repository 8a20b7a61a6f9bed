//! Windowed server-side cursors.
//!
//! A cursor counts its rows once on open and then serves `(offset, count)`
//! windows in any order. Engines with scrollable cursors keep one declared
//! on the server (`DECLARE ... SCROLL CURSOR WITH HOLD`); the rest re-run
//! the statement wrapped in a paging query for each window.

use crate::context::ConnectionContext;
use crate::driver::{Driver, Row};
use crate::error::{ConnError, ConnResult};
use sqlweave_core::ast::{Expr, FromEntry, Func, Select, Statement, Value, func};
use sqlweave_core::error::CoreError;
use sqlweave_core::resolver::ToSql;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Process-wide so cursor names never collide on a shared connection.
static NEXT_CURSOR_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Default)]
pub struct CursorManagerConfig {
    /// Maximum simultaneously open cursors; `None` means unlimited.
    pub max_cursors: Option<usize>,
}

impl CursorManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_cursors(mut self, max: usize) -> Self {
        self.max_cursors = Some(max);
        self
    }
}

/// Open cursors by id, with their server-side names.
#[derive(Default)]
struct Registry {
    open: Mutex<BTreeMap<u64, String>>,
}

impl Registry {
    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, String>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve a slot, failing when the limit is reached.
    fn reserve(&self, limit: Option<usize>) -> ConnResult<(u64, String)> {
        let mut open = self.lock();
        if let Some(limit) = limit
            && open.len() >= limit
        {
            return Err(ConnError::CursorLimitExceeded { limit });
        }
        let id = NEXT_CURSOR_ID.fetch_add(1, Ordering::Relaxed);
        let name = format!("sqlweave_cursor_{}", id);
        open.insert(id, name.clone());
        Ok((id, name))
    }

    /// Returns the name if the cursor was still registered.
    fn release(&self, id: u64) -> Option<String> {
        self.lock().remove(&id)
    }

    fn contains(&self, id: u64) -> bool {
        self.lock().contains_key(&id)
    }

    fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock()).into_values().collect()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Issues cursors over one connection context and tracks how many are open.
pub struct CursorManager<D: Driver> {
    ctx: Arc<ConnectionContext<D>>,
    config: CursorManagerConfig,
    registry: Arc<Registry>,
}

impl<D: Driver> CursorManager<D> {
    pub fn new(ctx: Arc<ConnectionContext<D>>, config: CursorManagerConfig) -> Self {
        Self {
            ctx,
            config,
            registry: Arc::new(Registry::default()),
        }
    }

    /// Number of cursors currently open.
    pub fn cursor_count(&self) -> usize {
        self.registry.len()
    }

    /// Open a cursor over a SELECT statement.
    ///
    /// Counts the rows once and, on engines with scrollable cursors, declares
    /// the server cursor. Fails with `CursorLimitExceeded` when the manager is
    /// at its configured maximum.
    pub async fn create_cursor(&self, statement: &Statement) -> ConnResult<Cursor<D>> {
        let select = statement
            .as_select()
            .ok_or_else(|| CoreError::invalid(format!("cursor over {}", statement.keyword())))?;
        select.validate()?;

        let (id, name) = self.registry.reserve(self.config.max_cursors)?;
        match self.open_cursor(id, name, select).await {
            Ok(cursor) => Ok(cursor),
            Err(e) => {
                self.registry.release(id);
                Err(e)
            }
        }
    }

    async fn open_cursor(&self, id: u64, name: String, select: &Select) -> ConnResult<Cursor<D>> {
        let dialect = self.ctx.dialect();

        let mut counted = select.clone();
        if is_unpaged(select) {
            counted.order_by.clear();
        }
        let count_query = Select::new()
            .column(func(Func::Count, []))
            .from(FromEntry::subquery(counted).alias("_count"));
        let resolved = count_query.resolve(dialect)?;
        let rows = self.ctx.query(&resolved.sql, &resolved.params).await?;
        let record_count = rows
            .first()
            .and_then(|row| row.get(0))
            .and_then(Value::as_i64)
            .map_or(0, |n| n.max(0) as u64);

        let scroll = dialect.supports_scroll_cursors();
        if scroll {
            let resolved = select.resolve(dialect)?;
            let declare = format!(
                "DECLARE {} SCROLL CURSOR WITH HOLD FOR {}",
                name, resolved.sql
            );
            self.ctx.execute(&declare, &resolved.params).await?;
        }
        tracing::debug!("Opened cursor {} over {} rows", name, record_count);

        Ok(Cursor {
            id,
            name,
            select: select.clone(),
            record_count,
            scroll,
            closed: false,
            window_lock: tokio::sync::Mutex::new(()),
            ctx: self.ctx.clone(),
            registry: self.registry.clone(),
        })
    }

    /// Close every cursor this manager still owns. Never fails.
    pub async fn close(&self) {
        let names = self.registry.drain();
        if self.ctx.dialect().supports_scroll_cursors() {
            for name in &names {
                close_server_cursor(&self.ctx, name).await;
            }
        }
        if !names.is_empty() {
            tracing::debug!("Cursor manager closed {} cursor(s)", names.len());
        }
    }
}

impl<D: Driver> Drop for CursorManager<D> {
    fn drop(&mut self) {
        let names = self.registry.drain();
        if names.is_empty() || !self.ctx.dialect().supports_scroll_cursors() {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let ctx = self.ctx.clone();
            handle.spawn(async move {
                for name in &names {
                    close_server_cursor(&ctx, name).await;
                }
            });
        }
    }
}

fn is_unpaged(select: &Select) -> bool {
    select.limit.is_none() && select.offset.is_none()
}

/// The statement restricted to `count` rows from `start`.
///
/// An ordered statement keeps its ordering: a plain one is paged in place,
/// a set operation moves its ORDER BY onto the `_window` wrapper.
fn window_query(select: &Select, start: u64, count: u64) -> Select {
    if !is_unpaged(select) || select.order_by.is_empty() {
        return Select::new()
            .from(FromEntry::subquery(select.clone()).alias("_window"))
            .limit(count)
            .offset(start);
    }
    if select.set_ops.is_empty() {
        return select.clone().limit(count).offset(start);
    }
    let mut inner = select.clone();
    let mut order_by = std::mem::take(&mut inner.order_by);
    for order in &mut order_by {
        qualify_with_window(&mut order.expr);
    }
    let mut window = Select::new()
        .from(FromEntry::subquery(inner).alias("_window"))
        .limit(count)
        .offset(start);
    window.order_by = order_by;
    window
}

fn qualify_with_window(expr: &mut Expr) {
    match expr {
        Expr::Column { table: Some(t), .. } => *t = "_window".to_string(),
        Expr::Function { args, .. } => args.iter_mut().for_each(qualify_with_window),
        Expr::Cast { expr, .. } | Expr::Not(expr) | Expr::IsNull { expr, .. } => {
            qualify_with_window(expr)
        }
        Expr::Binary { left, right, .. } => {
            qualify_with_window(left);
            qualify_with_window(right);
        }
        _ => {}
    }
}

async fn close_server_cursor<D: Driver>(ctx: &ConnectionContext<D>, name: &str) {
    if let Err(e) = ctx.execute(&format!("CLOSE {}", name), &[]).await {
        tracing::warn!("Failed to close cursor {}: {}", name, e);
    }
}

/// A bounded window of rows starting at `offset`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultWindow {
    pub offset: u64,
    pub rows: Vec<Row>,
}

impl ResultWindow {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct Cursor<D: Driver> {
    id: u64,
    name: String,
    select: Select,
    record_count: u64,
    scroll: bool,
    closed: bool,
    /// Keeps MOVE and FETCH of one window together.
    window_lock: tokio::sync::Mutex<()>,
    ctx: Arc<ConnectionContext<D>>,
    registry: Arc<Registry>,
}

impl<D: Driver> std::fmt::Debug for Cursor<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("name", &self.name)
            .field("record_count", &self.record_count)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<D: Driver> Cursor<D> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total rows, counted once when the cursor was opened.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    pub fn is_closed(&self) -> bool {
        self.closed || !self.registry.contains(self.id)
    }

    /// Fetch up to `count` rows starting at `offset`, clamped to the row
    /// count. Each call is independent of earlier windows.
    pub async fn execute(&self, offset: u64, count: u64) -> ConnResult<ResultWindow> {
        if self.is_closed() {
            return Err(CoreError::invalid(format!("cursor {} is closed", self.name)).into());
        }
        let start = offset.min(self.record_count);
        let count = count.min(self.record_count - start);
        if count == 0 {
            return Ok(ResultWindow {
                offset: start,
                rows: Vec::new(),
            });
        }

        let rows = if self.scroll {
            let _window = self.window_lock.lock().await;
            self.ctx
                .execute(&format!("MOVE ABSOLUTE {} IN {}", start, self.name), &[])
                .await?;
            self.ctx
                .query(&format!("FETCH FORWARD {} FROM {}", count, self.name), &[])
                .await?
        } else {
            let resolved = window_query(&self.select, start, count).resolve(self.ctx.dialect())?;
            self.ctx.query(&resolved.sql, &resolved.params).await?
        };
        Ok(ResultWindow {
            offset: start,
            rows,
        })
    }

    /// Release the cursor and close it on the server, best effort.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.registry.release(self.id).is_some() && self.scroll {
            close_server_cursor(&self.ctx, &self.name).await;
        }
        tracing::debug!("Closed cursor {}", self.name);
    }
}

impl<D: Driver> Drop for Cursor<D> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.registry.release(self.id).is_none() || !self.scroll {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let ctx = self.ctx.clone();
            let name = std::mem::take(&mut self.name);
            handle.spawn(async move {
                close_server_cursor(&ctx, &name).await;
            });
        }
    }
}
