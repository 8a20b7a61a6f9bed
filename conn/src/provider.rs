//! Entry point tying a driver to connection arguments.
//!
//! The provider hands out fresh contexts, cursor managers and supervised
//! listeners. A broken context is never reopened; the supervisor replaces
//! it with a new one and backs off between attempts.

use crate::args::{ConnectionArguments, ConnectionPurpose};
use crate::cancel::CancelToken;
use crate::context::ConnectionContext;
use crate::cursor::{CursorManager, CursorManagerConfig};
use crate::driver::Driver;
use crate::error::{ConnError, ConnResult};
use crate::events::{ConnectionEvents, EventHub};
use crate::listener::{ListenStrategy, Listener, ListenerExit};
use sqlweave_core::resolver::Dialect;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Exponential backoff between listener reconnects.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Consecutive failed attempts before giving up; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Delay before the 1-based `attempt`: doubles each time, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListenerConfig {
    pub channels: Vec<String>,
    pub strategy: ListenStrategy,
    pub reconnect: ReconnectPolicy,
}

impl ListenerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channels.push(channel.into());
        self
    }

    pub fn strategy(mut self, strategy: ListenStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

pub struct Provider<D: Driver> {
    driver: Arc<D>,
    arguments: ConnectionArguments,
    events: Arc<EventHub>,
}

impl<D: Driver> Provider<D> {
    pub fn new(driver: D, arguments: ConnectionArguments) -> Self {
        Self {
            driver: Arc::new(driver),
            arguments,
            events: Arc::new(EventHub::new()),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.driver.dialect()
    }

    pub fn arguments(&self) -> &ConnectionArguments {
        &self.arguments
    }

    /// Events from every context this provider creates.
    pub fn events(&self) -> &Arc<EventHub> {
        &self.events
    }

    pub fn subscribe(&self, subscriber: Arc<dyn ConnectionEvents>) {
        self.events.subscribe(subscriber);
    }

    /// A new, unopened context for ordinary queries.
    pub fn create_context(&self) -> ConnectionContext<D> {
        self.context_for(ConnectionPurpose::Query)
    }

    /// A new, unopened context tuned for long-lived notification sessions.
    pub fn create_notify_context(&self) -> ConnectionContext<D> {
        self.context_for(ConnectionPurpose::Notify)
    }

    fn context_for(&self, purpose: ConnectionPurpose) -> ConnectionContext<D> {
        let connection_string = self.driver.connection_string(&self.arguments, purpose);
        ConnectionContext::new(self.driver.clone(), connection_string, self.events.clone())
    }

    /// Create and open a query context.
    pub async fn open_context(&self) -> ConnResult<Arc<ConnectionContext<D>>> {
        let ctx = self.create_context();
        ctx.open().await?;
        Ok(Arc::new(ctx))
    }

    pub fn cursor_manager(
        &self,
        ctx: Arc<ConnectionContext<D>>,
        config: CursorManagerConfig,
    ) -> CursorManager<D> {
        CursorManager::new(ctx, config)
    }

    /// Start a supervised listener in the background.
    ///
    /// Each attempt gets its own notify context. When the connection breaks
    /// subscribers see `on_connection_lost`, then the listener reconnects
    /// after the policy's backoff. Must be called inside a tokio runtime.
    pub fn listen(&self, config: ListenerConfig) -> ListenerHandle {
        let token = CancelToken::new();
        let supervisor = Supervisor {
            driver: self.driver.clone(),
            arguments: self.arguments.clone(),
            events: self.events.clone(),
            config,
        };
        let task = tokio::spawn(supervisor.run(token.clone()));
        ListenerHandle { token, task }
    }
}

struct Supervisor<D: Driver> {
    driver: Arc<D>,
    arguments: ConnectionArguments,
    events: Arc<EventHub>,
    config: ListenerConfig,
}

impl<D: Driver> Supervisor<D> {
    fn listener(&self) -> Listener<D> {
        let connection_string = self
            .driver
            .connection_string(&self.arguments, ConnectionPurpose::Notify);
        let ctx = ConnectionContext::new(
            self.driver.clone(),
            connection_string,
            self.events.clone(),
        );
        Listener::new(Arc::new(ctx), self.config.strategy.waiter())
            .channels(self.config.channels.iter().cloned())
    }

    async fn run(self, token: CancelToken) -> ConnResult<()> {
        let policy = &self.config.reconnect;
        let mut attempt: u32 = 0;

        while !token.is_cancelled() {
            let lost = match self.listener().run(&token).await {
                Ok(ListenerExit::Cancelled) => return Ok(()),
                Ok(ListenerExit::Broken(e)) => {
                    // The session was up, so the failure streak starts over.
                    attempt = 0;
                    e
                }
                Err(ConnError::ConnectionBroken(e)) => e,
                Err(other) => return Err(other),
            };
            attempt += 1;
            if let Some(max) = policy.max_attempts
                && attempt > max
            {
                tracing::warn!("Listener giving up after {} attempt(s): {}", max, lost);
                return Err(ConnError::ConnectionBroken(lost));
            }
            self.events.on_connection_lost(&lost);
            let delay = policy.backoff(attempt);
            tracing::info!(
                "Listener reconnecting in {:?} (attempt {}): {}",
                delay,
                attempt,
                lost
            );
            if token.sleep(delay).await {
                break;
            }
        }
        Ok(())
    }
}

/// Handle to a running supervised listener.
pub struct ListenerHandle {
    token: CancelToken,
    task: JoinHandle<ConnResult<()>>,
}

impl ListenerHandle {
    /// Request shutdown without waiting for it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the listener to release its connection.
    pub async fn stop(self) -> ConnResult<()> {
        self.token.cancel();
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Ok(()),
        }
    }

    /// Wait for the listener to end on its own (e.g. reconnects exhausted).
    pub async fn join(self) -> ConnResult<()> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Ok(()),
        }
    }
}
