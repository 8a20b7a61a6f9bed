//! Background delivery of server notifications.
//!
//! The listener owns a dedicated context. Notifications reach subscribers
//! through the context's wired events; the loop only keeps the session
//! busy enough for the driver to read them, using one of two strategies:
//!
//! - [`PollingKeepalive`]: sleep, then run the engine's no-op statement.
//! - [`BlockingWait`]: park in the driver's native wait.

use crate::cancel::CancelToken;
use crate::context::{ConnectionContext, ContextState};
use crate::driver::{Driver, DriverError};
use crate::error::{ConnError, ConnResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Pause after a transient error before the next wait.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// One step of waiting for server messages.
#[async_trait]
pub trait WaitForNotification<D: Driver>: Send + Sync {
    async fn wait(&self, ctx: &ConnectionContext<D>) -> ConnResult<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct PollingKeepalive {
    pub interval: Duration,
}

impl Default for PollingKeepalive {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

#[async_trait]
impl<D: Driver> WaitForNotification<D> for PollingKeepalive {
    async fn wait(&self, ctx: &ConnectionContext<D>) -> ConnResult<()> {
        tokio::time::sleep(self.interval).await;
        ctx.keepalive().await
    }
}

/// Native wait; `None` waits until something arrives.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingWait {
    pub timeout: Option<Duration>,
}

#[async_trait]
impl<D: Driver> WaitForNotification<D> for BlockingWait {
    async fn wait(&self, ctx: &ConnectionContext<D>) -> ConnResult<()> {
        ctx.wait_for_notification(self.timeout).await?;
        Ok(())
    }
}

/// Strategy choice for configuration.
#[derive(Debug, Clone, Copy)]
pub enum ListenStrategy {
    PollingKeepalive(PollingKeepalive),
    BlockingWait(BlockingWait),
}

impl Default for ListenStrategy {
    fn default() -> Self {
        Self::PollingKeepalive(PollingKeepalive::default())
    }
}

impl ListenStrategy {
    pub fn polling(interval: Duration) -> Self {
        Self::PollingKeepalive(PollingKeepalive { interval })
    }

    pub fn blocking(timeout: Option<Duration>) -> Self {
        Self::BlockingWait(BlockingWait { timeout })
    }

    pub fn waiter<D: Driver>(&self) -> Box<dyn WaitForNotification<D>> {
        match *self {
            Self::PollingKeepalive(s) => Box::new(s),
            Self::BlockingWait(s) => Box::new(s),
        }
    }
}

/// Why a listener loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerExit {
    Cancelled,
    Broken(DriverError),
}

pub struct Listener<D: Driver> {
    ctx: Arc<ConnectionContext<D>>,
    waiter: Box<dyn WaitForNotification<D>>,
    channels: Vec<String>,
}

impl<D: Driver> Listener<D> {
    pub fn new(ctx: Arc<ConnectionContext<D>>, waiter: Box<dyn WaitForNotification<D>>) -> Self {
        Self {
            ctx,
            waiter,
            channels: Vec::new(),
        }
    }

    /// Subscribe to `channel` when the loop starts.
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channels.push(channel.into());
        self
    }

    pub fn channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels.extend(channels.into_iter().map(Into::into));
        self
    }

    /// Run until `token` is cancelled or the connection breaks.
    ///
    /// Opens the context if needed and always closes it on the way out.
    /// A cancel during a wait returns promptly and discards that wait's
    /// outcome. Setup failures (connect, LISTEN) are returned as errors;
    /// `Broken` means the session was up and then lost.
    pub async fn run(self, token: &CancelToken) -> ConnResult<ListenerExit> {
        let exit = tokio::select! {
            biased;
            _ = token.cancelled() => Ok(ListenerExit::Cancelled),
            exit = self.run_loop(token) => exit,
        };
        self.ctx.close().await;
        match &exit {
            Ok(ListenerExit::Cancelled) => tracing::info!("Listener stopped"),
            Ok(ListenerExit::Broken(e)) => tracing::info!("Listener lost its connection: {}", e),
            Err(e) => tracing::warn!("Listener failed: {}", e),
        }
        exit
    }

    async fn run_loop(&self, token: &CancelToken) -> ConnResult<ListenerExit> {
        if self.ctx.state().await == ContextState::Created {
            self.ctx.open().await?;
        }

        let dialect = self.ctx.dialect();
        for channel in &self.channels {
            self.ctx.execute(&dialect.listen_sql(channel)?, &[]).await?;
        }
        tracing::info!(
            "Listener started on {} ({} channel(s))",
            dialect,
            self.channels.len()
        );

        while !token.is_cancelled() {
            match self.waiter.wait(&self.ctx).await {
                Ok(()) => {}
                Err(ConnError::ConnectionBroken(e)) => return Ok(ListenerExit::Broken(e)),
                Err(ConnError::TransientExecution(e)) => {
                    tracing::warn!("Transient listener error, retrying: {}", e);
                    token.sleep(RETRY_DELAY).await;
                }
                Err(other) => return Err(other),
            }
        }
        Ok(ListenerExit::Cancelled)
    }
}
