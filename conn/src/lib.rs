//! Connection lifecycle on top of `sqlweave-core`.
//!
//! - [`ConnectionContext`]: one physical connection with lazy open, cached
//!   process id and broken-connection detection.
//! - [`Listener`] / [`Provider::listen`]: background notification delivery
//!   that reconnects after the session breaks.
//! - [`CursorManager`]: windowed access to large result sets.
//!
//! The native wire driver is a collaborator behind the [`Driver`] trait.
//!
//! ```ignore
//! let provider = Provider::new(driver, ConnectionArguments::new("db", "app"));
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! provider.subscribe(Arc::new(tx));
//! let handle = provider.listen(ListenerConfig::new().channel("orders"));
//! while let Some(n) = rx.recv().await {
//!     println!("{}: {}", n.channel, n.payload);
//! }
//! handle.stop().await?;
//! ```

pub mod args;
pub mod cancel;
pub mod context;
pub mod cursor;
pub mod driver;
pub mod error;
pub mod events;
pub mod listener;
pub mod provider;

pub use args::{ConnectionArguments, ConnectionPurpose, ConnectionString};
pub use cancel::CancelToken;
pub use context::{ConnectionContext, ContextState};
pub use cursor::{Cursor, CursorManager, CursorManagerConfig, ResultWindow};
pub use driver::{
    Driver, DriverError, DriverErrorKind, DriverResult, NativeConnection, Row,
    is_connection_broken,
};
pub use error::{ConnError, ConnResult};
pub use events::{ConnectionEvents, EventHub, Notification};
pub use listener::{
    BlockingWait, ListenStrategy, Listener, ListenerExit, PollingKeepalive, WaitForNotification,
};
pub use provider::{ListenerConfig, ListenerHandle, Provider, ReconnectPolicy};
