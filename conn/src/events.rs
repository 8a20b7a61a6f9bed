//! Callback surface for server-pushed events.

use crate::driver::DriverError;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;

/// Receiver of connection events. Called from any thread; keep it cheap.
pub trait ConnectionEvents: Send + Sync {
    /// `NOTIFY` payload from the server session `process_id`.
    fn on_notify(&self, process_id: i32, channel: &str, payload: &str) {
        let _ = (process_id, channel, payload);
    }

    /// Informational or warning message from the server.
    fn on_info_message(&self, message: &str, detail: Option<&str>) {
        let _ = (message, detail);
    }

    /// A supervised listener lost its connection and will reconnect.
    fn on_connection_lost(&self, error: &DriverError) {
        let _ = error;
    }
}

/// A delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub process_id: i32,
    pub channel: String,
    pub payload: String,
}

/// Forward notifications into a channel; a closed receiver drops them.
impl ConnectionEvents for mpsc::UnboundedSender<Notification> {
    fn on_notify(&self, process_id: i32, channel: &str, payload: &str) {
        let _ = self.send(Notification {
            process_id,
            channel: channel.to_string(),
            payload: payload.to_string(),
        });
    }
}

/// Fan-out to every subscriber, in subscription order.
#[derive(Default)]
pub struct EventHub {
    subscribers: RwLock<Vec<Arc<dyn ConnectionEvents>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Arc<dyn ConnectionEvents>) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn each(&self, f: impl Fn(&dyn ConnectionEvents)) {
        let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
        for s in subscribers.iter() {
            f(s.as_ref());
        }
    }
}

impl ConnectionEvents for EventHub {
    fn on_notify(&self, process_id: i32, channel: &str, payload: &str) {
        self.each(|s| s.on_notify(process_id, channel, payload));
    }

    fn on_info_message(&self, message: &str, detail: Option<&str>) {
        self.each(|s| s.on_info_message(message, detail));
    }

    fn on_connection_lost(&self, error: &DriverError) {
        self.each(|s| s.on_connection_lost(error));
    }
}
