use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::metrics;

pub mod events;
pub mod session;

pub use events::{EventError, EventKind, RelayEvent};
pub use session::{DisconnectReason, HeartbeatConfig, SessionState, WsSession};

/// Unique identifier for a relay connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether the connection that sent an event also receives it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanoutMode {
    #[default]
    ExcludeSender,
    IncludeSender,
}

impl FromStr for FanoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "others" | "exclude-sender" => Ok(FanoutMode::ExcludeSender),
            "all" | "include-sender" => Ok(FanoutMode::IncludeSender),
            other => Err(format!("unknown fan-out mode '{}', expected 'others' or 'all'", other)),
        }
    }
}

/// Connection registry for relay sessions
///
/// Maps each live connection to the channel its session drains. One lock
/// guards the map; sends are non-blocking pushes, so the lock is never held
/// across socket I/O. Broadcasts take the write lock, which also gives every
/// receiver the same event order.
#[derive(Default, Clone)]
pub struct RelayHub {
    inner: Arc<RwLock<HashMap<ConnectionId, UnboundedSender<String>>>>,
}

impl RelayHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection
    ///
    /// Returns the connection id and the receiver its session forwards to
    /// the socket.
    pub fn register(&self) -> (ConnectionId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let id = ConnectionId::new();

        let mut guard = self.inner.write();
        guard.insert(id, tx);
        metrics::set_active_connections(guard.len());

        tracing::debug!(connection_id = %id, total = guard.len(), "Registered connection");
        (id, rx)
    }

    /// Returns whether the connection was still registered
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let mut guard = self.inner.write();
        let removed = guard.remove(&id).is_some();
        metrics::set_active_connections(guard.len());

        if removed {
            tracing::debug!(connection_id = %id, remaining = guard.len(), "Unregistered connection");
        }
        removed
    }

    /// Deliver `frame` to every connection the mode selects
    ///
    /// Connections whose receiver is gone are pruned. Returns how many
    /// connections the frame was handed to.
    pub fn broadcast(&self, origin: ConnectionId, frame: &str, mode: FanoutMode) -> usize {
        let mut guard = self.inner.write();
        let before = guard.len();
        let mut delivered = 0;

        guard.retain(|id, sender| {
            if mode == FanoutMode::ExcludeSender && *id == origin {
                return !sender.is_closed();
            }
            match sender.send(frame.to_owned()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });

        let after = guard.len();
        if before != after {
            metrics::set_active_connections(after);
            tracing::debug!(
                pruned = before - after,
                active = after,
                "Dead connections cleaned up during broadcast"
            );
        }

        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.inner.read().len()
    }
}
