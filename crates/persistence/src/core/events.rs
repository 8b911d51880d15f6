//! Connection events and observers.
//!
//! Every store operation reports what it sends, and anything that went
//! wrong, to a [`ConnectionObserver`]. Observers only watch: nothing they
//! do changes the outcome of the operation that emitted the event.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// An event emitted by a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// An outgoing request.
    Request {
        /// HTTP method.
        method: String,
        /// Request path relative to the store URL, including the query string.
        path: String,
        /// When the request was issued.
        at: DateTime<Utc>,
    },
    /// A request failed at the transport level.
    Error {
        /// Failure description.
        message: String,
        /// When the failure was observed.
        at: DateTime<Utc>,
    },
    /// An operation degraded without failing.
    Warning {
        /// Warning description.
        message: String,
        /// When the warning was raised.
        at: DateTime<Utc>,
    },
}

impl ConnectionEvent {
    /// Creates a request event stamped now.
    pub fn request(method: impl Into<String>, path: impl Into<String>) -> Self {
        ConnectionEvent::Request {
            method: method.into(),
            path: path.into(),
            at: Utc::now(),
        }
    }

    /// Creates an error event stamped now.
    pub fn error(message: impl Into<String>) -> Self {
        ConnectionEvent::Error {
            message: message.into(),
            at: Utc::now(),
        }
    }

    /// Creates a warning event stamped now.
    pub fn warning(message: impl Into<String>) -> Self {
        ConnectionEvent::Warning {
            message: message.into(),
            at: Utc::now(),
        }
    }

    /// Returns the event kind as a short name.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionEvent::Request { .. } => "request",
            ConnectionEvent::Error { .. } => "error",
            ConnectionEvent::Warning { .. } => "warning",
        }
    }

    /// Returns when the event happened.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            ConnectionEvent::Request { at, .. }
            | ConnectionEvent::Error { at, .. }
            | ConnectionEvent::Warning { at, .. } => *at,
        }
    }
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionEvent::Request { method, path, .. } => write!(f, "{} {}", method, path),
            ConnectionEvent::Error { message, .. } => write!(f, "error: {}", message),
            ConnectionEvent::Warning { message, .. } => write!(f, "warning: {}", message),
        }
    }
}

/// Receives connection events.
pub trait ConnectionObserver: Send + Sync {
    /// Called once per event, synchronously, from the emitting operation.
    fn notify(&self, event: &ConnectionEvent);
}

/// Logs events through `tracing`. This is the default observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ConnectionObserver for TracingObserver {
    fn notify(&self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::Request { method, path, .. } => {
                tracing::debug!(method = %method, path = %path, "Store request");
            }
            ConnectionEvent::Error { message, .. } => {
                tracing::error!(error = %message, "Store request failed");
            }
            ConnectionEvent::Warning { message, .. } => {
                tracing::warn!(warning = %message, "Store operation degraded");
            }
        }
    }
}

/// Fans events out over a broadcast channel.
///
/// Events sent while nobody is subscribed are dropped, as are events a
/// lagging receiver falls behind on.
pub struct BroadcastObserver {
    tx: broadcast::Sender<ConnectionEvent>,
}

impl BroadcastObserver {
    /// Creates an observer buffering up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribes to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastObserver {
    fn default() -> Self {
        Self::new(64)
    }
}

impl ConnectionObserver for BroadcastObserver {
    fn notify(&self, event: &ConnectionEvent) {
        let _ = self.tx.send(event.clone());
    }
}

impl fmt::Debug for BroadcastObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastObserver")
            .field("receivers", &self.tx.receiver_count())
            .finish()
    }
}

/// Adapts a closure into an observer.
pub struct CallbackObserver<F>(F);

impl<F> CallbackObserver<F>
where
    F: Fn(&ConnectionEvent) + Send + Sync,
{
    /// Wraps `callback`.
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F> ConnectionObserver for CallbackObserver<F>
where
    F: Fn(&ConnectionEvent) + Send + Sync,
{
    fn notify(&self, event: &ConnectionEvent) {
        (self.0)(event)
    }
}

impl<F> fmt::Debug for CallbackObserver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallbackObserver")
    }
}
