//! # Event Bus System
//!
//! Decoupled communication between the client core and its views using
//! `tokio::sync::broadcast`. The metadata core publishes events here; view
//! collaborators subscribe and turn them into user-visible notifications.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{ClientEvent, EventBus};
//! use bridge_traits::ResourceKind;
//!
//! let event_bus = EventBus::new(100);
//! let _stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(ClientEvent::MetadataFetchFailed {
//!         resource: ResourceKind::SongMetadata,
//!         key: "42".to_string(),
//!         message: "HTTP 502: bad gateway".to_string(),
//!     })
//!     .ok();
//! ```
//!
//! ## Error Handling
//!
//! `RecvError::Lagged(n)` means a slow subscriber missed `n` events and can
//! keep receiving; `RecvError::Closed` means every sender is gone and the
//! subscriber should exit.

use bridge_traits::ResourceKind;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall behind by more than this receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Events published by the client core.
///
/// Payloads stay lightweight: each subscriber receives a clone of every
/// event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ClientEvent {
    /// A metadata fetch failed after the transport gave up.
    ///
    /// Views surface this as a user-visible notification; the failed key is
    /// retryable immediately.
    MetadataFetchFailed {
        /// Which resource the fetch was for.
        resource: ResourceKind,
        /// The key that failed.
        key: String,
        /// Human-readable error message.
        message: String,
    },
    /// A song rating was written through to the backend.
    RatingSaved {
        /// The rated song.
        song_id: i64,
        /// The rating the backend confirmed.
        rating: u8,
    },
}

impl ClientEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            ClientEvent::MetadataFetchFailed { .. } => "Metadata fetch failed",
            ClientEvent::RatingSaved { .. } => "Rating saved",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            ClientEvent::MetadataFetchFailed { .. } => EventSeverity::Error,
            ClientEvent::RatingSaved { .. } => EventSeverity::Info,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

/// Central broadcast channel for [`ClientEvent`]s.
///
/// Cheap to clone; all clones publish into the same channel. Fully
/// thread-safe and shareable across tasks.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: ClientEvent) -> Result<usize, SendError<ClientEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscription to the event stream.
    pub fn subscribe(&self) -> Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_failed() -> ClientEvent {
        ClientEvent::MetadataFetchFailed {
            resource: ResourceKind::SongMetadata,
            key: "42".to_string(),
            message: "HTTP 500: boom".to_string(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(fetch_failed()).is_err());
    }

    #[tokio::test]
    async fn test_event_emission_with_subscribers() {
        let bus = EventBus::new(10);
        let mut sub = bus.subscribe();

        let sent = bus.emit(fetch_failed()).unwrap();
        assert_eq!(sent, 1);

        let received = sub.recv().await.unwrap();
        assert_eq!(received, fetch_failed());
        assert_eq!(received.severity(), EventSeverity::Error);
    }

    #[tokio::test]
    async fn test_rating_event_severity() {
        let event = ClientEvent::RatingSaved {
            song_id: 7,
            rating: 9,
        };
        assert_eq!(event.severity(), EventSeverity::Info);
        assert_eq!(event.description(), "Rating saved");
    }
}
