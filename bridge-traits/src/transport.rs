//! Backend Transport Abstraction
//!
//! Provides async access to the Bard backend API, keyed by resource kind and
//! an opaque identifier rather than by concrete URLs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::Result;

/// The backend resources the client core reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Per-song metadata (title, artists, durations, ...)
    SongMetadata,
    /// Artist-credit expansion for a credit id
    ArtistCreditInfo,
    /// Per-song user ratings (write path only)
    SongRatings,
}

impl ResourceKind {
    /// Stable name used in logs and events.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::SongMetadata => "song_metadata",
            ResourceKind::ArtistCreditInfo => "artist_credit_info",
            ResourceKind::SongRatings => "song_ratings",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Whether to use exponential backoff
    pub use_exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            use_exponential_backoff: true,
        }
    }
}

/// Async transport to the backend API.
///
/// Implementations own everything wire-level: routes, authentication,
/// timeouts and retries. Callers identify what they want by
/// [`ResourceKind`] plus an opaque key, and receive the raw JSON payload
/// the backend returned.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::transport::{ResourceKind, Transport};
///
/// async fn song_title(transport: &dyn Transport, id: &str) -> Option<String> {
///     let payload = transport.fetch(ResourceKind::SongMetadata, id).await.ok()?;
///     payload.get("title")?.as_str().map(str::to_owned)
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the JSON payload for one resource key.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`](crate::error::TransportError) if the
    /// network request fails, the backend answers with a non-2xx status, or
    /// the response body is not decodable JSON.
    async fn fetch(&self, resource: ResourceKind, key: &str) -> Result<Value>;

    /// Write `payload` to one resource key and return the backend's reply.
    ///
    /// Write operations are never cached or deduplicated by callers; each
    /// invocation reaches the backend.
    async fn write(&self, resource: ResourceKind, key: &str, payload: Value) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    #[test]
    fn test_resource_kind_names() {
        assert_eq!(ResourceKind::SongMetadata.as_str(), "song_metadata");
        assert_eq!(ResourceKind::ArtistCreditInfo.as_str(), "artist_credit_info");
        assert_eq!(ResourceKind::SongRatings.to_string(), "song_ratings");
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert!(policy.use_exponential_backoff);
        assert!(policy.base_delay < policy.max_delay);
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Http {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: unavailable");

        let err = TransportError::Network("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
