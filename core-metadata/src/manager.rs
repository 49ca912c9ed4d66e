//! Metadata Manager
//!
//! Owns the two metadata caches (song metadata, artist-credit info) and the
//! write-through rating path. The caches are two instances of the same
//! coalescing mechanism: N concurrent callers for one uncached key produce
//! exactly one backend fetch and N deliveries, in registration order.
//!
//! The manager is an explicit instance. Construct it once with the
//! transport (and optionally an event bus) and hand it to every view that
//! needs metadata.
//!
//! # Example
//!
//! ```ignore
//! use core_metadata::{MetadataConfig, MetadataManager, SongId};
//! use std::sync::Arc;
//!
//! let manager = MetadataManager::new(MetadataConfig::default(), transport)
//!     .with_event_bus(event_bus);
//!
//! let metadata = manager.get_song_metadata(SongId(42)).await?;
//! ```

use crate::cache::{CacheStats, InfoCache};
use crate::config::MetadataConfig;
use crate::error::Result;
use crate::types::{ArtistCreditId, SongId};
use bridge_traits::{ResourceKind, Transport};
use core_runtime::events::{ClientEvent, EventBus};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Counter snapshots for both caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataStats {
    pub song_metadata: CacheStats,
    pub artist_credits: CacheStats,
}

/// Cached, coalescing access to song metadata and artist-credit info, plus
/// uncached rating writes.
pub struct MetadataManager {
    config: MetadataConfig,
    transport: Arc<dyn Transport>,
    events: Option<EventBus>,
    song_metadata: InfoCache<SongId>,
    artist_credits: InfoCache<ArtistCreditId>,
}

impl MetadataManager {
    /// Create a new metadata manager.
    pub fn new(config: MetadataConfig, transport: Arc<dyn Transport>) -> Self {
        Self::build(config, transport, None)
    }

    /// Attach an event bus for fetch-failure and rating notifications.
    ///
    /// Intended for construction time; any entries already cached are
    /// dropped.
    pub fn with_event_bus(self, events: EventBus) -> Self {
        Self::build(self.config, self.transport, Some(events))
    }

    fn build(
        config: MetadataConfig,
        transport: Arc<dyn Transport>,
        events: Option<EventBus>,
    ) -> Self {
        let song_metadata = InfoCache::new(
            ResourceKind::SongMetadata,
            config.song_metadata_limit,
            Arc::clone(&transport),
            events.clone(),
        );
        let artist_credits = InfoCache::new(
            ResourceKind::ArtistCreditInfo,
            config.artist_credit_limit,
            Arc::clone(&transport),
            events.clone(),
        );

        Self {
            config,
            transport,
            events,
            song_metadata,
            artist_credits,
        }
    }

    /// Get the metadata payload for a song.
    ///
    /// Resolves synchronously on a cache hit; otherwise fetches (or joins
    /// the fetch already in flight for this song).
    #[instrument(skip(self))]
    pub async fn get_song_metadata(&self, id: SongId) -> Result<Arc<Value>> {
        self.song_metadata.get(&id).await
    }

    /// Like [`get_song_metadata`](Self::get_song_metadata), invoking
    /// `on_miss` synchronously when the value is not already cached, so the
    /// caller can render a placeholder before data arrives.
    pub async fn get_song_metadata_with<F: FnOnce()>(
        &self,
        id: SongId,
        on_miss: F,
    ) -> Result<Arc<Value>> {
        self.song_metadata.get_with(&id, on_miss).await
    }

    /// Get the expanded info for an artist credit.
    #[instrument(skip(self))]
    pub async fn get_artist_credit_info(&self, id: ArtistCreditId) -> Result<Arc<Value>> {
        self.artist_credits.get(&id).await
    }

    /// Like [`get_artist_credit_info`](Self::get_artist_credit_info) with a
    /// synchronous miss callback.
    pub async fn get_artist_credit_info_with<F: FnOnce()>(
        &self,
        id: ArtistCreditId,
        on_miss: F,
    ) -> Result<Arc<Value>> {
        self.artist_credits.get_with(&id, on_miss).await
    }

    /// Write a song rating through to the backend.
    ///
    /// Ratings never touch the caches: every call issues a write, even two
    /// identical calls in a row. Returns the rating the backend confirmed,
    /// or the requested one when the backend replies with an empty body.
    #[instrument(skip(self))]
    pub async fn set_song_ratings(&self, id: SongId, rating: u8) -> Result<u8> {
        let reply = self
            .transport
            .write(ResourceKind::SongRatings, &id.to_string(), json!({ "rating": rating }))
            .await?;

        let confirmed = reply
            .get("rating")
            .and_then(Value::as_u64)
            .map(|r| r as u8)
            .unwrap_or(rating);

        debug!(song_id = %id, rating = confirmed, "Rating saved");
        if let Some(events) = &self.events {
            events
                .emit(ClientEvent::RatingSaved {
                    song_id: id.0,
                    rating: confirmed,
                })
                .ok();
        }

        Ok(confirmed)
    }

    /// Drop every cached entry in both caches.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        self.song_metadata.clear();
        self.artist_credits.clear();
    }

    /// Snapshot of both caches' counters.
    pub fn stats(&self) -> MetadataStats {
        MetadataStats {
            song_metadata: self.song_metadata.stats(),
            artist_credits: self.artist_credits.stats(),
        }
    }
}
