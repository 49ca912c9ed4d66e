//! Metadata cache configuration and policies

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Growth bound for one metadata cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLimit {
    /// Keep every entry for the lifetime of the process
    Unbounded,
    /// Keep at most `capacity` entries, evicting the least recently used
    LeastRecentlyUsed(NonZeroUsize),
}

impl CacheLimit {
    /// Bounded LRU limit with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn lru(capacity: usize) -> Self {
        Self::LeastRecentlyUsed(
            NonZeroUsize::new(capacity).expect("cache capacity must be non-zero"),
        )
    }

    /// Returns a human-readable description of the limit.
    pub fn description(&self) -> String {
        match self {
            CacheLimit::Unbounded => "Keep every entry until an explicit clear".to_string(),
            CacheLimit::LeastRecentlyUsed(capacity) => {
                format!("Keep at most {} entries, evicting least recently used", capacity)
            }
        }
    }
}

/// Configuration for the metadata manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataConfig {
    /// Bound on the song metadata cache (default: LRU, 1024 entries)
    pub song_metadata_limit: CacheLimit,

    /// Bound on the artist-credit cache (default: LRU, 256 entries)
    pub artist_credit_limit: CacheLimit,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            song_metadata_limit: CacheLimit::lru(1024),
            artist_credit_limit: CacheLimit::lru(256),
        }
    }
}

impl MetadataConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the song metadata cache limit.
    pub fn with_song_metadata_limit(mut self, limit: CacheLimit) -> Self {
        self.song_metadata_limit = limit;
        self
    }

    /// Set the artist-credit cache limit.
    pub fn with_artist_credit_limit(mut self, limit: CacheLimit) -> Self {
        self.artist_credit_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetadataConfig::default();
        assert_eq!(config.song_metadata_limit, CacheLimit::lru(1024));
        assert_eq!(config.artist_credit_limit, CacheLimit::lru(256));
    }

    #[test]
    fn test_config_builder() {
        let config = MetadataConfig::new()
            .with_song_metadata_limit(CacheLimit::Unbounded)
            .with_artist_credit_limit(CacheLimit::lru(32));

        assert_eq!(config.song_metadata_limit, CacheLimit::Unbounded);
        assert_eq!(config.artist_credit_limit, CacheLimit::lru(32));
    }

    #[test]
    fn test_limit_descriptions() {
        assert!(!CacheLimit::Unbounded.description().is_empty());
        assert!(CacheLimit::lru(8).description().contains('8'));
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_rejected() {
        let _ = CacheLimit::lru(0);
    }
}
