//! Identifier types for metadata subjects
//!
//! The Bard backend keys everything by integer ids; the newtypes keep song
//! and artist-credit keyspaces from mixing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SongId(pub i64);

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SongId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Unique identifier for an artist credit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistCreditId(pub i64);

impl fmt::Display for ArtistCreditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ArtistCreditId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_matches_backend_keys() {
        assert_eq!(SongId(42).to_string(), "42");
        assert_eq!(ArtistCreditId::from(17).to_string(), "17");
    }
}
