use bridge_traits::TransportError;
use thiserror::Error;

/// Errors surfaced by the metadata core.
///
/// Clonable so that one failed fetch can be delivered to every waiter that
/// coalesced onto it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Fetch interrupted: {0}")]
    Interrupted(String),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
