//! # Backend Bridge Traits
//!
//! Defines the contract between the client core and the backend transport.
//!
//! ## Overview
//!
//! The metadata core never talks to the network directly. It consumes the
//! [`Transport`](transport::Transport) trait, which resolves a
//! ([`ResourceKind`](transport::ResourceKind), key) pair to the raw JSON
//! payload the backend returns. Concrete implementations live in sibling
//! crates (`bridge-http` for the REST backend); tests substitute
//! controllable fakes.

pub mod error;
pub mod transport;

pub use error::{Result, TransportError};
pub use transport::{ResourceKind, RetryPolicy, Transport};
