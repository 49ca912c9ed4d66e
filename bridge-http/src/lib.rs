//! # HTTP Transport for the Bard Backend
//!
//! Reqwest-based implementation of the
//! [`Transport`](bridge_traits::transport::Transport) trait against the Bard
//! REST API.

pub mod transport;

pub use transport::ReqwestTransport;
