//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the Bard client core:
//! - Logging and tracing setup
//! - Event bus for surfacing core events to views
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other crates depend on. It
//! establishes the logging conventions and the event broadcasting mechanism
//! used throughout the client.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{ClientEvent, EventBus, EventSeverity};
