//! Workspace placeholder crate.
//!
//! This crate exists so host applications can depend on `bard-client` and
//! reach the individual workspace crates (`bridge-traits`, `bridge-http`,
//! `core-runtime`, `core-metadata`) without wiring each one individually.

pub use bridge_http;
pub use bridge_traits;
pub use core_metadata;
pub use core_runtime;
