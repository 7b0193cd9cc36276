//! Infrastructure layer
//!
//! Implementations of the domain repository traits plus CSV helpers for the
//! batch-import template and vehicle export.

pub mod http;
pub mod memory;
pub mod vehicle_csv;

pub use http::{HttpBackend, HttpSettings};
pub use memory::InMemoryBackend;
