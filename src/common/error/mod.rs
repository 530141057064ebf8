//! Error types for the GDI engine.
//!
//! Every fallible operation returns [`Result`]. At the drawing-order boundary
//! errors collapse into the integer status codes of the historical device
//! interface, see [`Error::status`].

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use conversions::{STATUS_SUCCESS, status_of};
pub use types::{Error, ObjectKind, Result};
