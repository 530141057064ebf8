//! Unified error type for rgdi operations.
use thiserror::Error;

/// Kind tag of an object held by the object store.
///
/// Used both for runtime discrimination of stored objects and to describe
/// handle mismatches in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Bitmap,
    Pen,
    Palette,
    Brush,
    Region,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bitmap => "bitmap",
            Self::Pen => "pen",
            Self::Palette => "palette",
            Self::Brush => "brush",
            Self::Region => "region",
        };
        f.write_str(name)
    }
}

/// Main error type for GDI operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Handle is stale, unknown, or names the wrong kind of object
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Empty or negative extents, or coordinates outside a surface
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// Bit depth without a conversion, or indexed conversion without a palette
    #[error("Unsupported depth: {0}")]
    UnsupportedDepth(String),

    /// Object is still selected into a device context
    #[error("Object in use: {kind} is selected into {dcs} device context(s)")]
    ObjectInUse { kind: ObjectKind, dcs: usize },
}

impl Error {
    pub(crate) fn wrong_kind(expected: ObjectKind, got: ObjectKind) -> Self {
        Error::InvalidHandle(format!("expected {}, got {}", expected, got))
    }

    pub(crate) fn not_selected(what: &str) -> Self {
        Error::InvalidHandle(format!("no {} selected into device context", what))
    }
}

/// Result type for rgdi operations.
pub type Result<T> = std::result::Result<T, Error>;
