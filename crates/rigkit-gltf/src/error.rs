//! Error types for rigkit-gltf.

use thiserror::Error;

/// Result type for rigkit-gltf operations.
pub type Result<T> = std::result::Result<T, GltfError>;

/// Errors that can occur while building, serializing, or importing a document.
#[derive(Debug, Error)]
pub enum GltfError {
    /// Malformed caller input (unknown component type name, empty payload, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An index value exceeds every supported integer width.
    #[error("unrepresentable index value: {0}")]
    Unrepresentable(u64),

    /// An import file set contains no binary payload files.
    #[error("missing binary payload: {0}")]
    MissingAsset(String),

    /// An import file set contains no description file.
    #[error("missing description: {0}")]
    MissingDescription(String),

    /// An import file set contains more than one description file.
    #[error("ambiguous input: {0}")]
    AmbiguousInput(String),

    /// Corrupt document data (dangling index, out-of-bounds view, ...).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
