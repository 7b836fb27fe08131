//! Numbers error types

use thiserror::Error;

/// Result type for Numbers operations
pub type NumbersResult<T> = std::result::Result<T, NumbersError>;

/// Errors that can occur while reading a Numbers package.
#[derive(Debug, Error)]
pub enum NumbersError {
    /// The ZIP container is structurally broken
    #[error("Malformed archive: {0}")]
    MalformedArchive(#[from] zip::result::ZipError),

    /// The package holds no `Index.zip`
    #[error("Missing stream: {0}")]
    MissingStream(String),

    /// IO error while inflating archive members
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] gridbook_core::Error),
}
