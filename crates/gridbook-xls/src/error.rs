//! XLS error types

use thiserror::Error;

/// Result type for XLS operations
pub type XlsResult<T> = std::result::Result<T, XlsError>;

/// Errors that can occur while reading an XLS file.
#[derive(Debug, Error)]
pub enum XlsError {
    /// CFB container structure violation (bad signature, chain corruption,
    /// sector reference beyond the file end)
    #[error("Malformed CFB container: {0}")]
    MalformedContainer(String),

    /// A required stream is absent from the container
    #[error("Missing stream: {0}")]
    MissingStream(String),

    /// The BIFF stream version is not BIFF8
    #[error("Unsupported BIFF version: {0}")]
    UnsupportedVersion(String),

    /// Record payload malformed beyond recovery
    #[error("Parse error: {0}")]
    Parse(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] gridbook_core::Error),
}
