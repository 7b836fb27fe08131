//! ODS error types

use thiserror::Error;

/// Result type for ODS operations
pub type OdsResult<T> = std::result::Result<T, OdsError>;

/// Errors that can occur while reading an ODS archive.
#[derive(Debug, Error)]
pub enum OdsError {
    /// The ZIP container is structurally broken
    #[error("Malformed archive: {0}")]
    MalformedArchive(#[from] zip::result::ZipError),

    /// A required archive member is absent
    #[error("Missing stream: {0}")]
    MissingStream(String),

    /// An archive member's XML could not be parsed
    #[error("Markup error in {part}: {source}")]
    Markup {
        part: String,
        source: gridbook_markup::MarkupError,
    },

    /// IO error while inflating archive members
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] gridbook_core::Error),
}
