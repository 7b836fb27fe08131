//! Markup error types

use thiserror::Error;

/// Result type for markup operations
pub type MarkupResult<T> = std::result::Result<T, MarkupError>;

/// Errors that can occur while parsing XML/HTML documents.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// The document is not well-formed enough to build a tree
    #[error("Markup parse error: {0}")]
    Parse(String),

    /// The document holds no table at the requested index
    #[error("No table at index {0} in the document")]
    MissingTable(usize),

    /// The document root is not the expected spreadsheet vocabulary
    #[error("Unexpected document root: {0}")]
    UnexpectedRoot(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] gridbook_core::Error),
}
