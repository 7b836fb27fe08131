//! Lotus error types

use thiserror::Error;

/// Result type for Lotus operations
pub type LotusResult<T> = std::result::Result<T, LotusError>;

/// Errors that can occur while reading a Lotus worksheet file.
#[derive(Debug, Error)]
pub enum LotusError {
    /// The file does not open with a recognised Lotus BOF record
    #[error("Not a Lotus worksheet file: {0}")]
    BadSignature(String),

    /// Record payload malformed beyond recovery
    #[error("Parse error: {0}")]
    Parse(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] gridbook_core::Error),
}
