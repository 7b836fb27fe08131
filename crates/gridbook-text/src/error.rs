//! Text-format error types

use thiserror::Error;

/// Result type for text-format operations
pub type TextResult<T> = std::result::Result<T, TextError>;

/// Errors that can occur while reading delimited/tokenised text formats.
#[derive(Debug, Error)]
pub enum TextError {
    /// No tried encoding produced an acceptable decode
    #[error("Encoding failure: {0}")]
    Encoding(String),

    /// The input does not follow the format's structure
    #[error("Parse error: {0}")]
    Parse(String),

    /// CSV mechanics error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] gridbook_core::Error),
}
