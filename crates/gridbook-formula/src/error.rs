//! Formula decoding error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors raised while decoding formula token streams.
///
/// These are contained by the decoder: a failing token stops emission and
/// the partial formula on the stack is returned instead of the error.
#[derive(Debug, Error)]
pub enum FormulaError {
    /// A token operand ran past the end of the stream
    #[error("token operand truncated at offset {offset}")]
    Truncated { offset: usize },

    /// An operator or function popped more operands than were pushed
    #[error("operand stack underflow")]
    StackUnderflow,
}
