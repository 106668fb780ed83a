use thiserror::Error;

use crate::json::TokenKind;

/// Result alias used across the crate.
pub type TwinResult<T> = Result<T, TwinError>;

/// Error variants surfaced by the codec and its JSON cursor.
///
/// None of the variants own heap data, so producing an error never allocates.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TwinError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("property not found: {0}")]
    PropertyNotFound(&'static str),
    #[error("malformed document at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },
    #[error("unexpected token at byte {offset}: expected {expected}, found {found:?}")]
    UnexpectedToken {
        offset: usize,
        expected: &'static str,
        found: TokenKind,
    },
    #[error("nesting depth exceeds the limit of {0}")]
    NestingTooDeep(usize),
    #[error("reader has already consumed the whole document")]
    ReaderDone,
    #[error("number at byte {0} does not fit the requested type")]
    NumberOutOfRange(usize),
    #[error("output buffer too small: {needed} bytes needed, {available} available")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("json writer cannot append {0} here")]
    InvalidWriterState(&'static str),
    #[error("value of the previously yielded property was not consumed")]
    ValueNotConsumed,
}

impl TwinError {
    /// Structural failures end the current traversal; the caller has to start over
    /// from a fresh document.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TwinError::Malformed { .. }
                | TwinError::UnexpectedToken { .. }
                | TwinError::NestingTooDeep(_)
                | TwinError::ReaderDone
        )
    }
}
