//! Zero-copy JSON token cursor used by the property codec.
//!
//! [`JsonReader`] is a pull reader over an immutable byte buffer and
//! [`JsonWriter`] a push writer into a caller-owned byte buffer. Neither
//! allocates; both track nesting in a fixed 64-bit container stack.

mod limits;
mod reader;
mod token;
mod unescape;
mod writer;

pub use limits::{ReaderLimits, MAX_NESTING_DEPTH};
pub use reader::JsonReader;
pub use token::TokenKind;
pub use writer::JsonWriter;
