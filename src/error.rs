//! Error types for bridge operations.
//!
//! These never cross the foreign-function boundary. The `ffi` and `wasm`
//! layers collapse every variant into the sentinel of the operation's
//! return type.

use thiserror::Error;

/// Errors that can occur while resolving handles or operating on the DOM.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("unknown handle: {0}")]
    UnknownHandle(i64),

    #[error("handle {handle} is not a {expected}")]
    KindMismatch { handle: i64, expected: &'static str },

    #[error("node no longer exists in its document")]
    DetachedNode,

    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("null pointer passed across the boundary")]
    NullPointer,

    #[error("string argument is not valid UTF-8")]
    InvalidUtf8,

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("no matching node")]
    NotFound,

    #[error("invalid tag name: {0:?}")]
    InvalidTagName(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
