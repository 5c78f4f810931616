//! Error types for mongowire.

use thiserror::Error;

/// Main error type for all wire protocol and document operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error: declared lengths, opcodes or counts do not match the
    /// bytes actually read or written. After a framing error the connection's
    /// byte alignment is no longer trustworthy; the connection must be
    /// discarded, not reused.
    #[error("framing error: {0}")]
    Framing(String),

    /// Unrecognized value type tag while decoding a document.
    ///
    /// Treated with framing severity: the decode is aborted, no partial
    /// document is returned.
    #[error("unknown BSON type tag 0x{tag:02X} for key {key:?}")]
    UnknownType { tag: u8, key: String },

    /// Requested key is absent from a document. Local and recoverable.
    #[error("key not found: {0:?}")]
    KeyNotFound(String),

    /// Key is present but holds a different value type than requested.
    /// Local and recoverable.
    #[error("type mismatch for key {key:?}: expected {expected}, found {actual}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Server reported a query failure (`$err` in the reply document).
    #[error("query failure: {0}")]
    QueryFailure(String),

    /// Server no longer knows the cursor id a get-more referred to.
    #[error("cursor {0} not found on server")]
    CursorNotFound(i64),

    /// Connection closed while a reply was expected.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
