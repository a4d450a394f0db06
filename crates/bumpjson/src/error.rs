//! Error types for document mutation and decoding.
//!
//! The read side of the API never fails (misses resolve to the Invalid
//! sentinel or a default value), so these errors only come out of writes and
//! decoders. Every enum is a flat set of codes without payload; the
//! `Display` text matches the code name.

use bumpjson_mem::ArenaAllocError;

/// Result type alias for document writes.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported when writing into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The document's arena could not satisfy an allocation.
    #[error("NoMemory")]
    NoMemory,

    /// The write went through the Invalid sentinel or a handle of the wrong
    /// kind (for example an out-of-range array index).
    #[error("InvalidTarget")]
    InvalidTarget,
}

impl From<ArenaAllocError> for Error {
    fn from(_: ArenaAllocError) -> Self {
        Error::NoMemory
    }
}

/// Errors reported while finishing a string built by a
/// [`StringBuilder`](crate::builder::StringBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StringError {
    /// The arena ran out of room for the string.
    #[error("NoMemory")]
    NoMemory,

    /// The collected bytes are not valid UTF-8.
    #[error("InvalidUtf8")]
    InvalidUtf8,
}

impl From<ArenaAllocError> for StringError {
    fn from(_: ArenaAllocError) -> Self {
        StringError::NoMemory
    }
}

/// Errors reported by the JSON decoder.
///
/// The first error encountered wins; decoding never resynchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum JsonError {
    /// The arena ran out of room for a node, key or string.
    #[error("NoMemory")]
    NoMemory,

    /// A byte that cannot start or continue any token.
    #[error("InvalidInput")]
    InvalidInput,

    /// The input ended inside a string, escape sequence or comment.
    #[error("IncompleteInput")]
    IncompleteInput,

    /// The nesting limit was reached.
    #[error("TooDeep")]
    TooDeep,

    /// An object was required but the input does not start with `{`.
    #[error("OpeningBraceExpected")]
    OpeningBraceExpected,

    /// An object member is followed by neither `,` nor `}`.
    #[error("ClosingBraceExpected")]
    ClosingBraceExpected,

    /// An array was required but the input does not start with `[`.
    #[error("OpeningBracketExpected")]
    OpeningBracketExpected,

    /// An array element is followed by neither `,` nor `]`.
    #[error("ClosingBracketExpected")]
    ClosingBracketExpected,

    /// An object key is not followed by `:`.
    #[error("ColonExpected")]
    ColonExpected,

    /// The input ended where a value or key was expected.
    #[error("UnexpectedEnd")]
    UnexpectedEnd,
}

impl From<ArenaAllocError> for JsonError {
    fn from(_: ArenaAllocError) -> Self {
        JsonError::NoMemory
    }
}

impl From<StringError> for JsonError {
    fn from(err: StringError) -> Self {
        match err {
            StringError::NoMemory => JsonError::NoMemory,
            StringError::InvalidUtf8 => JsonError::InvalidInput,
        }
    }
}

/// Errors reported by the MessagePack decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum MsgPackError {
    /// The arena ran out of room for a node, key or string.
    #[error("NoMemory")]
    NoMemory,

    /// The input ended before the value was complete.
    #[error("IncompleteInput")]
    IncompleteInput,

    /// An unsupported or malformed tag, a non-string key, or a string that
    /// is not UTF-8.
    #[error("InvalidInput")]
    InvalidInput,

    /// The nesting limit was reached.
    #[error("TooDeep")]
    TooDeep,
}

impl From<ArenaAllocError> for MsgPackError {
    fn from(_: ArenaAllocError) -> Self {
        MsgPackError::NoMemory
    }
}

impl From<StringError> for MsgPackError {
    fn from(err: StringError) -> Self {
        match err {
            StringError::NoMemory => MsgPackError::NoMemory,
            StringError::InvalidUtf8 => MsgPackError::InvalidInput,
        }
    }
}
