//! Errors shared by the codec, the cursor and the reducers.
//!
//! A clean end of a frame is never an error: cursors report it as the end
//! of their sequence. Everything in here means the input (or the caller)
//! was wrong.

use thiserror::Error;

/// Everything that can go wrong while reading, writing or reducing frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An identifier token does not follow the identifier grammar.
    #[error("malformed uuid {text:?}: {reason}")]
    MalformedUuid { text: String, reason: &'static str },

    /// The text at `offset` is not an operation, and it is not the end of
    /// the frame either.
    #[error("no op matches at offset {offset}")]
    MalformedOp { offset: usize },

    /// A value atom matched the grammar but does not decode.
    #[error("malformed {kind} atom {text:?}")]
    MalformedAtom { kind: &'static str, text: String },

    /// A value has no atom representation.
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    /// Two cursors passed to `slice` scan different buffers.
    #[error("cursors belong to different frames")]
    ForeignCursor,

    /// Ops have exactly four uuids.
    #[error("uuid position {0} is out of range")]
    PositionOutOfRange(usize),

    /// No reducer is registered for the given type.
    #[error("no reducer for type {0}")]
    UnknownReducer(String),

    /// A fixture frame does not start with a direction comment.
    #[error("frame is not annotated with a direction")]
    MissingAnnotation,
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
