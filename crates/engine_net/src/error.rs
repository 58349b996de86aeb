//! Serialization error types.

use engine_component::ReadError;
use engine_compose::ClassId;

/// Errors raised while encoding or decoding whole messages.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to encode a message to MessagePack.
    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a message from MessagePack.
    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Failed to render a message as JSON.
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An entity payload does not fit the `u32` length prefix.
    #[error("record for kind `{kind}` is {len} bytes, larger than a frame allows")]
    RecordTooLarge {
        /// Kind name.
        kind: String,
        /// Payload length.
        len: usize,
    },
}

/// Why one entity record could not be decoded. Never fatal for the stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The class id is not registered in this process.
    #[error("unknown kind: {0}")]
    UnknownKind(ClassId),

    /// A `read` hook failed on the payload.
    #[error("malformed record for kind `{kind}`: {source}")]
    Malformed {
        /// Kind name.
        kind: String,
        /// The underlying read failure.
        #[source]
        source: ReadError,
    },

    /// The `read` chain finished before the payload did.
    #[error("record for kind `{kind}` has {remaining} trailing bytes")]
    TrailingBytes {
        /// Kind name.
        kind: String,
        /// Unconsumed bytes.
        remaining: usize,
    },

    /// The frame header or payload runs past the end of the buffer.
    #[error("truncated frame: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the frame requires.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },
}
