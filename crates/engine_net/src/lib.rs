//! # engine_net
//!
//! Entity serialization.
//!
//! - [`serializer`]: one entity as a `[class_id][len][payload]` record.
//! - [`stream`]: back-to-back records, decoded with per-record error recovery.
//! - [`messages`]: snapshots and kind manifests.
//! - [`codec`]: MessagePack helpers for the message envelope.
//! - [`error`]: error types.

pub mod codec;
pub mod error;
pub mod messages;
pub mod serializer;
pub mod stream;

#[cfg(test)]
mod testkit;

pub use codec::{decode, encode};
pub use error::{DecodeError, NetError};
pub use messages::{KindManifest, ManifestField, ManifestKind, ManifestMismatch, Snapshot};
pub use serializer::{Frame, HEADER_LEN, decode_record, encode_record, read_entity, split_frame, write_entity};
pub use stream::{Decoded, decode_stream, encode_stream};
