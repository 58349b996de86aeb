//! Entity streams: records laid back to back.
//!
//! Decoding is forward compatible. A record whose class id is unknown, or
//! whose payload does not parse, is dropped and logged, and decoding resumes
//! at the next record. Only a frame that runs past the end of the buffer
//! ends the stream early, since nothing behind it can be located.

use bytes::{Bytes, BytesMut};
use engine_component::IdAllocator;
use engine_compose::KindRegistry;
use engine_entity::EntityInstance;
use tracing::{debug, warn};

use crate::error::{DecodeError, NetError};
use crate::serializer::{decode_record, encode_record, split_frame};

/// Result of decoding a stream.
#[derive(Debug, Default)]
pub struct Decoded {
    /// Successfully decoded, detached instances in stream order.
    pub entities: Vec<EntityInstance>,
    /// One entry per dropped record.
    pub failures: Vec<DecodeError>,
}

impl Decoded {
    /// Returns `true` if every record decoded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Encode every instance whose kind is serialized, in iteration order.
///
/// # Errors
///
/// Returns [`NetError::RecordTooLarge`] if any payload overflows its frame.
pub fn encode_stream<'a>(
    instances: impl IntoIterator<Item = &'a EntityInstance>,
) -> Result<Bytes, NetError> {
    let mut buf = BytesMut::new();
    let mut written = 0usize;
    let mut skipped = 0usize;

    for instance in instances {
        if !instance.kind().serialize {
            skipped += 1;
            continue;
        }
        encode_record(instance, &mut buf)?;
        written += 1;
    }

    debug!(written, skipped, bytes = buf.len(), "encoded entity stream");
    Ok(buf.freeze())
}

/// Decode every record in `bytes`.
///
/// Decoded instances get fresh ids from `ids` and are not added to any
/// group. Failed records are reported in [`Decoded::failures`].
#[must_use]
pub fn decode_stream(registry: &KindRegistry, ids: &IdAllocator, bytes: &[u8]) -> Decoded {
    let mut cursor = bytes;
    let mut decoded = Decoded::default();

    while !cursor.is_empty() {
        let frame = match split_frame(&mut cursor) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "entity stream truncated, dropping the rest");
                decoded.failures.push(err);
                break;
            }
        };

        match decode_record(registry, ids, frame) {
            Ok(instance) => decoded.entities.push(instance),
            Err(err) => {
                warn!(
                    class_id = frame.class_id.0,
                    len = frame.payload.len(),
                    error = %err,
                    "dropping entity record"
                );
                decoded.failures.push(err);
            }
        }
    }

    debug!(
        decoded = decoded.entities.len(),
        dropped = decoded.failures.len(),
        "decoded entity stream"
    );
    decoded
}
