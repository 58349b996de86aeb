//! Single-entity records.
//!
//! A record is `[class_id: u8][len: u32 BE][payload: len bytes]`. The payload
//! is whatever the kind's `write` chain produced, in chain order. The length
//! prefix lets a reader skip records it cannot decode without losing its
//! place in the stream.

use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};
use engine_component::{IdAllocator, Reads, Writes};
use engine_compose::{ClassId, KindDescriptor, KindRegistry};
use engine_entity::EntityInstance;

use crate::error::{DecodeError, NetError};

/// Size of the record header: class id plus payload length.
pub const HEADER_LEN: usize = 1 + 4;

/// One framed record, not yet decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Class id from the header.
    pub class_id: ClassId,
    /// The payload bytes.
    pub payload: &'a [u8],
}

/// Run the kind's `write` chain for one entity.
pub fn write_entity(instance: &EntityInstance, out: &mut Writes) {
    let fields = instance.fields();
    for write in instance.kind().write.iter() {
        write(&fields, out);
    }
}

/// Append a framed record for one entity.
///
/// # Errors
///
/// Returns [`NetError::RecordTooLarge`] if the payload does not fit the
/// length prefix.
pub fn encode_record(instance: &EntityInstance, buf: &mut BytesMut) -> Result<(), NetError> {
    let mut payload = Writes::new();
    write_entity(instance, &mut payload);
    let payload = payload.into_inner();

    let len = u32::try_from(payload.len()).map_err(|_| NetError::RecordTooLarge {
        kind: instance.kind().name.clone(),
        len: payload.len(),
    })?;

    buf.reserve(HEADER_LEN + payload.len());
    buf.put_u8(instance.class_id().0);
    buf.put_u32(len);
    buf.put_slice(&payload);
    Ok(())
}

/// Split the next frame off the front of `buf`.
///
/// On success the cursor moves past the whole record, so a failure to decode
/// its payload never affects the records behind it.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if the header or the declared payload
/// runs past the end of the buffer. The cursor is left untouched.
pub fn split_frame<'a>(buf: &mut &'a [u8]) -> Result<Frame<'a>, DecodeError> {
    let remaining = buf.len();
    if remaining < HEADER_LEN {
        return Err(DecodeError::Truncated {
            needed: HEADER_LEN,
            remaining,
        });
    }

    let mut header = &buf[..HEADER_LEN];
    let class_id = ClassId(header.get_u8());
    let len = header.get_u32() as usize;

    let needed = HEADER_LEN + len;
    if remaining < needed {
        return Err(DecodeError::Truncated { needed, remaining });
    }

    let payload = &buf[HEADER_LEN..needed];
    *buf = &buf[needed..];
    Ok(Frame { class_id, payload })
}

/// Build a fresh instance of `kind` from a payload.
///
/// The instance starts from the kind's defaults, the `read` chain runs in
/// chain order, then the `after_read` chain runs exactly once.
///
/// The instance gets a fresh id from `ids`. Entity-typed fields such as
/// `controller` keep the sender's ids and are not remapped, so they do not
/// resolve against the receiver's entities (a mirrored `LocalActor` check
/// will not match them).
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] if a `read` hook fails and
/// [`DecodeError::TrailingBytes`] if the chain leaves bytes unread. The
/// partially read instance is dropped either way.
pub fn read_entity(
    kind: &Arc<KindDescriptor>,
    ids: &IdAllocator,
    payload: &[u8],
) -> Result<EntityInstance, DecodeError> {
    let mut instance = EntityInstance::new(ids.allocate(), Arc::clone(kind));
    let mut reads = Reads::new(payload);
    let mut fields = instance.fields_mut();

    for read in kind.read.iter() {
        read(&mut fields, &mut reads).map_err(|source| DecodeError::Malformed {
            kind: kind.name.clone(),
            source,
        })?;
    }

    let remaining = reads.remaining();
    if remaining > 0 {
        return Err(DecodeError::TrailingBytes {
            kind: kind.name.clone(),
            remaining,
        });
    }

    for after_read in kind.after_read.iter() {
        after_read(&mut fields);
    }
    drop(fields);

    Ok(instance)
}

/// Decode one frame into a fresh, detached instance.
///
/// # Errors
///
/// Returns [`DecodeError::UnknownKind`] for class ids the registry does not
/// know, otherwise whatever [`read_entity`] returns.
pub fn decode_record(
    registry: &KindRegistry,
    ids: &IdAllocator,
    frame: Frame<'_>,
) -> Result<EntityInstance, DecodeError> {
    let kind = registry
        .by_class(frame.class_id)
        .ok_or(DecodeError::UnknownKind(frame.class_id))?;
    read_entity(kind, ids, frame.payload)
}

#[cfg(test)]
mod tests {
    use engine_component::{EntityId, FieldAccess, FieldValue, Hook, ReadError};

    use super::*;
    use crate::testkit;

    fn soldier(registry: &KindRegistry, team: i32, health: f32) -> EntityInstance {
        let mut e = EntityInstance::new(EntityId(1), Arc::clone(registry.kind("soldier").unwrap()));
        e.set("team", team);
        e.set("health", health);
        e
    }

    #[test]
    fn test_write_follows_priority_order() {
        let registry = testkit::registry();
        let kind = registry.kind("soldier").unwrap();
        assert_eq!(kind.hook_order(Hook::Write), vec!["team_sync", "health_sync"]);

        let mut out = Writes::new();
        write_entity(&soldier(&registry, 3, 42.5), &mut out);
        let mut expected = Vec::new();
        expected.extend_from_slice(&3i32.to_be_bytes());
        expected.extend_from_slice(&42.5f32.to_be_bytes());
        assert_eq!(&out.into_inner()[..], &expected[..]);
    }

    #[test]
    fn test_record_header() {
        let registry = testkit::registry();
        let mut buf = BytesMut::new();
        encode_record(&soldier(&registry, 3, 42.5), &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN + 8);
        assert_eq!(buf[0], 2);
        assert_eq!(&buf[1..5], &8u32.to_be_bytes());
    }

    #[test]
    fn test_decode_restores_fields_and_runs_after_read_once() {
        let registry = testkit::registry();
        let ids = IdAllocator::new();
        let mut buf = BytesMut::new();
        encode_record(&soldier(&registry, 3, 42.5), &mut buf).unwrap();

        let mut cursor = &buf[..];
        let frame = split_frame(&mut cursor).unwrap();
        assert!(cursor.is_empty());

        let e = decode_record(&registry, &ids, frame).unwrap();
        assert_eq!(e.id(), EntityId(1));
        assert!(!e.is_added());
        assert_eq!(e.fields().int("team"), 3);
        assert_eq!(e.fields().float("health"), 42.5);
        assert_eq!(e.fields().int("reads"), 1);
        // after_read saw the fully decoded state.
        assert_eq!(e.fields().int("seen_team"), 3);
    }

    #[test]
    fn test_empty_payload_kind() {
        let registry = testkit::registry();
        let ids = IdAllocator::new();
        let tag = EntityInstance::new(EntityId(9), Arc::clone(registry.kind("tag").unwrap()));
        let mut buf = BytesMut::new();
        encode_record(&tag, &mut buf).unwrap();
        assert_eq!(&buf[..], &[3, 0, 0, 0, 0]);

        let mut cursor = &buf[..];
        let e = decode_record(&registry, &ids, split_frame(&mut cursor).unwrap()).unwrap();
        assert_eq!(e.kind().name, "tag");
    }

    #[test]
    fn test_unknown_class_id() {
        let registry = testkit::registry();
        let ids = IdAllocator::new();
        let frame = Frame {
            class_id: ClassId(200),
            payload: &[1, 2, 3],
        };
        assert_eq!(
            decode_record(&registry, &ids, frame).unwrap_err(),
            DecodeError::UnknownKind(ClassId(200))
        );
    }

    #[test]
    fn test_malformed_payload() {
        let registry = testkit::registry();
        let ids = IdAllocator::new();
        let frame = Frame {
            class_id: ClassId(2),
            payload: &[0, 0, 0, 1],
        };
        let err = decode_record(&registry, &ids, frame).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Malformed {
                kind: "soldier".into(),
                source: ReadError::UnexpectedEof {
                    needed: 4,
                    remaining: 0
                },
            }
        );
    }

    #[test]
    fn test_trailing_bytes() {
        let registry = testkit::registry();
        let ids = IdAllocator::new();
        let mut payload = Writes::new();
        payload.str("ada");
        payload.u8(0xff);
        let payload = payload.into_inner();
        let frame = Frame {
            class_id: ClassId(1),
            payload: &payload,
        };
        assert_eq!(
            decode_record(&registry, &ids, frame).unwrap_err(),
            DecodeError::TrailingBytes {
                kind: "pilot".into(),
                remaining: 1
            }
        );
    }

    #[test]
    fn test_text_field_round_trip() {
        let registry = testkit::registry();
        let ids = IdAllocator::new();
        let mut pilot = EntityInstance::new(EntityId(5), Arc::clone(registry.kind("pilot").unwrap()));
        pilot.set("name", "Ada Løvelace");
        let mut buf = BytesMut::new();
        encode_record(&pilot, &mut buf).unwrap();

        let mut cursor = &buf[..];
        let e = decode_record(&registry, &ids, split_frame(&mut cursor).unwrap()).unwrap();
        assert_eq!(e.get("name"), Some(&FieldValue::Text("Ada Løvelace".into())));
    }

    #[test]
    fn test_split_frame_truncated() {
        let mut short: &[u8] = &[2, 0, 0];
        assert_eq!(
            split_frame(&mut short).unwrap_err(),
            DecodeError::Truncated {
                needed: 5,
                remaining: 3
            }
        );

        let mut overlong: &[u8] = &[2, 0, 0, 0, 9, 1, 2];
        assert_eq!(
            split_frame(&mut overlong).unwrap_err(),
            DecodeError::Truncated {
                needed: 14,
                remaining: 7
            }
        );
        assert_eq!(overlong.len(), 7);
    }
}
