//! Messages a simulation hands to its peers.
//!
//! Both types derive `Serialize` and `Deserialize` and travel as MessagePack
//! through [`codec`](crate::codec). Entity payloads inside a [`Snapshot`]
//! stay in the record format of [`serializer`](crate::serializer); only the
//! envelope is MessagePack.

use bytes::Bytes;
use engine_component::{FieldType, IdAllocator};
use engine_compose::{ClassId, KindRegistry};
use engine_entity::EntityInstance;
use serde::{Deserialize, Serialize};

use crate::error::NetError;
use crate::stream::{Decoded, decode_stream, encode_stream};

// ── Snapshots ───────────────────────────────────────────────────────────────

/// Every serialized entity of a simulation at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tick the snapshot was taken after.
    pub tick_id: u64,
    /// Concatenated entity records.
    pub records: Bytes,
}

impl Snapshot {
    /// Encode `instances` into a snapshot. Unserialized kinds are skipped.
    ///
    /// # Errors
    ///
    /// Propagates [`encode_stream`] failures.
    pub fn capture<'a>(
        tick_id: u64,
        instances: impl IntoIterator<Item = &'a EntityInstance>,
    ) -> Result<Self, NetError> {
        Ok(Self {
            tick_id,
            records: encode_stream(instances)?,
        })
    }

    /// Decode the records into fresh, detached instances.
    #[must_use]
    pub fn restore(&self, registry: &KindRegistry, ids: &IdAllocator) -> Decoded {
        decode_stream(registry, ids, &self.records)
    }
}

// ── Kind manifest ───────────────────────────────────────────────────────────

/// One field of a manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestField {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: FieldType,
    /// Excluded from generated sync hooks.
    pub transient: bool,
}

/// One kind as a peer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestKind {
    /// Kind name.
    pub name: String,
    /// Wire tag.
    pub class_id: ClassId,
    /// Layout fingerprint.
    pub fingerprint: u64,
    /// Whether instances are written to streams.
    pub serialize: bool,
    /// Fields in slot order.
    pub fields: Vec<ManifestField>,
}

/// Describes every kind of a registry so two peers can check they agree on
/// class ids and layouts before exchanging snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KindManifest {
    /// Kinds ordered by class id.
    pub kinds: Vec<ManifestKind>,
}

/// A disagreement between a received manifest and the local registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestMismatch {
    /// The peer has a kind this process lacks.
    Missing {
        /// Kind name.
        kind: String,
    },
    /// Both sides know the kind under different class ids.
    ClassId {
        /// Kind name.
        kind: String,
        /// Local class id.
        local: ClassId,
        /// Peer class id.
        remote: ClassId,
    },
    /// Both sides know the kind with different layouts.
    Fingerprint {
        /// Kind name.
        kind: String,
    },
}

impl KindManifest {
    /// Describe every kind in `registry`.
    #[must_use]
    pub fn from_registry(registry: &KindRegistry) -> Self {
        let mut kinds: Vec<ManifestKind> = registry
            .kinds()
            .map(|kind| ManifestKind {
                name: kind.name.clone(),
                class_id: kind.class_id,
                fingerprint: kind.fingerprint,
                serialize: kind.serialize,
                fields: kind
                    .layout
                    .iter()
                    .map(|def| ManifestField {
                        name: def.name.to_string(),
                        ty: def.ty,
                        transient: def.transient,
                    })
                    .collect(),
            })
            .collect();
        kinds.sort_by_key(|k| k.class_id);
        Self { kinds }
    }

    /// Look up a kind by name.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<&ManifestKind> {
        self.kinds.iter().find(|k| k.name == name)
    }

    /// Compare this (remote) manifest with the local registry. Kinds only the
    /// local side knows are not reported; the peer never sends them.
    #[must_use]
    pub fn mismatches(&self, registry: &KindRegistry) -> Vec<ManifestMismatch> {
        let mut out = Vec::new();
        for remote in &self.kinds {
            let Some(local) = registry.kind(&remote.name) else {
                out.push(ManifestMismatch::Missing {
                    kind: remote.name.clone(),
                });
                continue;
            };
            if local.class_id != remote.class_id {
                out.push(ManifestMismatch::ClassId {
                    kind: remote.name.clone(),
                    local: local.class_id,
                    remote: remote.class_id,
                });
            }
            if local.fingerprint != remote.fingerprint {
                out.push(ManifestMismatch::Fingerprint {
                    kind: remote.name.clone(),
                });
            }
        }
        out
    }

    /// Human-readable rendering for tooling.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Json`] if rendering fails.
    pub fn to_json(&self) -> Result<String, NetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use engine_component::{EntityId, FieldAccess};
    use std::sync::Arc;

    use super::*;
    use crate::testkit;

    #[test]
    fn test_snapshot_capture_and_restore() {
        let registry = testkit::registry();
        let mut soldier = EntityInstance::new(EntityId(1), Arc::clone(registry.kind("soldier").unwrap()));
        soldier.set("team", 4i32);
        let ghost = EntityInstance::new(EntityId(2), Arc::clone(registry.kind("ghost").unwrap()));

        let snapshot = Snapshot::capture(12, [&soldier, &ghost]).unwrap();
        assert_eq!(snapshot.tick_id, 12);

        let restored = snapshot.restore(&registry, &IdAllocator::new());
        assert!(restored.is_clean());
        assert_eq!(restored.entities.len(), 1);
        assert_eq!(restored.entities[0].fields().int("team"), 4);
    }

    #[test]
    fn test_manifest_lists_kinds_by_class_id() {
        let registry = testkit::registry();
        let manifest = KindManifest::from_registry(&registry);
        let names: Vec<_> = manifest.kinds.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["ghost", "pilot", "soldier", "tag"]);

        let soldier = manifest.kind("soldier").unwrap();
        assert_eq!(soldier.class_id, ClassId(2));
        assert!(soldier.serialize);
        assert!(!manifest.kind("ghost").unwrap().serialize);
        assert!(soldier.fields.iter().any(|f| f.name == "reads" && f.transient));
        assert!(manifest.mismatches(&registry).is_empty());
    }

    #[test]
    fn test_manifest_mismatches() {
        let registry = testkit::registry();
        let mut manifest = KindManifest::from_registry(&registry);
        manifest.kinds[1].class_id = ClassId(9);
        manifest.kinds[2].fingerprint ^= 1;
        manifest.kinds.push(ManifestKind {
            name: "drone".into(),
            class_id: ClassId(4),
            fingerprint: 0,
            serialize: true,
            fields: Vec::new(),
        });

        assert_eq!(
            manifest.mismatches(&registry),
            vec![
                ManifestMismatch::ClassId {
                    kind: "pilot".into(),
                    local: ClassId(1),
                    remote: ClassId(9),
                },
                ManifestMismatch::Fingerprint {
                    kind: "soldier".into()
                },
                ManifestMismatch::Missing {
                    kind: "drone".into()
                },
            ]
        );
    }

    #[test]
    fn test_manifest_json() {
        let registry = testkit::registry();
        let json = KindManifest::from_registry(&registry).to_json().unwrap();
        assert!(json.contains("\"soldier\""));
        assert!(json.contains("\"fingerprint\""));
    }
}
