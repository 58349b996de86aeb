//! Snapshots of catalog kinds mirrored between two independent registries.

use std::sync::Arc;

use engine_component::{EntityId, FieldAccess, FieldType, FieldValue, IdAllocator, LValue};
use engine_compose::{ClassId, ClassIdMap, KindRegistry};
use engine_content::{KINDS, catalog, catalog_with, fragments};
use engine_entity::{EntityGroups, EntityInstance};
use engine_net::{DecodeError, KindManifest, ManifestMismatch, Snapshot, decode, encode};
use glam::Vec2;
use proptest::prelude::*;

fn server() -> EntityGroups {
    let mut g = EntityGroups::new(Arc::new(catalog().unwrap()));

    let unit = g.create("unit").unwrap();
    let e = g.get_mut(unit).unwrap();
    e.set("pos", Vec2::new(3.0, -4.0));
    e.set("vel", Vec2::new(1.0, 0.5));
    e.set("team", 2i32);
    e.set("item_count", 6i32);
    e.call("damage", &[LValue::Num(35.0)]);
    g.add(unit);

    let building = g.create("building").unwrap();
    g.get_mut(building).unwrap().set("enabled", false);
    g.add(building);

    let player = g.create("player").unwrap();
    g.get_mut(player).unwrap().set("name", "kestrel");
    g.add(player);

    let effect = g.create("effect").unwrap();
    g.add(effect);
    g
}

/// Registry whose `unit` no longer carries items, so its layout fingerprint
/// changes while every other kind stays the same.
fn without_unit_items(class_map: ClassIdMap) -> KindRegistry {
    let mut builder = KindRegistry::builder().with_class_map(class_map);
    for fragment in fragments::all() {
        builder = builder.fragment(fragment);
    }
    for (name, parts) in KINDS {
        let parts: Vec<&str> = parts
            .iter()
            .copied()
            .filter(|p| *name != "unit" || *p != "items")
            .collect();
        builder = builder.kind(*name, &parts);
    }
    builder.build().unwrap()
}

fn synced_state(e: &EntityInstance) -> Vec<(String, String)> {
    e.kind()
        .layout
        .iter()
        .filter(|def| !def.transient)
        .map(|def| (def.name.to_string(), format!("{:?}", e.get(def.name))))
        .collect()
}

#[test]
fn test_snapshot_mirrors_synced_state() {
    let server = server();
    let snapshot = Snapshot::capture(40, server.all()).unwrap();
    let wire = encode(&snapshot).unwrap();

    let mut client = EntityGroups::new(Arc::new(catalog().unwrap()));
    let received: Snapshot = decode(&wire).unwrap();
    assert_eq!(received.tick_id, 40);

    let restored = received.restore(client.registry(), client.ids());
    assert!(restored.is_clean());
    for instance in restored.entities {
        let id = client.insert(instance).unwrap();
        assert!(client.add(id));
    }

    // The effect kind is client-only.
    let server_synced: Vec<_> = server.all().filter(|e| e.kind().serialize).collect();
    let client_all: Vec<_> = client.all().collect();
    assert_eq!(client_all.len(), server_synced.len());
    for (theirs, ours) in server_synced.iter().zip(&client_all) {
        assert_eq!(theirs.kind().name, ours.kind().name);
        assert_eq!(synced_state(theirs), synced_state(ours));
    }

    let unit = client_all.iter().find(|e| e.kind().name == "unit").unwrap();
    assert_eq!(unit.fields().float("health"), 65.0);
    assert!(!unit.fields().bool("dead"));
}

#[test]
fn test_dead_state_is_derived_on_read() {
    let mut server = EntityGroups::new(Arc::new(catalog().unwrap()));
    let unit = server.create("unit").unwrap();
    server.get_mut(unit).unwrap().set("health", 0.0f32);
    server.add(unit);
    let snapshot = Snapshot::capture(1, server.all()).unwrap();

    let mut client = EntityGroups::new(Arc::new(catalog().unwrap()));
    let restored = snapshot.restore(client.registry(), client.ids());
    let instance = restored.entities.into_iter().next().unwrap();
    assert!(instance.fields().bool("dead"));

    let id = client.insert(instance).unwrap();
    client.add(id);
    client.update(0.016);
    assert!(client.is_empty());
}

#[test]
fn test_changed_kind_reads_old_records_as_unknown() {
    let old = catalog().unwrap();
    let snapshot = Snapshot::capture(7, server().all()).unwrap();

    let new = without_unit_items(old.class_map().clone());
    let unit = new.kind("unit").unwrap();
    assert_ne!(unit.class_id, old.kind("unit").unwrap().class_id);
    assert_eq!(unit.class_id, ClassId(5));
    assert_eq!(
        new.kind("building").unwrap().class_id,
        old.kind("building").unwrap().class_id
    );

    let mut client = EntityGroups::new(Arc::new(new));
    let restored = snapshot.restore(client.registry(), client.ids());
    assert_eq!(
        restored.failures,
        vec![DecodeError::UnknownKind(old.kind("unit").unwrap().class_id)]
    );
    let kinds: Vec<_> = restored.entities.iter().map(|e| e.kind().name.clone()).collect();
    assert_eq!(kinds, vec!["building", "player"]);
    for instance in restored.entities {
        client.insert(instance).unwrap();
    }

    let mismatches = KindManifest::from_registry(&old).mismatches(client.registry());
    assert_eq!(
        mismatches,
        vec![
            ManifestMismatch::ClassId {
                kind: "unit".into(),
                local: ClassId(5),
                remote: ClassId(4),
            },
            ManifestMismatch::Fingerprint { kind: "unit".into() },
        ]
    );
}

/// One value per field type for each edge profile: zero, negative, max, min.
fn edge_value(ty: FieldType, profile: usize) -> FieldValue {
    match (ty, profile) {
        (FieldType::Bool, p) => FieldValue::Bool(p % 2 == 1),
        (FieldType::Int, p) => FieldValue::Int([0, -1, i32::MAX, i32::MIN][p]),
        (FieldType::Long, p) => FieldValue::Long([0, -1, i64::MAX, i64::MIN][p]),
        (FieldType::Float, p) => FieldValue::Float([0.0, -1.5, f32::MAX, f32::MIN][p]),
        (FieldType::Vec2, p) => FieldValue::Vec2(
            [
                Vec2::ZERO,
                Vec2::new(-1.0, -2.5),
                Vec2::splat(f32::MAX),
                Vec2::new(f32::MIN, f32::MAX),
            ][p],
        ),
        (FieldType::Text, 0) => FieldValue::Text(String::new()),
        (FieldType::Text, 1) => FieldValue::Text("-".into()),
        (FieldType::Text, 2) => FieldValue::Text("ü".repeat(40_000)),
        (FieldType::Text, _) => FieldValue::Text("x".repeat(70_000)),
        (FieldType::Entity, p) => {
            FieldValue::Entity([EntityId::INVALID, EntityId(1), EntityId(u64::MAX), EntityId(42)][p])
        }
    }
}

#[test]
fn test_every_serialized_kind_survives_edge_values() {
    let registry = Arc::new(catalog().unwrap());
    for profile in 0..4 {
        let mut sent = Vec::new();
        for (n, kind) in registry.kinds().filter(|k| k.serialize).enumerate() {
            let mut e = EntityInstance::new(EntityId(n as u64 + 1), Arc::clone(kind));
            for def in kind.layout.iter().filter(|def| !def.transient) {
                assert!(e.set(def.name, edge_value(def.ty, profile)), "{}.{}", kind.name, def.name);
            }
            sent.push(e);
        }

        let wire = encode(&Snapshot::capture(profile as u64, &sent).unwrap()).unwrap();
        let received: Snapshot = decode(&wire).unwrap();
        let restored = received.restore(&registry, &IdAllocator::new());
        assert!(restored.is_clean(), "profile {profile}: {:?}", restored.failures);
        assert_eq!(restored.entities.len(), sent.len());
        for (theirs, mut ours) in sent.iter().zip(restored.entities) {
            assert_eq!(theirs.kind().name, ours.kind().name);
            assert_eq!(synced_state(theirs), synced_state(&ours), "profile {profile}");

            // Methods stay total on whatever state a record carries.
            if ours.kind().methods.contains_key("accept_items") {
                ours.call("accept_items", &[LValue::Num(5.0)]);
                ours.call("remove_items", &[LValue::Num(f64::MAX)]);
                assert_eq!(ours.fields().int("item_count"), 0);
            }
        }
    }
}

#[test]
fn test_class_map_survives_json() {
    let first = catalog().unwrap();
    let json = first.class_map().to_json().unwrap();
    let second = catalog_with(ClassIdMap::from_json(&json).unwrap()).unwrap();
    assert_eq!(
        KindManifest::from_registry(&first),
        KindManifest::from_registry(&second)
    );
}

proptest! {
    #[test]
    fn prop_unit_state_survives_snapshot(
        x in -1.0e4f32..1.0e4,
        y in -1.0e4f32..1.0e4,
        team in 0i32..256,
        health in -50.0f32..500.0,
        items in 0i32..10,
    ) {
        let registry = Arc::new(catalog().unwrap());
        let mut server = EntityGroups::new(Arc::clone(&registry));
        let id = server.create("unit").unwrap();
        let e = server.get_mut(id).unwrap();
        e.set("pos", Vec2::new(x, y));
        e.set("team", team);
        e.set("health", health);
        e.set("item_count", items);
        server.add(id);

        let snapshot = Snapshot::capture(0, server.all()).unwrap();
        let restored = snapshot.restore(&registry, &IdAllocator::new());
        prop_assert!(restored.is_clean());
        let unit = &restored.entities[0];
        prop_assert_eq!(synced_state(unit), synced_state(server.get(id).unwrap()));
        prop_assert_eq!(unit.fields().bool("dead"), health <= 0.0);
    }
}
