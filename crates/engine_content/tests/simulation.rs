//! Catalog kinds driven through the group manager.

use std::sync::Arc;

use engine_component::{EntityId, FieldAccess, LAccess, LValue};
use engine_content::capabilities::{Mortal, Shooter, Targetable};
use engine_content::{BULLET_SPEED, catalog};
use engine_entity::{CapabilityError, EntityGroups, LocalActor};
use glam::Vec2;

fn groups() -> EntityGroups {
    EntityGroups::new(Arc::new(catalog().unwrap()))
}

fn spawn(groups: &mut EntityGroups, kind: &str) -> EntityId {
    let id = groups.create(kind).unwrap();
    assert!(groups.add(id));
    id
}

fn count(groups: &EntityGroups, kind: &str) -> usize {
    groups.all().filter(|e| e.kind().name == kind).count()
}

#[test]
fn test_shooting_unit_spawns_bullets_that_expire() {
    let mut g = groups();
    let unit = spawn(&mut g, "unit");
    g.get_mut(unit).unwrap().set("team", 2i32);

    let fire = [LValue::Num(10.0), LValue::Num(0.0), LValue::Num(1.0)];
    assert!(g.control(unit, LAccess::Shoot, &fire));
    assert_eq!(g.sense(unit, LAccess::Shooting), LValue::Num(1.0));
    assert_eq!(g.sense(unit, LAccess::ShootX), LValue::Num(10.0));

    g.update(0.1);
    assert_eq!(count(&g, "bullet"), 1);
    let bullet = g.all().find(|e| e.kind().name == "bullet").unwrap();
    assert_eq!(bullet.fields().vec2("vel"), Vec2::new(BULLET_SPEED, 0.0));
    assert_eq!(bullet.fields().int("team"), 2);
    // Spawned during the pass, so not yet updated by it.
    assert_eq!(bullet.fields().float("time"), 0.0);

    let stop = [LValue::Num(0.0), LValue::Num(0.0), LValue::Num(0.0)];
    assert!(g.control(unit, LAccess::Shoot, &stop));
    for _ in 0..12 {
        g.update(0.1);
    }
    assert_eq!(count(&g, "bullet"), 0);
    assert!(g.is_added(unit));
}

#[test]
fn test_dead_units_leave_after_the_pass() {
    let mut g = groups();
    let unit = spawn(&mut g, "unit");
    let building = spawn(&mut g, "building");

    let left = g.get_mut(unit).unwrap().call("damage", &[LValue::Num(150.0)]);
    assert_eq!(left, Some(LValue::Num(-50.0)));
    assert_eq!(g.sense(unit, LAccess::Dead), LValue::Num(1.0));

    g.update(0.1);
    assert!(!g.is_added(unit));
    assert!(g.get(unit).is_none());
    assert!(g.is_added(building));
}

#[test]
fn test_sense_and_control_dispatch() {
    let mut g = groups();
    let building = spawn(&mut g, "building");
    let bullet = spawn(&mut g, "bullet");

    assert_eq!(g.sense(building, LAccess::Enabled), LValue::Num(1.0));
    assert!(g.control(building, LAccess::Enabled, &[LValue::Num(0.0)]));
    assert_eq!(g.sense(building, LAccess::Enabled), LValue::Num(0.0));
    assert_eq!(g.sense(building, LAccess::ItemCapacity), LValue::Num(10.0));

    // No handler: zero for senses, nothing happens for controls.
    assert_eq!(g.sense(building, LAccess::Shooting), LValue::Num(0.0));
    assert!(!g.control(bullet, LAccess::Enabled, &[LValue::Num(1.0)]));
    assert_eq!(g.sense(EntityId(999), LAccess::Health), LValue::Null);
}

#[test]
fn test_capability_groups_and_views() {
    let mut g = groups();
    let unit = spawn(&mut g, "unit");
    let bullet = spawn(&mut g, "bullet");
    let building = spawn(&mut g, "building");
    let detached = g.create("unit").unwrap();

    let mortal: Vec<_> = g.group_of::<Mortal>().map(|e| e.id()).collect();
    assert_eq!(mortal, vec![unit, building]);
    assert!(!mortal.contains(&detached));

    let mut view = g.view_mut::<Targetable>(building).unwrap();
    assert_eq!(view.call("damage", &[LValue::Num(25.0)]), Some(LValue::Num(75.0)));
    // Outside the capability even though the kind has it.
    assert_eq!(view.call("accept_items", &[LValue::Num(1.0)]), None);

    assert!(matches!(
        g.view::<Targetable>(bullet),
        Err(CapabilityError::Unsupported(_))
    ));
    assert!(!g.supports(building, g.registry().capability_of::<Shooter>().unwrap()));
    assert!(matches!(
        g.view::<Shooter>(building),
        Err(CapabilityError::Unsupported(_))
    ));
    assert!(matches!(
        g.view::<Targetable>(EntityId(999)),
        Err(CapabilityError::NoSuchEntity(_))
    ));
}

#[test]
fn test_local_actor() {
    let mut g = groups();
    let player = spawn(&mut g, "player");
    let mine = spawn(&mut g, "unit");
    let theirs = spawn(&mut g, "unit");
    g.get_mut(mine).unwrap().set("controller", player);

    let local = LocalActor::new(player);
    assert!(local.is_local(g.get(player).unwrap()));
    assert!(local.is_local(g.get(mine).unwrap()));
    assert!(!local.is_local(g.get(theirs).unwrap()));
    assert!(!LocalActor::none().is_local(g.get(mine).unwrap()));
    assert_eq!(
        g.sense(mine, LAccess::Controller),
        LValue::Entity(player)
    );
}
