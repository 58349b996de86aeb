//! Fragment definitions.
//!
//! Field names are the catalog's shared vocabulary: a fragment that needs a
//! field owned by another one imports it by the same name.

use engine_component::{
    EntityId, FieldAccess, FieldDef, FieldType, FieldValue, Fragment, HookImpl, LAccess, LValue,
};
use engine_compose::CONTROLLER_FIELD;
use glam::Vec2;

/// Speed of bullets spawned by [`shooter`], in units per second.
pub const BULLET_SPEED: f32 = 8.0;

#[allow(clippy::cast_possible_truncation)]
fn arg(args: &[LValue], index: usize) -> f32 {
    args.get(index).map_or(0.0, LValue::num) as f32
}

fn num(v: f32) -> LValue {
    LValue::Num(f64::from(v))
}

fn flag(v: bool) -> LValue {
    LValue::Num(if v { 1.0 } else { 0.0 })
}

/// Provides the class id of every synced kind and marks it serialized.
#[must_use]
pub fn entity() -> Fragment {
    Fragment::builder("entity")
        .provides_class_id()
        .provides_serialize(true)
        .build()
}

/// Provides the class id of client-side kinds that never hit the wire.
#[must_use]
pub fn decal() -> Fragment {
    Fragment::builder("decal")
        .provides_class_id()
        .provides_serialize(false)
        .build()
}

/// World position.
#[must_use]
pub fn pos() -> Fragment {
    Fragment::builder("pos")
        .field(FieldDef::new("pos", Vec2::ZERO))
        .sense(LAccess::X, |f| num(f.vec2("pos").x))
        .sense(LAccess::Y, |f| num(f.vec2("pos").y))
        .sync()
        .build()
}

/// Linear motion with drag. Integrates `pos` on update.
#[must_use]
pub fn vel() -> Fragment {
    Fragment::builder("vel")
        .field(FieldDef::new("vel", Vec2::ZERO))
        .field(FieldDef::new("drag", 0.0f32).transient())
        .import("pos", FieldType::Vec2)
        .hook(HookImpl::update(|ctx| {
            let vel = ctx.fields.vec2("vel");
            let pos = ctx.fields.vec2("pos") + vel * ctx.dt;
            let damped = vel * (1.0 - ctx.fields.float("drag") * ctx.dt).max(0.0);
            ctx.fields.set("pos", pos);
            ctx.fields.set("vel", damped);
        }))
        .sync()
        .build()
}

/// Facing, in degrees.
#[must_use]
pub fn rotation() -> Fragment {
    Fragment::builder("rotation")
        .field(FieldDef::new("rotation", 0.0f32))
        .sense(LAccess::Rotation, |f| num(f.float("rotation")))
        .sync()
        .build()
}

/// Hit points. Dead entities remove themselves after every other update.
#[must_use]
pub fn health() -> Fragment {
    Fragment::builder("health")
        .field(FieldDef::new("health", 100.0f32))
        .field(FieldDef::new("max_health", 100.0f32))
        .field(FieldDef::new("dead", false).transient())
        .method("damage", |f, args| {
            let health = f.float("health") - arg(args, 0);
            f.set("health", health);
            f.set("dead", health <= 0.0);
            num(health)
        })
        .method("heal", |f, args| {
            let health = (f.float("health") + arg(args, 0)).min(f.float("max_health"));
            f.set("health", health);
            f.set("dead", health <= 0.0);
            num(health)
        })
        .method("healthf", |f, _| {
            let max = f.float("max_health");
            num(if max > 0.0 { f.float("health") / max } else { 0.0 })
        })
        .sense(LAccess::Health, |f| num(f.float("health")))
        .sense(LAccess::MaxHealth, |f| num(f.float("max_health")))
        .sense(LAccess::Dead, |f| flag(f.bool("dead")))
        .hook(
            HookImpl::update(|ctx| {
                if ctx.fields.bool("dead") {
                    ctx.remove_self();
                }
            })
            .late(),
        )
        // `dead` is not synced; derive it from the decoded health.
        .hook(HookImpl::after_read(|f| {
            let dead = f.float("health") <= 0.0;
            f.set("dead", dead);
        }))
        .sync()
        .build()
}

/// Team index. 0 is derelict.
#[must_use]
pub fn team() -> Fragment {
    Fragment::builder("team")
        .field(FieldDef::new("team", 0i32))
        .sense(LAccess::Team, |f| LValue::Num(f64::from(f.int("team"))))
        .sync()
        .build()
}

/// Fires bullets toward `aim` while `shooting`, once per `reload_time`.
#[must_use]
pub fn shooter() -> Fragment {
    Fragment::builder("shooter")
        .field(FieldDef::new("aim", Vec2::ZERO))
        .field(FieldDef::new("shooting", false))
        .field(FieldDef::new("reload", 0.0f32).transient())
        .field(FieldDef::new("reload_time", 0.5f32).transient())
        .import("pos", FieldType::Vec2)
        .import("team", FieldType::Int)
        .control(LAccess::Shoot, |f, args| {
            f.set("aim", Vec2::new(arg(args, 0), arg(args, 1)));
            f.set("shooting", args.get(2).is_some_and(LValue::truthy));
        })
        .sense(LAccess::ShootX, |f| num(f.vec2("aim").x))
        .sense(LAccess::ShootY, |f| num(f.vec2("aim").y))
        .sense(LAccess::Shooting, |f| flag(f.bool("shooting")))
        .hook(HookImpl::update(|ctx| {
            let reload = (ctx.fields.float("reload") - ctx.dt).max(0.0);
            ctx.fields.set("reload", reload);
            if !ctx.fields.bool("shooting") || reload > 0.0 {
                return;
            }

            let reload_time = ctx.fields.float("reload_time");
            ctx.fields.set("reload", reload_time);
            let pos = ctx.fields.vec2("pos");
            let dir = (ctx.fields.vec2("aim") - pos).normalize_or_zero();
            let team = ctx.fields.int("team");
            ctx.commands.spawn(
                "bullet",
                vec![
                    ("pos", FieldValue::Vec2(pos)),
                    ("vel", FieldValue::Vec2(dir * BULLET_SPEED)),
                    ("team", FieldValue::Int(team)),
                ],
            );
        }))
        .sync()
        .build()
}

// Decoded stacks may hold any i32; clamp before doing arithmetic on them.
fn stack(f: &impl FieldAccess) -> (i32, i32) {
    let capacity = f.int("item_capacity").max(0);
    (f.int("item_count").clamp(0, capacity), capacity)
}

/// A single stack of items with a capacity.
#[must_use]
pub fn items() -> Fragment {
    Fragment::builder("items")
        .field(FieldDef::new("item_count", 0i32))
        .field(FieldDef::new("item_capacity", 10i32))
        .method("accept_items", |f, args| {
            #[allow(clippy::cast_possible_truncation)]
            let offered = args.first().map_or(0.0, LValue::num).max(0.0) as i32;
            let (count, capacity) = stack(f);
            let accepted = offered.min(capacity - count);
            f.set("item_count", count + accepted);
            LValue::Num(f64::from(accepted))
        })
        .method("remove_items", |f, args| {
            #[allow(clippy::cast_possible_truncation)]
            let wanted = args.first().map_or(0.0, LValue::num).max(0.0) as i32;
            let (count, _) = stack(f);
            let removed = wanted.min(count);
            f.set("item_count", count - removed);
            LValue::Num(f64::from(removed))
        })
        .sense(LAccess::TotalItems, |f| LValue::Num(f64::from(f.int("item_count"))))
        .sense(LAccess::ItemCapacity, |f| {
            LValue::Num(f64::from(f.int("item_capacity")))
        })
        .sync()
        .build()
}

/// The player or other entity steering this one.
#[must_use]
pub fn controlled() -> Fragment {
    Fragment::builder("controlled")
        .field(FieldDef::new(CONTROLLER_FIELD, EntityId::INVALID))
        .sense(LAccess::Controller, |f| LValue::Entity(f.entity(CONTROLLER_FIELD)))
        .sense(LAccess::Controlled, |f| {
            flag(f.entity(CONTROLLER_FIELD).is_valid())
        })
        .sync()
        .build()
}

/// Expires once `time` reaches `lifetime`.
#[must_use]
pub fn timed() -> Fragment {
    Fragment::builder("timed")
        .field(FieldDef::new("time", 0.0f32))
        .field(FieldDef::new("lifetime", 1.0f32))
        .method("fin", |f, _| {
            let lifetime = f.float("lifetime");
            num(if lifetime > 0.0 {
                (f.float("time") / lifetime).min(1.0)
            } else {
                1.0
            })
        })
        .hook(
            HookImpl::update(|ctx| {
                let time = ctx.fields.float("time") + ctx.dt;
                ctx.fields.set("time", time);
                if time >= ctx.fields.float("lifetime") {
                    ctx.remove_self();
                }
            })
            .priority(-1),
        )
        .sync()
        .build()
}

/// Damage dealt on impact.
#[must_use]
pub fn bullet() -> Fragment {
    Fragment::builder("bullet")
        .field(FieldDef::new("damage", 10.0f32))
        .sync()
        .build()
}

/// A connected player and the unit it drives.
#[must_use]
pub fn player() -> Fragment {
    Fragment::builder("player")
        .field(FieldDef::new("name", ""))
        .field(FieldDef::new("unit", EntityId::INVALID))
        .sense(LAccess::Name, |f| LValue::Text(f.text("name").to_string()))
        .sync()
        .build()
}

/// A block that logic can switch on and off.
#[must_use]
pub fn building() -> Fragment {
    Fragment::builder("building")
        .field(FieldDef::new("enabled", true))
        .control(LAccess::Enabled, |f, args| {
            f.set("enabled", args.first().is_some_and(LValue::truthy));
        })
        .sense(LAccess::Enabled, |f| flag(f.bool("enabled")))
        .sync()
        .build()
}

/// Every fragment of the catalog.
#[must_use]
pub fn all() -> Vec<Fragment> {
    vec![
        entity(),
        decal(),
        pos(),
        vel(),
        rotation(),
        health(),
        team(),
        shooter(),
        items(),
        controlled(),
        timed(),
        bullet(),
        player(),
        building(),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use engine_component::{FieldLayout, Fields, FieldsMut, Hook, HookBody, Writes};

    use super::*;

    fn fields_of(fragment: &Fragment) -> (FieldLayout, Vec<FieldValue>) {
        let mut layout = FieldLayout::new();
        for def in &fragment.fields {
            layout.push(def.clone());
        }
        let values = layout.defaults();
        (layout, values)
    }

    #[test]
    fn test_fragment_names_are_unique() {
        let all = all();
        let names: BTreeSet<_> = all.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn test_damage_and_heal() {
        let health = health();
        let (layout, mut values) = fields_of(&health);
        let mut fields = FieldsMut::new(&layout, &mut values);
        let damage = &health.methods.iter().find(|(n, _)| *n == "damage").unwrap().1;
        let heal = &health.methods.iter().find(|(n, _)| *n == "heal").unwrap().1;

        assert_eq!(damage(&mut fields, &[LValue::Num(30.0)]), LValue::Num(70.0));
        assert_eq!(heal(&mut fields, &[LValue::Num(50.0)]), LValue::Num(100.0));
        assert_eq!(damage(&mut fields, &[LValue::Num(120.0)]), LValue::Num(-20.0));
        assert!(fields.bool("dead"));
    }

    #[test]
    fn test_items_respect_capacity() {
        let items = items();
        let (layout, mut values) = fields_of(&items);
        let mut fields = FieldsMut::new(&layout, &mut values);
        let accept = &items.methods.iter().find(|(n, _)| *n == "accept_items").unwrap().1;
        let remove = &items.methods.iter().find(|(n, _)| *n == "remove_items").unwrap().1;

        assert_eq!(accept(&mut fields, &[LValue::Num(7.0)]), LValue::Num(7.0));
        assert_eq!(accept(&mut fields, &[LValue::Num(7.0)]), LValue::Num(3.0));
        assert_eq!(accept(&mut fields, &[LValue::Num(-4.0)]), LValue::Num(0.0));
        assert_eq!(remove(&mut fields, &[LValue::Num(12.0)]), LValue::Num(10.0));
        assert_eq!(fields.int("item_count"), 0);
    }

    #[test]
    fn test_items_tolerate_out_of_range_counts() {
        let items = items();
        let (layout, mut values) = fields_of(&items);
        let mut fields = FieldsMut::new(&layout, &mut values);
        let accept = &items.methods.iter().find(|(n, _)| *n == "accept_items").unwrap().1;
        let remove = &items.methods.iter().find(|(n, _)| *n == "remove_items").unwrap().1;

        fields.set("item_count", i32::MIN);
        assert_eq!(accept(&mut fields, &[LValue::Num(5.0)]), LValue::Num(5.0));
        assert_eq!(fields.int("item_count"), 5);

        fields.set("item_count", i32::MAX);
        assert_eq!(accept(&mut fields, &[LValue::Num(f64::MAX)]), LValue::Num(0.0));
        assert_eq!(remove(&mut fields, &[LValue::Num(f64::MAX)]), LValue::Num(10.0));
        assert_eq!(fields.int("item_count"), 0);

        fields.set("item_capacity", i32::MIN);
        fields.set("item_count", 3);
        assert_eq!(accept(&mut fields, &[LValue::Num(1.0)]), LValue::Num(0.0));
        assert_eq!(fields.int("item_count"), 0);
    }

    #[test]
    fn test_health_derives_dead_after_read() {
        let health = health();
        let after_read = health
            .hooks
            .iter()
            .find_map(|h| match (&h.hook, &h.body) {
                (Hook::AfterRead, HookBody::AfterRead(f)) => Some(f),
                _ => None,
            })
            .unwrap();
        let (layout, mut values) = fields_of(&health);
        let mut fields = FieldsMut::new(&layout, &mut values);
        fields.set("health", -1.0f32);
        after_read(&mut fields);
        assert!(fields.bool("dead"));
    }

    #[test]
    fn test_shooter_syncs_only_aim_and_trigger() {
        let shooter = shooter();
        let write = shooter
            .hooks
            .iter()
            .find_map(|h| match &h.body {
                HookBody::Write(f) => Some(f),
                _ => None,
            })
            .unwrap();
        let (layout, values) = fields_of(&shooter);
        let mut out = Writes::new();
        write(&Fields::new(&layout, &values), &mut out);
        // vec2 aim + bool shooting
        assert_eq!(out.len(), 9);
    }
}
