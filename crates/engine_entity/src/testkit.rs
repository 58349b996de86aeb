//! Shared fixtures for the unit tests of this crate.

use std::sync::Arc;

use engine_component::{
    CapabilityDef, FieldAccess, FieldDef, FieldType, Fragment, HookImpl, LAccess, LValue,
};
use engine_compose::KindRegistry;

/// A small registry:
///
/// - `unit`: health, team, aging, controlled
/// - `bullet`: team, aging, lifetime (removes itself once `age >= life`)
/// - `spawner`: team, spawns a `bullet` when added
/// - `marker`: nothing but the base contracts, not serialized
/// - `emitter`: spawns a `bullet` on every update
/// - `hunter`: removes the entity in its `target` field on every update
/// - `ship`: team, leaves a `bullet` behind when removed
pub(crate) fn registry() -> Arc<KindRegistry> {
    let registry = KindRegistry::builder()
        .fragment(
            Fragment::builder("base")
                .provides_class_id()
                .provides_serialize(true)
                .build(),
        )
        .fragment(
            Fragment::builder("quiet")
                .provides_class_id()
                .provides_serialize(false)
                .build(),
        )
        .fragment(
            Fragment::builder("health")
                .field(FieldDef::new("health", 100.0f32))
                .method("damage", |f, args| {
                    let amount = args.first().map_or(0.0, LValue::num);
                    #[allow(clippy::cast_possible_truncation)]
                    let health = f.float("health") - amount as f32;
                    f.set("health", health);
                    LValue::Num(f64::from(health))
                })
                .sense(LAccess::Health, |f| LValue::Num(f64::from(f.float("health"))))
                .sync()
                .build(),
        )
        .fragment(
            Fragment::builder("team")
                .field(FieldDef::new("team", 1i32))
                .sense(LAccess::Team, |f| LValue::Num(f64::from(f.int("team"))))
                .control(LAccess::Enabled, |f, args| {
                    f.set("team", i32::from(args.first().is_some_and(LValue::truthy)));
                })
                .sync()
                .build(),
        )
        .fragment(
            Fragment::builder("aging")
                .field(FieldDef::new("age", 0.0f32).transient())
                .hook(HookImpl::update(|ctx| {
                    let age = ctx.fields.float("age") + ctx.dt;
                    ctx.fields.set("age", age);
                }))
                .build(),
        )
        .fragment(
            Fragment::builder("lifetime")
                .field(FieldDef::new("life", 1.0f32))
                .import("age", FieldType::Float)
                .hook(
                    HookImpl::update(|ctx| {
                        if ctx.fields.float("age") >= ctx.fields.float("life") {
                            ctx.remove_self();
                        }
                    })
                    .priority(-1),
                )
                .build(),
        )
        .fragment(
            Fragment::builder("controlled")
                .field(FieldDef::zeroed("controller", FieldType::Entity))
                .build(),
        )
        .fragment(
            Fragment::builder("spawning")
                .hook(HookImpl::add(|ctx| {
                    ctx.commands.spawn("bullet", vec![("team", 7i32.into())]);
                }))
                .build(),
        )
        .fragment(
            Fragment::builder("emitting")
                .hook(HookImpl::update(|ctx| {
                    ctx.commands.spawn("bullet", Vec::new());
                }))
                .build(),
        )
        .fragment(
            Fragment::builder("hunting")
                .field(FieldDef::zeroed("target", FieldType::Entity))
                .hook(HookImpl::update(|ctx| {
                    let target = ctx.fields.entity("target");
                    if target.is_valid() {
                        ctx.commands.remove(target);
                    }
                }))
                .build(),
        )
        .fragment(
            Fragment::builder("wrecking")
                .hook(HookImpl::remove(|ctx| {
                    ctx.commands.spawn("bullet", vec![("team", 9i32.into())]);
                }))
                .build(),
        )
        .capability(CapabilityDef::new("targetable").method("damage").field("team"))
        .kind("unit", &["base", "health", "team", "aging", "controlled"])
        .kind("bullet", &["base", "team", "aging", "lifetime"])
        .kind("spawner", &["base", "team", "spawning"])
        .kind("marker", &["quiet"])
        .kind("emitter", &["base", "emitting"])
        .kind("hunter", &["base", "hunting"])
        .kind("ship", &["base", "team", "wrecking"])
        .build();

    match registry {
        Ok(registry) => Arc::new(registry),
        Err(e) => panic!("test registry must resolve: {e}"),
    }
}
