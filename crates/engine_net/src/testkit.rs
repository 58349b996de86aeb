//! Shared fixtures for the unit tests of this crate.

use std::sync::Arc;

use engine_component::{FieldAccess, FieldDef, Fragment, FieldType, HookImpl};
use engine_compose::KindRegistry;

/// Class ids follow kind-name order: `ghost` 0, `pilot` 1, `soldier` 2,
/// `tag` 3.
///
/// `soldier` serializes `team` (write priority 1) before `health` (priority
/// 0) even though `health_sync` is listed first. Its `after_read` hook counts
/// how often it ran in `reads` and copies the decoded team into `seen_team`.
pub(crate) fn registry() -> Arc<KindRegistry> {
    let registry = KindRegistry::builder()
        .fragment(
            Fragment::builder("entity")
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
            Fragment::builder("stats")
                .field(FieldDef::new("health", 100.0f32))
                .field(FieldDef::new("team", 1i32))
                .build(),
        )
        .fragment(
            Fragment::builder("health_sync")
                .import("health", FieldType::Float)
                .import("team", FieldType::Int)
                .field(FieldDef::new("reads", 0i32).transient())
                .field(FieldDef::new("seen_team", 0i32).transient())
                .hook(HookImpl::write(|f, w| w.f32(f.float("health"))))
                .hook(HookImpl::read(|f, r| {
                    let health = r.f32()?;
                    f.set("health", health);
                    Ok(())
                }))
                .hook(HookImpl::after_read(|f| {
                    let reads = f.int("reads") + 1;
                    let team = f.int("team");
                    f.set("reads", reads);
                    f.set("seen_team", team);
                }))
                .build(),
        )
        .fragment(
            Fragment::builder("team_sync")
                .import("team", FieldType::Int)
                .hook(HookImpl::write(|f, w| w.i32(f.int("team"))).priority(1))
                .hook(
                    HookImpl::read(|f, r| {
                        let team = r.i32()?;
                        f.set("team", team);
                        Ok(())
                    })
                    .priority(1),
                )
                .build(),
        )
        .fragment(
            Fragment::builder("named")
                .field(FieldDef::new("name", ""))
                .sync()
                .build(),
        )
        .kind("soldier", &["entity", "stats", "health_sync", "team_sync"])
        .kind("ghost", &["quiet", "stats"])
        .kind("pilot", &["entity", "named"])
        .kind("tag", &["entity"])
        .build();

    match registry {
        Ok(registry) => Arc::new(registry),
        Err(e) => panic!("test registry must resolve: {e}"),
    }
}
