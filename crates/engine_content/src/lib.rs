//! # engine_content
//!
//! The built-in catalog: every [`fragment`](fragments), the cross-fragment
//! [`capabilities`], and the table of kinds composed from them.
//!
//! ```text
//! unit      entity pos vel rotation health team shooter items controlled
//! building  entity pos health team items building
//! bullet    entity pos vel team timed bullet
//! player    entity player
//! effect    decal pos timed
//! ```

pub mod capabilities;
pub mod fragments;

pub use fragments::BULLET_SPEED;

use engine_compose::{ClassIdMap, CompositionError, KindRegistry};

/// Kind name and the fragments it is composed of, in declaration order.
pub const KINDS: &[(&str, &[&str])] = &[
    (
        "unit",
        &[
            "entity", "pos", "vel", "rotation", "health", "team", "shooter", "items", "controlled",
        ],
    ),
    ("building", &["entity", "pos", "health", "team", "items", "building"]),
    ("bullet", &["entity", "pos", "vel", "team", "timed", "bullet"]),
    ("player", &["entity", "player"]),
    ("effect", &["decal", "pos", "timed"]),
];

/// Build the catalog registry with fresh class ids.
///
/// # Errors
///
/// Returns the first composition failure. The built-in table composes
/// cleanly, so this only fails if the catalog itself is broken.
pub fn catalog() -> Result<KindRegistry, CompositionError> {
    catalog_with(ClassIdMap::new())
}

/// Build the catalog registry, keeping the ids already in `class_map`.
///
/// # Errors
///
/// See [`catalog`]. Also fails if `class_map` leaves no id free for a new or
/// changed kind.
pub fn catalog_with(class_map: ClassIdMap) -> Result<KindRegistry, CompositionError> {
    let mut builder = KindRegistry::builder().with_class_map(class_map);
    for fragment in fragments::all() {
        builder = builder.fragment(fragment);
    }
    for def in capabilities::definitions() {
        builder = builder.capability(def);
    }
    for (name, fragments) in KINDS {
        builder = builder.kind(*name, fragments);
    }
    builder.build()
}
