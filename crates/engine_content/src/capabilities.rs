//! Typed capability markers and the cross-fragment capabilities.
//!
//! Every fragment is a capability under its own name; the markers here only
//! give the common ones a type for typed group queries and views.

use engine_component::{Capability, CapabilityDef};

macro_rules! markers {
    ($($(#[$meta:meta])* $ty:ident = $name:literal;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
            pub struct $ty;

            impl Capability for $ty {
                const NAME: &'static str = $name;
            }
        )*
    };
}

markers! {
    /// Has a world position.
    Positioned = "pos";
    /// Moves by velocity.
    Moving = "vel";
    /// Has hit points.
    Mortal = "health";
    /// Belongs to a team.
    Teamed = "team";
    /// Fires bullets.
    Shooter = "shooter";
    /// Holds items.
    ItemHolder = "items";
    /// Can be steered by a player.
    Controllable = "controlled";
    /// Expires after a lifetime.
    Timed = "timed";
    /// A connected player.
    Player = "player";
    /// A switchable block.
    Building = "building";
    /// Something with a position and a team that can take damage.
    Targetable = "targetable";
    /// Something positioned that accepts items.
    Carrier = "carrier";
}

/// Capabilities that span several fragments.
#[must_use]
pub fn definitions() -> Vec<CapabilityDef> {
    vec![
        CapabilityDef::new(Targetable::NAME)
            .method("damage")
            .field("pos")
            .field("team"),
        CapabilityDef::new(Carrier::NAME)
            .method("accept_items")
            .field("pos"),
    ]
}
