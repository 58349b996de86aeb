//! The local-actor check.

use engine_component::{EntityId, FieldValue};

use crate::instance::EntityInstance;

/// The entity the local player acts through, passed explicitly wherever the
/// "is this mine?" question is asked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalActor {
    player: Option<EntityId>,
}

impl LocalActor {
    /// A context with a local player.
    #[must_use]
    pub fn new(player: EntityId) -> Self {
        Self {
            player: Some(player),
        }
    }

    /// A context without a local player, as on a dedicated server.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// The local player entity, if any.
    #[must_use]
    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// Replace the local player.
    pub fn set_player(&mut self, player: Option<EntityId>) {
        self.player = player;
    }

    /// Whether the instance is the local player or is controlled by it.
    ///
    /// Compares the id, then the kind's pre-resolved `controller` slot; no
    /// fragment is visited.
    #[must_use]
    pub fn is_local(&self, instance: &EntityInstance) -> bool {
        let Some(player) = self.player.filter(|p| p.is_valid()) else {
            return false;
        };
        instance.id() == player
            || instance
                .kind()
                .controller_slot
                .and_then(|slot| instance.value_at(slot))
                .is_some_and(|v| *v == FieldValue::Entity(player))
    }
}
