//! Live entities.

use std::sync::Arc;

use engine_component::{
    Commands, EntityId, FieldSlot, FieldValue, Fields, FieldsMut, Hook, HookContext, LValue,
};
use engine_compose::{ClassId, KindDescriptor};

/// Lifecycle position of an instance.
///
/// ```text
/// Detached ──add──▶ Added ──remove──▶ Retired
/// ```
///
/// A retired instance is never added again; re-introducing an entity needs a
/// fresh instance with a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// Created but not in any group.
    Detached,
    /// Member of every group its kind qualifies for.
    Added,
    /// Removed from its groups for good.
    Retired,
}

/// An entity: an id, the descriptor of its kind and its merged field values.
#[derive(Debug, Clone)]
pub struct EntityInstance {
    id: EntityId,
    kind: Arc<KindDescriptor>,
    state: EntityState,
    values: Vec<FieldValue>,
}

impl EntityInstance {
    /// Create a detached instance holding the kind's default values.
    #[must_use]
    pub fn new(id: EntityId, kind: Arc<KindDescriptor>) -> Self {
        let values = kind.defaults();
        Self {
            id,
            kind,
            state: EntityState::Detached,
            values,
        }
    }

    /// The entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The kind descriptor.
    #[must_use]
    pub fn kind(&self) -> &Arc<KindDescriptor> {
        &self.kind
    }

    /// Shorthand for the kind's class id.
    #[must_use]
    pub fn class_id(&self) -> ClassId {
        self.kind.class_id
    }

    /// Lifecycle position.
    #[must_use]
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Whether the instance is in its groups.
    #[must_use]
    pub fn is_added(&self) -> bool {
        self.state == EntityState::Added
    }

    pub(crate) fn set_state(&mut self, state: EntityState) {
        self.state = state;
    }

    /// Raw values in slot order.
    #[must_use]
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Value at a pre-resolved slot.
    #[must_use]
    pub fn value_at(&self, slot: FieldSlot) -> Option<&FieldValue> {
        self.values.get(slot.0)
    }

    /// Value of a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.kind.layout.slot(name).and_then(|slot| self.values.get(slot.0))
    }

    /// Overwrite a field by name. Returns `false` for unknown fields and type
    /// mismatches.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> bool {
        self.fields_mut().set(name, value)
    }

    /// Read view of the fields.
    #[must_use]
    pub fn fields(&self) -> Fields<'_> {
        Fields::new(&self.kind.layout, &self.values)
    }

    /// Write view of the fields.
    pub fn fields_mut(&mut self) -> FieldsMut<'_> {
        FieldsMut::new(&self.kind.layout, &mut self.values)
    }

    /// Invoke a capability method of the kind. Returns `None` when the kind
    /// has no method of that name.
    pub fn call(&mut self, method: &str, args: &[LValue]) -> Option<LValue> {
        let f = Arc::clone(self.kind.methods.get(method)?);
        Some(f(&mut self.fields_mut(), args))
    }

    /// Run one lifecycle chain. `Write`, `Read` and `AfterRead` belong to the
    /// serializer and are ignored here.
    pub(crate) fn run_lifecycle(&mut self, hook: Hook, dt: f32, commands: &mut Commands) {
        let kind = Arc::clone(&self.kind);
        let chain = match hook {
            Hook::Update => &kind.update,
            Hook::Add => &kind.add,
            Hook::Remove => &kind.remove,
            Hook::Write | Hook::Read | Hook::AfterRead => return,
        };
        for f in chain.iter() {
            let mut ctx = HookContext {
                id: self.id,
                dt,
                fields: FieldsMut::new(&kind.layout, &mut self.values),
                commands: &mut *commands,
            };
            f(&mut ctx);
        }
    }
}
