//! Checked capability views.
//!
//! A view exposes exactly the methods and fields of one capability. Building
//! one is a bitset lookup in the kind's precomputed capability set; asking for
//! a capability the kind lacks yields [`Unsupported`] rather than a view onto
//! the wrong data.

use engine_component::{CapabilityId, EntityId, FieldValue, LValue};
use engine_compose::CapabilityInfo;

use crate::error::Unsupported;
use crate::instance::EntityInstance;

fn check(instance: &EntityInstance, info: &CapabilityInfo) -> Result<(), Unsupported> {
    if instance.kind().satisfies(info.id) {
        Ok(())
    } else {
        Err(Unsupported {
            entity: instance.id(),
            capability: info.id,
        })
    }
}

/// Read access to an entity through one capability.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityView<'a> {
    instance: &'a EntityInstance,
    info: &'a CapabilityInfo,
}

impl<'a> CapabilityView<'a> {
    /// Build a view if the entity's kind satisfies the capability.
    ///
    /// # Errors
    ///
    /// Returns [`Unsupported`] otherwise.
    pub fn new(instance: &'a EntityInstance, info: &'a CapabilityInfo) -> Result<Self, Unsupported> {
        check(instance, info)?;
        Ok(Self { instance, info })
    }

    /// The viewed entity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.instance.id()
    }

    /// The capability this view exposes.
    #[must_use]
    pub fn capability(&self) -> CapabilityId {
        self.info.id
    }

    /// Name of the entity's kind.
    #[must_use]
    pub fn kind_name(&self) -> &str {
        &self.instance.kind().name
    }

    /// A field of the capability. `None` for fields outside it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a FieldValue> {
        if self.info.def.fields.iter().any(|f| *f == name) {
            self.instance.get(name)
        } else {
            None
        }
    }
}

/// Write access to an entity through one capability.
#[derive(Debug)]
pub struct CapabilityViewMut<'a> {
    instance: &'a mut EntityInstance,
    info: &'a CapabilityInfo,
}

impl<'a> CapabilityViewMut<'a> {
    /// Build a view if the entity's kind satisfies the capability.
    ///
    /// # Errors
    ///
    /// Returns [`Unsupported`] otherwise.
    pub fn new(instance: &'a mut EntityInstance, info: &'a CapabilityInfo) -> Result<Self, Unsupported> {
        check(instance, info)?;
        Ok(Self { instance, info })
    }

    /// The viewed entity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.instance.id()
    }

    /// The capability this view exposes.
    #[must_use]
    pub fn capability(&self) -> CapabilityId {
        self.info.id
    }

    /// A field of the capability. `None` for fields outside it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        if self.info.def.fields.iter().any(|f| *f == name) {
            self.instance.get(name)
        } else {
            None
        }
    }

    /// Overwrite a field of the capability. Returns `false` for fields outside
    /// it and for type mismatches.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> bool {
        self.info.def.fields.iter().any(|f| *f == name) && self.instance.set(name, value)
    }

    /// Invoke a method of the capability. `None` for methods outside it.
    pub fn call(&mut self, method: &str, args: &[LValue]) -> Option<LValue> {
        if self.info.def.methods.iter().any(|m| *m == method) {
            self.instance.call(method, args)
        } else {
            None
        }
    }
}
