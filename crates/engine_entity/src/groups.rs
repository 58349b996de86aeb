//! The entity group and identity manager.
//!
//! [`EntityGroups`] owns every instance of one simulation. It hands out ids,
//! keeps one group per capability, and drives the add/update/remove
//! lifecycle.
//!
//! ## Group invariant
//!
//! An instance is in the group of capability `c` iff it is added and its kind
//! satisfies `c`. All group mutation goes through `&mut self`, so no reader can
//! observe a half-applied `add` or `remove`.
//!
//! ## Update pass
//!
//! [`EntityGroups::update`] walks a snapshot of the ids that were added when
//! the pass began. Entities added during the pass are first visited in the
//! next pass; entities removed during the pass are skipped from the point of
//! removal on.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use engine_component::{
    Capability, CapabilityId, Command, Commands, EntityId, Hook, IdAllocator, LAccess, LValue,
};
use engine_compose::KindRegistry;
use tracing::{debug, warn};

use crate::error::{CapabilityError, InsertError};
use crate::inbox::RemoteOp;
use crate::instance::{EntityInstance, EntityState};
use crate::sense;
use crate::view::{CapabilityView, CapabilityViewMut};

/// Owner of every entity instance of one simulation.
#[derive(Debug)]
pub struct EntityGroups {
    registry: Arc<KindRegistry>,
    ids: Arc<IdAllocator>,
    entities: HashMap<EntityId, EntityInstance>,
    added: BTreeSet<EntityId>,
    groups: Vec<BTreeSet<EntityId>>,
}

impl EntityGroups {
    /// Create a manager with its own id allocator.
    #[must_use]
    pub fn new(registry: Arc<KindRegistry>) -> Self {
        Self::with_ids(registry, Arc::new(IdAllocator::new()))
    }

    /// Create a manager that draws ids from a shared allocator.
    #[must_use]
    pub fn with_ids(registry: Arc<KindRegistry>, ids: Arc<IdAllocator>) -> Self {
        let groups = vec![BTreeSet::new(); registry.capabilities().count()];
        Self {
            registry,
            ids,
            entities: HashMap::new(),
            added: BTreeSet::new(),
            groups,
        }
    }

    /// The registry this manager instantiates kinds from.
    #[must_use]
    pub fn registry(&self) -> &Arc<KindRegistry> {
        &self.registry
    }

    /// The id allocator.
    #[must_use]
    pub fn ids(&self) -> &Arc<IdAllocator> {
        &self.ids
    }

    /// Create a detached instance of a kind. The id is consumed even if the
    /// instance is later discarded without being added.
    ///
    /// # Errors
    ///
    /// Returns [`InsertError::UnknownKind`] if the kind is not registered.
    pub fn create(&mut self, kind: &str) -> Result<EntityId, InsertError> {
        let descriptor = self
            .registry
            .kind(kind)
            .ok_or_else(|| InsertError::UnknownKind(kind.to_string()))?;
        let id = self.ids.allocate();
        self.entities
            .insert(id, EntityInstance::new(id, Arc::clone(descriptor)));
        debug!(entity = %id, kind, "created entity");
        Ok(id)
    }

    /// Take ownership of an instance built elsewhere, such as one decoded
    /// from a stream.
    ///
    /// # Errors
    ///
    /// Fails if the id is already known, the instance is not detached, or its
    /// descriptor does not come from this manager's registry.
    pub fn insert(&mut self, instance: EntityInstance) -> Result<EntityId, InsertError> {
        let id = instance.id();
        if instance.state() != EntityState::Detached {
            return Err(InsertError::NotDetached(id));
        }
        if self.entities.contains_key(&id) {
            return Err(InsertError::DuplicateId(id));
        }
        let name = &instance.kind().name;
        match self.registry.kind(name) {
            Some(own) if Arc::ptr_eq(own, instance.kind()) => {}
            _ => return Err(InsertError::ForeignKind(name.clone())),
        }
        self.entities.insert(id, instance);
        Ok(id)
    }

    /// Add a detached instance to its groups and run its `add` chain.
    ///
    /// Returns `false` without doing anything if the instance is unknown or
    /// already added.
    pub fn add(&mut self, id: EntityId) -> bool {
        let Some(instance) = self.entities.get_mut(&id) else {
            return false;
        };
        if instance.state() != EntityState::Detached {
            return false;
        }

        instance.set_state(EntityState::Added);
        self.added.insert(id);
        for capability in instance.kind().capabilities.iter() {
            if let Some(group) = self.groups.get_mut(usize::from(capability.0)) {
                group.insert(id);
            }
        }

        let mut commands = Commands::new();
        instance.run_lifecycle(Hook::Add, 0.0, &mut commands);
        debug!(entity = %id, kind = %instance.kind().name, "added entity");
        self.apply_commands(&mut commands);
        true
    }

    /// Run the `remove` chain of an added instance, take it out of its groups
    /// and hand it back retired.
    ///
    /// Returns `None` without doing anything if the instance is unknown or not
    /// added.
    pub fn remove(&mut self, id: EntityId) -> Option<EntityInstance> {
        if !self.added.contains(&id) {
            return None;
        }
        let mut instance = self.entities.remove(&id)?;

        let mut commands = Commands::new();
        instance.run_lifecycle(Hook::Remove, 0.0, &mut commands);

        self.added.remove(&id);
        for capability in instance.kind().capabilities.iter() {
            if let Some(group) = self.groups.get_mut(usize::from(capability.0)) {
                group.remove(&id);
            }
        }
        instance.set_state(EntityState::Retired);
        debug!(entity = %id, kind = %instance.kind().name, "removed entity");

        self.apply_commands(&mut commands);
        Some(instance)
    }

    /// Drop a detached instance that was never added. Added instances must be
    /// removed first; for them this returns `None`.
    pub fn discard(&mut self, id: EntityId) -> Option<EntityInstance> {
        if self.added.contains(&id) {
            return None;
        }
        self.entities.remove(&id)
    }

    /// Look up an instance, added or detached.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntityInstance> {
        self.entities.get(&id)
    }

    /// Look up an instance for mutation.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityInstance> {
        self.entities.get_mut(&id)
    }

    /// Whether the instance is currently added.
    #[must_use]
    pub fn is_added(&self, id: EntityId) -> bool {
        self.added.contains(&id)
    }

    /// Number of added instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len()
    }

    /// Returns `true` if no instance is added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }

    /// Number of instances held, added or detached.
    #[must_use]
    pub fn held(&self) -> usize {
        self.entities.len()
    }

    /// Every added instance, in ascending id order.
    pub fn all(&self) -> impl Iterator<Item = &EntityInstance> {
        self.added.iter().filter_map(|id| self.entities.get(id))
    }

    /// Every added instance satisfying a capability, in ascending id order.
    /// Empty for unknown capabilities.
    pub fn group(&self, capability: CapabilityId) -> impl Iterator<Item = &EntityInstance> {
        self.groups
            .get(usize::from(capability.0))
            .into_iter()
            .flatten()
            .filter_map(|id| self.entities.get(id))
    }

    /// [`group`](Self::group) for a typed capability marker.
    pub fn group_of<C: Capability>(&self) -> impl Iterator<Item = &EntityInstance> {
        let id = self.registry.capability_of::<C>();
        id.into_iter().flat_map(|id| self.group(id))
    }

    /// Number of instances in a capability group.
    #[must_use]
    pub fn group_len(&self, capability: CapabilityId) -> usize {
        self.groups.get(usize::from(capability.0)).map_or(0, BTreeSet::len)
    }

    /// Whether an entity's kind satisfies a capability. `false` for unknown
    /// entities.
    #[must_use]
    pub fn supports(&self, id: EntityId, capability: CapabilityId) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|e| e.kind().satisfies(capability))
    }

    /// Checked read view of an entity through a capability.
    ///
    /// # Errors
    ///
    /// Fails for unknown entities and capabilities, and with
    /// [`CapabilityError::Unsupported`] when the kind lacks the capability.
    pub fn as_capability(
        &self,
        id: EntityId,
        capability: CapabilityId,
    ) -> Result<CapabilityView<'_>, CapabilityError> {
        let instance = self
            .entities
            .get(&id)
            .ok_or(CapabilityError::NoSuchEntity(id))?;
        let info = self
            .registry
            .capability_info(capability)
            .ok_or_else(|| CapabilityError::UnknownCapability(format!("#{}", capability.0)))?;
        Ok(CapabilityView::new(instance, info)?)
    }

    /// Checked write view of an entity through a capability.
    ///
    /// # Errors
    ///
    /// Same as [`as_capability`](Self::as_capability).
    pub fn as_capability_mut(
        &mut self,
        id: EntityId,
        capability: CapabilityId,
    ) -> Result<CapabilityViewMut<'_>, CapabilityError> {
        let instance = self
            .entities
            .get_mut(&id)
            .ok_or(CapabilityError::NoSuchEntity(id))?;
        let info = self
            .registry
            .capability_info(capability)
            .ok_or_else(|| CapabilityError::UnknownCapability(format!("#{}", capability.0)))?;
        Ok(CapabilityViewMut::new(instance, info)?)
    }

    /// [`as_capability`](Self::as_capability) for a typed capability marker.
    ///
    /// # Errors
    ///
    /// Same as [`as_capability`](Self::as_capability).
    pub fn view<C: Capability>(&self, id: EntityId) -> Result<CapabilityView<'_>, CapabilityError> {
        let capability = self
            .registry
            .capability_of::<C>()
            .ok_or_else(|| CapabilityError::UnknownCapability(C::NAME.to_string()))?;
        self.as_capability(id, capability)
    }

    /// [`as_capability_mut`](Self::as_capability_mut) for a typed capability
    /// marker.
    ///
    /// # Errors
    ///
    /// Same as [`as_capability`](Self::as_capability).
    pub fn view_mut<C: Capability>(
        &mut self,
        id: EntityId,
    ) -> Result<CapabilityViewMut<'_>, CapabilityError> {
        let capability = self
            .registry
            .capability_of::<C>()
            .ok_or_else(|| CapabilityError::UnknownCapability(C::NAME.to_string()))?;
        self.as_capability_mut(id, capability)
    }

    /// Sense an operation on an entity. Unknown entities read as
    /// [`LValue::Null`].
    #[must_use]
    pub fn sense(&self, id: EntityId, op: LAccess) -> LValue {
        self.entities
            .get(&id)
            .map_or(LValue::Null, |e| sense::sense(e, op))
    }

    /// Apply a control operation to an entity. Returns whether a handler ran.
    pub fn control(&mut self, id: EntityId, op: LAccess, args: &[LValue]) -> bool {
        self.entities
            .get_mut(&id)
            .is_some_and(|e| sense::control(e, op, args))
    }

    /// Run one simulation pass over the instances added when it starts.
    pub fn update(&mut self, dt: f32) {
        let snapshot: Vec<EntityId> = self.added.iter().copied().collect();
        let mut commands = Commands::new();
        for id in snapshot {
            if !self.added.contains(&id) {
                continue;
            }
            if let Some(instance) = self.entities.get_mut(&id) {
                instance.run_lifecycle(Hook::Update, dt, &mut commands);
            }
            self.apply_commands(&mut commands);
        }
    }

    /// Apply an operation handed over from another context.
    pub fn apply(&mut self, op: RemoteOp) {
        match op {
            RemoteOp::Spawn(instance) => match self.insert(*instance) {
                Ok(id) => {
                    self.add(id);
                }
                Err(e) => warn!(error = %e, "dropping remote entity"),
            },
            RemoteOp::Despawn(id) => {
                self.remove(id);
            }
            RemoteOp::Clear => self.clear(),
        }
    }

    /// Remove every added instance and drop every detached one.
    ///
    /// Entities spawned by remove hooks while clearing are added and then
    /// removed in turn, so the manager is empty afterwards.
    pub fn clear(&mut self) {
        while let Some(id) = self.added.iter().next().copied() {
            if self.remove(id).is_none() {
                self.added.remove(&id);
            }
        }
        self.entities.clear();
        self.added.clear();
        for group in &mut self.groups {
            group.clear();
        }
    }

    fn apply_commands(&mut self, commands: &mut Commands) {
        let queued: Vec<Command> = commands.drain().collect();
        for command in queued {
            match command {
                Command::Remove(id) => {
                    self.remove(id);
                }
                Command::Spawn { kind, fields } => match self.create(kind) {
                    Ok(id) => {
                        if let Some(instance) = self.entities.get_mut(&id) {
                            for (name, value) in fields {
                                if !instance.set(name, value) {
                                    warn!(entity = %id, kind, field = name, "ignoring spawn field");
                                }
                            }
                        }
                        self.add(id);
                    }
                    Err(e) => warn!(error = %e, "spawn command failed"),
                },
            }
        }
    }
}
