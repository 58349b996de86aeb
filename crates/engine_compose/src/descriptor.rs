//! The frozen product of composing one entity kind.

use std::collections::BTreeMap;

use engine_component::{
    AfterReadFn, CapabilityId, CapabilitySet, ControlFn, FieldLayout, FieldSlot, FieldValue, Hook,
    LAccess, LifecycleFn, MethodFn, ReadFn, SenseFn, WriteFn,
};

use crate::class_map::ClassId;

/// The linearized implementations of one hook, in invocation order.
pub struct HookChain<F> {
    entries: Vec<(&'static str, F)>,
}

impl<F> HookChain<F> {
    pub(crate) fn new(entries: Vec<(&'static str, F)>) -> Self {
        Self { entries }
    }

    /// Implementations in invocation order.
    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.entries.iter().map(|(_, f)| f)
    }

    /// Fragment names in invocation order.
    pub fn fragments(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Number of implementations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no fragment implements the hook.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F> Default for HookChain<F> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<F> std::fmt::Debug for HookChain<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.fragments()).finish()
    }
}

/// A resolved entity kind.
///
/// Produced once per kind before simulation starts and shared behind an
/// `Arc`; nothing about it changes afterwards. The class id and capability
/// set are filled in by the registry; a descriptor obtained directly from
/// [`resolve`](crate::resolve) carries class id 0 and no capabilities.
pub struct KindDescriptor {
    /// Kind name.
    pub name: String,
    /// Wire identifier.
    pub class_id: ClassId,
    /// Fragment names in declaration order.
    pub fragments: Vec<&'static str>,
    /// Merged field table.
    pub layout: FieldLayout,
    /// `update` chain.
    pub update: HookChain<LifecycleFn>,
    /// `add` chain.
    pub add: HookChain<LifecycleFn>,
    /// `remove` chain.
    pub remove: HookChain<LifecycleFn>,
    /// `write` chain.
    pub write: HookChain<WriteFn>,
    /// `read` chain.
    pub read: HookChain<ReadFn>,
    /// `after_read` chain, invoked once after the whole `read` chain.
    pub after_read: HookChain<AfterReadFn>,
    /// Capability methods by name.
    pub methods: BTreeMap<&'static str, MethodFn>,
    /// Sense handlers.
    pub senses: BTreeMap<LAccess, SenseFn>,
    /// Control handlers.
    pub controls: BTreeMap<LAccess, ControlFn>,
    /// Capabilities the kind satisfies.
    pub capabilities: CapabilitySet,
    /// Answer of the `serialize` contract.
    pub serialize: bool,
    /// FNV-1a over the kind name and its ordered field table.
    pub fingerprint: u64,
    /// Slot of the `controller` entity field, if the kind has one.
    pub controller_slot: Option<FieldSlot>,
}

impl KindDescriptor {
    /// Fragment names implementing `hook`, in invocation order.
    #[must_use]
    pub fn hook_order(&self, hook: Hook) -> Vec<&'static str> {
        match hook {
            Hook::Update => self.update.fragments().collect(),
            Hook::Add => self.add.fragments().collect(),
            Hook::Remove => self.remove.fragments().collect(),
            Hook::Write => self.write.fragments().collect(),
            Hook::Read => self.read.fragments().collect(),
            Hook::AfterRead => self.after_read.fragments().collect(),
        }
    }

    /// Default values for a fresh instance.
    #[must_use]
    pub fn defaults(&self) -> Vec<FieldValue> {
        self.layout.defaults()
    }

    /// Capability membership test.
    #[must_use]
    pub fn satisfies(&self, capability: CapabilityId) -> bool {
        self.capabilities.contains(capability)
    }

    /// Whether the kind has a method.
    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Whether the kind has a field.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.layout.slot(name).is_some()
    }
}

impl std::fmt::Debug for KindDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindDescriptor")
            .field("name", &self.name)
            .field("class_id", &self.class_id)
            .field("fragments", &self.fragments)
            .field("layout", &self.layout)
            .field("update", &self.update)
            .field("add", &self.add)
            .field("remove", &self.remove)
            .field("write", &self.write)
            .field("read", &self.read)
            .field("after_read", &self.after_read)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("senses", &self.senses.keys().collect::<Vec<_>>())
            .field("controls", &self.controls.keys().collect::<Vec<_>>())
            .field("capabilities", &self.capabilities)
            .field("serialize", &self.serialize)
            .field("fingerprint", &format_args!("{:#018x}", self.fingerprint))
            .finish_non_exhaustive()
    }
}
