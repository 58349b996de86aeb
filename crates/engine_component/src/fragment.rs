//! Component fragments: the independently authored units entity kinds are
//! composed from.
//!
//! ## Identity
//!
//! [`FragmentId`] is derived from the fragment's **string name** using the
//! FNV-1a 64-bit hash algorithm. It is deterministic across processes and
//! builds, which lets kind fingerprints and diagnostics refer to fragments
//! without relying on registration order.

use std::sync::Arc;

use crate::access::{LAccess, LValue};
use crate::field::{FieldAccess, FieldDef, FieldType, Fields, FieldsMut};
use crate::hook::HookImpl;

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Incremental FNV-1a 64-bit hasher.
///
/// ```text
/// hash = 0xcbf29ce484222325
/// for each byte:
///     hash = hash XOR byte
///     hash = hash * 0x00000100000001b3
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a(u64);

impl Fnv1a {
    /// Start from the offset basis.
    #[must_use]
    pub const fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    /// Feed bytes.
    #[must_use]
    pub const fn write(mut self, bytes: &[u8]) -> Self {
        let mut i = 0;
        while i < bytes.len() {
            self.0 ^= bytes[i] as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        self
    }

    /// Feed a string followed by a separator byte so that adjacent strings
    /// cannot alias (`"ab" + "c"` vs `"a" + "bc"`).
    #[must_use]
    pub const fn write_str(self, s: &str) -> Self {
        self.write(s.as_bytes()).write(&[0xff])
    }

    /// The current hash.
    #[must_use]
    pub const fn finish(self) -> u64 {
        self.0
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

/// A unique identifier for a fragment, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(pub u64);

impl FragmentId {
    /// Compute the id from a fragment name.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(Fnv1a::new().write(name.as_bytes()).finish())
    }
}

/// Hooks that exactly one fragment of every kind must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Contract {
    /// Owner of the kind's class id.
    ClassId,
    /// Decides whether the kind is written to entity streams.
    Serialize,
}

impl Contract {
    /// Every contract.
    pub const ALL: [Contract; 2] = [Contract::ClassId, Contract::Serialize];

    /// Contract name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Contract::ClassId => "class_id",
            Contract::Serialize => "serialize",
        }
    }
}

impl std::fmt::Display for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A contract implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provision {
    /// Provides [`Contract::ClassId`].
    ClassId,
    /// Provides [`Contract::Serialize`] with the given answer.
    Serialize(bool),
}

impl Provision {
    /// The contract this provision satisfies.
    #[must_use]
    pub const fn contract(self) -> Contract {
        match self {
            Provision::ClassId => Contract::ClassId,
            Provision::Serialize(_) => Contract::Serialize,
        }
    }
}

/// A capability method: mutable fields plus arguments in, a value out.
pub type MethodFn = Arc<dyn Fn(&mut FieldsMut<'_>, &[LValue]) -> LValue + Send + Sync>;

/// Handler for a sense operation.
pub type SenseFn = Arc<dyn Fn(&Fields<'_>) -> LValue + Send + Sync>;

/// Handler for a control operation.
pub type ControlFn = Arc<dyn Fn(&mut FieldsMut<'_>, &[LValue]) + Send + Sync>;

/// A declared component fragment. Immutable once built.
pub struct Fragment {
    /// Fragment name.
    pub name: &'static str,
    /// Name-derived id.
    pub id: FragmentId,
    /// Fields owned by this fragment.
    pub fields: Vec<FieldDef>,
    /// Fields this fragment uses but another fragment owns.
    pub imports: Vec<(&'static str, FieldType)>,
    /// Hook implementations.
    pub hooks: Vec<HookImpl>,
    /// Capability methods.
    pub methods: Vec<(&'static str, MethodFn)>,
    /// Sense handlers.
    pub senses: Vec<(LAccess, SenseFn)>,
    /// Control handlers.
    pub controls: Vec<(LAccess, ControlFn)>,
    /// Contract implementations.
    pub provides: Vec<Provision>,
}

impl Fragment {
    /// Start declaring a fragment.
    #[must_use]
    pub fn builder(name: &'static str) -> FragmentBuilder {
        FragmentBuilder::new(name)
    }

    /// Names of the methods this fragment contributes.
    pub fn method_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.methods.iter().map(|(name, _)| *name)
    }

    /// Names of the fields this fragment owns.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

impl std::fmt::Debug for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fragment")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("imports", &self.imports)
            .field("hooks", &self.hooks)
            .field("methods", &self.method_names().collect::<Vec<_>>())
            .field("senses", &self.senses.iter().map(|(a, _)| *a).collect::<Vec<_>>())
            .field("controls", &self.controls.iter().map(|(a, _)| *a).collect::<Vec<_>>())
            .field("provides", &self.provides)
            .finish()
    }
}

/// Builder for [`Fragment`].
#[derive(Debug)]
pub struct FragmentBuilder {
    fragment: Fragment,
    sync: bool,
}

impl FragmentBuilder {
    fn new(name: &'static str) -> Self {
        Self {
            fragment: Fragment {
                name,
                id: FragmentId::from_name(name),
                fields: Vec::new(),
                imports: Vec::new(),
                hooks: Vec::new(),
                methods: Vec::new(),
                senses: Vec::new(),
                controls: Vec::new(),
                provides: Vec::new(),
            },
            sync: false,
        }
    }

    /// Declare an owned field.
    #[must_use]
    pub fn field(mut self, def: FieldDef) -> Self {
        self.fragment.fields.push(def);
        self
    }

    /// Declare a field owned by another fragment of the same kind.
    #[must_use]
    pub fn import(mut self, name: &'static str, ty: FieldType) -> Self {
        self.fragment.imports.push((name, ty));
        self
    }

    /// Add a hook implementation.
    #[must_use]
    pub fn hook(mut self, hook: HookImpl) -> Self {
        self.fragment.hooks.push(hook);
        self
    }

    /// Add a capability method.
    #[must_use]
    pub fn method(
        mut self,
        name: &'static str,
        f: impl Fn(&mut FieldsMut<'_>, &[LValue]) -> LValue + Send + Sync + 'static,
    ) -> Self {
        self.fragment.methods.push((name, Arc::new(f)));
        self
    }

    /// Service a sense operation.
    #[must_use]
    pub fn sense(
        mut self,
        access: LAccess,
        f: impl Fn(&Fields<'_>) -> LValue + Send + Sync + 'static,
    ) -> Self {
        self.fragment.senses.push((access, Arc::new(f)));
        self
    }

    /// Service a control operation.
    #[must_use]
    pub fn control(
        mut self,
        access: LAccess,
        f: impl Fn(&mut FieldsMut<'_>, &[LValue]) + Send + Sync + 'static,
    ) -> Self {
        self.fragment.controls.push((access, Arc::new(f)));
        self
    }

    /// Provide the class-id contract.
    #[must_use]
    pub fn provides_class_id(mut self) -> Self {
        self.fragment.provides.push(Provision::ClassId);
        self
    }

    /// Provide the serialize contract.
    #[must_use]
    pub fn provides_serialize(mut self, serialize: bool) -> Self {
        self.fragment.provides.push(Provision::Serialize(serialize));
        self
    }

    /// Generate priority-0 `write`/`read` hooks that encode every
    /// non-transient owned field in declaration order.
    #[must_use]
    pub fn sync(mut self) -> Self {
        self.sync = true;
        self
    }

    /// Finish the declaration.
    #[must_use]
    pub fn build(mut self) -> Fragment {
        if self.sync {
            let synced: Arc<[(&'static str, FieldType)]> = self
                .fragment
                .fields
                .iter()
                .filter(|f| !f.transient)
                .map(|f| (f.name, f.ty))
                .collect();

            let write_fields = Arc::clone(&synced);
            self.fragment.hooks.push(HookImpl::write(move |fields, w| {
                for (name, ty) in write_fields.iter() {
                    match fields.get(name) {
                        Some(value) => w.value(value),
                        None => w.value(&ty.zero()),
                    }
                }
            }));

            self.fragment.hooks.push(HookImpl::read(move |fields, r| {
                for (name, ty) in synced.iter() {
                    let value = r.value(*ty)?;
                    fields.set(name, value);
                }
                Ok(())
            }));
        }
        self.fragment
    }
}
