//! Kind registry: every fragment, capability and kind of the game, resolved
//! once at startup and frozen.
//!
//! The builder collects declarations and [`KindRegistryBuilder::build`]
//! resolves every kind, derives capability bits and assigns class ids. The
//! resulting [`KindRegistry`] is immutable and is shared as an `Arc` between
//! the simulation and any network-receive context.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use engine_component::{Capability, CapabilityDef, CapabilityId, CapabilitySet, Fragment, LAccess};
use tracing::{debug, info};

use crate::class_map::{ClassId, ClassIdMap};
use crate::descriptor::KindDescriptor;
use crate::error::CompositionError;
use crate::resolver::resolve;

/// A registered capability.
#[derive(Debug, Clone)]
pub struct CapabilityInfo {
    /// Dense id.
    pub id: CapabilityId,
    /// Required methods and fields.
    pub def: CapabilityDef,
    /// The fragment this capability is derived from, if any. A derived
    /// capability is satisfied exactly by the kinds that include the fragment.
    pub fragment: Option<&'static str>,
}

/// The sense and control operations a capability can service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operations {
    /// Senseable operations.
    pub senses: BTreeSet<LAccess>,
    /// Controllable operations.
    pub controls: BTreeSet<LAccess>,
}

/// Collects declarations for a [`KindRegistry`].
#[derive(Debug, Default)]
pub struct KindRegistryBuilder {
    fragments: Vec<Arc<Fragment>>,
    capabilities: Vec<CapabilityDef>,
    kinds: Vec<(String, Vec<String>)>,
    class_map: ClassIdMap,
}

impl KindRegistryBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fragment.
    #[must_use]
    pub fn fragment(mut self, fragment: impl Into<Arc<Fragment>>) -> Self {
        self.fragments.push(fragment.into());
        self
    }

    /// Register a capability spanning any number of fragments.
    #[must_use]
    pub fn capability(mut self, def: CapabilityDef) -> Self {
        self.capabilities.push(def);
        self
    }

    /// Declare a kind composed of the named fragments, in order.
    #[must_use]
    pub fn kind(mut self, name: impl Into<String>, fragments: &[&str]) -> Self {
        self.kinds.push((
            name.into(),
            fragments.iter().map(|f| (*f).to_string()).collect(),
        ));
        self
    }

    /// Start class id assignment from a persisted map.
    #[must_use]
    pub fn with_class_map(mut self, class_map: ClassIdMap) -> Self {
        self.class_map = class_map;
        self
    }

    /// Resolve every kind and freeze the registry.
    ///
    /// # Errors
    ///
    /// Returns the first [`CompositionError`]; no registry is produced when
    /// any kind fails to resolve.
    pub fn build(self) -> Result<KindRegistry, CompositionError> {
        let Self {
            fragments,
            capabilities: explicit,
            kinds,
            mut class_map,
        } = self;

        let mut fragment_index: HashMap<&'static str, usize> = HashMap::new();
        for (i, fragment) in fragments.iter().enumerate() {
            if fragment_index.insert(fragment.name, i).is_some() {
                return Err(CompositionError::DuplicateFragment(fragment.name.to_string()));
            }
        }

        // Every fragment derives a capability named after itself, followed by
        // the explicit capabilities in registration order.
        let derived = fragments.iter().map(|f| {
            let def = CapabilityDef {
                name: f.name,
                methods: f.method_names().collect(),
                fields: f.field_names().collect(),
            };
            (def, Some(f.name))
        });
        let explicit = explicit.into_iter().map(|def| (def, None));

        let mut capabilities = Vec::new();
        let mut capability_index: HashMap<&'static str, CapabilityId> = HashMap::new();
        for (i, (def, fragment)) in derived.chain(explicit).enumerate() {
            let id = CapabilityId(
                u16::try_from(i).map_err(|_| CompositionError::TooManyCapabilities(i + 1))?,
            );
            if capability_index.insert(def.name, id).is_some() {
                return Err(CompositionError::DuplicateCapability(def.name.to_string()));
            }
            capabilities.push(CapabilityInfo { id, def, fragment });
        }

        let mut resolved: Vec<KindDescriptor> = Vec::with_capacity(kinds.len());
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (name, fragment_names) in &kinds {
            if by_name.contains_key(name) {
                return Err(CompositionError::DuplicateKind(name.clone()));
            }
            let parts = fragment_names
                .iter()
                .map(|f| {
                    fragment_index
                        .get(f.as_str())
                        .map(|&i| Arc::clone(&fragments[i]))
                        .ok_or_else(|| CompositionError::UnknownFragment {
                            kind: name.clone(),
                            fragment: f.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let mut descriptor = resolve(name, &parts)?;
            descriptor.capabilities = satisfied(&descriptor, &capabilities);
            by_name.insert(name.clone(), resolved.len());
            resolved.push(descriptor);
        }

        let ids = class_map.assign(resolved.iter().map(|k| (k.name.as_str(), k.fingerprint)))?;
        let mut by_class = HashMap::new();
        for (i, descriptor) in resolved.iter_mut().enumerate() {
            if let Some(&id) = ids.get(&descriptor.name) {
                descriptor.class_id = id;
                by_class.insert(id, i);
            }
            info!(
                kind = %descriptor.name,
                class_id = descriptor.class_id.0,
                fields = descriptor.layout.len(),
                capabilities = descriptor.capabilities.len(),
                serialize = descriptor.serialize,
                "registered kind"
            );
        }

        info!(
            kinds = resolved.len(),
            fragments = fragments.len(),
            capabilities = capabilities.len(),
            "kind registry frozen"
        );

        Ok(KindRegistry {
            kinds: resolved.into_iter().map(Arc::new).collect(),
            by_name,
            by_class,
            capabilities,
            capability_index,
            class_map,
        })
    }
}

/// Which capabilities a resolved kind satisfies.
fn satisfied(kind: &KindDescriptor, capabilities: &[CapabilityInfo]) -> CapabilitySet {
    let mut set = CapabilitySet::new();
    for info in capabilities {
        let ok = match info.fragment {
            Some(fragment) => kind.fragments.contains(&fragment),
            None => {
                info.def.methods.iter().all(|m| kind.has_method(m))
                    && info.def.fields.iter().all(|f| kind.has_field(f))
            }
        };
        if ok {
            debug!(kind = %kind.name, capability = info.def.name, "kind satisfies capability");
            set.insert(info.id);
        }
    }
    set
}

/// The frozen set of kinds and capabilities.
#[derive(Debug)]
pub struct KindRegistry {
    kinds: Vec<Arc<KindDescriptor>>,
    by_name: HashMap<String, usize>,
    by_class: HashMap<ClassId, usize>,
    capabilities: Vec<CapabilityInfo>,
    capability_index: HashMap<&'static str, CapabilityId>,
    class_map: ClassIdMap,
}

impl KindRegistry {
    /// Start declaring a registry.
    #[must_use]
    pub fn builder() -> KindRegistryBuilder {
        KindRegistryBuilder::new()
    }

    /// Look up a kind by name.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<&Arc<KindDescriptor>> {
        self.by_name.get(name).map(|&i| &self.kinds[i])
    }

    /// Look up a kind by class id.
    #[must_use]
    pub fn by_class(&self, id: ClassId) -> Option<&Arc<KindDescriptor>> {
        self.by_class.get(&id).map(|&i| &self.kinds[i])
    }

    /// Every kind, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = &Arc<KindDescriptor>> {
        self.kinds.iter()
    }

    /// Number of kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns `true` if no kind is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Look up a capability id by name.
    #[must_use]
    pub fn capability(&self, name: &str) -> Option<CapabilityId> {
        self.capability_index.get(name).copied()
    }

    /// Look up the capability registered under `C::NAME`.
    #[must_use]
    pub fn capability_of<C: Capability>(&self) -> Option<CapabilityId> {
        self.capability(C::NAME)
    }

    /// Details of a capability.
    #[must_use]
    pub fn capability_info(&self, id: CapabilityId) -> Option<&CapabilityInfo> {
        self.capabilities.get(usize::from(id.0))
    }

    /// Every capability, in id order.
    pub fn capabilities(&self) -> impl Iterator<Item = &CapabilityInfo> {
        self.capabilities.iter()
    }

    /// The sense and control operations that every kind satisfying `id` can
    /// service. Empty when no kind satisfies the capability.
    #[must_use]
    pub fn operations_for(&self, id: CapabilityId) -> Operations {
        let mut members = self.kinds.iter().filter(|k| k.satisfies(id));
        let Some(first) = members.next() else {
            return Operations::default();
        };
        let mut ops = Operations {
            senses: first.senses.keys().copied().collect(),
            controls: first.controls.keys().copied().collect(),
        };
        for kind in members {
            ops.senses.retain(|a| kind.senses.contains_key(a));
            ops.controls.retain(|a| kind.controls.contains_key(a));
        }
        ops
    }

    /// The class id assignments, including those added by this build. Persist
    /// it so ids stay stable across runs.
    #[must_use]
    pub fn class_map(&self) -> &ClassIdMap {
        &self.class_map
    }
}
