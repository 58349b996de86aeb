//! The composition resolver: turns a kind name and an ordered fragment list
//! into a [`KindDescriptor`].
//!
//! ## Hook linearization
//!
//! For each hook, every fragment's implementations are collected and sorted by
//! `(late, descending priority, fragment position)`. The sort is stable, so
//! implementations from one fragment keep their declaration order. A terminal
//! implementation replaces the whole chain; two terminals on one hook are an
//! error.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use engine_component::{
    AfterReadFn, Contract, FieldLayout, FieldType, Fnv1a, Fragment, Hook, HookBody, HookImpl,
    LifecycleFn, Provision, ReadFn, WriteFn,
};
use tracing::debug;

use crate::class_map::ClassId;
use crate::descriptor::{HookChain, KindDescriptor};
use crate::error::CompositionError;

/// Name of the entity field consulted by the local-actor check.
pub const CONTROLLER_FIELD: &str = "controller";

/// Resolve one kind.
///
/// # Errors
///
/// Returns the first [`CompositionError`] found. Any error leaves the kind
/// unusable.
pub fn resolve(kind: &str, fragments: &[Arc<Fragment>]) -> Result<KindDescriptor, CompositionError> {
    if fragments.is_empty() {
        return Err(CompositionError::EmptyKind {
            kind: kind.to_string(),
        });
    }
    let mut seen = HashSet::new();
    for fragment in fragments {
        if !seen.insert(fragment.name) {
            return Err(CompositionError::RepeatedFragment {
                kind: kind.to_string(),
                fragment: fragment.name,
            });
        }
    }

    let layout = merge_fields(kind, fragments)?;
    check_imports(kind, fragments, &layout)?;

    let update = chain(kind, fragments, Hook::Update, lifecycle_body)?;
    let add = chain(kind, fragments, Hook::Add, lifecycle_body)?;
    let remove = chain(kind, fragments, Hook::Remove, lifecycle_body)?;
    let write = chain(kind, fragments, Hook::Write, write_body)?;
    let read = chain(kind, fragments, Hook::Read, read_body)?;
    let after_read = chain(kind, fragments, Hook::AfterRead, after_read_body)?;

    let serialize = resolve_contracts(kind, fragments)?;

    let mut methods = BTreeMap::new();
    let mut method_owner: HashMap<&'static str, &'static str> = HashMap::new();
    let mut senses = BTreeMap::new();
    let mut sense_owner = HashMap::new();
    let mut controls = BTreeMap::new();
    let mut control_owner = HashMap::new();

    for fragment in fragments {
        for (name, method) in &fragment.methods {
            if let Some(first) = method_owner.insert(*name, fragment.name) {
                return Err(CompositionError::DuplicateMethod {
                    kind: kind.to_string(),
                    method: *name,
                    first,
                    second: fragment.name,
                });
            }
            methods.insert(*name, Arc::clone(method));
        }
        for (access, sense) in &fragment.senses {
            if !access.is_senseable() {
                return Err(CompositionError::NotSenseable {
                    kind: kind.to_string(),
                    fragment: fragment.name,
                    access: *access,
                });
            }
            if let Some(first) = sense_owner.insert(*access, fragment.name) {
                return Err(CompositionError::DuplicateSense {
                    kind: kind.to_string(),
                    access: *access,
                    first,
                    second: fragment.name,
                });
            }
            senses.insert(*access, Arc::clone(sense));
        }
        for (access, control) in &fragment.controls {
            if !access.is_control() {
                return Err(CompositionError::NotControllable {
                    kind: kind.to_string(),
                    fragment: fragment.name,
                    access: *access,
                });
            }
            if let Some(first) = control_owner.insert(*access, fragment.name) {
                return Err(CompositionError::DuplicateControl {
                    kind: kind.to_string(),
                    access: *access,
                    first,
                    second: fragment.name,
                });
            }
            controls.insert(*access, Arc::clone(control));
        }
    }

    let fingerprint = fingerprint(kind, &layout);
    let controller_slot = layout
        .slot(CONTROLLER_FIELD)
        .filter(|&slot| layout.def(slot).is_some_and(|d| d.ty == FieldType::Entity));

    debug!(
        kind,
        fields = layout.len(),
        methods = methods.len(),
        serialize,
        fingerprint,
        "resolved kind"
    );

    Ok(KindDescriptor {
        name: kind.to_string(),
        class_id: ClassId(0),
        fragments: fragments.iter().map(|f| f.name).collect(),
        layout,
        update,
        add,
        remove,
        write,
        read,
        after_read,
        methods,
        senses,
        controls,
        capabilities: engine_component::CapabilitySet::new(),
        serialize,
        fingerprint,
        controller_slot,
    })
}

/// FNV-1a over the kind name and the ordered `(field name, field type)` table.
#[must_use]
pub fn fingerprint(kind: &str, layout: &FieldLayout) -> u64 {
    layout
        .iter()
        .fold(Fnv1a::new().write_str(kind), |hash, def| {
            hash.write_str(def.name).write_str(def.ty.name())
        })
        .finish()
}

fn merge_fields(kind: &str, fragments: &[Arc<Fragment>]) -> Result<FieldLayout, CompositionError> {
    let mut layout = FieldLayout::new();
    let mut owner: HashMap<&'static str, &'static str> = HashMap::new();

    for fragment in fragments {
        for def in &fragment.fields {
            if let Some(existing) = layout.get(def.name) {
                let first_fragment = owner.get(def.name).copied().unwrap_or_default();
                if existing.ty != def.ty {
                    return Err(CompositionError::FieldTypeConflict {
                        kind: kind.to_string(),
                        field: def.name,
                        first: existing.ty,
                        first_fragment,
                        second: def.ty,
                        second_fragment: fragment.name,
                    });
                }
                if !(existing.shared && def.shared) {
                    return Err(CompositionError::DuplicateField {
                        kind: kind.to_string(),
                        field: def.name,
                        first_fragment,
                        second_fragment: fragment.name,
                    });
                }
                // Shared: the first declaration's slot and default win.
                continue;
            }
            owner.insert(def.name, fragment.name);
            layout.push(def.clone());
        }
    }
    Ok(layout)
}

fn check_imports(
    kind: &str,
    fragments: &[Arc<Fragment>],
    layout: &FieldLayout,
) -> Result<(), CompositionError> {
    for fragment in fragments {
        for &(field, expected) in &fragment.imports {
            match layout.get(field) {
                None => {
                    return Err(CompositionError::MissingImport {
                        kind: kind.to_string(),
                        fragment: fragment.name,
                        field,
                    });
                }
                Some(def) if def.ty != expected => {
                    return Err(CompositionError::ImportTypeMismatch {
                        kind: kind.to_string(),
                        fragment: fragment.name,
                        field,
                        expected,
                        found: def.ty,
                    });
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

fn linearize<'a>(
    kind: &str,
    fragments: &'a [Arc<Fragment>],
    hook: Hook,
) -> Result<Vec<(&'static str, &'a HookImpl)>, CompositionError> {
    let mut ranked: Vec<(usize, &'static str, &'a HookImpl)> = fragments
        .iter()
        .enumerate()
        .flat_map(|(position, fragment)| {
            fragment
                .hooks
                .iter()
                .filter(move |imp| imp.hook == hook)
                .map(move |imp| (position, fragment.name, imp))
        })
        .collect();

    let mut terminals = ranked.iter().filter(|(_, _, imp)| imp.terminal);
    if let Some(&(_, first, imp)) = terminals.next() {
        if let Some(&(_, second, _)) = terminals.next() {
            return Err(CompositionError::DuplicateTerminal {
                kind: kind.to_string(),
                hook,
                first,
                second,
            });
        }
        return Ok(vec![(first, imp)]);
    }

    ranked.sort_by_key(|&(position, _, imp)| (imp.late, Reverse(imp.priority), position));
    Ok(ranked.into_iter().map(|(_, name, imp)| (name, imp)).collect())
}

fn chain<F>(
    kind: &str,
    fragments: &[Arc<Fragment>],
    hook: Hook,
    extract: fn(&HookBody) -> Option<F>,
) -> Result<HookChain<F>, CompositionError> {
    linearize(kind, fragments, hook)?
        .into_iter()
        .map(|(fragment, imp)| {
            extract(&imp.body)
                .map(|f| (fragment, f))
                .ok_or_else(|| CompositionError::HookBodyMismatch {
                    kind: kind.to_string(),
                    fragment,
                    hook,
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(HookChain::new)
}

fn lifecycle_body(body: &HookBody) -> Option<LifecycleFn> {
    match body {
        HookBody::Lifecycle(f) => Some(Arc::clone(f)),
        _ => None,
    }
}

fn write_body(body: &HookBody) -> Option<WriteFn> {
    match body {
        HookBody::Write(f) => Some(Arc::clone(f)),
        _ => None,
    }
}

fn read_body(body: &HookBody) -> Option<ReadFn> {
    match body {
        HookBody::Read(f) => Some(Arc::clone(f)),
        _ => None,
    }
}

fn after_read_body(body: &HookBody) -> Option<AfterReadFn> {
    match body {
        HookBody::AfterRead(f) => Some(Arc::clone(f)),
        _ => None,
    }
}

/// Check that every contract has exactly one provider and return the answer
/// of the `serialize` contract.
fn resolve_contracts(kind: &str, fragments: &[Arc<Fragment>]) -> Result<bool, CompositionError> {
    let mut serialize = false;
    for contract in Contract::ALL {
        let providers: Vec<(&'static str, Provision)> = fragments
            .iter()
            .flat_map(|fragment| {
                fragment
                    .provides
                    .iter()
                    .filter(move |p| p.contract() == contract)
                    .map(move |p| (fragment.name, *p))
            })
            .collect();

        match providers.as_slice() {
            [] => {
                return Err(CompositionError::MissingProvider {
                    kind: kind.to_string(),
                    contract,
                });
            }
            [(_, provision)] => {
                if let Provision::Serialize(answer) = provision {
                    serialize = *answer;
                }
            }
            [(first, _), (second, _), ..] => {
                return Err(CompositionError::DuplicateProvider {
                    kind: kind.to_string(),
                    contract,
                    first: *first,
                    second: *second,
                });
            }
        }
    }
    Ok(serialize)
}
