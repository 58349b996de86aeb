//! Sense/control dispatch for the logic layer.
//!
//! Each kind carries a table from [`LAccess`] to the handler of the fragment
//! servicing it. Operations a kind does not service sense as zero and control
//! as a no-op.

use std::sync::Arc;

use engine_component::{LAccess, LValue};

use crate::instance::EntityInstance;

/// Read an operation. Unserviced operations read as `0`.
#[must_use]
pub fn sense(instance: &EntityInstance, op: LAccess) -> LValue {
    match instance.kind().senses.get(&op) {
        Some(f) => f(&instance.fields()),
        None => LValue::Num(0.0),
    }
}

/// Apply a control operation. Returns whether a handler ran.
pub fn control(instance: &mut EntityInstance, op: LAccess, args: &[LValue]) -> bool {
    let Some(f) = instance.kind().controls.get(&op).map(Arc::clone) else {
        return false;
    };
    f(&mut instance.fields_mut(), args);
    true
}

/// Operations the instance's kind can sense, in enumeration order.
pub fn senseable(instance: &EntityInstance) -> impl Iterator<Item = LAccess> + '_ {
    instance.kind().senses.keys().copied()
}

/// Operations the instance's kind can be controlled with, in enumeration
/// order.
pub fn controllable(instance: &EntityInstance) -> impl Iterator<Item = LAccess> + '_ {
    instance.kind().controls.keys().copied()
}
