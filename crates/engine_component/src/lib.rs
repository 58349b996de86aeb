//! # engine_component
//!
//! The vocabulary entity kinds are composed from: fragments, the fields they
//! declare, the hooks they implement and the contracts they provide.
//!
//! This crate provides:
//!
//! - [`Fragment`] / [`FragmentBuilder`]: an independently authored unit of
//!   fields, hooks, methods and sense/control handlers.
//! - [`FieldDef`] / [`FieldLayout`]: typed fields and the merged layout of a
//!   composed kind, viewed through [`Fields`] and [`FieldsMut`].
//! - [`HookImpl`]: one fragment's implementation of a lifecycle or
//!   serialization [`Hook`].
//! - [`CapabilityDef`] / [`CapabilitySet`]: capability interfaces and the
//!   per-kind set of capabilities a kind satisfies.
//! - [`EntityId`] / [`IdAllocator`]: unique, never reused entity ids.
//! - [`Writes`] / [`Reads`]: the byte streams `write` and `read` hooks use.
//! - [`LAccess`] / [`LValue`]: the sense/control operation table.

pub mod access;
pub mod capability;
pub mod entity;
pub mod field;
pub mod fragment;
pub mod hook;
pub mod io;

pub use access::{LAccess, LValue};
pub use capability::{Capability, CapabilityDef, CapabilityId, CapabilitySet};
pub use entity::{EntityId, IdAllocator};
pub use field::{FieldAccess, FieldDef, FieldLayout, FieldSlot, FieldType, FieldValue, Fields, FieldsMut};
pub use fragment::{
    Contract, ControlFn, Fnv1a, Fragment, FragmentBuilder, FragmentId, MethodFn, Provision, SenseFn,
};
pub use hook::{
    AfterReadFn, Command, Commands, Hook, HookBody, HookContext, HookImpl, LifecycleFn, ReadFn, WriteFn,
};
pub use io::{ReadError, Reads, Writes};
