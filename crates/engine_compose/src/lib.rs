//! # engine_compose
//!
//! Build-time composition of entity kinds.
//!
//! - [`resolve`] merges an ordered fragment list into a [`KindDescriptor`]:
//!   one field table, one linearized chain per hook, the sole providers of
//!   every contract, and the methods and sense/control handlers of the kind.
//! - [`KindRegistry`] resolves every declared kind once, derives which
//!   capabilities each kind satisfies, assigns wire [`ClassId`]s through a
//!   persisted [`ClassIdMap`], and freezes the result.
//!
//! Nothing here runs after simulation start; the runtime only reads the
//! frozen registry.

pub mod class_map;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod resolver;

pub use class_map::{ClassId, ClassIdEntry, ClassIdMap, ClassMapError};
pub use descriptor::{HookChain, KindDescriptor};
pub use error::CompositionError;
pub use registry::{CapabilityInfo, KindRegistry, KindRegistryBuilder, Operations};
pub use resolver::{CONTROLLER_FIELD, fingerprint, resolve};
