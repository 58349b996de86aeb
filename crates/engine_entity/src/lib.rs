//! # engine_entity
//!
//! The runtime side of entity composition.
//!
//! - [`EntityInstance`]: an id, a frozen kind descriptor and merged field
//!   values.
//! - [`EntityGroups`]: hands out ids, keeps one group per capability and
//!   drives the add/update/remove lifecycle.
//! - [`CapabilityView`] / [`CapabilityViewMut`]: checked access to an entity
//!   through one capability.
//! - [`LocalActor`]: the "is this the local player's entity?" check.
//! - [`sense`]: sense/control dispatch for the logic layer.
//! - [`remote_channel`]: hand-off of group mutations from a network context.
//! - [`TickLoop`]: fixed-timestep loop applying remote operations between
//!   ticks.

pub mod error;
pub mod groups;
pub mod inbox;
pub mod instance;
pub mod local;
pub mod sense;
pub mod tick;
pub mod view;

#[cfg(test)]
mod testkit;

pub use error::{CapabilityError, InsertError, InvalidTickRate, Unsupported};
pub use groups::EntityGroups;
pub use inbox::{InboxClosed, RemoteInbox, RemoteOp, RemoteSender, remote_channel};
pub use instance::{EntityInstance, EntityState};
pub use local::LocalActor;
pub use tick::{TickConfig, TickLoop};
pub use view::{CapabilityView, CapabilityViewMut};
