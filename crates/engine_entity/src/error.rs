//! Entity runtime errors.

use engine_component::{CapabilityId, EntityId};

/// Errors raised when creating or inserting an entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InsertError {
    /// No kind with this name is registered.
    #[error("unknown kind `{0}`")]
    UnknownKind(String),

    /// An entity with this id is already known.
    #[error("{0} already exists")]
    DuplicateId(EntityId),

    /// The instance was built from a descriptor that is not part of this
    /// registry.
    #[error("kind `{0}` does not belong to this registry")]
    ForeignKind(String),

    /// Only detached instances can be inserted.
    #[error("{0} is not detached")]
    NotDetached(EntityId),
}

/// The entity's kind does not satisfy the requested capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{entity} does not support capability {}", capability.0)]
pub struct Unsupported {
    /// The queried entity.
    pub entity: EntityId,
    /// The requested capability.
    pub capability: CapabilityId,
}

/// A tick rate that does not describe a positive, representable tick length.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("tick rate must be a positive finite number, got {0}")]
pub struct InvalidTickRate(pub f64);

/// Errors raised by capability lookups through the group manager.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// No entity with this id is known.
    #[error("no such entity: {0}")]
    NoSuchEntity(EntityId),

    /// The capability is not registered.
    #[error("unknown capability `{0}`")]
    UnknownCapability(String),

    /// The entity exists but its kind lacks the capability.
    #[error(transparent)]
    Unsupported(#[from] Unsupported),
}
