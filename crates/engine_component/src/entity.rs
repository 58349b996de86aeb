//! Entity identifiers and the process-wide identifier allocator.
//!
//! An [`EntityId`] is a lightweight `u64` handle. Identifiers are handed out by
//! an [`IdAllocator`] exactly once per constructed entity and are never reused
//! for the lifetime of the allocator, even when the entity is discarded without
//! ever joining a group.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// A unique entity identifier.
///
/// Identifiers ascend in allocation order, so comparing two ids also compares
/// their creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The null / invalid entity sentinel. Entity-typed fields default to it.
    pub const INVALID: EntityId = EntityId(0);

    /// Create an entity id from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is a valid (non-zero) entity id.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Allocates monotonically increasing entity ids.
///
/// The allocator is a single atomic counter, independent of any simulation
/// state, so it can be shared through an `Arc` between the simulation thread
/// and a network-receive context without a lock.
#[derive(Debug)]
pub struct IdAllocator {
    next_id: AtomicU64,
}

impl IdAllocator {
    /// Creates a new allocator. Ids start at 1 (0 is reserved for [`EntityId::INVALID`]).
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocates a fresh entity id.
    ///
    /// # Panics
    ///
    /// Panics when the 64-bit counter is exhausted, which cannot happen within
    /// a realistic process lifetime.
    pub fn allocate(&self) -> EntityId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        assert!(id != u64::MAX, "entity id space exhausted");
        EntityId(id)
    }

    /// Returns the number of ids allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed) - 1
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
