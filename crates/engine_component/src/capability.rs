//! Capability interfaces and the per-kind capability bitset.
//!
//! A capability is a named set of methods and fields. Every fragment derives
//! one from its own methods and fields; further capabilities may span several
//! fragments. Which capabilities a composed kind satisfies is decided once, at
//! composition time, and stored as a [`CapabilitySet`].

use serde::{Deserialize, Serialize};

/// Dense capability index assigned by the kind registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CapabilityId(pub u16);

/// Compile-time handle for querying a capability by type.
///
/// ```rust
/// use engine_component::Capability;
///
/// struct Shooter;
///
/// impl Capability for Shooter {
///     const NAME: &'static str = "shooter";
/// }
/// ```
pub trait Capability {
    /// Registered capability name.
    const NAME: &'static str;
}

/// A capability interface: every listed method and field must be present on a
/// kind for it to satisfy the capability.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapabilityDef {
    /// Unique capability name.
    pub name: &'static str,
    /// Required method names.
    pub methods: Vec<&'static str>,
    /// Required field names.
    pub fields: Vec<&'static str>,
}

impl CapabilityDef {
    /// Start a capability definition.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Require a method.
    #[must_use]
    pub fn method(mut self, name: &'static str) -> Self {
        self.methods.push(name);
        self
    }

    /// Require a field.
    #[must_use]
    pub fn field(mut self, name: &'static str) -> Self {
        self.fields.push(name);
        self
    }
}

/// Growable bitset of [`CapabilityId`]s.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapabilitySet {
    words: Vec<u64>,
}

impl CapabilitySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capability.
    pub fn insert(&mut self, id: CapabilityId) {
        let (word, bit) = Self::locate(id);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= bit;
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, id: CapabilityId) -> bool {
        let (word, bit) = Self::locate(id);
        self.words.get(word).is_some_and(|w| w & bit != 0)
    }

    /// Number of capabilities in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Iterate members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..64u16)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| CapabilityId(u16::try_from(i).unwrap_or(u16::MAX) * 64 + bit))
        })
    }

    fn locate(id: CapabilityId) -> (usize, u64) {
        (usize::from(id.0 / 64), 1u64 << (id.0 % 64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_insert_contains() {
        let mut set = CapabilitySet::new();
        assert!(set.is_empty());
        set.insert(CapabilityId(3));
        set.insert(CapabilityId(130));
        assert!(set.contains(CapabilityId(3)));
        assert!(set.contains(CapabilityId(130)));
        assert!(!set.contains(CapabilityId(4)));
        assert!(!set.contains(CapabilityId(500)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_set_iter_ascending() {
        let mut set = CapabilitySet::new();
        for id in [70, 1, 64, 0] {
            set.insert(CapabilityId(id));
        }
        let ids: Vec<u16> = set.iter().map(|c| c.0).collect();
        assert_eq!(ids, vec![0, 1, 64, 70]);
    }

    #[test]
    fn test_def_builder() {
        let def = CapabilityDef::new("shooter").method("shoot").field("ammo");
        assert_eq!(def.name, "shooter");
        assert_eq!(def.methods, vec!["shoot"]);
        assert_eq!(def.fields, vec!["ammo"]);
    }
}
