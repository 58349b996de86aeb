//! Persisted kind-to-class-id assignments.
//!
//! A class id identifies a kind on the wire. It must stay the same for as
//! long as the kind's field table is unchanged, so assignments are persisted
//! between runs as JSON keyed by `(kind name, structural fingerprint)`.
//!
//! ## Assignment rules
//!
//! - An entry whose name and fingerprint both match keeps its id.
//! - A kind whose fingerprint changed gets a fresh id. The old entry is kept
//!   so its id is never handed out again and old streams decode as
//!   "unknown kind" instead of being misread.
//! - New kinds are assigned in sorted-name order, lowest free id first.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CompositionError;

/// Small integer identifying a kind on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u8);

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// Errors raised while loading or saving a [`ClassIdMap`].
#[derive(Debug, thiserror::Error)]
pub enum ClassMapError {
    /// Reading or writing the map file failed.
    #[error("class map I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The map file is not valid JSON for a class map.
    #[error("class map JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two entries claim the same id.
    #[error("class map assigns {0} twice")]
    DuplicateId(ClassId),
}

/// One persisted assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassIdEntry {
    /// Kind name.
    pub kind: String,
    /// Structural fingerprint of the kind's field table.
    pub fingerprint: u64,
    /// Assigned id.
    pub id: ClassId,
}

/// Every class id ever assigned, including those of retired field tables.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassIdMap {
    entries: Vec<ClassIdEntry>,
}

impl ClassIdMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a map from JSON.
    ///
    /// # Errors
    ///
    /// Fails on invalid JSON or when two entries share an id.
    pub fn from_json(json: &str) -> Result<Self, ClassMapError> {
        let map: Self = serde_json::from_str(json)?;
        let mut seen = BTreeSet::new();
        for entry in &map.entries {
            if !seen.insert(entry.id) {
                return Err(ClassMapError::DuplicateId(entry.id));
            }
        }
        Ok(map)
    }

    /// Serialise the map as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClassMapError::Json`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, ClassMapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a map from a file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ClassMapError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load a map from a file, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ClassMapError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the map to a file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ClassMapError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Every entry, in assignment order.
    #[must_use]
    pub fn entries(&self) -> &[ClassIdEntry] {
        &self.entries
    }

    /// Number of ids ever assigned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no id was ever assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The id recorded for a kind at a given fingerprint.
    #[must_use]
    pub fn get(&self, kind: &str, fingerprint: u64) -> Option<ClassId> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && e.fingerprint == fingerprint)
            .map(|e| e.id)
    }

    /// Assign ids to every `(kind, fingerprint)` pair, recording new entries.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::ClassIdsExhausted`] when all 256 ids are
    /// taken.
    pub fn assign<'a>(
        &mut self,
        kinds: impl IntoIterator<Item = (&'a str, u64)>,
    ) -> Result<BTreeMap<String, ClassId>, CompositionError> {
        let sorted: BTreeMap<&str, u64> = kinds.into_iter().collect();
        let mut used: BTreeSet<u8> = self.entries.iter().map(|e| e.id.0).collect();
        let mut assigned = BTreeMap::new();

        for (kind, fingerprint) in sorted {
            let id = match self.get(kind, fingerprint) {
                Some(id) => id,
                None => {
                    let free = (0..=u8::MAX)
                        .find(|id| !used.contains(id))
                        .ok_or_else(|| CompositionError::ClassIdsExhausted {
                            kind: kind.to_string(),
                        })?;
                    used.insert(free);
                    let id = ClassId(free);
                    self.entries.push(ClassIdEntry {
                        kind: kind.to_string(),
                        fingerprint,
                        id,
                    });
                    id
                }
            };
            assigned.insert(kind.to_string(), id);
        }
        Ok(assigned)
    }
}
