//! ID types for entities, prefabs and islands.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for entity IDs.
static ENTITY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Handle to an entity owned by the scene host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new unique entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(ENTITY_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates an entity ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) entity ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies a prefab the host knows how to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefabId(u32);

impl PrefabId {
    /// Creates a prefab ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Stationary mortar emitter placed by the wave spawner.
    pub const MORTAR: Self = Self(1);

    /// Mortar shell launched by an emitter.
    pub const SHELL: Self = Self(2);
}

/// Identifies an island (one level) in the archipelago.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IslandId(u16);

impl IslandId {
    /// Creates an island ID from a raw value.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}
