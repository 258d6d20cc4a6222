//! # Tidebreak Common
//!
//! Common types and utilities shared by the Tidebreak crates:
//! - ID types (EntityId, PrefabId, IslandId)
//! - Physics layers and layer masks
//! - Seeded random helpers
//! - Common error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod layers;
pub mod random;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::layers::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
        assert!(!EntityId::NULL.is_valid());
    }

    #[test]
    fn test_config_error_wraps() {
        let err: TidebreakError = ConfigError::Parse("expected a table".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Config error: Failed to parse config: expected a table"
        );
    }
}
