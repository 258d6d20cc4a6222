//! Physics layers and layer masks.
//!
//! Layers are small indices (0-31) attached to every collider. Queries take a
//! [`LayerMask`] and only report colliders whose layer bit is set.

use serde::{Deserialize, Serialize};

/// A single physics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layer(u8);

impl Layer {
    /// Default layer for untagged scenery.
    pub const DEFAULT: Self = Self(0);
    /// Water surface.
    pub const WATER: Self = Self(4);
    /// Player boat and avatar.
    pub const PLAYER: Self = Self(6);
    /// Walkable island ground.
    pub const GROUND: Self = Self(7);
    /// Invisible triggers (spawn volumes, docks).
    pub const TRIGGER: Self = Self(3);

    /// Creates a layer, wrapping indices above 31.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index % 32)
    }

    /// Returns the layer index.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Returns the mask containing only this layer.
    #[must_use]
    pub const fn mask(self) -> LayerMask {
        LayerMask(1 << (self.0 % 32))
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Bit set of layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(u32);

impl LayerMask {
    /// Mask matching nothing.
    pub const NONE: Self = Self(0);
    /// Mask matching every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// Builds a mask from a list of layers.
    #[must_use]
    pub fn of(layers: &[Layer]) -> Self {
        layers
            .iter()
            .fold(Self::NONE, |mask, layer| mask.with(*layer))
    }

    /// Returns this mask with `layer` added.
    #[must_use]
    pub const fn with(self, layer: Layer) -> Self {
        Self(self.0 | (1 << (layer.0 % 32)))
    }

    /// Every layer except the ones in this mask.
    #[must_use]
    pub const fn inverted(self) -> Self {
        Self(!self.0)
    }

    /// Checks whether `layer` is part of the mask.
    #[must_use]
    pub const fn contains(self, layer: Layer) -> bool {
        self.0 & (1 << (layer.0 % 32)) != 0
    }
}

impl From<Layer> for LayerMask {
    fn from(layer: Layer) -> Self {
        layer.mask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_contains() {
        let mask = LayerMask::of(&[Layer::GROUND, Layer::TRIGGER]);
        assert!(mask.contains(Layer::GROUND));
        assert!(mask.contains(Layer::TRIGGER));
        assert!(!mask.contains(Layer::PLAYER));
    }

    #[test]
    fn test_inverted_mask_excludes_ignored() {
        let ignore = Layer::WATER.mask();
        let query = ignore.inverted();
        assert!(!query.contains(Layer::WATER));
        assert!(query.contains(Layer::GROUND));
        assert!(LayerMask::NONE.inverted() == LayerMask::ALL);
    }

    #[test]
    fn test_layer_wraps() {
        assert_eq!(Layer::new(33).index(), 1);
    }
}
