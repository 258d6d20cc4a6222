//! Interfaces to the systems gameplay code drives but does not own.
//!
//! Physics queries, the scene host, level flow, HUD, audio and animation all
//! live outside this crate. Gameplay systems receive them as trait objects at
//! call time and never look them up on their own.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tidebreak_common::{EntityId, IslandId, Layer, LayerMask, PrefabId};

use crate::weapon::WeaponId;

/// Result of a downward terrain probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space hit point.
    pub point: Vec3,
    /// Layer of the collider that was hit.
    pub layer: Layer,
    /// Entity owning the collider, if any.
    pub entity: Option<EntityId>,
}

/// A collider found by a volume query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    /// Entity owning the collider.
    pub entity: EntityId,
    /// Layer of the collider.
    pub layer: Layer,
}

/// Collision and terrain queries.
///
/// This trait abstracts the physics scene. Results are trusted as-is.
pub trait TerrainQuery {
    /// Casts a ray straight down from `origin`, returning the nearest hit
    /// within `max_distance` on a layer in `mask`.
    fn raycast_down(&self, origin: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit>;

    /// Returns every collider on a layer in `mask` overlapping the sphere.
    /// The order is the query's own and callers may rely on it.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<Overlap>;
}

/// Receives damage dealt by gameplay systems.
pub trait DamageSink {
    /// Applies `amount` damage to `entity`.
    fn apply_damage(&mut self, entity: EntityId, amount: i32);
}

/// Position and velocity of a tracked target.
pub trait KinematicsSource {
    /// Current world position.
    fn position(&self) -> Vec3;
    /// Current velocity in units per second.
    fn velocity(&self) -> Vec3;
}

/// Scene host that creates and removes entities.
pub trait EntityHost {
    /// Instantiates `prefab` and returns its handle.
    fn instantiate(
        &mut self,
        prefab: PrefabId,
        position: Vec3,
        rotation: Quat,
        parent: Option<EntityId>,
    ) -> EntityId;

    /// Destroys an entity immediately.
    fn destroy(&mut self, entity: EntityId);

    /// Destroys an entity after `delay` seconds.
    fn destroy_after(&mut self, entity: EntityId, delay: f32);

    /// Shows or hides the entity's mesh and collider together.
    fn set_presence(&mut self, entity: EntityId, present: bool);

    /// Starts the entity's attached impact effect.
    fn activate_effect(&mut self, entity: EntityId);
}

/// Level progression and HUD notifications.
pub trait LevelHooks {
    /// Marks the current island's dock as cleared.
    fn mark_island_cleared(&mut self);
    /// Moves the level manager past `island`.
    fn advance_level(&mut self, island: IslandId);
    /// Shows a message that hides itself after a while.
    fn show_timed_message(&mut self, text: &str);
    /// Points the compass at the boat (`true`) or at the next island.
    fn retarget_navigation(&mut self, toward_boat: bool);
    /// Shows or hides the remaining-emitters counter.
    fn set_spawn_counter_visible(&mut self, visible: bool);
    /// Updates the remaining-emitters counter.
    fn set_spawn_counter_text(&mut self, remaining: i32);
}

/// Sound cues triggered by gameplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Gun reload / draw.
    Reload,
}

/// HUD weapon icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponIcon {
    /// Pair of flintlock pistols.
    Pistols,
    /// Blunderbuss.
    Blunderbuss,
}

/// Animation, audio and HUD side effects of the weapon controller.
pub trait Presentation {
    /// Plays the draw animation on the given weapon.
    fn trigger_draw_animation(&mut self, weapon: WeaponId);
    /// Plays a one-shot sound effect.
    fn play_sfx(&mut self, cue: SoundCue);
    /// Changes the HUD weapon icon.
    fn swap_weapon_icon(&mut self, icon: WeaponIcon);
}

/// Per-weapon fire action (muzzle flash, hitscan, recoil).
pub trait WeaponActions {
    /// Fires the given weapon once.
    fn fire(&mut self, weapon: WeaponId);
}
