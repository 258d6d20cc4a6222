//! In-memory island for tests and headless runs.
//!
//! [`Island`] is a heightfield plus a registry of spherical entities. It
//! answers terrain queries directly and hands out [`IslandHost`] handles that
//! create, hide, damage and remove entities through interior mutability, so a
//! system can query the island and mutate it in the same call.
//!
//! The recording fakes at the bottom capture level, HUD and weapon side
//! effects for assertions.

use std::cell::RefCell;

use glam::{Quat, Vec3};
use tidebreak_common::{EntityId, IslandId, Layer, LayerMask, PrefabId};

use crate::ports::{
    DamageSink, EntityHost, KinematicsSource, LevelHooks, Overlap, Presentation, RayHit,
    SoundCue, TerrainQuery, WeaponActions, WeaponIcon,
};
use crate::weapon::WeaponId;

/// Collision radius of every sandbox entity.
pub const ENTITY_RADIUS: f32 = 0.5;

/// Ground sample: surface height and the layer of the surface.
type SurfaceFn = Box<dyn Fn(f32, f32) -> Option<(f32, Layer)>>;

/// An entity living on the island.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntity {
    /// Handle
    pub id: EntityId,
    /// Prefab it was created from (None for hand-placed actors)
    pub prefab: Option<PrefabId>,
    /// Center position
    pub position: Vec3,
    /// Orientation
    pub rotation: Quat,
    /// Collider layer
    pub layer: Layer,
    /// Parent entity
    pub parent: Option<EntityId>,
    /// Whether mesh and collider are enabled
    pub present: bool,
    /// Whether the impact effect has been started
    pub effect_active: bool,
    /// Seconds until scheduled removal
    pub destroy_in: Option<f32>,
    /// Damage taken so far
    pub damage_taken: i32,
}

#[derive(Debug, Default)]
struct SceneState {
    entities: Vec<SceneEntity>,
    prefab_layers: Vec<(PrefabId, Layer)>,
    destroyed: Vec<EntityId>,
    damage_log: Vec<(EntityId, i32)>,
    delayed_destroys: Vec<(EntityId, f32)>,
}

/// Heightfield island with an entity registry.
pub struct Island {
    surface: SurfaceFn,
    ground: EntityId,
    scene: RefCell<SceneState>,
}

impl std::fmt::Debug for Island {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Island")
            .field("ground", &self.ground)
            .field("scene", &self.scene)
            .finish_non_exhaustive()
    }
}

impl Island {
    /// Creates an island from a surface function returning height and layer.
    #[must_use]
    pub fn with_surface(surface: impl Fn(f32, f32) -> Option<(f32, Layer)> + 'static) -> Self {
        Self {
            surface: Box::new(surface),
            ground: EntityId::new(),
            scene: RefCell::new(SceneState::default()),
        }
    }

    /// Endless flat ground at `height`.
    #[must_use]
    pub fn flat(height: f32) -> Self {
        Self::with_surface(move |_, _| Some((height, Layer::GROUND)))
    }

    /// Nothing to hit anywhere.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_surface(|_, _| None)
    }

    /// Dome-shaped island centred on the origin, surrounded by water at y = 0.
    #[must_use]
    pub fn dome(radius: f32, peak: f32) -> Self {
        Self::with_surface(move |x, z| {
            let r = (x * x + z * z).sqrt();
            if r < radius {
                let falloff = 1.0 - (r / radius).powi(2);
                Some((peak * falloff, Layer::GROUND))
            } else {
                Some((0.0, Layer::WATER))
            }
        })
    }

    /// Host handle for creating and mutating entities.
    #[must_use]
    pub fn host(&self) -> IslandHost<'_> {
        IslandHost { island: self }
    }

    /// Sets the collider layer used for entities created from `prefab`.
    pub fn set_prefab_layer(&self, prefab: PrefabId, layer: Layer) {
        let mut scene = self.scene.borrow_mut();
        scene.prefab_layers.retain(|(p, _)| *p != prefab);
        scene.prefab_layers.push((prefab, layer));
    }

    /// Places a hand-made actor (boat, rock, crate).
    pub fn add_actor(&self, position: Vec3, layer: Layer) -> EntityId {
        let id = EntityId::new();
        self.scene.borrow_mut().entities.push(SceneEntity {
            id,
            prefab: None,
            position,
            rotation: Quat::IDENTITY,
            layer,
            parent: None,
            present: true,
            effect_active: false,
            destroy_in: None,
            damage_taken: 0,
        });
        id
    }

    /// Moves an entity. Returns false if it does not exist.
    pub fn move_entity(&self, entity: EntityId, position: Vec3) -> bool {
        let mut scene = self.scene.borrow_mut();
        match scene.entities.iter_mut().find(|e| e.id == entity) {
            Some(e) => {
                e.position = position;
                true
            },
            None => false,
        }
    }

    /// Advances delayed removals by `dt` seconds.
    pub fn advance(&self, dt: f32) {
        let mut scene = self.scene.borrow_mut();
        let mut due = Vec::new();
        for entity in &mut scene.entities {
            if let Some(remaining) = entity.destroy_in.as_mut() {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    due.push(entity.id);
                }
            }
        }
        scene.entities.retain(|e| !due.contains(&e.id));
        scene.destroyed.extend(due);
    }

    /// Snapshot of a live entity.
    #[must_use]
    pub fn entity(&self, entity: EntityId) -> Option<SceneEntity> {
        self.scene
            .borrow()
            .entities
            .iter()
            .find(|e| e.id == entity)
            .cloned()
    }

    /// Snapshot of every live entity.
    #[must_use]
    pub fn entities(&self) -> Vec<SceneEntity> {
        self.scene.borrow().entities.clone()
    }

    /// Live entities created from `prefab`.
    #[must_use]
    pub fn entities_of(&self, prefab: PrefabId) -> Vec<SceneEntity> {
        self.scene
            .borrow()
            .entities
            .iter()
            .filter(|e| e.prefab == Some(prefab))
            .cloned()
            .collect()
    }

    /// Entities removed so far, in removal order.
    #[must_use]
    pub fn destroyed(&self) -> Vec<EntityId> {
        self.scene.borrow().destroyed.clone()
    }

    /// Every `destroy_after` request, in call order.
    #[must_use]
    pub fn delayed_destroys(&self) -> Vec<(EntityId, f32)> {
        self.scene.borrow().delayed_destroys.clone()
    }

    /// Every damage application, in call order.
    #[must_use]
    pub fn damage_log(&self) -> Vec<(EntityId, i32)> {
        self.scene.borrow().damage_log.clone()
    }

    fn surface_at(&self, x: f32, z: f32) -> Option<(f32, Layer)> {
        (self.surface)(x, z)
    }
}

impl TerrainQuery for Island {
    fn raycast_down(&self, origin: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let in_reach = |y: f32| y <= origin.y && origin.y - y <= max_distance;
        let mut best: Option<RayHit> = None;

        if let Some((height, layer)) = self.surface_at(origin.x, origin.z) {
            if mask.contains(layer) && in_reach(height) {
                best = Some(RayHit {
                    point: Vec3::new(origin.x, height, origin.z),
                    layer,
                    entity: Some(self.ground),
                });
            }
        }

        let scene = self.scene.borrow();
        for entity in scene.entities.iter().filter(|e| e.present) {
            let dx = entity.position.x - origin.x;
            let dz = entity.position.z - origin.z;
            let horizontal_sq = dx * dx + dz * dz;
            if horizontal_sq > ENTITY_RADIUS * ENTITY_RADIUS || !mask.contains(entity.layer) {
                continue;
            }
            let top = entity.position.y + (ENTITY_RADIUS * ENTITY_RADIUS - horizontal_sq).sqrt();
            if in_reach(top) && best.map_or(true, |b| top > b.point.y) {
                best = Some(RayHit {
                    point: Vec3::new(origin.x, top, origin.z),
                    layer: entity.layer,
                    entity: Some(entity.id),
                });
            }
        }
        best
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<Overlap> {
        let mut overlaps = Vec::new();

        if let Some((height, layer)) = self.surface_at(center.x, center.z) {
            if mask.contains(layer) && (center.y - height).abs() <= radius {
                overlaps.push(Overlap {
                    entity: self.ground,
                    layer,
                });
            }
        }

        let scene = self.scene.borrow();
        overlaps.extend(
            scene
                .entities
                .iter()
                .filter(|e| e.present && mask.contains(e.layer))
                .filter(|e| e.position.distance(center) <= radius + ENTITY_RADIUS)
                .map(|e| Overlap {
                    entity: e.id,
                    layer: e.layer,
                }),
        );
        overlaps
    }
}

/// Mutating handle onto an [`Island`].
#[derive(Debug, Clone, Copy)]
pub struct IslandHost<'a> {
    island: &'a Island,
}

impl EntityHost for IslandHost<'_> {
    fn instantiate(
        &mut self,
        prefab: PrefabId,
        position: Vec3,
        rotation: Quat,
        parent: Option<EntityId>,
    ) -> EntityId {
        let mut scene = self.island.scene.borrow_mut();
        let layer = scene
            .prefab_layers
            .iter()
            .find(|(p, _)| *p == prefab)
            .map_or(Layer::DEFAULT, |(_, l)| *l);
        let id = EntityId::new();
        scene.entities.push(SceneEntity {
            id,
            prefab: Some(prefab),
            position,
            rotation,
            layer,
            parent,
            present: true,
            effect_active: false,
            destroy_in: None,
            damage_taken: 0,
        });
        id
    }

    fn destroy(&mut self, entity: EntityId) {
        let mut scene = self.island.scene.borrow_mut();
        let before = scene.entities.len();
        scene.entities.retain(|e| e.id != entity);
        if scene.entities.len() != before {
            scene.destroyed.push(entity);
        }
    }

    fn destroy_after(&mut self, entity: EntityId, delay: f32) {
        let mut scene = self.island.scene.borrow_mut();
        scene.delayed_destroys.push((entity, delay));
        if let Some(e) = scene.entities.iter_mut().find(|e| e.id == entity) {
            e.destroy_in = Some(delay);
        }
    }

    fn set_presence(&mut self, entity: EntityId, present: bool) {
        let mut scene = self.island.scene.borrow_mut();
        if let Some(e) = scene.entities.iter_mut().find(|e| e.id == entity) {
            e.present = present;
        }
    }

    fn activate_effect(&mut self, entity: EntityId) {
        let mut scene = self.island.scene.borrow_mut();
        if let Some(e) = scene.entities.iter_mut().find(|e| e.id == entity) {
            e.effect_active = true;
        }
    }
}

impl DamageSink for IslandHost<'_> {
    fn apply_damage(&mut self, entity: EntityId, amount: i32) {
        let mut scene = self.island.scene.borrow_mut();
        scene.damage_log.push((entity, amount));
        if let Some(e) = scene.entities.iter_mut().find(|e| e.id == entity) {
            e.damage_taken += amount;
        }
    }
}

/// Target with fixed position and velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedTarget {
    /// Current position
    pub position: Vec3,
    /// Current velocity
    pub velocity: Vec3,
}

impl ScriptedTarget {
    /// Creates a target.
    #[must_use]
    pub const fn new(position: Vec3, velocity: Vec3) -> Self {
        Self { position, velocity }
    }
}

impl KinematicsSource for ScriptedTarget {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }
}

/// Records level and HUD notifications.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingHooks {
    /// Times `mark_island_cleared` was called
    pub cleared: u32,
    /// Islands passed to `advance_level`
    pub advanced: Vec<IslandId>,
    /// Messages shown
    pub messages: Vec<String>,
    /// Navigation retargets
    pub navigation: Vec<bool>,
    /// Last counter visibility
    pub counter_visible: Option<bool>,
    /// Every counter text update
    pub counter_texts: Vec<i32>,
}

impl LevelHooks for RecordingHooks {
    fn mark_island_cleared(&mut self) {
        self.cleared += 1;
    }

    fn advance_level(&mut self, island: IslandId) {
        self.advanced.push(island);
    }

    fn show_timed_message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn retarget_navigation(&mut self, toward_boat: bool) {
        self.navigation.push(toward_boat);
    }

    fn set_spawn_counter_visible(&mut self, visible: bool) {
        self.counter_visible = Some(visible);
    }

    fn set_spawn_counter_text(&mut self, remaining: i32) {
        self.counter_texts.push(remaining);
    }
}

/// Records animation, audio and HUD weapon effects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingPresentation {
    /// Draw animations triggered
    pub draws: Vec<WeaponId>,
    /// Sound cues played
    pub sounds: Vec<SoundCue>,
    /// HUD icons shown
    pub icons: Vec<WeaponIcon>,
}

impl Presentation for RecordingPresentation {
    fn trigger_draw_animation(&mut self, weapon: WeaponId) {
        self.draws.push(weapon);
    }

    fn play_sfx(&mut self, cue: SoundCue) {
        self.sounds.push(cue);
    }

    fn swap_weapon_icon(&mut self, icon: WeaponIcon) {
        self.icons.push(icon);
    }
}

/// Records weapon fire actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingActions {
    /// Weapons fired, in order
    pub fired: Vec<WeaponId>,
}

impl WeaponActions for RecordingActions {
    fn fire(&mut self, weapon: WeaponId) {
        self.fired.push(weapon);
    }
}
