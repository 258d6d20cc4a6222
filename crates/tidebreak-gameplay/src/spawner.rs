//! Mortar wave placement and clearing for one island.
//!
//! The spawner fills its volume by rejection sampling: pick a random point in
//! the box, probe straight down, and keep the hit only if it is island ground
//! above sea level with nothing but ground inside the clearance radius. One
//! sample is taken per frame tick, so filling a wave is spread over frames.
//!
//! Placement positions are remembered so a restarted level can put every
//! emitter back exactly where it was.
//!
//! Without a configured attempt cap, a volume that cannot hold the requested
//! number of emitters keeps sampling forever.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use tidebreak_common::random::{point_in_box, seeded};
use tidebreak_common::{EntityId, IslandId, PrefabId};

use crate::config::WaveConfig;
use crate::events::{EventSender, GameEvent};
use crate::ports::{EntityHost, LevelHooks, TerrainQuery};

/// Upper bound (exclusive) of the random emitter yaw, in degrees.
const MAX_YAW_DEGREES: u32 = 359;

/// Errors that can occur while filling a wave.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// Gave up before placing every emitter
    #[error("placed {placed} of {requested} emitters after {attempts} attempts")]
    SamplingExhausted {
        /// Emitters placed before giving up
        placed: usize,
        /// Emitters requested
        requested: usize,
        /// Samples taken
        attempts: u32,
    },
    /// A spawn or respawn is already running, or the wave is already up
    #[error("spawner is busy")]
    Busy,
}

/// Spawner lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpawnPhase {
    /// Nothing placed
    #[default]
    Idle,
    /// Sampling new positions
    Spawning,
    /// Replaying remembered positions
    Respawning,
    /// Wave is up and waiting to be cleared
    Spawned,
}

/// Axis-aligned box the spawner samples from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnVolume {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl SpawnVolume {
    /// Creates a volume from its corners.
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Creates a volume from its center and full size.
    #[must_use]
    pub fn from_center(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() / 2.0;
        Self::new(center - half, center + half)
    }
}

/// State of the current wave.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnWave {
    /// Kills needed to clear the island
    pub target_kill_count: u32,
    /// Emitters to place
    pub spawn_count: usize,
    /// Remembered placement positions, in placement order
    pub placed: Vec<Vec3>,
    /// Emitters currently alive
    pub live_entities: Vec<EntityId>,
    /// Kills still needed
    pub remaining_to_kill: i32,
}

/// Collaborators the spawner needs.
pub struct SpawnContext<'a> {
    /// Scene host
    pub host: &'a mut dyn EntityHost,
    /// Physics queries
    pub terrain: &'a dyn TerrainQuery,
    /// Level flow and HUD
    pub level: &'a mut dyn LevelHooks,
}

/// Places and tracks the mortar emitters of one island.
#[derive(Debug)]
pub struct WaveSpawner {
    island: IslandId,
    anchor: Option<EntityId>,
    volume: SpawnVolume,
    config: WaveConfig,
    wave: SpawnWave,
    phase: SpawnPhase,
    cleared: bool,
    departure_despawn: bool,
    attempts: u32,
    replay_cursor: usize,
    last_error: Option<SpawnError>,
    rng: fastrand::Rng,
    events: EventSender,
}

impl WaveSpawner {
    /// Creates an idle spawner for `island`.
    #[must_use]
    pub fn new(island: IslandId, volume: SpawnVolume, config: WaveConfig) -> Self {
        let rng = seeded(config.seed);
        Self {
            island,
            anchor: None,
            volume,
            wave: SpawnWave {
                target_kill_count: config.target_kill_count,
                ..SpawnWave::default()
            },
            config,
            phase: SpawnPhase::Idle,
            cleared: false,
            departure_despawn: false,
            attempts: 0,
            replay_cursor: 0,
            last_error: None,
            rng,
            events: EventSender::detached(),
        }
    }

    /// Parents placed emitters under `anchor`.
    #[must_use]
    pub fn with_anchor(mut self, anchor: EntityId) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Attaches an event sender.
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Island this spawner belongs to.
    #[must_use]
    pub fn island(&self) -> IslandId {
        self.island
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SpawnPhase {
        self.phase
    }

    /// Whether a spawn or respawn is running.
    #[must_use]
    pub fn is_spawning(&self) -> bool {
        matches!(self.phase, SpawnPhase::Spawning | SpawnPhase::Respawning)
    }

    /// Whether the current wave has been cleared.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Current wave state.
    #[must_use]
    pub fn wave(&self) -> &SpawnWave {
        &self.wave
    }

    /// Kills still needed.
    #[must_use]
    pub fn remaining_to_kill(&self) -> i32 {
        self.wave.remaining_to_kill
    }

    /// Emitters currently alive.
    #[must_use]
    pub fn live_entities(&self) -> &[EntityId] {
        &self.wave.live_entities
    }

    /// Remembered placement positions.
    #[must_use]
    pub fn placed_positions(&self) -> &[Vec3] {
        &self.wave.placed
    }

    /// Error from the last spawn that gave up, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&SpawnError> {
        self.last_error.as_ref()
    }

    /// Sets the kills needed for the next wave.
    pub fn set_target_kill_count(&mut self, target_kill_count: u32) {
        self.wave.target_kill_count = target_kill_count;
    }

    /// Begins sampling a fresh wave. Rejected while spawning or while a wave is up.
    pub fn start_spawning(&mut self) -> bool {
        if self.is_spawning() || self.phase == SpawnPhase::Spawned {
            debug!("Spawn request on island {} ignored ({:?})", self.island.raw(), self.phase);
            return false;
        }

        let target = self.wave.target_kill_count;
        self.wave.spawn_count = self.config.spawn_count_for(target);
        self.wave.remaining_to_kill = target as i32;
        self.wave.placed.clear();
        self.cleared = false;
        self.departure_despawn = false;
        self.attempts = 0;
        self.last_error = None;
        self.phase = SpawnPhase::Spawning;

        info!(
            "Spawning {} emitters on island {} ({} to kill)",
            self.wave.spawn_count,
            self.island.raw(),
            target
        );
        true
    }

    /// Tears the wave down and begins replaying the remembered positions.
    /// Rejected while spawning.
    pub fn start_respawning(&mut self, ctx: &mut SpawnContext<'_>) -> bool {
        if !self.teardown(ctx) {
            return false;
        }
        self.cleared = false;
        self.departure_despawn = false;
        self.replay_cursor = 0;
        self.phase = SpawnPhase::Respawning;
        info!(
            "Respawning {} emitters on island {}",
            self.wave.placed.len(),
            self.island.raw()
        );
        true
    }

    /// Frame tick: one sample while spawning, one emitter while respawning.
    pub fn tick(&mut self, ctx: &mut SpawnContext<'_>) -> Result<(), SpawnError> {
        match self.phase {
            SpawnPhase::Spawning => self.fill_step(ctx),
            SpawnPhase::Respawning => {
                self.replay_step(ctx);
                Ok(())
            },
            SpawnPhase::Idle | SpawnPhase::Spawned => Ok(()),
        }
    }

    /// Spawns a full wave for `target_kill_count` kills, ticking until done.
    /// Returns the number of emitters placed.
    pub fn spawn_wave(
        &mut self,
        target_kill_count: u32,
        ctx: &mut SpawnContext<'_>,
    ) -> Result<usize, SpawnError> {
        if self.is_spawning() || self.phase == SpawnPhase::Spawned {
            return Err(SpawnError::Busy);
        }
        self.set_target_kill_count(target_kill_count);
        self.start_spawning();
        while self.is_spawning() {
            self.tick(ctx)?;
        }
        Ok(self.wave.live_entities.len())
    }

    /// Replays the remembered wave, ticking until done.
    /// Returns the number of emitters placed.
    pub fn respawn_wave(&mut self, ctx: &mut SpawnContext<'_>) -> Result<usize, SpawnError> {
        if !self.start_respawning(ctx) {
            return Err(SpawnError::Busy);
        }
        while self.is_spawning() {
            self.tick(ctx)?;
        }
        Ok(self.wave.live_entities.len())
    }

    /// Death signal from an emitter. Returns true if the death was counted.
    ///
    /// Unknown entities and repeated signals are ignored, as is everything
    /// after the player has left the island.
    pub fn on_entity_death(&mut self, entity: EntityId, ctx: &mut SpawnContext<'_>) -> bool {
        if self.departure_despawn {
            return false;
        }
        let Some(index) = self.wave.live_entities.iter().position(|e| *e == entity) else {
            debug!("Ignoring death of unknown emitter {}", entity);
            return false;
        };

        self.wave.live_entities.remove(index);
        self.wave.remaining_to_kill -= 1;
        if !self.cleared {
            ctx.level.set_spawn_counter_text(self.wave.remaining_to_kill);
        }

        let wave_done =
            self.wave.live_entities.is_empty() || self.wave.remaining_to_kill <= 0;
        if wave_done && !self.is_spawning() && !self.cleared {
            self.clear_wave(ctx);
        }
        true
    }

    /// Destroys every live emitter. Rejected while spawning.
    pub fn teardown(&mut self, ctx: &mut SpawnContext<'_>) -> bool {
        if self.is_spawning() {
            debug!("Teardown on island {} ignored while spawning", self.island.raw());
            return false;
        }

        for entity in self.wave.live_entities.drain(..) {
            ctx.host.destroy(entity);
        }
        ctx.level.set_spawn_counter_visible(false);
        ctx.level.set_spawn_counter_text(self.wave.remaining_to_kill);
        self.phase = SpawnPhase::Idle;
        true
    }

    /// Removes the wave when the player sails away; later deaths are ignored.
    pub fn despawn_on_departure(&mut self, ctx: &mut SpawnContext<'_>) -> bool {
        self.departure_despawn = true;
        self.teardown(ctx)
    }

    fn fill_step(&mut self, ctx: &mut SpawnContext<'_>) -> Result<(), SpawnError> {
        if self.wave.placed.len() < self.wave.spawn_count && !self.attempts_exhausted() {
            self.attempts += 1;
            let origin = point_in_box(&mut self.rng, self.volume.min, self.volume.max);
            if let Some(ground) = self.probe(origin, ctx.terrain) {
                self.place(ground + self.config.height_correction, ctx);
            }
        }

        if self.wave.placed.len() >= self.wave.spawn_count {
            self.finish_spawning(ctx);
            return Ok(());
        }

        if self.attempts_exhausted() {
            let error = SpawnError::SamplingExhausted {
                placed: self.wave.placed.len(),
                requested: self.wave.spawn_count,
                attempts: self.attempts,
            };
            warn!("Island {}: {}", self.island.raw(), error);
            self.finish_spawning(ctx);
            self.last_error = Some(error.clone());
            return Err(error);
        }
        Ok(())
    }

    /// A cap of zero places nothing.
    fn attempts_exhausted(&self) -> bool {
        self.config
            .max_attempts
            .is_some_and(|cap| self.attempts >= cap)
    }

    fn replay_step(&mut self, ctx: &mut SpawnContext<'_>) {
        if let Some(position) = self.wave.placed.get(self.replay_cursor).copied() {
            let entity = self.instantiate(position, ctx);
            self.wave.live_entities.push(entity);
            self.replay_cursor += 1;
        }

        if self.replay_cursor >= self.wave.placed.len() {
            self.wave.remaining_to_kill = self.wave.target_kill_count as i32;
            self.finish_spawning(ctx);
        }
    }

    /// Downward probe from `origin`; returns the ground point if it is usable.
    fn probe(&self, origin: Vec3, terrain: &dyn TerrainQuery) -> Option<Vec3> {
        let mask = self.config.ignore_mask.inverted();
        let hit = terrain.raycast_down(origin, self.config.probe_distance, mask)?;
        if hit.layer != self.config.ground_layer || hit.point.y <= self.config.sea_level {
            return None;
        }

        let crowded = terrain
            .overlap_sphere(hit.point, self.config.clearance_range, mask)
            .iter()
            .any(|overlap| overlap.layer != self.config.ground_layer);
        if crowded {
            trace!("Rejected crowded spawn point {:?}", hit.point);
            return None;
        }
        Some(hit.point)
    }

    fn place(&mut self, position: Vec3, ctx: &mut SpawnContext<'_>) {
        let entity = self.instantiate(position, ctx);
        self.wave.live_entities.push(entity);
        self.wave.placed.push(position);
    }

    fn instantiate(&mut self, position: Vec3, ctx: &mut SpawnContext<'_>) -> EntityId {
        let yaw = (self.rng.u32(0..MAX_YAW_DEGREES) as f32).to_radians();
        let entity = ctx.host.instantiate(
            PrefabId::MORTAR,
            position,
            Quat::from_rotation_y(yaw),
            self.anchor,
        );
        trace!("Emitter {} placed at {:?}", entity, position);
        self.events.publish(GameEvent::EmitterPlaced {
            entity_id: entity,
            position,
        });
        entity
    }

    fn finish_spawning(&mut self, ctx: &mut SpawnContext<'_>) {
        ctx.level.set_spawn_counter_visible(true);
        ctx.level.set_spawn_counter_text(self.wave.remaining_to_kill);
        self.phase = SpawnPhase::Spawned;

        info!(
            "Island {} wave up: {} emitters after {} samples",
            self.island.raw(),
            self.wave.live_entities.len(),
            self.attempts
        );
        self.events.publish(GameEvent::WaveSpawned {
            island: self.island,
            emitters: self.wave.live_entities.len(),
        });
    }

    fn clear_wave(&mut self, ctx: &mut SpawnContext<'_>) {
        self.teardown(ctx);
        ctx.level.retarget_navigation(true);
        ctx.level.mark_island_cleared();
        ctx.level.advance_level(self.island);
        ctx.level.show_timed_message(&self.config.cleared_message);
        self.cleared = true;

        info!("Island {} cleared", self.island.raw());
        self.events.publish(GameEvent::WaveCleared {
            island: self.island,
        });
    }
}
