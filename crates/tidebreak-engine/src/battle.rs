//! Headless island battle.
//!
//! The player's boat circles a dome-shaped island while mortar emitters on
//! the island lob shells at it. The player fires whatever weapon is drawn at
//! the nearest emitter in range. The battle ends when the wave is cleared or
//! the time limit runs out, in which case the boat sails away.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tidebreak_common::random::{range_f32, seeded};
use tidebreak_common::{EntityId, IslandId, Layer, PrefabId};
use tidebreak_gameplay::sandbox::{Island, ScriptedTarget, ENTITY_RADIUS};
use tidebreak_gameplay::{
    AimSolution, AimTracker, AttackInput, Contact, ContactTag, DamageEvent, EntityHost, EventBus,
    GameEvent, Scheduler, Shell, ShellContext, SpawnContext, SpawnVolume, WaveSpawner,
    WeaponContext, WeaponController, WeaponId,
};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::hooks::{Gunnery, LevelLog, PresentationLog};
use crate::timing::FixedStep;

/// Island the driver plays on.
const ISLAND: IslandId = IslandId::new(1);
/// Height of the boat's center above the water.
const BOAT_HEIGHT: f32 = 0.5;
/// Height of an emitter's muzzle above its origin.
const MUZZLE_HEIGHT: f32 = 1.0;
/// Event channel capacity.
const EVENT_CAPACITY: usize = 1024;

/// Outcome of a battle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    /// Frames simulated
    pub frames: u64,
    /// Fixed steps simulated
    pub fixed_steps: u64,
    /// Simulated seconds
    pub elapsed: f32,
    /// Emitters placed on the island
    pub emitters_placed: usize,
    /// Shells launched by emitters
    pub shells_fired: u32,
    /// Shells that detonated
    pub shells_detonated: u32,
    /// Shells that damaged the boat
    pub player_hits: u32,
    /// Total damage taken by the boat
    pub player_damage: i32,
    /// Shots fired by the player
    pub shots_fired: u32,
    /// Emitters destroyed and counted by the spawner
    pub kills: u32,
    /// Whether the blunderbuss was picked up
    pub splash_unlocked: bool,
    /// Whether the island was cleared
    pub cleared: bool,
    /// Whether the boat left with the wave still up
    pub departed: bool,
    /// Why spawning gave up, if it did
    pub spawn_error: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Emitter {
    entity: EntityId,
    health: i32,
}

/// One island battle.
#[derive(Debug)]
pub struct Battle {
    config: SimConfig,
    island: Island,
    boat: EntityId,
    boat_motion: ScriptedTarget,
    orbit_angle: f32,
    spawner: WaveSpawner,
    emitters: Vec<Emitter>,
    volleys: Scheduler<EntityId>,
    shells: Vec<Shell>,
    weapons: WeaponController,
    aim: AimTracker,
    last_aim: Option<AimSolution>,
    level: LevelLog,
    presentation: PresentationLog,
    gunnery: Gunnery,
    bus: EventBus,
    rng: fastrand::Rng,
    timing: FixedStep,
    stats: BattleSummary,
}

impl Battle {
    /// Sets up the island, the boat and a wave that starts spawning on the
    /// first frame.
    #[must_use]
    pub fn new(mut config: SimConfig) -> Self {
        config.validate();

        let island = Island::dome(config.island_radius, config.island_peak);
        // Shells in flight must not block placement or landing probes
        island.set_prefab_layer(PrefabId::SHELL, Layer::TRIGGER);

        let boat_position = Vec3::new(config.boat_orbit, BOAT_HEIGHT, 0.0);
        let boat = island.add_actor(boat_position, Layer::PLAYER);

        let bus = EventBus::new(EVENT_CAPACITY);

        let mut wave = config.gameplay.wave.clone();
        wave.seed = wave.seed.or(config.seed);
        let span = config.island_radius * 1.5;
        let volume = SpawnVolume::from_center(
            Vec3::new(0.0, config.island_peak + 5.0, 0.0),
            Vec3::new(span, 2.0, span),
        );
        let mut spawner = WaveSpawner::new(ISLAND, volume, wave).with_events(bus.sender());
        spawner.set_target_kill_count(config.kill_target);
        spawner.start_spawning();

        let weapons =
            WeaponController::new(config.gameplay.weapon.clone()).with_events(bus.sender());

        info!(
            "Battle on island {} ({} kills needed)",
            ISLAND.raw(),
            config.kill_target
        );

        Self {
            island,
            boat,
            boat_motion: ScriptedTarget::new(boat_position, Vec3::ZERO),
            orbit_angle: 0.0,
            spawner,
            emitters: Vec::new(),
            volleys: Scheduler::new(),
            shells: Vec::new(),
            weapons,
            aim: AimTracker::new(config.gameplay.aim.clone()),
            last_aim: None,
            level: LevelLog::default(),
            presentation: PresentationLog,
            gunnery: Gunnery::default(),
            bus,
            rng: seeded(config.seed.map(|seed| seed.wrapping_add(1))),
            timing: FixedStep::new(config.fixed_rate),
            stats: BattleSummary::default(),
            config,
        }
    }

    /// Runs until the island is cleared or time runs out.
    pub fn run(&mut self) -> BattleSummary {
        while !self.is_finished() {
            self.frame();
        }

        if !self.spawner.is_cleared() {
            let mut host = self.island.host();
            let mut ctx = SpawnContext {
                host: &mut host,
                terrain: &self.island,
                level: &mut self.level,
            };
            if self.spawner.despawn_on_departure(&mut ctx) {
                info!("Time is up, sailing away");
                self.stats.departed = true;
            }
        }

        self.summary()
    }

    /// Whether the battle is over.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.spawner.is_cleared() || self.stats.elapsed >= self.config.duration
    }

    /// Most recent aim solution.
    #[must_use]
    pub fn last_aim(&self) -> Option<&AimSolution> {
        self.last_aim.as_ref()
    }

    /// Snapshot of the results so far.
    #[must_use]
    pub fn summary(&self) -> BattleSummary {
        BattleSummary {
            fixed_steps: self.timing.total_steps(),
            emitters_placed: self.spawner.placed_positions().len(),
            splash_unlocked: self.weapons.splash_unlocked(),
            cleared: self.spawner.is_cleared(),
            ..self.stats.clone()
        }
    }

    /// Advances one frame: fixed steps first, then frame work.
    pub fn frame(&mut self) {
        let dt = self.config.frame_dt();
        let fixed_dt = self.timing.fixed_dt();
        for _ in 0..self.timing.accumulate(dt) {
            self.fixed_step(fixed_dt);
        }
        self.frame_step(dt);

        self.stats.frames += 1;
        self.stats.elapsed += dt;
    }

    fn fixed_step(&mut self, dt: f32) {
        self.sail(dt);

        let boat_position = self.boat_motion.position;
        let facing = -Vec3::new(boat_position.x, 0.0, boat_position.z);
        self.last_aim = Some(self.aim.aim(
            boat_position,
            facing,
            self.weapons.active(),
            &self.island,
        ));

        let mut host = self.island.host();
        let mut sink = self.island.host();
        let mut ctx = ShellContext {
            host: &mut host,
            terrain: &self.island,
            damage: &mut sink,
        };
        let boat_contact = Contact {
            entity: self.boat,
            tag: ContactTag::Player,
            layer: Layer::PLAYER,
        };

        let mut detonations = Vec::new();
        for shell in &mut self.shells {
            if let Some(event) = shell.tick(dt, &mut ctx) {
                detonations.push(event);
                continue;
            }
            self.island.move_entity(shell.entity(), shell.position());
            if !shell.is_detonated()
                && shell.position().distance(boat_position) <= ENTITY_RADIUS * 2.0
            {
                detonations.extend(shell.on_collision(&boat_contact, &mut ctx));
            }
        }

        for event in detonations {
            self.record_detonation(&event);
        }
    }

    fn frame_step(&mut self, dt: f32) {
        self.step_spawner();
        self.arm_new_emitters();
        self.step_weapons(dt);
        self.resolve_shots();
        self.fire_volleys(dt);

        self.island.advance(dt);
        self.shells.retain(|shell| !shell.is_detonated());
        self.drain_events();
    }

    /// Moves the boat along its circle around the island.
    fn sail(&mut self, dt: f32) {
        let orbit = self.config.boat_orbit;
        self.orbit_angle += self.config.boat_speed / orbit * dt;
        let (sin, cos) = self.orbit_angle.sin_cos();

        let position = Vec3::new(cos * orbit, BOAT_HEIGHT, sin * orbit);
        self.boat_motion.velocity = Vec3::new(-sin, 0.0, cos) * self.config.boat_speed;
        self.boat_motion.position = position;
        self.island.move_entity(self.boat, position);
    }

    fn step_spawner(&mut self) {
        if !self.spawner.is_spawning() {
            return;
        }
        let mut host = self.island.host();
        let mut ctx = SpawnContext {
            host: &mut host,
            terrain: &self.island,
            level: &mut self.level,
        };
        if let Err(e) = self.spawner.tick(&mut ctx) {
            warn!("Spawning stopped early: {e}");
            self.stats.spawn_error = Some(e.to_string());
        }
    }

    /// Gives newly placed emitters health and a volley timer.
    fn arm_new_emitters(&mut self) {
        for &entity in self.spawner.live_entities() {
            if self.emitters.iter().any(|e| e.entity == entity) {
                continue;
            }
            self.emitters.push(Emitter {
                entity,
                health: self.config.emitter_health,
            });
            let first_volley = range_f32(&mut self.rng, 0.5, self.config.volley_interval);
            self.volleys.schedule(first_volley, entity);
        }
    }

    fn step_weapons(&mut self, dt: f32) {
        let input = AttackInput {
            fire: self.nearest_emitter_in_range().is_some(),
            ..AttackInput::default()
        };
        let mut ctx = WeaponContext {
            actions: &mut self.gunnery,
            presentation: &mut self.presentation,
        };

        if let Some(unlock_at) = self.config.splash_unlock_time {
            if !self.weapons.splash_unlocked() && self.stats.elapsed >= unlock_at {
                self.weapons.unlock_splash(&mut ctx);
            }
        }

        self.weapons.handle_input(&input, &mut ctx);
        self.weapons.tick(dt, &mut ctx);
    }

    fn resolve_shots(&mut self) {
        for weapon in self.gunnery.drain() {
            self.stats.shots_fired += 1;
            let Some(index) = self.nearest_emitter_in_range() else {
                continue;
            };

            let damage = if weapon == WeaponId::Splash { 2 } else { 1 };
            let emitter = &mut self.emitters[index];
            emitter.health -= damage;
            if emitter.health <= 0 {
                let entity = emitter.entity;
                self.emitters.swap_remove(index);
                self.kill_emitter(entity);
            }
        }
    }

    fn kill_emitter(&mut self, entity: EntityId) {
        let mut host = self.island.host();
        host.destroy(entity);

        let mut ctx = SpawnContext {
            host: &mut host,
            terrain: &self.island,
            level: &mut self.level,
        };
        if self.spawner.on_entity_death(entity, &mut ctx) {
            self.stats.kills += 1;
            debug!("Emitter {} destroyed", entity);
        }
    }

    fn fire_volleys(&mut self, dt: f32) {
        for entity in self.volleys.advance(dt) {
            if !self.emitters.iter().any(|e| e.entity == entity) {
                continue;
            }
            let Some(emitter) = self.island.entity(entity) else {
                continue;
            };

            let mut host = self.island.host();
            let mut sink = self.island.host();
            let mut ctx = ShellContext {
                host: &mut host,
                terrain: &self.island,
                damage: &mut sink,
            };
            let shell = Shell::fire(
                emitter.position + Vec3::Y * MUZZLE_HEIGHT,
                &self.boat_motion,
                None,
                &mut ctx,
                &self.config.gameplay.shell,
                &mut self.rng,
            )
            .with_events(self.bus.sender());
            self.shells.push(shell);
            self.stats.shells_fired += 1;
            self.volleys.schedule(self.config.volley_interval, entity);
        }
    }

    fn drain_events(&mut self) {
        for event in self.bus.drain() {
            match event {
                GameEvent::ShellDetonated { .. } => self.stats.shells_detonated += 1,
                GameEvent::WaveSpawned { emitters, .. } => {
                    info!("{} emitters on the island", emitters);
                },
                GameEvent::WaveCleared { island } => {
                    info!("Island {} cleared after {:.1}s", island.raw(), self.stats.elapsed);
                },
                GameEvent::EmitterPlaced { .. }
                | GameEvent::WeaponFired { .. }
                | GameEvent::WeaponSwitched { .. } => {},
            }
        }
    }

    fn record_detonation(&mut self, event: &DamageEvent) {
        if event.target == Some(self.boat) {
            self.stats.player_hits += 1;
            self.stats.player_damage += event.amount;
        }
    }

    /// Index of the closest emitter the player can reach.
    fn nearest_emitter_in_range(&self) -> Option<usize> {
        let boat = self.boat_motion.position;
        self.emitters
            .iter()
            .enumerate()
            .filter_map(|(index, emitter)| {
                let position = self.island.entity(emitter.entity)?.position;
                let distance = position.distance(boat);
                (distance <= self.config.weapon_range).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boat_circles_island() {
        let mut battle = Battle::new(SimConfig::default());
        battle.sail(1.0);
        let position = battle.boat_motion.position;
        let horizontal = Vec3::new(position.x, 0.0, position.z);
        assert!((horizontal.length() - battle.config.boat_orbit).abs() < 1e-3);
        assert!((position.y - BOAT_HEIGHT).abs() < f32::EPSILON);
        assert_eq!(
            battle.island.entity(battle.boat).map(|e| e.position),
            Some(position)
        );
        assert!((battle.boat_motion.velocity.length() - battle.config.boat_speed).abs() < 1e-3);
    }

    #[test]
    fn test_frames_spawn_emitters() {
        let mut battle = Battle::new(SimConfig::default());
        for _ in 0..600 {
            battle.frame();
            if !battle.spawner.is_spawning() {
                break;
            }
        }
        assert_eq!(battle.emitters.len(), 6);
        assert!(battle.last_aim().is_some());
    }

    #[test]
    fn test_summary_serializes() {
        let summary = Battle::new(SimConfig::default()).summary();
        let json = serde_json::to_string(&summary).expect("serialize");
        assert!(json.contains("\"cleared\":false"));
    }
}
