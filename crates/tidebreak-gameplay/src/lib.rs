//! # Tidebreak Gameplay
//!
//! Combat systems for island levels.
//!
//! This crate provides:
//! - Mortar shells on a predictive ballistic arc
//! - Wave spawner placing mortar emitters on island ground
//! - Player weapon state machine and aim tracking
//! - Ports for the physics scene, level flow and presentation
//! - An in-memory island for tests and headless runs
//! - Event bus for inter-system communication

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod aim;
pub mod config;
pub mod events;
pub mod ports;
pub mod projectile;
pub mod sandbox;
pub mod schedule;
pub mod spawner;
pub mod trajectory;
pub mod weapon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aim::*;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::ports::*;
    pub use crate::projectile::*;
    pub use crate::schedule::*;
    pub use crate::spawner::*;
    pub use crate::trajectory::*;
    pub use crate::weapon::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use sandbox::{Island, RecordingActions, RecordingPresentation, ScriptedTarget};
    use tidebreak_common::{EntityId, Layer};

    #[test]
    fn test_mortar_hits_stationary_player() {
        let island = Island::flat(0.0);
        let player = island.add_actor(Vec3::new(8.0, 0.5, 0.0), Layer::PLAYER);
        let target = ScriptedTarget::new(Vec3::new(8.0, 0.5, 0.0), Vec3::ZERO);
        let config = ShellConfig {
            prediction_range: 0.0,
            ..ShellConfig::default()
        };
        let mut rng = fastrand::Rng::with_seed(9);

        let mut host = island.host();
        let mut sink = island.host();
        let mut ctx = ShellContext {
            host: &mut host,
            terrain: &island,
            damage: &mut sink,
        };
        let mut shell = Shell::fire(
            Vec3::new(0.0, 3.0, 0.0),
            &target,
            None,
            &mut ctx,
            &config,
            &mut rng,
        );

        let mut hit = None;
        for _ in 0..200 {
            if let Some(event) = shell.tick(0.02, &mut ctx) {
                hit = Some(event);
                break;
            }
        }

        let hit = hit.expect("shell landed");
        assert_eq!(hit.target, Some(player));
        assert_eq!(island.damage_log(), vec![(player, 5)]);
    }

    #[test]
    fn test_weapon_aim_follows_active_weapon() {
        let island = Island::flat(0.0);
        let tracker = AimTracker::default();
        let mut actions = RecordingActions::default();
        let mut presentation = RecordingPresentation::default();
        let mut ctx = WeaponContext {
            actions: &mut actions,
            presentation: &mut presentation,
        };
        let mut weapons = WeaponController::new(WeaponConfig::default());

        let pistol = tracker.aim(Vec3::ZERO, Vec3::Z, weapons.active(), &island);
        weapons.unlock_splash(&mut ctx);
        let splash = tracker.aim(Vec3::ZERO, Vec3::Z, weapons.active(), &island);
        assert!(splash.target.y > pistol.target.y);
    }

    #[test]
    fn test_event_bus_collects_from_systems() {
        let bus = EventBus::new(64);
        let island = Island::flat(1.0);
        let mut host = island.host();
        let mut hooks = sandbox::RecordingHooks::default();
        let mut ctx = SpawnContext {
            host: &mut host,
            terrain: &island,
            level: &mut hooks,
        };
        let config = WaveConfig {
            seed: Some(3),
            ..WaveConfig::default()
        };
        let mut spawner = WaveSpawner::new(
            tidebreak_common::IslandId::new(1),
            SpawnVolume::new(Vec3::new(-10.0, 5.0, -10.0), Vec3::new(10.0, 6.0, 10.0)),
            config,
        )
        .with_events(bus.sender());
        spawner.spawn_wave(2, &mut ctx).expect("spawned");

        let events = bus.drain();
        let placed = events
            .iter()
            .filter(|e| matches!(e, GameEvent::EmitterPlaced { .. }))
            .count();
        assert_eq!(placed, 3);
        assert!(matches!(
            events.last(),
            Some(GameEvent::WaveSpawned { emitters: 3, .. })
        ));
        assert!(!spawner.live_entities().contains(&EntityId::NULL));
    }
}
