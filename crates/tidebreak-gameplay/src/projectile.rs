//! Mortar shell in flight.
//!
//! A [`Shell`] owns its [`Trajectory`] and reacts to three triggers: arriving
//! at the landing point, touching something solid, and an explicit call.
//! Whichever comes first detonates it; the rest are absorbed.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use tidebreak_common::{EntityId, Layer, PrefabId};

use crate::config::ShellConfig;
use crate::events::{EventSender, GameEvent};
use crate::ports::{DamageSink, EntityHost, KinematicsSource, TerrainQuery};
use crate::trajectory::{PredictionSample, Trajectory};

/// What set a shell off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetonationReason {
    /// Reached the end of its arc
    Landed,
    /// Touched the player
    PlayerContact,
    /// Touched scenery or another solid object
    Impact,
    /// Detonated by an outside caller
    Forced,
}

/// Gameplay tag on a collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactTag {
    /// The player boat or avatar
    Player,
    /// Anything on the mortars' side
    Enemy,
    /// Everything else
    Untagged,
}

/// Collider touched by a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// Entity touched
    pub entity: EntityId,
    /// Its tag
    pub tag: ContactTag,
    /// Its layer
    pub layer: Layer,
}

/// Outcome of a detonation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    /// Shell that went off
    pub shell: EntityId,
    /// Where it went off
    pub position: Vec3,
    /// What set it off
    pub reason: DetonationReason,
    /// Entity that took damage, if anything was in range
    pub target: Option<EntityId>,
    /// Damage dealt to `target`
    pub amount: i32,
}

/// Collaborators a shell needs while ticking or detonating.
pub struct ShellContext<'a> {
    /// Scene host
    pub host: &'a mut dyn EntityHost,
    /// Physics queries
    pub terrain: &'a dyn TerrainQuery,
    /// Health system
    pub damage: &'a mut dyn DamageSink,
}

/// A mortar shell following its arc.
#[derive(Debug, Clone)]
pub struct Shell {
    entity: EntityId,
    trajectory: Trajectory,
    position: Vec3,
    /// Orientation built up from each step's tumble
    orientation: Quat,
    config: ShellConfig,
    events: EventSender,
}

impl Shell {
    /// Wraps an already-created shell entity.
    #[must_use]
    pub fn new(entity: EntityId, trajectory: Trajectory, config: ShellConfig) -> Self {
        Self {
            entity,
            position: trajectory.launch,
            trajectory,
            orientation: Quat::IDENTITY,
            config,
            events: EventSender::detached(),
        }
    }

    /// Instantiates a shell at `launch` aimed at `target`.
    pub fn fire(
        launch: Vec3,
        target: &dyn KinematicsSource,
        parent: Option<EntityId>,
        ctx: &mut ShellContext<'_>,
        config: &ShellConfig,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let sample = PredictionSample::observe(target, config);
        let trajectory = Trajectory::create(launch, &sample, ctx.terrain, config, rng);
        let entity = ctx
            .host
            .instantiate(PrefabId::SHELL, launch, Quat::IDENTITY, parent);
        debug!(
            "Shell {} launched from {:?} toward {:?}",
            entity, launch, trajectory.landing
        );
        Self::new(entity, trajectory, config.clone())
    }

    /// Attaches an event sender.
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Shell entity.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current orientation.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.orientation
    }

    /// Flight path.
    #[must_use]
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Whether the shell has gone off.
    #[must_use]
    pub fn is_detonated(&self) -> bool {
        self.trajectory.detonated
    }

    /// Fixed-tick update. Detonates on arrival at the landing point.
    pub fn tick(&mut self, dt: f32, ctx: &mut ShellContext<'_>) -> Option<DamageEvent> {
        let update = self.trajectory.advance(dt)?;
        self.position = update.position;
        self.orientation = (self.orientation * tumble_step(update.spin)).normalize();

        if update.arrived && self.position == self.trajectory.landing {
            return self.detonate(DetonationReason::Landed, ctx);
        }
        None
    }

    /// Whether touching `contact` sets the shell off.
    #[must_use]
    pub fn triggers_on(&self, contact: &Contact) -> bool {
        match contact.tag {
            ContactTag::Player => true,
            ContactTag::Enemy => false,
            ContactTag::Untagged => !self.config.bypass_layers.contains(&contact.layer),
        }
    }

    /// Collision callback.
    pub fn on_collision(
        &mut self,
        contact: &Contact,
        ctx: &mut ShellContext<'_>,
    ) -> Option<DamageEvent> {
        if !self.triggers_on(contact) {
            return None;
        }
        let reason = if contact.tag == ContactTag::Player {
            DetonationReason::PlayerContact
        } else {
            DetonationReason::Impact
        };
        self.detonate(reason, ctx)
    }

    /// Detonates the shell once. Later calls return `None`.
    ///
    /// Hides the shell, damages the first target-layer entity in splash
    /// range (only that one), starts the impact effect and schedules removal.
    pub fn detonate(
        &mut self,
        reason: DetonationReason,
        ctx: &mut ShellContext<'_>,
    ) -> Option<DamageEvent> {
        if self.trajectory.detonated {
            return None;
        }
        self.trajectory.detonated = true;
        self.trajectory.armed = false;

        ctx.host.set_presence(self.entity, false);

        let target = ctx
            .terrain
            .overlap_sphere(self.position, self.config.splash_range, self.config.target_mask)
            .first()
            .map(|overlap| overlap.entity);
        if let Some(target) = target {
            ctx.damage.apply_damage(target, self.config.damage);
        }

        ctx.host.activate_effect(self.entity);
        ctx.host.destroy_after(self.entity, self.config.destroy_delay);

        debug!(
            "Shell {} detonated ({:?}) at {:?}, hit {:?}",
            self.entity, reason, self.position, target
        );
        self.events.publish(GameEvent::ShellDetonated {
            entity_id: self.entity,
            position: self.position,
            reason,
            damaged: target,
        });

        Some(DamageEvent {
            shell: self.entity,
            position: self.position,
            reason,
            target,
            amount: if target.is_some() { self.config.damage } else { 0 },
        })
    }
}

/// Local rotation for one step of tumble given in Euler degrees.
fn tumble_step(degrees: Vec3) -> Quat {
    let radians = degrees * (std::f32::consts::PI / 180.0);
    Quat::from_euler(glam::EulerRot::ZXY, radians.z, radians.x, radians.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{Island, ScriptedTarget};
    use tidebreak_common::random::seeded;

    fn ready_shell(island: &Island, landing: Vec3) -> Shell {
        let mut host = island.host();
        let entity = host.instantiate(PrefabId::SHELL, Vec3::ZERO, Quat::IDENTITY, None);
        let trajectory = Trajectory::through(Vec3::new(0.0, 1.0, 0.0), landing, 5.0, 1.0);
        Shell::new(entity, trajectory, ShellConfig::default())
    }

    #[test]
    fn test_lands_and_detonates_once() {
        let island = Island::flat(0.0);
        let player = island.add_actor(Vec3::new(6.0, 0.0, 0.0), Layer::PLAYER);
        let mut shell = ready_shell(&island, Vec3::new(6.0, -0.2, 0.0));
        let (mut host, mut sink) = (island.host(), island.host());
        let mut ctx = ShellContext {
            host: &mut host,
            terrain: &island,
            damage: &mut sink,
        };

        let mut events = Vec::new();
        for _ in 0..60 {
            if let Some(event) = shell.tick(1.0 / 50.0, &mut ctx) {
                events.push(event);
            }
        }

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason, DetonationReason::Landed);
        assert_eq!(events[0].target, Some(player));
        assert_eq!(island.damage_log(), vec![(player, 5)]);
        assert_eq!(island.delayed_destroys(), vec![(shell.entity(), 2.0)]);
    }

    #[test]
    fn test_tumble_composes_each_step() {
        let island = Island::flat(0.0);
        let mut host = island.host();
        let entity = host.instantiate(PrefabId::SHELL, Vec3::ZERO, Quat::IDENTITY, None);
        let trajectory = Trajectory::through(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 5.0, 5.0)
            .with_spin(Vec3::new(90.0, 90.0, 0.0), 1.0);
        let mut shell = Shell::new(entity, trajectory, ShellConfig::default());
        let mut sink = island.host();
        let mut ctx = ShellContext {
            host: &mut host,
            terrain: &island,
            damage: &mut sink,
        };

        assert!(shell.tick(0.5, &mut ctx).is_none());
        assert!(shell.tick(0.5, &mut ctx).is_none());

        let step = tumble_step(Vec3::new(45.0, 45.0, 0.0));
        let summed = tumble_step(Vec3::new(90.0, 90.0, 0.0));
        assert!(shell.rotation().abs_diff_eq(step * step, 1e-4));
        assert!(!shell.rotation().abs_diff_eq(summed, 1e-2));
    }

    #[test]
    fn test_detonate_is_idempotent() {
        let island = Island::flat(0.0);
        island.add_actor(Vec3::ZERO, Layer::PLAYER);
        let mut shell = ready_shell(&island, Vec3::new(4.0, 0.0, 0.0));
        let (mut host, mut sink) = (island.host(), island.host());
        let mut ctx = ShellContext {
            host: &mut host,
            terrain: &island,
            damage: &mut sink,
        };

        assert!(shell.detonate(DetonationReason::Forced, &mut ctx).is_some());
        assert!(shell.detonate(DetonationReason::Forced, &mut ctx).is_none());
        let contact = Contact {
            entity: EntityId::from_raw(999),
            tag: ContactTag::Player,
            layer: Layer::PLAYER,
        };
        assert!(shell.on_collision(&contact, &mut ctx).is_none());

        assert_eq!(island.damage_log().len(), 1);
        assert_eq!(island.delayed_destroys().len(), 1);
        // No movement after detonation
        assert!(shell.tick(0.1, &mut ctx).is_none());
        assert_eq!(shell.position(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_only_first_target_is_damaged() {
        let island = Island::flat(0.0);
        let first = island.add_actor(Vec3::new(0.2, 1.0, 0.0), Layer::PLAYER);
        island.add_actor(Vec3::new(-0.2, 1.0, 0.0), Layer::PLAYER);
        island.add_actor(Vec3::new(0.0, 1.3, 0.2), Layer::PLAYER);
        let mut shell = ready_shell(&island, Vec3::new(4.0, 0.0, 0.0));
        let (mut host, mut sink) = (island.host(), island.host());
        let mut ctx = ShellContext {
            host: &mut host,
            terrain: &island,
            damage: &mut sink,
        };

        let event = shell
            .detonate(DetonationReason::Forced, &mut ctx)
            .expect("first detonation");
        assert_eq!(event.target, Some(first));
        assert_eq!(island.damage_log(), vec![(first, 5)]);
    }

    #[test]
    fn test_detonation_hides_and_starts_effect() {
        let island = Island::flat(0.0);
        let mut shell = ready_shell(&island, Vec3::new(4.0, 0.0, 0.0));
        let (mut host, mut sink) = (island.host(), island.host());
        let mut ctx = ShellContext {
            host: &mut host,
            terrain: &island,
            damage: &mut sink,
        };

        let event = shell
            .detonate(DetonationReason::Impact, &mut ctx)
            .expect("detonated");
        assert_eq!(event.target, None);
        assert_eq!(event.amount, 0);

        let entity = island.entity(shell.entity()).expect("still in scene");
        assert!(!entity.present);
        assert!(entity.effect_active);
        assert_eq!(entity.destroy_in, Some(2.0));
    }

    #[test]
    fn test_collision_filter() {
        let island = Island::flat(0.0);
        let shell = ready_shell(&island, Vec3::X);
        let contact = |tag, layer| Contact {
            entity: EntityId::from_raw(7),
            tag,
            layer,
        };

        assert!(shell.triggers_on(&contact(ContactTag::Player, Layer::PLAYER)));
        assert!(shell.triggers_on(&contact(ContactTag::Player, Layer::GROUND)));
        assert!(!shell.triggers_on(&contact(ContactTag::Enemy, Layer::DEFAULT)));
        assert!(!shell.triggers_on(&contact(ContactTag::Untagged, Layer::GROUND)));
        assert!(!shell.triggers_on(&contact(ContactTag::Untagged, Layer::TRIGGER)));
        assert!(shell.triggers_on(&contact(ContactTag::Untagged, Layer::DEFAULT)));
        assert!(shell.triggers_on(&contact(ContactTag::Untagged, Layer::WATER)));
    }

    #[test]
    fn test_fire_instantiates_and_aims() {
        let island = Island::flat(1.0);
        let target = ScriptedTarget::new(Vec3::new(10.0, 1.0, 0.0), Vec3::ZERO);
        let config = ShellConfig {
            prediction_range: 0.0,
            ..ShellConfig::default()
        };
        let (mut host, mut sink) = (island.host(), island.host());
        let mut ctx = ShellContext {
            host: &mut host,
            terrain: &island,
            damage: &mut sink,
        };
        let mut rng = seeded(Some(3));

        let launch = Vec3::new(0.0, 1.5, 0.0);
        let shell = Shell::fire(launch, &target, None, &mut ctx, &config, &mut rng);

        assert_eq!(island.entities_of(PrefabId::SHELL).len(), 1);
        let landing = shell.trajectory().landing;
        assert!((landing - Vec3::new(10.0, 0.8, 0.0)).length() < 1e-4);
    }
}
