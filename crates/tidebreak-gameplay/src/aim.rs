//! Weapon aim tracking.
//!
//! Each physics step the held weapon points at a spot on the ground a little
//! ahead of the player, lifted to chest height for the pistols and a bit
//! higher for the blunderbuss.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::AimConfig;
use crate::ports::TerrainQuery;
use crate::weapon::WeaponId;

/// Where the weapon should point this step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimSolution {
    /// World-space aim point
    pub target: Vec3,
    /// Rotation turning the weapon's +Z toward `target`
    pub rotation: Quat,
    /// Whether the probe found ground
    pub grounded: bool,
}

/// Computes weapon aim from a downward probe ahead of the wielder.
#[derive(Debug, Clone, Default)]
pub struct AimTracker {
    config: AimConfig,
}

impl AimTracker {
    /// Creates a tracker.
    #[must_use]
    pub fn new(config: AimConfig) -> Self {
        Self { config }
    }

    /// Aim height above ground for `weapon`.
    #[must_use]
    pub fn height_correction(&self, weapon: WeaponId) -> f32 {
        if weapon == WeaponId::Splash {
            self.config.splash_height_correction
        } else {
            self.config.standard_height_correction
        }
    }

    /// Aims `weapon` held at `wielder` whose body faces `forward`.
    ///
    /// When the probe finds nothing the aim falls back to the probe point at
    /// the configured minimum height.
    #[must_use]
    pub fn aim(
        &self,
        wielder: Vec3,
        forward: Vec3,
        weapon: WeaponId,
        terrain: &dyn TerrainQuery,
    ) -> AimSolution {
        let mut probe = wielder + forward.normalize_or_zero() * self.config.look_forward_amount;
        probe.y += self.config.look_forward_height;

        let hit = terrain.raycast_down(
            probe,
            self.config.probe_distance,
            self.config.ignore_mask.inverted(),
        );
        let (target, grounded) = match hit {
            Some(hit) => (
                hit.point + Vec3::Y * self.height_correction(weapon),
                true,
            ),
            None => (Vec3::new(probe.x, self.config.min_height, probe.z), false),
        };

        AimSolution {
            target,
            rotation: look_rotation(wielder, target),
            grounded,
        }
    }
}

/// Rotation turning +Z from `from` toward `to`, keeping +Y as close to
/// world up as possible.
#[must_use]
pub fn look_rotation(from: Vec3, to: Vec3) -> Quat {
    let forward = (to - from).normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }

    let right = Vec3::Y.cross(forward);
    if right.length_squared() < 1e-8 {
        // Looking straight up or down
        return Quat::from_rotation_arc(Vec3::Z, forward);
    }
    let right = right.normalize();
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::Island;
    use tidebreak_common::Layer;

    fn close(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-4
    }

    #[test]
    fn test_aims_ahead_on_ground() {
        let island = Island::flat(0.0);
        let tracker = AimTracker::default();
        let aim = tracker.aim(Vec3::new(0.0, 0.0, 0.0), Vec3::Z, WeaponId::Primary, &island);

        assert!(aim.grounded);
        assert!(close(aim.target, Vec3::new(0.0, 1.0, 2.0)));
        assert!(close(aim.rotation * Vec3::Z, Vec3::new(0.0, 1.0, 2.0).normalize()));
    }

    #[test]
    fn test_splash_aims_higher() {
        let island = Island::flat(0.0);
        let tracker = AimTracker::default();
        let aim = tracker.aim(Vec3::ZERO, Vec3::X, WeaponId::Splash, &island);
        assert!(close(aim.target, Vec3::new(2.0, 1.5, 0.0)));
    }

    #[test]
    fn test_miss_uses_min_height() {
        let island = Island::empty();
        let tracker = AimTracker::default();
        let aim = tracker.aim(Vec3::new(1.0, 3.0, 1.0), Vec3::X, WeaponId::Secondary, &island);

        assert!(!aim.grounded);
        assert!(close(aim.target, Vec3::new(3.0, 0.3, 1.0)));
    }

    #[test]
    fn test_probe_ignores_player_layer() {
        let island = Island::flat(0.0);
        island.add_actor(Vec3::new(0.0, 0.5, 2.0), Layer::PLAYER);
        let aim = AimTracker::default().aim(Vec3::ZERO, Vec3::Z, WeaponId::Primary, &island);
        assert!(close(aim.target, Vec3::new(0.0, 1.0, 2.0)));
    }

    #[test]
    fn test_look_rotation_keeps_up() {
        let rotation = look_rotation(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0));
        assert!(close(rotation * Vec3::Z, Vec3::X));
        assert!(close(rotation * Vec3::Y, Vec3::Y));

        assert_eq!(look_rotation(Vec3::ONE, Vec3::ONE), Quat::IDENTITY);
        let down = look_rotation(Vec3::ZERO, Vec3::NEG_Y);
        assert!(close(down * Vec3::Z, Vec3::NEG_Y));
    }
}
