//! Mortar arc with predictive targeting.
//!
//! A [`Trajectory`] is fixed at launch: three control points (launch, apex,
//! landing) and a travel time. The landing point leads the target along its
//! velocity by a random fraction, picks up some horizontal scatter so salvos
//! fan out, and is then dropped onto the terrain with a downward probe.
//!
//! Position along the arc is two levels of linear interpolation that reuse
//! the same blend factor, so horizontal travel is linear in time while the
//! climb and drop are not. Gameplay timing is tuned against this exact curve.

use glam::Vec3;
use tracing::{trace, warn};

use tidebreak_common::random::range_f32;

use crate::config::ShellConfig;
use crate::ports::{KinematicsSource, TerrainQuery};

/// Upper bound for each spin axis component (degrees).
const SPIN_AXIS_MAX: f32 = 360.0;
/// Spin speed range.
const SPIN_SPEED_MIN: f32 = 0.1;
const SPIN_SPEED_MAX: f32 = 10.0;

/// Snapshot of the target used to aim a single shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionSample {
    /// Target position at launch
    pub target_position: Vec3,
    /// Target velocity at launch
    pub target_velocity: Vec3,
    /// Maximum lead factor; the actual factor is drawn from `[0, intensity)`
    pub intensity: f32,
    /// Horizontal scatter half-range on x and z
    pub lateral_jitter: f32,
}

impl PredictionSample {
    /// Samples a target's kinematics with the configured lead and scatter.
    #[must_use]
    pub fn observe(target: &dyn KinematicsSource, config: &ShellConfig) -> Self {
        Self {
            target_position: target.position(),
            target_velocity: target.velocity(),
            intensity: config.prediction_intensity,
            lateral_jitter: config.prediction_range,
        }
    }
}

/// One step of movement along the arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionUpdate {
    /// New world position
    pub position: Vec3,
    /// Euler rotation to add this step (degrees)
    pub spin: Vec3,
    /// Whether this step reached the landing point
    pub arrived: bool,
}

/// Flight path of one shell.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// Launch point
    pub launch: Vec3,
    /// Apex control point
    pub apex: Vec3,
    /// Predicted landing point
    pub landing: Vec3,
    /// Normalized travel progress in `[0, 1]`
    pub elapsed: f32,
    /// Seconds from launch to landing
    pub duration: f32,
    /// Tumble axis (each component in degrees)
    pub spin_axis: Vec3,
    /// Tumble speed multiplier
    pub spin_speed: f32,
    /// Whether the shell is in flight
    pub armed: bool,
    /// Whether the shell has gone off
    pub detonated: bool,
}

impl Trajectory {
    /// Plans the arc from `launch` toward the sampled target.
    pub fn create(
        launch: Vec3,
        sample: &PredictionSample,
        terrain: &dyn TerrainQuery,
        config: &ShellConfig,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let landing = predict_landing(launch, sample, terrain, config, rng);
        let spin_axis = Vec3::new(
            range_f32(rng, 0.0, SPIN_AXIS_MAX),
            range_f32(rng, 0.0, SPIN_AXIS_MAX),
            range_f32(rng, 0.0, SPIN_AXIS_MAX),
        );
        let spin_speed = range_f32(rng, SPIN_SPEED_MIN, SPIN_SPEED_MAX);

        Self::through(launch, landing, config.arc_height, config.travel_time)
            .with_spin(spin_axis, spin_speed)
    }

    /// Builds an armed arc between two known points with no tumble.
    #[must_use]
    pub fn through(launch: Vec3, landing: Vec3, height: f32, duration: f32) -> Self {
        Self {
            launch,
            apex: apex_between(launch, landing, height),
            landing,
            elapsed: 0.0,
            duration: duration.max(f32::EPSILON),
            spin_axis: Vec3::ZERO,
            spin_speed: 0.0,
            armed: true,
            detonated: false,
        }
    }

    /// Sets the tumble.
    #[must_use]
    pub fn with_spin(mut self, axis: Vec3, speed: f32) -> Self {
        self.spin_axis = axis;
        self.spin_speed = speed;
        self
    }

    /// Evaluates the arc at progress `t` (clamped to `[0, 1]`).
    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        if t >= 1.0 {
            return self.landing;
        }
        let m1 = self.launch.lerp(self.apex, t);
        let m2 = self.apex.lerp(self.landing, t);
        m1.lerp(m2, t)
    }

    /// Current position on the arc.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.point_at(self.elapsed)
    }

    /// Whether progress has reached the landing point.
    #[must_use]
    pub fn has_arrived(&self) -> bool {
        self.elapsed >= 1.0
    }

    /// Moves the shell `dt` seconds along the arc.
    ///
    /// Returns `None` once the shell has landed, detonated, or is not armed.
    pub fn advance(&mut self, dt: f32) -> Option<PositionUpdate> {
        if !self.armed || self.detonated || self.has_arrived() {
            return None;
        }

        self.elapsed = (self.elapsed + dt.max(0.0) / self.duration).min(1.0);
        Some(PositionUpdate {
            position: self.position(),
            spin: self.spin_axis * dt * self.spin_speed,
            arrived: self.has_arrived(),
        })
    }
}

/// Apex control point: midpoint raised by `height`.
fn apex_between(launch: Vec3, landing: Vec3, height: f32) -> Vec3 {
    launch + (landing - launch) / 2.0 + Vec3::Y * height
}

fn predict_landing(
    launch: Vec3,
    sample: &PredictionSample,
    terrain: &dyn TerrainQuery,
    config: &ShellConfig,
    rng: &mut fastrand::Rng,
) -> Vec3 {
    let lead = range_f32(rng, 0.0, sample.intensity);
    let mut landing = sample.target_position + sample.target_velocity * lead;
    landing.x += range_f32(rng, -sample.lateral_jitter, sample.lateral_jitter);
    landing.z += range_f32(rng, -sample.lateral_jitter, sample.lateral_jitter);
    landing.y += config.probe_lift;

    match terrain.raycast_down(landing, config.probe_distance, config.ignore_mask.inverted()) {
        Some(hit) => {
            landing.y = hit.point.y - config.ground_sink;
            trace!("Shell landing resolved at {:?} (lead {:.2})", landing, lead);
        },
        None => {
            // No ground under the predicted point: stay level with the launcher
            warn!(
                "Ground probe missed at ({:.2}, {:.2}), using launch height",
                landing.x, landing.z
            );
            landing.y = launch.y;
        },
    }
    landing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{Island, ScriptedTarget};
    use proptest::prelude::*;
    use tidebreak_common::random::seeded;

    const EPS: f32 = 1e-4;

    fn sample_at(position: Vec3, velocity: Vec3) -> PredictionSample {
        PredictionSample {
            target_position: position,
            target_velocity: velocity,
            intensity: 0.0,
            lateral_jitter: 0.0,
        }
    }

    #[test]
    fn test_apex_is_raised_midpoint() {
        let arc = Trajectory::through(Vec3::ZERO, Vec3::new(10.0, 2.0, 0.0), 5.0, 2.0);
        assert!(arc.apex.abs_diff_eq(Vec3::new(5.0, 6.0, 0.0), EPS));
    }

    #[test]
    fn test_landing_snaps_below_ground() {
        let island = Island::flat(3.0);
        let mut rng = seeded(Some(4));
        let config = ShellConfig::default();
        let arc = Trajectory::create(
            Vec3::new(0.0, 3.5, 0.0),
            &sample_at(Vec3::new(8.0, 3.0, 1.0), Vec3::ZERO),
            &island,
            &config,
            &mut rng,
        );

        assert!((arc.landing.y - (3.0 - config.ground_sink)).abs() < EPS);
        assert!((arc.landing.x - 8.0).abs() < EPS);
        assert!((arc.landing.z - 1.0).abs() < EPS);
    }

    #[test]
    fn test_terrain_miss_falls_back_to_launch_height() {
        let island = Island::empty();
        let mut rng = seeded(Some(4));
        let arc = Trajectory::create(
            Vec3::new(0.0, 7.0, 0.0),
            &sample_at(Vec3::new(8.0, 3.0, 1.0), Vec3::ZERO),
            &island,
            &ShellConfig::default(),
            &mut rng,
        );
        assert!((arc.landing.y - 7.0).abs() < EPS);
    }

    #[test]
    fn test_prediction_leads_moving_target() {
        let island = Island::flat(0.0);
        let target = ScriptedTarget::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0));
        let config = ShellConfig {
            prediction_intensity: 1.0,
            prediction_range: 0.0,
            ..ShellConfig::default()
        };
        let sample = PredictionSample::observe(&target, &config);
        let mut rng = seeded(Some(99));

        for _ in 0..32 {
            let launch = Vec3::new(-20.0, 4.0, 0.0);
            let arc = Trajectory::create(launch, &sample, &island, &config, &mut rng);
            // Lead factor is in [0, 1) so the landing sits between now and one second ahead
            assert!(arc.landing.x >= 0.0 && arc.landing.x < 10.0);
            assert!(arc.landing.z.abs() < EPS);
        }
    }

    #[test]
    fn test_salvo_is_not_collinear() {
        let island = Island::flat(0.0);
        let target = ScriptedTarget::new(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0));
        let config = ShellConfig::default();
        let sample = PredictionSample::observe(&target, &config);
        let mut rng = seeded(Some(5));

        let landings: Vec<Vec3> = (0..3)
            .map(|_| {
                let launch = Vec3::new(-10.0, 2.0, 0.0);
                Trajectory::create(launch, &sample, &island, &config, &mut rng).landing
            })
            .collect();
        let a = landings[1] - landings[0];
        let b = landings[2] - landings[0];
        assert!(a.cross(b).length() > 1e-6);
    }

    #[test]
    fn test_spin_ranges() {
        let island = Island::flat(0.0);
        let mut rng = seeded(Some(11));
        for _ in 0..16 {
            let arc = Trajectory::create(
                Vec3::ZERO,
                &sample_at(Vec3::X, Vec3::ZERO),
                &island,
                &ShellConfig::default(),
                &mut rng,
            );
            assert!(arc.spin_axis.cmpge(Vec3::ZERO).all());
            assert!(arc.spin_axis.cmplt(Vec3::splat(SPIN_AXIS_MAX)).all());
            assert!(arc.spin_speed >= SPIN_SPEED_MIN && arc.spin_speed < SPIN_SPEED_MAX);
        }
    }

    #[test]
    fn test_full_duration_lands_exactly() {
        let mut arc = Trajectory::through(Vec3::ZERO, Vec3::new(12.0, -1.0, 4.0), 5.0, 2.0);
        let mut last = None;
        for _ in 0..120 {
            if let Some(update) = arc.advance(0.02) {
                last = Some(update);
            }
        }
        let last = last.expect("moved");
        assert!(last.arrived);
        assert_eq!(arc.elapsed, 1.0);
        assert_eq!(last.position, arc.landing);
        assert!(arc.advance(0.02).is_none());
    }

    #[test]
    fn test_overshooting_step_clamps() {
        let mut arc = Trajectory::through(Vec3::ZERO, Vec3::X, 1.0, 1.0);
        let update = arc.advance(5.0).expect("moved");
        assert_eq!(arc.elapsed, 1.0);
        assert_eq!(update.position, Vec3::X);
    }

    #[test]
    fn test_detonated_arc_stops() {
        let mut arc = Trajectory::through(Vec3::ZERO, Vec3::X, 1.0, 1.0);
        arc.detonated = true;
        assert!(arc.advance(0.1).is_none());
        assert_eq!(arc.elapsed, 0.0);
    }

    #[test]
    fn test_spin_scales_with_dt() {
        let mut arc = Trajectory::through(Vec3::ZERO, Vec3::X, 1.0, 1.0)
            .with_spin(Vec3::new(90.0, 0.0, 180.0), 2.0);
        let update = arc.advance(0.5).expect("moved");
        assert!(update.spin.abs_diff_eq(Vec3::new(90.0, 0.0, 180.0), EPS));
    }

    #[test]
    fn test_nested_lerp_matches_quadratic_form() {
        let arc = Trajectory::through(Vec3::ZERO, Vec3::new(8.0, 0.0, 0.0), 4.0, 1.0);
        let t = 0.25;
        let bezier = arc.launch * (1.0 - t) * (1.0 - t)
            + arc.apex * 2.0 * (1.0 - t) * t
            + arc.landing * t * t;
        let nested = arc.launch.lerp(arc.apex, t).lerp(arc.apex.lerp(arc.landing, t), t);
        assert!(arc.point_at(t).abs_diff_eq(nested, EPS));
        assert!(arc.point_at(t).abs_diff_eq(bezier, EPS));
    }

    proptest! {
        #[test]
        fn prop_advance_follows_nested_lerp(
            steps in prop::collection::vec(0.001f32..0.2, 1..40),
            lx in -50.0f32..50.0, lz in -50.0f32..50.0, ly in -5.0f32..5.0,
        ) {
            let landing = Vec3::new(lx, ly, lz);
            let mut arc = Trajectory::through(Vec3::new(0.0, 2.0, 0.0), landing, 5.0, 2.0);
            for dt in steps {
                if let Some(update) = arc.advance(dt) {
                    let t = arc.elapsed;
                    let m1 = arc.launch.lerp(arc.apex, t);
                    let m2 = arc.apex.lerp(arc.landing, t);
                    let expected = if t >= 1.0 { arc.landing } else { m1.lerp(m2, t) };
                    prop_assert!(update.position.abs_diff_eq(expected, 1e-3));
                    prop_assert!((0.0..=1.0).contains(&t));
                }
            }
        }

        #[test]
        fn prop_elapsed_never_decreases(steps in prop::collection::vec(0.0f32..0.5, 1..30)) {
            let mut arc = Trajectory::through(Vec3::ZERO, Vec3::new(6.0, 0.0, 6.0), 3.0, 1.5);
            let mut previous = arc.elapsed;
            for dt in steps {
                arc.advance(dt);
                prop_assert!(arc.elapsed >= previous);
                previous = arc.elapsed;
            }
        }
    }
}
