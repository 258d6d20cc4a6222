//! Gameplay tuning.
//!
//! All values deserialize with defaults, so a partial config file only has to
//! name what it overrides. Call [`GameplayConfig::validate`] after loading.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tidebreak_common::{Layer, LayerMask};

/// Mortar shell tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Damage dealt to the first entity in splash range
    pub damage: i32,
    /// Splash radius around the detonation point
    pub splash_range: f32,
    /// Upper bound of the velocity lead factor (seconds of target motion)
    pub prediction_intensity: f32,
    /// Horizontal inaccuracy added on x and z
    pub prediction_range: f32,
    /// Apex height above the launch/landing midpoint
    pub arc_height: f32,
    /// Seconds from launch to landing
    pub travel_time: f32,
    /// How far above the predicted point the ground probe starts
    pub probe_lift: f32,
    /// How far below the ground surface the landing point sits
    pub ground_sink: f32,
    /// Maximum distance of the ground probe
    pub probe_distance: f32,
    /// Layers the ground probe ignores
    pub ignore_mask: LayerMask,
    /// Layers that can take splash damage
    pub target_mask: LayerMask,
    /// Layers a shell flies through without detonating
    pub bypass_layers: Vec<Layer>,
    /// Seconds between detonation and removal
    pub destroy_delay: f32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            damage: 5,
            splash_range: 1.5,
            prediction_intensity: 1.0,
            prediction_range: 0.5,
            arc_height: 5.0,
            travel_time: 2.0,
            probe_lift: 5.0,
            ground_sink: 0.2,
            probe_distance: 100.0,
            ignore_mask: LayerMask::of(&[Layer::TRIGGER, Layer::PLAYER]),
            target_mask: Layer::PLAYER.mask(),
            bypass_layers: vec![Layer::TRIGGER, Layer::GROUND],
            destroy_delay: 2.0,
        }
    }
}

/// Wave spawner tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Emitters the player has to destroy to clear the island
    pub target_kill_count: u32,
    /// Emitters placed per required kill
    pub spawn_multiplier: f32,
    /// Offset from the ground hit to the emitter origin
    pub height_correction: Vec3,
    /// Ground at or below this height is never used
    pub sea_level: f32,
    /// Free radius required around a placement
    pub clearance_range: f32,
    /// Maximum distance of the placement probe
    pub probe_distance: f32,
    /// Layer emitters stand on
    pub ground_layer: Layer,
    /// Layers the probe and clearance checks ignore
    pub ignore_mask: LayerMask,
    /// Give up after this many samples (None = keep sampling, 0 = place nothing)
    pub max_attempts: Option<u32>,
    /// Seed for placement and yaw draws (None = entropy)
    pub seed: Option<u64>,
    /// Message shown when the island is cleared
    pub cleared_message: String,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            target_kill_count: 4,
            spawn_multiplier: 1.5,
            height_correction: Vec3::new(0.0, 0.35, 0.0),
            sea_level: 0.5,
            clearance_range: 2.0,
            probe_distance: 100.0,
            ground_layer: Layer::GROUND,
            ignore_mask: Layer::TRIGGER.mask(),
            max_attempts: None,
            seed: None,
            cleared_message: "Well done! \r\n Follow the compass to the next island".to_string(),
        }
    }
}

impl WaveConfig {
    /// Emitters placed for `target_kill_count` required kills.
    #[must_use]
    pub fn spawn_count_for(&self, target_kill_count: u32) -> usize {
        (target_kill_count as f32 * self.spawn_multiplier).floor() as usize
    }
}

/// Player weapon timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Reload after drawing either pistol
    pub switch_duration: f32,
    /// Reload after drawing the blunderbuss
    pub splash_reload_duration: f32,
    /// Delay between firing and swapping hands
    pub fire_swap_delay: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            switch_duration: 0.5,
            splash_reload_duration: 1.2,
            fire_swap_delay: 0.05,
        }
    }
}

/// Aim probe placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    /// Probe distance ahead of the wielder
    pub look_forward_amount: f32,
    /// Probe height above the wielder
    pub look_forward_height: f32,
    /// Aim height above ground for the pistols
    pub standard_height_correction: f32,
    /// Aim height above ground for the blunderbuss
    pub splash_height_correction: f32,
    /// Aim height used when the probe finds no ground
    pub min_height: f32,
    /// Maximum distance of the probe
    pub probe_distance: f32,
    /// Layers the probe ignores
    pub ignore_mask: LayerMask,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            look_forward_amount: 2.0,
            look_forward_height: 2.0,
            standard_height_correction: 1.0,
            splash_height_correction: 1.5,
            min_height: 0.3,
            probe_distance: 100.0,
            ignore_mask: LayerMask::of(&[Layer::TRIGGER, Layer::PLAYER]),
        }
    }
}

/// All gameplay tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Mortar shells
    pub shell: ShellConfig,
    /// Wave spawner
    pub wave: WaveConfig,
    /// Player weapons
    pub weapon: WeaponConfig,
    /// Aim tracking
    pub aim: AimConfig,
}

impl GameplayConfig {
    /// Validate and clamp values to ranges the systems can run with.
    pub fn validate(&mut self) {
        let shell = &mut self.shell;
        shell.damage = shell.damage.max(0);
        shell.splash_range = shell.splash_range.max(0.0);
        shell.prediction_intensity = shell.prediction_intensity.max(0.0);
        shell.prediction_range = shell.prediction_range.max(0.0);
        shell.travel_time = shell.travel_time.max(0.01);
        shell.probe_distance = shell.probe_distance.max(shell.probe_lift);
        shell.destroy_delay = shell.destroy_delay.max(0.0);

        let wave = &mut self.wave;
        wave.spawn_multiplier = wave.spawn_multiplier.max(1.0);
        wave.clearance_range = wave.clearance_range.max(0.0);
        wave.probe_distance = wave.probe_distance.max(0.0);

        let weapon = &mut self.weapon;
        weapon.switch_duration = weapon.switch_duration.max(0.0);
        weapon.splash_reload_duration = weapon.splash_reload_duration.max(0.0);
        weapon.fire_swap_delay = weapon.fire_swap_delay.max(0.0);

        self.aim.probe_distance = self.aim.probe_distance.max(0.0);
    }
}
