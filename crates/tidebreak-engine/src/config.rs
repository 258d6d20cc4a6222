//! Driver configuration.
//!
//! Run settings for the headless battle plus the full gameplay tuning.
//! Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tidebreak_common::{ConfigError, TidebreakResult};
use tidebreak_gameplay::GameplayConfig;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "tidebreak.toml";

/// Battle simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Run Settings ===
    /// Seed for every random draw (None = random)
    pub seed: Option<u64>,
    /// Frames per second
    pub frame_rate: u32,
    /// Fixed steps per second
    pub fixed_rate: u32,
    /// Time limit in seconds
    pub duration: f32,

    // === Island ===
    /// Radius of the island's ground
    pub island_radius: f32,
    /// Height of the island's peak
    pub island_peak: f32,
    /// Emitters the player must destroy
    pub kill_target: u32,
    /// Hits an emitter takes before it is destroyed
    pub emitter_health: i32,
    /// Seconds between shells from one emitter
    pub volley_interval: f32,

    // === Player ===
    /// Distance of the boat's circle from the island center
    pub boat_orbit: f32,
    /// Boat speed in units per second
    pub boat_speed: f32,
    /// Reach of the player's guns
    pub weapon_range: f32,
    /// When the blunderbuss is picked up (None = never)
    pub splash_unlock_time: Option<f32>,

    // === Gameplay ===
    /// Combat tuning
    pub gameplay: GameplayConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Run
            seed: Some(7),
            frame_rate: 60,
            fixed_rate: 50,
            duration: 120.0,

            // Island
            island_radius: 20.0,
            island_peak: 4.0,
            kill_target: 4,
            emitter_health: 3,
            volley_interval: 3.0,

            // Player
            boat_orbit: 26.0,
            boat_speed: 4.0,
            weapon_range: 45.0,
            splash_unlock_time: Some(20.0),

            gameplay: GameplayConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match Self::parse(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("{e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> TidebreakResult<()> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.frame_rate = self.frame_rate.clamp(10, 240);
        self.fixed_rate = self.fixed_rate.clamp(10, 240);
        self.duration = self.duration.clamp(1.0, 3600.0);

        self.island_radius = self.island_radius.clamp(4.0, 500.0);
        self.island_peak = self.island_peak.max(self.gameplay.wave.sea_level + 0.5);
        self.emitter_health = self.emitter_health.max(1);
        self.volley_interval = self.volley_interval.max(0.1);

        self.boat_orbit = self.boat_orbit.max(self.island_radius);
        self.boat_speed = self.boat_speed.max(0.0);
        self.weapon_range = self.weapon_range.max(0.0);

        self.gameplay.validate();
    }

    /// Seconds per frame.
    #[must_use]
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}
