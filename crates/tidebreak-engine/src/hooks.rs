//! Headless stand-ins for the level flow, HUD and weapon presentation.
//!
//! Everything a renderer or UI would show is written to the log instead.

use tidebreak_common::IslandId;
use tidebreak_gameplay::{LevelHooks, Presentation, SoundCue, WeaponActions, WeaponIcon, WeaponId};
use tracing::{debug, info, trace};

/// Level progression and HUD state, logged.
#[derive(Debug, Default)]
pub struct LevelLog {
    /// Islands cleared so far
    pub cleared: Vec<IslandId>,
    /// Counter text currently shown, if visible
    pub counter: Option<i32>,
    counter_visible: bool,
    last_counter: i32,
}

impl LevelHooks for LevelLog {
    fn mark_island_cleared(&mut self) {
        info!("Dock marked as cleared");
    }

    fn advance_level(&mut self, island: IslandId) {
        info!("Level advanced past island {}", island.raw());
        self.cleared.push(island);
    }

    fn show_timed_message(&mut self, text: &str) {
        info!("Message: {}", text.replace("\r\n", " "));
    }

    fn retarget_navigation(&mut self, toward_boat: bool) {
        debug!(toward_boat, "Compass retargeted");
    }

    fn set_spawn_counter_visible(&mut self, visible: bool) {
        self.counter_visible = visible;
        self.counter = visible.then_some(self.last_counter);
    }

    fn set_spawn_counter_text(&mut self, remaining: i32) {
        self.last_counter = remaining;
        if self.counter_visible {
            self.counter = Some(remaining);
            debug!(remaining, "Emitters left");
        }
    }
}

/// Animation, audio and HUD icon effects, logged.
#[derive(Debug, Default)]
pub struct PresentationLog;

impl Presentation for PresentationLog {
    fn trigger_draw_animation(&mut self, weapon: WeaponId) {
        trace!(?weapon, "Draw animation");
    }

    fn play_sfx(&mut self, cue: SoundCue) {
        trace!(?cue, "Sound");
    }

    fn swap_weapon_icon(&mut self, icon: WeaponIcon) {
        debug!(?icon, "Weapon icon");
    }
}

/// Queues the player's shots for the battle to resolve.
#[derive(Debug, Default)]
pub struct Gunnery {
    pending: Vec<WeaponId>,
}

impl Gunnery {
    /// Takes the shots fired since the last call.
    pub fn drain(&mut self) -> Vec<WeaponId> {
        std::mem::take(&mut self.pending)
    }
}

impl WeaponActions for Gunnery {
    fn fire(&mut self, weapon: WeaponId) {
        self.pending.push(weapon);
    }
}
