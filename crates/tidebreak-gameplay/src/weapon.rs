//! Player weapon state machine.
//!
//! The player carries a pair of pistols fired alternately (primary in the
//! left hand, secondary in the right) and, once picked up, a blunderbuss
//! that deals splash damage. Firing a pistol starts a short swap timer that
//! draws the other pistol. Every draw is followed by a reload during which
//! the player cannot fire.
//!
//! Timers run on a [`Scheduler`] advanced by [`WeaponController::tick`].
//! Any switch cancels every pending timer before starting its own.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::WeaponConfig;
use crate::events::{EventSender, GameEvent};
use crate::ports::{Presentation, SoundCue, WeaponActions, WeaponIcon};
use crate::schedule::{Scheduler, TaskHandle};

/// Weapon slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponId {
    /// Left pistol
    Primary,
    /// Right pistol
    Secondary,
    /// Blunderbuss
    Splash,
}

impl WeaponId {
    /// Every slot, in table order.
    pub const ALL: [WeaponId; 3] = [WeaponId::Primary, WeaponId::Secondary, WeaponId::Splash];

    /// Index into a [`WeaponTable`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            WeaponId::Primary => 0,
            WeaponId::Secondary => 1,
            WeaponId::Splash => 2,
        }
    }

    /// Whether this is one of the pistols.
    #[must_use]
    pub const fn is_standard(self) -> bool {
        matches!(self, WeaponId::Primary | WeaponId::Secondary)
    }
}

/// Errors building a weapon loadout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadoutError {
    /// A slot has no entry
    #[error("no entry for weapon {0:?}")]
    Missing(WeaponId),
    /// A slot has more than one entry
    #[error("weapon {0:?} listed more than once")]
    Duplicate(WeaponId),
}

/// One value per weapon slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponTable<T>([T; 3]);

impl<T> WeaponTable<T> {
    /// Builds a table by calling `f` for every slot.
    pub fn from_fn(mut f: impl FnMut(WeaponId) -> T) -> Self {
        Self(WeaponId::ALL.map(&mut f))
    }

    /// Builds a table from `(slot, value)` pairs; every slot exactly once.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (WeaponId, T)>,
    ) -> Result<Self, LoadoutError> {
        let mut slots: [Option<T>; 3] = [None, None, None];
        for (weapon, value) in entries {
            let slot = &mut slots[weapon.index()];
            if slot.is_some() {
                return Err(LoadoutError::Duplicate(weapon));
            }
            *slot = Some(value);
        }

        let [primary, secondary, splash] = slots;
        Ok(Self([
            primary.ok_or(LoadoutError::Missing(WeaponId::Primary))?,
            secondary.ok_or(LoadoutError::Missing(WeaponId::Secondary))?,
            splash.ok_or(LoadoutError::Missing(WeaponId::Splash))?,
        ]))
    }

    /// Value for `weapon`.
    #[must_use]
    pub fn get(&self, weapon: WeaponId) -> &T {
        &self.0[weapon.index()]
    }

    /// Mutable value for `weapon`.
    pub fn get_mut(&mut self, weapon: WeaponId) -> &mut T {
        &mut self.0[weapon.index()]
    }

    /// Iterates slots with their values.
    pub fn iter(&self) -> impl Iterator<Item = (WeaponId, &T)> {
        WeaponId::ALL.into_iter().zip(self.0.iter())
    }

    /// Mutably iterates slots with their values.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (WeaponId, &mut T)> {
        WeaponId::ALL.into_iter().zip(self.0.iter_mut())
    }
}

impl<T> Index<WeaponId> for WeaponTable<T> {
    type Output = T;

    fn index(&self, weapon: WeaponId) -> &T {
        self.get(weapon)
    }
}

impl<T> IndexMut<WeaponId> for WeaponTable<T> {
    fn index_mut(&mut self, weapon: WeaponId) -> &mut T {
        self.get_mut(weapon)
    }
}

/// Visual and firing state of one weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponSlot {
    /// Slot this state belongs to
    pub weapon_id: WeaponId,
    /// Mesh shown
    pub visual_enabled: bool,
    /// Fire action armed
    pub fire_enabled: bool,
}

impl WeaponSlot {
    /// Hidden, unarmed slot.
    #[must_use]
    pub const fn holstered(weapon_id: WeaponId) -> Self {
        Self {
            weapon_id,
            visual_enabled: false,
            fire_enabled: false,
        }
    }
}

/// Deferred weapon transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeaponTask {
    SwapAfterFire,
    ReloadComplete,
}

/// One frame of attack input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackInput {
    /// Fire button held
    pub fire: bool,
    /// Pistols hotkey pressed this frame
    pub select_standard: bool,
    /// Blunderbuss hotkey pressed this frame
    pub select_splash: bool,
}

/// Collaborators the weapon controller needs.
pub struct WeaponContext<'a> {
    /// Fire actions
    pub actions: &'a mut dyn WeaponActions,
    /// Animation, audio and HUD
    pub presentation: &'a mut dyn Presentation,
}

/// Tracks which weapon is drawn and whether it can fire.
#[derive(Debug)]
pub struct WeaponController {
    slots: WeaponTable<WeaponSlot>,
    active: WeaponId,
    reloading: bool,
    reload_task: Option<TaskHandle>,
    splash_unlocked: bool,
    tasks: Scheduler<WeaponTask>,
    config: WeaponConfig,
    events: EventSender,
}

impl WeaponController {
    /// Creates a controller holding the primary pistol, ready to fire.
    #[must_use]
    pub fn new(config: WeaponConfig) -> Self {
        Self::with_slots(config, WeaponTable::from_fn(WeaponSlot::holstered))
    }

    /// Creates a controller from an explicit slot table.
    ///
    /// The primary pistol is drawn and every other slot is holstered.
    #[must_use]
    pub fn with_slots(config: WeaponConfig, slots: WeaponTable<WeaponSlot>) -> Self {
        let mut controller = Self {
            slots,
            active: WeaponId::Primary,
            reloading: false,
            reload_task: None,
            splash_unlocked: false,
            tasks: Scheduler::new(),
            config,
            events: EventSender::detached(),
        };
        controller.enable_only(WeaponId::Primary);
        controller
    }

    /// Attaches an event sender.
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Weapon currently drawn.
    #[must_use]
    pub fn active(&self) -> WeaponId {
        self.active
    }

    /// Whether firing is blocked.
    #[must_use]
    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    /// Seconds left on the current reload, if one is running.
    #[must_use]
    pub fn reload_remaining(&self) -> Option<f32> {
        self.reload_task.and_then(|task| self.tasks.remaining(task))
    }

    /// State of one slot.
    #[must_use]
    pub fn slot(&self, weapon: WeaponId) -> &WeaponSlot {
        &self.slots[weapon]
    }

    /// Every slot.
    #[must_use]
    pub fn slots(&self) -> &WeaponTable<WeaponSlot> {
        &self.slots
    }

    /// Whether the blunderbuss has been picked up.
    #[must_use]
    pub fn splash_unlocked(&self) -> bool {
        self.splash_unlocked
    }

    /// Fires the active weapon. Returns false while reloading.
    ///
    /// Firing blocks further shots and schedules a swap to the other hand.
    pub fn fire(&mut self, ctx: &mut WeaponContext<'_>) -> bool {
        if self.reloading {
            return false;
        }

        ctx.actions.fire(self.active);
        self.reloading = true;
        self.tasks
            .schedule(self.config.fire_swap_delay, WeaponTask::SwapAfterFire);

        trace!("Fired {:?}", self.active);
        self.events.publish(GameEvent::WeaponFired {
            weapon: self.active,
        });
        true
    }

    /// Switches back to the pistols. Only accepted while holding the
    /// blunderbuss; the draw toggles past the primary and lands on the
    /// secondary pistol.
    pub fn select_standard(&mut self, ctx: &mut WeaponContext<'_>) -> bool {
        if self.active != WeaponId::Splash {
            return false;
        }
        self.active = WeaponId::Primary;
        ctx.presentation.swap_weapon_icon(WeaponIcon::Pistols);
        self.draw_next(ctx);
        true
    }

    /// Switches to the blunderbuss if it is unlocked and not already drawn.
    pub fn select_splash(&mut self, ctx: &mut WeaponContext<'_>) -> bool {
        if self.active == WeaponId::Splash || !self.splash_unlocked {
            return false;
        }
        self.active = WeaponId::Splash;
        ctx.presentation.swap_weapon_icon(WeaponIcon::Blunderbuss);
        self.draw_next(ctx);
        true
    }

    /// Picks up the blunderbuss and draws it.
    pub fn unlock_splash(&mut self, ctx: &mut WeaponContext<'_>) {
        self.splash_unlocked = true;
        self.active = WeaponId::Splash;
        ctx.presentation.swap_weapon_icon(WeaponIcon::Blunderbuss);
        self.draw_next(ctx);
        debug!("Blunderbuss unlocked");
    }

    /// Puts the pistols back in hand after the player respawns.
    /// Keeps the blunderbuss if it was drawn.
    pub fn reset_after_respawn(&mut self, ctx: &mut WeaponContext<'_>) {
        if self.active == WeaponId::Splash {
            return;
        }
        self.tasks.cancel_all();
        self.draw(WeaponId::Secondary, ctx);
    }

    /// Advances timers by `dt` seconds.
    pub fn tick(&mut self, dt: f32, ctx: &mut WeaponContext<'_>) {
        for task in self.tasks.advance(dt) {
            match task {
                WeaponTask::ReloadComplete => {
                    self.reloading = false;
                    self.reload_task = None;
                    trace!("{:?} ready", self.active);
                },
                WeaponTask::SwapAfterFire => {
                    self.draw_next(ctx);
                    // The switch cancelled everything scheduled before it
                    break;
                },
            }
        }
    }

    /// Applies one frame of input: fire first, then the hotkeys.
    pub fn handle_input(&mut self, input: &AttackInput, ctx: &mut WeaponContext<'_>) {
        if input.fire && !self.reloading {
            self.fire(ctx);
        }
        if input.select_standard {
            self.select_standard(ctx);
        }
        if input.select_splash {
            self.select_splash(ctx);
        }
    }

    /// Draws the weapon following `active`: the pistols alternate and the
    /// blunderbuss stays put.
    fn draw_next(&mut self, ctx: &mut WeaponContext<'_>) {
        self.tasks.cancel_all();
        let next = match self.active {
            WeaponId::Primary => WeaponId::Secondary,
            WeaponId::Secondary => WeaponId::Primary,
            WeaponId::Splash => WeaponId::Splash,
        };
        self.draw(next, ctx);
    }

    fn draw(&mut self, weapon: WeaponId, ctx: &mut WeaponContext<'_>) {
        self.active = weapon;
        self.enable_only(weapon);
        ctx.presentation.trigger_draw_animation(weapon);
        self.start_reload(ctx);

        debug!("Drew {:?}", weapon);
        self.events.publish(GameEvent::WeaponSwitched { weapon });
    }

    fn start_reload(&mut self, ctx: &mut WeaponContext<'_>) {
        self.reloading = true;
        ctx.presentation.play_sfx(SoundCue::Reload);
        let duration = if self.active == WeaponId::Splash {
            self.config.splash_reload_duration
        } else {
            self.config.switch_duration
        };
        self.reload_task = Some(self.tasks.schedule(duration, WeaponTask::ReloadComplete));
    }

    fn enable_only(&mut self, weapon: WeaponId) {
        for (id, slot) in self.slots.iter_mut() {
            let drawn = id == weapon;
            slot.visual_enabled = drawn;
            slot.fire_enabled = drawn;
        }
    }
}
