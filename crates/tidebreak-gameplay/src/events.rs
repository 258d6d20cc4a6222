//! Event bus for inter-system communication.

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use tidebreak_common::{EntityId, IslandId};

use crate::projectile::DetonationReason;
use crate::weapon::WeaponId;

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Mortar emitter placed on an island
    EmitterPlaced {
        /// Emitter entity
        entity_id: EntityId,
        /// Placement position
        position: Vec3,
    },
    /// Wave finished spawning or respawning
    WaveSpawned {
        /// Island the wave belongs to
        island: IslandId,
        /// Emitters alive after spawning
        emitters: usize,
    },
    /// Wave cleared by the player
    WaveCleared {
        /// Island the wave belonged to
        island: IslandId,
    },
    /// Mortar shell detonated
    ShellDetonated {
        /// Shell entity
        entity_id: EntityId,
        /// Detonation position
        position: Vec3,
        /// What set it off
        reason: DetonationReason,
        /// Entity that took the splash damage (if any)
        damaged: Option<EntityId>,
    },
    /// Player fired a weapon
    WeaponFired {
        /// Weapon fired
        weapon: WeaponId,
    },
    /// Player drew a weapon
    WeaponSwitched {
        /// Weapon now in hand
        weapon: WeaponId,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<GameEvent>,
    /// Receiver for collecting events
    receiver: Receiver<GameEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: GameEvent) {
        // Non-blocking send - if full, event is dropped
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender(Some(self.sender.clone()))
    }
}

/// Optional publishing handle held by gameplay systems.
///
/// Systems built without a bus carry a detached sender that drops everything.
#[derive(Debug, Clone, Default)]
pub struct EventSender(Option<Sender<GameEvent>>);

impl EventSender {
    /// A sender that discards events.
    #[must_use]
    pub const fn detached() -> Self {
        Self(None)
    }

    /// Publishes an event if attached to a bus.
    pub fn publish(&self, event: GameEvent) {
        if let Some(sender) = &self.0 {
            let _ = sender.try_send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(4);
        let sender = bus.sender();
        sender.publish(GameEvent::WeaponFired {
            weapon: WeaponId::Primary,
        });
        bus.publish(GameEvent::WaveCleared {
            island: IslandId::new(2),
        });

        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_events() {
        let bus = EventBus::new(1);
        for _ in 0..3 {
            bus.publish(GameEvent::WeaponSwitched {
                weapon: WeaponId::Splash,
            });
        }
        assert_eq!(bus.drain().len(), 1);
    }

    #[test]
    fn test_detached_sender_is_silent() {
        let sender = EventSender::detached();
        sender.publish(GameEvent::WeaponFired {
            weapon: WeaponId::Secondary,
        });
    }
}
