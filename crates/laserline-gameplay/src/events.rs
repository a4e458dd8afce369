//! Presentation event bus.
//!
//! The gameplay core never touches rendering or audio resources. It publishes
//! [`PresentationEvent`]s that the host drains once per frame.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use laserline_common::{EntityId, Vec2};

use crate::outcome::GameOverState;

/// Sound cue identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// An entity was hit
    Hit,
    /// An entity died
    Death,
    /// A weapon fired
    Shoot,
}

/// Events consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PresentationEvent {
    /// Entity entered hit recovery and should flash
    HitFlash {
        /// Entity ID
        entity_id: EntityId,
    },
    /// Entity opacity changed (hit tint or death fade)
    OpacityChanged {
        /// Entity ID
        entity_id: EntityId,
        /// New opacity in [0, 1]
        opacity: f32,
    },
    /// Play a sound
    Sound {
        /// Cue to play
        cue: SoundCue,
        /// Emitting entity
        entity_id: EntityId,
    },
    /// A shot line was drawn
    ShotFired {
        /// Shooter
        shooter: EntityId,
        /// Shot origin
        from: Vec2,
        /// Shot end point
        to: Vec2,
    },
    /// Shake the camera
    CameraShake,
    /// NPC speaks a line
    Dialogue {
        /// Speaking NPC
        entity_id: EntityId,
        /// Text to show
        message: String,
    },
    /// Entity finished its death sequence and was removed
    EntityDied {
        /// Entity ID
        entity_id: EntityId,
    },
    /// Match outcome decided
    GameOver {
        /// Outcome
        state: GameOverState,
    },
    /// Outro finished; the host may leave the match
    MatchEnded {
        /// Outcome
        state: GameOverState,
    },
}

/// Bounded bus carrying presentation events from the core to the host.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<PresentationEvent>,
    receiver: Receiver<PresentationEvent>,
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
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
        }
    }

    /// Publishes an event. Events are dropped when the bus is full.
    pub fn publish(&self, event: PresentationEvent) {
        if self.sender.try_send(event).is_err() {
            tracing::trace!("presentation bus full, event dropped");
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<PresentationEvent> {
        self.receiver.try_iter().collect()
    }

    /// Drains all pending events into a handler.
    pub fn dispatch(&self, handler: &mut dyn EventHandler) {
        for event in self.receiver.try_iter() {
            handler.handle(&event);
        }
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
    pub fn sender(&self) -> Sender<PresentationEvent> {
        self.sender.clone()
    }
}

/// Receives presentation events drained from the bus.
pub trait EventHandler {
    /// Handles an event.
    fn handle(&mut self, event: &PresentationEvent);
}

impl EventHandler for Vec<PresentationEvent> {
    fn handle(&mut self, event: &PresentationEvent) {
        self.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        bus.publish(PresentationEvent::CameraShake);
        bus.publish(PresentationEvent::HitFlash {
            entity_id: EntityId::new(1, 0),
        });
        assert_eq!(bus.pending_count(), 2);

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], PresentationEvent::CameraShake);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(2);
        for _ in 0..5 {
            bus.publish(PresentationEvent::CameraShake);
        }
        assert_eq!(bus.drain().len(), 2);
    }

    #[test]
    fn test_dispatch_to_handler() {
        let bus = EventBus::new(4);
        bus.publish(PresentationEvent::Sound {
            cue: SoundCue::Shoot,
            entity_id: EntityId::new(0, 0),
        });
        let mut sink: Vec<PresentationEvent> = Vec::new();
        bus.dispatch(&mut sink);
        assert_eq!(sink.len(), 1);
        assert!(bus.drain().is_empty());
    }
}
