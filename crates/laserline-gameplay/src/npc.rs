//! Passive NPCs.
//!
//! NPCs only wander, flinch when hit and talk when the player asks.

use serde::{Deserialize, Serialize};
use tracing::info;

use laserline_common::EntityId;

use crate::config::NpcTuning;
use crate::entity::Variant;
use crate::events::PresentationEvent;
use crate::manager::GameplayManager;

/// NPC state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcState {
    /// Roaming between random points
    Wandering,
    /// Recovering from a hit
    Hit,
    /// Death fade running
    Dying,
    /// Removed
    Dead,
}

/// NPC-specific state.
#[derive(Debug, Clone, PartialEq)]
pub struct NpcBrain {
    pub(crate) state: NpcState,
    pub(crate) talk_distance: f32,
    pub(crate) message: String,
}

impl NpcBrain {
    /// Creates a wandering NPC brain.
    #[must_use]
    pub fn new(tuning: &NpcTuning) -> Self {
        Self {
            state: NpcState::Wandering,
            talk_distance: tuning.talk_distance,
            message: tuning.message.clone(),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.state = NpcState::Wandering;
    }

    /// Returns the NPC state.
    #[must_use]
    pub const fn state(&self) -> NpcState {
        self.state
    }

    /// Returns the maximum dialogue distance.
    #[must_use]
    pub const fn talk_distance(&self) -> f32 {
        self.talk_distance
    }

    /// Returns the dialogue line.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Checks if the NPC is able to talk.
    #[must_use]
    pub const fn can_talk(&self) -> bool {
        matches!(self.state, NpcState::Wandering | NpcState::Hit)
    }
}

impl GameplayManager {
    /// Runs one tick for an NPC.
    pub(crate) fn update_npc(&mut self, id: EntityId) {
        if self.paused || self.game_over.is_some() {
            return;
        }

        let state = match self.arena.get(id) {
            Ok(entity) if entity.active => match entity.as_npc() {
                Some(npc) => npc.state,
                None => return,
            },
            _ => return,
        };

        match state {
            NpcState::Wandering => self.wander(id),
            NpcState::Hit => self.update_hit(id),
            NpcState::Dying | NpcState::Dead => {},
        }
    }

    /// Makes every NPC within talking distance of the player speak.
    ///
    /// Returns the NPCs that spoke.
    pub fn on_player_action(&mut self) -> Vec<EntityId> {
        let Some(player_pos) = self.player_position() else {
            return Vec::new();
        };

        let mut speakers = Vec::new();
        for &id in &self.npcs {
            let Ok(entity) = self.arena.get(id) else {
                continue;
            };
            let Variant::Npc(npc) = &entity.variant else {
                continue;
            };
            if npc.can_talk() && entity.position().distance(player_pos) < npc.talk_distance {
                info!(%id, message = %npc.message, "npc speaks");
                self.events.publish(PresentationEvent::Dialogue {
                    entity_id: id,
                    message: npc.message.clone(),
                });
                speakers.push(id);
            }
        }
        speakers
    }
}
