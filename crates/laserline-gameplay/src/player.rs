//! Player controller.
//!
//! The player moves with the processed input, aims independently of
//! movement, shoots while the trigger is held and talks to NPCs on the
//! action edge.

use serde::{Deserialize, Serialize};
use tracing::warn;

use laserline_common::{EntityId, Vec2};

use crate::input::PlayerCommand;
use crate::manager::GameplayManager;

/// State of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerState {
    /// Free to move and shoot
    #[default]
    Idle,
    /// Recovering from a hit
    Hit,
    /// Dead
    Death,
}

/// Player-specific state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerControl {
    pub(crate) state: PlayerState,
    pub(crate) previous_state: PlayerState,
    pub(crate) command: PlayerCommand,
}

impl PlayerControl {
    /// Creates an idle player state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns the player state.
    #[must_use]
    pub const fn state(&self) -> PlayerState {
        self.state
    }

    /// Returns the state restored after hit recovery.
    #[must_use]
    pub const fn previous_state(&self) -> PlayerState {
        self.previous_state
    }

    /// Returns the last processed command.
    #[must_use]
    pub const fn command(&self) -> &PlayerCommand {
        &self.command
    }
}

impl GameplayManager {
    /// Runs one tick for the player.
    pub(crate) fn update_player(&mut self, id: EntityId, command: PlayerCommand) {
        if self.paused {
            return;
        }
        let frozen = self.game_over.is_some();

        let Ok(entity) = self.arena.get_mut(id) else {
            return;
        };
        if !entity.active || entity.is_dying() {
            return;
        }
        if frozen {
            entity.body.velocity = Vec2::ZERO;
            return;
        }

        let position = entity.position();
        let speed = entity.max_speed;
        let state = match &mut entity.variant {
            crate::entity::Variant::Player(player) => {
                player.command = command;
                player.state
            },
            _ => return,
        };

        if let Some(aim) = command.aim.direction_from(position) {
            entity.orientation = aim;
        }

        match state {
            PlayerState::Idle => {
                entity.body.velocity = command.movement * speed;
            },
            PlayerState::Hit => {
                entity.body.velocity = Vec2::ZERO;
                self.update_hit(id);
            },
            PlayerState::Death => return,
        }

        if state == PlayerState::Idle && command.shoot && self.can_shoot(id) {
            if let Err(err) = self.shoot(id) {
                warn!(%id, %err, "player shot rejected");
            }
        }

        if command.action_pressed {
            self.on_player_action();
        }
    }
}
