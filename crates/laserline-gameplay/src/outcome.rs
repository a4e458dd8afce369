//! Match outcomes.

use serde::{Deserialize, Serialize};

/// Terminal state of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameOverState {
    /// Match still running
    #[default]
    None,
    /// The player died
    PlayerDeath,
    /// Survived after killing more than the genocidal ratio of creatures
    Genocidal,
    /// Every spawner ran dry and every creature was killed
    Extermination,
    /// Survived without crossing the genocidal ratio
    Resistance,
    /// Survived after killing every NPC
    Psychopath,
}

impl GameOverState {
    /// Checks if the match has been decided.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Checks if the player survived the match.
    #[must_use]
    pub const fn is_victory(self) -> bool {
        matches!(
            self,
            Self::Genocidal | Self::Extermination | Self::Resistance | Self::Psychopath
        )
    }
}

/// Running match counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchStats {
    /// Enemies registered during the match
    pub spawned_creatures: u32,
    /// Enemies whose death sequence completed
    pub killed_creatures: u32,
    /// NPCs registered during the match
    pub spawned_npcs: u32,
    /// NPCs whose death sequence completed
    pub killed_npcs: u32,
}

impl MatchStats {
    /// Returns killed / spawned creatures, or 0 when none spawned.
    #[must_use]
    pub fn kill_ratio(&self) -> f32 {
        if self.spawned_creatures == 0 {
            0.0
        } else {
            self.killed_creatures as f32 / self.spawned_creatures as f32
        }
    }

    /// Checks if every spawned NPC was killed.
    #[must_use]
    pub const fn all_npcs_killed(&self) -> bool {
        self.spawned_npcs > 0 && self.killed_npcs >= self.spawned_npcs
    }

    /// Checks if every spawned creature was killed.
    #[must_use]
    pub const fn all_creatures_killed(&self) -> bool {
        self.spawned_creatures > 0 && self.killed_creatures >= self.spawned_creatures
    }
}

/// Classifies a match that reached the victory time.
#[must_use]
pub fn classify_victory(stats: &MatchStats, genocidal_ratio: f32) -> GameOverState {
    if stats.all_npcs_killed() {
        GameOverState::Psychopath
    } else if stats.kill_ratio() > genocidal_ratio {
        GameOverState::Genocidal
    } else {
        GameOverState::Resistance
    }
}
