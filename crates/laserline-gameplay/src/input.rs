//! Player input snapshots.
//!
//! The host polls its devices and hands the core one [`InputSnapshot`] per
//! tick. The [`InputTracker`] turns raw snapshots into [`PlayerCommand`]s:
//! movement with a dead zone, aim, and edge-detected buttons.

use serde::{Deserialize, Serialize};

use laserline_common::Vec2;

/// Where the player is aiming.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Aim {
    /// Aim at a world point (mouse)
    Point(Vec2),
    /// Aim along a direction (stick)
    Direction(Vec2),
}

impl Default for Aim {
    fn default() -> Self {
        Self::Direction(Vec2::ZERO)
    }
}

impl Aim {
    /// Resolves the aim into a direction from `origin`, if it has one.
    #[must_use]
    pub fn direction_from(&self, origin: Vec2) -> Option<Vec2> {
        match *self {
            Self::Point(point) => (point - origin).try_normalize(),
            Self::Direction(dir) => dir.try_normalize(),
        }
    }
}

/// Raw device state for a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Movement axes, each in [-1, 1]
    pub movement: Vec2,
    /// Aim
    pub aim: Aim,
    /// Shoot button held
    pub shoot_held: bool,
    /// Action (talk) button held
    pub action_held: bool,
}

/// State of a button across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// Whether the button is currently held down
    pub pressed: bool,
    /// Whether the button was pressed this tick
    pub just_pressed: bool,
}

impl ButtonState {
    /// Updates the button with its current raw state.
    pub fn update(&mut self, is_pressed: bool) {
        self.just_pressed = is_pressed && !self.pressed;
        self.pressed = is_pressed;
    }
}

/// Processed input the player variant acts on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerCommand {
    /// Movement with the dead zone applied, length at most 1
    pub movement: Vec2,
    /// Aim
    pub aim: Aim,
    /// Shoot held
    pub shoot: bool,
    /// Action pressed this tick
    pub action_pressed: bool,
}

/// Converts snapshots into commands.
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    deadzone: f32,
    shoot: ButtonState,
    action: ButtonState,
}

impl InputTracker {
    /// Creates a tracker with the given movement dead zone.
    #[must_use]
    pub fn new(deadzone: f32) -> Self {
        Self {
            deadzone,
            ..Self::default()
        }
    }

    /// Processes one snapshot.
    pub fn process(&mut self, snapshot: &InputSnapshot) -> PlayerCommand {
        self.shoot.update(snapshot.shoot_held);
        self.action.update(snapshot.action_held);

        let raw = if snapshot.movement.is_finite() {
            snapshot.movement
        } else {
            Vec2::ZERO
        };
        let length = raw.length();
        let movement = if length < self.deadzone {
            Vec2::ZERO
        } else if length > 1.0 {
            raw / length
        } else {
            raw
        };

        PlayerCommand {
            movement,
            aim: snapshot.aim,
            shoot: self.shoot.pressed,
            action_pressed: self.action.just_pressed,
        }
    }

    /// Forgets button history.
    pub fn reset(&mut self) {
        self.shoot = ButtonState::default();
        self.action = ButtonState::default();
    }
}
