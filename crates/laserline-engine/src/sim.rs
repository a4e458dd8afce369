//! Headless match driver.
//!
//! Runs a full match against the gameplay core at a fixed timestep, with a
//! scripted autopilot standing in for the human player, and reports the
//! outcome.

use serde::Serialize;
use tracing::{debug, info};

use laserline_common::{EntityId, Vec2};
use laserline_gameplay::{
    Aim, EntityKind, EventHandler, GameOverState, GameplayManager, InputSnapshot, MatchStats,
    PresentationEvent,
};

use crate::config::EngineConfig;

/// Distance under which the autopilot backs away from an enemy.
const RETREAT_DISTANCE: f32 = 2.0;

/// Seconds between autopilot talk attempts.
const TALK_INTERVAL: f32 = 5.0;

/// Scripted stand-in for the human player.
///
/// Shoots the best visible enemy, backs away from anything too close and
/// otherwise strafes around the arena center. It presses the action button
/// every few seconds to talk to nearby NPCs.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    strafe: f32,
    last_talk: f32,
    action_held: bool,
}

impl Autopilot {
    /// Creates an autopilot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces the raw input for the next tick.
    pub fn next_input(&mut self, manager: &GameplayManager, dt: f32) -> InputSnapshot {
        let Some(player) = manager.player() else {
            return InputSnapshot::default();
        };
        let Ok(entity) = manager.entity(player) else {
            return InputSnapshot::default();
        };
        let position = entity.position();
        self.strafe += dt;

        let target = manager
            .targets_on_sight(player, &[EntityKind::Npc])
            .into_iter()
            .find_map(|id| manager.entity(id).ok().map(|e| (id, e.position())));

        let mut snapshot = InputSnapshot::default();
        match target {
            Some((id, target_pos)) => {
                snapshot.aim = Aim::Point(target_pos);
                snapshot.shoot_held = true;
                let offset = position - target_pos;
                snapshot.movement = if offset.length() < RETREAT_DISTANCE {
                    offset.try_normalize().unwrap_or(Vec2::Y)
                } else {
                    Vec2::from_angle(self.strafe).perp() * 0.5
                };
                debug!(enemy = %id, "autopilot engaging");
            },
            None => {
                let home = manager.bounds().center() + Vec2::from_angle(self.strafe * 0.5) * 2.0;
                snapshot.movement = (home - position).clamp_length_max(1.0);
                snapshot.aim = Aim::Direction(snapshot.movement);
            },
        }

        let now = manager.time();
        self.action_held = !self.action_held && now - self.last_talk >= TALK_INTERVAL;
        if self.action_held {
            self.last_talk = now;
        }
        snapshot.action_held = self.action_held;
        snapshot
    }
}

/// Counts presentation events as they are drained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventTally {
    /// Shots fired by anyone
    pub shots: u32,
    /// Hit flashes
    pub hits: u32,
    /// Dialogue lines spoken
    pub dialogues: u32,
    /// Completed deaths
    pub deaths: u32,
    /// Camera shakes requested
    pub camera_shakes: u32,
}

impl EventHandler for EventTally {
    fn handle(&mut self, event: &PresentationEvent) {
        match event {
            PresentationEvent::ShotFired { .. } => self.shots += 1,
            PresentationEvent::HitFlash { .. } => self.hits += 1,
            PresentationEvent::Dialogue { .. } => self.dialogues += 1,
            PresentationEvent::EntityDied { .. } => self.deaths += 1,
            PresentationEvent::CameraShake => self.camera_shakes += 1,
            _ => {},
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    /// Final outcome, `None` if the time cap hit first
    pub outcome: GameOverState,
    /// Whether the outro finished
    pub match_ended: bool,
    /// Simulated seconds
    pub seconds: f32,
    /// Ticks run
    pub ticks: u64,
    /// Match counters
    pub stats: MatchStats,
    /// Presentation event counts
    pub events: EventTally,
    /// Debug labels of the entities left in the world
    pub survivors: Vec<String>,
}

/// Owns the world and the autopilot for one run.
#[derive(Debug)]
pub struct Simulation {
    manager: GameplayManager,
    autopilot: Autopilot,
    tally: EventTally,
    timestep: f32,
    max_ticks: u64,
    ticks: u64,
}

impl Simulation {
    /// Creates a simulation and starts the match.
    pub fn new(config: &EngineConfig) -> anyhow::Result<Self> {
        let mut manager = GameplayManager::new(config.gameplay.clone(), config.seed);
        let player = manager.start_match()?;
        info!(%player, seed = config.seed, "simulation ready");

        Ok(Self {
            manager,
            autopilot: Autopilot::new(),
            tally: EventTally::default(),
            timestep: config.fixed_timestep,
            max_ticks: config.max_ticks(),
            ticks: 0,
        })
    }

    /// Returns the world.
    #[must_use]
    pub fn manager(&self) -> &GameplayManager {
        &self.manager
    }

    /// Runs one tick. Returns false once the run is over.
    pub fn step(&mut self) -> bool {
        if self.manager.match_ended() || self.ticks >= self.max_ticks {
            return false;
        }
        let input = self.autopilot.next_input(&self.manager, self.timestep);
        self.manager.advance(self.timestep, &input);
        self.manager.events().dispatch(&mut self.tally);
        self.ticks += 1;
        true
    }

    /// Runs until the outro finishes or the tick cap is reached.
    pub fn run(&mut self) -> MatchReport {
        while self.step() {}
        let report = self.report();
        info!(
            outcome = ?report.outcome,
            seconds = report.seconds,
            killed = report.stats.killed_creatures,
            "simulation finished"
        );
        report
    }

    /// Summarizes the run so far.
    #[must_use]
    pub fn report(&self) -> MatchReport {
        let survivors = self
            .manager
            .entities()
            .filter(|(_, e)| e.is_active())
            .map(|(_, e)| e.debug_label())
            .collect();

        MatchReport {
            outcome: self.manager.game_over_state(),
            match_ended: self.manager.match_ended(),
            seconds: self.manager.time(),
            ticks: self.ticks,
            stats: *self.manager.stats(),
            events: self.tally.clone(),
            survivors,
        }
    }

    /// Returns the entity the autopilot controls.
    #[must_use]
    pub fn player(&self) -> Option<EntityId> {
        self.manager.player()
    }
}
