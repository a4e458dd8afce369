//! Enemy AI.
//!
//! Enemies wander until something makes them hostile, then chase the best
//! visible target and run a three-phase melee attack. Hostility decays after
//! a timer. A separate flee mode drives survivors off the field once the
//! match is decided.

use serde::{Deserialize, Serialize};
use tracing::debug;

use laserline_common::{EntityId, Vec2};

use crate::config::EnemyTuning;
use crate::entity::EntityKind;
use crate::manager::GameplayManager;

/// How an enemy currently regards others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reaction {
    /// Reserved, never produced by the AI
    Friendly,
    /// Ignores others
    Neutral,
    /// Pursues visible targets
    Hostile,
}

/// Fixed temperament assigned at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Personality {
    /// Default rules
    #[default]
    Cautious,
    /// Starts hostile and calms back to hostile
    Aggressive,
    /// Never turns hostile from witnessing others
    Peaceful,
}

impl Personality {
    /// Reaction the enemy starts with and decays back to.
    #[must_use]
    pub const fn baseline_reaction(self) -> Reaction {
        match self {
            Self::Aggressive => Reaction::Hostile,
            Self::Cautious | Self::Peaceful => Reaction::Neutral,
        }
    }
}

/// Enemy AI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// Roaming between random points
    Wandering,
    /// Pursuing the target
    Chasing,
    /// Running the attack cycle
    Attacking,
    /// Recovering from a hit
    Hit,
    /// Death fade running
    Dying,
    /// Removed
    Dead,
}

impl EnemyState {
    /// Checks if the enemy is engaged with a target.
    #[must_use]
    pub const fn is_engaged(self) -> bool {
        matches!(self, Self::Chasing | Self::Attacking)
    }
}

/// Sub-phase of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackPhase {
    /// Backward wind-up
    Prepare,
    /// Lunge toward the target
    Execute,
    /// Backstep after the lunge
    Recover,
}

/// Result of advancing an [`AttackCycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackStep {
    /// Still in the same phase
    Hold(AttackPhase),
    /// Just entered a new phase
    Entered(AttackPhase),
    /// The cycle is over
    Finished,
}

/// Resumable attack timer.
///
/// Each phase starts exactly when the previous one was scheduled to end, so
/// phase boundaries do not drift with the tick rate. At most one transition
/// happens per call to [`AttackCycle::advance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackCycle {
    phase: AttackPhase,
    phase_start: f32,
    phase_duration: f32,
}

impl AttackCycle {
    /// Starts a cycle in the Prepare phase.
    #[must_use]
    pub fn begin(now: f32, tuning: &EnemyTuning) -> Self {
        Self {
            phase: AttackPhase::Prepare,
            phase_start: now,
            phase_duration: tuning.attack_preparation,
        }
    }

    /// Starts a cycle directly in the Recover phase.
    #[must_use]
    pub fn recover(now: f32, tuning: &EnemyTuning) -> Self {
        Self {
            phase: AttackPhase::Recover,
            phase_start: now,
            phase_duration: tuning.attack_recover_duration,
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> AttackPhase {
        self.phase
    }

    /// Advances the cycle to `now`.
    pub fn advance(&mut self, now: f32, tuning: &EnemyTuning) -> AttackStep {
        if now - self.phase_start < self.phase_duration {
            return AttackStep::Hold(self.phase);
        }

        let next = match self.phase {
            AttackPhase::Prepare => AttackPhase::Execute,
            AttackPhase::Execute => AttackPhase::Recover,
            AttackPhase::Recover => return AttackStep::Finished,
        };
        self.phase_start += self.phase_duration;
        self.phase_duration = tuning.attack_recover_duration;
        self.phase = next;
        AttackStep::Entered(next)
    }
}

/// Flee sequence data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flee {
    /// Time the flee started
    pub start: f32,
    /// Seconds before the enemy is removed
    pub duration: f32,
    /// Current unit heading
    pub heading: Vec2,
}

/// Enemy-specific state.
#[derive(Debug, Clone)]
pub struct EnemyBrain {
    pub(crate) tuning: EnemyTuning,
    pub(crate) personality: Personality,
    pub(crate) reaction: Reaction,
    pub(crate) reaction_since: Option<f32>,
    pub(crate) reaction_duration: f32,
    pub(crate) state: EnemyState,
    pub(crate) previous_state: EnemyState,
    pub(crate) attack: Option<AttackCycle>,
    pub(crate) flee: Option<Flee>,
}

impl EnemyBrain {
    /// Creates a wandering brain.
    #[must_use]
    pub fn new(tuning: EnemyTuning, personality: Personality) -> Self {
        Self {
            tuning,
            personality,
            reaction: personality.baseline_reaction(),
            reaction_since: None,
            reaction_duration: 0.0,
            state: EnemyState::Wandering,
            previous_state: EnemyState::Wandering,
            attack: None,
            flee: None,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.tuning, self.personality);
    }

    /// Returns the AI state.
    #[must_use]
    pub const fn state(&self) -> EnemyState {
        self.state
    }

    /// Returns the current reaction.
    #[must_use]
    pub const fn reaction(&self) -> Reaction {
        self.reaction
    }

    /// Checks if the enemy is hostile.
    #[must_use]
    pub fn is_hostile(&self) -> bool {
        self.reaction == Reaction::Hostile
    }

    /// Returns the personality.
    #[must_use]
    pub const fn personality(&self) -> Personality {
        self.personality
    }

    /// Returns the running attack cycle.
    #[must_use]
    pub const fn attack(&self) -> Option<&AttackCycle> {
        self.attack.as_ref()
    }

    /// Returns the time the reaction expiry was armed.
    #[must_use]
    pub const fn reaction_since(&self) -> Option<f32> {
        self.reaction_since
    }

    /// Checks if the enemy is fleeing.
    #[must_use]
    pub const fn is_fleeing(&self) -> bool {
        self.flee.is_some()
    }

    /// Turns hostile for `duration` seconds.
    ///
    /// While chasing or attacking the expiry timer is not armed; it starts
    /// when the target is lost.
    pub(crate) fn set_hostile(&mut self, now: f32, duration: f32) {
        self.reaction = Reaction::Hostile;
        self.reaction_duration = duration;
        self.reaction_since = if self.state.is_engaged() { None } else { Some(now) };
    }

    /// Reacts to seeing another enemy get hurt.
    pub(crate) fn witness(&mut self, now: f32) {
        if self.personality == Personality::Peaceful {
            return;
        }
        self.set_hostile(now, self.tuning.hostile_on_sight_duration);
    }

    /// Reverts an expired reaction. Returns true when the reaction changed.
    pub(crate) fn decay_reaction(&mut self, now: f32) -> bool {
        let Some(since) = self.reaction_since else {
            return false;
        };
        if now - since <= self.reaction_duration {
            return false;
        }

        self.reaction = self.personality.baseline_reaction();
        self.reaction_since = None;
        self.attack = None;
        if self.state == EnemyState::Hit {
            self.previous_state = EnemyState::Wandering;
        } else {
            self.state = EnemyState::Wandering;
        }
        true
    }

    pub(crate) fn enter_hit(&mut self) {
        if self.state != EnemyState::Hit {
            self.previous_state = self.state;
        }
        self.state = EnemyState::Hit;
        self.attack = None;
    }

    pub(crate) fn leave_hit(&mut self, now: f32) {
        self.state = match self.previous_state {
            EnemyState::Attacking | EnemyState::Chasing => EnemyState::Chasing,
            _ => EnemyState::Wandering,
        };
        self.set_hostile(now, self.tuning.hostile_on_hit_duration);
    }
}

impl GameplayManager {
    /// Runs one AI tick for an enemy.
    pub(crate) fn update_enemy(&mut self, id: EntityId) {
        if self.paused {
            return;
        }
        let now = self.time;

        let Ok(entity) = self.arena.get_mut(id) else {
            return;
        };
        if !entity.active {
            return;
        }
        let Some(brain) = entity.as_enemy_mut() else {
            return;
        };

        if brain.flee.is_some() {
            self.update_flee(id);
            return;
        }
        if self.game_over.is_some() || brain.state == EnemyState::Dying || brain.state == EnemyState::Dead {
            return;
        }

        let expired = brain.decay_reaction(now);
        let state = brain.state;
        if expired {
            debug!(%id, "reaction expired");
            entity.target = None;
        }

        match state {
            EnemyState::Wandering => self.enemy_wander(id),
            EnemyState::Chasing => self.enemy_chase(id),
            EnemyState::Attacking => self.enemy_attack(id),
            EnemyState::Hit => self.update_hit(id),
            EnemyState::Dying | EnemyState::Dead => {},
        }
    }

    fn enemy_wander(&mut self, id: EntityId) {
        let hostile = self
            .arena
            .get(id)
            .ok()
            .and_then(|e| e.as_enemy())
            .is_some_and(EnemyBrain::is_hostile);

        if hostile {
            if let Some(&target) = self.targets_on_sight(id, &[EntityKind::Enemy]).first() {
                if let Ok(entity) = self.arena.get_mut(id) {
                    entity.target = Some(target);
                    if let Some(brain) = entity.as_enemy_mut() {
                        brain.state = EnemyState::Chasing;
                        brain.reaction_since = None;
                    }
                }
                debug!(%id, %target, "chasing");
                self.enemy_chase(id);
                return;
            }
        }

        self.wander(id);
    }

    fn enemy_chase(&mut self, id: EntityId) {
        let now = self.time;
        let target = self.arena.get(id).ok().and_then(|e| e.target);
        let target = match target.filter(|&t| self.is_live(t) && self.can_see(id, t)) {
            Some(target) => Some(target),
            None => self.targets_on_sight(id, &[EntityKind::Enemy]).first().copied(),
        };
        let target_pos = target.and_then(|t| self.arena.get(t).ok()).map(|t| t.position());

        let Ok(entity) = self.arena.get_mut(id) else {
            return;
        };
        let position = entity.position();
        let speed = entity.max_speed;
        let orientation = entity.orientation;
        let Some(brain) = entity.as_enemy_mut() else {
            return;
        };
        let tuning = brain.tuning;

        let (Some(target), Some(target_pos)) = (target, target_pos) else {
            brain.state = EnemyState::Wandering;
            brain.reaction_since = Some(now);
            entity.target = None;
            entity.steer(Vec2::ZERO);
            debug!(%id, "target lost");
            return;
        };

        let to_target = target_pos - position;
        let dir = to_target.try_normalize().unwrap_or(orientation);

        if to_target.length() <= tuning.attack_distance {
            brain.state = EnemyState::Attacking;
            brain.attack = Some(AttackCycle::begin(now, &tuning));
            entity.target = Some(target);
            entity.steer(-dir * speed * tuning.attack_preparation_multiplier);
            entity.orientation = dir;
            debug!(%id, %target, "attacking");
        } else {
            entity.target = Some(target);
            entity.steer(dir * speed * tuning.chase_speed_multiplier);
        }
    }

    fn enemy_attack(&mut self, id: EntityId) {
        let now = self.time;
        let target = self
            .arena
            .get(id)
            .ok()
            .and_then(|e| e.target)
            .filter(|&t| self.is_live(t) && self.can_see(id, t));
        let target_pos = target.and_then(|t| self.arena.get(t).ok()).map(|t| t.position());

        let Ok(entity) = self.arena.get_mut(id) else {
            return;
        };
        let position = entity.position();
        let speed = entity.max_speed;
        let orientation = entity.orientation;
        let Some(brain) = entity.as_enemy_mut() else {
            return;
        };
        let tuning = brain.tuning;

        let Some(target_pos) = target_pos else {
            brain.attack = None;
            brain.state = EnemyState::Chasing;
            debug!(%id, "attack target lost");
            return;
        };
        let Some(cycle) = brain.attack.as_mut() else {
            brain.state = EnemyState::Chasing;
            return;
        };

        let dir = (target_pos - position).try_normalize().unwrap_or(orientation);
        let away = -dir * speed * tuning.attack_preparation_multiplier;

        let velocity = match cycle.advance(now, &tuning) {
            AttackStep::Hold(AttackPhase::Execute) => None,
            AttackStep::Hold(AttackPhase::Prepare | AttackPhase::Recover) => Some(away),
            AttackStep::Entered(AttackPhase::Execute) => Some(dir * speed * tuning.attack_speed_increase),
            AttackStep::Entered(_) => Some(Vec2::ZERO),
            AttackStep::Finished => {
                brain.attack = None;
                brain.state = EnemyState::Chasing;
                Some(dir * speed * tuning.chase_speed_multiplier)
            },
        };

        if let Some(velocity) = velocity {
            entity.body.velocity = velocity;
        }
        entity.orientation = dir;
    }

    /// Switches a chasing or attacking enemy into the Recover phase.
    pub(crate) fn interrupt_attack(&mut self, id: EntityId) {
        let now = self.time;
        let Some(brain) = self.arena.get_mut(id).ok().and_then(|e| e.as_enemy_mut()) else {
            return;
        };
        if brain.state.is_engaged() && brain.flee.is_none() {
            brain.state = EnemyState::Attacking;
            brain.attack = Some(AttackCycle::recover(now, &brain.tuning));
        }
    }

    /// Makes an enemy hostile for `duration` seconds.
    pub fn provoke_enemy(&mut self, id: EntityId, duration: f32) -> crate::error::GameplayResult<()> {
        let now = self.time;
        let entity = self.entity_mut_checked(id, EntityKind::Enemy)?;
        if let Some(brain) = entity.as_enemy_mut() {
            brain.set_hostile(now, duration.max(0.0));
        }
        Ok(())
    }

    /// Starts the flee sequence of an enemy.
    pub(crate) fn begin_flee(&mut self, id: EntityId, duration: f32) {
        let now = self.time;
        let away_from = self.player_position();
        let random = Vec2::from_angle(self.rng.f32() * std::f32::consts::TAU);

        let Ok(entity) = self.arena.get_mut(id) else {
            return;
        };
        let heading = away_from
            .and_then(|p| (entity.position() - p).try_normalize())
            .unwrap_or(random);
        let Some(brain) = entity.as_enemy_mut() else {
            return;
        };
        if brain.state == EnemyState::Dying || brain.state == EnemyState::Dead {
            return;
        }

        brain.flee = Some(Flee {
            start: now,
            duration,
            heading,
        });
        brain.attack = None;
        entity.target = None;
        entity.body.collision_enabled = false;
        entity.body.kinematic = false;
        debug!(%id, duration, "fleeing");
    }

    fn update_flee(&mut self, id: EntityId) {
        let now = self.time;
        let jitter = self.rng.f32() * 2.0 - 1.0;

        let Ok(entity) = self.arena.get_mut(id) else {
            return;
        };
        let speed = entity.max_speed;
        let Some(brain) = entity.as_enemy_mut() else {
            return;
        };
        let multiplier = brain.tuning.flee_speed_multiplier;
        let drift = jitter * brain.tuning.flee_drift;
        let Some(flee) = brain.flee.as_mut() else {
            return;
        };

        if now - flee.start >= flee.duration {
            self.remove_enemy(id, false);
            self.despawn(id);
            return;
        }

        flee.heading = Vec2::from_angle(drift).rotate(flee.heading);
        let velocity = flee.heading * speed * multiplier;
        entity.body.collision_enabled = false;
        entity.steer(velocity);
    }
}
