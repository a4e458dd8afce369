//! Entity record shared by every combatant.
//!
//! An [`Entity`] holds the common fields (body, life, timers, weak target)
//! and a tagged [`Variant`] payload. The lifecycle hooks dispatch by matching
//! on the variant.

use serde::{Deserialize, Serialize};

use laserline_common::{EntityId, Vec2};

use crate::config::{EntityTuning, WeaponConfig};
use crate::enemy::{EnemyBrain, EnemyState};
use crate::error::{GameplayError, GameplayResult};
use crate::life::CharacterLife;
use crate::npc::{NpcBrain, NpcState};
use crate::physics::{Body, LayerMask};
use crate::player::{PlayerControl, PlayerState};

/// Opacity applied while an entity recovers from a hit.
pub const HIT_OPACITY: f32 = 0.5;

/// Kind of entity, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Player character
    Player,
    /// Hostile creature
    Enemy,
    /// Non-player character
    Npc,
}

impl EntityKind {
    /// Returns the collision layer for this kind.
    #[must_use]
    pub const fn layer(self) -> LayerMask {
        match self {
            Self::Player => LayerMask::PLAYER,
            Self::Enemy => LayerMask::ENEMY,
            Self::Npc => LayerMask::NPC,
        }
    }
}

/// Variant-specific state.
#[derive(Debug, Clone)]
pub enum Variant {
    /// Player state
    Player(PlayerControl),
    /// Enemy AI state
    Enemy(EnemyBrain),
    /// NPC state
    Npc(NpcBrain),
}

/// Periodic wander decision timers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wander {
    /// Point the entity steers toward
    pub target: Vec2,
    /// Time of the last decision, `None` until the first one
    pub last_decision: Option<f32>,
    /// Seconds until the next decision
    pub next_interval: f32,
    /// Shortest decision interval
    pub min_interval: f32,
    /// Longest decision interval
    pub max_interval: f32,
}

impl Wander {
    /// Checks if a new wander decision is due.
    #[must_use]
    pub fn is_due(&self, now: f32) -> bool {
        self.last_decision
            .map_or(true, |last| now - last >= self.next_interval)
    }
}

/// Time-sliced death fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeathFade {
    /// Time the fade started
    pub start: f32,
    /// Fade length in seconds
    pub length: f32,
}

impl DeathFade {
    /// Returns fade progress in [0, 1].
    #[must_use]
    pub fn progress(&self, now: f32) -> f32 {
        if self.length <= 0.0 {
            1.0
        } else {
            ((now - self.start) / self.length).clamp(0.0, 1.0)
        }
    }

    /// Checks if the fade has completed.
    #[must_use]
    pub fn is_complete(&self, now: f32) -> bool {
        now - self.start >= self.length
    }
}

/// A live combatant.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) variant: Variant,
    pub(crate) active: bool,
    pub(crate) body: Body,
    pub(crate) orientation: Vec2,
    pub(crate) life: CharacterLife,
    pub(crate) max_speed: f32,
    pub(crate) sight_radius: f32,
    pub(crate) visibility_mask: LayerMask,
    pub(crate) recoil: f32,
    pub(crate) hit_recovery: f32,
    pub(crate) melee_damage: i32,
    pub(crate) death_fade_length: f32,
    pub(crate) weapon: Option<WeaponConfig>,
    pub(crate) hit_time: Option<f32>,
    pub(crate) last_shoot_time: Option<f32>,
    pub(crate) wander: Wander,
    pub(crate) target: Option<EntityId>,
    pub(crate) death: Option<DeathFade>,
    pub(crate) opacity: f32,
}

impl Entity {
    /// Creates an inactive entity. Collision stays off until initialization.
    #[must_use]
    pub fn new(id: EntityId, variant: Variant, tuning: &EntityTuning, position: Vec2) -> Self {
        let kind = match &variant {
            Variant::Player(_) => EntityKind::Player,
            Variant::Enemy(_) => EntityKind::Enemy,
            Variant::Npc(_) => EntityKind::Npc,
        };
        let mut body = Body::new(position, tuning.body_radius, kind.layer());
        body.collision_enabled = false;

        Self {
            id,
            variant,
            active: false,
            body,
            orientation: Vec2::X,
            life: CharacterLife::new(),
            max_speed: tuning.max_speed,
            sight_radius: tuning.sight_radius,
            visibility_mask: tuning.visibility_mask,
            recoil: tuning.recoil,
            hit_recovery: tuning.hit_recovery,
            melee_damage: tuning.melee_damage,
            death_fade_length: tuning.death_fade,
            weapon: None,
            hit_time: None,
            last_shoot_time: None,
            wander: Wander {
                target: position,
                last_decision: None,
                next_interval: 0.0,
                min_interval: tuning.min_wander_decision_time,
                max_interval: tuning.max_wander_decision_time,
            },
            target: None,
            death: None,
            opacity: 1.0,
        }
    }

    /// Sets life and speed and activates the entity.
    pub fn initialize(&mut self, max_hp: i32, max_speed: f32) -> GameplayResult<()> {
        if !max_speed.is_finite() || max_speed < 0.0 {
            return Err(GameplayError::InvalidArgument(format!(
                "max_speed must be finite and non-negative, got {max_speed}"
            )));
        }
        self.life.initialize(max_hp)?;
        self.max_speed = max_speed;
        self.active = true;
        self.body.collision_enabled = true;
        self.body.kinematic = false;
        self.body.velocity = Vec2::ZERO;
        self.hit_time = None;
        self.last_shoot_time = None;
        self.wander.last_decision = None;
        self.target = None;
        self.death = None;
        self.opacity = 1.0;

        match &mut self.variant {
            Variant::Player(player) => player.reset(),
            Variant::Enemy(enemy) => enemy.reset(),
            Variant::Npc(npc) => npc.reset(),
        }
        Ok(())
    }

    /// Returns the entity handle.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self.variant {
            Variant::Player(_) => EntityKind::Player,
            Variant::Enemy(_) => EntityKind::Enemy,
            Variant::Npc(_) => EntityKind::Npc,
        }
    }

    /// Returns the variant payload.
    #[must_use]
    pub const fn variant(&self) -> &Variant {
        &self.variant
    }

    /// Returns the enemy brain, if this is an enemy.
    #[must_use]
    pub const fn as_enemy(&self) -> Option<&EnemyBrain> {
        match &self.variant {
            Variant::Enemy(brain) => Some(brain),
            _ => None,
        }
    }

    pub(crate) fn as_enemy_mut(&mut self) -> Option<&mut EnemyBrain> {
        match &mut self.variant {
            Variant::Enemy(brain) => Some(brain),
            _ => None,
        }
    }

    /// Returns the NPC state, if this is an NPC.
    #[must_use]
    pub const fn as_npc(&self) -> Option<&NpcBrain> {
        match &self.variant {
            Variant::Npc(brain) => Some(brain),
            _ => None,
        }
    }

    /// Returns the player state, if this is the player.
    #[must_use]
    pub const fn as_player(&self) -> Option<&PlayerControl> {
        match &self.variant {
            Variant::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Checks if the entity has been initialized and not yet deactivated.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the world position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Moves the entity.
    pub fn set_position(&mut self, position: Vec2) {
        self.body.position = position;
    }

    /// Returns the current velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.body.velocity
    }

    /// Returns the physics body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Returns the unit facing vector.
    #[must_use]
    pub const fn orientation(&self) -> Vec2 {
        self.orientation
    }

    /// Returns the facing as an angle in degrees.
    #[must_use]
    pub fn orientation_degrees(&self) -> f32 {
        self.orientation.y.atan2(self.orientation.x).to_degrees()
    }

    /// Returns the life ledger.
    #[must_use]
    pub const fn life(&self) -> &CharacterLife {
        &self.life
    }

    /// Returns `hp / max_hp`.
    #[must_use]
    pub fn hp_ratio(&self) -> f32 {
        self.life.hp_ratio()
    }

    /// Returns the movement speed.
    #[must_use]
    pub const fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Returns the sight radius.
    #[must_use]
    pub const fn sight_radius(&self) -> f32 {
        self.sight_radius
    }

    /// Returns the layers that terminate this entity's sight rays.
    #[must_use]
    pub const fn visibility_mask(&self) -> LayerMask {
        self.visibility_mask
    }

    /// Returns the weapon, if armed.
    #[must_use]
    pub const fn weapon(&self) -> Option<&WeaponConfig> {
        self.weapon.as_ref()
    }

    /// Arms or disarms the entity.
    pub fn set_weapon(&mut self, weapon: Option<WeaponConfig>) {
        self.weapon = weapon;
    }

    /// Returns the current weak target.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Returns the render opacity.
    #[must_use]
    pub const fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Returns the running death fade, if any.
    #[must_use]
    pub const fn death(&self) -> Option<&DeathFade> {
        self.death.as_ref()
    }

    /// Checks if the entity is dying or dead.
    #[must_use]
    pub const fn is_dying(&self) -> bool {
        match &self.variant {
            Variant::Player(player) => matches!(player.state, PlayerState::Death),
            Variant::Enemy(enemy) => matches!(enemy.state, EnemyState::Dying | EnemyState::Dead),
            Variant::Npc(npc) => matches!(npc.state, NpcState::Dying | NpcState::Dead),
        }
    }

    /// Checks if the entity is recovering from a hit.
    #[must_use]
    pub const fn is_hit(&self) -> bool {
        match &self.variant {
            Variant::Player(player) => matches!(player.state, PlayerState::Hit),
            Variant::Enemy(enemy) => matches!(enemy.state, EnemyState::Hit),
            Variant::Npc(npc) => matches!(npc.state, NpcState::Hit),
        }
    }

    /// Checks if the entity can neither deal nor take contact damage.
    #[must_use]
    pub const fn is_ethereal(&self) -> bool {
        self.is_hit() || self.is_dying()
    }

    /// Checks if touching `other` hurts this entity.
    #[must_use]
    pub fn can_bump_entity(&self, other: &Entity) -> bool {
        match self.variant {
            Variant::Enemy(_) => false,
            Variant::Player(_) | Variant::Npc(_) => {
                !other.is_ethereal() && other.as_enemy().is_some_and(EnemyBrain::is_hostile)
            },
        }
    }

    /// Checks if this entity's shots affect `other`.
    #[must_use]
    pub fn can_shoot_entity(&self, other: &Entity) -> bool {
        matches!(
            (self.kind(), other.kind()),
            (EntityKind::Player, EntityKind::Enemy | EntityKind::Npc)
                | (EntityKind::Enemy, EntityKind::Player)
                | (EntityKind::Npc, EntityKind::Enemy)
        )
    }

    /// Checks if the entity may fire at `now`.
    #[must_use]
    pub fn can_shoot(&self, now: f32) -> bool {
        if self.is_dying() {
            return false;
        }
        let Some(weapon) = &self.weapon else {
            return false;
        };
        self.last_shoot_time
            .map_or(true, |last| now - last >= weapon.cooldown)
    }

    pub(crate) fn set_dying(&mut self) {
        match &mut self.variant {
            Variant::Player(player) => player.state = PlayerState::Death,
            Variant::Enemy(enemy) => {
                enemy.state = EnemyState::Dying;
                enemy.attack = None;
            },
            Variant::Npc(npc) => npc.state = NpcState::Dying,
        }
    }

    pub(crate) fn set_dead(&mut self) {
        self.active = false;
        self.body.velocity = Vec2::ZERO;
        match &mut self.variant {
            Variant::Player(player) => player.state = PlayerState::Death,
            Variant::Enemy(enemy) => enemy.state = EnemyState::Dead,
            Variant::Npc(npc) => npc.state = NpcState::Dead,
        }
    }

    /// Enters the Hit state. Returns whether hit recovery should be timed.
    pub(crate) fn hit_reaction(&mut self) -> bool {
        self.opacity = HIT_OPACITY;
        self.body.velocity = Vec2::ZERO;
        match &mut self.variant {
            Variant::Player(player) => {
                if player.state != PlayerState::Hit {
                    player.previous_state = player.state;
                }
                player.state = PlayerState::Hit;
            },
            Variant::Enemy(enemy) => enemy.enter_hit(),
            Variant::Npc(npc) => npc.state = NpcState::Hit,
        }
        true
    }

    /// Leaves the Hit state.
    pub(crate) fn on_hit_finished(&mut self, now: f32) {
        self.hit_time = None;
        self.opacity = 1.0;
        match &mut self.variant {
            Variant::Player(player) => player.state = player.previous_state,
            Variant::Enemy(enemy) => enemy.leave_hit(now),
            Variant::Npc(npc) => npc.state = NpcState::Wandering,
        }
    }

    /// Called on the attacker when its contact or shot killed something.
    pub(crate) fn hit_landed(&mut self) {
        if let Variant::Enemy(_) = self.variant {
            self.target = None;
        }
    }

    /// Sets velocity and turns to face it when moving.
    pub(crate) fn steer(&mut self, velocity: Vec2) {
        self.body.velocity = velocity;
        if let Some(facing) = velocity.try_normalize() {
            self.orientation = facing;
        }
    }

    /// Describes the entity for debug overlays.
    #[must_use]
    pub fn debug_label(&self) -> String {
        let hp = format!("{}/{}", self.life.hp(), self.life.max_hp());
        match &self.variant {
            Variant::Player(player) => format!("Player {} {:?} {hp}", self.id, player.state),
            Variant::Enemy(enemy) => format!(
                "Enemy {} {:?} {:?} {hp}",
                self.id,
                enemy.state(),
                enemy.reaction()
            ),
            Variant::Npc(npc) => format!("NPC {} {:?} {hp}", self.id, npc.state),
        }
    }
}
