//! Gameplay tuning.
//!
//! Every tunable of the match lives here so the host can load it from a file.
//! All structs use `#[serde(default)]`, so a partial file only overrides the
//! values it names.

use laserline_common::{Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::enemy::Personality;
use crate::physics::LayerMask;

/// Tuning shared by every entity variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityTuning {
    /// Hit points given at initialization
    pub max_hp: i32,
    /// Movement speed in world units per second
    pub max_speed: f32,
    /// Maximum distance of line-of-sight queries
    pub sight_radius: f32,
    /// Layers that can terminate a sight ray
    pub visibility_mask: LayerMask,
    /// Collision circle radius
    pub body_radius: f32,
    /// Self displacement when shooting, and push applied by unarmed hits
    pub recoil: f32,
    /// Seconds spent in the Hit state before recovering
    pub hit_recovery: f32,
    /// Damage dealt by an unarmed shot
    pub melee_damage: i32,
    /// Length of the death fade in seconds
    pub death_fade: f32,
    /// Shortest interval between wander decisions
    pub min_wander_decision_time: f32,
    /// Longest interval between wander decisions
    pub max_wander_decision_time: f32,
}

impl Default for EntityTuning {
    fn default() -> Self {
        Self {
            max_hp: 3,
            max_speed: 1.0,
            sight_radius: 6.0,
            visibility_mask: LayerMask::ALL,
            body_radius: 0.3,
            recoil: 0.2,
            hit_recovery: 0.3,
            melee_damage: 1,
            death_fade: 1.0,
            min_wander_decision_time: 0.8,
            max_wander_decision_time: 1.5,
        }
    }
}

impl EntityTuning {
    fn validate(&mut self) {
        self.max_hp = self.max_hp.max(0);
        self.max_speed = self.max_speed.max(0.0);
        self.sight_radius = self.sight_radius.max(0.0);
        self.body_radius = self.body_radius.clamp(0.01, 10.0);
        self.hit_recovery = self.hit_recovery.max(0.0);
        self.melee_damage = self.melee_damage.max(0);
        self.death_fade = self.death_fade.max(0.0);
        self.min_wander_decision_time = self.min_wander_decision_time.max(0.05);
        self.max_wander_decision_time = self
            .max_wander_decision_time
            .max(self.min_wander_decision_time);
    }
}

/// Ranged weapon parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Damage per hit
    pub damage: i32,
    /// Whether a shot passes through every target on its line
    pub piercing: bool,
    /// Displacement applied to each target along the shot direction
    pub recoil: f32,
    /// Length of the shot line
    pub range: f32,
    /// Minimum seconds between shots
    pub cooldown: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            damage: 2,
            piercing: false,
            recoil: 0.2,
            range: 5.0,
            cooldown: 0.25,
        }
    }
}

/// Enemy AI tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Shared entity tuning
    pub base: EntityTuning,
    /// Speed multiplier while chasing
    pub chase_speed_multiplier: f32,
    /// Distance at which a chase turns into an attack
    pub attack_distance: f32,
    /// Seconds of backward wind-up before the lunge
    pub attack_preparation: f32,
    /// Speed multiplier of the wind-up and recovery backstep
    pub attack_preparation_multiplier: f32,
    /// Speed multiplier of the lunge
    pub attack_speed_increase: f32,
    /// Seconds of the lunge and of the recovery
    pub attack_recover_duration: f32,
    /// Hostility duration after being hit
    pub hostile_on_hit_duration: f32,
    /// Hostility duration after witnessing another enemy get hurt
    pub hostile_on_sight_duration: f32,
    /// Speed multiplier while fleeing
    pub flee_speed_multiplier: f32,
    /// Maximum heading change per tick while fleeing, in radians
    pub flee_drift: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            base: EntityTuning::default(),
            chase_speed_multiplier: 1.5,
            attack_distance: 0.9,
            attack_preparation: 0.25,
            attack_preparation_multiplier: 0.5,
            attack_speed_increase: 3.0,
            attack_recover_duration: 0.5,
            hostile_on_hit_duration: 10.0,
            hostile_on_sight_duration: 5.0,
            flee_speed_multiplier: 1.5,
            flee_drift: 0.3,
        }
    }
}

/// NPC tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcTuning {
    /// Shared entity tuning
    pub base: EntityTuning,
    /// Maximum player distance for dialogue
    pub talk_distance: f32,
    /// Line spoken when the player interacts
    pub message: String,
    /// NPCs placed at match start
    pub population: u32,
}

impl Default for NpcTuning {
    fn default() -> Self {
        Self {
            base: EntityTuning {
                max_hp: 2,
                max_speed: 0.8,
                ..EntityTuning::default()
            },
            talk_distance: 1.0,
            message: "We're doomed!!".to_string(),
            population: 5,
        }
    }
}

/// Player tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Shared entity tuning
    pub base: EntityTuning,
    /// Movement inputs shorter than this are ignored
    pub movement_deadzone: f32,
    /// Player weapon
    pub weapon: WeaponConfig,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            base: EntityTuning {
                max_hp: 5,
                max_speed: 2.0,
                hit_recovery: 0.5,
                ..EntityTuning::default()
            },
            movement_deadzone: 0.1,
            weapon: WeaponConfig::default(),
        }
    }
}

/// Timed enemy spawner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Spawn position
    pub position: Vec2,
    /// Total spawns before the spawner is depleted
    pub max_spawns: u32,
    /// Spawned enemies alive at once
    pub max_alive: u32,
    /// Shortest delay between spawns
    pub min_spawn_interval: f32,
    /// Longest delay between spawns
    pub max_spawn_interval: f32,
    /// Personality given to spawned enemies
    pub personality: Personality,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            max_spawns: 50,
            max_alive: 10,
            min_spawn_interval: 1.5,
            max_spawn_interval: 4.0,
            personality: Personality::Cautious,
        }
    }
}

/// Match-level rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    /// Seconds survived before the match is decided by kill ratio
    pub victory_time: f32,
    /// Kill ratio above which a survived match is genocidal
    pub genocidal_ratio: f32,
    /// Seconds the outro runs after the match is decided
    pub outro_duration: f32,
    /// Half extents of the visible play area, centered on the origin
    pub half_extents: Vec2,
    /// Capacity of the presentation event bus
    pub event_capacity: usize,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            victory_time: 120.0,
            genocidal_ratio: 0.3,
            outro_duration: 3.0,
            half_extents: Vec2::new(8.0, 4.5),
            event_capacity: 1024,
        }
    }
}

impl MatchTuning {
    /// Returns the visible play area.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_center(Vec2::ZERO, self.half_extents)
    }
}

/// Complete gameplay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Player tuning
    pub player: PlayerTuning,
    /// Enemy tuning
    pub enemy: EnemyTuning,
    /// NPC tuning
    pub npc: NpcTuning,
    /// Enemy spawners
    pub spawners: Vec<SpawnerConfig>,
    /// Match rules
    pub rules: MatchTuning,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            enemy: EnemyTuning::default(),
            npc: NpcTuning::default(),
            spawners: vec![
                SpawnerConfig {
                    position: Vec2::new(-7.0, 0.0),
                    ..SpawnerConfig::default()
                },
                SpawnerConfig {
                    position: Vec2::new(7.0, 0.0),
                    ..SpawnerConfig::default()
                },
            ],
            rules: MatchTuning::default(),
        }
    }
}

impl GameplayConfig {
    /// Clamps configuration values into sensible ranges.
    pub fn validate(&mut self) {
        self.player.base.validate();
        self.enemy.base.validate();
        self.npc.base.validate();

        self.player.movement_deadzone = self.player.movement_deadzone.clamp(0.0, 0.9);
        let weapon = &mut self.player.weapon;
        weapon.damage = weapon.damage.max(0);
        weapon.range = weapon.range.max(0.0);
        weapon.cooldown = weapon.cooldown.max(0.0);

        let enemy = &mut self.enemy;
        enemy.chase_speed_multiplier = enemy.chase_speed_multiplier.max(0.0);
        enemy.attack_distance = enemy.attack_distance.max(0.0);
        enemy.attack_preparation = enemy.attack_preparation.max(0.0);
        enemy.attack_recover_duration = enemy.attack_recover_duration.max(0.0);
        enemy.hostile_on_hit_duration = enemy.hostile_on_hit_duration.max(0.0);
        enemy.hostile_on_sight_duration = enemy.hostile_on_sight_duration.max(0.0);
        enemy.flee_drift = enemy.flee_drift.clamp(0.0, std::f32::consts::PI);

        self.npc.talk_distance = self.npc.talk_distance.max(0.0);

        for spawner in &mut self.spawners {
            spawner.min_spawn_interval = spawner.min_spawn_interval.max(0.0);
            spawner.max_spawn_interval = spawner.max_spawn_interval.max(spawner.min_spawn_interval);
        }

        let rules = &mut self.rules;
        rules.victory_time = rules.victory_time.max(0.0);
        rules.genocidal_ratio = rules.genocidal_ratio.clamp(0.0, 1.0);
        rules.outro_duration = rules.outro_duration.max(0.0);
        rules.half_extents = rules.half_extents.abs().max(Vec2::splat(1.0));
        rules.event_capacity = rules.event_capacity.clamp(16, 1 << 16);
    }
}
