//! Match-scoped world context.
//!
//! The [`GameplayManager`] owns every entity of a match, answers sight
//! queries, propagates aggro, evaluates the match outcome and drives the
//! per-tick update. It is constructed explicitly by the host and passed by
//! reference; there is no global instance.

use tracing::{debug, info, warn};

use laserline_common::{EntityId, Rect, Vec2};

use crate::arena::EntityArena;
use crate::config::GameplayConfig;
use crate::enemy::{EnemyBrain, EnemyState, Personality};
use crate::entity::{Entity, EntityKind, Variant};
use crate::error::{GameplayError, GameplayResult};
use crate::events::{EventBus, PresentationEvent};
use crate::input::{InputSnapshot, InputTracker};
use crate::npc::{NpcBrain, NpcState};
use crate::outcome::{classify_victory, GameOverState, MatchStats};
use crate::physics::{Body, ContactEvent, PhysicsWorld};
use crate::player::PlayerControl;
use crate::spawn::EnemySpawner;

/// World registry and simulation driver for one match.
#[derive(Debug)]
pub struct GameplayManager {
    pub(crate) config: GameplayConfig,
    pub(crate) arena: EntityArena<Entity>,
    pub(crate) player: Option<EntityId>,
    pub(crate) enemies: Vec<EntityId>,
    pub(crate) npcs: Vec<EntityId>,
    pub(crate) stats: MatchStats,
    pub(crate) time: f32,
    pub(crate) bounds: Rect,
    pub(crate) paused: bool,
    pub(crate) game_over: Option<GameOverState>,
    pub(crate) outro_start: Option<f32>,
    pub(crate) match_ended: bool,
    pub(crate) physics: PhysicsWorld,
    pub(crate) rng: fastrand::Rng,
    pub(crate) events: EventBus,
    pub(crate) input: InputTracker,
    pub(crate) spawners: Vec<EnemySpawner>,
}

impl GameplayManager {
    /// Creates an empty world. Call [`GameplayManager::start_match`] to
    /// populate it from the configuration.
    #[must_use]
    pub fn new(mut config: GameplayConfig, seed: u64) -> Self {
        config.validate();
        let bounds = config.rules.bounds();
        let events = EventBus::new(config.rules.event_capacity);
        let input = InputTracker::new(config.player.movement_deadzone);

        Self {
            config,
            arena: EntityArena::new(),
            player: None,
            enemies: Vec::new(),
            npcs: Vec::new(),
            stats: MatchStats::default(),
            time: 0.0,
            bounds,
            paused: false,
            game_over: None,
            outro_start: None,
            match_ended: false,
            physics: PhysicsWorld::new(),
            rng: fastrand::Rng::with_seed(seed),
            events,
            input,
            spawners: Vec::new(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &GameplayConfig {
        &self.config
    }

    /// Returns elapsed match time in seconds.
    #[must_use]
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Returns the visible play area.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Returns the match counters.
    #[must_use]
    pub const fn stats(&self) -> &MatchStats {
        &self.stats
    }

    /// Returns the match outcome, [`GameOverState::None`] while running.
    #[must_use]
    pub fn game_over_state(&self) -> GameOverState {
        self.game_over.unwrap_or(GameOverState::None)
    }

    /// Checks if the outro finished.
    #[must_use]
    pub const fn match_ended(&self) -> bool {
        self.match_ended
    }

    /// Checks if the host paused the simulation.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pauses or resumes the simulation. Paused time does not count.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            info!(paused, "pause toggled");
        }
        self.paused = paused;
    }

    /// Returns the player handle.
    #[must_use]
    pub const fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// Returns registered enemies.
    #[must_use]
    pub fn enemies(&self) -> &[EntityId] {
        &self.enemies
    }

    /// Returns registered NPCs.
    #[must_use]
    pub fn npcs(&self) -> &[EntityId] {
        &self.npcs
    }

    /// Returns the spawners of the running match.
    #[must_use]
    pub fn spawners(&self) -> &[EnemySpawner] {
        &self.spawners
    }

    /// Returns an entity.
    pub fn entity(&self, id: EntityId) -> GameplayResult<&Entity> {
        self.arena.get(id)
    }

    /// Returns an entity mutably.
    pub fn entity_mut(&mut self, id: EntityId) -> GameplayResult<&mut Entity> {
        self.arena.get_mut(id)
    }

    /// Iterates over every stored entity.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.arena.iter()
    }

    /// Returns the presentation event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Drains pending presentation events.
    pub fn drain_events(&self) -> Vec<PresentationEvent> {
        self.events.drain()
    }

    /// Returns the physics world.
    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    /// Adds a wall spanning `min..max` and returns its index.
    pub fn add_wall(&mut self, min: Vec2, max: Vec2) -> GameplayResult<usize> {
        let wall = Rect::new(min, max)?;
        debug!(?min, ?max, "wall added");
        Ok(self.physics.add_wall(wall))
    }

    pub(crate) fn bodies(&self) -> impl Iterator<Item = (EntityId, &Body)> + '_ {
        self.arena
            .iter()
            .filter(|(_, e)| e.active)
            .map(|(id, e)| (id, &e.body))
    }

    pub(crate) fn player_position(&self) -> Option<Vec2> {
        self.player
            .and_then(|id| self.arena.get(id).ok())
            .map(Entity::position)
    }

    pub(crate) fn entity_mut_checked(&mut self, id: EntityId, expected: EntityKind) -> GameplayResult<&mut Entity> {
        let entity = self.arena.get_mut(id)?;
        let actual = entity.kind();
        if actual != expected {
            return Err(GameplayError::WrongVariant { id, expected, actual });
        }
        Ok(entity)
    }

    // ========================================================================
    // Registry
    // ========================================================================

    fn create_with(&mut self, variant: Variant, kind: EntityKind, position: Vec2) -> EntityId {
        let tuning = match kind {
            EntityKind::Player => self.config.player.base,
            EntityKind::Enemy => self.config.enemy.base,
            EntityKind::Npc => self.config.npc.base,
        };
        self.arena
            .insert_with(|id| Entity::new(id, variant, &tuning, position))
    }

    /// Creates an inactive entity of the given kind.
    pub fn create_entity(&mut self, kind: EntityKind, position: Vec2) -> EntityId {
        let variant = match kind {
            EntityKind::Player => Variant::Player(PlayerControl::new()),
            EntityKind::Enemy => Variant::Enemy(EnemyBrain::new(self.config.enemy, Personality::default())),
            EntityKind::Npc => Variant::Npc(NpcBrain::new(&self.config.npc)),
        };
        self.create_with(variant, kind, position)
    }

    /// Activates an entity and registers it with the world.
    ///
    /// Nothing is changed when the entity is dying, dead or already
    /// registered.
    pub fn initialize_entity(&mut self, id: EntityId, max_hp: i32, max_speed: f32) -> GameplayResult<()> {
        self.check_initializable(id)?;
        let entity = self.arena.get_mut(id)?;
        entity.initialize(max_hp, max_speed)?;
        let kind = entity.kind();
        self.reroll_wander(id);

        match kind {
            EntityKind::Player => self.set_player(id),
            EntityKind::Enemy => self.add_enemy(id),
            EntityKind::Npc => self.add_npc(id),
        }
    }

    /// Creates, initializes and registers an enemy.
    pub fn spawn_enemy(&mut self, position: Vec2, personality: Personality) -> GameplayResult<EntityId> {
        let brain = EnemyBrain::new(self.config.enemy, personality);
        let id = self.create_with(Variant::Enemy(brain), EntityKind::Enemy, position);
        let base = self.config.enemy.base;
        self.initialize_entity(id, base.max_hp, base.max_speed)?;
        Ok(id)
    }

    /// Creates, initializes and registers an NPC.
    pub fn spawn_npc(&mut self, position: Vec2) -> GameplayResult<EntityId> {
        let id = self.create_entity(EntityKind::Npc, position);
        let base = self.config.npc.base;
        self.initialize_entity(id, base.max_hp, base.max_speed)?;
        Ok(id)
    }

    /// Creates, arms, initializes and registers the player.
    pub fn spawn_player(&mut self, position: Vec2) -> GameplayResult<EntityId> {
        let id = self.create_entity(EntityKind::Player, position);
        let tuning = self.config.player;
        if let Ok(entity) = self.arena.get_mut(id) {
            entity.set_weapon(Some(tuning.weapon));
        }
        if let Err(err) = self.initialize_entity(id, tuning.base.max_hp, tuning.base.max_speed) {
            self.despawn(id);
            return Err(err);
        }
        Ok(id)
    }

    fn check_initializable(&self, id: EntityId) -> GameplayResult<()> {
        let entity = self.arena.get(id)?;
        if entity.is_dying() {
            warn!(%id, "initialize of a dying entity");
            return Err(GameplayError::NotActive(id));
        }
        let registered = match entity.kind() {
            EntityKind::Player => self.player.filter(|&p| self.arena.contains(p)),
            EntityKind::Enemy => self.enemies.contains(&id).then_some(id),
            EntityKind::Npc => self.npcs.contains(&id).then_some(id),
        };
        if let Some(current) = registered {
            warn!(%id, %current, "initialize of a registered entity");
            return Err(GameplayError::AlreadyRegistered(current));
        }
        Ok(())
    }

    fn check_registrable(&self, id: EntityId, expected: EntityKind) -> GameplayResult<()> {
        let entity = self.arena.get(id)?;
        if entity.kind() != expected {
            return Err(GameplayError::WrongVariant {
                id,
                expected,
                actual: entity.kind(),
            });
        }
        if !entity.active {
            return Err(GameplayError::NotActive(id));
        }
        Ok(())
    }

    /// Registers an initialized enemy.
    pub fn add_enemy(&mut self, id: EntityId) -> GameplayResult<()> {
        self.check_registrable(id, EntityKind::Enemy)?;
        if self.enemies.contains(&id) {
            warn!(%id, "enemy already registered");
            return Err(GameplayError::AlreadyRegistered(id));
        }
        self.enemies.push(id);
        self.stats.spawned_creatures += 1;
        info!(%id, spawned = self.stats.spawned_creatures, "enemy registered");
        Ok(())
    }

    /// Registers an initialized NPC.
    pub fn add_npc(&mut self, id: EntityId) -> GameplayResult<()> {
        self.check_registrable(id, EntityKind::Npc)?;
        if self.npcs.contains(&id) {
            warn!(%id, "npc already registered");
            return Err(GameplayError::AlreadyRegistered(id));
        }
        self.npcs.push(id);
        self.stats.spawned_npcs += 1;
        info!(%id, spawned = self.stats.spawned_npcs, "npc registered");
        Ok(())
    }

    /// Registers the player.
    pub fn set_player(&mut self, id: EntityId) -> GameplayResult<()> {
        self.check_registrable(id, EntityKind::Player)?;
        if let Some(current) = self.player.filter(|&p| self.arena.contains(p)) {
            warn!(%id, %current, "player already registered");
            return Err(GameplayError::AlreadyRegistered(current));
        }
        self.player = Some(id);
        info!(%id, "player registered");
        Ok(())
    }

    /// Deregisters an enemy. Returns true if it was registered.
    ///
    /// Kills only count while the match is undecided.
    pub fn remove_enemy(&mut self, id: EntityId, killed: bool) -> bool {
        let Some(index) = self.enemies.iter().position(|&e| e == id) else {
            return false;
        };
        self.enemies.swap_remove(index);
        if killed && self.game_over.is_none() {
            self.stats.killed_creatures += 1;
        }
        for spawner in &mut self.spawners {
            if spawner.release(id) {
                break;
            }
        }
        debug!(%id, killed, "enemy removed");
        true
    }

    /// Deregisters an NPC. Returns true if it was registered.
    ///
    /// Kills only count while the match is undecided.
    pub fn remove_npc(&mut self, id: EntityId, killed: bool) -> bool {
        let Some(index) = self.npcs.iter().position(|&n| n == id) else {
            return false;
        };
        self.npcs.swap_remove(index);
        if killed && self.game_over.is_none() {
            self.stats.killed_npcs += 1;
        }
        debug!(%id, killed, "npc removed");
        true
    }

    /// Returns an entity to the pool without counting it as killed.
    pub fn recycle(&mut self, id: EntityId) -> GameplayResult<()> {
        let kind = self.arena.get(id)?.kind();
        match kind {
            EntityKind::Enemy => {
                self.remove_enemy(id, false);
            },
            EntityKind::Npc => {
                self.remove_npc(id, false);
            },
            EntityKind::Player => {
                self.player = None;
            },
        }
        self.despawn(id);
        Ok(())
    }

    pub(crate) fn despawn(&mut self, id: EntityId) {
        self.release_contacts(id);
        if self.arena.remove(id).is_err() {
            warn!(%id, "despawn of unknown entity");
        }
    }

    pub(crate) fn release_contacts(&mut self, id: EntityId) {
        for event in self.physics.forget(id) {
            if let ContactEvent::End(a, b) = event {
                let other = if a == id { b } else { a };
                if let Ok(entity) = self.arena.get_mut(other) {
                    entity.body.kinematic = false;
                }
            }
        }
    }

    /// Resets the world and populates it from the configuration.
    pub fn start_match(&mut self) -> GameplayResult<EntityId> {
        self.arena.clear();
        self.player = None;
        self.enemies.clear();
        self.npcs.clear();
        self.stats = MatchStats::default();
        self.time = 0.0;
        self.game_over = None;
        self.outro_start = None;
        self.match_ended = false;
        self.physics.clear_contacts();
        self.input.reset();
        self.spawners = self
            .config
            .spawners
            .iter()
            .map(|&config| EnemySpawner::new(config, 0.0))
            .collect();

        let player = self.spawn_player(self.bounds.center())?;
        self.populate_npcs();
        info!(
            npcs = self.npcs.len(),
            spawners = self.spawners.len(),
            "match started"
        );
        Ok(player)
    }

    // ========================================================================
    // Wandering
    // ========================================================================

    pub(crate) fn reroll_wander(&mut self, id: EntityId) {
        let now = self.time;
        let point = self.bounds.random_point(&mut self.rng);
        let roll = self.rng.f32();
        if let Ok(entity) = self.arena.get_mut(id) {
            let wander = &mut entity.wander;
            wander.target = point;
            wander.next_interval = wander.min_interval + roll * (wander.max_interval - wander.min_interval);
            wander.last_decision = Some(now);
        }
    }

    /// Steers toward the wander point, re-rolling it when due.
    pub(crate) fn wander(&mut self, id: EntityId) {
        let due = self.arena.get(id).is_ok_and(|e| e.wander.is_due(self.time));
        if due {
            self.reroll_wander(id);
        }
        if let Ok(entity) = self.arena.get_mut(id) {
            let to_target = entity.wander.target - entity.position();
            let velocity = to_target.try_normalize().unwrap_or(Vec2::ZERO) * entity.max_speed;
            entity.steer(velocity);
        }
    }

    fn is_wandering(&self, id: EntityId) -> bool {
        self.arena.get(id).is_ok_and(|e| match &e.variant {
            Variant::Enemy(brain) => brain.state == EnemyState::Wandering && brain.flee.is_none(),
            Variant::Npc(npc) => npc.state == NpcState::Wandering,
            Variant::Player(_) => false,
        })
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the match by `dt` seconds.
    ///
    /// Order: clock, input, outcome check, player, enemies, NPCs, death
    /// fades, spawners, physics and contacts, outro.
    pub fn advance(&mut self, dt: f32, input: &InputSnapshot) {
        if self.paused {
            return;
        }
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.time += dt;
        let command = self.input.process(input);

        if self.game_over.is_none() {
            self.evaluate_game_over();
        }

        if let Some(player) = self.player {
            self.update_player(player, command);
        }
        for id in self.enemies.clone() {
            self.update_enemy(id);
        }
        for id in self.npcs.clone() {
            self.update_npc(id);
        }

        self.update_deaths();
        self.update_spawners();
        self.step_physics(dt);
        self.update_outro();
    }

    fn step_physics(&mut self, dt: f32) {
        let mut bodies: Vec<(EntityId, Body)> = self
            .arena
            .iter()
            .filter(|(_, e)| e.active)
            .map(|(id, e)| (id, e.body))
            .collect();

        let contacts = self.physics.step(&mut bodies, dt, self.bounds);

        for (id, body) in bodies {
            if let Ok(entity) = self.arena.get_mut(id) {
                entity.body = body;
            }
        }

        if self.game_over.is_none() {
            for contact in contacts {
                if let ContactEvent::Begin(a, b) = contact {
                    self.on_contact_begin(a, b);
                    self.on_contact_begin(b, a);
                }
            }
        }
    }

    /// Handles `id` starting to touch `other`.
    pub fn on_contact_begin(&mut self, id: EntityId, other: EntityId) {
        self.on_bumped(id, other);
        if self.is_wandering(id) {
            self.reroll_wander(id);
        }
        self.interrupt_attack(id);
    }

    fn evaluate_game_over(&mut self) {
        if let Some(player) = self.player {
            if self.arena.get(player).is_ok_and(Entity::is_dying) {
                self.set_game_over(GameOverState::PlayerDeath);
                return;
            }
        }

        if self.spawners_depleted() && self.stats.all_creatures_killed() {
            self.set_game_over(GameOverState::Extermination);
        } else if self.time > self.config.rules.victory_time {
            let state = classify_victory(&self.stats, self.config.rules.genocidal_ratio);
            self.set_game_over(state);
        }
    }

    /// Sets the terminal outcome. Returns false if one was already set.
    ///
    /// Every entity stops moving. Unless the player died, surviving enemies
    /// flee for the outro duration.
    pub fn set_game_over(&mut self, state: GameOverState) -> bool {
        if !state.is_terminal() || self.game_over.is_some() {
            return false;
        }
        self.game_over = Some(state);
        self.outro_start = Some(self.time);
        info!(?state, time = self.time, stats = ?self.stats, "game over");
        self.events.publish(PresentationEvent::GameOver { state });

        for (_, entity) in self.arena.iter_mut() {
            entity.body.velocity = Vec2::ZERO;
        }

        if state != GameOverState::PlayerDeath {
            let outro = self.config.rules.outro_duration;
            for id in self.enemies.clone() {
                if self.is_live(id) {
                    self.begin_flee(id, outro);
                }
            }
        }
        true
    }

    fn update_outro(&mut self) {
        if self.match_ended {
            return;
        }
        let (Some(state), Some(start)) = (self.game_over, self.outro_start) else {
            return;
        };
        if self.time - start >= self.config.rules.outro_duration {
            self.match_ended = true;
            info!(?state, "match ended");
            self.events.publish(PresentationEvent::MatchEnded { state });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeaponConfig;
    use crate::enemy::{AttackCycle, AttackPhase, Reaction};
    use crate::input::Aim;
    use crate::physics::LayerMask;
    use proptest::prelude::*;

    fn world() -> GameplayManager {
        let mut config = GameplayConfig::default();
        config.spawners.clear();
        GameplayManager::new(config, 42)
    }

    fn idle() -> InputSnapshot {
        InputSnapshot::default()
    }

    fn enemy_state(manager: &GameplayManager, id: EntityId) -> Option<EnemyState> {
        manager
            .entity(id)
            .ok()
            .and_then(Entity::as_enemy)
            .map(EnemyBrain::state)
    }

    #[test]
    fn test_registration_counters() {
        let mut manager = world();
        let enemy = manager
            .spawn_enemy(Vec2::ZERO, Personality::Cautious)
            .expect("should spawn");
        let npc = manager.spawn_npc(Vec2::new(2.0, 0.0)).expect("should spawn");

        assert_eq!(manager.stats().spawned_creatures, 1);
        assert_eq!(manager.stats().spawned_npcs, 1);
        assert!(matches!(
            manager.add_enemy(enemy),
            Err(GameplayError::AlreadyRegistered(_))
        ));
        assert!(matches!(
            manager.add_enemy(npc),
            Err(GameplayError::WrongVariant { .. })
        ));

        let pending = manager.create_entity(EntityKind::Enemy, Vec2::ZERO);
        assert!(matches!(manager.add_enemy(pending), Err(GameplayError::NotActive(_))));
    }

    #[test]
    fn test_single_player() {
        let mut manager = world();
        manager.spawn_player(Vec2::ZERO).expect("first player");
        assert!(manager.spawn_player(Vec2::ONE).is_err());
        assert_eq!(manager.entities().count(), 1);
    }

    #[test]
    fn test_recycle_does_not_count_kill() {
        let mut manager = world();
        let enemy = manager
            .spawn_enemy(Vec2::ZERO, Personality::Cautious)
            .expect("should spawn");
        manager.recycle(enemy).expect("should recycle");

        assert!(manager.enemies().is_empty());
        assert_eq!(manager.stats().killed_creatures, 0);
        assert!(manager.entity(enemy).is_err());
    }

    #[test]
    fn test_targets_on_sight_ordering() {
        let mut manager = world();
        let observer = manager.spawn_npc(Vec2::ZERO).expect("should spawn");
        let player = manager.spawn_player(Vec2::new(0.0, 5.0)).expect("should spawn");
        let e1 = manager
            .spawn_enemy(Vec2::new(1.0, 0.0), Personality::Cautious)
            .expect("should spawn");
        let e2 = manager
            .spawn_enemy(Vec2::new(-3.0, 0.0), Personality::Cautious)
            .expect("should spawn");

        assert_eq!(manager.targets_on_sight(observer, &[]), vec![player, e1, e2]);
        assert_eq!(
            manager.targets_on_sight(observer, &[EntityKind::Player]),
            vec![e1, e2]
        );
    }

    proptest! {
        #[test]
        fn test_ranking_player_first_then_distance(
            player_distance in 0.8f32..5.5,
            distances in proptest::collection::vec(0.8f32..5.5, 5),
        ) {
            let mut manager = world();
            let observer = manager.spawn_npc(Vec2::ZERO).expect("should spawn");
            let player = manager
                .spawn_player(Vec2::NEG_X * player_distance)
                .expect("should spawn");

            let angles = [0.0f32, 60.0, 120.0, 240.0, 300.0];
            let mut ranked: Vec<(f32, EntityId)> = angles
                .iter()
                .zip(&distances)
                .map(|(angle, distance)| {
                    let position = Vec2::from_angle(angle.to_radians()) * *distance;
                    let id = manager
                        .spawn_enemy(position, Personality::Cautious)
                        .expect("should spawn");
                    let exact = manager.entity(id).expect("should exist").position().length();
                    (exact, id)
                })
                .collect();
            ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut expected = vec![player];
            expected.extend(ranked.into_iter().map(|(_, id)| id));
            prop_assert_eq!(manager.targets_on_sight(observer, &[]), expected);
        }
    }

    #[test]
    fn test_can_see_symmetric_in_open_field() {
        let mut manager = world();
        let a = manager.spawn_npc(Vec2::ZERO).expect("should spawn");
        let b = manager.spawn_npc(Vec2::new(3.0, 1.0)).expect("should spawn");
        assert!(manager.can_see(a, b));
        assert!(manager.can_see(b, a));

        let c = manager.spawn_npc(Vec2::new(-4.0, -4.0)).expect("should spawn");
        let d = manager.spawn_npc(Vec2::new(-4.0, -4.0)).expect("should spawn");
        assert!(manager.can_see(c, d));
        assert!(manager.can_see(d, c));

        let far = manager.spawn_npc(Vec2::new(7.0, 0.0)).expect("should spawn");
        assert!(!manager.can_see(a, far));
    }

    #[test]
    fn test_occluders_block_sight() {
        let mut manager = world();
        let a = manager.spawn_npc(Vec2::ZERO).expect("should spawn");
        let b = manager.spawn_npc(Vec2::new(4.0, 0.0)).expect("should spawn");
        let blocker = manager.spawn_npc(Vec2::new(2.0, 0.0)).expect("should spawn");
        assert!(!manager.can_see(a, b));
        assert!(manager.can_see(a, blocker));

        manager.recycle(blocker).expect("should recycle");
        assert!(manager.can_see(a, b));

        manager
            .add_wall(Vec2::new(1.8, -1.0), Vec2::new(2.2, 1.0))
            .expect("should add wall");
        assert!(!manager.can_see(a, b));
    }

    #[test]
    fn test_add_wall_rejects_inverted_extents() {
        let mut manager = world();
        assert!(matches!(
            manager.add_wall(Vec2::new(1.0, 1.0), Vec2::ZERO),
            Err(GameplayError::Common(_))
        ));
        assert!(matches!(
            manager.add_wall(Vec2::ZERO, Vec2::new(f32::NAN, 1.0)),
            Err(GameplayError::Common(_))
        ));
        assert!(manager.physics_mut().walls().is_empty());
    }

    #[test]
    fn test_visibility_mask_skips_other_layers() {
        let mut manager = world();
        let observer = manager.spawn_npc(Vec2::ZERO).expect("should spawn");
        manager.spawn_npc(Vec2::new(2.0, 0.0)).expect("should spawn");
        let target = manager
            .spawn_enemy(Vec2::new(4.0, 0.0), Personality::Cautious)
            .expect("should spawn");
        assert!(!manager.can_see(observer, target));

        manager.entity_mut(observer).expect("should exist").visibility_mask =
            LayerMask::WALL | LayerMask::PLAYER | LayerMask::ENEMY;
        assert!(manager.can_see(observer, target));

        manager
            .add_wall(Vec2::new(2.9, -1.0), Vec2::new(3.1, 1.0))
            .expect("should add wall");
        assert!(!manager.can_see(observer, target));

        manager.entity_mut(observer).expect("should exist").visibility_mask =
            LayerMask::PLAYER | LayerMask::ENEMY;
        assert!(manager.can_see(observer, target));
    }

    #[test]
    fn test_reaction_decay() {
        let mut manager = world();
        let enemy = manager
            .spawn_enemy(Vec2::ZERO, Personality::Cautious)
            .expect("should spawn");
        manager.provoke_enemy(enemy, 10.0).expect("is an enemy");

        let reaction = |m: &GameplayManager| {
            m.entity(enemy)
                .ok()
                .and_then(Entity::as_enemy)
                .map(EnemyBrain::reaction)
        };

        manager.advance(9.9, &idle());
        assert_eq!(reaction(&manager), Some(Reaction::Hostile));
        manager.advance(0.2, &idle());
        assert_eq!(reaction(&manager), Some(Reaction::Neutral));
        assert_eq!(enemy_state(&manager, enemy), Some(EnemyState::Wandering));
    }

    #[test]
    fn test_provoke_wrong_variant() {
        let mut manager = world();
        let npc = manager.spawn_npc(Vec2::ZERO).expect("should spawn");
        assert!(matches!(
            manager.provoke_enemy(npc, 1.0),
            Err(GameplayError::WrongVariant { .. })
        ));
    }

    #[test]
    fn test_shot_enemy_dies_and_counts() {
        let mut manager = world();
        let player = manager.spawn_player(Vec2::new(-4.0, 0.0)).expect("should spawn");
        let enemy = manager
            .spawn_enemy(Vec2::new(4.0, 0.0), Personality::Cautious)
            .expect("should spawn");
        assert_eq!(manager.entity(enemy).expect("should exist").life().hp(), 3);

        manager.on_shot(enemy, player);
        let hit = manager.entity(enemy).expect("should exist");
        assert_eq!(hit.life().hp(), 1);
        assert!(hit.is_ethereal());
        assert_eq!(enemy_state(&manager, enemy), Some(EnemyState::Hit));

        manager.advance(0.35, &idle());
        let recovered = manager.entity(enemy).expect("should exist");
        assert!(recovered.as_enemy().is_some_and(EnemyBrain::is_hostile));
        assert!(!recovered.is_hit());

        manager.on_shot(enemy, player);
        assert!(manager.entity(enemy).expect("should exist").is_dying());
        assert_eq!(manager.stats().killed_creatures, 0);

        manager.on_shot(enemy, player);
        manager.on_bumped(enemy, player);
        assert_eq!(manager.entity(enemy).expect("should exist").life().hp(), 0);

        for _ in 0..6 {
            manager.advance(0.2, &idle());
        }
        assert_eq!(manager.stats().killed_creatures, 1);
        assert!(manager.entity(enemy).is_err());
        assert!(manager.enemies().is_empty());
    }

    #[test]
    fn test_genocidal_outcome() {
        let mut config = GameplayConfig::default();
        config.spawners.clear();
        config.rules.victory_time = 2.0;
        config.player.base.max_hp = 1000;
        let mut manager = GameplayManager::new(config, 7);

        let player = manager.spawn_player(Vec2::new(0.0, -4.0)).expect("should spawn");
        manager
            .entity_mut(player)
            .expect("should exist")
            .set_weapon(Some(WeaponConfig {
                damage: 100,
                ..WeaponConfig::default()
            }));

        let enemies: Vec<_> = (0..10)
            .map(|i| {
                manager
                    .spawn_enemy(Vec2::new(i as f32 * 1.5 - 7.0, 3.0), Personality::Peaceful)
                    .expect("should spawn")
            })
            .collect();
        for &enemy in &enemies[..4] {
            manager.on_shot(enemy, player);
        }

        for _ in 0..10 {
            manager.advance(0.25, &idle());
        }
        assert_eq!(manager.stats().spawned_creatures, 10);
        assert_eq!(manager.stats().killed_creatures, 4);
        assert_eq!(manager.game_over_state(), GameOverState::Genocidal);
    }

    #[test]
    fn test_resistance_then_survivors_flee() {
        let mut config = GameplayConfig::default();
        config.spawners.clear();
        config.rules.victory_time = 1.0;
        config.rules.outro_duration = 0.5;
        let mut manager = GameplayManager::new(config, 3);
        manager.spawn_player(Vec2::new(0.0, -4.0)).expect("should spawn");
        let enemy = manager
            .spawn_enemy(Vec2::new(5.0, 3.0), Personality::Peaceful)
            .expect("should spawn");

        for _ in 0..5 {
            manager.advance(0.25, &idle());
        }
        assert_eq!(manager.game_over_state(), GameOverState::Resistance);
        assert!(manager
            .entity(enemy)
            .ok()
            .and_then(Entity::as_enemy)
            .is_some_and(EnemyBrain::is_fleeing));
        assert!(!manager.set_game_over(GameOverState::PlayerDeath));

        for _ in 0..4 {
            manager.advance(0.25, &idle());
        }
        assert!(manager.match_ended());
        assert!(manager.entity(enemy).is_err());
        assert_eq!(manager.stats().killed_creatures, 0);
        let events = manager.drain_events();
        assert!(events.contains(&PresentationEvent::GameOver {
            state: GameOverState::Resistance
        }));
        assert!(events.contains(&PresentationEvent::MatchEnded {
            state: GameOverState::Resistance
        }));
    }

    #[test]
    fn test_player_death_is_immediate() {
        let mut config = GameplayConfig::default();
        config.spawners.clear();
        config.player.base.max_hp = 1;
        let mut manager = GameplayManager::new(config, 1);
        let player = manager.spawn_player(Vec2::ZERO).expect("should spawn");
        let enemy = manager
            .spawn_enemy(Vec2::new(3.0, 0.0), Personality::Aggressive)
            .expect("should spawn");

        manager.on_bumped(player, enemy);
        assert_eq!(manager.game_over_state(), GameOverState::PlayerDeath);
        assert!(manager.entity(player).expect("should exist").is_dying());
    }

    #[test]
    fn test_pause_freezes_clock() {
        let mut manager = world();
        let enemy = manager
            .spawn_enemy(Vec2::ZERO, Personality::Cautious)
            .expect("should spawn");
        manager.set_paused(true);
        manager.advance(1.0, &idle());
        assert_eq!(manager.time(), 0.0);
        assert_eq!(manager.entity(enemy).expect("should exist").position(), Vec2::ZERO);

        manager.set_paused(false);
        manager.advance(0.5, &idle());
        assert_eq!(manager.time(), 0.5);
    }

    #[test]
    fn test_dialogue_within_talk_distance() {
        let mut manager = world();
        manager.spawn_player(Vec2::ZERO).expect("should spawn");
        let near = manager.spawn_npc(Vec2::new(0.5, 0.0)).expect("should spawn");
        manager.spawn_npc(Vec2::new(3.0, 0.0)).expect("should spawn");

        assert_eq!(manager.on_player_action(), vec![near]);
        let events = manager.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            PresentationEvent::Dialogue { entity_id, message } if *entity_id == near && message == "We're doomed!!"
        )));
    }

    #[test]
    fn test_action_edge_triggers_dialogue_once() {
        let mut manager = world();
        manager.spawn_player(Vec2::ZERO).expect("should spawn");
        manager.spawn_npc(Vec2::new(0.0, 0.6)).expect("should spawn");
        let held = InputSnapshot {
            action_held: true,
            ..InputSnapshot::default()
        };

        manager.advance(0.01, &held);
        manager.advance(0.01, &held);
        let dialogues = manager
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, PresentationEvent::Dialogue { .. }))
            .count();
        assert_eq!(dialogues, 1);
    }

    #[test]
    fn test_witness_propagation() {
        let mut manager = world();
        let player = manager.spawn_player(Vec2::new(0.0, -4.0)).expect("should spawn");
        let victim = manager
            .spawn_enemy(Vec2::new(0.0, 0.0), Personality::Cautious)
            .expect("should spawn");
        let witness = manager
            .spawn_enemy(Vec2::new(2.0, 0.0), Personality::Cautious)
            .expect("should spawn");
        let peaceful = manager
            .spawn_enemy(Vec2::new(-2.0, 0.0), Personality::Peaceful)
            .expect("should spawn");

        manager.on_shot(victim, player);
        let hostile = |id| {
            manager
                .entity(id)
                .ok()
                .and_then(Entity::as_enemy)
                .is_some_and(EnemyBrain::is_hostile)
        };
        assert!(hostile(witness));
        assert!(!hostile(peaceful));
        assert!(!hostile(victim));
    }

    #[test]
    fn test_player_shoots_first_valid_target() {
        let mut manager = world();
        let player = manager.spawn_player(Vec2::ZERO).expect("should spawn");
        let near = manager
            .spawn_enemy(Vec2::new(2.0, 0.0), Personality::Cautious)
            .expect("should spawn");
        let far = manager
            .spawn_enemy(Vec2::new(4.0, 0.0), Personality::Cautious)
            .expect("should spawn");

        let hits = manager.shoot(player).expect("player is armed");
        assert_eq!(hits, vec![near]);
        assert_eq!(manager.entity(far).expect("should exist").life().hp(), 3);
        assert!(manager.shoot(player).expect("player is armed").is_empty());

        let npc = manager.spawn_npc(Vec2::new(0.0, 3.0)).expect("should spawn");
        assert!(matches!(manager.shoot(npc), Err(GameplayError::Unarmed(_))));
    }

    #[test]
    fn test_extermination() {
        let mut config = GameplayConfig::default();
        config.spawners = vec![crate::config::SpawnerConfig {
            max_spawns: 1,
            position: Vec2::new(6.0, 3.0),
            ..crate::config::SpawnerConfig::default()
        }];
        config.player.weapon.damage = 100;
        let mut manager = GameplayManager::new(config, 9);
        let player = manager.start_match().expect("should start");

        manager.advance(0.01, &idle());
        let enemy = manager.enemies()[0];
        assert!(manager.spawners_depleted());
        manager.on_shot(enemy, player);

        for _ in 0..8 {
            manager.advance(0.25, &idle());
        }
        assert_eq!(manager.game_over_state(), GameOverState::Extermination);
    }

    #[test]
    fn test_initialize_rejects_dead_player() {
        let mut config = GameplayConfig::default();
        config.spawners.clear();
        config.player.base.max_hp = 1;
        let mut manager = GameplayManager::new(config, 4);
        let player = manager.spawn_player(Vec2::ZERO).expect("should spawn");
        let enemy = manager
            .spawn_enemy(Vec2::new(3.0, 0.0), Personality::Aggressive)
            .expect("should spawn");

        manager.on_bumped(player, enemy);
        for _ in 0..8 {
            manager.advance(0.25, &idle());
        }

        assert!(matches!(
            manager.initialize_entity(player, 5, 2.0),
            Err(GameplayError::NotActive(_))
        ));
        let dead = manager.entity(player).expect("should exist");
        assert!(dead.is_dying());
        assert!(!dead.is_active());
        assert_eq!(dead.life().hp(), 0);
        assert_eq!(manager.game_over_state(), GameOverState::PlayerDeath);
    }

    #[test]
    fn test_initialize_rejects_registered_enemy() {
        let mut manager = world();
        let player = manager.spawn_player(Vec2::new(-4.0, 0.0)).expect("should spawn");
        let enemy = manager
            .spawn_enemy(Vec2::new(4.0, 0.0), Personality::Cautious)
            .expect("should spawn");
        manager.on_shot(enemy, player);

        assert!(matches!(
            manager.initialize_entity(enemy, 3, 1.0),
            Err(GameplayError::AlreadyRegistered(id)) if id == enemy
        ));
        let hurt = manager.entity(enemy).expect("should exist");
        assert_eq!(hurt.life().hp(), 1);
        assert!(hurt.is_hit());
        assert_eq!(manager.enemies(), &[enemy]);
    }

    #[test]
    fn test_kills_frozen_after_game_over() {
        let mut config = GameplayConfig::default();
        config.spawners.clear();
        config.player.base.max_hp = 1;
        let mut manager = GameplayManager::new(config, 8);
        let player = manager.spawn_player(Vec2::ZERO).expect("should spawn");
        let enemy = manager
            .spawn_enemy(Vec2::new(3.0, 0.0), Personality::Aggressive)
            .expect("should spawn");
        let npc = manager.spawn_npc(Vec2::new(0.0, 3.0)).expect("should spawn");

        manager.on_shot(npc, player);
        assert!(manager.entity(npc).expect("should exist").is_dying());
        manager.on_bumped(player, enemy);
        assert_eq!(manager.game_over_state(), GameOverState::PlayerDeath);

        for _ in 0..8 {
            manager.advance(0.25, &idle());
        }
        assert!(manager.entity(npc).is_err());
        assert!(manager.npcs().is_empty());
        assert_eq!(manager.stats().killed_npcs, 0);
        assert_eq!(manager.stats().killed_creatures, 0);
    }

    #[test]
    fn test_chase_turns_into_attack_at_distance() {
        let mut manager = world();
        manager.spawn_player(Vec2::ZERO).expect("should spawn");
        let enemy = manager
            .spawn_enemy(Vec2::new(2.0, 0.0), Personality::Aggressive)
            .expect("should spawn");

        manager.advance(0.05, &idle());
        assert_eq!(enemy_state(&manager, enemy), Some(EnemyState::Chasing));

        for _ in 0..40 {
            if enemy_state(&manager, enemy) == Some(EnemyState::Attacking) {
                break;
            }
            manager.advance(0.05, &idle());
        }

        let attacker = manager.entity(enemy).expect("should exist");
        let phase = attacker.as_enemy().and_then(EnemyBrain::attack).map(AttackCycle::phase);
        assert_eq!(phase, Some(AttackPhase::Prepare));
        let distance = attacker.position().length();
        assert!(distance > 0.8, "attacked too close: {distance}");
        assert!(distance < 0.95, "attacked too far: {distance}");
    }

    #[test]
    fn test_contact_forces_recover() {
        let mut manager = world();
        manager.spawn_player(Vec2::ZERO).expect("should spawn");
        let chaser = manager
            .spawn_enemy(Vec2::new(3.0, 0.0), Personality::Aggressive)
            .expect("should spawn");
        manager
            .spawn_enemy(Vec2::new(2.8, 0.35), Personality::Peaceful)
            .expect("should spawn");

        manager.advance(0.05, &idle());
        let brain = manager
            .entity(chaser)
            .ok()
            .and_then(Entity::as_enemy)
            .expect("should be an enemy");
        assert_eq!(brain.state(), EnemyState::Attacking);
        assert_eq!(brain.attack().map(AttackCycle::phase), Some(AttackPhase::Recover));

        manager.advance(0.6, &idle());
        assert_eq!(enemy_state(&manager, chaser), Some(EnemyState::Chasing));
    }

    #[test]
    fn test_contact_ignored_while_wandering() {
        let mut manager = world();
        let enemy = manager
            .spawn_enemy(Vec2::ZERO, Personality::Cautious)
            .expect("should spawn");
        let npc = manager.spawn_npc(Vec2::new(0.4, 0.0)).expect("should spawn");

        manager.on_contact_begin(enemy, npc);
        assert_eq!(enemy_state(&manager, enemy), Some(EnemyState::Wandering));
        assert!(manager
            .entity(enemy)
            .ok()
            .and_then(Entity::as_enemy)
            .and_then(EnemyBrain::attack)
            .is_none());
    }

    #[test]
    fn test_piercing_shot_hits_every_valid_target() {
        let mut manager = world();
        let player = manager.spawn_player(Vec2::ZERO).expect("should spawn");
        manager
            .entity_mut(player)
            .expect("should exist")
            .set_weapon(Some(WeaponConfig {
                piercing: true,
                range: 10.0,
                ..WeaponConfig::default()
            }));
        let near = manager
            .spawn_enemy(Vec2::new(2.0, 0.0), Personality::Cautious)
            .expect("should spawn");
        let far = manager
            .spawn_enemy(Vec2::new(4.0, 0.0), Personality::Cautious)
            .expect("should spawn");
        let behind_wall = manager
            .spawn_enemy(Vec2::new(7.0, 0.0), Personality::Cautious)
            .expect("should spawn");
        manager
            .add_wall(Vec2::new(5.8, -1.0), Vec2::new(6.2, 1.0))
            .expect("should add wall");

        let hits = manager.shoot(player).expect("player is armed");
        assert_eq!(hits, vec![near, far]);
        assert_eq!(manager.entity(near).expect("should exist").life().hp(), 1);
        assert_eq!(manager.entity(far).expect("should exist").life().hp(), 1);
        assert_eq!(manager.entity(behind_wall).expect("should exist").life().hp(), 3);

        let shot_end = manager.drain_events().into_iter().find_map(|e| match e {
            PresentationEvent::ShotFired { to, .. } => Some(to),
            _ => None,
        });
        assert!(shot_end.is_some_and(|to| (to.x - 5.8).abs() < 1e-3));
    }

    #[test]
    fn test_fleeing_enemy_outruns_and_leaves_bounds() {
        let mut manager = world();
        manager.spawn_player(Vec2::ZERO).expect("should spawn");
        let enemy = manager
            .spawn_enemy(Vec2::new(7.5, 0.0), Personality::Peaceful)
            .expect("should spawn");

        assert!(manager.set_game_over(GameOverState::Resistance));
        manager.advance(0.5, &idle());

        let runner = manager.entity(enemy).expect("should exist");
        assert!(runner.as_enemy().is_some_and(EnemyBrain::is_fleeing));
        assert!(!runner.body.collision_enabled);
        assert!((runner.body.velocity.length() - 1.5).abs() < 1e-4);
        assert!(runner.position().x > 8.0);
    }

    #[test]
    fn test_psychopath_outcome() {
        let mut config = GameplayConfig::default();
        config.spawners.clear();
        config.rules.victory_time = 2.0;
        config.player.weapon.damage = 100;
        let mut manager = GameplayManager::new(config, 12);
        manager.spawn_player(Vec2::new(0.0, -2.0)).expect("should spawn");
        let npc = manager.spawn_npc(Vec2::new(0.0, 2.0)).expect("should spawn");

        let trigger = InputSnapshot {
            aim: Aim::Point(Vec2::new(0.0, 2.0)),
            shoot_held: true,
            ..InputSnapshot::default()
        };
        manager.advance(0.25, &trigger);
        assert!(manager.entity(npc).expect("should exist").is_dying());

        for _ in 0..9 {
            manager.advance(0.25, &idle());
        }
        assert_eq!(manager.stats().killed_npcs, 1);
        assert_eq!(manager.game_over_state(), GameOverState::Psychopath);
    }
}
