//! Timed enemy spawners and the starting NPC population.

use tracing::{debug, info, warn};

use laserline_common::EntityId;

use crate::config::SpawnerConfig;
use crate::manager::GameplayManager;

/// Spawns enemies on a random timer until it runs out of spawns.
#[derive(Debug, Clone)]
pub struct EnemySpawner {
    config: SpawnerConfig,
    spawned: u32,
    last_spawn: f32,
    next_interval: f32,
    alive: Vec<EntityId>,
}

impl EnemySpawner {
    /// Creates a spawner whose first spawn is due immediately.
    #[must_use]
    pub fn new(config: SpawnerConfig, now: f32) -> Self {
        Self {
            config,
            spawned: 0,
            last_spawn: now,
            next_interval: 0.0,
            alive: Vec::new(),
        }
    }

    /// Returns the spawner configuration.
    #[must_use]
    pub const fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Returns how many enemies this spawner produced.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Returns the live enemies this spawner produced.
    #[must_use]
    pub fn alive(&self) -> &[EntityId] {
        &self.alive
    }

    /// Checks if the spawner reached its total spawn count.
    #[must_use]
    pub const fn depleted(&self) -> bool {
        self.spawned >= self.config.max_spawns
    }

    /// Checks if the spawn timer elapsed.
    #[must_use]
    pub fn is_due(&self, now: f32) -> bool {
        !self.depleted() && now - self.last_spawn >= self.next_interval
    }

    /// Checks if another enemy fits under the concurrent cap.
    #[must_use]
    pub fn has_room(&self) -> bool {
        (self.alive.len() as u32) < self.config.max_alive
    }

    /// Restarts the timer with a random interval.
    pub fn reset_timer(&mut self, now: f32, rng: &mut fastrand::Rng) {
        let span = self.config.max_spawn_interval - self.config.min_spawn_interval;
        self.next_interval = self.config.min_spawn_interval + rng.f32() * span.max(0.0);
        self.last_spawn = now;
    }

    /// Records a spawned enemy.
    pub fn record(&mut self, id: EntityId) {
        self.spawned += 1;
        self.alive.push(id);
    }

    /// Forgets an enemy returned to the pool. Returns true if it was ours.
    pub fn release(&mut self, id: EntityId) -> bool {
        let before = self.alive.len();
        self.alive.retain(|&alive| alive != id);
        self.alive.len() != before
    }
}

impl GameplayManager {
    /// Runs every spawner whose timer elapsed.
    pub(crate) fn update_spawners(&mut self) {
        if self.paused || self.game_over.is_some() {
            return;
        }
        let now = self.time;

        for index in 0..self.spawners.len() {
            if !self.spawners[index].is_due(now) {
                continue;
            }
            self.spawners[index].reset_timer(now, &mut self.rng);
            if !self.spawners[index].has_room() {
                debug!(index, "spawner at capacity");
                continue;
            }

            let config = *self.spawners[index].config();
            match self.spawn_enemy(config.position, config.personality) {
                Ok(id) => {
                    self.spawners[index].record(id);
                    if self.spawners[index].depleted() {
                        info!(index, "spawner depleted");
                    }
                },
                Err(err) => warn!(index, %err, "spawn failed"),
            }
        }
    }

    /// Checks if every spawner ran out of spawns.
    #[must_use]
    pub fn spawners_depleted(&self) -> bool {
        !self.spawners.is_empty() && self.spawners.iter().all(EnemySpawner::depleted)
    }

    /// Places the configured NPC population at random points.
    pub(crate) fn populate_npcs(&mut self) {
        for _ in 0..self.config.npc.population {
            let position = self.bounds.random_point(&mut self.rng);
            if let Err(err) = self.spawn_npc(position) {
                warn!(%err, "npc spawn failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SpawnerConfig {
        SpawnerConfig {
            max_spawns: 2,
            max_alive: 1,
            ..SpawnerConfig::default()
        }
    }

    #[test]
    fn test_first_spawn_due_immediately() {
        let spawner = EnemySpawner::new(config(), 5.0);
        assert!(spawner.is_due(5.0));
        assert!(spawner.has_room());
    }

    #[test]
    fn test_timer_interval_in_range() {
        let mut spawner = EnemySpawner::new(config(), 0.0);
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..32 {
            spawner.reset_timer(0.0, &mut rng);
            assert!(!spawner.is_due(1.49));
            assert!(spawner.is_due(4.0));
        }
    }

    #[test]
    fn test_depletion_and_release() {
        let mut spawner = EnemySpawner::new(config(), 0.0);
        let a = EntityId::new(0, 0);
        let b = EntityId::new(1, 0);

        spawner.record(a);
        assert!(!spawner.has_room());
        assert!(spawner.release(a));
        assert!(!spawner.release(a));
        assert!(spawner.has_room());

        spawner.record(b);
        assert!(spawner.depleted());
        assert!(!spawner.is_due(100.0));
        assert_eq!(spawner.spawned(), 2);
    }
}
