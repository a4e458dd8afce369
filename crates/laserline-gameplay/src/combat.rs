//! Sight queries and the damage pipeline.
//!
//! All damage flows through [`GameplayManager::on_bumped`] and
//! [`GameplayManager::on_shot`]. Both end in the same branch: a killing blow
//! starts the death fade, anything else starts hit recovery.

use tracing::{debug, info};

use laserline_common::{EntityId, Vec2};

use crate::entity::{DeathFade, EntityKind, Variant};
use crate::error::{GameplayError, GameplayResult};
use crate::events::{PresentationEvent, SoundCue};
use crate::manager::GameplayManager;
use crate::outcome::GameOverState;
use crate::physics::{ColliderRef, LayerMask};

/// Damage dealt by touching a hostile entity.
pub const CONTACT_DAMAGE: i32 = 1;

impl GameplayManager {
    /// Checks if `observer` has an unobstructed line of sight to `target`.
    ///
    /// A ray is cast from the observer toward the target, up to the
    /// observer's sight radius, against colliders in its visibility mask.
    /// Sight holds only when the first such collider is the target.
    #[must_use]
    pub fn can_see(&self, observer: EntityId, target: EntityId) -> bool {
        if observer == target {
            return false;
        }
        let (Ok(from), Ok(to)) = (self.arena.get(observer), self.arena.get(target)) else {
            return false;
        };
        if !from.active || !to.active {
            return false;
        }

        let delta = to.position() - from.position();
        if delta.length() > from.sight_radius {
            return false;
        }
        let dir = delta.try_normalize().unwrap_or(Vec2::X);

        self.physics
            .raycast(
                self.bodies(),
                from.position(),
                dir,
                from.sight_radius,
                from.visibility_mask,
                Some(observer),
            )
            .is_some_and(|hit| hit.collider == ColliderRef::Entity(target))
    }

    /// Returns live entities visible to `observer`, best target first.
    ///
    /// The player always ranks first; everyone else is ordered by ascending
    /// distance to the observer.
    #[must_use]
    pub fn targets_on_sight(&self, observer: EntityId, excluded: &[EntityKind]) -> Vec<EntityId> {
        let Ok(origin) = self.arena.get(observer).map(|e| e.position()) else {
            return Vec::new();
        };

        let mut found: Vec<(EntityId, bool, f32)> = self
            .arena
            .iter()
            .filter(|(id, e)| {
                *id != observer && e.active && !e.is_dying() && !excluded.contains(&e.kind())
            })
            .filter(|(id, _)| self.can_see(observer, *id))
            .map(|(id, e)| (id, e.kind() == EntityKind::Player, e.position().distance(origin)))
            .collect();

        found.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.total_cmp(&b.2)));
        found.into_iter().map(|(id, _, _)| id).collect()
    }

    /// Checks if `id` resolves to an active entity that is not dying.
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.arena
            .get(id)
            .is_ok_and(|e| e.active && !e.is_dying())
    }

    /// Checks if the entity may fire now.
    #[must_use]
    pub fn can_shoot(&self, id: EntityId) -> bool {
        self.arena
            .get(id)
            .is_ok_and(|e| e.active && e.can_shoot(self.time))
    }

    /// Delivers contact damage from `other` to `victim`.
    ///
    /// Ignored while either side is ethereal or when `victim` is not hurt by
    /// touching `other`.
    pub fn on_bumped(&mut self, victim: EntityId, other: EntityId) {
        let (Ok(target), Ok(source)) = (self.arena.get(victim), self.arena.get(other)) else {
            return;
        };
        if !target.active || target.is_ethereal() || !target.can_bump_entity(source) {
            return;
        }
        debug!(%victim, %other, "bumped");
        self.apply_damage(victim, other, CONTACT_DAMAGE);
    }

    /// Delivers a shot from `shooter` to `victim`.
    ///
    /// Damage is the shooter's weapon damage, or its melee damage when
    /// unarmed. The victim is pushed away from the shooter by the recoil.
    pub fn on_shot(&mut self, victim: EntityId, shooter: EntityId) {
        let Ok(source) = self.arena.get(shooter) else {
            return;
        };
        let (damage, recoil) = source
            .weapon
            .map_or((source.melee_damage, source.recoil), |w| (w.damage, w.recoil));
        let origin = source.position();

        let Ok(target) = self.arena.get_mut(victim) else {
            return;
        };
        if !target.active || target.is_dying() {
            return;
        }
        let push = (target.position() - origin).try_normalize().unwrap_or(Vec2::ZERO);
        target.body.position += push * recoil;

        debug!(%victim, %shooter, damage, "shot");
        self.apply_damage(victim, shooter, damage);
    }

    fn apply_damage(&mut self, victim: EntityId, attacker: EntityId, amount: i32) {
        let now = self.time;
        let Ok(target) = self.arena.get_mut(victim) else {
            return;
        };
        let died = target.life.apply_delta(-amount);
        let kind = target.kind();

        self.events.publish(PresentationEvent::Sound {
            cue: SoundCue::Hit,
            entity_id: victim,
        });

        if died {
            if let Ok(source) = self.arena.get_mut(attacker) {
                source.hit_landed();
                if source.kind() == EntityKind::Player {
                    self.events.publish(PresentationEvent::CameraShake);
                }
            }
            self.begin_death(victim);
            return;
        }

        if target.hit_reaction() {
            target.hit_time = Some(now);
            let opacity = target.opacity;
            self.events.publish(PresentationEvent::HitFlash { entity_id: victim });
            self.events.publish(PresentationEvent::OpacityChanged {
                entity_id: victim,
                opacity,
            });
        }
        if kind == EntityKind::Enemy {
            self.on_enemy_was_hit(victim);
        }
    }

    /// Fires the entity's weapon along its orientation.
    ///
    /// Returns the entities hit. A wall stops the shot. Entities the shooter
    /// cannot affect are passed through. A non-piercing shot stops at the
    /// first valid hit.
    pub fn shoot(&mut self, shooter: EntityId) -> GameplayResult<Vec<EntityId>> {
        let now = self.time;
        let source = self.arena.get(shooter)?;
        if !source.active {
            return Err(GameplayError::NotActive(shooter));
        }
        let weapon = source.weapon.ok_or(GameplayError::Unarmed(shooter))?;
        if !source.can_shoot(now) {
            return Ok(Vec::new());
        }

        let origin = source.position();
        let dir = source.orientation.try_normalize().unwrap_or(Vec2::X);
        let hits = self.physics.raycast_all(
            self.bodies(),
            origin,
            dir,
            weapon.range,
            LayerMask::ALL,
            Some(shooter),
        );

        let mut end = origin + dir * weapon.range;
        let mut victims = Vec::new();
        for hit in hits {
            match hit.collider {
                ColliderRef::Wall(_) => {
                    end = hit.point;
                    break;
                },
                ColliderRef::Entity(id) => {
                    let valid = self
                        .arena
                        .get(id)
                        .is_ok_and(|t| t.active && !t.is_dying() && source.can_shoot_entity(t));
                    if !valid {
                        continue;
                    }
                    victims.push(id);
                    if !weapon.piercing {
                        end = hit.point;
                        break;
                    }
                },
            }
        }

        for &victim in &victims {
            self.on_shot(victim, shooter);
        }

        if let Ok(source) = self.arena.get_mut(shooter) {
            source.body.position -= dir * source.recoil;
            source.last_shoot_time = Some(now);
        }
        self.events.publish(PresentationEvent::ShotFired {
            shooter,
            from: origin,
            to: end,
        });
        self.events.publish(PresentationEvent::Sound {
            cue: SoundCue::Shoot,
            entity_id: shooter,
        });

        Ok(victims)
    }

    /// Starts the death sequence of an entity.
    pub(crate) fn begin_death(&mut self, id: EntityId) {
        let now = self.time;
        let Ok(kind) = self.arena.get(id).map(|e| e.kind()) else {
            return;
        };

        if kind == EntityKind::Enemy {
            self.on_enemy_died(id);
        }

        let Ok(entity) = self.arena.get_mut(id) else {
            return;
        };
        entity.set_dying();
        entity.body.collision_enabled = false;
        entity.body.kinematic = false;
        entity.body.velocity = Vec2::ZERO;
        entity.hit_time = None;
        entity.target = None;
        entity.death = Some(DeathFade {
            start: now,
            length: entity.death_fade_length,
        });
        info!(%id, ?kind, "entity dying");

        self.events.publish(PresentationEvent::Sound {
            cue: SoundCue::Death,
            entity_id: id,
        });
        self.release_contacts(id);

        if kind == EntityKind::Player {
            self.set_game_over(GameOverState::PlayerDeath);
        }
    }

    /// Advances every running death fade.
    pub(crate) fn update_deaths(&mut self) {
        if self.paused {
            return;
        }
        let now = self.time;

        let fading: Vec<EntityId> = self
            .arena
            .iter()
            .filter(|(_, e)| e.death.is_some())
            .map(|(id, _)| id)
            .collect();

        for id in fading {
            let Ok(entity) = self.arena.get_mut(id) else {
                continue;
            };
            let Some(fade) = entity.death else {
                continue;
            };

            if fade.is_complete(now) {
                entity.opacity = 1.0;
                entity.death = None;
                entity.set_dead();
                self.on_died(id);
            } else {
                let opacity = 1.0 - fade.progress(now);
                entity.opacity = opacity;
                self.events.publish(PresentationEvent::OpacityChanged {
                    entity_id: id,
                    opacity,
                });
            }
        }
    }

    /// Deregisters an entity whose death fade completed.
    fn on_died(&mut self, id: EntityId) {
        let Ok(kind) = self.arena.get(id).map(|e| e.kind()) else {
            return;
        };
        info!(%id, ?kind, "entity died");
        self.events.publish(PresentationEvent::EntityDied { entity_id: id });

        match kind {
            EntityKind::Enemy => {
                self.remove_enemy(id, true);
                self.despawn(id);
            },
            EntityKind::Npc => {
                self.remove_npc(id, true);
                self.despawn(id);
            },
            EntityKind::Player => {},
        }
    }

    /// Ends hit recovery once `hit_recovery` seconds have passed.
    pub(crate) fn update_hit(&mut self, id: EntityId) {
        if self.paused {
            return;
        }
        let now = self.time;
        let Ok(entity) = self.arena.get_mut(id) else {
            return;
        };
        if !entity.is_hit() {
            return;
        }

        let recovered = entity
            .hit_time
            .map_or(true, |t| now - t >= entity.hit_recovery);
        if recovered {
            entity.on_hit_finished(now);
            if let Variant::Enemy(brain) = &entity.variant {
                debug!(%id, state = ?brain.state(), "hit recovered");
            }
            self.events.publish(PresentationEvent::OpacityChanged {
                entity_id: id,
                opacity: 1.0,
            });
        }
    }

    /// Tells every other enemy that sees `id` that it was hit.
    pub fn on_enemy_was_hit(&mut self, id: EntityId) {
        self.broadcast_witness(id);
    }

    /// Tells every other enemy that sees `id` that it died.
    pub fn on_enemy_died(&mut self, id: EntityId) {
        self.broadcast_witness(id);
    }

    fn broadcast_witness(&mut self, id: EntityId) {
        let now = self.time;
        let witnesses: Vec<EntityId> = self
            .enemies
            .iter()
            .copied()
            .filter(|&other| other != id && self.is_live(other) && self.can_see(other, id))
            .collect();

        for witness in witnesses {
            if let Some(brain) = self.arena.get_mut(witness).ok().and_then(|e| e.as_enemy_mut()) {
                brain.witness(now);
                debug!(%witness, seen = %id, "witnessed");
            }
        }
    }
}
