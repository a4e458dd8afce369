//! Minimal top-down physics.
//!
//! Bodies are circles owned by their entities; the [`PhysicsWorld`] owns the
//! static walls and the set of active contacts. Each step integrates
//! velocities, resolves walls and bounds, separates overlapping bodies and
//! reports contact begin/end transitions.

use std::collections::HashSet;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use laserline_common::{ray_circle, EntityId, Rect, Vec2};

/// Extra distance added when separating bodies so resolved pairs stop touching.
const SEPARATION_SLOP: f32 = 1e-4;

/// Bit set of collision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// No layers
    pub const NONE: Self = Self(0);
    /// Static walls
    pub const WALL: Self = Self(1);
    /// Player body
    pub const PLAYER: Self = Self(1 << 1);
    /// Enemy bodies
    pub const ENEMY: Self = Self(1 << 2);
    /// NPC bodies
    pub const NPC: Self = Self(1 << 3);
    /// Every layer
    pub const ALL: Self = Self(u32::MAX);

    /// Checks if every bit of `other` is set in this mask.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Checks if this mask shares any bit with `other`.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Circular rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// World position
    pub position: Vec2,
    /// Velocity in units per second
    pub velocity: Vec2,
    /// Collision radius
    pub radius: f32,
    /// Layer this body lives on
    pub layer: LayerMask,
    /// Whether the body collides and can be hit by rays
    pub collision_enabled: bool,
    /// Locked in place while touching another body
    pub kinematic: bool,
}

impl Body {
    /// Creates a collidable body at rest.
    #[must_use]
    pub fn new(position: Vec2, radius: f32, layer: LayerMask) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius,
            layer,
            collision_enabled: true,
            kinematic: false,
        }
    }
}

/// What a ray hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColliderRef {
    /// An entity body
    Entity(EntityId),
    /// A static wall, by index
    Wall(usize),
}

/// A single ray intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Collider hit
    pub collider: ColliderRef,
    /// Distance along the ray
    pub distance: f32,
    /// World point of the hit
    pub point: Vec2,
}

/// Contact transition between two bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    /// Bodies started touching
    Begin(EntityId, EntityId),
    /// Bodies stopped touching
    End(EntityId, EntityId),
}

fn ordered(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Static geometry plus contact bookkeeping.
#[derive(Debug, Default)]
pub struct PhysicsWorld {
    walls: Vec<Rect>,
    contacts: HashSet<(EntityId, EntityId)>,
}

impl PhysicsWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a wall and returns its index.
    pub fn add_wall(&mut self, wall: Rect) -> usize {
        self.walls.push(wall);
        self.walls.len() - 1
    }

    /// Returns all walls.
    #[must_use]
    pub fn walls(&self) -> &[Rect] {
        &self.walls
    }

    /// Checks if two bodies are currently touching.
    #[must_use]
    pub fn in_contact(&self, a: EntityId, b: EntityId) -> bool {
        self.contacts.contains(&ordered(a, b))
    }

    /// Drops every contact involving `id`, returning the matching end events.
    pub fn forget(&mut self, id: EntityId) -> Vec<ContactEvent> {
        let gone: Vec<_> = self
            .contacts
            .iter()
            .copied()
            .filter(|(a, b)| *a == id || *b == id)
            .collect();
        gone.into_iter()
            .map(|pair| {
                self.contacts.remove(&pair);
                ContactEvent::End(pair.0, pair.1)
            })
            .collect()
    }

    /// Clears walls and contacts.
    pub fn clear(&mut self) {
        self.walls.clear();
        self.contacts.clear();
    }

    /// Forgets every contact, keeping the walls.
    pub fn clear_contacts(&mut self) {
        self.contacts.clear();
    }

    /// Returns every hit along a ray, nearest first.
    ///
    /// Bodies with collision disabled, bodies outside `mask` and `exclude`
    /// are ignored. Walls are considered when `mask` includes
    /// [`LayerMask::WALL`].
    pub fn raycast_all<'a, I>(
        &self,
        bodies: I,
        origin: Vec2,
        dir: Vec2,
        max_distance: f32,
        mask: LayerMask,
        exclude: Option<EntityId>,
    ) -> Vec<RayHit>
    where
        I: IntoIterator<Item = (EntityId, &'a Body)>,
    {
        let Some(dir) = dir.try_normalize() else {
            return Vec::new();
        };

        let mut hits = Vec::new();

        if mask.intersects(LayerMask::WALL) {
            for (index, wall) in self.walls.iter().enumerate() {
                if let Some(distance) = wall.ray_entry(origin, dir, max_distance) {
                    hits.push(RayHit {
                        collider: ColliderRef::Wall(index),
                        distance,
                        point: origin + dir * distance,
                    });
                }
            }
        }

        for (id, body) in bodies {
            if Some(id) == exclude || !body.collision_enabled || !mask.intersects(body.layer) {
                continue;
            }
            if let Some(distance) = ray_circle(origin, dir, max_distance, body.position, body.radius) {
                hits.push(RayHit {
                    collider: ColliderRef::Entity(id),
                    distance,
                    point: origin + dir * distance,
                });
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Returns the nearest hit along a ray.
    pub fn raycast<'a, I>(
        &self,
        bodies: I,
        origin: Vec2,
        dir: Vec2,
        max_distance: f32,
        mask: LayerMask,
        exclude: Option<EntityId>,
    ) -> Option<RayHit>
    where
        I: IntoIterator<Item = (EntityId, &'a Body)>,
    {
        self.raycast_all(bodies, origin, dir, max_distance, mask, exclude)
            .into_iter()
            .next()
    }

    /// Advances the bodies by `dt` and reports contact transitions.
    ///
    /// Collidable bodies are pushed out of walls and kept inside `bounds`.
    /// A body is kinematic while it touches another body and does not
    /// integrate its velocity during that time.
    pub fn step(&mut self, bodies: &mut [(EntityId, Body)], dt: f32, bounds: Rect) -> Vec<ContactEvent> {
        for (_, body) in bodies.iter_mut() {
            if body.kinematic {
                body.velocity = Vec2::ZERO;
                continue;
            }
            body.position += body.velocity * dt;

            if body.collision_enabled {
                for wall in &self.walls {
                    body.position = push_out_of_rect(wall, body.position, body.radius);
                }
                body.position = bounds.clamp(body.position);
            }
        }

        let mut current = HashSet::new();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let (left, right) = bodies.split_at_mut(j);
                let (id_a, a) = &mut left[i];
                let (id_b, b) = &mut right[0];
                if !a.collision_enabled || !b.collision_enabled {
                    continue;
                }

                let delta = b.position - a.position;
                let reach = a.radius + b.radius;
                let distance = delta.length();
                if distance >= reach {
                    continue;
                }

                let normal = delta.try_normalize().unwrap_or(Vec2::X);
                let push = (reach - distance + SEPARATION_SLOP) * 0.5;
                a.position -= normal * push;
                b.position += normal * push;
                current.insert(ordered(*id_a, *id_b));
            }
        }

        let mut events: Vec<ContactEvent> = current
            .difference(&self.contacts)
            .map(|(a, b)| ContactEvent::Begin(*a, *b))
            .collect();
        events.extend(
            self.contacts
                .difference(&current)
                .map(|(a, b)| ContactEvent::End(*a, *b)),
        );
        events.sort_by_key(|event| match event {
            ContactEvent::Begin(a, b) | ContactEvent::End(a, b) => (*a, *b),
        });

        for (id, body) in bodies.iter_mut() {
            let id = *id;
            body.kinematic = current.iter().any(|&(a, b)| a == id || b == id);
            if body.kinematic {
                body.velocity = Vec2::ZERO;
            }
        }

        self.contacts = current;
        events
    }
}

/// Pushes a circle out of a rectangle along the shortest axis.
fn push_out_of_rect(rect: &Rect, center: Vec2, radius: f32) -> Vec2 {
    let closest = rect.closest_point(center);
    let offset = center - closest;
    let distance = offset.length();

    if distance >= radius {
        return center;
    }

    if distance > f32::EPSILON {
        return closest + offset / distance * radius;
    }

    // Center is inside the rectangle: leave through the nearest edge.
    let exits = [
        (center.x - rect.min.x, Vec2::new(rect.min.x - radius, center.y)),
        (rect.max.x - center.x, Vec2::new(rect.max.x + radius, center.y)),
        (center.y - rect.min.y, Vec2::new(center.x, rect.min.y - radius)),
        (rect.max.y - center.y, Vec2::new(center.x, rect.max.y + radius)),
    ];
    exits
        .iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map_or(center, |exit| exit.1)
}
