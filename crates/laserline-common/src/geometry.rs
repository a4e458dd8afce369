//! 2D geometry helpers: rectangles and ray intersection tests.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// Axis-aligned rectangle in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Rect {
    /// Creates a rectangle, rejecting inverted or non-finite extents.
    pub fn new(min: Vec2, max: Vec2) -> CommonResult<Self> {
        if !min.is_finite() || !max.is_finite() || min.x > max.x || min.y > max.y {
            return Err(CommonError::InvalidRect {
                min_x: min.x,
                min_y: min.y,
                max_x: max.x,
                max_y: max.y,
            });
        }
        Ok(Self { min, max })
    }

    /// Creates a rectangle from center and half-extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Returns the center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the width of the rectangle.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Returns the height of the rectangle.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Checks if a point lies inside the rectangle (edges included).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Clamps a point into the rectangle.
    #[must_use]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    /// Picks a uniformly distributed point inside the rectangle.
    pub fn random_point(&self, rng: &mut fastrand::Rng) -> Vec2 {
        Vec2::new(
            self.min.x + rng.f32() * self.width(),
            self.min.y + rng.f32() * self.height(),
        )
    }

    /// Returns the entry distance of a ray into this rectangle, if any.
    ///
    /// `dir` must be normalized. A ray starting inside reports distance 0.
    #[must_use]
    pub fn ray_entry(&self, origin: Vec2, dir: Vec2, max_distance: f32) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_distance;

        for axis in 0..2 {
            let (o, d, lo, hi) = if axis == 0 {
                (origin.x, dir.x, self.min.x, self.max.x)
            } else {
                (origin.y, dir.y, self.min.y, self.max.y)
            };

            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }

    /// Returns the closest point of the rectangle to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        self.clamp(point)
    }
}

/// Returns the entry distance of a ray into a circle, if any.
///
/// `dir` must be normalized. A ray starting inside the circle reports 0.
#[must_use]
pub fn ray_circle(origin: Vec2, dir: Vec2, max_distance: f32, center: Vec2, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let radius_sq = radius * radius;
    if to_center.length_squared() <= radius_sq {
        return Some(0.0);
    }

    let projection = to_center.dot(dir);
    if projection < 0.0 {
        return None;
    }

    let closest_sq = to_center.length_squared() - projection * projection;
    if closest_sq > radius_sq {
        return None;
    }

    let t = projection - (radius_sq - closest_sq).sqrt();
    (t <= max_distance).then_some(t)
}
