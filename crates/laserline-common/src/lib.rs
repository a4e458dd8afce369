//! # Laserline Common
//!
//! Common types, utilities, and shared abstractions for Laserline.
//!
//! This crate provides foundational types used across all Laserline crates:
//! - Generational entity handles
//! - Rectangles and ray intersection helpers
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod geometry;
pub mod ids;

pub use glam::Vec2;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
    pub use glam::Vec2;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_entity_id_null() {
        assert!(!EntityId::NULL.is_valid());
        assert!(EntityId::new(0, 0).is_valid());
        assert_eq!(EntityId::default(), EntityId::NULL);
    }

    #[test]
    fn test_entity_id_generation_distinguishes() {
        let a = EntityId::new(3, 1);
        let b = EntityId::new(3, 2);
        assert_ne!(a, b);
        assert_eq!(a.index(), b.index());
        assert_eq!(a.to_string(), "#3v1");
    }

    #[test]
    fn test_rect_rejects_inverted() {
        assert!(Rect::new(Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)).is_err());
        assert!(Rect::new(Vec2::ZERO, Vec2::new(f32::NAN, 1.0)).is_err());
        assert!(Rect::new(Vec2::ZERO, Vec2::ONE).is_ok());
    }

    #[test]
    fn test_rect_contains_and_clamp() {
        let rect = Rect::from_center(Vec2::ZERO, Vec2::new(4.0, 3.0));
        assert!(rect.contains(Vec2::new(4.0, -3.0)));
        assert!(!rect.contains(Vec2::new(4.1, 0.0)));
        assert_eq!(rect.clamp(Vec2::new(10.0, -10.0)), Vec2::new(4.0, -3.0));
        assert_eq!(rect.width(), 8.0);
        assert_eq!(rect.height(), 6.0);
    }

    #[test]
    fn test_rect_ray_entry() {
        let wall = Rect::from_center(Vec2::new(5.0, 0.0), Vec2::new(1.0, 1.0));
        let hit = wall.ray_entry(Vec2::ZERO, Vec2::X, 10.0).expect("ray should hit");
        assert!((hit - 4.0).abs() < 1e-5);
        assert!(wall.ray_entry(Vec2::ZERO, Vec2::X, 3.0).is_none());
        assert!(wall.ray_entry(Vec2::ZERO, Vec2::Y, 10.0).is_none());
        assert!(wall.ray_entry(Vec2::ZERO, -Vec2::X, 10.0).is_none());
    }

    #[test]
    fn test_ray_circle() {
        let hit = ray_circle(Vec2::ZERO, Vec2::X, 10.0, Vec2::new(5.0, 0.0), 0.5)
            .expect("ray should hit");
        assert!((hit - 4.5).abs() < 1e-5);
        assert!(ray_circle(Vec2::ZERO, Vec2::X, 10.0, Vec2::new(5.0, 2.0), 0.5).is_none());
        assert!(ray_circle(Vec2::ZERO, Vec2::X, 10.0, Vec2::new(-5.0, 0.0), 0.5).is_none());
        assert_eq!(ray_circle(Vec2::ZERO, Vec2::X, 1.0, Vec2::new(0.2, 0.0), 0.5), Some(0.0));
    }

    proptest! {
        #[test]
        fn prop_random_point_inside(seed in any::<u64>(), w in 0.1f32..100.0, h in 0.1f32..100.0) {
            let rect = Rect::from_center(Vec2::ZERO, Vec2::new(w, h));
            let mut rng = fastrand::Rng::with_seed(seed);
            let p = rect.random_point(&mut rng);
            prop_assert!(rect.contains(p));
        }
    }
}
