//! # Laserline Gameplay
//!
//! Entity and combat core for Laserline.
//!
//! This crate provides the simulation layer of a match:
//! - Entities (player, enemies, NPCs) in a generational arena
//! - Life, hit recovery and death fades
//! - Enemy AI with reactions, personalities and a timed attack cycle
//! - NPC wandering and dialogue
//! - Line-of-sight queries, shooting and contact damage
//! - Enemy spawners and match outcome rules
//! - Input processing and presentation events
//!
//! The host owns a [`GameplayManager`] and calls
//! [`GameplayManager::advance`] once per tick.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod arena;
pub mod combat;
pub mod config;
pub mod enemy;
pub mod entity;
pub mod error;
pub mod events;
pub mod input;
pub mod life;
pub mod manager;
pub mod npc;
pub mod outcome;
pub mod physics;
pub mod player;
pub mod spawn;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::arena::*;
    pub use crate::combat::*;
    pub use crate::config::*;
    pub use crate::enemy::*;
    pub use crate::entity::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::input::*;
    pub use crate::life::*;
    pub use crate::manager::*;
    pub use crate::npc::*;
    pub use crate::outcome::*;
    pub use crate::physics::*;
    pub use crate::player::*;
    pub use crate::spawn::*;
}

pub use prelude::*;
