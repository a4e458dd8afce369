//! Gameplay error types.

use laserline_common::{CommonError, EntityId};
use thiserror::Error;

use crate::entity::EntityKind;

/// Errors raised by caller misuse of the gameplay API.
///
/// Runtime conditions such as a stale target or an empty sight query are not
/// errors; they are handled inside the tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameplayError {
    /// Argument outside its permitted domain
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Handle does not resolve to a live entity
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    /// Entity exists but has not been initialized
    #[error("entity not active: {0}")]
    NotActive(EntityId),

    /// Entity is of a different variant than the operation requires
    #[error("entity {id} is a {actual:?}, expected {expected:?}")]
    WrongVariant {
        /// Entity handle
        id: EntityId,
        /// Variant the operation requires
        expected: EntityKind,
        /// Variant the entity actually is
        actual: EntityKind,
    },

    /// Entity already present in the registry
    #[error("entity already registered: {0}")]
    AlreadyRegistered(EntityId),

    /// Weapon operation on an entity without a weapon
    #[error("entity {0} has no weapon")]
    Unarmed(EntityId),

    /// Shared geometry error
    #[error(transparent)]
    Common(#[from] CommonError),
}

/// Result type for gameplay operations.
pub type GameplayResult<T> = Result<T, GameplayError>;
