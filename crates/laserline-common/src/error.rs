//! Error types shared across Laserline crates.

use thiserror::Error;

/// Errors raised by the shared geometry helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommonError {
    /// Rectangle with inverted or non-finite extents
    #[error("invalid rectangle: min ({min_x}, {min_y}) max ({max_x}, {max_y})")]
    InvalidRect {
        /// Minimum X coordinate
        min_x: f32,
        /// Minimum Y coordinate
        min_y: f32,
        /// Maximum X coordinate
        max_x: f32,
        /// Maximum Y coordinate
        max_y: f32,
    },
}

/// Result type alias for common operations.
pub type CommonResult<T> = Result<T, CommonError>;
