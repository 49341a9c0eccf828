//! Error types for the locomotion controller

use thiserror::Error;

use crate::types::NodeId;

/// Controller errors.
///
/// Missing clips and sounds are not errors: the affected action is marked as
/// non-existent and locomotion continues without it.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The root of the avatar hierarchy cannot be moved with collisions.
    #[error("root node {root:?} of avatar {node:?} is not a mesh")]
    InvalidAvatar { node: NodeId, root: NodeId },

    /// A settings or action map document could not be parsed or written.
    #[error("invalid settings document: {0}")]
    Settings(#[from] serde_json::Error),

    /// A slope limit pair that cannot classify anything.
    #[error("invalid slope limits: min {min}° must not exceed max {max}°")]
    InvalidSlopeLimits { min: f32, max: f32 },
}

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;
