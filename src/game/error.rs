//! Round error types
//!
//! None of these are fatal. Callers log them and carry on with the round.

use super::object::ObjectId;

/// Errors raised by registry and spawner operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("Cannot {operation} while no round is running")]
    InvalidState { operation: &'static str },

    #[error("Object not found: {0}")]
    NotFound(ObjectId),

    #[error("Object id already live: {0}")]
    Collision(ObjectId),
}

/// Selection source could not be subscribed to
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Selection source is detached")]
    Detached,

    #[error("Selection source already has a subscriber")]
    AlreadySubscribed,
}

/// Scene sink failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("No visual object for {0}")]
    UnknownVisual(ObjectId),
}
