//! Error types for the chat hub.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::message::RoomId;

/// Result type alias for hub operations
pub type HubResult<T> = Result<T, HubError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("room doesn't exist: {id}")]
    RoomNotFound { id: RoomId },

    #[error("room already exists: {id}")]
    RoomAlreadyExists { id: RoomId },

    #[error("chat hub is not running")]
    Closed,
}

impl HubError {
    pub fn room_not_found(id: RoomId) -> Self {
        Self::RoomNotFound { id }
    }

    pub fn room_already_exists(id: RoomId) -> Self {
        Self::RoomAlreadyExists { id }
    }
}

// The control loop owns every receiver, so a failed send means it is gone.
impl<T> From<mpsc::error::SendError<T>> for HubError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        Self::Closed
    }
}

impl From<oneshot::error::RecvError> for HubError {
    fn from(_: oneshot::error::RecvError) -> Self {
        Self::Closed
    }
}
