//! Chat payloads exchanged with connected clients.

use serde::{Deserialize, Serialize};

pub type RoomId = i64;
pub type ClientId = i64;

/// Content of the notice published when a client joins a room.
pub const JOIN_NOTICE: &str = "new user has joined the room";
/// Content of the notice delivered to the remaining members when a client leaves.
pub const LEAVE_NOTICE: &str = "user left the chat";

/// A message broadcast to every member of a room.
///
/// Serializes to the wire shape `{"content": .., "room_id": .., "username": ..}`.
///
/// ```
/// use depot_hub::Message;
///
/// let message = Message::new("hi", 1, "alice");
/// assert_eq!(
///     message.to_json().unwrap(),
///     r#"{"content":"hi","room_id":1,"username":"alice"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    content: String,
    room_id: RoomId,
    username: String,
}

impl Message {
    pub fn new(content: impl Into<String>, room_id: RoomId, username: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            room_id,
            username: username.into(),
        }
    }

    /// System notice announcing `username` in `room_id`.
    pub fn joined(room_id: RoomId, username: impl Into<String>) -> Self {
        Self::new(JOIN_NOTICE, room_id, username)
    }

    /// System notice announcing that `username` left `room_id`.
    pub fn left(room_id: RoomId, username: impl Into<String>) -> Self {
        Self::new(LEAVE_NOTICE, room_id, username)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
