use serde::{Deserialize, Serialize};
use std::collections::{hash_map::Entry, HashMap};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

use crate::client::{ClientHandle, ClientKey, ConnectionId};
use crate::message::{ClientId, Message, RoomId};

/// Public view of a room, as returned by `list_rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
}

/// Public view of a room member, as returned by `list_clients`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: ClientId,
    pub username: String,
}

pub(crate) struct Member {
    pub(crate) username: String,
    connection: ConnectionId,
    // The only sender for the client's outbound queue; dropping it closes the queue.
    outbound: mpsc::Sender<Message>,
}

pub(crate) struct Room {
    id: RoomId,
    name: String,
    members: HashMap<ClientId, Member>,
}

impl Room {
    pub(crate) fn new(id: RoomId, name: String) -> Self {
        Self {
            id,
            name,
            members: HashMap::new(),
        }
    }

    pub(crate) fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }

    pub(crate) fn clients(&self) -> Vec<ClientSummary> {
        self.members
            .iter()
            .map(|(&id, member)| ClientSummary {
                id,
                username: member.username.clone(),
            })
            .collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add a client unless its id is already a member. Returns whether it was added.
    pub(crate) fn join(&mut self, client: ClientHandle) -> bool {
        let (key, outbound) = client.into_parts();
        match self.members.entry(key.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(Member {
                    connection: key.connection(),
                    username: key.username,
                    outbound,
                });
                true
            }
        }
    }

    /// Remove the member registered under this exact connection.
    pub(crate) fn leave(&mut self, key: &ClientKey) -> Option<Member> {
        match self.members.entry(key.id) {
            Entry::Occupied(o) if o.get().connection == key.connection() => Some(o.remove()),
            _ => None,
        }
    }

    /// Enqueue a copy of `message` for every member. Returns the number of queues that accepted it.
    pub(crate) fn deliver(&self, message: &Message) -> usize {
        let mut delivered = 0;
        for (id, member) in &self.members {
            match member.outbound.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        room_id = self.id,
                        client_id = id,
                        "outbound queue full, dropping message for slow client"
                    );
                }
                // The write actor already stopped; unregistration will follow.
                Err(TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }
}
