//! The hub control loop and the handle used to talk to it.

use depot_config::HubConfig;
use std::collections::{hash_map::Entry, HashMap};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::{ClientHandle, ClientKey, Registration};
use crate::error::{HubError, HubResult};
use crate::message::{Message, RoomId};
use crate::room::{ClientSummary, Room, RoomSummary};

// tokio channels cannot be unbuffered; a single slot plus the acknowledgement
// gives callers a synchronous handoff.
const HANDOFF_CAPACITY: usize = 1;

struct RegisterRequest {
    client: ClientHandle,
    ack: oneshot::Sender<HubResult<Registration>>,
}

struct UnregisterRequest {
    key: ClientKey,
    ack: oneshot::Sender<bool>,
}

enum Query {
    CreateRoom {
        id: RoomId,
        name: String,
        reply: oneshot::Sender<HubResult<()>>,
    },
    ListRooms {
        reply: oneshot::Sender<Vec<RoomSummary>>,
    },
    ListClients {
        room_id: RoomId,
        reply: oneshot::Sender<HubResult<Vec<ClientSummary>>>,
    },
}

/// Owner of every room. Only [`Hub::run`] reads or mutates room state.
pub struct Hub {
    rooms: HashMap<RoomId, Room>,
    register_rx: mpsc::Receiver<RegisterRequest>,
    unregister_rx: mpsc::Receiver<UnregisterRequest>,
    broadcast_rx: mpsc::Receiver<Message>,
    query_rx: mpsc::Receiver<Query>,
}

impl Hub {
    pub fn new(config: &HubConfig) -> (Self, HubHandle) {
        let (register_tx, register_rx) = mpsc::channel(HANDOFF_CAPACITY);
        let (unregister_tx, unregister_rx) = mpsc::channel(HANDOFF_CAPACITY);
        let (broadcast_tx, broadcast_rx) = mpsc::channel(config.broadcast_capacity);
        let (query_tx, query_rx) = mpsc::channel(HANDOFF_CAPACITY);

        let hub = Self {
            rooms: HashMap::new(),
            register_rx,
            unregister_rx,
            broadcast_rx,
            query_rx,
        };
        let handle = HubHandle {
            register_tx,
            unregister_tx,
            broadcast_tx,
            query_tx,
        };
        (hub, handle)
    }

    /// Start the control loop on the current runtime.
    pub fn spawn(config: &HubConfig) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(config);
        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    /// Process hub events one at a time until every [`HubHandle`] is dropped.
    pub async fn run(mut self) {
        info!("chat hub started");
        loop {
            tokio::select! {
                Some(request) = self.register_rx.recv() => self.handle_register(request),
                Some(request) = self.unregister_rx.recv() => self.handle_unregister(request),
                Some(message) = self.broadcast_rx.recv() => {
                    self.handle_broadcast(&message);
                }
                Some(query) = self.query_rx.recv() => self.handle_query(query),
                else => break,
            }
        }
        info!(rooms = self.rooms.len(), "chat hub stopped");
    }

    fn handle_register(&mut self, request: RegisterRequest) {
        let RegisterRequest { client, ack } = request;
        let room_id = client.key().room_id;
        let client_id = client.key().id;

        let result = match self.rooms.get_mut(&room_id) {
            Some(room) => {
                if room.join(client) {
                    Ok(Registration::Joined)
                } else {
                    Ok(Registration::AlreadyMember)
                }
            }
            None => Err(HubError::room_not_found(room_id)),
        };
        debug!(client_id, room_id, ?result, "register");
        let _ = ack.send(result);
    }

    fn handle_unregister(&mut self, request: UnregisterRequest) {
        let UnregisterRequest { key, ack } = request;

        let removed = match self.rooms.get_mut(&key.room_id) {
            Some(room) => match room.leave(&key) {
                Some(member) => {
                    // Dropping the member closes its outbound queue.
                    let username = member.username.clone();
                    drop(member);
                    if !room.is_empty() {
                        room.deliver(&Message::left(key.room_id, username));
                    }
                    true
                }
                None => false,
            },
            None => false,
        };
        debug!(client_id = key.id, room_id = key.room_id, removed, "unregister");
        let _ = ack.send(removed);
    }

    fn handle_broadcast(&self, message: &Message) -> usize {
        match self.rooms.get(&message.room_id()) {
            Some(room) => room.deliver(message),
            None => {
                debug!(room_id = message.room_id(), "broadcast to unknown room dropped");
                0
            }
        }
    }

    fn handle_query(&mut self, query: Query) {
        match query {
            Query::CreateRoom { id, name, reply } => {
                let result = match self.rooms.entry(id) {
                    Entry::Occupied(_) => Err(HubError::room_already_exists(id)),
                    Entry::Vacant(v) => {
                        info!(room_id = id, name = %name, "room created");
                        v.insert(Room::new(id, name));
                        Ok(())
                    }
                };
                let _ = reply.send(result);
            }
            Query::ListRooms { reply } => {
                let rooms = self.rooms.values().map(Room::summary).collect();
                let _ = reply.send(rooms);
            }
            Query::ListClients { room_id, reply } => {
                let result = self
                    .rooms
                    .get(&room_id)
                    .map(Room::clients)
                    .ok_or_else(|| HubError::room_not_found(room_id));
                let _ = reply.send(result);
            }
        }
    }
}

/// Cloneable entry point to a running [`Hub`].
#[derive(Clone)]
pub struct HubHandle {
    register_tx: mpsc::Sender<RegisterRequest>,
    unregister_tx: mpsc::Sender<UnregisterRequest>,
    broadcast_tx: mpsc::Sender<Message>,
    query_tx: mpsc::Sender<Query>,
}

impl HubHandle {
    /// Add a client to its room. Resolves once the control loop has applied it.
    pub async fn register(&self, client: ClientHandle) -> HubResult<Registration> {
        let (ack, done) = oneshot::channel();
        self.register_tx
            .send(RegisterRequest { client, ack })
            .await?;
        done.await?
    }

    /// Remove this exact connection from its room.
    ///
    /// Returns `false` when the connection was not a member, which makes
    /// repeated calls harmless.
    pub async fn unregister(&self, key: ClientKey) -> HubResult<bool> {
        let (ack, done) = oneshot::channel();
        self.unregister_tx
            .send(UnregisterRequest { key, ack })
            .await?;
        Ok(done.await?)
    }

    /// Queue a message for every member of its room. Unknown rooms drop it silently.
    pub async fn broadcast(&self, message: Message) -> HubResult<()> {
        self.broadcast_tx.send(message).await?;
        Ok(())
    }

    pub async fn create_room(&self, id: RoomId, name: impl Into<String>) -> HubResult<()> {
        let (reply, response) = oneshot::channel();
        self.query_tx
            .send(Query::CreateRoom {
                id,
                name: name.into(),
                reply,
            })
            .await?;
        response.await?
    }

    pub async fn list_rooms(&self) -> HubResult<Vec<RoomSummary>> {
        let (reply, response) = oneshot::channel();
        self.query_tx.send(Query::ListRooms { reply }).await?;
        Ok(response.await?)
    }

    pub async fn list_clients(&self, room_id: RoomId) -> HubResult<Vec<ClientSummary>> {
        let (reply, response) = oneshot::channel();
        self.query_tx
            .send(Query::ListClients { room_id, reply })
            .await?;
        response.await?
    }
}
