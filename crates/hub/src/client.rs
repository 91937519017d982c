//! Per-connection client actors.

use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::connection::{ConnectionError, FrameSink, FrameStream};
use crate::error::HubResult;
use crate::hub::HubHandle;
use crate::message::{ClientId, Message, RoomId};

/// Process-unique serial of an accepted connection.
pub type ConnectionId = u64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one connected client.
///
/// Two keys with the same client id are still different connections; the hub
/// only unregisters the connection it actually holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey {
    pub id: ClientId,
    pub room_id: RoomId,
    pub username: String,
    connection: ConnectionId,
}

impl ClientKey {
    pub fn new(id: ClientId, room_id: RoomId, username: impl Into<String>) -> Self {
        Self {
            id,
            room_id,
            username: username.into(),
            connection: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }
}

/// What the hub stores for a member: its identity and the sending side of its outbound queue.
pub struct ClientHandle {
    key: ClientKey,
    outbound: mpsc::Sender<Message>,
}

impl ClientHandle {
    pub fn new(key: ClientKey, outbound: mpsc::Sender<Message>) -> Self {
        Self { key, outbound }
    }

    pub fn key(&self) -> &ClientKey {
        &self.key
    }

    pub(crate) fn into_parts(self) -> (ClientKey, mpsc::Sender<Message>) {
        (self.key, self.outbound)
    }
}

/// Outcome of a successful registration round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Joined,
    /// The room already holds a connection for this client id; nothing changed.
    AlreadyMember,
}

/// A freshly accepted connection that has not been handed to the hub yet.
pub struct Client {
    key: ClientKey,
    outbound: mpsc::Sender<Message>,
    inbox: mpsc::Receiver<Message>,
}

impl Client {
    pub fn new(
        id: ClientId,
        room_id: RoomId,
        username: impl Into<String>,
        outbound_capacity: usize,
    ) -> Self {
        let (outbound, inbox) = mpsc::channel(outbound_capacity);
        Self {
            key: ClientKey::new(id, room_id, username),
            outbound,
            inbox,
        }
    }

    pub fn key(&self) -> &ClientKey {
        &self.key
    }

    /// Register with the hub, announce the join and run the read and write
    /// actors until the connection ends.
    ///
    /// Fails with `RoomNotFound` if the room does not exist; the connection
    /// halves are dropped without being used in that case.
    pub async fn serve<R, W>(self, hub: HubHandle, reader: R, writer: W) -> HubResult<()>
    where
        R: FrameStream,
        W: FrameSink,
    {
        let Client {
            key,
            outbound,
            inbox,
        } = self;

        match hub.register(ClientHandle::new(key.clone(), outbound)).await? {
            Registration::Joined => {}
            Registration::AlreadyMember => {
                warn!(
                    client_id = key.id,
                    room_id = key.room_id,
                    "client already connected to room, refusing second connection"
                );
                return Ok(());
            }
        }

        info!(
            client_id = key.id,
            room_id = key.room_id,
            username = %key.username,
            "client joined room"
        );
        hub.broadcast(Message::joined(key.room_id, key.username.clone()))
            .await?;

        let mut write_task = tokio::spawn(write_messages(key.clone(), hub.clone(), inbox, writer));
        let mut read_task = tokio::spawn(read_messages(key.clone(), hub, reader));

        tokio::select! {
            _ = &mut read_task => {
                // Unregistration closed the outbound queue; the writer drains what is left.
                let _ = write_task.await;
            }
            _ = &mut write_task => read_task.abort(),
        }

        info!(
            client_id = key.id,
            room_id = key.room_id,
            "client disconnected"
        );
        Ok(())
    }
}

async fn read_messages<R: FrameStream>(key: ClientKey, hub: HubHandle, mut reader: R) {
    while let Some(frame) = reader.next().await {
        match frame {
            Ok(content) => {
                let message = Message::new(content, key.room_id, key.username.clone());
                if hub.broadcast(message).await.is_err() {
                    break;
                }
            }
            Err(ConnectionError::Closed) => {
                debug!(client_id = key.id, "connection closed by peer");
                break;
            }
            Err(error) => {
                warn!(client_id = key.id, %error, "read failed");
                break;
            }
        }
    }

    if let Err(error) = hub.unregister(key.clone()).await {
        debug!(client_id = key.id, %error, "unregister after read loop failed");
    }
}

async fn write_messages<W: FrameSink>(
    key: ClientKey,
    hub: HubHandle,
    mut inbox: mpsc::Receiver<Message>,
    mut writer: W,
) {
    while let Some(message) = inbox.recv().await {
        let frame = match message.to_json() {
            Ok(frame) => frame,
            Err(error) => {
                error!(client_id = key.id, %error, "failed to serialize message");
                continue;
            }
        };

        if let Err(error) = writer.send(frame).await {
            warn!(client_id = key.id, %error, "write failed");
            if let Err(error) = hub.unregister(key.clone()).await {
                debug!(client_id = key.id, %error, "unregister after write failure failed");
            }
            return;
        }
    }

    if let Err(error) = writer.close().await {
        debug!(client_id = key.id, %error, "closing connection failed");
    }
}
