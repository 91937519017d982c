//! Joining a chat room over a WebSocket.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        ws::{WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use depot_hub::{Client, ClientId, RoomId};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::connection;
use crate::error::GatewayResult;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct JoinRoomQuery {
    pub user_id: ClientId,
    #[serde(default)]
    pub username: String,
}

/// Upgrade to a WebSocket and attach the connection to a room.
///
/// The room is looked up before upgrading so that an unknown room is a plain
/// 404 response rather than a socket that closes straight away.
pub async fn join_room(
    room_id: Result<Path<RoomId>, PathRejection>,
    query: Result<Query<JoinRoomQuery>, QueryRejection>,
    State(state): State<Arc<GatewayState>>,
    ws: WebSocketUpgrade,
) -> GatewayResult<Response> {
    let Path(room_id) = room_id?;
    let Query(JoinRoomQuery { user_id, username }) = query?;

    state.hub.list_clients(room_id).await?;

    let client = Client::new(user_id, room_id, username, state.outbound_capacity);
    Ok(ws.on_upgrade(move |socket| run_session(socket, client, state)))
}

async fn run_session(socket: WebSocket, client: Client, state: Arc<GatewayState>) {
    let client_id = client.key().id;
    let room_id = client.key().room_id;
    info!(client_id, room_id, "websocket connection established");

    let (reader, writer) = connection::split(socket);
    if let Err(error) = client.serve(state.hub.clone(), reader, writer).await {
        warn!(client_id, room_id, %error, "chat session ended with error");
    }
}
