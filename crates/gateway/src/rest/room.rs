//! Room REST endpoints

use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    routing::{get, post},
    Json, Router,
};
use depot_hub::{ClientSummary, RoomId, RoomSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::GatewayResult;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub id: RoomId,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub id: RoomId,
}

/// Create room routes
pub fn create_room_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/chat/create-room", post(create_room))
        .route("/api/chat/get-rooms", get(get_rooms))
        .route("/api/chat/get-clients/:room_id", get(get_clients))
}

pub async fn create_room(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> GatewayResult<Json<CreateRoomResponse>> {
    let Json(CreateRoomRequest { id, name }) = payload?;

    state.hub.create_room(id, name).await?;
    Ok(Json(CreateRoomResponse { id }))
}

pub async fn get_rooms(State(state): State<Arc<GatewayState>>) -> GatewayResult<Json<Vec<RoomSummary>>> {
    let mut rooms = state.hub.list_rooms().await?;
    rooms.sort_by_key(|room| room.id);
    Ok(Json(rooms))
}

pub async fn get_clients(
    room_id: Result<Path<RoomId>, PathRejection>,
    State(state): State<Arc<GatewayState>>,
) -> GatewayResult<Json<Vec<ClientSummary>>> {
    let Path(room_id) = room_id?;

    let mut clients = state.hub.list_clients(room_id).await?;
    clients.sort_by_key(|client| client.id);
    Ok(Json(clients))
}
