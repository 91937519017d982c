//! WebSocket endpoints for the gateway

pub mod connection;
pub mod join;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::GatewayState;

/// Create all WebSocket routes
pub fn create_websocket_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/api/chat/join-room/:room_id", get(join::join_room))
}

pub use join::*;
