//! REST API endpoints for the gateway

pub mod health;
pub mod room;

use axum::{routing::get, Router};
use crate::state::GatewayState;
use std::sync::Arc;

/// Create all REST API routes
pub fn create_rest_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Room routes
        .merge(room::create_room_routes())
}

pub use health::*;
pub use room::*;
