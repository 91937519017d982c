//! # Depot Gateway Crate
//!
//! HTTP front of the chat hub. REST routes create and inspect rooms; the
//! WebSocket route attaches a connection to a room as a hub client.
//!
//! ## Architecture
//!
//! - **REST**: room management and health endpoints under `/api/chat`
//! - **WebSocket**: `join-room` upgrade and the socket adapter
//! - **State**: hub handle and per-client settings shared by every route
//! - **Middleware**: CORS, request logging and tracing
//!
//! ## Usage
//!
//! ```rust,no_run
//! use depot_config::AppConfig;
//! use depot_gateway::{create_gateway_state, create_router};
//! use depot_hub::Hub;
//!
//! # async fn demo() -> std::io::Result<()> {
//! let config = AppConfig::default();
//! let (hub, _task) = Hub::spawn(&config.hub);
//! let app = create_router(create_gateway_state(hub, &config), &config);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:7070").await?;
//! axum::serve(listener, app).await
//! # }
//! ```

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

pub use error::{GatewayError, GatewayResult};
pub use state::{create_gateway_state, GatewayState};

use axum::{middleware as axum_middleware, Router};
use depot_config::AppConfig;
use std::sync::Arc;

/// Create the main application router with all routes
pub fn create_router(state: Arc<GatewayState>, config: &AppConfig) -> Router {
    Router::new()
        .merge(rest::create_rest_routes())
        .merge(websocket::create_websocket_routes())
        .with_state(state)
        .layer(middleware::create_cors_middleware(&config.cors))
        .layer(middleware::create_trace_middleware())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
