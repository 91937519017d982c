//! Shared application state for the gateway

use depot_config::AppConfig;
use depot_hub::HubHandle;
use std::sync::Arc;

/// Shared application state handed to every route.
#[derive(Clone)]
pub struct GatewayState {
    /// Handle to the running chat hub
    pub hub: HubHandle,
    /// Capacity of each connected client's outbound queue
    pub outbound_capacity: usize,
}

impl GatewayState {
    pub fn new(hub: HubHandle, outbound_capacity: usize) -> Self {
        Self {
            hub,
            outbound_capacity,
        }
    }
}

/// Build the gateway state from loaded configuration.
pub fn create_gateway_state(hub: HubHandle, config: &AppConfig) -> Arc<GatewayState> {
    Arc::new(GatewayState::new(hub, config.hub.outbound_capacity))
}
