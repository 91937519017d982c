use std::time::Duration;

use anyhow::{Context, Result};
use depot_config::AppConfig;
use depot_hub::{Hub, HubHandle};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::TRACE)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Long-lived services behind the HTTP gateway.
pub struct ChatServices {
    pub hub: HubHandle,
    hub_task: JoinHandle<()>,
}

impl ChatServices {
    /// Validate the configuration and start the hub on the current runtime.
    pub fn initialise(config: &AppConfig) -> Result<Self> {
        config
            .validate()
            .context("refusing to start with invalid configuration")?;

        let (hub, hub_task) = Hub::spawn(&config.hub);
        info!(
            broadcast_capacity = config.hub.broadcast_capacity,
            outbound_capacity = config.hub.outbound_capacity,
            "chat hub ready"
        );

        Ok(Self { hub, hub_task })
    }

    /// Release this handle and give the hub `grace` to stop.
    ///
    /// The hub keeps running while sessions still hold handles; in that case
    /// this returns after the grace period and the loop ends with the process.
    pub async fn shutdown(self, grace: Duration) -> Result<()> {
        let Self { hub, hub_task } = self;
        drop(hub);

        match tokio::time::timeout(grace, hub_task).await {
            Ok(joined) => {
                joined.context("chat hub task failed")?;
                info!("chat hub stopped");
            }
            Err(_) => debug!("chat hub still serving open sessions"),
        }
        Ok(())
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
