use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use depot_config::load as load_config;
use depot_gateway::{create_gateway_state, create_router};
use depot_runtime::{shutdown_signal, telemetry, ChatServices};
use tokio::net::TcpListener;
use tracing::info;

const HUB_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "depot-server")]
#[command(about = "Depot chat server (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Load and validate the configuration, then print it
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::CheckConfig => check_config(),
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Depot chat server");

    let config = load_config().context("failed to load configuration")?;

    let services = ChatServices::initialise(&config).context("failed to initialise chat services")?;

    let state = create_gateway_state(services.hub.clone(), &config);
    let app = create_router(state, &config);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    services
        .shutdown(HUB_SHUTDOWN_GRACE)
        .await
        .context("failed to stop chat hub")?;

    info!("server shut down");
    Ok(())
}

fn check_config() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let rendered =
        serde_json::to_string_pretty(&config).context("failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}
