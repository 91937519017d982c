use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "depot.toml",
    "config/depot.toml",
    "crates/config/depot.toml",
    "../depot.toml",
    "../config/depot.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub hub: HubConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

/// Channel sizing for the chat hub.
///
/// ```
/// use depot_config::HubConfig;
///
/// let hub = HubConfig::default();
/// assert_eq!(hub.broadcast_capacity, 5);
/// assert_eq!(hub.outbound_capacity, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Messages the broadcast channel buffers before senders wait on the control loop.
    #[serde(default = "HubConfig::default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    /// Messages queued per connected client before fan-out starts dropping.
    #[serde(default = "HubConfig::default_outbound_capacity")]
    pub outbound_capacity: usize,
}

impl HubConfig {
    const fn default_broadcast_capacity() -> usize {
        5
    }

    const fn default_outbound_capacity() -> usize {
        10
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: Self::default_broadcast_capacity(),
            outbound_capacity: Self::default_outbound_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "CorsConfig::default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    fn default_allowed_origins() -> Vec<String> {
        vec!["http://localhost:3000".to_string()]
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Self::default_allowed_origins(),
        }
    }
}

impl AppConfig {
    /// Reject values the runtime cannot honour.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.hub.broadcast_capacity == 0 {
            bail!("hub.broadcast_capacity must be at least 1");
        }
        if self.hub.outbound_capacity == 0 {
            bail!("hub.outbound_capacity must be at least 1");
        }
        Ok(())
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use depot_config::load;
///
/// std::env::remove_var("DEPOT_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default(
            "hub.broadcast_capacity",
            i64::try_from(defaults.hub.broadcast_capacity).unwrap_or(i64::MAX),
        )?
        .set_default(
            "hub.outbound_capacity",
            i64::try_from(defaults.hub.outbound_capacity).unwrap_or(i64::MAX),
        )?
        .set_default("cors.allowed_origins", defaults.cors.allowed_origins.clone())?;

    let environment_overrides = config::Environment::with_prefix("DEPOT")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors.allowed_origins");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("DEPOT_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via DEPOT_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    config.validate().context("invalid configuration")?;

    debug!(?config, "loaded chat service configuration");
    Ok(config)
}
