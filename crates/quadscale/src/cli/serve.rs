//! the `serve` subcommand - runs the realm control plane.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use color_eyre::eyre::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use quadscale_federation::HttpTransport;
use quadscale_types::{Config, MemoryStore, StaticTokenVerifier};

use crate::{create_app, AppState};

/// default config file search paths (in order of priority).
const CONFIG_SEARCH_PATHS: &[&str] = &[
    "/etc/quadscale/config.toml",
    "./config.toml",
];

/// run the realm control plane
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// path to config file (toml format)
    #[arg(short, long, env = "QUADSCALE_CONFIG")]
    config: Option<PathBuf>,

    /// address to listen on
    #[arg(long, env = "QUADSCALE_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// unique identifier of this realm
    #[arg(long, env = "QUADSCALE_REALM_ID")]
    realm_id: Option<String>,

    /// human-readable realm name
    #[arg(long, env = "QUADSCALE_REALM_NAME")]
    realm_name: Option<String>,

    /// endpoint advertised to federation peers
    #[arg(long, env = "QUADSCALE_ENDPOINT")]
    endpoint: Option<String>,

    /// role assigned when no ssid mapping matches
    #[arg(long, env = "QUADSCALE_DEFAULT_ROLE")]
    default_role: Option<String>,

    /// seconds between monitor sweeps
    #[arg(long, env = "QUADSCALE_MONITOR_INTERVAL")]
    monitor_interval: Option<u64>,

    /// log level
    #[arg(long, env = "QUADSCALE_LOG_LEVEL")]
    log_level: Option<String>,
}

impl ServeCommand {
    /// find and load config file, returning none if no config file is found.
    fn load_config_file(config_path: Option<&PathBuf>) -> Result<Option<Config>> {
        // if explicit path provided, it must exist
        if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("failed to parse config file: {:?}", path))?;
            return Ok(Some(config));
        }

        // search default paths
        for path_str in CONFIG_SEARCH_PATHS {
            let path = PathBuf::from(path_str);
            if path.exists() {
                debug!("Found config file at {:?}", path);
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file: {:?}", path))?;
                let config: Config = toml::from_str(&content)
                    .with_context(|| format!("failed to parse config file: {:?}", path))?;
                return Ok(Some(config));
            }
        }

        Ok(None)
    }

    /// convert cli arguments into a config struct, merging with config file if present.
    ///
    /// priority order: defaults -> config file -> cli flags
    fn into_config(self) -> Result<Config> {
        let mut config = match Self::load_config_file(self.config.as_ref())? {
            Some(file_config) => {
                info!("Loaded configuration from file");
                file_config
            }
            None => {
                debug!("No config file found, using defaults");
                Config::default()
            }
        };

        // cli overrides (only if explicitly set)
        if let Some(listen_addr) = self.listen_addr {
            config.listen_addr = listen_addr;
        }
        if let Some(realm_id) = self.realm_id {
            config.realm_id = realm_id;
        }
        if let Some(realm_name) = self.realm_name {
            config.realm_name = realm_name;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(default_role) = self.default_role {
            config.default_role = default_role;
        }
        if let Some(interval) = self.monitor_interval {
            config.monitor.interval_secs = interval;
        }

        Ok(config)
    }

    /// run the serve command
    pub async fn run(self) -> Result<()> {
        // initialize logging (use CLI override or default to info)
        let log_level_str = self.log_level.clone().unwrap_or_else(|| "info".to_string());
        let log_level = match log_level_str.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        info!("Starting quadscale...");

        let config = self.into_config()?;
        info!("Realm: {} ({})", config.realm_id, config.realm_name);
        info!("Listen address: {}", config.listen_addr);
        info!("Federation endpoint: {}", config.endpoint);

        let transport = Arc::new(HttpTransport::new(Duration::from_secs(
            config.federation.request_timeout_secs,
        )));
        // static verifier until an external identity provider is wired in
        let verifier = Arc::new(StaticTokenVerifier::new());
        // in-memory store; a persistent backend slots in behind KvStore
        let store = Arc::new(MemoryStore::new());

        let listen_addr = config.listen_addr.clone();
        let state = AppState::new(config, verifier, store, transport);

        let dispatcher = state.events.spawn_dispatcher();
        let monitor = Arc::clone(&state.monitor);
        monitor.start();

        let app = create_app(state);

        let listener = TcpListener::bind(&listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", listen_addr))?;
        info!("Listening on {}", listen_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        info!("Shutting down...");
        monitor.stop().await;
        dispatcher.abort();
        Ok(())
    }
}

/// resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => return std::future::pending::<()>().await,
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
