//! urlwatchd: the urlwatch daemon.
//!
//! Single binary that assembles the urlwatch subsystems:
//! - State store (redb)
//! - Due-check scheduler and HTTP prober
//! - REST API
//!
//! # Usage
//!
//! ```text
//! urlwatchd --config urlwatch.toml --port 8000 --data-dir /var/lib/urlwatch
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use urlwatch_core::UrlwatchConfig;
use urlwatch_core::config::LogFormat;
use urlwatch_health::{Prober, Scheduler};
use urlwatch_state::StateStore;

const DEFAULT_CONFIG_FILE: &str = "urlwatch.toml";

#[derive(Parser, Debug)]
#[command(name = "urlwatchd", about = "URL health monitor daemon", version)]
struct Cli {
    /// Path to urlwatch.toml. Defaults to ./urlwatch.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// Data directory for persistent state.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormatArg>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_tracing(&config);
    run(config).await
}

/// Read the config file (explicit or default) and apply CLI overrides.
fn load_config(cli: &Cli) -> anyhow::Result<UrlwatchConfig> {
    let mut config = match &cli.config {
        Some(path) => UrlwatchConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            UrlwatchConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("loading config {DEFAULT_CONFIG_FILE}"))?
        }
        None => UrlwatchConfig::default(),
    };
    apply_overrides(&mut config, cli);
    Ok(config)
}

fn apply_overrides(config: &mut UrlwatchConfig, cli: &Cli) {
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if let Some(format) = cli.log_format {
        config.log.format = format.into();
    }
}

fn init_tracing(config: &UrlwatchConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(config: UrlwatchConfig) -> anyhow::Result<()> {
    info!("urlwatch daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&config.storage.data_dir).with_context(|| {
        format!(
            "creating data directory {}",
            config.storage.data_dir.display()
        )
    })?;
    let db_path = config.storage.database_path();

    // ── Initialize subsystems ──────────────────────────────────

    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    let prober = Prober::new(&config.scheduler.user_agent)?;
    let scheduler = Scheduler::new(
        store.clone(),
        prober,
        config.scheduler.max_concurrent_probes,
    );
    let scheduler_handle = scheduler.start();
    info!(
        max_concurrent_probes = config.scheduler.max_concurrent_probes,
        "scheduler started"
    );

    // ── Start API server ───────────────────────────────────────

    let router = urlwatch_api::build_router(store);
    let listener =
        tokio::net::TcpListener::bind((config.server.bind.as_str(), config.server.port))
            .await
            .with_context(|| {
                format!(
                    "binding {}:{}",
                    config.server.bind, config.server.port
                )
            })?;
    info!(addr = %listener.local_addr()?, "API server listening");

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Probes still in flight are dropped with the runtime.
    scheduler_handle.stop().await;

    info!("urlwatch daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C; shutting down");
    }
    info!("shutdown signal received");
}
