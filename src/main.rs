mod commands;
mod config;
mod error;
mod hooks;
mod metering;
mod models;
mod server;
mod services;
mod storage;

use commands::auth::UsernameRules;
use config::Config;
use hooks::{FileLoggerHook, HookRegistry};
use metering::AccessGate;
use server::AppServer;
use services::{ImageFilter, InferenceService, LocalImageFilter, MediaCatalog, OpenAiClient, RechargeDesk};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use storage::{Database, SessionRegistry};

/// Everything a page action needs besides the caller's own session
pub struct AppState {
    pub db: Arc<Database>,
    pub sessions: SessionRegistry,
    pub gate: AccessGate,
    /// Units granted on login
    pub initial_grant: u32,
    pub usernames: UsernameRules,
    /// Server-wide inference key, used when the session has none
    pub default_api_key: Option<String>,
    pub inference: Arc<dyn InferenceService>,
    pub filters: Arc<dyn ImageFilter>,
    pub catalog: MediaCatalog,
    pub recharge: RechargeDesk,
    pub hooks: HookRegistry,
    pub hidden_text: String,
}

#[tokio::main]
async fn main() {
    // Console + daily-rotated file logging
    let log_dir = Config::log_dir();
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::daily(&log_dir, "creditgate.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_target(false)
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(non_blocking)
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .init();

    tracing::info!("creditgate starting... Log file: {:?}", log_dir.join("creditgate.log"));

    if let Err(e) = run().await {
        tracing::error!("Fatal: {:#}", e);
        eprintln!("Failed to start creditgate: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;

    if Config::is_dev_mode() {
        tracing::warn!("Running in DEV MODE (port: {}, db: {:?})", config.server.port, config.database.path);
    }

    let db = Arc::new(Database::init(&config.database.path).await?);
    tracing::info!("Registered users: {}", db.user_count().await?);

    let hooks = HookRegistry::new();
    if config.hooks.enabled {
        let logger = FileLoggerHook::new(config.hooks.log_dir.clone())
            .with_retention_days(config.hooks.retention_days);
        logger.prune().await;
        hooks.register(Arc::new(logger)).await;
    }
    hooks.set_enabled(config.hooks.enabled).await;

    if config.inference.api_key.is_none() {
        tracing::warn!("No server inference API key; chat pages need a per-session key");
    }

    let inference: Arc<dyn InferenceService> = Arc::new(OpenAiClient::new(&config.inference)?);
    tracing::info!("Inference backend: {} ({})", inference.name(), config.inference.base_url);

    let state = Arc::new(AppState {
        db,
        sessions: SessionRegistry::with_idle_timeout(Duration::from_secs(
            config.server.session_idle_secs,
        )),
        gate: AccessGate::new(config.metering.costs.clone()),
        initial_grant: config.metering.initial_grant,
        usernames: UsernameRules::new(),
        default_api_key: config.inference.api_key.clone().filter(|k| !k.trim().is_empty()),
        inference,
        filters: Arc::new(LocalImageFilter::new()),
        catalog: MediaCatalog::default(),
        recharge: RechargeDesk::new(),
        hooks,
        hidden_text: config.content.hidden_text.clone(),
    });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let mut server = AppServer::new(state.clone())
        .with_sweep_interval(Duration::from_secs(config.server.session_sweep_secs));
    let bound = server.start(addr).await?;
    tracing::info!("Listening on http://{}", bound);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested (live sessions: {})", state.sessions.count().await);
    server.stop().await?;

    Ok(())
}
