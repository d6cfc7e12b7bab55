use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use boxd_command::CommandRunner;
use boxd_core::{
    config::{BoxdConfig, DEFAULT_CONFIG_PATH},
    StatusBoard,
};
use boxd_jobs::{ButtonRelay, Collaborators};
use boxd_scheduler::{JobManager, SchedulerEngine};
use boxd_system::{Apt, LogShield, Occ, Systemd, TarBackup};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

mod app;
mod http;

/// apt-get update on a slow mirror takes minutes.
const APT_TIMEOUT_SECS: u64 = 600;

#[derive(Parser)]
#[command(name = "boxd", version, about = "Appliance job daemon")]
struct Cli {
    /// Config file (default: $BOXD_CONFIG, then /etc/boxd/boxd.toml)
    #[arg(long, short, value_name = "FILE")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the scheduler and HTTP surface (default)
    Run,
    /// Print the effective configuration and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "boxd_daemon=info,boxd_scheduler=info,boxd_jobs=info,tower_http=debug".into()
            }),
        )
        .init();

    // load config: --config > BOXD_CONFIG env > /etc/boxd/boxd.toml
    let config_path = cli.config.or_else(|| std::env::var("BOXD_CONFIG").ok());
    let path = config_path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    if !Path::new(path).exists() {
        warn!(path, "config file not found, using defaults");
    }
    let config = BoxdConfig::load(Some(path)).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        BoxdConfig::default()
    });

    match cli.command.unwrap_or(Command::Run) {
        Command::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Run => run(config).await,
    }
}

async fn run(config: BoxdConfig) -> anyhow::Result<()> {
    let board = Arc::new(StatusBoard::new());
    let collab = build_collaborators(&config);

    let mut manager = JobManager::new(config.appliance.clone(), Arc::clone(&board));
    boxd_jobs::register_all(&mut manager, &collab, &config);
    let jobs: Vec<String> = manager.names().map(str::to_string).collect();
    info!(count = jobs.len(), "jobs registered");

    let (engine, scheduler) = SchedulerEngine::new(manager, &config.scheduler);
    let button = ButtonRelay::new(Arc::clone(&collab.shield), scheduler.clone());

    let addr: SocketAddr = format!("{}:{}", config.http.bind, config.http.port)
        .parse()
        .context("invalid http bind address")?;
    let state = Arc::new(app::AppState::new(config, board, scheduler, button, jobs));
    let router = app::build_router(state);

    // the engine owns every job; the HTTP side only sends triggers
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let engine_task = tokio::spawn(engine.run(shutdown_rx));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("boxd listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // signal scheduler to stop; a running job body is finished first
    let _ = shutdown_tx.send(true);
    engine_task.await.context("scheduler engine task failed")?;
    info!("boxd stopped");
    Ok(())
}

fn build_collaborators(config: &BoxdConfig) -> Collaborators {
    let runner = CommandRunner::default();
    Collaborators {
        occ: Arc::new(Occ::new(&config.occ)),
        services: Arc::new(Systemd::new(runner.clone())),
        packages: Arc::new(Apt::new(runner.with_timeout_secs(APT_TIMEOUT_SECS))),
        shield: Arc::new(LogShield),
        backup: Arc::new(TarBackup::new(&config.backup)),
    }
}

/// Resolves on Ctrl-C or, on unix, SIGTERM from the service manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown requested");
}
