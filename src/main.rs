//! Sockrelay - Local SOCKS5 relay for authenticated upstream proxies
//!
//! This is the main entry point for the Sockrelay application.

use anyhow::{Context, Result};
use clap::Parser;
use sockrelay::config::load_config;
use sockrelay::SocksRelay;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Sockrelay - expose an authenticated SOCKS5 proxy as a local no-auth one
#[derive(Parser, Debug)]
#[command(name = "sockrelay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Override the local listen port (0 for ephemeral)
    #[arg(short = 'p', long)]
    local_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    // Load configuration
    let mut config = load_config(&args.config)?;
    if let Some(port) = args.local_port {
        config.listen.port = port;
    }

    info!("Sockrelay v{}", sockrelay::VERSION);
    info!("Configuration loaded from: {:?}", args.config);
    info!("Upstream proxy: {}", config.upstream.addr());

    let mut relay = SocksRelay::new(config)?;
    let port = relay.start().await.context("Failed to start relay")?;
    info!("Point clients at socks5://127.0.0.1:{}", port);

    wait_for_shutdown().await;

    relay.stop().await;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down...");
                    }
                }
                return;
            }
            Err(e) => tracing::warn!("Failed to setup SIGTERM handler: {}", e),
        }
    }

    // On Windows, or without SIGTERM, only handle Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    info!("Received Ctrl+C, shutting down...");
}

/// Build the log filter: `RUST_LOG` directives if present, else `level`
fn log_filter(level: &str, env: Option<&str>) -> EnvFilter {
    if let Some(filter) = env.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return filter;
    }

    let level = match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    };
    EnvFilter::new(level)
}

/// Setup logging based on configuration
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(level, env.as_deref());

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
