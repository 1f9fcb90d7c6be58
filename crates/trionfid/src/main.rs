//! Trionfi Game Server daemon
//!
//! Usage:
//!   # Standalone mode (default)
//!   trionfid
//!
//!   # Cluster mode - any number of processes sharing one Redis
//!   trionfid --mode cluster --server-id srv-1 --redis-url redis://redis:6379
//!
//!   # With custom configuration
//!   trionfid --mode cluster \
//!     --server-id srv-1 \
//!     --bind 0.0.0.0:5000 \
//!     --ping-bind 0.0.0.0:6000 \
//!     --rare-probability 0.18 \
//!     --duel-workers 4

use clap::Parser;
use trionfid::{Cli, GameServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner(&cli);

    if let Err(e) = cli.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let server = GameServer::new(&cli).await?;
    let shutdown = server.shutdown_handle();

    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("Shutdown signal received, initiating graceful shutdown...");
        shutdown.shutdown();
    });

    let server_handle = tokio::spawn(async move { server.start().await });

    match server_handle.await {
        Ok(Ok(())) => tracing::info!("Server shut down gracefully"),
        Ok(Err(e)) => tracing::error!("Server error: {}", e),
        Err(e) => tracing::error!("Server task panicked: {}", e),
    }

    tracing::info!("Goodbye!");
    Ok(())
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}

fn print_banner(cli: &Cli) {
    let mode = if cli.is_cluster_mode() {
        "cluster"
    } else {
        "standalone"
    };
    let server_id = cli.server_id.as_deref().unwrap_or("auto");

    eprintln!(
        r#"
 _____     _                __ _
|_   _| __(_) ___  _ __    / _(_)
  | || '__| |/ _ \| '_ \  | |_| |
  | || |  | | (_) | | | | |  _| |
  |_||_|  |_|\___/|_| |_| |_| |_|

Distributed Card Game Server

  Mode:         {}
  Server ID:    {}
  Game (TCP):   {}
  Ping (UDP):   {}
  Duel workers: {}
"#,
        mode, server_id, cli.bind, cli.ping_bind, cli.duel_workers
    );

    if cli.is_cluster_mode() {
        eprintln!("  Redis:        {}\n", cli.redis_url);
    }
}
