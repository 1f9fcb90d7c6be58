//! CLI argument parsing for the Trionfi server
//!
//! Supports standalone and cluster deployment modes. Every flag has an
//! environment-variable counterpart for container deployments.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;
use trionfi_coord::DrawConfig;

/// Get system hostname via the `hostname` command, falling back to "unknown".
fn hostname() -> String {
    std::process::Command::new("hostname")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_owned())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Trionfi - Distributed Card Game Server
///
/// Serves the line-based game protocol over TCP and coordinates rare-card
/// claims and duels across any number of server processes.
#[derive(Parser, Debug)]
#[command(name = "trionfid")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    // ============ Server Configuration ============
    /// Game endpoint (TCP) bind address
    #[arg(short, long, default_value = "0.0.0.0:5000", env = "TRIONFI_BIND")]
    pub bind: SocketAddr,

    /// Ping responder (UDP) bind address
    #[arg(long, default_value = "0.0.0.0:6000", env = "TRIONFI_PING_BIND")]
    pub ping_bind: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    // ============ Cluster Configuration ============
    /// Deployment mode
    #[arg(long, default_value = "standalone", env = "TRIONFI_MODE")]
    pub mode: DeploymentMode,

    /// Unique server identifier (generated from hostname if not specified)
    #[arg(long, env = "TRIONFI_SERVER_ID")]
    pub server_id: Option<String>,

    /// Redis URL backing the shared store, bus, and claim ledger
    /// (cluster mode only)
    #[arg(
        long,
        default_value = "redis://127.0.0.1:6379",
        env = "TRIONFI_REDIS_URL"
    )]
    pub redis_url: String,

    // ============ Game Configuration ============
    /// Per-slot probability of attempting a rare card on a draw
    #[arg(long, default_value = "0.15", env = "TRIONFI_RARE_PROBABILITY")]
    pub rare_probability: f64,

    /// Number of duel-resolution workers in this process
    #[arg(long, default_value = "2", env = "TRIONFI_DUEL_WORKERS")]
    pub duel_workers: usize,

    /// Bound on a single claim attempt, in milliseconds; expiry is a denial
    #[arg(long, default_value = "3000", env = "TRIONFI_CLAIM_TIMEOUT_MS")]
    pub claim_timeout_ms: u64,

    /// Optional claim lease in milliseconds; after expiry the rare becomes
    /// claimable again (cluster mode only; claims are permanent by default)
    #[arg(long, env = "TRIONFI_CLAIM_LEASE_MS")]
    pub claim_lease_ms: Option<u64>,
}

/// Deployment mode for the server
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Single process, in-memory coordination
    #[default]
    Standalone,
    /// Multiple processes sharing Redis-backed coordination
    Cluster,
}

impl Cli {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.draw_config().validate()?;

        if self.duel_workers == 0 {
            return Err("duel_workers must be at least 1".to_string());
        }

        if self.claim_timeout_ms == 0 {
            return Err("claim_timeout_ms must be greater than 0".to_string());
        }

        if let Some(0) = self.claim_lease_ms {
            return Err("claim_lease_ms must be greater than 0 when set".to_string());
        }

        Ok(())
    }

    pub fn draw_config(&self) -> DrawConfig {
        DrawConfig {
            rare_probability: self.rare_probability,
            ..Default::default()
        }
    }

    pub fn claim_timeout(&self) -> Duration {
        Duration::from_millis(self.claim_timeout_ms)
    }

    pub fn claim_lease(&self) -> Option<Duration> {
        self.claim_lease_ms.map(Duration::from_millis)
    }

    /// Get effective server ID (generated from hostname if not specified)
    pub fn effective_server_id(&self) -> String {
        self.server_id.clone().unwrap_or_else(|| {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            format!("{}-{}", hostname(), &suffix[..6])
        })
    }

    /// Check if running in cluster mode
    pub fn is_cluster_mode(&self) -> bool {
        matches!(self.mode, DeploymentMode::Cluster)
    }
}
