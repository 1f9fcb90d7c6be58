//! # trionfid - Trionfi Game Server
//!
//! The network daemon: a line-based TCP endpoint for game commands, a UDP
//! echo responder for latency checks, and the per-process plumbing that ties
//! the coordination layer together — connection registry, duel-result
//! router, cache prune listener, and the duel worker pool.
//!
//! Deployment modes:
//! - **standalone**: everything in process memory, claims behind a local
//!   mutex. One process is the whole fleet.
//! - **cluster**: backends on a shared Redis; rare claims go through the
//!   conditional-write ledger, so any number of trionfid processes can
//!   serve the same game.

pub mod cli;
pub mod handler;
pub mod ping;
pub mod server;
pub mod session;

pub use cli::{Cli, DeploymentMode};
pub use server::{GameServer, ShutdownHandle};
