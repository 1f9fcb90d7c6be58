//! # Trionfi Coordination
//!
//! The coordination layer of the Trionfi backend. Several independent server
//! processes share three external capabilities and nothing else:
//!
//! - a **claim ledger** with a strongly-consistent create-if-absent write,
//!   used to grant each rare card exactly once across the fleet
//! - an **event bus** (at-least-once pub/sub) that propagates claim events so
//!   every process can prune its local candidate cache
//! - a **game store** (hash fields + a blocking FIFO queue) holding player
//!   hands and the distributed duel queue
//!
//! ## Guarantees
//!
//! Claims are linearizable through the ledger's conditional write — that is
//! the one "exactly one winner" guarantee in the system. Cache propagation is
//! unordered relative to claims: a process may attempt a claim another
//! process already won, and is simply denied. Correctness never depends on
//! cache freshness, only wasted attempts do.
//!
//! ## Deployment modes
//!
//! - **Standalone**: in-memory backends, [`LocalClaimCoordinator`]
//! - **Cluster**: Redis-backed backends, [`LedgerClaimCoordinator`]
//!
//! Callers depend only on the traits; the two modes differ solely in which
//! implementations are injected.

pub mod backend;
pub mod cache;
pub mod claim;
pub mod draw;
pub mod duel;
pub mod error;
pub mod hand;
pub mod keys;
pub mod memory;
pub mod redis_backend;

pub use backend::{ClaimLedger, EventBus, GameStore};
pub use cache::{spawn_prune_listener, CandidateCache};
pub use claim::{
    ClaimCoordinator, ClaimOutcome, ClaimRecord, LedgerClaimCoordinator, LocalClaimCoordinator,
};
pub use draw::{DrawConfig, DrawEngine};
pub use duel::{spawn_duel_workers, DuelQueue, DuelResult, DuelTicket, DuelWorker};
pub use error::{CoordError, Result};
pub use hand::HandStore;
pub use memory::{MemoryBus, MemoryLedger, MemoryStore};
pub use redis_backend::RedisBackend;
