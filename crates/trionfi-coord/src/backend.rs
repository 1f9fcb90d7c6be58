//! Backend capability traits
//!
//! The coordination layer talks to the outside world through three traits.
//! Each is a capability, not a product: the in-memory implementations in
//! [`crate::memory`] serve standalone deployments and tests, the Redis ones
//! in [`crate::redis_backend`] serve multi-process clusters.

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Strongly-consistent conditional-write store.
///
/// This is the only primitive the claim protocol needs: an atomic
/// "create this key unless it already exists". No read-then-write sequence
/// may stand in for it — two racing callers would both observe absence and
/// both write.
#[async_trait]
pub trait ClaimLedger: Send + Sync + 'static {
    /// Create `key = value` only if `key` has never been created.
    /// Returns `true` when this call created the key.
    async fn create_if_absent(&self, key: &str, value: &str) -> Result<bool>;
}

/// At-least-once, unordered pub/sub fan-out of short text events.
#[async_trait]
pub trait EventBus: Send + Sync + 'static {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()>;

    /// Subscribe to a topic. Delivery starts at subscription time; there is
    /// no replay. Duplicates are possible — consumers must be idempotent.
    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<String>>;
}

/// Mutable shared store: hash-field collections plus FIFO queues.
#[async_trait]
pub trait GameStore: Send + Sync + 'static {
    async fn hash_get(&self, collection: &str, field: &str) -> Result<Option<String>>;

    async fn hash_set(&self, collection: &str, field: &str, value: &str) -> Result<()>;

    /// Append to the tail of a FIFO queue.
    async fn queue_push(&self, queue: &str, payload: &str) -> Result<()>;

    /// Pop the head of a FIFO queue, waiting as long as it takes for an
    /// entry to appear. This is the one intentionally-unbounded wait in the
    /// system; callers make it cancellable by racing it against a shutdown
    /// signal.
    async fn queue_pop(&self, queue: &str) -> Result<String>;
}
