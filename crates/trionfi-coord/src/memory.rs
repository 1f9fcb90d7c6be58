//! In-memory backends
//!
//! Single-process implementations of the backend traits, used by standalone
//! deployments and tests. They honor the same contracts as the Redis
//! backends: the ledger write is atomic, the bus is fan-out from
//! subscription time, the queue pop blocks until an entry arrives.

use crate::backend::{ClaimLedger, EventBus, GameStore};
use crate::error::{CoordError, Result};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Semaphore};

/// In-memory claim ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: DashMap<String, String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read back a claim record (test/audit helper).
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.clone())
    }
}

#[async_trait]
impl ClaimLedger for MemoryLedger {
    async fn create_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        // The shard entry lock makes the check-and-insert atomic.
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value.to_string());
                Ok(true)
            }
        }
    }
}

/// In-memory event bus over tokio broadcast channels, one per topic.
#[derive(Debug, Default)]
pub struct MemoryBus {
    topics: DashMap<String, broadcast::Sender<String>>,
}

const BUS_CAPACITY: usize = 256;

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<String> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(BUS_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl EventBus for MemoryBus {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        // No subscribers is not an error; fan-out to zero is a no-op.
        let _ = self.sender(topic).send(payload.to_string());
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<String>> {
        let mut source = self.sender(topic).subscribe();
        let (tx, rx) = mpsc::channel(BUS_CAPACITY);

        tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    // A lagged subscriber lost events; the bus contract is
                    // at-least-once from subscription time, and consumers
                    // tolerate gaps the same way they tolerate reordering.
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "bus subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(rx)
    }
}

#[derive(Debug)]
struct QueueSlot {
    items: Mutex<VecDeque<String>>,
    // One permit per queued item. A counting primitive, so concurrent
    // poppers racing concurrent pushes never lose a wakeup.
    ready: Semaphore,
}

impl Default for QueueSlot {
    fn default() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            ready: Semaphore::new(0),
        }
    }
}

/// In-memory game store: hash collections plus blocking FIFO queues.
#[derive(Debug, Default)]
pub struct MemoryStore {
    hashes: DashMap<String, HashMap<String, String>>,
    queues: DashMap<String, Arc<QueueSlot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, queue: &str) -> Arc<QueueSlot> {
        self.queues
            .entry(queue.to_string())
            .or_insert_with(|| Arc::new(QueueSlot::default()))
            .clone()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn hash_get(&self, collection: &str, field: &str) -> Result<Option<String>> {
        Ok(self
            .hashes
            .get(collection)
            .and_then(|h| h.get(field).cloned()))
    }

    async fn hash_set(&self, collection: &str, field: &str, value: &str) -> Result<()> {
        self.hashes
            .entry(collection.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn queue_push(&self, queue: &str, payload: &str) -> Result<()> {
        let slot = self.slot(queue);
        // The item goes in before its permit, so an acquirer always finds it.
        slot.items.lock().push_back(payload.to_string());
        slot.ready.add_permits(1);
        Ok(())
    }

    async fn queue_pop(&self, queue: &str) -> Result<String> {
        let slot = self.slot(queue);
        let permit = slot
            .ready
            .acquire()
            .await
            .map_err(|_| CoordError::ChannelClosed)?;
        permit.forget();
        match slot.items.lock().pop_front() {
            Some(item) => Ok(item),
            None => Err(CoordError::Store("queue permit without entry".into())),
        }
    }
}
