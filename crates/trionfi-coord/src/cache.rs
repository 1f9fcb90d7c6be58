//! Local candidate cache
//!
//! Each process keeps an advisory map of the rares it believes are still
//! unclaimed. The cache only prunes wasted claim attempts — it is never
//! consulted to grant anything, so staleness costs efficiency, not
//! correctness. It shrinks on local wins and on `DELIVERED` events observed
//! from the bus.

use crate::backend::EventBus;
use crate::keys;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use trionfi_core::{Card, Catalog};

/// Advisory view of still-unclaimed rare cards.
#[derive(Debug)]
pub struct CandidateCache {
    // BTreeMap keeps candidate iteration in stable ascending id order.
    inner: Mutex<BTreeMap<u32, Card>>,
}

impl CandidateCache {
    pub fn new(rares: &[Card]) -> Self {
        Self {
            inner: Mutex::new(rares.iter().map(|c| (c.id, c.clone())).collect()),
        }
    }

    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self::new(catalog.rares())
    }

    /// Drop a card from the candidate set. Removing an absent id is a no-op,
    /// so duplicate or late `DELIVERED` events are harmless.
    pub fn remove(&self, card_id: u32) -> Option<Card> {
        self.inner.lock().remove(&card_id)
    }

    /// Snapshot of candidate ids in stable ascending order. Finite and
    /// restartable; the set may shrink between snapshot and use, which the
    /// draw path tolerates by simply being denied.
    pub fn candidate_ids(&self) -> Vec<u32> {
        self.inner.lock().keys().copied().collect()
    }

    /// Snapshot of the cached card values, for listings.
    pub fn cards(&self) -> Vec<Card> {
        self.inner.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Spawn the listener that keeps a cache fresh: a dedicated task consuming
/// the `cards:events` subscription and pruning on every delivery event,
/// decoupled from request handling. Ends on shutdown or when the
/// subscription closes.
pub fn spawn_prune_listener(
    bus: Arc<dyn EventBus>,
    cache: Arc<CandidateCache>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = match bus.subscribe(keys::CARDS_EVENTS).await {
            Ok(rx) => rx,
            Err(e) => {
                error!(error = %e, "failed to subscribe to card events");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("prune listener stopping");
                    break;
                }
                event = events.recv() => {
                    let Some(payload) = event else {
                        debug!("card event subscription closed");
                        break;
                    };
                    let Some(card_id) = keys::parse_delivered(&payload) else {
                        debug!(payload = %payload, "ignoring unknown card event");
                        continue;
                    };
                    if cache.remove(card_id).is_some() {
                        info!(card_id, "rare delivered elsewhere, pruned from cache");
                    }
                }
            }
        }
    })
}
