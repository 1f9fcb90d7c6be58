//! Distributed duel queue and resolver
//!
//! A `duelo` request pushes a ticket onto the shared FIFO queue and returns
//! immediately. A pool of workers — running on any process — pops tickets
//! two at a time, pairing strictly in arrival order: there is no partner
//! key, the first popped entry is "player 1". Each worker loads both hand
//! snapshots, scores the duel, and publishes one result per participant
//! tagged with the owning server, which that server's router delivers to
//! the player's connection.
//!
//! A worker that popped one ticket and then crashes loses that entry — the
//! waiting player never hears back. Known liveness gap of the queue design;
//! there is no re-queue or lease here.

use crate::backend::{EventBus, GameStore};
use crate::error::Result;
use crate::hand::HandStore;
use crate::keys;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use trionfi_core::{resolve_duel, DuelVerdict};

/// A waiting player: who they are and which process owns their connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelTicket {
    pub player_id: String,
    pub server_id: String,
}

/// One participant's resolved outcome, routed by owning server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelResult {
    pub player_id: String,
    pub owner: String,
    pub result: String,
}

/// Handle to the shared duel queue.
#[derive(Clone)]
pub struct DuelQueue {
    store: Arc<dyn GameStore>,
}

impl DuelQueue {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self { store }
    }

    /// Non-blocking enqueue; pairing happens in the workers.
    pub async fn enqueue(&self, ticket: &DuelTicket) -> Result<()> {
        let json = serde_json::to_string(ticket)?;
        self.store.queue_push(keys::DUEL_QUEUE, &json).await?;
        debug!(player_id = %ticket.player_id, "duel ticket enqueued");
        Ok(())
    }

    /// Pop the next decodable ticket, discarding malformed entries rather
    /// than wedging the queue on them.
    async fn pop_ticket(&self) -> Result<DuelTicket> {
        loop {
            let raw = self.store.queue_pop(keys::DUEL_QUEUE).await?;
            match serde_json::from_str(&raw) {
                Ok(ticket) => return Ok(ticket),
                Err(e) => warn!(error = %e, raw = %raw, "discarding malformed duel ticket"),
            }
        }
    }

    /// Block until two tickets are held. First popped is player 1.
    pub async fn next_pair(&self) -> Result<(DuelTicket, DuelTicket)> {
        let one = self.pop_ticket().await?;
        let two = self.pop_ticket().await?;
        Ok((one, two))
    }
}

/// A duel-resolution worker.
pub struct DuelWorker {
    queue: DuelQueue,
    hands: HandStore,
    bus: Arc<dyn EventBus>,
}

impl DuelWorker {
    pub fn new(queue: DuelQueue, hands: HandStore, bus: Arc<dyn EventBus>) -> Self {
        Self { queue, hands, bus }
    }

    /// Pop pairs and resolve until shutdown. The pop is an unbounded wait,
    /// raced against the shutdown signal so the worker stays stoppable.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("duel worker stopping");
                    break;
                }
                pair = self.queue.next_pair() => match pair {
                    Ok((one, two)) => {
                        if let Err(e) = self.resolve(&one, &two).await {
                            error!(
                                player_one = %one.player_id,
                                player_two = %two.player_id,
                                error = %e,
                                "duel resolution failed"
                            );
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "duel queue pop failed");
                        tokio::time::sleep(Duration::from_millis(200)).await;
                    }
                }
            }
        }
    }

    async fn resolve(&self, one: &DuelTicket, two: &DuelTicket) -> Result<()> {
        let hand_one = self.hands.load(&one.player_id).await?;
        let hand_two = self.hands.load(&two.player_id).await?;

        let verdict = resolve_duel(&hand_one, &hand_two);
        let text = match verdict {
            DuelVerdict::Insufficient => verdict.message().to_string(),
            _ => format!("Resultado do duelo: {}", verdict.message()),
        };

        self.publish_result(one, &text).await?;
        self.publish_result(two, &text).await?;

        info!(
            player_one = %one.player_id,
            player_two = %two.player_id,
            verdict = ?verdict,
            "duel resolved"
        );
        Ok(())
    }

    async fn publish_result(&self, ticket: &DuelTicket, text: &str) -> Result<()> {
        let result = DuelResult {
            player_id: ticket.player_id.clone(),
            owner: ticket.server_id.clone(),
            result: text.to_string(),
        };
        let json = serde_json::to_string(&result)?;
        self.bus.publish(keys::DUEL_RESULTS, &json).await
    }
}

/// Spawn the worker pool. Each worker owns its queue handle and shutdown
/// receiver.
pub fn spawn_duel_workers(
    count: usize,
    store: Arc<dyn GameStore>,
    hands: HandStore,
    bus: Arc<dyn EventBus>,
    shutdown: &broadcast::Sender<()>,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|worker| {
            let duel_worker =
                DuelWorker::new(DuelQueue::new(store.clone()), hands.clone(), bus.clone());
            let shutdown_rx = shutdown.subscribe();
            tokio::spawn(async move {
                debug!(worker, "duel worker started");
                duel_worker.run(shutdown_rx).await;
            })
        })
        .collect()
}
