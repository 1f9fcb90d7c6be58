//! Rare-card claim protocol
//!
//! Granting a rare card is the one cross-process decision that must be
//! exactly-once. The [`ClaimCoordinator`] trait expresses the contract;
//! [`LocalClaimCoordinator`] serves single-process deployments with a plain
//! mutex, [`LedgerClaimCoordinator`] serves clusters with a single
//! conditional write against the claim ledger. Callers depend only on the
//! trait.

use crate::backend::{ClaimLedger, EventBus, GameStore};
use crate::error::CoordError;
use crate::keys;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

/// Outcome of a claim attempt. Never an error: any uncertainty about the
/// ledger's answer is folded into `Denied` (fail-closed) — a rare is never
/// granted on an unconfirmed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Granted,
    Denied,
}

impl ClaimOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, ClaimOutcome::Granted)
    }
}

/// The durable fact recorded for a won claim:
/// `<serverId>:<playerId>:<millis>` under `card:rare:<cardId>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRecord {
    pub card_id: u32,
    pub server_id: String,
    pub player_id: String,
    pub claimed_at_ms: i64,
}

impl ClaimRecord {
    pub fn new(card_id: u32, server_id: &str, player_id: &str) -> Self {
        let claimed_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self {
            card_id,
            server_id: server_id.to_string(),
            player_id: player_id.to_string(),
            claimed_at_ms,
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}",
            self.server_id, self.player_id, self.claimed_at_ms
        )
    }

    /// Parse a stored record value. Player ids may themselves contain `:`
    /// (they historically embedded socket addresses), so the server id is
    /// everything before the first separator and the timestamp everything
    /// after the last.
    pub fn parse(card_id: u32, raw: &str) -> Option<Self> {
        let (server_id, rest) = raw.split_once(':')?;
        let (player_id, millis) = rest.rsplit_once(':')?;
        Some(Self {
            card_id,
            server_id: server_id.to_string(),
            player_id: player_id.to_string(),
            claimed_at_ms: millis.parse().ok()?,
        })
    }
}

/// Exactly-once assignment of rare cards to players.
#[async_trait]
pub trait ClaimCoordinator: Send + Sync + 'static {
    /// Attempt to claim `card_id` for `player_id`. At most one call ever
    /// returns `Granted` for a given id, across all processes.
    async fn try_claim(&self, card_id: u32, player_id: &str) -> ClaimOutcome;
}

/// Mutex-backed coordinator for single-process deployments. The claimed set
/// lives in process memory; restarts forget it.
#[derive(Debug, Default)]
pub struct LocalClaimCoordinator {
    claimed: Mutex<HashSet<u32>>,
}

impl LocalClaimCoordinator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClaimCoordinator for LocalClaimCoordinator {
    async fn try_claim(&self, card_id: u32, _player_id: &str) -> ClaimOutcome {
        if self.claimed.lock().insert(card_id) {
            ClaimOutcome::Granted
        } else {
            ClaimOutcome::Denied
        }
    }
}

/// Default bound on a single claim attempt's ledger round-trip.
pub const DEFAULT_CLAIM_TIMEOUT: Duration = Duration::from_secs(3);

/// Ledger-backed coordinator for multi-process deployments.
///
/// The grant decision is one conditional write — no read precedes it. On a
/// win the record is mirrored into the audit hash and a `DELIVERED` event is
/// broadcast so other processes prune their caches; failures in those two
/// post-steps are logged and do not revoke the grant, because the ledger
/// record alone is the claim.
pub struct LedgerClaimCoordinator {
    ledger: Arc<dyn ClaimLedger>,
    store: Arc<dyn GameStore>,
    bus: Arc<dyn EventBus>,
    server_id: String,
    timeout: Duration,
}

impl LedgerClaimCoordinator {
    pub fn new(
        ledger: Arc<dyn ClaimLedger>,
        store: Arc<dyn GameStore>,
        bus: Arc<dyn EventBus>,
        server_id: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            store,
            bus,
            server_id: server_id.into(),
            timeout: DEFAULT_CLAIM_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ClaimCoordinator for LedgerClaimCoordinator {
    async fn try_claim(&self, card_id: u32, player_id: &str) -> ClaimOutcome {
        let record = ClaimRecord::new(card_id, &self.server_id, player_id);
        let key = keys::claim_key(card_id);
        let value = record.encode();

        let write = self.ledger.create_if_absent(&key, &value);
        let created = match tokio::time::timeout(self.timeout, write).await {
            Ok(result) => result,
            Err(_) => Err(CoordError::ClaimTimeout),
        };

        let created = match created {
            Ok(created) => created,
            Err(e) if e.is_coordination_failure() => {
                warn!(card_id, error = %e, "claim outcome unknown, denying");
                return ClaimOutcome::Denied;
            }
            Err(e) => {
                error!(card_id, error = %e, "unexpected claim failure, denying");
                return ClaimOutcome::Denied;
            }
        };

        if !created {
            return ClaimOutcome::Denied;
        }

        if let Err(e) = self
            .store
            .hash_set(keys::DELIVERED_HASH, &card_id.to_string(), &value)
            .await
        {
            warn!(card_id, error = %e, "failed to record delivered rare");
        }

        let event = keys::delivered_event(card_id, player_id, &self.server_id);
        if let Err(e) = self.bus.publish(keys::CARDS_EVENTS, &event).await {
            warn!(card_id, error = %e, "failed to broadcast delivery event");
        }

        info!(card_id, player_id, server_id = %self.server_id, "rare card claimed");
        ClaimOutcome::Granted
    }
}
