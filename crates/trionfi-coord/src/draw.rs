//! Pack drawing
//!
//! A `pegar` request draws a pack of three cards. Each slot independently
//! rolls for a rare; a favorable roll walks the candidate cache in order,
//! attempting a claim per id until one is granted or the candidates run out.
//! Everything else — unfavorable roll, exhausted cache, every attempt
//! denied — falls back to a uniformly sampled common. A denied attempt is
//! the normal result of racing another process, not a failure.

use crate::cache::CandidateCache;
use crate::claim::ClaimCoordinator;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use trionfi_core::{Card, Catalog};

#[derive(Debug, Clone, Copy)]
pub struct DrawConfig {
    /// Per-slot probability of attempting a rare.
    pub rare_probability: f64,
    /// Cards per pack.
    pub pack_size: usize,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            rare_probability: 0.15,
            pack_size: 3,
        }
    }
}

impl DrawConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.rare_probability) {
            return Err(format!(
                "rare_probability must be within 0.0..=1.0, got {}",
                self.rare_probability
            ));
        }
        if self.pack_size == 0 {
            return Err("pack_size must be at least 1".to_string());
        }
        Ok(())
    }
}

pub struct DrawEngine {
    catalog: Arc<Catalog>,
    cache: Arc<CandidateCache>,
    claims: Arc<dyn ClaimCoordinator>,
    config: DrawConfig,
    // Serializes "inspect candidates, attempt claim, remove on success"
    // across this process's connection tasks.
    rare_gate: Mutex<()>,
}

impl DrawEngine {
    pub fn new(
        catalog: Arc<Catalog>,
        cache: Arc<CandidateCache>,
        claims: Arc<dyn ClaimCoordinator>,
        config: DrawConfig,
    ) -> Self {
        Self {
            catalog,
            cache,
            claims,
            config,
            rare_gate: Mutex::new(()),
        }
    }

    /// Draw a full pack for a player. Infallible: claim uncertainty and
    /// exhausted candidates both degrade to common cards.
    pub async fn draw_pack(&self, player_id: &str) -> Vec<Card> {
        let mut pack = Vec::with_capacity(self.config.pack_size);
        for _ in 0..self.config.pack_size {
            let favorable = rand::thread_rng().gen::<f64>() < self.config.rare_probability;
            if favorable {
                if let Some(card) = self.try_rare(player_id).await {
                    pack.push(card);
                    continue;
                }
            }
            pack.push(self.random_common());
        }
        pack
    }

    async fn try_rare(&self, player_id: &str) -> Option<Card> {
        let _gate = self.rare_gate.lock().await;

        for card_id in self.cache.candidate_ids() {
            if self.claims.try_claim(card_id, player_id).await.is_granted() {
                self.cache.remove(card_id);
                // The catalog, not the cache, supplies the card value: the
                // prune listener may already have removed our own win.
                match self.catalog.rare(card_id) {
                    Some(card) => return Some(card.clone()),
                    None => {
                        warn!(card_id, "claimed id missing from catalog");
                        return None;
                    }
                }
            }
            debug!(card_id, player_id, "rare claim denied, trying next candidate");
        }
        None
    }

    fn random_common(&self) -> Card {
        let commons = self.catalog.commons();
        let idx = rand::thread_rng().gen_range(0..commons.len());
        commons[idx].clone()
    }
}
