//! Player hand accessor
//!
//! Hands live as JSON arrays in the store's `player:hand` hash, one field
//! per player id. Append is load-concatenate-replace with no transactional
//! guard: two connections appending for the same player can lose an update
//! (last write wins). A player is expected to hold a single live connection.

use crate::backend::GameStore;
use crate::error::Result;
use crate::keys;
use std::sync::Arc;
use trionfi_core::Card;

#[derive(Clone)]
pub struct HandStore {
    store: Arc<dyn GameStore>,
}

impl HandStore {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self { store }
    }

    /// Load a player's hand. A player with no recorded hand has an empty
    /// one — never an error.
    pub async fn load(&self, player_id: &str) -> Result<Vec<Card>> {
        match self.store.hash_get(keys::HAND_HASH, player_id).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Append cards to a player's hand, preserving order. Returns the hand
    /// as written.
    pub async fn append(&self, player_id: &str, cards: &[Card]) -> Result<Vec<Card>> {
        let mut hand = self.load(player_id).await?;
        hand.extend_from_slice(cards);
        let json = serde_json::to_string(&hand)?;
        self.store.hash_set(keys::HAND_HASH, player_id, &json).await?;
        Ok(hand)
    }
}
