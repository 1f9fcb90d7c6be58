//! Shared key and channel vocabulary
//!
//! Every process addresses the external stores through these names; they are
//! part of the cross-process contract, not an implementation detail.

/// Hash collection holding one JSON hand per player id.
pub const HAND_HASH: &str = "player:hand";

/// Audit hash recording the winning value of each delivered rare.
pub const DELIVERED_HASH: &str = "cards:delivered";

/// Pub/sub channel carrying card lifecycle events.
pub const CARDS_EVENTS: &str = "cards:events";

/// FIFO queue of duel tickets.
pub const DUEL_QUEUE: &str = "queue:duels";

/// Pub/sub channel carrying duel results back to owning processes.
pub const DUEL_RESULTS: &str = "duel:results";

/// Ledger key for a rare card's claim record.
pub fn claim_key(card_id: u32) -> String {
    format!("card:rare:{}", card_id)
}

/// `DELIVERED` event payload: `DELIVERED <cardId> <playerId> <serverId>`.
pub fn delivered_event(card_id: u32, player_id: &str, server_id: &str) -> String {
    format!("DELIVERED {} {} {}", card_id, player_id, server_id)
}

/// Parse a `cards:events` payload, returning the delivered card id.
///
/// Consumers only need the id to prune their caches; trailing fields are
/// informational. Anything malformed yields `None` — the bus is at-least-once
/// and unordered, so unknown payloads are skipped, never an error.
pub fn parse_delivered(payload: &str) -> Option<u32> {
    let mut parts = payload.split_whitespace();
    match parts.next() {
        Some("DELIVERED") => parts.next()?.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_key_format() {
        assert_eq!(claim_key(101), "card:rare:101");
    }

    #[test]
    fn delivered_roundtrip() {
        let payload = delivered_event(108, "player-a", "srv-1");
        assert_eq!(payload, "DELIVERED 108 player-a srv-1");
        assert_eq!(parse_delivered(&payload), Some(108));
    }

    #[test]
    fn delivered_without_trailing_fields() {
        // Older processes published only the card id.
        assert_eq!(parse_delivered("DELIVERED 42"), Some(42));
    }

    #[test]
    fn malformed_events_are_skipped() {
        assert_eq!(parse_delivered(""), None);
        assert_eq!(parse_delivered("DELIVERED"), None);
        assert_eq!(parse_delivered("DELIVERED abc"), None);
        assert_eq!(parse_delivered("CLAIMED 7"), None);
    }
}
