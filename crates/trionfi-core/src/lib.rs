//! # Trionfi Core
//!
//! Shared data model for the Trionfi card-game backend:
//! - **Card**: immutable card value with attack/defense stats
//! - **Catalog**: the static card pools (unique rares, reusable commons)
//! - **Combat**: deterministic duel scoring over two hands
//!
//! This crate is deliberately free of I/O and async concerns so the scoring
//! rules can be tested in isolation. Coordination lives in `trionfi-coord`,
//! the network surface in `trionfid`.

pub mod card;
pub mod combat;

pub use card::{Card, Catalog};
pub use combat::{attack_sum, damage, defense_sum, resolve_duel, DuelVerdict, MIN_DUEL_HAND};
