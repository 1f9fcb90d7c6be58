//! Card values and the static catalog
//!
//! The catalog holds two pools: a small fixed set of rare cards (each
//! instance is globally unique — once claimed it may never be issued again)
//! and a larger set of common cards that can be dealt any number of times.
//! Common stats come from a fixed-seed RNG so every process and every test
//! run sees the same catalog.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seed for common-card generation. Fixed so all server processes agree on
/// the common pool without sharing state.
const COMMON_POOL_SEED: u64 = 0x5eed_ca2d;

/// An immutable card value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: u32,
    pub name: String,
    pub attack: u32,
    pub defense: u32,
}

impl Card {
    pub fn new(id: u32, name: impl Into<String>, attack: u32, defense: u32) -> Self {
        Self {
            id,
            name: name.into(),
            attack,
            defense,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (ATK {} / DEF {})",
            self.id, self.name, self.attack, self.defense
        )
    }
}

/// The static card pools.
#[derive(Debug, Clone)]
pub struct Catalog {
    rares: Vec<Card>,
    commons: Vec<Card>,
}

impl Catalog {
    /// Build the standard catalog: 15 rares (ids 101-115), 30 commons (ids 1-30).
    pub fn standard() -> Self {
        let rares = vec![
            Card::new(101, "Dragão Lendário", 14, 12),
            Card::new(102, "Fênix de Fogo", 13, 9),
            Card::new(103, "Mago Supremo", 12, 11),
            Card::new(104, "Titã de Pedra", 10, 15),
            Card::new(105, "Serpente Marinha", 11, 10),
            Card::new(106, "Cavaleiro Negro", 13, 11),
            Card::new(107, "Anjo da Guarda", 9, 14),
            Card::new(108, "Demônio Ancestral", 15, 9),
            Card::new(109, "Dragão de Gelo", 12, 13),
            Card::new(110, "Fada Suprema", 10, 12),
            Card::new(111, "Besta Colossal", 14, 10),
            Card::new(112, "Samurai Fantasma", 13, 10),
            Card::new(113, "Guardião Celestial", 11, 14),
            Card::new(114, "Minotauro Real", 12, 12),
            Card::new(115, "Fera Mística", 13, 13),
        ];

        let mut rng = StdRng::seed_from_u64(COMMON_POOL_SEED);
        let commons = (1..=30)
            .map(|i| {
                let attack = rng.gen_range(3..=9);
                let defense = rng.gen_range(2..=8);
                Card::new(i, format!("Comum {}", i), attack, defense)
            })
            .collect();

        Self { rares, commons }
    }

    pub fn rares(&self) -> &[Card] {
        &self.rares
    }

    pub fn commons(&self) -> &[Card] {
        &self.commons
    }

    /// Look up a rare by id. The catalog, not any cache, is the source of
    /// card *values*; only claim state lives elsewhere.
    pub fn rare(&self, id: u32) -> Option<&Card> {
        self.rares.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_pools() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.rares().len(), 15);
        assert_eq!(catalog.commons().len(), 30);

        // Rare ids are 101..=115, commons 1..=30
        assert!(catalog.rares().iter().all(|c| (101..=115).contains(&c.id)));
        assert!(catalog.commons().iter().all(|c| (1..=30).contains(&c.id)));
    }

    #[test]
    fn catalog_is_reproducible() {
        let a = Catalog::standard();
        let b = Catalog::standard();
        assert_eq!(a.commons(), b.commons());
        assert_eq!(a.rares(), b.rares());
    }

    #[test]
    fn common_stats_in_range() {
        let catalog = Catalog::standard();
        for c in catalog.commons() {
            assert!((3..=9).contains(&c.attack), "attack out of range: {}", c);
            assert!((2..=8).contains(&c.defense), "defense out of range: {}", c);
        }
    }

    #[test]
    fn rare_lookup() {
        let catalog = Catalog::standard();
        let dragon = catalog.rare(101).expect("rare 101 exists");
        assert_eq!(dragon.name, "Dragão Lendário");
        assert_eq!(dragon.attack, 14);
        assert_eq!(dragon.defense, 12);
        assert!(catalog.rare(999).is_none());
    }

    #[test]
    fn card_display_format() {
        let card = Card::new(101, "Dragão Lendário", 14, 12);
        assert_eq!(card.to_string(), "[101] Dragão Lendário (ATK 14 / DEF 12)");
    }

    #[test]
    fn card_json_roundtrip() {
        let card = Card::new(7, "Comum 7", 5, 4);
        let json = serde_json::to_string(&card).unwrap();
        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(card, back);
    }
}
