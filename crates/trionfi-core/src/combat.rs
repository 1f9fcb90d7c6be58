//! Duel scoring
//!
//! A duel is resolved from two hand snapshots alone: sum attack and defense
//! per hand, damage is own attack minus the opponent's defense, strictly
//! greater damage wins. Symmetric and side-effect free.

use crate::card::Card;
use serde::{Deserialize, Serialize};

/// Minimum cards a hand needs to enter a duel.
pub const MIN_DUEL_HAND: usize = 2;

/// Outcome of a resolved duel, from the perspective of the pairing order
/// (player one = first popped from the queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelVerdict {
    PlayerOne,
    PlayerTwo,
    Draw,
    /// At least one hand had fewer than [`MIN_DUEL_HAND`] cards; no winner
    /// is computed and both participants receive the same rejection.
    Insufficient,
}

impl DuelVerdict {
    /// Client-facing result text.
    pub fn message(&self) -> &'static str {
        match self {
            DuelVerdict::PlayerOne => "Jogador 1 venceu!",
            DuelVerdict::PlayerTwo => "Jogador 2 venceu!",
            DuelVerdict::Draw => "Empate!",
            DuelVerdict::Insufficient => {
                "Um dos jogadores não tem cartas suficientes (mínimo 2)."
            }
        }
    }
}

pub fn attack_sum(hand: &[Card]) -> i64 {
    hand.iter().map(|c| c.attack as i64).sum()
}

pub fn defense_sum(hand: &[Card]) -> i64 {
    hand.iter().map(|c| c.defense as i64).sum()
}

/// Damage dealt by `attacker` against `defender`: attack total minus the
/// defender's defense total. May be negative.
pub fn damage(attacker: &[Card], defender: &[Card]) -> i64 {
    attack_sum(attacker) - defense_sum(defender)
}

/// Resolve a duel between two hand snapshots.
pub fn resolve_duel(hand_one: &[Card], hand_two: &[Card]) -> DuelVerdict {
    if hand_one.len() < MIN_DUEL_HAND || hand_two.len() < MIN_DUEL_HAND {
        return DuelVerdict::Insufficient;
    }

    let damage_one = damage(hand_one, hand_two);
    let damage_two = damage(hand_two, hand_one);

    if damage_one > damage_two {
        DuelVerdict::PlayerOne
    } else if damage_two > damage_one {
        DuelVerdict::PlayerTwo
    } else {
        DuelVerdict::Draw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(stats: &[(u32, u32)]) -> Vec<Card> {
        stats
            .iter()
            .enumerate()
            .map(|(i, &(atk, def))| Card::new(i as u32 + 1, format!("c{}", i + 1), atk, def))
            .collect()
    }

    #[test]
    fn known_matchup_is_deterministic() {
        // A = [(5,3),(2,4)], B = [(3,2),(1,6)]
        // damageA = 7 - 8 = -1, damageB = 4 - 7 = -3 -> A wins
        let a = hand(&[(5, 3), (2, 4)]);
        let b = hand(&[(3, 2), (1, 6)]);

        assert_eq!(damage(&a, &b), -1);
        assert_eq!(damage(&b, &a), -3);
        assert_eq!(resolve_duel(&a, &b), DuelVerdict::PlayerOne);
    }

    #[test]
    fn swapped_hands_mirror_the_verdict() {
        let a = hand(&[(5, 3), (2, 4)]);
        let b = hand(&[(3, 2), (1, 6)]);

        assert_eq!(resolve_duel(&b, &a), DuelVerdict::PlayerTwo);
    }

    #[test]
    fn equal_damage_is_a_draw() {
        let a = hand(&[(4, 4), (4, 4)]);
        let b = hand(&[(4, 4), (4, 4)]);
        assert_eq!(resolve_duel(&a, &b), DuelVerdict::Draw);
    }

    #[test]
    fn short_hand_rejects_without_verdict() {
        let short = hand(&[(50, 50)]);
        let full = hand(&[(1, 1), (1, 1)]);

        assert_eq!(resolve_duel(&short, &full), DuelVerdict::Insufficient);
        assert_eq!(resolve_duel(&full, &short), DuelVerdict::Insufficient);
        assert_eq!(resolve_duel(&short, &short), DuelVerdict::Insufficient);
    }

    #[test]
    fn empty_hands_reject() {
        assert_eq!(resolve_duel(&[], &[]), DuelVerdict::Insufficient);
    }

    #[test]
    fn rejection_message_is_identical_for_both_sides() {
        // Both participants must receive byte-identical text.
        let a = hand(&[(5, 3)]);
        let b = hand(&[(3, 2), (1, 6)]);
        let left = resolve_duel(&a, &b).message();
        let right = resolve_duel(&a, &b).message();
        assert_eq!(left, right);
        assert_eq!(left, DuelVerdict::Insufficient.message());
    }
}
