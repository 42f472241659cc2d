//! Pairing model: the engine's assignment of players for one round.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// A single assignment: two players meet, or one player sits out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pairing {
    Match { player_a: PlayerId, player_b: PlayerId },
    Bye { player: PlayerId },
}

impl Pairing {
    pub fn new_match(player_a: PlayerId, player_b: PlayerId) -> Self {
        Pairing::Match { player_a, player_b }
    }

    /// Whether `player` is part of this assignment.
    pub fn involves(&self, player: PlayerId) -> bool {
        match *self {
            Pairing::Match { player_a, player_b } => player_a == player || player_b == player,
            Pairing::Bye { player: p } => p == player,
        }
    }

    /// Same match regardless of side order. Byes compare by player.
    pub fn same_players(&self, other: &Pairing) -> bool {
        match (*self, *other) {
            (
                Pairing::Match { player_a, player_b },
                Pairing::Match {
                    player_a: a,
                    player_b: b,
                },
            ) => (player_a == a && player_b == b) || (player_a == b && player_b == a),
            (Pairing::Bye { player }, Pairing::Bye { player: p }) => player == p,
            _ => false,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Pairing::Bye { .. })
    }
}

impl std::fmt::Display for Pairing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pairing::Match { player_a, player_b } => write!(f, "{} vs {}", player_a, player_b),
            Pairing::Bye { player } => write!(f, "{} (bye)", player),
        }
    }
}

/// The pairings issued for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPairings {
    /// Round number, starting at 1
    pub round: u32,

    /// Matches in rank order, followed by the bye if any
    pub pairings: Vec<Pairing>,

    /// Player sitting out this round
    pub bye: Option<PlayerId>,

    /// Matches repeating an earlier meeting, accepted because nothing else fit
    pub forced_rematches: Vec<Pairing>,

    /// Sum of win differences over all matches
    pub score_gap: u32,
}

impl RoundPairings {
    /// Iterate over the matches only, skipping the bye.
    pub fn matches(&self) -> impl Iterator<Item = (PlayerId, PlayerId)> + '_ {
        self.pairings.iter().filter_map(|p| match *p {
            Pairing::Match { player_a, player_b } => Some((player_a, player_b)),
            Pairing::Bye { .. } => None,
        })
    }
}
