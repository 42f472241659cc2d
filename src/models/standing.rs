//! Derived standings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// A player's tally, recomputed from the full match history every round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub player_id: PlayerId,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub matches_played: u32,
}

impl Standing {
    /// Zero-count standing for a player with no recorded matches.
    pub fn new(player_id: PlayerId, name: String) -> Self {
        Self {
            player_id,
            name,
            wins: 0,
            losses: 0,
            draws: 0,
            matches_played: 0,
        }
    }

    /// Ranking order: wins descending, then fewer matches played, then
    /// lower player id.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .wins
            .cmp(&self.wins)
            .then_with(|| self.matches_played.cmp(&other.matches_played))
            .then_with(|| self.player_id.cmp(&other.player_id))
    }

    /// Absolute win difference to another player.
    pub fn score_gap(&self, other: &Self) -> u32 {
        self.wins.abs_diff(other.wins)
    }
}
