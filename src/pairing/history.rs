//! Index of who has already met whom, and who has already sat out.

use std::collections::HashSet;

use crate::models::{MatchRecord, PlayerId};

/// Symmetric set of past meetings plus the players who have had a bye.
///
/// Rebuilt from the full history every round; there are no mutation methods.
#[derive(Debug, Clone, Default)]
pub struct PairingHistory {
    pairs: HashSet<(PlayerId, PlayerId)>,
    byes: HashSet<PlayerId>,
}

impl PairingHistory {
    /// Index every pair that appears in `matches`. Self-pairs are dropped.
    pub fn build(matches: &[MatchRecord]) -> Self {
        let pairs = matches
            .iter()
            .filter(|m| m.player_a != m.player_b)
            .map(|m| ordered(m.player_a, m.player_b))
            .collect();
        Self {
            pairs,
            byes: HashSet::new(),
        }
    }

    /// Attach the players who have already received a bye.
    pub fn with_byes<I>(mut self, players: I) -> Self
    where
        I: IntoIterator<Item = PlayerId>,
    {
        self.byes.extend(players);
        self
    }

    /// Whether `p` and `q` have met before, in either seat order.
    pub fn has_played(&self, p: PlayerId, q: PlayerId) -> bool {
        p != q && self.pairs.contains(&ordered(p, q))
    }

    pub fn has_had_bye(&self, player: PlayerId) -> bool {
        self.byes.contains(&player)
    }

    /// Number of distinct pairs that have met.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn ordered(p: PlayerId, q: PlayerId) -> (PlayerId, PlayerId) {
    if p <= q {
        (p, q)
    } else {
        (q, p)
    }
}
