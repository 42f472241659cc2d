//! Match results and bye records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, MatchId, PlayerId, RequestId, TournamentId};

/// Result of a single match, from the perspective of its two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    AWins,
    BWins,
    Draw,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::AWins => write!(f, "a_wins"),
            Outcome::BWins => write!(f, "b_wins"),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

/// A played match. Both participants live in the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,

    /// Idempotency key; a retried submission carries the same key
    pub request_id: RequestId,

    pub round: u32,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub outcome: Outcome,
    pub recorded_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Winner of the match, `None` for a draw.
    pub fn winner(&self) -> Option<PlayerId> {
        match self.outcome {
            Outcome::AWins => Some(self.player_a),
            Outcome::BWins => Some(self.player_b),
            Outcome::Draw => None,
        }
    }

    /// Whether `player` took part in this match.
    pub fn involves(&self, player: PlayerId) -> bool {
        self.player_a == player || self.player_b == player
    }
}

/// A result submission, before the store assigns a match id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
    pub request_id: RequestId,
    pub round: u32,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub outcome: Outcome,
}

impl NewMatch {
    /// Build a submission whose request id is derived from the tournament,
    /// round and the unordered player pair.
    pub fn new(
        tournament_id: &TournamentId,
        round: u32,
        player_a: PlayerId,
        player_b: PlayerId,
        outcome: Outcome,
    ) -> Self {
        Self {
            request_id: Self::request_key(tournament_id, round, player_a, player_b),
            round,
            player_a,
            player_b,
            outcome,
        }
    }

    /// Winner/loser form of a decisive result.
    pub fn decisive(
        tournament_id: &TournamentId,
        round: u32,
        winner: PlayerId,
        loser: PlayerId,
    ) -> Self {
        Self::new(tournament_id, round, winner, loser, Outcome::AWins)
    }

    /// Idempotency key for a match between `a` and `b` in `round`.
    pub fn request_key(
        tournament_id: &TournamentId,
        round: u32,
        a: PlayerId,
        b: PlayerId,
    ) -> RequestId {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        EntityId::generate(&[
            tournament_id.as_str(),
            &round.to_string(),
            &low.to_string(),
            &high.to_string(),
        ])
    }

    pub fn into_record(self, match_id: MatchId) -> MatchRecord {
        MatchRecord {
            match_id,
            request_id: self.request_id,
            round: self.round,
            player_a: self.player_a,
            player_b: self.player_b,
            outcome: self.outcome,
            recorded_at: Utc::now(),
        }
    }
}

/// A round in which a player sat out because the field was odd.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByeRecord {
    pub round: u32,
    pub player: PlayerId,
    pub recorded_at: DateTime<Utc>,
}

impl ByeRecord {
    pub fn new(round: u32, player: PlayerId) -> Self {
        Self {
            round,
            player,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tournament() -> TournamentId {
        EntityId::from("t-1")
    }

    #[test]
    fn test_request_key_ignores_side_order() {
        let k1 = NewMatch::request_key(&tournament(), 2, PlayerId(1), PlayerId(5));
        let k2 = NewMatch::request_key(&tournament(), 2, PlayerId(5), PlayerId(1));
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_request_key_depends_on_round() {
        let k1 = NewMatch::request_key(&tournament(), 1, PlayerId(1), PlayerId(5));
        let k2 = NewMatch::request_key(&tournament(), 2, PlayerId(1), PlayerId(5));
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_decisive_puts_winner_on_side_a() {
        let record = NewMatch::decisive(&tournament(), 1, PlayerId(3), PlayerId(4))
            .into_record(MatchId(1));
        assert_eq!(record.winner(), Some(PlayerId(3)));
        assert!(record.involves(PlayerId(4)));
        assert!(!record.involves(PlayerId(5)));
    }

    #[test]
    fn test_draw_has_no_winner() {
        let record = NewMatch::new(&tournament(), 1, PlayerId(1), PlayerId(2), Outcome::Draw)
            .into_record(MatchId(9));
        assert_eq!(record.winner(), None);
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(serde_json::to_string(&Outcome::AWins).unwrap(), "\"a_wins\"");
        let parsed: Outcome = serde_json::from_str("\"draw\"").unwrap();
        assert_eq!(parsed, Outcome::Draw);
    }
}
