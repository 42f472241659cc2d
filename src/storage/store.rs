//! The persistence collaborator consumed by the round controller.

use async_trait::async_trait;

use super::StorageError;
use crate::models::{ByeRecord, MatchRecord, NewMatch, Player, PlayerId, Tournament, TournamentId};

/// Storage port for tournament data.
///
/// Implementations must be thread-safe and own their own connection or
/// file-handle lifecycle; every call acquires and releases what it needs.
/// The core never retries a failed call.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Backend identifier for logging.
    fn name(&self) -> &'static str;

    async fn create_tournament(&self, name: &str) -> Result<Tournament, StorageError>;

    /// Fails with [`StorageError::UnknownTournament`] if absent.
    async fn get_tournament(&self, id: &TournamentId) -> Result<Tournament, StorageError>;

    /// Register a player; ids are assigned sequentially from 1.
    async fn register_player(
        &self,
        tournament: &TournamentId,
        name: &str,
    ) -> Result<Player, StorageError>;

    async fn list_players(&self, tournament: &TournamentId) -> Result<Vec<Player>, StorageError>;

    async fn count_players(&self, tournament: &TournamentId) -> Result<usize, StorageError> {
        Ok(self.list_players(tournament).await?.len())
    }

    async fn list_matches(
        &self,
        tournament: &TournamentId,
    ) -> Result<Vec<MatchRecord>, StorageError>;

    /// Record a played match.
    ///
    /// Idempotent on `request_id`: a retried submission returns the record
    /// stored the first time. Both players must be registered.
    async fn record_match(
        &self,
        tournament: &TournamentId,
        new_match: NewMatch,
    ) -> Result<MatchRecord, StorageError>;

    /// Record a bye. Recording the same player and round twice is a no-op.
    async fn record_bye(
        &self,
        tournament: &TournamentId,
        round: u32,
        player: PlayerId,
    ) -> Result<ByeRecord, StorageError>;

    async fn list_byes(&self, tournament: &TournamentId) -> Result<Vec<ByeRecord>, StorageError>;

    async fn has_had_bye(
        &self,
        tournament: &TournamentId,
        player: PlayerId,
    ) -> Result<bool, StorageError> {
        Ok(self
            .list_byes(tournament)
            .await?
            .iter()
            .any(|b| b.player == player))
    }

    /// Remove all match and bye records. Returns the number of matches removed.
    async fn delete_matches(&self, tournament: &TournamentId) -> Result<usize, StorageError>;

    /// Remove all players. Fails with [`StorageError::Conflict`] while any
    /// match still references them.
    async fn delete_players(&self, tournament: &TournamentId) -> Result<usize, StorageError>;
}

/// Checks shared by every backend before a match is stored.
pub(crate) fn validate_new_match(
    tournament: &TournamentId,
    new_match: &NewMatch,
    players: &[Player],
) -> Result<(), StorageError> {
    if new_match.player_a == new_match.player_b {
        return Err(StorageError::InvalidRecord(format!(
            "player {} cannot play themselves",
            new_match.player_a
        )));
    }
    if new_match.round == 0 {
        return Err(StorageError::InvalidRecord(
            "rounds start at 1".to_string(),
        ));
    }
    for player in [new_match.player_a, new_match.player_b] {
        if !players.iter().any(|p| p.id == player) {
            return Err(StorageError::UnknownPlayer {
                tournament: tournament.clone(),
                player,
            });
        }
    }
    Ok(())
}

/// Next sequential player id.
pub(crate) fn next_player_id(players: &[Player]) -> PlayerId {
    PlayerId(players.iter().map(|p| p.id.0).max().unwrap_or(0) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Outcome;

    fn roster() -> Vec<Player> {
        vec![
            Player::new(PlayerId(1), "Ada".to_string()),
            Player::new(PlayerId(2), "Grace".to_string()),
        ]
    }

    #[test]
    fn test_validate_accepts_registered_players() {
        let t = TournamentId::from("t");
        let m = NewMatch::new(&t, 1, PlayerId(1), PlayerId(2), Outcome::Draw);
        assert!(validate_new_match(&t, &m, &roster()).is_ok());
    }

    #[test]
    fn test_validate_rejects_self_match() {
        let t = TournamentId::from("t");
        let m = NewMatch::new(&t, 1, PlayerId(1), PlayerId(1), Outcome::Draw);
        assert!(matches!(
            validate_new_match(&t, &m, &roster()),
            Err(StorageError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_player() {
        let t = TournamentId::from("t");
        let m = NewMatch::new(&t, 1, PlayerId(1), PlayerId(7), Outcome::AWins);
        assert!(matches!(
            validate_new_match(&t, &m, &roster()),
            Err(StorageError::UnknownPlayer { player: PlayerId(7), .. })
        ));
    }

    #[test]
    fn test_next_player_id() {
        assert_eq!(next_player_id(&[]), PlayerId(1));
        assert_eq!(next_player_id(&roster()), PlayerId(3));
    }
}
