//! In-memory tournament store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::store::{next_player_id, validate_new_match};
use super::{StorageError, TournamentStore};
use crate::models::{
    ByeRecord, MatchId, MatchRecord, NewMatch, Player, PlayerId, Tournament, TournamentId,
};

#[derive(Debug)]
struct TournamentData {
    tournament: Tournament,
    players: Vec<Player>,
    matches: Vec<MatchRecord>,
    byes: Vec<ByeRecord>,
}

/// Map-backed [`TournamentStore`]. Can be switched offline to exercise
/// `Unavailable` handling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tournaments: RwLock<HashMap<TournamentId, TournamentData>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with [`StorageError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

fn unknown(id: &TournamentId) -> StorageError {
    StorageError::UnknownTournament(id.clone())
}

#[async_trait]
impl TournamentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_tournament(&self, name: &str) -> Result<Tournament, StorageError> {
        self.check_online()?;
        let tournament = Tournament::new(name.to_string());
        self.tournaments.write().await.insert(
            tournament.id.clone(),
            TournamentData {
                tournament: tournament.clone(),
                players: Vec::new(),
                matches: Vec::new(),
                byes: Vec::new(),
            },
        );
        Ok(tournament)
    }

    async fn get_tournament(&self, id: &TournamentId) -> Result<Tournament, StorageError> {
        self.check_online()?;
        let tournaments = self.tournaments.read().await;
        let data = tournaments.get(id).ok_or_else(|| unknown(id))?;
        Ok(data.tournament.clone())
    }

    async fn register_player(
        &self,
        tournament: &TournamentId,
        name: &str,
    ) -> Result<Player, StorageError> {
        self.check_online()?;
        let mut tournaments = self.tournaments.write().await;
        let data = tournaments.get_mut(tournament).ok_or_else(|| unknown(tournament))?;

        let player = Player::new(next_player_id(&data.players), name.to_string());
        data.players.push(player.clone());
        Ok(player)
    }

    async fn list_players(&self, tournament: &TournamentId) -> Result<Vec<Player>, StorageError> {
        self.check_online()?;
        let tournaments = self.tournaments.read().await;
        let data = tournaments.get(tournament).ok_or_else(|| unknown(tournament))?;
        Ok(data.players.clone())
    }

    async fn list_matches(
        &self,
        tournament: &TournamentId,
    ) -> Result<Vec<MatchRecord>, StorageError> {
        self.check_online()?;
        let tournaments = self.tournaments.read().await;
        let data = tournaments.get(tournament).ok_or_else(|| unknown(tournament))?;
        Ok(data.matches.clone())
    }

    async fn record_match(
        &self,
        tournament: &TournamentId,
        new_match: NewMatch,
    ) -> Result<MatchRecord, StorageError> {
        self.check_online()?;
        let mut tournaments = self.tournaments.write().await;
        let data = tournaments.get_mut(tournament).ok_or_else(|| unknown(tournament))?;

        if let Some(existing) = data
            .matches
            .iter()
            .find(|m| m.request_id == new_match.request_id)
        {
            debug!("Match request {} already recorded", new_match.request_id);
            return Ok(existing.clone());
        }
        validate_new_match(tournament, &new_match, &data.players)?;

        let record = new_match.into_record(MatchId(data.matches.len() as u64 + 1));
        data.matches.push(record.clone());
        Ok(record)
    }

    async fn record_bye(
        &self,
        tournament: &TournamentId,
        round: u32,
        player: PlayerId,
    ) -> Result<ByeRecord, StorageError> {
        self.check_online()?;
        let mut tournaments = self.tournaments.write().await;
        let data = tournaments.get_mut(tournament).ok_or_else(|| unknown(tournament))?;

        if round == 0 {
            return Err(StorageError::InvalidRecord("rounds start at 1".to_string()));
        }
        if !data.players.iter().any(|p| p.id == player) {
            return Err(StorageError::UnknownPlayer {
                tournament: tournament.clone(),
                player,
            });
        }
        if let Some(existing) = data
            .byes
            .iter()
            .find(|b| b.round == round && b.player == player)
        {
            return Ok(existing.clone());
        }

        let bye = ByeRecord::new(round, player);
        data.byes.push(bye.clone());
        Ok(bye)
    }

    async fn list_byes(&self, tournament: &TournamentId) -> Result<Vec<ByeRecord>, StorageError> {
        self.check_online()?;
        let tournaments = self.tournaments.read().await;
        let data = tournaments.get(tournament).ok_or_else(|| unknown(tournament))?;
        Ok(data.byes.clone())
    }

    async fn delete_matches(&self, tournament: &TournamentId) -> Result<usize, StorageError> {
        self.check_online()?;
        let mut tournaments = self.tournaments.write().await;
        let data = tournaments.get_mut(tournament).ok_or_else(|| unknown(tournament))?;

        let removed = data.matches.len();
        data.matches.clear();
        data.byes.clear();
        Ok(removed)
    }

    async fn delete_players(&self, tournament: &TournamentId) -> Result<usize, StorageError> {
        self.check_online()?;
        let mut tournaments = self.tournaments.write().await;
        let data = tournaments.get_mut(tournament).ok_or_else(|| unknown(tournament))?;

        if !data.matches.is_empty() {
            return Err(StorageError::Conflict(format!(
                "{} matches still reference players of {}",
                data.matches.len(),
                tournament
            )));
        }
        let removed = data.players.len();
        data.players.clear();
        data.byes.clear();
        Ok(removed)
    }
}
