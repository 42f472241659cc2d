//! File-backed tournament store.
//!
//! Layout under the data directory:
//! - `tournaments.jsonl`: registry of created tournaments
//! - `tournaments/<id>/players.jsonl`, `matches.jsonl`, `byes.jsonl`
//!
//! Every call opens and closes the files it touches. Writes are serialized
//! through one lock so id assignment and idempotency checks stay atomic
//! within the process.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::store::{next_player_id, validate_new_match};
use super::{EntityType, JsonlReader, JsonlWriter, StorageConfig, StorageError, TournamentStore};
use crate::models::{
    ByeRecord, MatchId, MatchRecord, NewMatch, Player, PlayerId, Tournament, TournamentId,
};

/// JSONL-backed implementation of [`TournamentStore`].
pub struct JsonlStore {
    config: StorageConfig,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn registry(&self) -> JsonlReader<Tournament> {
        JsonlReader::new(self.config.registry_path())
    }

    fn reader<T: serde::de::DeserializeOwned>(
        &self,
        entity: EntityType,
        tournament: &TournamentId,
    ) -> JsonlReader<T> {
        JsonlReader::for_entity(&self.config, entity, tournament)
    }

    fn writer<T: serde::Serialize>(
        &self,
        entity: EntityType,
        tournament: &TournamentId,
    ) -> JsonlWriter<T> {
        JsonlWriter::for_entity(&self.config, entity, tournament)
    }

    fn ensure_tournament(&self, id: &TournamentId) -> Result<Tournament, StorageError> {
        self.registry()
            .find(|t| &t.id == id)?
            .ok_or_else(|| StorageError::UnknownTournament(id.clone()))
    }

    fn players(&self, tournament: &TournamentId) -> Result<Vec<Player>, StorageError> {
        self.reader(EntityType::Player, tournament).read_all()
    }

    fn matches(&self, tournament: &TournamentId) -> Result<Vec<MatchRecord>, StorageError> {
        self.reader(EntityType::Match, tournament).read_all()
    }

    fn byes(&self, tournament: &TournamentId) -> Result<Vec<ByeRecord>, StorageError> {
        self.reader(EntityType::Bye, tournament).read_all()
    }
}

#[async_trait]
impl TournamentStore for JsonlStore {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn create_tournament(&self, name: &str) -> Result<Tournament, StorageError> {
        let _guard = self.write_lock.lock().await;

        let tournament = Tournament::new(name.to_string());
        JsonlWriter::new(self.config.registry_path()).append(&tournament)?;
        std::fs::create_dir_all(self.config.tournament_dir(&tournament.id))?;

        info!("Created tournament {} ({})", tournament.name, tournament.id);
        Ok(tournament)
    }

    async fn get_tournament(&self, id: &TournamentId) -> Result<Tournament, StorageError> {
        self.ensure_tournament(id)
    }

    async fn register_player(
        &self,
        tournament: &TournamentId,
        name: &str,
    ) -> Result<Player, StorageError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_tournament(tournament)?;

        let player = Player::new(next_player_id(&self.players(tournament)?), name.to_string());
        self.writer(EntityType::Player, tournament).append(&player)?;

        info!("Registered player {} ({}) in {}", player.name, player.id, tournament);
        Ok(player)
    }

    async fn list_players(&self, tournament: &TournamentId) -> Result<Vec<Player>, StorageError> {
        self.ensure_tournament(tournament)?;
        self.players(tournament)
    }

    async fn list_matches(
        &self,
        tournament: &TournamentId,
    ) -> Result<Vec<MatchRecord>, StorageError> {
        self.ensure_tournament(tournament)?;
        self.matches(tournament)
    }

    async fn record_match(
        &self,
        tournament: &TournamentId,
        new_match: NewMatch,
    ) -> Result<MatchRecord, StorageError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_tournament(tournament)?;

        let matches = self.matches(tournament)?;
        if let Some(existing) = matches.iter().find(|m| m.request_id == new_match.request_id) {
            debug!(
                "Match request {} already recorded as {}",
                new_match.request_id, existing.match_id
            );
            return Ok(existing.clone());
        }

        validate_new_match(tournament, &new_match, &self.players(tournament)?)?;

        let next_id = matches.iter().map(|m| m.match_id.0).max().unwrap_or(0) + 1;
        let record = new_match.into_record(MatchId(next_id));
        self.writer(EntityType::Match, tournament).append(&record)?;

        info!(
            "Recorded match {} in {} round {}: {} vs {} ({})",
            record.match_id,
            tournament,
            record.round,
            record.player_a,
            record.player_b,
            record.outcome
        );
        Ok(record)
    }

    async fn record_bye(
        &self,
        tournament: &TournamentId,
        round: u32,
        player: PlayerId,
    ) -> Result<ByeRecord, StorageError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_tournament(tournament)?;

        if round == 0 {
            return Err(StorageError::InvalidRecord("rounds start at 1".to_string()));
        }
        if !self.players(tournament)?.iter().any(|p| p.id == player) {
            return Err(StorageError::UnknownPlayer {
                tournament: tournament.clone(),
                player,
            });
        }

        let reader = self.reader::<ByeRecord>(EntityType::Bye, tournament);
        if let Some(existing) = reader.find(|b| b.round == round && b.player == player)? {
            return Ok(existing);
        }

        let bye = ByeRecord::new(round, player);
        self.writer(EntityType::Bye, tournament).append(&bye)?;

        info!("Recorded bye for {} in {} round {}", player, tournament, round);
        Ok(bye)
    }

    async fn list_byes(&self, tournament: &TournamentId) -> Result<Vec<ByeRecord>, StorageError> {
        self.ensure_tournament(tournament)?;
        self.byes(tournament)
    }

    async fn has_had_bye(
        &self,
        tournament: &TournamentId,
        player: PlayerId,
    ) -> Result<bool, StorageError> {
        self.ensure_tournament(tournament)?;
        let found = self
            .reader::<ByeRecord>(EntityType::Bye, tournament)
            .find(|b| b.player == player)?;
        Ok(found.is_some())
    }

    async fn delete_matches(&self, tournament: &TournamentId) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_tournament(tournament)?;

        let removed = self.matches(tournament)?.len();
        self.writer::<MatchRecord>(EntityType::Match, tournament)
            .write_all(&[])?;
        self.writer::<ByeRecord>(EntityType::Bye, tournament)
            .write_all(&[])?;

        info!("Deleted {} matches from {}", removed, tournament);
        Ok(removed)
    }

    async fn delete_players(&self, tournament: &TournamentId) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_tournament(tournament)?;

        let matches = self.matches(tournament)?;
        if !matches.is_empty() {
            return Err(StorageError::Conflict(format!(
                "{} matches still reference players of {}",
                matches.len(),
                tournament
            )));
        }

        let removed = self.players(tournament)?.len();
        self.writer::<Player>(EntityType::Player, tournament)
            .write_all(&[])?;
        self.writer::<ByeRecord>(EntityType::Bye, tournament)
            .write_all(&[])?;

        info!("Deleted {} players from {}", removed, tournament);
        Ok(removed)
    }
}
