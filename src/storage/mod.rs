//! Persistence for tournaments, players, results and byes.
//!
//! The pairing core only sees the [`TournamentStore`] trait. Two backends
//! implement it:
//! - [`JsonlStore`]: one JSONL file per entity type and tournament on disk
//! - [`MemoryStore`]: in-process maps, used by tests and embedders

mod file;
mod jsonl;
mod memory;
mod store;

pub use file::JsonlStore;
pub use jsonl::{EntityType, JsonlIterator, JsonlReader, JsonlWriter};
pub use memory::MemoryStore;
pub use store::TournamentStore;

use std::path::PathBuf;
use thiserror::Error;

use crate::models::{PlayerId, TournamentId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown tournament: {0}")]
    UnknownTournament(TournamentId),

    #[error("Unknown player {player} in tournament {tournament}")]
    UnknownPlayer {
        tournament: TournamentId,
        player: PlayerId,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn tournaments_dir(&self) -> PathBuf {
        self.data_dir.join("tournaments")
    }

    /// Directory holding one tournament's entity files.
    pub fn tournament_dir(&self, tournament_id: &TournamentId) -> PathBuf {
        self.tournaments_dir().join(tournament_id.as_str())
    }

    /// Registry of all tournaments.
    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join(EntityType::Tournament.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));
        let id = TournamentId::from("abc123");

        assert_eq!(config.tournaments_dir(), PathBuf::from("/data/tournaments"));
        assert_eq!(
            config.tournament_dir(&id),
            PathBuf::from("/data/tournaments/abc123")
        );
        assert_eq!(
            config.registry_path(),
            PathBuf::from("/data/tournaments.jsonl")
        );
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_unknown_player_message() {
        let err = StorageError::UnknownPlayer {
            tournament: TournamentId::from("t-1"),
            player: PlayerId(4),
        };
        assert_eq!(err.to_string(), "Unknown player 4 in tournament t-1");
    }
}
