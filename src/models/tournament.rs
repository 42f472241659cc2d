//! Tournament model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, TournamentId};

/// A Swiss-system tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    /// Unique identifier
    pub id: TournamentId,

    /// Display name
    pub name: String,

    /// When the tournament was created
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Create a new Tournament with an ID derived from its name and creation time.
    pub fn new(name: String) -> Self {
        let created_at = Utc::now();
        let id = EntityId::generate(&[&name, &created_at.to_rfc3339()]);
        Self {
            id,
            name,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tournament_creation() {
        let tournament = Tournament::new("Spring Open".to_string());
        assert_eq!(tournament.name, "Spring Open");
        assert_eq!(tournament.id.as_str().len(), 16);
    }

    #[test]
    fn test_tournament_serialization() {
        let tournament = Tournament::new("Spring Open".to_string());
        let json = serde_json::to_string(&tournament).unwrap();
        let parsed: Tournament = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tournament);
    }
}
