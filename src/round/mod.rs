//! Round orchestration.
//!
//! The controller reads a consistent snapshot of players, matches and byes
//! from the store, derives standings and pairing history, and asks the
//! engine for the next round. Work on one tournament is serialized behind a
//! per-tournament lock; different tournaments proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::calculate::compute_standings;
use crate::models::{
    ByeRecord, MatchRecord, NewMatch, Outcome, Pairing, Player, PlayerId, RoundPairings,
    Standing, TournamentId,
};
use crate::pairing::{
    pair, ExhaustedPairings, PairingError, PairingHistory, PairingOptions, RematchPolicy,
};
use crate::storage::{StorageError, TournamentStore};

/// Errors surfaced by round operations.
#[derive(Debug, Error)]
pub enum RoundError {
    #[error("At least 2 players are needed to pair a round ({registered} registered)")]
    InsufficientPlayers { registered: usize },

    #[error(
        "Round {round} needs {} unavoidable rematches",
        .details.unavoidable_rematches.len()
    )]
    ExhaustedPairings {
        round: u32,
        details: ExhaustedPairings,
    },

    #[error("Pairing search gave up after {steps} steps")]
    SearchLimit { steps: usize },

    #[error("Round {round} is still missing results for {} players", .missing.len())]
    RoundInProgress {
        round: u32,
        /// Players expected in the round with no match or bye recorded
        missing: Vec<PlayerId>,
        /// Their issued pairings, when this controller issued the round
        pending: Vec<Pairing>,
    },

    #[error("Invalid result: {0}")]
    InvalidResult(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Per-tournament state carried between calls.
#[derive(Debug, Default)]
struct RoundState {
    /// Last pairings handed out
    issued: Option<RoundPairings>,
}

/// Everything a round computation reads, fetched under the tournament lock.
struct Snapshot {
    players: Vec<Player>,
    matches: Vec<MatchRecord>,
    byes: Vec<ByeRecord>,
}

impl Snapshot {
    fn last_recorded_round(&self) -> u32 {
        self.matches
            .iter()
            .map(|m| m.round)
            .chain(self.byes.iter().map(|b| b.round))
            .max()
            .unwrap_or(0)
    }

    fn is_recorded(&self, round: u32, pairing: &Pairing) -> bool {
        match *pairing {
            Pairing::Match { player_a, player_b } => self.matches.iter().any(|m| {
                m.round == round && m.involves(player_a) && m.involves(player_b)
            }),
            Pairing::Bye { player } => self
                .byes
                .iter()
                .any(|b| b.round == round && b.player == player),
        }
    }

    /// Players who were registered when `round` started but have neither a
    /// match nor a bye recorded in it. Empty for a round with no records.
    fn missing_from(&self, round: u32) -> Vec<PlayerId> {
        let started = self
            .matches
            .iter()
            .filter(|m| m.round == round)
            .map(|m| m.recorded_at)
            .chain(
                self.byes
                    .iter()
                    .filter(|b| b.round == round)
                    .map(|b| b.recorded_at),
            )
            .min();
        let Some(started) = started else {
            return Vec::new();
        };

        self.players
            .iter()
            .filter(|p| p.registered_at <= started && !self.is_busy(round, p.id))
            .map(|p| p.id)
            .collect()
    }

    /// Whether `player` already has a match or bye in `round`.
    fn is_busy(&self, round: u32, player: PlayerId) -> bool {
        self.matches
            .iter()
            .any(|m| m.round == round && m.involves(player))
            || self
                .byes
                .iter()
                .any(|b| b.round == round && b.player == player)
    }
}

/// Fails while the latest recorded round still has players without a
/// result. An untouched round has no records, so it never blocks.
fn ensure_round_complete(
    snapshot: &Snapshot,
    issued: Option<&RoundPairings>,
) -> Result<(), RoundError> {
    let round = snapshot.last_recorded_round();
    let missing = snapshot.missing_from(round);
    if missing.is_empty() {
        return Ok(());
    }

    let pending = issued
        .filter(|i| i.round == round)
        .map(|i| {
            i.pairings
                .iter()
                .filter(|p| missing.iter().any(|&m| p.involves(m)))
                .filter(|p| !snapshot.is_recorded(round, p))
                .copied()
                .collect()
        })
        .unwrap_or_default();

    Err(RoundError::RoundInProgress {
        round,
        missing,
        pending,
    })
}

/// Drives rounds for any number of tournaments on one store.
pub struct RoundController<S> {
    store: Arc<S>,
    options: PairingOptions,
    rounds: Mutex<HashMap<TournamentId, Arc<Mutex<RoundState>>>>,
}

impl<S: TournamentStore> RoundController<S> {
    pub fn new(store: Arc<S>, options: PairingOptions) -> Self {
        Self {
            store,
            options,
            rounds: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn state_for(&self, tournament: &TournamentId) -> Arc<Mutex<RoundState>> {
        let mut rounds = self.rounds.lock().await;
        rounds.entry(tournament.clone()).or_default().clone()
    }

    async fn snapshot(&self, tournament: &TournamentId) -> Result<Snapshot, StorageError> {
        debug!("Loading {} from {} store", tournament, self.store.name());
        Ok(Snapshot {
            players: self.store.list_players(tournament).await?,
            matches: self.store.list_matches(tournament).await?,
            byes: self.store.list_byes(tournament).await?,
        })
    }

    /// Current ranked standings.
    pub async fn get_standings(
        &self,
        tournament: &TournamentId,
    ) -> Result<Vec<Standing>, RoundError> {
        let state = self.state_for(tournament).await;
        let _state = state.lock().await;

        let snapshot = self.snapshot(tournament).await?;
        Ok(compute_standings(&snapshot.matches, &snapshot.players))
    }

    /// Round whose results are being collected, or the next one to pair.
    pub async fn current_round(&self, tournament: &TournamentId) -> Result<u32, RoundError> {
        let state = self.state_for(tournament).await;
        let state = state.lock().await;

        let snapshot = self.snapshot(tournament).await?;
        let last = snapshot.last_recorded_round();
        let round = match &state.issued {
            _ if !snapshot.missing_from(last).is_empty() => last,
            Some(issued) if issued.round > last => issued.round,
            _ => last + 1,
        };
        Ok(round)
    }

    /// Pair the next round with the configured rematch policy.
    pub async fn advance_round(
        &self,
        tournament: &TournamentId,
    ) -> Result<RoundPairings, RoundError> {
        self.advance_round_with_policy(tournament, self.options.rematch_policy)
            .await
    }

    /// Pair the next round, overriding the rematch policy for this call.
    pub async fn advance_round_with_policy(
        &self,
        tournament: &TournamentId,
        policy: RematchPolicy,
    ) -> Result<RoundPairings, RoundError> {
        let state = self.state_for(tournament).await;
        let mut state = state.lock().await;

        let snapshot = self.snapshot(tournament).await?;
        if snapshot.players.len() < 2 {
            return Err(RoundError::InsufficientPlayers {
                registered: snapshot.players.len(),
            });
        }

        ensure_round_complete(&snapshot, state.issued.as_ref())?;

        let round = snapshot.last_recorded_round() + 1;
        let standings = compute_standings(&snapshot.matches, &snapshot.players);
        let history = PairingHistory::build(&snapshot.matches)
            .with_byes(snapshot.byes.iter().map(|b| b.player));
        debug!(
            "Pairing {} round {} from {} matches ({} distinct meetings)",
            tournament,
            round,
            snapshot.matches.len(),
            history.len()
        );

        let options = self.options.clone().with_policy(policy);
        let outcome = pair(&standings, &history, &options).map_err(|e| match e {
            PairingError::Exhausted(details) => RoundError::ExhaustedPairings { round, details },
            PairingError::SearchLimit { steps } => RoundError::SearchLimit { steps },
        })?;

        let pairings = outcome.into_round(round);
        info!(
            "Tournament {} round {}: {} matches, bye {:?}, {} forced rematches",
            tournament,
            round,
            pairings.matches().count(),
            pairings.bye,
            pairings.forced_rematches.len()
        );
        state.issued = Some(pairings.clone());
        Ok(pairings)
    }

    /// Record a played match. Retrying an already recorded result returns
    /// the stored record.
    pub async fn record_result(
        &self,
        tournament: &TournamentId,
        round: u32,
        player_a: PlayerId,
        player_b: PlayerId,
        outcome: Outcome,
    ) -> Result<MatchRecord, RoundError> {
        let state = self.state_for(tournament).await;
        let state = state.lock().await;

        if player_a == player_b {
            return Err(RoundError::InvalidResult(format!(
                "player {} cannot play themselves",
                player_a
            )));
        }

        let snapshot = self.snapshot(tournament).await?;
        let new_match = NewMatch::new(tournament, round, player_a, player_b, outcome);
        if let Some(existing) = snapshot
            .matches
            .iter()
            .find(|m| m.request_id == new_match.request_id)
        {
            debug!("Result for {} vs {} already recorded", player_a, player_b);
            return Ok(existing.clone());
        }

        check_round_open(&snapshot, round)?;
        for player in [player_a, player_b] {
            if snapshot.is_busy(round, player) {
                return Err(RoundError::InvalidResult(format!(
                    "player {} already has a result in round {}",
                    player, round
                )));
            }
        }

        if let Some(issued) = state.issued.as_ref().filter(|i| i.round == round) {
            let scheduled = Pairing::new_match(player_a, player_b);
            if !issued.pairings.iter().any(|p| p.same_players(&scheduled)) {
                warn!(
                    "Recording unscheduled match {} in {} round {}",
                    scheduled, tournament, round
                );
            }
        }

        Ok(self.store.record_match(tournament, new_match).await?)
    }

    /// Record that `player` sat out `round`.
    pub async fn record_bye(
        &self,
        tournament: &TournamentId,
        round: u32,
        player: PlayerId,
    ) -> Result<ByeRecord, RoundError> {
        let state = self.state_for(tournament).await;
        let _state = state.lock().await;

        let snapshot = self.snapshot(tournament).await?;
        check_round_open(&snapshot, round)?;
        if snapshot
            .matches
            .iter()
            .any(|m| m.round == round && m.involves(player))
        {
            return Err(RoundError::InvalidResult(format!(
                "player {} played in round {} and cannot also have a bye",
                player, round
            )));
        }

        Ok(self.store.record_bye(tournament, round, player).await?)
    }
}

/// Results are accepted for the latest recorded round, or the one after it
/// once the latest round is complete.
fn check_round_open(snapshot: &Snapshot, round: u32) -> Result<(), RoundError> {
    let last = snapshot.last_recorded_round();
    if round == 0 || round < last || round > last + 1 {
        return Err(RoundError::InvalidResult(format!(
            "round {} is not open (latest recorded round is {})",
            round, last
        )));
    }

    if round == last + 1 {
        let missing = snapshot.missing_from(last);
        if !missing.is_empty() {
            return Err(RoundError::InvalidResult(format!(
                "round {} is not open while round {} is missing results for {:?}",
                round, last, missing
            )));
        }
    }
    Ok(())
}
