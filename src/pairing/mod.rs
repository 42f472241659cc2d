//! Swiss pairing engine.
//!
//! Turns ranked standings plus the history of past meetings into the next
//! round's pairings. All types here are pure data; nothing touches storage.

mod engine;
mod history;

pub use engine::pair;
pub use history::PairingHistory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Pairing, PlayerId, RoundPairings};

/// What to do when no rematch-free matching exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RematchPolicy {
    /// Fail with the best partial matching and the unavoidable rematches.
    #[default]
    Forbid,
    /// Accept the matching with the fewest rematches and report them.
    AllowForced,
}

/// Engine tuning, usually loaded from the `[pairing]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingOptions {
    #[serde(default)]
    pub rematch_policy: RematchPolicy,

    /// Cap on search states expanded per matcher run
    #[serde(default = "default_max_search_steps")]
    pub max_search_steps: usize,
}

fn default_max_search_steps() -> usize {
    200_000
}

impl Default for PairingOptions {
    fn default() -> Self {
        Self {
            rematch_policy: RematchPolicy::default(),
            max_search_steps: default_max_search_steps(),
        }
    }
}

impl PairingOptions {
    pub fn with_policy(mut self, rematch_policy: RematchPolicy) -> Self {
        self.rematch_policy = rematch_policy;
        self
    }
}

/// Engine result for one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingOutcome {
    /// Matches in rank order of their higher-ranked player, then the bye
    pub pairings: Vec<Pairing>,
    pub bye: Option<PlayerId>,
    pub forced_rematches: Vec<Pairing>,
    pub score_gap: u32,
}

impl PairingOutcome {
    /// Stamp the outcome with its round number.
    pub fn into_round(self, round: u32) -> RoundPairings {
        RoundPairings {
            round,
            pairings: self.pairings,
            bye: self.bye,
            forced_rematches: self.forced_rematches,
            score_gap: self.score_gap,
        }
    }
}

/// Diagnostic payload when every matching needs a rematch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExhaustedPairings {
    /// Rematch-free part of the least-rematch matching
    pub partial: Vec<Pairing>,

    /// Matches that could not avoid repeating an earlier meeting
    pub unavoidable_rematches: Vec<Pairing>,

    pub bye: Option<PlayerId>,
}

/// Errors that can occur while pairing a round.
#[derive(Debug, Error)]
pub enum PairingError {
    #[error(
        "No rematch-free pairing exists ({} unavoidable rematches)",
        .0.unavoidable_rematches.len()
    )]
    Exhausted(ExhaustedPairings),

    #[error("Pairing search gave up after {steps} steps without a rematch-free pairing")]
    SearchLimit { steps: usize },
}
