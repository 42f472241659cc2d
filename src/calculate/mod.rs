//! Standings calculation.
//!
//! Derives per-player tallies from stored match history:
//! - Win/loss/draw counts and matches played
//! - A deterministic ranking (wins, then fewer matches, then player id)
//! - Consistency checks over a full standings table

use std::collections::HashMap;

use tracing::warn;

use crate::models::{MatchRecord, Outcome, Player, PlayerId, Standing};

/// Compute ranked standings for every registered player.
///
/// Players without recorded matches get zero counts. Matches naming an
/// unregistered player are skipped.
pub fn compute_standings(matches: &[MatchRecord], players: &[Player]) -> Vec<Standing> {
    let mut table: HashMap<PlayerId, Standing> = players
        .iter()
        .map(|p| (p.id, Standing::new(p.id, p.name.clone())))
        .collect();

    for record in matches {
        if !table.contains_key(&record.player_a) || !table.contains_key(&record.player_b) {
            warn!(
                "Skipping match {} with unregistered player ({} vs {})",
                record.match_id, record.player_a, record.player_b
            );
            continue;
        }

        let (a_delta, b_delta) = match record.outcome {
            Outcome::AWins => ((1, 0, 0), (0, 1, 0)),
            Outcome::BWins => ((0, 1, 0), (1, 0, 0)),
            Outcome::Draw => ((0, 0, 1), (0, 0, 1)),
        };
        for (player, (wins, losses, draws)) in
            [(record.player_a, a_delta), (record.player_b, b_delta)]
        {
            if let Some(standing) = table.get_mut(&player) {
                standing.wins += wins;
                standing.losses += losses;
                standing.draws += draws;
                standing.matches_played += 1;
            }
        }
    }

    let mut standings: Vec<Standing> = table.into_values().collect();
    rank_standings(&mut standings);
    standings
}

/// Sort standings into ranking order.
pub fn rank_standings(standings: &mut [Standing]) {
    standings.sort_by(|a, b| a.rank_cmp(b));
}

/// Calculate win rate from wins/losses/draws.
pub fn win_rate(wins: u32, losses: u32, draws: u32) -> f64 {
    let total = wins + losses + draws;
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64
    }
}

/// Check the table-wide invariants: every standing's counts add up to its
/// matches played, total wins equal total losses and draws come in pairs.
pub fn is_consistent(standings: &[Standing]) -> bool {
    let per_player = standings
        .iter()
        .all(|s| s.wins + s.losses + s.draws == s.matches_played);
    let wins: u32 = standings.iter().map(|s| s.wins).sum();
    let losses: u32 = standings.iter().map(|s| s.losses).sum();
    let draws: u32 = standings.iter().map(|s| s.draws).sum();

    per_player && wins == losses && draws % 2 == 0
}
