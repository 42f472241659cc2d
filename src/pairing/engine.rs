//! Score-adjacent matching with memoized backtracking.
//!
//! The highest-ranked unmatched player is tried against every other
//! unmatched player, nearest in rank first. Each search state (the set of
//! already matched players) memoizes the cheapest way to finish from there,
//! or that no way exists, so a state is expanded at most once per run.

use std::collections::HashMap;
use std::ops::Add;

use tracing::{debug, info, warn};

use super::{
    ExhaustedPairings, PairingError, PairingHistory, PairingOptions, PairingOutcome,
    RematchPolicy,
};
use crate::calculate::rank_standings;
use crate::models::{Pairing, Standing};

/// Pair the next round.
///
/// Every player ends up in exactly one match, or as the bye when the field
/// is odd. Rematches are only produced under [`RematchPolicy::AllowForced`]
/// and only when no rematch-free matching exists.
pub fn pair(
    standings: &[Standing],
    history: &PairingHistory,
    options: &PairingOptions,
) -> Result<PairingOutcome, PairingError> {
    let mut ranked = standings.to_vec();
    rank_standings(&mut ranked);

    match ranked.as_slice() {
        [] => return Ok(PairingOutcome::default()),
        [only] => {
            return Ok(PairingOutcome {
                pairings: vec![Pairing::Bye {
                    player: only.player_id,
                }],
                bye: Some(only.player_id),
                ..PairingOutcome::default()
            })
        }
        _ => {}
    }

    let candidates = bye_candidates(&ranked, history);
    let max_steps = options.max_search_steps;

    for &bye in &candidates {
        let pool = pool_without(&ranked, bye);
        match Matcher::new(&pool, history, false, max_steps).run() {
            Ok(Some(matching)) => {
                let outcome = build_outcome(&ranked, bye, &pool, &matching, history);
                info!(
                    "Paired {} players into {} matches (score gap {})",
                    ranked.len(),
                    pool.len() / 2,
                    outcome.score_gap
                );
                return Ok(outcome);
            }
            Ok(None) => {
                debug!(
                    "No rematch-free matching with bye {:?}",
                    bye.map(|i| ranked[i].player_id)
                );
            }
            Err(limit) => {
                warn!(
                    "Pairing search hit the {} step limit; falling back to greedy pairing",
                    limit.steps
                );
                return greedy_fallback(&ranked, &candidates, history, options, limit);
            }
        }
    }

    let (bye, pool, matching) = least_rematches(&ranked, &candidates, history, max_steps);
    let outcome = build_outcome(&ranked, bye, &pool, &matching, history);

    match options.rematch_policy {
        RematchPolicy::Forbid => {
            warn!(
                "No rematch-free pairing for {} players; {} rematches unavoidable",
                ranked.len(),
                outcome.forced_rematches.len()
            );
            Err(PairingError::Exhausted(exhausted(outcome)))
        }
        RematchPolicy::AllowForced => {
            warn!(
                "Forcing {} rematches: {:?}",
                outcome.forced_rematches.len(),
                outcome.forced_rematches
            );
            Ok(outcome)
        }
    }
}

/// Bye order for odd fields: players without a bye from the bottom of the
/// table up, then players who already had one. Even fields get `[None]`.
fn bye_candidates(ranked: &[Standing], history: &PairingHistory) -> Vec<Option<usize>> {
    if ranked.len() % 2 == 0 {
        return vec![None];
    }

    let fresh = (0..ranked.len())
        .rev()
        .filter(|&i| !history.has_had_bye(ranked[i].player_id));
    let repeat = (0..ranked.len())
        .rev()
        .filter(|&i| history.has_had_bye(ranked[i].player_id));

    fresh.chain(repeat).map(Some).collect()
}

fn pool_without(ranked: &[Standing], bye: Option<usize>) -> Vec<&Standing> {
    ranked
        .iter()
        .enumerate()
        .filter(|&(i, _)| Some(i) != bye)
        .map(|(_, s)| s)
        .collect()
}

/// Cheapest matching allowing rematches, across all bye candidates.
/// Candidates compare on rematches, then whether the bye repeats, then gap.
fn least_rematches<'r>(
    ranked: &'r [Standing],
    candidates: &[Option<usize>],
    history: &PairingHistory,
    max_steps: usize,
) -> (Option<usize>, Vec<&'r Standing>, Matching) {
    let repeat_bye =
        |bye: Option<usize>| bye.is_some_and(|i| history.has_had_bye(ranked[i].player_id));
    let rank = |bye: Option<usize>, cost: Cost| (cost.rematches, repeat_bye(bye), cost.gap);
    let mut best: Option<(Option<usize>, Vec<&Standing>, Matching)> = None;

    for &bye in candidates {
        let pool = pool_without(ranked, bye);
        let result = Matcher::new(&pool, history, true, max_steps).run();
        match result {
            Ok(Some(matching)) => {
                let better = best.as_ref().map_or(true, |(best_bye, _, b)| {
                    rank(bye, matching.cost) < rank(*best_bye, b.cost)
                });
                if better {
                    best = Some((bye, pool, matching));
                }
            }
            Ok(None) => {}
            Err(limit) => {
                warn!(
                    "Rematch search hit the {} step limit; using greedy pairing",
                    limit.steps
                );
                if best.is_none() {
                    let matching = greedy(&pool, history);
                    best = Some((bye, pool, matching));
                }
                break;
            }
        }
    }

    best.unwrap_or_else(|| {
        let bye = candidates.first().copied().flatten();
        let pool = pool_without(ranked, bye);
        let matching = greedy(&pool, history);
        (bye, pool, matching)
    })
}

fn greedy_fallback(
    ranked: &[Standing],
    candidates: &[Option<usize>],
    history: &PairingHistory,
    options: &PairingOptions,
    limit: SearchLimitReached,
) -> Result<PairingOutcome, PairingError> {
    let bye = candidates.first().copied().flatten();
    let pool = pool_without(ranked, bye);
    let matching = greedy(&pool, history);
    let outcome = build_outcome(ranked, bye, &pool, &matching, history);

    if outcome.forced_rematches.is_empty() || options.rematch_policy == RematchPolicy::AllowForced
    {
        Ok(outcome)
    } else {
        Err(PairingError::SearchLimit { steps: limit.steps })
    }
}

/// Nearest unmatched opponent not met before, else nearest unmatched.
/// Linear passes only; used when the exact search is over budget.
fn greedy(pool: &[&Standing], history: &PairingHistory) -> Matching {
    let n = pool.len();
    let mut matched = vec![false; n];
    let mut pairs = Vec::with_capacity(n / 2);
    let mut cost = Cost::ZERO;

    for i in 0..n {
        if matched[i] {
            continue;
        }
        matched[i] = true;

        let fresh = (i + 1..n).find(|&j| {
            !matched[j] && !history.has_played(pool[i].player_id, pool[j].player_id)
        });
        let partner = fresh.or_else(|| (i + 1..n).find(|&j| !matched[j]));
        if let Some(j) = partner {
            matched[j] = true;
            cost = cost + edge_cost(pool, history, i, j);
            pairs.push((i, j));
        }
    }

    Matching { pairs, cost }
}

fn build_outcome(
    ranked: &[Standing],
    bye: Option<usize>,
    pool: &[&Standing],
    matching: &Matching,
    history: &PairingHistory,
) -> PairingOutcome {
    let mut pairings = Vec::with_capacity(matching.pairs.len() + 1);
    let mut forced_rematches = Vec::new();
    let mut score_gap = 0;

    for &(i, j) in &matching.pairs {
        let (a, b) = (pool[i], pool[j]);
        let pairing = Pairing::new_match(a.player_id, b.player_id);
        if history.has_played(a.player_id, b.player_id) {
            forced_rematches.push(pairing);
        }
        score_gap += a.score_gap(b);
        pairings.push(pairing);
    }

    let bye = bye.map(|i| ranked[i].player_id);
    if let Some(player) = bye {
        pairings.push(Pairing::Bye { player });
    }

    PairingOutcome {
        pairings,
        bye,
        forced_rematches,
        score_gap,
    }
}

fn exhausted(outcome: PairingOutcome) -> ExhaustedPairings {
    let partial = outcome
        .pairings
        .into_iter()
        .filter(|p| !p.is_bye() && !outcome.forced_rematches.contains(p))
        .collect();

    ExhaustedPairings {
        partial,
        unavoidable_rematches: outcome.forced_rematches,
        bye: outcome.bye,
    }
}

/// Matching cost, compared rematches first, then score gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Cost {
    rematches: u32,
    gap: u32,
}

impl Cost {
    const ZERO: Cost = Cost {
        rematches: 0,
        gap: 0,
    };
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, other: Cost) -> Cost {
        Cost {
            rematches: self.rematches + other.rematches,
            gap: self.gap + other.gap,
        }
    }
}

fn edge_cost(pool: &[&Standing], history: &PairingHistory, i: usize, j: usize) -> Cost {
    Cost {
        rematches: u32::from(history.has_played(pool[i].player_id, pool[j].player_id)),
        gap: pool[i].score_gap(pool[j]),
    }
}

/// Index pairs into the pool, plus their total cost.
#[derive(Debug, Clone)]
struct Matching {
    pairs: Vec<(usize, usize)>,
    cost: Cost,
}

#[derive(Debug, Clone, Copy)]
struct SearchLimitReached {
    steps: usize,
}

/// Bitset of matched pool positions; the memo key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MatchedSet {
    words: Vec<u64>,
    len: usize,
}

impl MatchedSet {
    fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    fn contains(&self, i: usize) -> bool {
        self.words[i / 64] & (1 << (i % 64)) != 0
    }

    fn insert(&mut self, i: usize) {
        self.words[i / 64] |= 1 << (i % 64);
    }

    fn remove(&mut self, i: usize) {
        self.words[i / 64] &= !(1 << (i % 64));
    }

    fn first_unmatched(&self) -> Option<usize> {
        (0..self.len).find(|&i| !self.contains(i))
    }
}

/// Best first move from a state, and the cost of finishing from it.
#[derive(Debug, Clone, Copy)]
struct Step {
    partner: usize,
    cost: Cost,
}

struct Matcher<'a> {
    pool: &'a [&'a Standing],
    history: &'a PairingHistory,
    allow_rematches: bool,
    max_steps: usize,
    steps: usize,
    memo: HashMap<MatchedSet, Option<Step>>,
}

impl<'a> Matcher<'a> {
    fn new(
        pool: &'a [&'a Standing],
        history: &'a PairingHistory,
        allow_rematches: bool,
        max_steps: usize,
    ) -> Self {
        Self {
            pool,
            history,
            allow_rematches,
            max_steps,
            steps: 0,
            memo: HashMap::new(),
        }
    }

    /// Cheapest complete matching, `None` when none exists.
    fn run(mut self) -> Result<Option<Matching>, SearchLimitReached> {
        let mut state = MatchedSet::new(self.pool.len());
        let Some(cost) = self.complete(&mut state)? else {
            return Ok(None);
        };

        // Replay the memoized first moves from the empty state.
        let mut state = MatchedSet::new(self.pool.len());
        let mut pairs = Vec::with_capacity(self.pool.len() / 2);
        while let Some(first) = state.first_unmatched() {
            let Some(Some(step)) = self.memo.get(&state).copied() else {
                return Ok(None);
            };
            state.insert(first);
            state.insert(step.partner);
            pairs.push((first, step.partner));
        }

        debug!(
            "Matcher finished in {} steps (rematches {}, gap {})",
            self.steps, cost.rematches, cost.gap
        );
        Ok(Some(Matching { pairs, cost }))
    }

    fn complete(&mut self, state: &mut MatchedSet) -> Result<Option<Cost>, SearchLimitReached> {
        let Some(first) = state.first_unmatched() else {
            return Ok(Some(Cost::ZERO));
        };
        if let Some(&known) = self.memo.get(&*state) {
            return Ok(known.map(|step| step.cost));
        }

        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(SearchLimitReached {
                steps: self.max_steps,
            });
        }

        let key = state.clone();
        state.insert(first);
        let mut best: Option<Step> = None;

        for candidate in first + 1..self.pool.len() {
            if state.contains(candidate) {
                continue;
            }
            let edge = edge_cost(self.pool, self.history, first, candidate);
            if edge.rematches > 0 && !self.allow_rematches {
                continue;
            }
            // Remaining cost is never negative, so this edge cannot win.
            if best.is_some_and(|b| edge >= b.cost) {
                continue;
            }

            state.insert(candidate);
            let rest = self.complete(state);
            state.remove(candidate);

            if let Some(rest) = rest? {
                let total = edge + rest;
                if best.map_or(true, |b| total < b.cost) {
                    best = Some(Step {
                        partner: candidate,
                        cost: total,
                    });
                }
            }
        }

        state.remove(first);
        self.memo.insert(key, best);
        Ok(best.map(|step| step.cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityId, MatchId, MatchRecord, NewMatch, Outcome, PlayerId};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    const ROUNDS_PLAYED: u32 = 3;

    fn standing(id: u32, wins: u32) -> Standing {
        Standing {
            wins,
            losses: ROUNDS_PLAYED - wins,
            matches_played: ROUNDS_PLAYED,
            ..Standing::new(PlayerId(id), format!("P{}", id))
        }
    }

    /// Players 1..=n with the given win counts.
    fn field(wins: &[u32]) -> Vec<Standing> {
        wins.iter()
            .enumerate()
            .map(|(i, &w)| standing(i as u32 + 1, w))
            .collect()
    }

    fn history(pairs: &[(u32, u32)]) -> PairingHistory {
        let matches: Vec<MatchRecord> = pairs
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| {
                NewMatch::new(
                    &EntityId::from("t"),
                    1,
                    PlayerId(a),
                    PlayerId(b),
                    Outcome::AWins,
                )
                .into_record(MatchId(i as u64))
            })
            .collect();
        PairingHistory::build(&matches)
    }

    fn allow_forced() -> PairingOptions {
        PairingOptions::default().with_policy(RematchPolicy::AllowForced)
    }

    fn ids(outcome: &PairingOutcome) -> Vec<(u32, u32)> {
        outcome
            .pairings
            .iter()
            .filter_map(|p| match *p {
                Pairing::Match { player_a, player_b } => Some((player_a.0, player_b.0)),
                Pairing::Bye { .. } => None,
            })
            .collect()
    }

    fn assert_covers_everyone(standings: &[Standing], outcome: &PairingOutcome) {
        let mut seen = HashSet::new();
        for pairing in &outcome.pairings {
            match *pairing {
                Pairing::Match { player_a, player_b } => {
                    assert!(seen.insert(player_a), "{} paired twice", player_a);
                    assert!(seen.insert(player_b), "{} paired twice", player_b);
                }
                Pairing::Bye { player } => {
                    assert!(seen.insert(player), "{} paired twice", player);
                }
            }
        }
        assert_eq!(seen.len(), standings.len());
        assert_eq!(outcome.bye.is_some(), standings.len() % 2 == 1);
    }

    /// Minimum rematch-free score gap by exhaustive enumeration.
    fn brute_force_gap(standings: &[Standing], history: &PairingHistory) -> Option<u32> {
        fn go(rest: &[&Standing], history: &PairingHistory) -> Option<u32> {
            let Some((first, others)) = rest.split_first() else {
                return Some(0);
            };
            let mut best = None;
            for (k, partner) in others.iter().enumerate() {
                if history.has_played(first.player_id, partner.player_id) {
                    continue;
                }
                let remaining: Vec<&Standing> = others
                    .iter()
                    .enumerate()
                    .filter(|&(m, _)| m != k)
                    .map(|(_, s)| *s)
                    .collect();
                if let Some(cost) = go(&remaining, history) {
                    let total = cost + first.score_gap(partner);
                    best = Some(best.map_or(total, |b: u32| b.min(total)));
                }
            }
            best
        }
        let all: Vec<&Standing> = standings.iter().collect();
        go(&all, history)
    }

    /// Pair 1st with 2nd, 3rd with 4th, ... ignoring history.
    fn naive_gap(standings: &[Standing]) -> u32 {
        let mut ranked = standings.to_vec();
        rank_standings(&mut ranked);
        ranked.chunks(2).map(|c| c[0].score_gap(&c[1])).sum()
    }

    #[test]
    fn test_empty_field() {
        let outcome = pair(&[], &PairingHistory::default(), &PairingOptions::default()).unwrap();
        assert!(outcome.pairings.is_empty());
        assert_eq!(outcome.bye, None);
    }

    #[test]
    fn test_single_player_gets_bye() {
        let outcome = pair(
            &field(&[1]),
            &PairingHistory::default(),
            &PairingOptions::default(),
        )
        .unwrap();
        assert_eq!(outcome.bye, Some(PlayerId(1)));
        assert_eq!(outcome.pairings, vec![Pairing::Bye { player: PlayerId(1) }]);
    }

    #[test]
    fn test_equal_scores_pair_together() {
        let standings = field(&[2, 2, 1, 1]);
        let outcome = pair(&standings, &history(&[]), &PairingOptions::default()).unwrap();

        assert_eq!(ids(&outcome), vec![(1, 2), (3, 4)]);
        assert_eq!(outcome.score_gap, 0);
        assert!(outcome.forced_rematches.is_empty());
    }

    #[test]
    fn test_leaders_already_met_take_nearest_available() {
        let standings = field(&[2, 2, 1, 1]);
        let outcome = pair(&standings, &history(&[(1, 2)]), &PairingOptions::default()).unwrap();

        assert_eq!(ids(&outcome), vec![(1, 3), (2, 4)]);
        assert_eq!(outcome.score_gap, 2);
    }

    #[test]
    fn test_odd_field_bye_skips_previous_bye() {
        let standings = field(&[2, 2, 1, 1, 0]);
        let history = history(&[]).with_byes([PlayerId(5)]);
        let outcome = pair(&standings, &history, &PairingOptions::default()).unwrap();

        assert_eq!(outcome.bye, Some(PlayerId(4)));
        assert_eq!(ids(&outcome), vec![(1, 2), (3, 5)]);
        assert_eq!(
            outcome.pairings.last(),
            Some(&Pairing::Bye { player: PlayerId(4) })
        );
        assert_covers_everyone(&standings, &outcome);
    }

    #[test]
    fn test_odd_field_bye_goes_to_lowest_ranked() {
        let standings = field(&[2, 2, 1, 1, 0]);
        let outcome = pair(&standings, &history(&[]), &PairingOptions::default()).unwrap();

        assert_eq!(outcome.bye, Some(PlayerId(5)));
        assert_eq!(ids(&outcome), vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn test_bye_moves_up_when_lowest_would_force_rematch() {
        // Giving 3 the bye would leave 1 and 2, who already met.
        let standings = field(&[1, 0, 0]);
        let outcome = pair(&standings, &history(&[(1, 2)]), &PairingOptions::default()).unwrap();

        assert_eq!(outcome.bye, Some(PlayerId(2)));
        assert_eq!(ids(&outcome), vec![(1, 3)]);
    }

    #[test]
    fn test_repeat_bye_only_when_everyone_had_one() {
        let standings = field(&[1, 1, 0]);
        let history = history(&[]).with_byes([PlayerId(1), PlayerId(2), PlayerId(3)]);
        let outcome = pair(&standings, &history, &PairingOptions::default()).unwrap();

        assert_eq!(outcome.bye, Some(PlayerId(3)));
    }

    #[test]
    fn test_two_players_who_met_are_exhausted() {
        let standings = field(&[1, 0]);
        let err = pair(&standings, &history(&[(1, 2)]), &PairingOptions::default()).unwrap_err();

        match err {
            PairingError::Exhausted(details) => {
                assert!(details.partial.is_empty());
                assert_eq!(
                    details.unavoidable_rematches,
                    vec![Pairing::new_match(PlayerId(1), PlayerId(2))]
                );
                assert_eq!(details.bye, None);
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_two_players_who_met_forced_when_allowed() {
        let standings = field(&[1, 0]);
        let outcome = pair(&standings, &history(&[(1, 2)]), &allow_forced()).unwrap();

        assert_eq!(ids(&outcome), vec![(1, 2)]);
        assert_eq!(
            outcome.forced_rematches,
            vec![Pairing::new_match(PlayerId(1), PlayerId(2))]
        );
    }

    #[test]
    fn test_forced_fallback_minimizes_rematches() {
        // 1 has met everyone; only 1's match needs to repeat.
        let standings = field(&[3, 2, 1, 0]);
        let history = history(&[(1, 2), (1, 3), (1, 4)]);

        let outcome = pair(&standings, &history, &allow_forced()).unwrap();
        assert_eq!(outcome.forced_rematches.len(), 1);
        assert_eq!(ids(&outcome), vec![(1, 2), (3, 4)]);

        let err = pair(&standings, &history, &PairingOptions::default()).unwrap_err();
        let PairingError::Exhausted(details) = err else {
            panic!("expected Exhausted");
        };
        assert_eq!(details.partial, vec![Pairing::new_match(PlayerId(3), PlayerId(4))]);
        assert_eq!(details.unavoidable_rematches.len(), 1);
    }

    #[test]
    fn test_forced_fallback_keeps_bye_with_fresh_player() {
        // Everyone has met and 3 already sat out. Sitting 3 out again would
        // save score gap, but 2 can take the bye at the same rematch count.
        let standings = field(&[3, 3, 0]);
        let history = history(&[(1, 2), (1, 3), (2, 3)]).with_byes([PlayerId(3)]);

        let outcome = pair(&standings, &history, &allow_forced()).unwrap();
        assert_eq!(outcome.bye, Some(PlayerId(2)));
        assert_eq!(ids(&outcome), vec![(1, 3)]);
        assert_eq!(outcome.forced_rematches.len(), 1);

        let err = pair(&standings, &history, &PairingOptions::default()).unwrap_err();
        let PairingError::Exhausted(details) = err else {
            panic!("expected Exhausted");
        };
        assert_eq!(details.bye, Some(PlayerId(2)));
    }

    #[test]
    fn test_never_repeats_a_pairing() {
        let standings = field(&[3, 3, 2, 2, 2, 1, 1, 0]);
        let past = [(1, 2), (3, 4), (5, 6), (7, 8), (1, 3), (2, 5), (4, 7), (6, 8)];
        let history = history(&past);
        let outcome = pair(&standings, &history, &PairingOptions::default()).unwrap();

        assert_covers_everyone(&standings, &outcome);
        for (a, b) in ids(&outcome) {
            assert!(!history.has_played(PlayerId(a), PlayerId(b)), "{} vs {} repeated", a, b);
        }
    }

    #[test]
    fn test_matches_brute_force_optimum() {
        // Deterministic pseudo-random fixtures of six players.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move |bound: u64| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed % bound
        };

        for _ in 0..40 {
            let wins: Vec<u32> = (0..6).map(|_| next(4) as u32).collect();
            let standings = field(&wins);
            let mut past = Vec::new();
            for a in 1..=6u32 {
                for b in a + 1..=6 {
                    if next(3) == 0 {
                        past.push((a, b));
                    }
                }
            }
            let history = history(&past);

            match (
                brute_force_gap(&standings, &history),
                pair(&standings, &history, &PairingOptions::default()),
            ) {
                (Some(best), Ok(outcome)) => {
                    assert_eq!(outcome.score_gap, best, "wins {:?} past {:?}", wins, past);
                    assert!(outcome.forced_rematches.is_empty());
                    assert_covers_everyone(&standings, &outcome);
                }
                (None, Err(PairingError::Exhausted(_))) => {}
                (expected, got) => panic!(
                    "wins {:?} past {:?}: brute force {:?}, engine {:?}",
                    wins, past, expected, got
                ),
            }
        }
    }

    #[test]
    fn test_no_worse_than_naive_adjacent_pairing() {
        let standings = field(&[4, 3, 3, 2, 2, 1, 1, 0]);
        let outcome = pair(&standings, &history(&[]), &PairingOptions::default()).unwrap();
        assert!(outcome.score_gap <= naive_gap(&standings));
        assert_eq!(outcome.score_gap, 4);
    }

    #[test]
    fn test_deterministic_regardless_of_input_order() {
        let standings = field(&[2, 2, 2, 1, 1, 1, 0]);
        let history = history(&[(1, 2), (4, 5)]).with_byes([PlayerId(7)]);

        let first = pair(&standings, &history, &PairingOptions::default()).unwrap();
        let again = pair(&standings, &history, &PairingOptions::default()).unwrap();
        let mut shuffled = standings.clone();
        shuffled.reverse();
        shuffled.swap(1, 4);
        let reordered = pair(&shuffled, &history, &PairingOptions::default()).unwrap();

        assert_eq!(first, again);
        assert_eq!(first, reordered);
    }

    #[test]
    fn test_search_limit_uses_greedy_when_it_stays_clean() {
        let standings = field(&[0, 0, 0, 0, 0, 0]);
        let options = PairingOptions {
            max_search_steps: 1,
            ..PairingOptions::default()
        };
        let outcome = pair(&standings, &history(&[]), &options).unwrap();

        assert_eq!(ids(&outcome), vec![(1, 2), (3, 4), (5, 6)]);
    }

    #[test]
    fn test_search_limit_reported_when_greedy_needs_rematch() {
        let standings = field(&[0, 0, 0, 0]);
        let history = history(&[(1, 3), (1, 4), (3, 4)]);
        let options = PairingOptions {
            max_search_steps: 1,
            ..PairingOptions::default()
        };

        let err = pair(&standings, &history, &options).unwrap_err();
        assert!(matches!(err, PairingError::SearchLimit { steps: 1 }));

        let forced = pair(
            &standings,
            &history,
            &options.with_policy(RematchPolicy::AllowForced),
        )
        .unwrap();
        assert_eq!(ids(&forced), vec![(1, 2), (3, 4)]);
        assert_eq!(forced.forced_rematches.len(), 1);
    }

    #[test]
    fn test_matched_set() {
        let mut set = MatchedSet::new(70);
        assert_eq!(set.first_unmatched(), Some(0));
        set.insert(0);
        set.insert(65);
        assert!(set.contains(65));
        assert_eq!(set.first_unmatched(), Some(1));
        set.remove(65);
        assert!(!set.contains(65));
    }
}
