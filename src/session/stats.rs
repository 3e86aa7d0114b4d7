//! Derived per-session aggregates. Nothing here is stored; every value is
//! recomputed from the round log.

use super::round::Round;
use super::Session;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCounts {
    pub concealed: usize,
    /// Exposed sets this player declared against someone else.
    pub exposed: usize,
}

/// Sum of each player's scores over all rounds.
pub fn running_totals(session: &Session) -> Vec<i64> {
    let mut totals = vec![0; session.player_count()];
    for round in &session.rounds {
        for (t, s) in totals.iter_mut().zip(&round.scores) {
            *t += s;
        }
    }
    totals
}

/// Prefix sums of the scores, one row per round in insertion order.
pub fn cumulative_totals(session: &Session) -> Vec<Vec<i64>> {
    let mut acc = vec![0; session.player_count()];
    session
        .rounds
        .iter()
        .map(|round| {
            for (a, s) in acc.iter_mut().zip(&round.scores) {
                *a += s;
            }
            acc.clone()
        })
        .collect()
}

/// Players credited with winning `round`.
///
/// The declared winner wins if there is one. Otherwise every player tied at
/// the top score wins, provided that score is strictly positive.
pub fn round_winners(round: &Round) -> Vec<usize> {
    if let Some(w) = round.declared_winner() {
        return vec![w];
    }
    let Some(&max) = round.scores.iter().max() else {
        return Vec::new();
    };
    if max <= 0 {
        return Vec::new();
    }
    round
        .scores
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s == max)
        .map(|(i, _)| i)
        .collect()
}

pub fn win_counts(session: &Session) -> Vec<usize> {
    let mut wins = vec![0; session.player_count()];
    for round in &session.rounds {
        for w in round_winners(round) {
            if let Some(slot) = wins.get_mut(w) {
                *slot += 1;
            }
        }
    }
    wins
}

/// Concealed and exposed set counts, read from the event lists only.
pub fn set_counts(session: &Session) -> Vec<SetCounts> {
    let mut counts = vec![SetCounts::default(); session.player_count()];
    for outcome in session.rounds.iter().filter_map(Round::outcome) {
        for (p, c) in counts.iter_mut().enumerate() {
            c.concealed += outcome.concealed_count(p);
            c.exposed += outcome.exposed_count(p);
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;
    use crate::session::round::{MahjongOutcome, RoundEntry, ScoringMode};

    fn session(mode: ScoringMode) -> Session {
        Session::with_default_players("s", "t", 3, mode).unwrap()
    }

    #[test]
    fn ties_at_positive_max_all_win() {
        let mut s = session(ScoringMode::Standard);
        let rules = RuleConfig::default();
        s.append_round(RoundEntry::Scores(vec![2, 2, -4]), &rules).unwrap();
        s.append_round(RoundEntry::Scores(vec![0, 0, 0]), &rules).unwrap();
        s.append_round(RoundEntry::Scores(vec![-1, 3, -2]), &rules).unwrap();
        assert_eq!(win_counts(&s), vec![1, 2, 0]);
        assert_eq!(running_totals(&s), vec![1, 5, -6]);
        assert_eq!(
            cumulative_totals(&s),
            vec![vec![2, 2, -4], vec![2, 2, -4], vec![1, 5, -6]]
        );
    }

    #[test]
    fn declared_winner_overrides_scores() {
        let mut s = session(ScoringMode::Mahjong);
        let rules = RuleConfig::default();
        // Player 1 ties the winner through the exposed set.
        let outcome = MahjongOutcome::with_winner(0).exposed(1, 2);
        s.append_round(RoundEntry::Settled(outcome), &rules).unwrap();
        assert_eq!(s.rounds[0].scores, vec![2, 2, -4]);
        assert_eq!(win_counts(&s), vec![1, 0, 0]);
    }

    #[test]
    fn set_counts_ignore_winner() {
        let mut s = session(ScoringMode::Mahjong);
        let rules = RuleConfig::default();
        let outcome = MahjongOutcome::default().concealed(2).concealed(2).exposed(0, 1);
        s.append_round(RoundEntry::Settled(outcome), &rules).unwrap();
        let counts = set_counts(&s);
        assert_eq!(counts[2].concealed, 2);
        assert_eq!(counts[0].exposed, 1);
        assert_eq!(counts[1], SetCounts::default());
    }
}
