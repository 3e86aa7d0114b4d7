pub mod round;
pub mod stats;

use self::round::{MahjongOutcome, Round, RoundEntry, RoundKind, ScoringMode};
use crate::config::{clamp_score, RuleConfig};
use crate::consts::{MAX_PLAYERS, MIN_PLAYERS};
use crate::error::{ScoreKeepError, SkResult};
use crate::settlement;
use crate::util::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scorekeeping session: a roster and the ordered log of its rounds.
///
/// Rounds are identified by `id`, which is assigned from `next_round_id` and
/// never reused. Every round carries exactly one score per player. A round
/// whose scores do not sum to zero is kept as-is and reported through
/// [`Session::unbalanced_round_ids`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    pub players: Vec<String>,
    #[serde(default)]
    pub rounds: Vec<Round>,
    #[serde(default = "first_round_id")]
    pub next_round_id: u64,
    #[serde(default)]
    pub scoring_mode: ScoringMode,
    #[serde(default, alias = "targetRounds")]
    pub target_round_count: Option<usize>,
    #[serde(default)]
    pub rule_config: Option<RuleConfig>,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn first_round_id() -> u64 {
    1
}

pub fn default_player_name(index: usize) -> String {
    format!("Player {}", index + 1)
}

fn check_player_count(count: usize) -> SkResult<()> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
        return Err(ScoreKeepError::Validation(format!(
            "a session needs {}-{} players, got {}",
            MIN_PLAYERS, MAX_PLAYERS, count
        )));
    }
    Ok(())
}

/// Pads with zeros or truncates so the vector has one entry per player.
fn fit_scores(mut scores: Vec<i64>, player_count: usize) -> Vec<i64> {
    scores.resize(player_count, 0);
    scores
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        players: Vec<String>,
        scoring_mode: ScoringMode,
    ) -> SkResult<Self> {
        check_player_count(players.len())?;
        Ok(Self {
            id: id.into(),
            name: name.into(),
            players,
            rounds: Vec::new(),
            next_round_id: first_round_id(),
            scoring_mode,
            target_round_count: None,
            rule_config: None,
            created_at: Utc::now(),
        })
    }

    /// A session with `count` auto-named players.
    pub fn with_default_players(
        id: impl Into<String>,
        name: impl Into<String>,
        count: usize,
        scoring_mode: ScoringMode,
    ) -> SkResult<Self> {
        let players = (0..count).map(default_player_name).collect();
        Self::new(id, name, players, scoring_mode)
    }

    /// An empty four-player standard session.
    pub fn starter(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            players: (0..4).map(default_player_name).collect(),
            rounds: Vec::new(),
            next_round_id: first_round_id(),
            scoring_mode: ScoringMode::Standard,
            target_round_count: None,
            rule_config: None,
            created_at: Utc::now(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Session override if present, otherwise the global defaults.
    pub fn effective_rules(&self, global: &RuleConfig) -> RuleConfig {
        self.rule_config.unwrap_or(*global)
    }

    pub fn round(&self, id: u64) -> Option<&Round> {
        self.rounds.iter().find(|r| r.id == id)
    }

    fn position(&self, id: u64) -> SkResult<usize> {
        self.rounds
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ScoreKeepError::Rejected(format!("no round with id {}", id)))
    }

    fn build_round(&self, id: u64, entry: RoundEntry, rules: &RuleConfig) -> SkResult<Round> {
        let n = self.player_count();
        let (scores, kind) = match entry {
            RoundEntry::Scores(scores) => (fit_scores(scores, n), RoundKind::Standard),
            RoundEntry::Settled(outcome) if outcome.is_special => {
                return Err(ScoreKeepError::Validation(
                    "a manual round must supply its own scores".into(),
                ))
            }
            RoundEntry::Settled(mut outcome) => {
                self.require_mahjong()?;
                outcome.fit_players(n);
                let scores = settlement::settle_outcome(&outcome, n, rules);
                (scores, RoundKind::Mahjong(outcome))
            }
            RoundEntry::Manual {
                mut outcome,
                scores,
            } => {
                self.require_mahjong()?;
                outcome.fit_players(n);
                outcome.is_special = true;
                (fit_scores(scores, n), RoundKind::Mahjong(outcome))
            }
        };
        Ok(Round {
            id,
            scores,
            timestamp: Utc::now(),
            kind,
        })
    }

    fn require_mahjong(&self) -> SkResult<()> {
        if self.scoring_mode != ScoringMode::Mahjong {
            return Err(ScoreKeepError::Rejected(format!(
                "session '{}' is in {} mode",
                self.name, self.scoring_mode
            )));
        }
        Ok(())
    }

    /// Appends a new round and returns its id.
    pub fn append_round(&mut self, entry: RoundEntry, rules: &RuleConfig) -> SkResult<u64> {
        let id = self.next_round_id;
        let round = self.build_round(id, entry, rules)?;
        self.rounds.push(round);
        self.next_round_id += 1;
        Ok(id)
    }

    /// Recomputes round `id` in place; its id and position are kept.
    pub fn replace_round(&mut self, id: u64, entry: RoundEntry, rules: &RuleConfig) -> SkResult<()> {
        let pos = self.position(id)?;
        let round = self.build_round(id, entry, rules)?;
        self.rounds[pos] = round;
        Ok(())
    }

    pub fn delete_round(&mut self, id: u64) -> SkResult<Round> {
        let pos = self.position(id)?;
        Ok(self.rounds.remove(pos))
    }

    /// Copies the preceding round's content into round `id` with a fresh timestamp.
    /// The first round copies itself.
    pub fn duplicate_previous_round(&mut self, id: u64) -> SkResult<()> {
        let pos = self.position(id)?;
        let source = pos.saturating_sub(1);
        let template = self.rounds[source].clone();
        let target = &mut self.rounds[pos];
        target.scores = template.scores;
        target.kind = template.kind;
        target.timestamp = Utc::now();
        Ok(())
    }

    pub fn add_player(&mut self) -> SkResult<usize> {
        if self.player_count() >= MAX_PLAYERS {
            return Err(ScoreKeepError::Rejected(format!(
                "at most {} players",
                MAX_PLAYERS
            )));
        }
        let index = self.player_count();
        self.players.push(default_player_name(index));
        let n = self.player_count();
        for round in &mut self.rounds {
            round.scores.push(0);
            if let RoundKind::Mahjong(outcome) = &mut round.kind {
                outcome.fit_players(n);
            }
        }
        Ok(index)
    }

    /// Drops player `index` and its score column. Remaining scores are not rebalanced.
    pub fn remove_player(&mut self, index: usize) -> SkResult<String> {
        if self.player_count() <= MIN_PLAYERS {
            return Err(ScoreKeepError::Rejected(format!(
                "at least {} players",
                MIN_PLAYERS
            )));
        }
        if index >= self.player_count() {
            return Err(ScoreKeepError::Rejected(format!(
                "no player at index {}",
                index
            )));
        }
        let removed = self.players.remove(index);
        for round in &mut self.rounds {
            if index < round.scores.len() {
                round.scores.remove(index);
            }
            if let RoundKind::Mahjong(outcome) = &mut round.kind {
                outcome.remove_player(index);
            }
        }
        Ok(removed)
    }

    pub fn rename_player(&mut self, index: usize, name: impl Into<String>) -> SkResult<()> {
        let slot = self.players.get_mut(index).ok_or_else(|| {
            ScoreKeepError::Rejected(format!("no player at index {}", index))
        })?;
        *slot = name.into();
        Ok(())
    }

    pub fn set_scoring_mode(&mut self, mode: ScoringMode) {
        self.scoring_mode = mode;
    }

    pub fn set_target_round_count(&mut self, target: Option<usize>) {
        self.target_round_count = target.filter(|&t| t > 0);
    }

    pub fn set_rule_override(&mut self, rules: Option<RuleConfig>) {
        self.rule_config = rules;
    }

    pub fn unbalanced_round_ids(&self) -> Vec<u64> {
        self.rounds
            .iter()
            .filter(|r| !r.is_balanced())
            .map(|r| r.id)
            .collect()
    }

    /// Restores the one-score-per-player invariant on data loaded from outside.
    pub(crate) fn normalize(&mut self) {
        let n = self.player_count();
        let mut max_id = 0;
        for round in &mut self.rounds {
            round.scores.resize(n, 0);
            for score in &mut round.scores {
                *score = clamp_score(*score);
            }
            if let RoundKind::Mahjong(outcome) = &mut round.kind {
                outcome.fit_players(n);
            }
            max_id = max_id.max(round.id);
        }
        if self.next_round_id <= max_id {
            self.next_round_id = max_id + 1;
        }
    }
}

/// A manual mahjong entry with a note, as used by imports and overrides.
pub fn manual_entry(scores: Vec<i64>, note: impl Into<String>) -> RoundEntry {
    RoundEntry::Manual {
        outcome: MahjongOutcome {
            is_special: true,
            special_note: note.into(),
            ..Default::default()
        },
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four(mode: ScoringMode) -> Session {
        Session::new(
            "s1",
            "Friday",
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            mode,
        )
        .unwrap()
    }

    #[test]
    fn ids_are_never_reused() {
        let mut s = four(ScoringMode::Standard);
        let rules = RuleConfig::default();
        let a = s.append_round(RoundEntry::Scores(vec![1, -1, 0, 0]), &rules).unwrap();
        let b = s.append_round(RoundEntry::Scores(vec![2, -2, 0, 0]), &rules).unwrap();
        s.delete_round(b).unwrap();
        let c = s.append_round(RoundEntry::Scores(vec![0, 0, 0, 0]), &rules).unwrap();
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(s.next_round_id, 4);
    }

    #[test]
    fn short_score_vectors_are_padded() {
        let mut s = four(ScoringMode::Standard);
        let id = s
            .append_round(RoundEntry::Scores(vec![5, -5]), &RuleConfig::default())
            .unwrap();
        assert_eq!(s.round(id).unwrap().scores, vec![5, -5, 0, 0]);
    }

    #[test]
    fn settled_entry_rejected_in_standard_mode() {
        let mut s = four(ScoringMode::Standard);
        let err = s
            .append_round(
                RoundEntry::Settled(MahjongOutcome::with_winner(0)),
                &RuleConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, ScoreKeepError::Rejected(_)));
        assert!(s.rounds.is_empty());
        assert_eq!(s.next_round_id, 1);
    }

    #[test]
    fn manual_round_keeps_unbalanced_scores() {
        let mut s = four(ScoringMode::Mahjong);
        let id = s
            .append_round(manual_entry(vec![5, -1, -1, -1], "misdeal"), &RuleConfig::default())
            .unwrap();
        assert_eq!(s.unbalanced_round_ids(), vec![id]);
        assert!(s.round(id).unwrap().outcome().unwrap().is_special);
    }

    #[test]
    fn duplicate_first_round_copies_itself() {
        let mut s = four(ScoringMode::Standard);
        let id = s
            .append_round(RoundEntry::Scores(vec![1, -1, 0, 0]), &RuleConfig::default())
            .unwrap();
        s.duplicate_previous_round(id).unwrap();
        assert_eq!(s.rounds[0].scores, vec![1, -1, 0, 0]);
        assert_eq!(s.rounds[0].id, id);
    }

    #[test]
    fn target_zero_clears_target() {
        let mut s = four(ScoringMode::Standard);
        s.set_target_round_count(Some(0));
        assert_eq!(s.target_round_count, None);
    }
}
