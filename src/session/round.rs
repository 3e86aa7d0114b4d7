use crate::config::lenient_int;
use crate::util::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ScoringMode {
    #[default]
    Standard,
    Mahjong,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FollowType {
    #[default]
    None,
    /// Dealer pays every other player.
    All,
    /// Dealer pays one designated player.
    Single,
}

/// A concealed or exposed set declared by one player during a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SetEvent {
    Concealed,
    Exposed { target: Option<usize> },
}

/// Everything a mahjong-mode round declares besides its final scores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MahjongOutcome {
    pub winner: Option<usize>,
    /// One event list per player index.
    pub gangs: Vec<Vec<SetEvent>>,
    pub dealer: Option<usize>,
    pub follow: FollowType,
    pub follow_target: Option<usize>,
    #[serde(deserialize_with = "lenient_int")]
    pub buy_multiplier: i64,
    pub is_special: bool,
    pub special_note: String,
}

impl MahjongOutcome {
    pub fn with_winner(winner: usize) -> Self {
        Self {
            winner: Some(winner),
            ..Default::default()
        }
    }

    pub fn concealed(mut self, player: usize) -> Self {
        self.event_list(player).push(SetEvent::Concealed);
        self
    }

    pub fn exposed(mut self, player: usize, target: usize) -> Self {
        self.event_list(player).push(SetEvent::Exposed {
            target: Some(target),
        });
        self
    }

    pub fn buy(mut self, multiplier: i64) -> Self {
        self.buy_multiplier = multiplier;
        self
    }

    pub fn follow(mut self, dealer: usize, follow: FollowType, target: Option<usize>) -> Self {
        self.dealer = Some(dealer);
        self.follow = follow;
        self.follow_target = target;
        self
    }

    fn event_list(&mut self, player: usize) -> &mut Vec<SetEvent> {
        if self.gangs.len() <= player {
            self.gangs.resize_with(player + 1, Vec::new);
        }
        &mut self.gangs[player]
    }

    /// Resizes the per-player event lists to `player_count`.
    pub fn fit_players(&mut self, player_count: usize) {
        self.gangs.resize_with(player_count, Vec::new);
    }

    /// Drops every reference to `removed` and shifts higher indices down.
    pub fn remove_player(&mut self, removed: usize) {
        let remap = |idx: Option<usize>| match idx {
            Some(i) if i == removed => None,
            Some(i) if i > removed => Some(i - 1),
            other => other,
        };

        self.winner = remap(self.winner);
        self.dealer = remap(self.dealer);
        self.follow_target = remap(self.follow_target);

        if removed < self.gangs.len() {
            self.gangs.remove(removed);
        }
        for events in &mut self.gangs {
            events.retain(|e| !matches!(e, SetEvent::Exposed { target: Some(t) } if *t == removed));
            for e in events.iter_mut() {
                if let SetEvent::Exposed { target } = e {
                    *target = remap(*target);
                }
            }
        }
    }

    pub fn concealed_count(&self, player: usize) -> usize {
        self.gangs.get(player).map_or(0, |events| {
            events
                .iter()
                .filter(|e| matches!(e, SetEvent::Concealed))
                .count()
        })
    }

    /// Exposed sets declared by `player` that charged someone.
    pub fn exposed_count(&self, player: usize) -> usize {
        self.gangs.get(player).map_or(0, |events| {
            events
                .iter()
                .filter(|e| matches!(e, SetEvent::Exposed { target: Some(_) }))
                .count()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RoundKind {
    /// Raw entered scores.
    #[default]
    Standard,
    Mahjong(MahjongOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: u64,
    pub scores: Vec<i64>,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub kind: RoundKind,
}

impl Round {
    pub fn total(&self) -> i64 {
        self.scores.iter().sum()
    }

    /// A round is balanced when its scores sum to zero.
    pub fn is_balanced(&self) -> bool {
        self.total() == 0
    }

    pub fn outcome(&self) -> Option<&MahjongOutcome> {
        match &self.kind {
            RoundKind::Mahjong(o) => Some(o),
            RoundKind::Standard => None,
        }
    }

    /// The declared winner, if the round carries one and it is in range.
    pub fn declared_winner(&self) -> Option<usize> {
        self.outcome()
            .and_then(|o| o.winner)
            .filter(|&w| w < self.scores.len())
    }
}

/// What a caller submits to create or replace a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEntry {
    /// Standard mode: scores are stored verbatim.
    Scores(Vec<i64>),
    /// Mahjong mode: scores are computed from the outcome.
    Settled(MahjongOutcome),
    /// Mahjong mode with a manual override: scores are supplied by the caller.
    Manual {
        outcome: MahjongOutcome,
        scores: Vec<i64>,
    },
}
