use crate::session::round::{FollowType, MahjongOutcome, SetEvent};
use serde::Serialize;

/// Borrowed view of a declared round outcome, ready for settlement.
#[derive(Debug, Clone, Copy)]
pub struct SettlementInput<'a> {
    pub player_count: usize,
    pub winner: Option<usize>,
    pub events: &'a [Vec<SetEvent>],
    pub buy_multiplier: i64,
    pub follow: FollowType,
    pub follow_target: Option<usize>,
    pub dealer: Option<usize>,
}

impl<'a> SettlementInput<'a> {
    pub fn new(player_count: usize) -> Self {
        Self {
            player_count,
            winner: None,
            events: &[],
            buy_multiplier: 0,
            follow: FollowType::None,
            follow_target: None,
            dealer: None,
        }
    }

    pub fn from_outcome(outcome: &'a MahjongOutcome, player_count: usize) -> Self {
        Self {
            player_count,
            winner: outcome.winner,
            events: &outcome.gangs,
            buy_multiplier: outcome.buy_multiplier,
            follow: outcome.follow,
            follow_target: outcome.follow_target,
            dealer: outcome.dealer,
        }
    }

    pub(crate) fn valid_index(&self, idx: Option<usize>) -> Option<usize> {
        idx.filter(|&i| i < self.player_count)
    }
}

/// Per-step breakdown of a settlement. Every vector has `player_count` entries
/// and sums to zero on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementDetails {
    pub win: Vec<i64>,
    pub concealed: Vec<i64>,
    pub exposed: Vec<i64>,
    pub buy: Vec<i64>,
    pub follow: Vec<i64>,
    pub total: Vec<i64>,
}

impl SettlementDetails {
    pub fn zeroed(player_count: usize) -> Self {
        let zeros = vec![0; player_count];
        Self {
            win: zeros.clone(),
            concealed: zeros.clone(),
            exposed: zeros.clone(),
            buy: zeros.clone(),
            follow: zeros.clone(),
            total: zeros,
        }
    }

    /// Steps in application order, labelled for reports.
    pub fn steps(&self) -> [(&'static str, &[i64]); 5] {
        [
            ("Win", self.win.as_slice()),
            ("Concealed", self.concealed.as_slice()),
            ("Exposed", self.exposed.as_slice()),
            ("Buy", self.buy.as_slice()),
            ("Follow", self.follow.as_slice()),
        ]
    }
}
