pub mod engine;
pub mod types;

pub use self::types::{SettlementDetails, SettlementInput};
use crate::config::RuleConfig;
use crate::session::round::MahjongOutcome;

/// Computes the zero-sum score vector for a declared mahjong round.
///
/// Invalid indices and out-of-range multipliers skip their step; this never fails.
pub fn settle(input: &SettlementInput, rules: &RuleConfig) -> Vec<i64> {
    engine::settle_details(input, rules).total
}

/// Same as [`settle`], keeping the contribution of every step.
pub fn settle_details(input: &SettlementInput, rules: &RuleConfig) -> SettlementDetails {
    engine::settle_details(input, rules)
}

/// Settles a stored outcome for a table of `player_count` players.
pub fn settle_outcome(
    outcome: &MahjongOutcome,
    player_count: usize,
    rules: &RuleConfig,
) -> Vec<i64> {
    settle(&SettlementInput::from_outcome(outcome, player_count), rules)
}
