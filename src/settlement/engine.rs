use super::types::{SettlementDetails, SettlementInput};
use crate::config::RuleConfig;
use crate::consts::{
    BUY_MULTIPLIER_MAX, FOLLOW_ALL_PAYMENT, FOLLOW_SINGLE_PAYMENT, FOUR_PLAYERS,
};
use crate::session::round::{FollowType, SetEvent};

/// `payee` collects `amount` from every other player.
#[inline]
fn collect_from_all(delta: &mut [i64], payee: usize, amount: i64) {
    let losers = delta.len() as i64 - 1;
    for (i, d) in delta.iter_mut().enumerate() {
        if i == payee {
            *d += amount * losers;
        } else {
            *d -= amount;
        }
    }
}

pub fn apply_win(input: &SettlementInput, rules: &RuleConfig, delta: &mut [i64]) {
    if let Some(winner) = input.valid_index(input.winner) {
        collect_from_all(delta, winner, rules.win_points_per_loser);
    }
}

pub fn apply_concealed(input: &SettlementInput, rules: &RuleConfig, delta: &mut [i64]) {
    for (player, events) in input.events.iter().enumerate().take(input.player_count) {
        for event in events {
            if matches!(event, SetEvent::Concealed) {
                collect_from_all(delta, player, rules.concealed_set_points_per_loser);
            }
        }
    }
}

pub fn apply_exposed(input: &SettlementInput, rules: &RuleConfig, delta: &mut [i64]) {
    for (player, events) in input.events.iter().enumerate().take(input.player_count) {
        for event in events {
            if let SetEvent::Exposed { target } = event {
                match input.valid_index(*target) {
                    Some(t) if t != player => {
                        delta[player] += rules.exposed_set_points;
                        delta[t] -= rules.exposed_set_points;
                    }
                    _ => {}
                }
            }
        }
    }
}

pub fn apply_buy(input: &SettlementInput, delta: &mut [i64]) {
    if input.player_count != FOUR_PLAYERS {
        return;
    }
    if !(1..=BUY_MULTIPLIER_MAX).contains(&input.buy_multiplier) {
        return;
    }
    if let Some(winner) = input.valid_index(input.winner) {
        collect_from_all(delta, winner, input.buy_multiplier);
    }
}

pub fn apply_follow(input: &SettlementInput, delta: &mut [i64]) {
    if input.player_count != FOUR_PLAYERS {
        return;
    }
    let Some(dealer) = input.valid_index(input.dealer) else {
        return;
    };

    match input.follow {
        FollowType::None => {}
        FollowType::All => {
            for (i, d) in delta.iter_mut().enumerate() {
                if i == dealer {
                    *d -= FOLLOW_ALL_PAYMENT * (FOUR_PLAYERS as i64 - 1);
                } else {
                    *d += FOLLOW_ALL_PAYMENT;
                }
            }
        }
        FollowType::Single => match input.valid_index(input.follow_target) {
            Some(target) if target != dealer => {
                delta[dealer] -= FOLLOW_SINGLE_PAYMENT;
                delta[target] += FOLLOW_SINGLE_PAYMENT;
            }
            _ => {}
        },
    }
}

pub fn settle_details(input: &SettlementInput, rules: &RuleConfig) -> SettlementDetails {
    let n = input.player_count;
    let mut d = SettlementDetails::zeroed(n);
    let rules = &rules.clamped();

    apply_win(input, rules, &mut d.win);
    apply_concealed(input, rules, &mut d.concealed);
    apply_exposed(input, rules, &mut d.exposed);
    apply_buy(input, &mut d.buy);
    apply_follow(input, &mut d.follow);

    let total: Vec<i64> = (0..n)
        .map(|i| d.steps().iter().map(|(_, step)| step[i]).sum())
        .collect();
    d.total = total;
    d
}
