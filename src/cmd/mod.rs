pub mod settle;
pub mod shell;
pub mod show;
pub mod transfer;

use clap::Args;
use scorekeep::config::coerce_index;
use scorekeep::session::round::{FollowType, MahjongOutcome, SetEvent};

/// Mahjong round description shared by `settle` and the shell.
#[derive(Args, Debug, Clone, Default)]
pub struct OutcomeArgs {
    /// Winning player index. Blank or invalid means no winner.
    #[arg(short, long)]
    pub winner: Option<String>,

    /// Player index declaring a concealed set. Repeat for several sets.
    #[arg(long = "concealed", value_name = "PLAYER")]
    pub concealed: Vec<usize>,

    /// Exposed set as PLAYER:TARGET. Repeat for several sets.
    #[arg(long = "exposed", value_name = "PLAYER:TARGET", value_parser = parse_exposed)]
    pub exposed: Vec<(usize, usize)>,

    /// Buy multiplier (1-4, four players only).
    #[arg(long, default_value_t = 0)]
    pub buy: i64,

    #[arg(long)]
    pub dealer: Option<String>,

    #[arg(long, default_value_t = FollowType::None)]
    pub follow: FollowType,

    #[arg(long)]
    pub follow_target: Option<String>,
}

fn parse_exposed(raw: &str) -> Result<(usize, usize), String> {
    let (player, target) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected PLAYER:TARGET, got '{}'", raw))?;
    let player = player.trim().parse().map_err(|_| format!("bad player '{}'", player))?;
    let target = target.trim().parse().map_err(|_| format!("bad target '{}'", target))?;
    Ok((player, target))
}

impl OutcomeArgs {
    pub fn to_outcome(&self) -> MahjongOutcome {
        let index = |raw: &Option<String>| raw.as_deref().and_then(coerce_index);
        let mut outcome = MahjongOutcome {
            winner: index(&self.winner),
            dealer: index(&self.dealer),
            follow: self.follow,
            follow_target: index(&self.follow_target),
            buy_multiplier: self.buy,
            ..Default::default()
        };
        for &player in &self.concealed {
            outcome = outcome.concealed(player);
        }
        for &(player, target) in &self.exposed {
            outcome = outcome.exposed(player, target);
        }
        outcome
    }
}

/// One-line description of an outcome for tables.
pub fn describe_outcome(outcome: &MahjongOutcome, players: &[String]) -> String {
    let name = |i: usize| players.get(i).cloned().unwrap_or_else(|| format!("#{}", i));
    let mut parts = Vec::new();
    if let Some(w) = outcome.winner {
        parts.push(format!("win {}", name(w)));
    }
    for (p, events) in outcome.gangs.iter().enumerate() {
        for e in events {
            match e {
                SetEvent::Concealed => parts.push(format!("C {}", name(p))),
                SetEvent::Exposed { target: Some(t) } => {
                    parts.push(format!("E {}<-{}", name(p), name(*t)))
                }
                SetEvent::Exposed { target: None } => {}
            }
        }
    }
    if outcome.buy_multiplier > 0 {
        parts.push(format!("buy x{}", outcome.buy_multiplier));
    }
    if outcome.follow != FollowType::None {
        parts.push(format!("follow {}", outcome.follow));
    }
    if outcome.is_special {
        parts.push(format!("manual {}", outcome.special_note));
    }
    parts.join(", ")
}
