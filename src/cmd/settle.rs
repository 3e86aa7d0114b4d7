use super::OutcomeArgs;
use crate::reports;
use clap::{ArgMatches, Args};
use scorekeep::config::RuleConfig;
use scorekeep::consts::{MAX_PLAYERS, MIN_PLAYERS};
use scorekeep::error::{ScoreKeepError, SkResult};
use scorekeep::session::default_player_name;
use scorekeep::settlement::{self, SettlementInput};
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SettleArgs {
    #[arg(short, long, default_value_t = 4)]
    pub players: usize,

    #[command(flatten)]
    pub outcome: OutcomeArgs,

    #[command(flatten)]
    pub rules: RuleConfig,

    /// JSON rule file; explicit rule flags override its values.
    #[arg(long)]
    pub rules_file: Option<String>,
}

pub fn run(args: &SettleArgs, matches: &ArgMatches) -> SkResult<()> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&args.players) {
        return Err(ScoreKeepError::Validation(format!(
            "player count must be between {} and {}",
            MIN_PLAYERS, MAX_PLAYERS
        )));
    }

    let rules = match &args.rules_file {
        Some(path) => {
            info!("⚖️  Loading rules from: {}", path);
            let mut file_rules = RuleConfig::load_from_file(path)?;
            file_rules.merge_from_cli(&args.rules, matches);
            file_rules
        }
        None => args.rules,
    };

    let outcome = args.outcome.to_outcome();
    let input = SettlementInput::from_outcome(&outcome, args.players);
    let details = settlement::settle_details(&input, &rules);

    let names: Vec<String> = (0..args.players).map(default_player_name).collect();
    reports::print_settlement(&names, &details);
    Ok(())
}
