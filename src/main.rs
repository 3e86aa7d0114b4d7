use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use scorekeep::app::AppController;
use scorekeep::config::AppConfig;
use scorekeep::error::SkResult;
use scorekeep::persist::Storage;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    app: AppConfig,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute a mahjong settlement without storing it.
    Settle(cmd::settle::SettleArgs),
    /// Print a session's rounds and totals.
    Show(cmd::show::ShowArgs),
    /// Print per-player totals across sessions.
    Summary(cmd::show::SummaryArgs),
    /// Write sessions to a CSV file.
    Export(cmd::transfer::ExportArgs),
    /// Read sessions from a CSV file.
    Import(cmd::transfer::ImportArgs),
    /// Interactive scorekeeping.
    Shell,
}

fn open_app(config: &AppConfig) -> SkResult<AppController> {
    info!("📂 Opening state: {}", config.state);
    let app = AppController::open(Storage::file(&config.state))?;
    Ok(app.with_history_depth(config.history_limit))
}

fn run(cli: Cli, matches: &clap::ArgMatches) -> SkResult<()> {
    match cli.command {
        Commands::Settle(args) => {
            let sub_matches = matches
                .subcommand_matches("settle")
                .unwrap_or(matches);
            cmd::settle::run(&args, sub_matches)
        }
        Commands::Show(args) => cmd::show::run(&open_app(&cli.app)?, &args),
        Commands::Summary(args) => cmd::show::summary(&mut open_app(&cli.app)?, &args),
        Commands::Export(args) => cmd::transfer::export(&open_app(&cli.app)?, &args),
        Commands::Import(args) => cmd::transfer::import(&mut open_app(&cli.app)?, &args),
        Commands::Shell => cmd::shell::run(&mut open_app(&cli.app)?, &cli.app),
    }
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    if let Err(e) = run(cli, &matches) {
        error!("❌ {}", e);
        process::exit(1);
    }
}
