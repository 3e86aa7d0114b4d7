use super::show::SummaryArgs;
use super::transfer::write_file;
use super::OutcomeArgs;
use crate::reports;
use clap::{Parser, Subcommand};
use scorekeep::aggregate::chart_series;
use scorekeep::app::AppController;
use scorekeep::config::{coerce_int, parse_int_list, AppConfig, RuleConfig};
use scorekeep::error::SkResult;
use scorekeep::session::round::{RoundEntry, ScoringMode};
use scorekeep::session::{default_player_name, manual_entry};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// List sessions.
    Sessions,
    /// Create a session and switch to it.
    New {
        name: String,
        /// Comma separated player names.
        #[arg(short, long, value_delimiter = ',')]
        players: Vec<String>,
        /// Number of auto-named players when no names are given.
        #[arg(short, long, default_value_t = 4)]
        count: usize,
        #[arg(short, long, default_value_t = ScoringMode::Standard)]
        mode: ScoringMode,
    },
    Switch {
        id: String,
    },
    RenameSession {
        id: String,
        name: String,
    },
    DeleteSession {
        id: String,
    },
    Show {
        #[arg(long, default_value_t = false)]
        chart: bool,
    },
    /// Record a standard round, e.g. `add 3,-1,-1,-1`.
    Add {
        #[arg(allow_hyphen_values = true)]
        scores: String,
    },
    /// Record a settled mahjong round.
    Mj(OutcomeArgs),
    /// Show what a mahjong round would settle to.
    Preview(OutcomeArgs),
    /// Record a mahjong round with hand-entered scores.
    Manual {
        #[arg(allow_hyphen_values = true)]
        scores: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Replace a round. Standard sessions need --scores.
    Edit {
        id: u64,
        #[arg(long, allow_hyphen_values = true)]
        scores: Option<String>,
        #[arg(long, default_value_t = false)]
        manual: bool,
        #[arg(long, default_value = "")]
        note: String,
        #[command(flatten)]
        outcome: OutcomeArgs,
    },
    Delete {
        id: u64,
    },
    /// Copy the previous round's content into this round.
    Dup {
        id: u64,
    },
    AddPlayer,
    RemovePlayer {
        index: usize,
    },
    RenamePlayer {
        index: usize,
        name: String,
    },
    Mode {
        mode: ScoringMode,
    },
    /// Rounds after which the session is exported; 0 or `none` clears it.
    Target {
        value: String,
    },
    /// Set win/concealed/exposed points. Missing values keep their current setting.
    Rules {
        win: Option<String>,
        concealed: Option<String>,
        exposed: Option<String>,
        /// Change the defaults shared by every session.
        #[arg(long, default_value_t = false)]
        global: bool,
        /// Drop this session's override.
        #[arg(long, default_value_t = false)]
        clear: bool,
    },
    Undo,
    Redo,
    Summary(SummaryArgs),
    Export {
        path: String,
        #[arg(short, long, default_value_t = false)]
        all: bool,
    },
    Import {
        path: String,
    },
    /// Remove every session and start over.
    Clear,
    #[command(alias = "exit")]
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

/// Splits a line on whitespace, keeping double-quoted text together.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;
    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    tokens.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        tokens.push(current);
    }
    tokens
}

struct Shell<'a, I> {
    app: &'a mut AppController,
    export_dir: PathBuf,
    lines: I,
}

impl<I> Shell<'_, I>
where
    I: Iterator<Item = io::Result<String>>,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        let _ = io::stdout().flush();
        match self.lines.next() {
            Some(Ok(answer)) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }

    fn flush_auto_exports(&mut self) -> SkResult<()> {
        for export in self.app.take_auto_exports() {
            let path = self.export_dir.join(&export.file_name);
            write_file(&path, &export.contents)?;
            info!(
                "🎯 Target of {} rounds reached, exported {}",
                export.target,
                path.display()
            );
        }
        Ok(())
    }

    fn print_current(&self) -> SkResult<()> {
        reports::print_session(self.app.current()?);
        Ok(())
    }

    fn dispatch(&mut self, command: ShellCommand) -> SkResult<Flow> {
        match command {
            ShellCommand::Sessions => reports::print_sessions(self.app.state()),
            ShellCommand::New {
                name,
                players,
                count,
                mode,
            } => {
                let players = if players.is_empty() {
                    (0..count).map(default_player_name).collect()
                } else {
                    players
                };
                self.app.new_session(name, players, mode)?;
                self.print_current()?;
            }
            ShellCommand::Switch { id } => {
                self.app.switch_session(&id)?;
                self.print_current()?;
            }
            ShellCommand::RenameSession { id, name } => self.app.rename_session(&id, name)?,
            ShellCommand::DeleteSession { id } => {
                let prompt = self.app.state().session(&id).map(|s| {
                    format!("Delete session '{}' with {} rounds?", s.name, s.rounds.len())
                });
                let agreed = match &prompt {
                    Some(p) if self.app.state().sessions.len() > 1 => self.confirm(p),
                    _ => false,
                };
                if !self.app.delete_session(&id, |_| agreed)? {
                    warn!("Kept session '{}'", id);
                }
            }
            ShellCommand::Show { chart } => {
                let session = self.app.current()?;
                reports::print_session(session);
                if chart {
                    reports::print_chart(&chart_series(session));
                }
            }
            ShellCommand::Add { scores } => {
                self.app.submit_round(RoundEntry::Scores(parse_int_list(&scores)))?;
                self.print_current()?;
            }
            ShellCommand::Mj(args) => {
                self.app.submit_round(RoundEntry::Settled(args.to_outcome()))?;
                self.print_current()?;
            }
            ShellCommand::Preview(args) => {
                let details = self.app.preview(&args.to_outcome())?;
                reports::print_settlement(&self.app.current()?.players, &details);
            }
            ShellCommand::Manual { scores, note } => {
                self.app.submit_round(manual_entry(parse_int_list(&scores), note))?;
                self.print_current()?;
            }
            ShellCommand::Edit {
                id,
                scores,
                manual,
                note,
                outcome,
            } => {
                let scores = scores.as_deref().map(parse_int_list);
                let entry = match (self.app.current()?.scoring_mode, scores) {
                    (ScoringMode::Standard, Some(scores)) => RoundEntry::Scores(scores),
                    (ScoringMode::Mahjong, Some(scores)) if manual => {
                        let mut outcome = outcome.to_outcome();
                        outcome.special_note = note;
                        RoundEntry::Manual { outcome, scores }
                    }
                    (ScoringMode::Mahjong, None) if !manual => {
                        RoundEntry::Settled(outcome.to_outcome())
                    }
                    (ScoringMode::Mahjong, Some(_)) => {
                        warn!("--scores in a mahjong session needs --manual");
                        return Ok(Flow::Continue);
                    }
                    _ => {
                        warn!("edit needs --scores here");
                        return Ok(Flow::Continue);
                    }
                };
                self.app.edit_round(id, entry)?;
                self.print_current()?;
            }
            ShellCommand::Delete { id } => {
                self.app.delete_round(id)?;
                self.print_current()?;
            }
            ShellCommand::Dup { id } => {
                self.app.duplicate_previous_round(id)?;
                self.print_current()?;
            }
            ShellCommand::AddPlayer => {
                self.app.add_player()?;
                self.print_current()?;
            }
            ShellCommand::RemovePlayer { index } => {
                let name = self.app.remove_player(index)?;
                info!("Removed player '{}'", name);
                self.print_current()?;
            }
            ShellCommand::RenamePlayer { index, name } => self.app.rename_player(index, name)?,
            ShellCommand::Mode { mode } => self.app.set_scoring_mode(mode)?,
            ShellCommand::Target { value } => {
                let target = usize::try_from(coerce_int(&value)).ok().filter(|&t| t > 0);
                self.app.set_target_round_count(target)?;
            }
            ShellCommand::Rules {
                win,
                concealed,
                exposed,
                global,
                clear,
            } => {
                if clear {
                    self.app.set_session_rules(None)?;
                    return Ok(Flow::Continue);
                }
                let base = if global {
                    self.app.state().rule_config
                } else {
                    self.app.current()?.effective_rules(&self.app.state().rule_config)
                };
                let rules = RuleConfig::from_inputs(
                    &win.unwrap_or_else(|| base.win_points_per_loser.to_string()),
                    &concealed.unwrap_or_else(|| base.concealed_set_points_per_loser.to_string()),
                    &exposed.unwrap_or_else(|| base.exposed_set_points.to_string()),
                );
                if global {
                    self.app.set_global_rules(rules)?;
                } else {
                    self.app.set_session_rules(Some(rules))?;
                }
                info!("⚖️  Rules: {:?}", rules);
            }
            ShellCommand::Undo => {
                if self.app.undo()? {
                    self.print_current()?;
                } else {
                    warn!("Nothing to undo");
                }
            }
            ShellCommand::Redo => {
                if self.app.redo()? {
                    self.print_current()?;
                } else {
                    warn!("Nothing to redo");
                }
            }
            ShellCommand::Summary(args) => {
                let rows = self.app.summary(&args.filter());
                reports::print_summary(&rows);
            }
            ShellCommand::Export { path, all } => {
                let contents = if all {
                    self.app.export_all_csv()?
                } else {
                    self.app.export_current_csv()?
                };
                write_file(Path::new(&path), &contents)?;
                info!("💾 Exported to {}", path);
            }
            ShellCommand::Import { path } => {
                let text = fs::read_to_string(&path)?;
                let ids = self.app.import_csv(&text)?;
                info!("✅ Imported {} session(s)", ids.len());
                self.print_current()?;
            }
            ShellCommand::Clear => {
                let agreed = self.confirm("Delete ALL sessions and history?");
                if !self.app.clear_all(|| agreed)? {
                    warn!("Nothing cleared");
                }
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn run(&mut self) -> SkResult<()> {
        self.print_current()?;
        loop {
            print!("> ");
            let _ = io::stdout().flush();
            let Some(line) = self.lines.next() else {
                return Ok(());
            };
            let tokens = tokenize(&line?);
            if tokens.is_empty() {
                continue;
            }
            let parsed = match ShellLine::try_parse_from(tokens) {
                Ok(parsed) => parsed,
                Err(e) => {
                    let _ = e.print();
                    continue;
                }
            };
            match self.dispatch(parsed.command) {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(e) => error!("❌ {}", e),
            }
            if let Err(e) = self.flush_auto_exports() {
                error!("❌ Auto-export failed: {}", e);
            }
        }
    }
}

pub fn run(app: &mut AppController, config: &AppConfig) -> SkResult<()> {
    let stdin = io::stdin();
    let mut shell = Shell {
        app,
        export_dir: PathBuf::from(&config.export_dir),
        lines: stdin.lock().lines(),
    };
    shell.run()
}
