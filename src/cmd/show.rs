use crate::reports;
use clap::Args;
use scorekeep::aggregate::{chart_series, SessionFilter};
use scorekeep::app::AppController;
use scorekeep::error::{ScoreKeepError, SkResult};

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Session id; defaults to the current session.
    #[arg(short, long)]
    pub session: Option<String>,

    /// Also print cumulative totals after each round.
    #[arg(long, default_value_t = false)]
    pub chart: bool,

    /// List every session instead.
    #[arg(short, long, default_value_t = false)]
    pub list: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    /// Restrict to these session ids. Repeat for several.
    #[arg(short, long = "session")]
    pub sessions: Vec<String>,
}

impl SummaryArgs {
    pub fn filter(&self) -> SessionFilter {
        if self.sessions.is_empty() {
            None
        } else {
            Some(self.sessions.iter().cloned().collect())
        }
    }
}

pub fn run(app: &AppController, args: &ShowArgs) -> SkResult<()> {
    if args.list {
        reports::print_sessions(app.state());
        return Ok(());
    }
    let session = match &args.session {
        Some(id) => app
            .state()
            .session(id)
            .ok_or_else(|| ScoreKeepError::UnknownSession(id.clone()))?,
        None => app.current()?,
    };
    reports::print_session(session);
    if args.chart {
        reports::print_chart(&chart_series(session));
    }
    Ok(())
}

pub fn summary(app: &mut AppController, args: &SummaryArgs) -> SkResult<()> {
    let rows = app.summary(&args.filter());
    reports::print_summary(&rows);
    Ok(())
}
