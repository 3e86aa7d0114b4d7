#![allow(dead_code)]

use scorekeep::app::AppController;
use scorekeep::config::RuleConfig;
use scorekeep::session::round::{RoundEntry, ScoringMode};
use scorekeep::session::Session;

/// Builder for sessions to keep test setup short.
pub struct SessionBuilder {
    session: Session,
    rules: RuleConfig,
}

impl SessionBuilder {
    pub fn new(id: &str, players: &[&str]) -> Self {
        let session = Session::new(
            id,
            format!("Session {}", id),
            players.iter().map(|p| p.to_string()).collect(),
            ScoringMode::Standard,
        )
        .unwrap();
        Self {
            session,
            rules: RuleConfig::default(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.session.name = name.to_string();
        self
    }

    pub fn mahjong(mut self) -> Self {
        self.session.set_scoring_mode(ScoringMode::Mahjong);
        self
    }

    pub fn round(mut self, scores: &[i64]) -> Self {
        self.session
            .append_round(RoundEntry::Scores(scores.to_vec()), &self.rules)
            .unwrap();
        self
    }

    pub fn entry(mut self, entry: RoundEntry) -> Self {
        self.session.append_round(entry, &self.rules).unwrap();
        self
    }

    pub fn build(self) -> Session {
        self.session
    }
}

pub fn names(count: usize) -> Vec<String> {
    ["Ann", "Bo", "Cy", "Di", "Ed", "Flo", "Gus", "Hal"]
        .iter()
        .take(count)
        .map(|s| s.to_string())
        .collect()
}

/// Controller with a fresh four-player mahjong session as current.
pub fn mahjong_app() -> AppController {
    let mut app = AppController::in_memory();
    app.new_session("Table", names(4), ScoringMode::Mahjong)
        .unwrap();
    app
}

/// Cumulative sum of each column, one row per round.
pub fn prefix_sums(rows: &[Vec<i64>]) -> Vec<Vec<i64>> {
    let mut running = vec![0; rows.first().map_or(0, |r| r.len())];
    rows.iter()
        .map(|row| {
            for (acc, v) in running.iter_mut().zip(row) {
                *acc += v;
            }
            running.clone()
        })
        .collect()
}
