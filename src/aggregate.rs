//! Cross-session roll-ups and chart series.

use crate::session::{stats, Session};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub name: String,
    pub total: i64,
    pub wins: usize,
    pub concealed: usize,
    pub exposed_charged: usize,
    pub rounds_played: usize,
    pub sessions: usize,
}

/// Which sessions a summary covers. `None` means every session.
pub type SessionFilter = Option<BTreeSet<String>>;

fn selected<'a>(
    sessions: &'a [Session],
    filter: &'a SessionFilter,
) -> impl Iterator<Item = &'a Session> + 'a {
    sessions
        .iter()
        .filter(move |s| filter.as_ref().map_or(true, |ids| ids.contains(&s.id)))
}

/// Rolls players up by name across the selected sessions, highest total first.
pub fn summarize(sessions: &[Session], filter: &SessionFilter) -> Vec<PlayerSummary> {
    let mut by_name: HashMap<String, PlayerSummary> = HashMap::new();

    for session in selected(sessions, filter) {
        let totals = stats::running_totals(session);
        let wins = stats::win_counts(session);
        let sets = stats::set_counts(session);

        for (i, name) in session.players.iter().enumerate() {
            let entry = by_name
                .entry(name.clone())
                .or_insert_with(|| PlayerSummary {
                    name: name.clone(),
                    ..Default::default()
                });
            entry.total += totals[i];
            entry.wins += wins[i];
            entry.concealed += sets[i].concealed;
            entry.exposed_charged += sets[i].exposed;
            entry.rounds_played += session.rounds.len();
            entry.sessions += 1;
        }
    }

    let mut out: Vec<PlayerSummary> = by_name.into_values().collect();
    out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    out
}

/// One cumulative line per player, starting at 0 before the first round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub player: String,
    pub points: Vec<i64>,
}

pub fn chart_series(session: &Session) -> Vec<ChartSeries> {
    let cumulative = stats::cumulative_totals(session);
    session
        .players
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut points = Vec::with_capacity(cumulative.len() + 1);
            points.push(0);
            points.extend(cumulative.iter().map(|row| row[i]));
            ChartSeries {
                player: name.clone(),
                points,
            }
        })
        .collect()
}

/// Memoizes [`summarize`] for one state version. Any version change drops
/// every cached entry.
#[derive(Debug, Default)]
pub struct AggregateCache {
    version: u64,
    entries: HashMap<Option<Vec<String>>, Vec<PlayerSummary>>,
}

impl AggregateCache {
    pub fn get_or_compute(
        &mut self,
        version: u64,
        sessions: &[Session],
        filter: &SessionFilter,
    ) -> Vec<PlayerSummary> {
        if version != self.version {
            self.entries.clear();
            self.version = version;
        }
        let key = filter.as_ref().map(|ids| ids.iter().cloned().collect());
        self.entries
            .entry(key)
            .or_insert_with(|| summarize(sessions, filter))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
