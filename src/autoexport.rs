use crate::error::SkResult;
use crate::session::Session;
use crate::tabular;
use chrono::Utc;
use std::collections::HashMap;
use tracing::info;

/// A single-session export produced because a session reached its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoExport {
    pub session_id: String,
    pub target: usize,
    pub file_name: String,
    pub contents: String,
}

/// Remembers, per session, which target value has already been exported.
#[derive(Debug, Clone, Default)]
pub struct AutoExportTracker {
    exported: HashMap<String, usize>,
}

impl AutoExportTracker {
    /// Returns an export when the change that took `session` from
    /// `rounds_before` rounds to its current count reached a target that has
    /// not fired yet. Each target value fires at most once, and moving the
    /// target below the current count does not count as reaching it.
    pub fn check(
        &mut self,
        session: &Session,
        rounds_before: usize,
    ) -> SkResult<Option<AutoExport>> {
        let Some(target) = session.target_round_count else {
            return Ok(None);
        };
        let reached = rounds_before < target && session.rounds.len() >= target;
        if !reached || self.exported.get(&session.id) == Some(&target) {
            return Ok(None);
        }

        let now = Utc::now();
        let contents = tabular::export_session(session, now)?;
        self.exported.insert(session.id.clone(), target);
        info!(
            "📤 Session '{}' reached {} rounds, exporting",
            session.name, target
        );
        Ok(Some(AutoExport {
            session_id: session.id.clone(),
            target,
            file_name: tabular::export_file_name(session, now),
            contents,
        }))
    }

    pub fn forget(&mut self, session_id: &str) {
        self.exported.remove(session_id);
    }

    pub fn clear(&mut self) {
        self.exported.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;
    use crate::session::round::{RoundEntry, ScoringMode};

    #[test]
    fn fires_once_per_target() {
        let mut tracker = AutoExportTracker::default();
        let mut s = Session::with_default_players("s", "Game", 2, ScoringMode::Standard).unwrap();
        s.set_target_round_count(Some(2));
        let rules = RuleConfig::default();

        s.append_round(RoundEntry::Scores(vec![1, -1]), &rules).unwrap();
        assert!(tracker.check(&s, 0).unwrap().is_none());

        s.append_round(RoundEntry::Scores(vec![1, -1]), &rules).unwrap();
        let export = tracker.check(&s, 1).unwrap().unwrap();
        assert_eq!(export.target, 2);
        assert!(export.file_name.ends_with(".csv"));

        s.append_round(RoundEntry::Scores(vec![1, -1]), &rules).unwrap();
        assert!(tracker.check(&s, 2).unwrap().is_none());

        s.set_target_round_count(Some(4));
        assert!(tracker.check(&s, 3).unwrap().is_none());
        s.append_round(RoundEntry::Scores(vec![1, -1]), &rules).unwrap();
        assert!(tracker.check(&s, 3).unwrap().is_some());
    }

    #[test]
    fn lowering_target_does_not_fire() {
        let mut tracker = AutoExportTracker::default();
        let mut s = Session::with_default_players("s", "Game", 2, ScoringMode::Standard).unwrap();
        let rules = RuleConfig::default();
        for _ in 0..3 {
            s.append_round(RoundEntry::Scores(vec![1, -1]), &rules).unwrap();
        }
        s.set_target_round_count(Some(2));
        assert!(tracker.check(&s, 3).unwrap().is_none());
    }
}
