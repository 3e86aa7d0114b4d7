use crate::config::RuleConfig;
use crate::error::{ScoreKeepError, SkResult};
use crate::session::Session;
use crate::util::new_session_id;
use serde::{Deserialize, Serialize};

/// The whole application state. Snapshots of this are what history stores,
/// so it is only ever replaced, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub sessions: Vec<Session>,
    pub current_session_id: String,
    #[serde(default)]
    pub rule_config: RuleConfig,
}

impl AppState {
    /// A state holding one empty four-player session.
    pub fn fresh() -> Self {
        let session = Session::starter(new_session_id(), "Session 1");
        Self {
            current_session_id: session.id.clone(),
            sessions: vec![session],
            rule_config: RuleConfig::default(),
        }
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn current(&self) -> Option<&Session> {
        self.session(&self.current_session_id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.session(id).is_some()
    }

    /// A session id not yet used in this state.
    pub fn unused_session_id(&self) -> String {
        loop {
            let id = new_session_id();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Returns a copy of this state with session `id` changed by `f`.
    pub fn with_session<F>(&self, id: &str, f: F) -> SkResult<AppState>
    where
        F: FnOnce(&mut Session, &RuleConfig) -> SkResult<()>,
    {
        let mut next = self.clone();
        let rules = next.rule_config;
        let session = next
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ScoreKeepError::UnknownSession(id.to_string()))?;
        f(session, &rules)?;
        Ok(next)
    }

    /// Returns a copy of this state with the current session changed by `f`.
    pub fn with_current<F>(&self, f: F) -> SkResult<AppState>
    where
        F: FnOnce(&mut Session, &RuleConfig) -> SkResult<()>,
    {
        let id = self.current_session_id.clone();
        self.with_session(&id, f)
    }

    /// Points `current_session_id` at an existing session, falling back to the first.
    pub(crate) fn repair_current(&mut self) {
        if !self.contains(&self.current_session_id) {
            if let Some(first) = self.sessions.first() {
                self.current_session_id = first.id.clone();
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::round::RoundEntry;

    #[test]
    fn with_current_leaves_original_untouched() {
        let state = AppState::fresh();
        let next = state
            .with_current(|s, rules| s.append_round(RoundEntry::Scores(vec![1, -1]), rules).map(|_| ()))
            .unwrap();
        assert!(state.current().unwrap().rounds.is_empty());
        assert_eq!(next.current().unwrap().rounds.len(), 1);
    }

    #[test]
    fn unknown_session_is_an_error() {
        let state = AppState::fresh();
        let err = state.with_session("missing", |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, ScoreKeepError::UnknownSession(_)));
    }

    #[test]
    fn failed_update_produces_no_state() {
        let state = AppState::fresh();
        let res = state.with_current(|s, _| s.remove_player(9).map(|_| ()));
        assert!(res.is_err());
        assert_eq!(state.current().unwrap().player_count(), 4);
    }
}
