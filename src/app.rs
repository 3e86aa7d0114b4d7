//! The top-level controller. It owns the application state and every side
//! table keyed by session id (history, auto-export), and is the only place
//! where a new state is installed.

use crate::aggregate::{AggregateCache, PlayerSummary, SessionFilter};
use crate::autoexport::{AutoExport, AutoExportTracker};
use crate::config::RuleConfig;
use crate::error::{ScoreKeepError, SkResult};
use crate::history::HistoryManager;
use crate::persist::Storage;
use crate::session::round::{MahjongOutcome, RoundEntry, ScoringMode};
use crate::session::Session;
use crate::settlement::{self, SettlementDetails, SettlementInput};
use crate::state::AppState;
use crate::tabular;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub struct AppController {
    state: AppState,
    version: u64,
    history: HistoryManager,
    exports: AutoExportTracker,
    pending_exports: Vec<AutoExport>,
    cache: AggregateCache,
    storage: Storage,
}

impl AppController {
    pub fn new(state: AppState, storage: Storage) -> Self {
        Self {
            state,
            version: 0,
            history: HistoryManager::default(),
            exports: AutoExportTracker::default(),
            pending_exports: Vec::new(),
            cache: AggregateCache::default(),
            storage,
        }
    }

    /// Loads the persisted snapshot once and wraps it in a controller.
    pub fn open(storage: Storage) -> SkResult<Self> {
        let state = storage.load()?;
        info!(
            "📂 Loaded {} session(s), current '{}'",
            state.sessions.len(),
            state.current_session_id
        );
        Ok(Self::new(state, storage))
    }

    pub fn in_memory() -> Self {
        Self::new(AppState::fresh(), Storage::in_memory())
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history = HistoryManager::with_depth(depth);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn current(&self) -> SkResult<&Session> {
        self.state
            .current()
            .ok_or_else(|| ScoreKeepError::UnknownSession(self.state.current_session_id.clone()))
    }

    fn current_id(&self) -> String {
        self.state.current_session_id.clone()
    }

    // --- state installation -------------------------------------------------

    /// Swaps in `next` and writes it out. No history is recorded.
    fn install(&mut self, next: AppState) -> SkResult<()> {
        self.state = next;
        self.version += 1;
        self.storage.save(&self.state)
    }

    /// Swaps in `next`, recording the previous state in the current session's history.
    fn commit(&mut self, next: AppState) -> SkResult<()> {
        let key = self.current_id();
        let previous = std::mem::replace(&mut self.state, next);
        let rounds_before = previous.session(&key).map_or(0, |s| s.rounds.len());
        self.history.record(&key, previous);
        self.version += 1;
        self.storage.save(&self.state)?;
        self.after_change(&key, rounds_before)
    }

    fn after_change(&mut self, session_id: &str, rounds_before: usize) -> SkResult<()> {
        let Some(session) = self.state.session(session_id) else {
            return Ok(());
        };
        let unbalanced = session.unbalanced_round_ids();
        if !unbalanced.is_empty() {
            warn!(
                "⚠️  Session '{}' has rounds that do not sum to zero: {:?}",
                session.name, unbalanced
            );
        }
        if let Some(export) = self.exports.check(session, rounds_before)? {
            self.pending_exports.push(export);
        }
        Ok(())
    }

    fn mutate_current<T, F>(&mut self, f: F) -> SkResult<T>
    where
        F: FnOnce(&mut Session, &RuleConfig) -> SkResult<T>,
    {
        let mut out = None;
        let next = self.state.with_current(|session, global| {
            out = Some(f(session, global)?);
            Ok(())
        })?;
        self.commit(next)?;
        out.ok_or_else(|| ScoreKeepError::Validation("mutation produced no result".into()))
    }

    // --- sessions -------------------------------------------------------------

    /// Creates a session and makes it current. Creation is not an undoable edit.
    pub fn new_session(
        &mut self,
        name: impl Into<String>,
        players: Vec<String>,
        mode: ScoringMode,
    ) -> SkResult<String> {
        let id = self.state.unused_session_id();
        let session = Session::new(id.clone(), name, players, mode)?;
        info!("🆕 New session '{}' ({})", session.name, id);

        let mut next = self.state.clone();
        next.sessions.push(session);
        next.current_session_id = id.clone();
        self.install(next)?;
        Ok(id)
    }

    /// Changes the active session. History stacks are left alone.
    pub fn switch_session(&mut self, id: &str) -> SkResult<()> {
        if !self.state.contains(id) {
            return Err(ScoreKeepError::UnknownSession(id.to_string()));
        }
        let mut next = self.state.clone();
        next.current_session_id = id.to_string();
        self.install(next)
    }

    pub fn rename_session(&mut self, id: &str, name: impl Into<String>) -> SkResult<()> {
        let name = name.into();
        let next = self.state.with_session(id, |s, _| {
            s.name = name;
            Ok(())
        })?;
        self.history.discard(id);
        self.install(next)
    }

    /// Deletes a session after `confirm` agrees. The last session cannot be deleted.
    /// Returns `Ok(false)` when confirmation is declined.
    pub fn delete_session<C>(&mut self, id: &str, confirm: C) -> SkResult<bool>
    where
        C: FnOnce(&Session) -> bool,
    {
        let session = self
            .state
            .session(id)
            .ok_or_else(|| ScoreKeepError::UnknownSession(id.to_string()))?;
        if self.state.sessions.len() <= 1 {
            return Err(ScoreKeepError::Rejected(
                "cannot delete the last remaining session".into(),
            ));
        }
        if !confirm(session) {
            return Ok(false);
        }

        let mut next = self.state.clone();
        let pos = next
            .sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ScoreKeepError::UnknownSession(id.to_string()))?;
        let removed = next.sessions.remove(pos);
        if next.current_session_id == id {
            let fallback = pos.min(next.sessions.len() - 1);
            next.current_session_id = next.sessions[fallback].id.clone();
        }

        self.history.discard(id);
        self.exports.forget(id);
        info!("🗑️  Deleted session '{}'", removed.name);
        self.install(next)?;
        Ok(true)
    }

    /// Resets to a single fresh session after `confirm` agrees.
    pub fn clear_all<C>(&mut self, confirm: C) -> SkResult<bool>
    where
        C: FnOnce() -> bool,
    {
        if !confirm() {
            return Ok(false);
        }
        self.history.clear();
        self.exports.clear();
        self.pending_exports.clear();
        info!("🧹 Cleared all data");
        self.install(AppState::fresh())?;
        Ok(true)
    }

    // --- rounds ---------------------------------------------------------------

    pub fn submit_round(&mut self, entry: RoundEntry) -> SkResult<u64> {
        self.mutate_current(|s, global| {
            let rules = s.effective_rules(global);
            s.append_round(entry, &rules)
        })
    }

    pub fn edit_round(&mut self, id: u64, entry: RoundEntry) -> SkResult<()> {
        self.mutate_current(|s, global| {
            let rules = s.effective_rules(global);
            s.replace_round(id, entry, &rules)
        })
    }

    pub fn delete_round(&mut self, id: u64) -> SkResult<()> {
        self.mutate_current(|s, _| s.delete_round(id).map(|_| ()))
    }

    pub fn duplicate_previous_round(&mut self, id: u64) -> SkResult<()> {
        self.mutate_current(|s, _| s.duplicate_previous_round(id))
    }

    /// Settlement of `outcome` against the current session, without storing anything.
    pub fn preview(&self, outcome: &MahjongOutcome) -> SkResult<SettlementDetails> {
        let session = self.current()?;
        let rules = session.effective_rules(&self.state.rule_config);
        let input = SettlementInput::from_outcome(outcome, session.player_count());
        Ok(settlement::settle_details(&input, &rules))
    }

    // --- players and settings ---------------------------------------------------

    pub fn add_player(&mut self) -> SkResult<usize> {
        self.mutate_current(|s, _| s.add_player())
    }

    pub fn remove_player(&mut self, index: usize) -> SkResult<String> {
        self.mutate_current(|s, _| s.remove_player(index))
    }

    pub fn rename_player(&mut self, index: usize, name: impl Into<String>) -> SkResult<()> {
        let name = name.into();
        self.mutate_current(|s, _| s.rename_player(index, name))
    }

    pub fn set_scoring_mode(&mut self, mode: ScoringMode) -> SkResult<()> {
        self.mutate_current(|s, _| {
            s.set_scoring_mode(mode);
            Ok(())
        })
    }

    pub fn set_target_round_count(&mut self, target: Option<usize>) -> SkResult<()> {
        self.mutate_current(|s, _| {
            s.set_target_round_count(target);
            Ok(())
        })
    }

    pub fn set_session_rules(&mut self, rules: Option<RuleConfig>) -> SkResult<()> {
        self.mutate_current(|s, _| {
            s.set_rule_override(rules);
            Ok(())
        })
    }

    pub fn set_global_rules(&mut self, rules: RuleConfig) -> SkResult<()> {
        let mut next = self.state.clone();
        next.rule_config = rules;
        self.commit(next)
    }

    // --- history ----------------------------------------------------------------

    /// Steps the current session's history back. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> SkResult<bool> {
        let key = self.current_id();
        match self.history.undo(&key, &self.state) {
            Some(previous) => {
                debug!("Undo in session {}", key);
                self.install(previous)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> SkResult<bool> {
        let key = self.current_id();
        match self.history.redo(&key, &self.state) {
            Some(next) => {
                debug!("Redo in session {}", key);
                self.install(next)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- import / export ----------------------------------------------------------

    pub fn export_current_csv(&self) -> SkResult<String> {
        tabular::export_session(self.current()?, Utc::now())
    }

    pub fn export_all_csv(&self) -> SkResult<String> {
        tabular::export_sessions(&self.state.sessions, Utc::now())
    }

    /// Imports every session in `text` and switches to the first one.
    /// Either all sessions are added or none are.
    pub fn import_csv(&mut self, text: &str) -> SkResult<Vec<String>> {
        let imported = tabular::import(text)?;

        let mut next = self.state.clone();
        let mut taken: HashSet<String> = next.sessions.iter().map(|s| s.id.clone()).collect();
        let mut ids = Vec::with_capacity(imported.len());
        for mut session in imported {
            while taken.contains(&session.id) {
                session.id = crate::util::new_session_id();
            }
            taken.insert(session.id.clone());
            ids.push(session.id.clone());
            next.sessions.push(session);
        }
        if let Some(first) = ids.first() {
            next.current_session_id = first.clone();
        }

        info!("📥 Imported {} session(s)", ids.len());
        self.install(next)?;
        Ok(ids)
    }

    /// Drains exports queued by sessions reaching their target.
    pub fn take_auto_exports(&mut self) -> Vec<AutoExport> {
        std::mem::take(&mut self.pending_exports)
    }

    // --- aggregates ---------------------------------------------------------------

    pub fn summary(&mut self, filter: &SessionFilter) -> Vec<PlayerSummary> {
        self.cache
            .get_or_compute(self.version, &self.state.sessions, filter)
    }
}
