use crate::consts::{HISTORY_FUTURE_LIMIT, HISTORY_PAST_LIMIT};
use crate::state::AppState;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Undo/redo stacks for one session. Entries are whole-application snapshots.
#[derive(Debug, Clone, Default)]
pub struct HistoryBucket {
    pub past: VecDeque<AppState>,
    pub future: VecDeque<AppState>,
}

/// Per-session bounded undo/redo over full `AppState` snapshots.
///
/// A new edit does not clear `future`; redo stays available until undo and
/// redo shuffle the stacks.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    buckets: HashMap<String, HistoryBucket>,
    past_limit: usize,
    future_limit: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(HISTORY_PAST_LIMIT, HISTORY_FUTURE_LIMIT)
    }
}

impl HistoryManager {
    pub fn new(past_limit: usize, future_limit: usize) -> Self {
        Self {
            buckets: HashMap::new(),
            past_limit: past_limit.max(1),
            future_limit: future_limit.max(1),
        }
    }

    /// Limits derived from a single undo depth; redo holds one more step.
    pub fn with_depth(depth: usize) -> Self {
        Self::new(depth, depth + 1)
    }

    fn push_past(bucket: &mut HistoryBucket, state: AppState, limit: usize) {
        bucket.past.push_back(state);
        while bucket.past.len() > limit {
            bucket.past.pop_front();
        }
    }

    /// Stores the pre-mutation state for `session_id`.
    pub fn record(&mut self, session_id: &str, previous: AppState) {
        let limit = self.past_limit;
        let bucket = self.buckets.entry(session_id.to_string()).or_default();
        Self::push_past(bucket, previous, limit);
        debug!(
            "history[{}]: past={} future={}",
            session_id,
            bucket.past.len(),
            bucket.future.len()
        );
    }

    pub fn undo(&mut self, session_id: &str, current: &AppState) -> Option<AppState> {
        let limit = self.future_limit;
        let bucket = self.buckets.get_mut(session_id)?;
        let restored = bucket.past.pop_back()?;
        bucket.future.push_front(current.clone());
        bucket.future.truncate(limit);
        debug!(
            "undo[{}]: past={} future={}",
            session_id,
            bucket.past.len(),
            bucket.future.len()
        );
        Some(restored)
    }

    pub fn redo(&mut self, session_id: &str, current: &AppState) -> Option<AppState> {
        let limit = self.past_limit;
        let bucket = self.buckets.get_mut(session_id)?;
        let restored = bucket.future.pop_front()?;
        Self::push_past(bucket, current.clone(), limit);
        debug!(
            "redo[{}]: past={} future={}",
            session_id,
            bucket.past.len(),
            bucket.future.len()
        );
        Some(restored)
    }

    pub fn can_undo(&self, session_id: &str) -> bool {
        self.buckets
            .get(session_id)
            .is_some_and(|b| !b.past.is_empty())
    }

    pub fn can_redo(&self, session_id: &str) -> bool {
        self.buckets
            .get(session_id)
            .is_some_and(|b| !b.future.is_empty())
    }

    /// `(past, future)` stack depths.
    pub fn depths(&self, session_id: &str) -> (usize, usize) {
        self.buckets
            .get(session_id)
            .map_or((0, 0), |b| (b.past.len(), b.future.len()))
    }

    pub fn discard(&mut self, session_id: &str) {
        if self.buckets.remove(session_id).is_some() {
            debug!("history[{}]: discarded", session_id);
        }
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_named(name: &str) -> AppState {
        let mut s = AppState::fresh();
        s.sessions[0].name = name.to_string();
        s
    }

    #[test]
    fn past_is_capped() {
        let mut h = HistoryManager::default();
        for i in 0..60 {
            h.record("a", state_named(&i.to_string()));
        }
        let (past, future) = h.depths("a");
        assert_eq!(past, HISTORY_PAST_LIMIT);
        assert_eq!(future, 0);
    }

    #[test]
    fn undo_on_empty_is_none() {
        let mut h = HistoryManager::default();
        assert!(h.undo("a", &AppState::fresh()).is_none());
        assert!(h.redo("a", &AppState::fresh()).is_none());
    }

    #[test]
    fn undo_then_redo_restores() {
        let mut h = HistoryManager::default();
        let first = state_named("first");
        let second = state_named("second");
        h.record("a", first.clone());

        let undone = h.undo("a", &second).unwrap();
        assert_eq!(undone, first);
        assert!(h.can_redo("a"));

        let redone = h.redo("a", &undone).unwrap();
        assert_eq!(redone, second);
        assert!(h.can_undo("a"));
        assert!(!h.can_redo("a"));
    }

    #[test]
    fn buckets_are_independent() {
        let mut h = HistoryManager::default();
        h.record("a", state_named("x"));
        assert!(!h.can_undo("b"));
        h.discard("a");
        assert!(!h.can_undo("a"));
    }
}
