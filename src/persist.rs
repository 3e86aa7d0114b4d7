use crate::config::{clamp_score, coerce_int};
use crate::consts::{MAX_PLAYERS, MAX_SESSIONS, MIN_PLAYERS};
use crate::error::{ScoreKeepError, SkResult};
use crate::session::round::{Round, RoundKind, ScoringMode};
use crate::session::Session;
use crate::state::AppState;
use crate::util::{new_session_id, timestamp};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Single-session record written by early versions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    players: Vec<String>,
    #[serde(default)]
    rounds: Vec<LegacyRound>,
    #[serde(default)]
    next_round_id: Option<u64>,
    #[serde(default)]
    target_rounds: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LegacyRound {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    scores: Vec<serde_json::Value>,
    #[serde(with = "timestamp", default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

fn coerce_score(value: &serde_json::Value) -> i64 {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .map(clamp_score)
            .unwrap_or(0),
        serde_json::Value::String(s) => coerce_int(s),
        _ => 0,
    }
}

impl LegacyRecord {
    fn into_state(self) -> AppState {
        let mut next_id = 1;
        let rounds: Vec<Round> = self
            .rounds
            .into_iter()
            .map(|r| {
                let id = r.id.unwrap_or(next_id);
                next_id = next_id.max(id + 1);
                Round {
                    id,
                    scores: r.scores.iter().map(coerce_score).collect(),
                    timestamp: r.timestamp,
                    kind: RoundKind::Standard,
                }
            })
            .collect();

        let session = Session {
            id: new_session_id(),
            name: "Session 1".to_string(),
            players: self.players,
            rounds,
            next_round_id: self.next_round_id.unwrap_or(next_id).max(next_id),
            scoring_mode: ScoringMode::Standard,
            target_round_count: self.target_rounds.filter(|&t| t > 0),
            rule_config: None,
            created_at: Utc::now(),
        };

        AppState {
            current_session_id: session.id.clone(),
            sessions: vec![session],
            rule_config: Default::default(),
        }
    }
}

/// Parses a persisted record, accepting both the current and the legacy shape.
pub fn parse_state(text: &str) -> SkResult<AppState> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let state = if value.get("sessions").is_some() {
        let mut value = value;
        if let Some(obj) = value.as_object_mut() {
            obj.entry("currentSessionId")
                .or_insert_with(|| serde_json::Value::String(String::new()));
        }
        serde_json::from_value::<AppState>(value)?
    } else if value.get("players").is_some() {
        info!("Upgrading legacy single-session record");
        serde_json::from_value::<LegacyRecord>(value)?.into_state()
    } else {
        return Err(ScoreKeepError::Validation(
            "persisted record has neither 'sessions' nor 'players'".into(),
        ));
    };

    Ok(sanitize(state))
}

/// Caps the session count, drops sessions with an impossible roster and
/// repairs the current-session pointer.
fn sanitize(mut state: AppState) -> AppState {
    if state.sessions.len() > MAX_SESSIONS {
        warn!(
            "Dropping {} sessions beyond the limit of {}",
            state.sessions.len() - MAX_SESSIONS,
            MAX_SESSIONS
        );
        state.sessions.truncate(MAX_SESSIONS);
    }

    state.sessions.retain(|s| {
        let ok = (MIN_PLAYERS..=MAX_PLAYERS).contains(&s.player_count());
        if !ok {
            warn!(
                "Dropping session '{}' with {} players",
                s.name,
                s.player_count()
            );
        }
        ok
    });

    for session in &mut state.sessions {
        session.normalize();
    }

    if state.sessions.is_empty() {
        warn!("No usable sessions in persisted record, starting fresh");
        let rules = state.rule_config;
        state = AppState::fresh();
        state.rule_config = rules;
    }

    state.repair_current();
    state
}

pub fn to_json(state: &AppState) -> SkResult<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Where the application snapshot lives. `None` keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct Storage {
    path: Option<PathBuf>,
}

impl Storage {
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reads the snapshot. A missing file yields a fresh state.
    pub fn load(&self) -> SkResult<AppState> {
        let Some(path) = &self.path else {
            return Ok(AppState::fresh());
        };
        if !path.exists() {
            info!("No state at {}, starting fresh", path.display());
            return Ok(AppState::fresh());
        }
        let text = fs::read_to_string(path)?;
        parse_state(&text)
    }

    pub fn save(&self, state: &AppState) -> SkResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(to_json(state)?.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        debug!("Saved state to {}", path.display());
        Ok(())
    }
}
