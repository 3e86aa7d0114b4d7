pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 8;

/// Sessions beyond this count are dropped when a persisted record is loaded.
pub const MAX_SESSIONS: usize = 50;

pub const HISTORY_PAST_LIMIT: usize = 49;
pub const HISTORY_FUTURE_LIMIT: usize = 50;

/// Buy-multiplier and follow-the-dealer only exist in four-player games.
pub const FOUR_PLAYERS: usize = 4;
pub const BUY_MULTIPLIER_MAX: i64 = 4;

/// Rule point values are clamped to `±MAX_RULE_POINTS` before settling.
pub const MAX_RULE_POINTS: i64 = 1_000_000;
/// Coerced and imported scores stay within `±MAX_ABS_SCORE` so totals cannot overflow.
pub const MAX_ABS_SCORE: i64 = 1_000_000_000_000;

pub const FOLLOW_ALL_PAYMENT: i64 = 1;
pub const FOLLOW_SINGLE_PAYMENT: i64 = 3;

pub const CSV_VERSION: &str = "2";
pub const CUMULATIVE_SUFFIX: &str = "累计总分";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DEFAULT_STATE_PATH: &str = "data/scorekeep.json";
pub const DEFAULT_EXPORT_DIR: &str = "exports";
