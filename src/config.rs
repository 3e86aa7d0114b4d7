use crate::consts::{
    DEFAULT_EXPORT_DIR, DEFAULT_STATE_PATH, HISTORY_PAST_LIMIT, MAX_ABS_SCORE, MAX_RULE_POINTS,
};
use crate::error::{ScoreKeepError, SkResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// Point values used by mahjong-mode settlement.
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleConfig {
    /// Points each loser pays the winner.
    #[arg(long, default_value_t = 1)]
    #[serde(deserialize_with = "lenient_points")]
    pub win_points_per_loser: i64,

    /// Points each other player pays for a concealed set.
    #[arg(long, default_value_t = 2)]
    #[serde(deserialize_with = "lenient_points")]
    pub concealed_set_points_per_loser: i64,

    /// Points the charged player pays for an exposed set.
    #[arg(long, default_value_t = 3)]
    #[serde(deserialize_with = "lenient_points")]
    pub exposed_set_points: i64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            win_points_per_loser: 1,
            concealed_set_points_per_loser: 2,
            exposed_set_points: 3,
        }
    }
}

impl RuleConfig {
    /// Builds rules from raw text fields. Unparseable fields become 0.
    pub fn from_inputs(win: &str, concealed: &str, exposed: &str) -> Self {
        Self {
            win_points_per_loser: coerce_int(win),
            concealed_set_points_per_loser: coerce_int(concealed),
            exposed_set_points: coerce_int(exposed),
        }
        .clamped()
    }

    /// Every value limited to `±MAX_RULE_POINTS`.
    pub fn clamped(self) -> Self {
        let clamp = |v: i64| v.clamp(-MAX_RULE_POINTS, MAX_RULE_POINTS);
        Self {
            win_points_per_loser: clamp(self.win_points_per_loser),
            concealed_set_points_per_loser: clamp(self.concealed_set_points_per_loser),
            exposed_set_points: clamp(self.exposed_set_points),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SkResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ScoreKeepError::Config(format!("Could not read rules '{}': {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn merge_from_cli(&mut self, cli_rules: &RuleConfig, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$field = cli_rules.$field;
                }
            };
        }

        update_if_present!(win_points_per_loser, "win_points_per_loser");
        update_if_present!(
            concealed_set_points_per_loser,
            "concealed_set_points_per_loser"
        );
        update_if_present!(exposed_set_points, "exposed_set_points");
    }
}

/// Process-level settings for the CLI.
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Persisted state file.
    #[arg(global = true, long, default_value = DEFAULT_STATE_PATH)]
    pub state: String,

    /// Directory that receives automatic target exports.
    #[arg(global = true, long, default_value = DEFAULT_EXPORT_DIR)]
    pub export_dir: String,

    /// Undo depth per session.
    #[arg(global = true, long, default_value_t = HISTORY_PAST_LIMIT)]
    pub history_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state: DEFAULT_STATE_PATH.to_string(),
            export_dir: DEFAULT_EXPORT_DIR.to_string(),
            history_limit: HISTORY_PAST_LIMIT,
        }
    }
}

pub(crate) fn clamp_score(v: i64) -> i64 {
    v.clamp(-MAX_ABS_SCORE, MAX_ABS_SCORE)
}

/// Interactive-input coercion: anything that is not a finite number becomes 0.
/// Decimals are truncated toward zero and magnitudes are capped at `MAX_ABS_SCORE`.
pub fn coerce_int(raw: &str) -> i64 {
    let s = raw.trim();
    if let Ok(v) = s.parse::<i64>() {
        return clamp_score(v);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => clamp_score(f.trunc() as i64),
        _ => 0,
    }
}

/// Same as [`coerce_int`] but for optional indices: empty or invalid input is `None`.
pub fn coerce_index(raw: &str) -> Option<usize> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<usize>().ok()
}

/// Parses a comma separated list of integers, coercing each field.
pub fn parse_int_list(raw: &str) -> Vec<i64> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(coerce_int).collect()
}

fn coerce_json(value: &serde_json::Value) -> i64 {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                clamp_score(i)
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() => clamp_score(f.trunc() as i64),
                    _ => 0,
                }
            }
        }
        serde_json::Value::String(s) => coerce_int(s),
        serde_json::Value::Bool(b) => *b as i64,
        _ => 0,
    }
}

pub(crate) fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_json(&value))
}

fn lenient_points<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_int(deserializer).map(|v| v.clamp(-MAX_RULE_POINTS, MAX_RULE_POINTS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_handles_transient_input() {
        assert_eq!(coerce_int("3"), 3);
        assert_eq!(coerce_int(" -2 "), -2);
        assert_eq!(coerce_int("2.9"), 2);
        assert_eq!(coerce_int(""), 0);
        assert_eq!(coerce_int("abc"), 0);
        assert_eq!(coerce_int("NaN"), 0);
        assert_eq!(coerce_int("inf"), 0);
        assert_eq!(coerce_int(&"9".repeat(25)), MAX_ABS_SCORE);
        assert_eq!(coerce_int("-1e30"), -MAX_ABS_SCORE);
    }

    #[test]
    fn huge_rule_text_is_clamped() {
        let rules = RuleConfig::from_inputs(&"9".repeat(25), "-99999999", "7");
        assert_eq!(rules.win_points_per_loser, MAX_RULE_POINTS);
        assert_eq!(rules.concealed_set_points_per_loser, -MAX_RULE_POINTS);
        assert_eq!(rules.exposed_set_points, 7);
    }

    #[test]
    fn lenient_rules_from_json() {
        let rules: RuleConfig = serde_json::from_str(
            r#"{"winPointsPerLoser": "4", "concealedSetPointsPerLoser": null, "exposedSetPoints": 2.5}"#,
        )
        .unwrap();
        assert_eq!(rules.win_points_per_loser, 4);
        assert_eq!(rules.concealed_set_points_per_loser, 0);
        assert_eq!(rules.exposed_set_points, 2);
    }

    #[test]
    fn stored_rules_are_clamped() {
        let rules: RuleConfig =
            serde_json::from_str(r#"{"winPointsPerLoser": 9223372036854775807}"#).unwrap();
        assert_eq!(rules.win_points_per_loser, MAX_RULE_POINTS);
    }

    #[test]
    fn missing_rule_fields_use_defaults() {
        let rules: RuleConfig = serde_json::from_str(r#"{"winPointsPerLoser": 5}"#).unwrap();
        assert_eq!(rules.win_points_per_loser, 5);
        assert_eq!(rules.concealed_set_points_per_loser, 2);
        assert_eq!(rules.exposed_set_points, 3);
    }

    #[test]
    fn index_coercion() {
        assert_eq!(coerce_index("2"), Some(2));
        assert_eq!(coerce_index(""), None);
        assert_eq!(coerce_index("-1"), None);
        assert_eq!(coerce_index("x"), None);
    }
}
