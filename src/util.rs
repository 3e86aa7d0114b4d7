use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::consts::TIMESTAMP_FORMAT;

/// Generates a session id that is unlikely to collide within one state file.
pub fn new_session_id() -> String {
    format!(
        "s{}{:04}",
        Utc::now().timestamp_millis(),
        fastrand::u16(..10_000)
    )
}

/// Renders a timestamp in the local zone for human-facing CSV columns.
pub fn local_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

/// Parses either an RFC 3339 string or a local `TIMESTAMP_FORMAT` string.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Serde adapter for timestamps that were written either as RFC 3339 strings
/// or as epoch milliseconds. Always serializes as RFC 3339.
pub mod timestamp {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) => super::parse_timestamp(&s)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", s))),
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .ok_or_else(|| de::Error::custom("timestamp out of range")),
            serde_json::Value::Null => Ok(Utc::now()),
            other => Err(de::Error::custom(format!(
                "unsupported timestamp value {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_format_parses_back() {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let rendered = local_timestamp(&ts);
        assert_eq!(parse_timestamp(&rendered), Some(ts));
    }

    #[test]
    fn rfc3339_is_accepted() {
        let ts = parse_timestamp("2024-03-01T12:00:00Z").unwrap();
        assert_eq!(ts.timestamp(), 1_709_294_400);
    }

    #[test]
    fn garbage_timestamp_is_none() {
        assert!(parse_timestamp("yesterday").is_none());
    }
}
