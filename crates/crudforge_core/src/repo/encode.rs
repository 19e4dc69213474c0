//! Column encoding helpers shared by entity row mappings.

use crate::repo::base_repo::{RepoError, RepoResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;

/// RFC 3339, UTC, microsecond precision.
pub fn encode_dt(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn encode_dt_opt(value: Option<DateTime<Utc>>) -> Value {
    match value {
        Some(value) => Value::Text(encode_dt(value)),
        None => Value::Null,
    }
}

pub fn decode_dt(column: &str, value: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| {
            RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}: {err}"))
        })
}

pub fn decode_dt_opt(column: &str, value: Option<String>) -> RepoResult<Option<DateTime<Utc>>> {
    value.map(|value| decode_dt(column, &value)).transpose()
}

pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub fn text_opt(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text)
}

pub fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

pub fn real_opt(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

/// `LIKE` pattern matching `needle` anywhere, with `%`/`_` escaped by `\`.
pub fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::{contains_pattern, decode_dt, encode_dt};
    use chrono::{TimeZone, Utc};

    #[test]
    fn timestamps_round_trip_at_microsecond_precision() {
        let value = Utc.with_ymd_and_hms(2026, 2, 13, 10, 0, 0).unwrap()
            + chrono::Duration::microseconds(123_456);
        let encoded = encode_dt(value);
        assert_eq!(encoded, "2026-02-13T10:00:00.123456Z");
        assert_eq!(decode_dt("t.c", &encoded).unwrap(), value);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_dt("todos.created_at", "yesterday").is_err());
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
