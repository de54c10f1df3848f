use chrono::{DateTime, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// Integer value of a JSON number, truncating any fraction
fn number_to_i64<E: Error>(n: &Number) -> Result<i64, E> {
    if let Some(value) = n.as_i64() {
        return Ok(value);
    }
    let value = n.as_f64().ok_or_else(|| E::custom("invalid number"))?;
    if !value.is_finite() || value < i64::MIN as f64 || value > i64::MAX as f64 {
        return Err(E::custom("number out of range"));
    }
    Ok(value.trunc() as i64)
}

/// Convert a JSON value into epoch milliseconds
///
/// Accepts integers, fractional numbers (browser visit times are doubles; the
/// fraction is truncated) and RFC3339 strings.
fn value_to_millis<E: Error>(value: Value) -> Result<i64, E> {
    match value {
        Value::Number(n) => number_to_i64(&n),
        Value::String(s) => s
            .parse::<DateTime<Utc>>()
            .map(|dt| dt.timestamp_millis())
            .map_err(|e| E::custom(format!("invalid RFC3339 timestamp: {}", e))),
        _ => Err(E::custom("timestamp must be a number or string")),
    }
}

/// Custom deserializer for millisecond timestamps
pub fn deserialize_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_millis(value)
}

/// Like [`deserialize_millis`], mapping `null` to `None`
pub fn deserialize_optional_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => value_to_millis(value).map(Some),
    }
}

/// Optional whole number (a day count, say); `30.5` reads as `30`, `null` as `None`
pub fn deserialize_optional_truncated<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => number_to_i64(&n).map(Some),
        _ => Err(Error::custom("expected a number")),
    }
}

/// Custom deserializer for strings that must not be empty (domains, URLs)
pub fn deserialize_non_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;

    if s.trim().is_empty() {
        return Err(Error::custom("value cannot be empty"));
    }

    Ok(s)
}
