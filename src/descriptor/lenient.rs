//! Forgiving field decoders for hand-edited descriptors and host payloads.
//!
//! A field that doesn't decode falls back to its default instead of
//! failing the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Decode a field, logging and defaulting when its value has the wrong shape
pub(crate) fn field<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(or_default(&value))
}

/// Decode `value` as `T`, defaulting on `null` or a shape mismatch
pub(crate) fn or_default<T>(value: &Value) -> T
where
    T: DeserializeOwned + Default,
{
    if value.is_null() {
        return T::default();
    }
    T::deserialize(value).unwrap_or_else(|e| {
        warn!("Ignoring invalid value {}: {}", value, e);
        T::default()
    })
}

/// Delays in milliseconds. Fractions truncate, negatives and non-numbers count as 0.
pub(crate) fn delays<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Value::deserialize(deserializer)? {
        Value::Array(values) => values,
        Value::Null => return Ok(Vec::new()),
        other => {
            warn!("Ignoring delays that are not a list: {}", other);
            return Ok(Vec::new());
        }
    };

    Ok(values.iter().map(delay_ms).collect())
}

fn delay_ms(value: &Value) -> u64 {
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|ms| ms as u64))
        .unwrap_or(0)
}

/// Any JSON scalar as text; `null` and containers become empty
pub(crate) fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}
