//! JSON utility functions

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

use crate::core::constants::MAX_INDEXED_ARRAY_LEN;

// ============================================================================
// SERDE HELPERS
// ============================================================================

/// Deserialize a field that may be `null`, mapping `null` to `T::default()`.
///
/// Use together with `#[serde(default)]` so that a missing key behaves the same.
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a nullable list whose elements may themselves be `null`.
///
/// `null` elements are dropped.
pub fn deserialize_nullable_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items.into_iter().flatten().collect())
}

// ============================================================================
// PARSE WITH FALLBACK
// ============================================================================

/// Outcome of parsing an attribute string as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonAttempt {
    Parsed(JsonValue),
    /// Not valid JSON; the original text is kept as-is.
    Raw(String),
}

impl JsonAttempt {
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<JsonValue>(text) {
            Ok(value) => Self::Parsed(value),
            Err(e) => {
                tracing::debug!(error = %e, "Attribute is not valid JSON, keeping raw string");
                Self::Raw(text.to_string())
            }
        }
    }

    pub fn into_value(self) -> JsonValue {
        match self {
            Self::Parsed(value) => value,
            Self::Raw(text) => JsonValue::String(text),
        }
    }
}

/// Parse a JSON-string attribute value. Non-string values pass through.
///
/// Used for map-shaped sources (metadata, model parameters, usage) where
/// the attribute is expected to carry serialized JSON.
pub fn parse_json_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) => JsonAttempt::parse(s).into_value(),
        other => other.clone(),
    }
}

/// Parse only strings that look like a JSON object or array.
///
/// Used for free-form input/output payloads so that plain text such as
/// `"42"` or `"true"` stays a string.
pub fn structured_or_raw(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) => {
            let trimmed = s.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                JsonAttempt::parse(s).into_value()
            } else {
                value.clone()
            }
        }
        other => other.clone(),
    }
}

// ============================================================================
// MERGE / UNFLATTEN
// ============================================================================

/// Merge `value` into `slot`: key-by-key when both are objects, otherwise replace.
pub fn merge_json(slot: &mut Option<JsonValue>, value: JsonValue) {
    match (slot.as_mut(), value) {
        (Some(JsonValue::Object(existing)), JsonValue::Object(incoming)) => {
            for (key, v) in incoming {
                existing.insert(key, v);
            }
        }
        (_, value) => *slot = Some(value),
    }
}

/// Write `value` at a dotted path, creating intermediate containers.
///
/// Numeric segments create arrays (dense, holes filled with `null`) unless
/// the current container is already an object or the index is implausibly
/// large, in which case the segment is used as an object key.
pub fn set_path(target: &mut JsonValue, path: &[&str], value: JsonValue) {
    let Some((head, rest)) = path.split_first() else {
        *target = value;
        return;
    };

    if let Some(index) = array_index(head, target) {
        if !target.is_array() {
            *target = JsonValue::Array(Vec::new());
        }
        if let JsonValue::Array(items) = target {
            if items.len() <= index {
                items.resize(index + 1, JsonValue::Null);
            }
            set_path(&mut items[index], rest, value);
        }
        return;
    }

    if !target.is_object() {
        *target = JsonValue::Object(Map::new());
    }
    if let JsonValue::Object(map) = target {
        let child = map.entry(head.to_string()).or_insert(JsonValue::Null);
        set_path(child, rest, value);
    }
}

fn array_index(segment: &str, target: &JsonValue) -> Option<usize> {
    if target.is_object() {
        return None;
    }
    segment
        .parse::<usize>()
        .ok()
        .filter(|index| *index < MAX_INDEXED_ARRAY_LEN)
}

// ============================================================================
// COERCION
// ============================================================================

/// Render a scalar as a string. Containers are serialized, `null` is `None`.
pub fn value_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        other => serde_json::to_string(other).ok(),
    }
}

/// `true` for a native `true` or the exact string `"true"`.
pub fn value_is_true_literal(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::String(s) => s == "true",
        _ => false,
    }
}

/// Coerce to a JSON number, accepting numeric strings such as `"15"`.
pub fn value_as_number(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Number(_) => Some(value.clone()),
        JsonValue::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Some(JsonValue::from(i))
            } else {
                s.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
            }
        }
        _ => None,
    }
}
