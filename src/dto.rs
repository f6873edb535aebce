/// Field decoders shared by response DTOs
///
/// The backend stores several list fields as JSON-encoded strings
/// (`"[\"rust\",\"llm\"]"`) and some identifiers as either numbers or
/// strings. These run once while the entity is decoded so nothing
/// downstream has to guess.
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Decode an ordered string list from a JSON array, a JSON-encoded array
/// string, or null
///
/// Anything else decodes to an empty list with a warning.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_string_list(&value))
}

pub fn decode_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => collect_strings(items),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Array(items)) => collect_strings(&items),
                Ok(other) => {
                    warn!("Expected encoded string list, got {}", other);
                    Vec::new()
                }
                Err(e) => {
                    warn!("Failed to decode string list {:?}: {}", raw, e);
                    Vec::new()
                }
            }
        }
        other => {
            warn!("Unexpected string list value: {}", other);
            Vec::new()
        }
    }
}

fn collect_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// Accept a string, a number, or null
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub fn default_true() -> bool {
    true
}
