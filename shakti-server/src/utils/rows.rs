use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shakti_core::ShaktiError;

/// Typed view of a stored row.
pub fn from_row<T: DeserializeOwned>(row: Value) -> anyhow::Result<T> {
    serde_json::from_value(row).map_err(|e| {
        ShaktiError::general_error("Stored record has an unexpected shape")
            .with_source(e.into())
            .into_anyhow()
    })
}

pub fn from_rows<T: DeserializeOwned>(rows: Vec<Value>) -> anyhow::Result<Vec<T>> {
    rows.into_iter().map(from_row).collect()
}

pub fn to_value<T: Serialize>(v: &T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(v)?)
}

pub fn to_values<T: Serialize>(items: &[T]) -> anyhow::Result<Vec<Value>> {
    items.iter().map(to_value).collect()
}

/// Trimmed, non-empty string field of a JSON object.
pub fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// The string form of a scalar cell, as read from a spreadsheet.
pub fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn not_found(what: &str, id: &str) -> anyhow::Error {
    ShaktiError::not_found(format!("{what} not found: {id}")).into_anyhow()
}
