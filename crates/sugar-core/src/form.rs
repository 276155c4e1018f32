//! Flattening of structured payloads into form fields and query parameters.
//!
//! The SugarCRM server parses form bodies and query strings the way PHP does,
//! so nested values use bracket notation: `{"a": {"b": 1}}` becomes `a[b]=1`
//! and `{"ids": ["x", "y"]}` becomes `ids[0]=x&ids[1]=y`. Booleans are sent as
//! `1`/`0` and nulls are left out.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, InvalidInputError};

/// Flatten a serializable map into `(name, value)` pairs.
///
/// `None`/`null` yields no pairs.
///
/// # Errors
///
/// Returns [`InvalidInputError::Payload`] if the value does not serialize to
/// a map.
///
/// # Example
///
/// ```
/// use serde_json::json;
///
/// let pairs = sugar_core::form::to_pairs(&json!({"name": "Acme", "tags": ["a", "b"]})).unwrap();
/// assert_eq!(pairs, vec![
///     ("name".to_string(), "Acme".to_string()),
///     ("tags[0]".to_string(), "a".to_string()),
///     ("tags[1]".to_string(), "b".to_string()),
/// ]);
/// ```
pub fn to_pairs<T: Serialize + ?Sized>(value: &T) -> Result<Vec<(String, String)>, Error> {
    let value = serde_json::to_value(value).map_err(|e| InvalidInputError::Payload {
        reason: e.to_string(),
    })?;

    let mut pairs = Vec::new();
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, value) in &map {
                flatten(key, value, &mut pairs);
            }
        }
        other => {
            return Err(InvalidInputError::Payload {
                reason: format!("expected a map of fields, got {}", kind_of(&other)),
            }
            .into());
        }
    }
    Ok(pairs)
}

fn flatten(key: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((key.to_string(), if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((key.to_string(), n.to_string())),
        Value::String(s) => out.push((key.to_string(), s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(&format!("{}[{}]", key, index), item, out);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten(&format!("{}[{}]", key, sub), item, out);
            }
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
