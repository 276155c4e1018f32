//! Boolean-compatible view of API results.
//!
//! Older callers treat any "falsy" outcome as a failure and never look at
//! the reason. [`ApiResult`] gives them that shape on top of the typed
//! `Result` every operation returns.

use serde_json::Value;

use crate::error::Error;

/// Either a decoded JSON value or the failure marker.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult {
    Value(Value),
    Failure,
}

impl ApiResult {
    /// Returns true for the failure marker.
    pub fn is_failure(&self) -> bool {
        matches!(self, ApiResult::Failure)
    }

    /// Returns the value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            ApiResult::Value(v) => Some(v),
            ApiResult::Failure => None,
        }
    }
}

/// Any error, and any value that is falsy (null, false, 0, "", "0", empty
/// array or object), becomes [`ApiResult::Failure`].
impl From<Result<Value, Error>> for ApiResult {
    fn from(result: Result<Value, Error>) -> Self {
        match result {
            Ok(value) if is_truthy(&value) => ApiResult::Value(value),
            _ => ApiResult::Failure,
        }
    }
}

/// Operations without a meaningful body report `true` on success.
impl From<Result<(), Error>> for ApiResult {
    fn from(result: Result<(), Error>) -> Self {
        match result {
            Ok(()) => ApiResult::Value(Value::Bool(true)),
            Err(_) => ApiResult::Failure,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
