//! Normalized raw step content
//!
//! Structured results sometimes arrive as already-parsed objects and
//! sometimes as JSON serialized into a string. `RawContent` normalizes both
//! representations at the Step Executor boundary so the classifier and
//! everything downstream never branch on representation.

use serde_json::Value;

/// An arbitrary structured payload in normalized form
#[derive(Debug, Clone, PartialEq)]
pub struct RawContent(Value);

impl RawContent {
    /// Normalize a value, unwrapping one level of JSON-in-string
    ///
    /// A string that parses to a JSON object or array is replaced by the
    /// parsed value; any other value is kept as-is.
    pub fn from_value(value: Value) -> Self {
        match &value {
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(parsed @ (Value::Object(_) | Value::Array(_))) => Self(parsed),
                _ => Self(value),
            },
            _ => Self(value),
        }
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Narrow to the entry under `key` when the payload is an object
    /// containing it; otherwise the payload itself is the result
    pub fn scoped(self, key: &str) -> Self {
        match self.0 {
            Value::Object(mut map) if map.contains_key(key) => {
                // contains_key checked above
                let inner = map.remove(key).unwrap_or(Value::Null);
                Self::from_value(inner)
            }
            other => Self(other),
        }
    }
}
