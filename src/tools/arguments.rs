//! Parsed tool-call arguments.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ToolError;

/// Arguments of one tool call, always a JSON object.
///
/// Declared parameters are typed as strings in the schema, so numeric and boolean
/// getters also accept their string spellings (`"2"`, `"true"`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    map: Map<String, Value>,
}

impl ToolArguments {
    /// Wrap a JSON value. Anything other than an object becomes an empty map.
    pub fn new(value: Value) -> Self {
        match value {
            Value::Object(map) => Self { map },
            _ => Self::default(),
        }
    }

    /// Parse the accumulated argument text of a call; invalid JSON yields an empty map.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Self::new(value),
            Err(err) => {
                tracing::debug!(error = %err, "tool arguments are not valid JSON, using empty map");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.map.clone())
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ToolError> {
        self.get_str_opt(key)
            .ok_or_else(|| ToolError::InvalidArguments(format!("missing string argument '{key}'")))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.map.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, ToolError> {
        self.get_i64_opt(key)
            .ok_or_else(|| ToolError::InvalidArguments(format!("missing integer argument '{key}'")))
    }

    pub fn get_i64_opt(&self, key: &str) -> Option<i64> {
        match self.map.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, ToolError> {
        match self.map.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing number argument '{key}'")))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ToolError> {
        match self.map.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing boolean argument '{key}'")))
    }

    /// Deserialize the whole argument map into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(self.to_value())
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))
    }
}

impl From<Map<String, Value>> for ToolArguments {
    fn from(map: Map<String, Value>) -> Self {
        Self { map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_accepts_object_text() {
        let args = ToolArguments::parse(r#"{"a":"2","b":"3"}"#);
        assert_eq!(args.len(), 2);
        assert_eq!(args.get_i64("a").unwrap(), 2);
        assert_eq!(args.get_str("b").unwrap(), "3");
    }

    #[test]
    fn parse_failure_is_empty_map() {
        assert!(ToolArguments::parse("{\"a\": ").is_empty());
        assert!(ToolArguments::parse("").is_empty());
        assert!(ToolArguments::parse("[1, 2]").is_empty());
    }

    #[test]
    fn bool_accepts_string_spelling() {
        let args = ToolArguments::new(json!({"flag": "TRUE", "other": false}));
        assert!(args.get_bool("flag").unwrap());
        assert!(!args.get_bool("other").unwrap());
        assert!(args.get_bool("missing").is_err());
    }
}
