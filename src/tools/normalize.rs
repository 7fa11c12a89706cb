//! Conversion of arbitrary tool results into JSON.

use std::fmt::Debug;

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Convert a tool result into a JSON value.
///
/// Tries a direct JSON encoding first, then a YAML data model (which accepts
/// non-string map keys, stringified on the way back), and finally falls back to
/// the value's `Debug` rendering. Never fails.
pub fn to_jsonable<T: Serialize + Debug + ?Sized>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(json) => return json,
        Err(err) => tracing::debug!(error = %err, "direct JSON encoding failed"),
    }
    match serde_yaml::to_value(value) {
        Ok(yaml) => return yaml_to_json(yaml),
        Err(err) => tracing::debug!(error = %err, "YAML encoding failed, using Debug text"),
    }
    Value::String(format!("{value:?}"))
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;
    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => yaml_number(&n),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, val) in mapping {
                map.insert(key_to_string(key), yaml_to_json(val));
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let mut map = Map::new();
            map.insert(
                tag.trim_start_matches('!').to_string(),
                yaml_to_json(tagged.value),
            );
            Value::Object(map)
        }
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string()))
    }
}

fn key_to_string(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;
    match key {
        Yaml::String(s) => s,
        Yaml::Null => "null".to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        other => yaml_to_json(other).to_string(),
    }
}
