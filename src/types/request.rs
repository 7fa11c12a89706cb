//! Request bodies sent to the Responses API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::tools::schema::FunctionToolDeclaration;

/// Input of a run: a single user message or a list of structured input items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunInput {
    Text(String),
    Items(Vec<Value>),
}

impl From<&str> for RunInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RunInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Value>> for RunInput {
    fn from(items: Vec<Value>) -> Self {
        Self::Items(items)
    }
}

/// Reasoning effort level for reasoning models.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

/// How much reasoning summary the model should emit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReasoningSummary {
    Auto,
    Concise,
    Detailed,
}

/// `reasoning` request options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reasoning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<ReasoningEffort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReasoningSummary>,
}

/// The `function_call_output` item that answers a pending function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallOutput {
    #[serde(rename = "type")]
    pub kind: String,
    pub call_id: String,
    /// JSON-encoded tool result.
    pub output: String,
}

impl FunctionCallOutput {
    pub fn new(call_id: impl Into<String>, result: &Value) -> Self {
        Self {
            kind: "function_call_output".to_string(),
            call_id: call_id.into(),
            output: result.to_string(),
        }
    }
}

/// Body of a `POST /responses` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: RunInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FunctionToolDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Reasoning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    pub store: bool,
    pub stream: bool,
}

impl ResponsesRequest {
    /// A request for `model` with persistence on and streaming enabled.
    pub fn new(model: impl Into<String>, input: RunInput) -> Self {
        Self {
            model: model.into(),
            input,
            instructions: None,
            tools: Vec::new(),
            reasoning: None,
            previous_response_id: None,
            conversation: None,
            store: true,
            stream: true,
        }
    }

    /// The `function_call_output` items carried by this request.
    pub fn function_call_outputs(&self) -> Vec<FunctionCallOutput> {
        match &self.input {
            RunInput::Items(items) => items
                .iter()
                .filter(|item| {
                    item.get("type").and_then(Value::as_str) == Some("function_call_output")
                })
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            RunInput::Text(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_fields_are_omitted() {
        let request = ResponsesRequest::new("o3", RunInput::from("hi"));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({"model": "o3", "input": "hi", "store": true, "stream": true})
        );
    }

    #[test]
    fn function_call_output_encodes_result_as_string() {
        let output = FunctionCallOutput::new("call_1", &json!({"sum": 5}));
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["type"], "function_call_output");
        assert_eq!(value["call_id"], "call_1");
        assert_eq!(value["output"], r#"{"sum":5}"#);
    }

    #[test]
    fn reasoning_serializes_lowercase() {
        let reasoning = Reasoning {
            effort: None,
            summary: Some(ReasoningSummary::Detailed),
        };
        assert_eq!(serde_json::to_value(&reasoning).unwrap(), json!({"summary": "detailed"}));
    }
}
