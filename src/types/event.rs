//! Remote Responses API stream events.
//!
//! Recognized event types are decoded into [`ResponseEvent`]; anything else lands in
//! [`ResponseEvent::Other`]. The raw JSON is always kept next to the typed view so events
//! can be forwarded to consumers exactly as the remote side sent them.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Typed view of a Responses API stream event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseEvent {
    #[serde(rename = "response.created")]
    Created { response: ResponseObject },
    #[serde(rename = "response.in_progress")]
    InProgress { response: ResponseObject },
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded {
        #[serde(default)]
        output_index: Option<u32>,
        item: OutputItem,
    },
    #[serde(rename = "response.output_item.done")]
    OutputItemDone {
        #[serde(default)]
        output_index: Option<u32>,
        item: OutputItem,
    },
    #[serde(rename = "response.function_call_arguments.delta")]
    FunctionCallArgumentsDelta {
        #[serde(default)]
        item_id: Option<String>,
        #[serde(default)]
        delta: String,
    },
    #[serde(rename = "response.function_call_arguments.done")]
    FunctionCallArgumentsDone {
        #[serde(default)]
        item_id: Option<String>,
        #[serde(default)]
        arguments: Option<String>,
    },
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        #[serde(default)]
        item_id: Option<String>,
        #[serde(default)]
        delta: String,
    },
    #[serde(rename = "response.output_text.done")]
    OutputTextDone {
        #[serde(default)]
        item_id: Option<String>,
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "response.completed")]
    Completed { response: ResponseObject },
    /// Unrecognized (or malformed) event; only the type string is kept.
    #[serde(skip)]
    Other { event_type: String },
}

impl ResponseEvent {
    /// The response object carried by lifecycle events, if any.
    pub fn response(&self) -> Option<&ResponseObject> {
        match self {
            Self::Created { response }
            | Self::InProgress { response }
            | Self::Completed { response } => Some(response),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// The `response` object embedded in lifecycle events and returned by `retrieve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseObject {
    pub id: String,
    #[serde(default)]
    pub conversation: Option<ConversationRef>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<Vec<Value>>,
}

impl ResponseObject {
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation
            .as_ref()
            .map(|c| c.id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// Concatenated `output_text` parts of every message item in `output`.
    pub fn output_text(&self) -> String {
        let mut text = String::new();
        for item in self.output.iter().flatten() {
            if item.get("type").and_then(Value::as_str) != Some("message") {
                continue;
            }
            let Some(content) = item.get("content").and_then(Value::as_array) else {
                continue;
            };
            for part in content {
                if part.get("type").and_then(Value::as_str) == Some("output_text") {
                    if let Some(segment) = part.get("text").and_then(Value::as_str) {
                        text.push_str(segment);
                    }
                }
            }
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRef {
    pub id: String,
}

/// Output item announced by `response.output_item.added` / `.done`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum OutputItem {
    #[serde(rename = "function_call")]
    FunctionCall {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        call_id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        arguments: Option<String>,
    },
    #[serde(rename = "message")]
    Message {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        content: Option<Vec<Value>>,
    },
    #[serde(rename = "reasoning")]
    Reasoning {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        summary: Option<Vec<Value>>,
    },
    #[serde(other)]
    Other,
}

/// A remote event as received: typed view plus the verbatim JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponseEvent {
    event: ResponseEvent,
    raw: Value,
}

impl RawResponseEvent {
    /// Decode a JSON event. Never fails: unknown shapes become [`ResponseEvent::Other`].
    pub fn from_value(raw: Value) -> Self {
        let event_type = raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let event = match serde_json::from_value::<ResponseEvent>(raw.clone()) {
            Ok(event) => event,
            Err(err) => {
                if is_known_type(&event_type) {
                    tracing::debug!(event_type = %event_type, error = %err, "malformed response event");
                }
                ResponseEvent::Other { event_type }
            }
        };
        Self { event, raw }
    }

    /// Parse the `data:` payload of one SSE frame.
    pub fn parse(data: &str) -> Result<Self, serde_json::Error> {
        let raw: Value = serde_json::from_str(data)?;
        Ok(Self::from_value(raw))
    }

    pub fn event(&self) -> &ResponseEvent {
        &self.event
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The wire `type` discriminator, or `""` when absent.
    pub fn event_type(&self) -> &str {
        self.raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

impl Serialize for RawResponseEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

fn is_known_type(event_type: &str) -> bool {
    matches!(
        event_type,
        "response.created"
            | "response.in_progress"
            | "response.output_item.added"
            | "response.output_item.done"
            | "response.function_call_arguments.delta"
            | "response.function_call_arguments.done"
            | "response.output_text.delta"
            | "response.output_text.done"
            | "response.completed"
    )
}
