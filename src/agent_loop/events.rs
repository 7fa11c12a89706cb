//! Run event envelope.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::types::RawResponseEvent;

/// Envelope type of every event a run yields.
pub const RAW_RESPONSE_EVENT: &str = "raw_response_event";
/// Synthetic event carrying a dispatched tool's result.
pub const TOOL_RESULT_EVENT: &str = "function.tool_result";
/// Synthetic sentinel emitted once the producer is finished.
pub const CLOSED_EVENT: &str = "response.closed";
/// Remote terminal event.
pub const COMPLETED_EVENT: &str = "response.completed";

/// Payload of a [`RunEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    /// A remote event, forwarded verbatim.
    Response(RawResponseEvent),
    /// Result of a locally dispatched tool.
    ToolResult { name: String, result: Value },
    /// The run's producer has finished.
    Closed,
}

impl EventData {
    /// The `type` discriminator consumers branch on.
    pub fn event_type(&self) -> &str {
        match self {
            Self::Response(raw) => raw.event_type(),
            Self::ToolResult { .. } => TOOL_RESULT_EVENT,
            Self::Closed => CLOSED_EVENT,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Response(raw) => raw.raw().clone(),
            Self::ToolResult { name, result } => json!({
                "type": TOOL_RESULT_EVENT,
                "name": name,
                "result": result,
            }),
            Self::Closed => json!({ "type": CLOSED_EVENT }),
        }
    }
}

impl Serialize for EventData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Response(raw) => raw.serialize(serializer),
            other => other.to_json().serialize(serializer),
        }
    }
}

/// One event of a run's unified stream: `{type, data}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunEvent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: EventData,
}

impl RunEvent {
    pub fn response(raw: RawResponseEvent) -> Self {
        Self {
            kind: RAW_RESPONSE_EVENT,
            data: EventData::Response(raw),
        }
    }

    pub fn tool_result(name: impl Into<String>, result: Value) -> Self {
        Self {
            kind: RAW_RESPONSE_EVENT,
            data: EventData::ToolResult {
                name: name.into(),
                result,
            },
        }
    }

    pub fn closed() -> Self {
        Self {
            kind: RAW_RESPONSE_EVENT,
            data: EventData::Closed,
        }
    }

    pub fn event_type(&self) -> &str {
        self.data.event_type()
    }

    /// Whether consumers should stop iterating after this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self.event_type(), COMPLETED_EVENT | CLOSED_EVENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_type_and_data() {
        let event = RunEvent::tool_result("add", json!(5));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "raw_response_event",
                "data": {"type": "function.tool_result", "name": "add", "result": 5}
            })
        );
    }

    #[test]
    fn completed_and_closed_are_terminal() {
        let completed = RunEvent::response(RawResponseEvent::from_value(json!({
            "type": "response.completed",
            "response": {"id": "resp_1"}
        })));
        assert!(completed.is_terminal());
        assert!(RunEvent::closed().is_terminal());
        assert!(!RunEvent::tool_result("x", Value::Null).is_terminal());
    }

    #[test]
    fn forwarded_event_keeps_remote_shape() {
        let raw = json!({"type": "response.output_text.delta", "delta": "Hi", "item_id": "msg_1"});
        let event = RunEvent::response(RawResponseEvent::from_value(raw.clone()));
        assert_eq!(event.event_type(), "response.output_text.delta");
        assert_eq!(serde_json::to_value(&event).unwrap()["data"], raw);
    }
}
