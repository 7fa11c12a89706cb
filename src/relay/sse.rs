//! SSE frames relayed to HTTP clients.

use serde::Serialize;
use serde_json::{json, Value};

use super::summary::synthesize_tool_result_text;
use crate::agent_loop::{EventData, RunEvent, RAW_RESPONSE_EVENT};
use crate::error::RunError;

/// Event name of the final frame of a chat stream.
pub const DONE_EVENT: &str = "done";
/// Data `type` of the friendly line emitted next to each tool result.
pub const SYNTHESIZED_MESSAGE: &str = "synthesized.message";
pub const TASK_CREATED_EVENT: &str = "task.created";
pub const TASK_UPDATED_EVENT: &str = "task.updated";
/// Event name of the frame sent when a run fails before completing.
pub const ERROR_EVENT: &str = "error";

/// One `event:`/`data:` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayFrame {
    pub event: String,
    pub data: Value,
}

impl RelayFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn done() -> Self {
        Self::new(DONE_EVENT, json!({}))
    }
}

/// Summary line for a tool-result event, if it is one.
pub fn synthesized_message(event: &RunEvent) -> Option<Value> {
    match &event.data {
        EventData::ToolResult { name, result } => Some(json!({
            "type": SYNTHESIZED_MESSAGE,
            "text": synthesize_tool_result_text(name, result),
        })),
        _ => None,
    }
}

/// Frames for one run event on the chat endpoint: a synthesized summary first for tool
/// results, then the event itself.
pub fn chat_frames(event: &RunEvent) -> Vec<RelayFrame> {
    let mut frames = Vec::with_capacity(2);
    if let Some(message) = synthesized_message(event) {
        frames.push(RelayFrame::new(RAW_RESPONSE_EVENT, message));
    }
    frames.push(RelayFrame::new(event.kind, event.data.to_json()));
    frames
}

/// Frames for one run event on the task feed: the event, then a synthesized summary for
/// tool results.
pub fn task_frames(task_id: &str, event: &RunEvent) -> Vec<RelayFrame> {
    let mut frames = vec![RelayFrame::new(
        TASK_UPDATED_EVENT,
        json!({ "task_id": task_id, "event": event.data.to_json() }),
    )];
    if let Some(message) = synthesized_message(event) {
        frames.push(RelayFrame::new(
            TASK_UPDATED_EVENT,
            json!({ "task_id": task_id, "event": message }),
        ));
    }
    frames
}

pub fn task_created_frame(task_id: &str) -> RelayFrame {
    RelayFrame::new(TASK_CREATED_EVENT, json!({ "task": { "id": task_id } }))
}

pub fn task_status_frame(task_id: &str, status: &str) -> RelayFrame {
    RelayFrame::new(
        TASK_UPDATED_EVENT,
        json!({ "task_id": task_id, "status": status }),
    )
}

pub fn error_frame(err: &RunError) -> RelayFrame {
    RelayFrame::new(
        ERROR_EVENT,
        json!({ "category": err.category().to_string(), "message": err.to_string() }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_frame_has_empty_object() {
        let frame = RelayFrame::done();
        assert_eq!(frame.event, "done");
        assert_eq!(frame.data, json!({}));
    }

    #[test]
    fn tool_result_gets_summary_before_event_on_chat() {
        let event = RunEvent::tool_result(
            "get_weather",
            json!({"city": "Oslo", "temperature": "3 °C", "condition": "Snow"}),
        );
        let frames = chat_frames(&event);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data["type"], "synthesized.message");
        assert_eq!(frames[0].data["text"], "Weather in Oslo: 3 °C, Snow.");
        assert_eq!(frames[1].data["type"], "function.tool_result");
    }

    #[test]
    fn task_frames_wrap_events_with_task_id() {
        let frames = task_frames("t1", &RunEvent::tool_result("ping", json!("pong")));
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event, "task.updated");
        assert_eq!(frames[0].data["task_id"], "t1");
        assert_eq!(frames[1].data["event"]["type"], "synthesized.message");
        assert_eq!(task_frames("t1", &RunEvent::closed()).len(), 1);
    }

    #[test]
    fn error_frame_carries_category() {
        let frame = error_frame(&RunError::api(500, "boom"));
        assert_eq!(frame.event, "error");
        assert_eq!(frame.data["category"], "server");
        assert!(frame.data["message"].as_str().unwrap().contains("boom"));
    }
}
