//! Shared test helpers and a scripted Responses transport.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use streamrun::error::RunError;
use streamrun::provider::{ResponseEventStream, ResponsesTransport};
use streamrun::types::{RawResponseEvent, ResponseObject, ResponsesRequest};

/// What one `open_stream` call produces.
pub enum Segment {
    /// The stream opens and yields these events, then ends.
    Events(Vec<Value>),
    /// The stream opens, yields these events, then fails mid-stream.
    FailAfter(Vec<Value>, String),
    /// The request is rejected before any event.
    Reject { status: u16, message: String },
}

impl Segment {
    pub fn reject(status: u16, message: &str) -> Self {
        Self::Reject {
            status,
            message: message.to_string(),
        }
    }
}

/// A transport that replays queued segments and records every request.
///
/// Once the script runs out, every further request is rejected with a 500. `create`
/// answers from a queue of reply bodies and `retrieve` from a map of stored responses.
pub struct ScriptedTransport {
    segments: Mutex<VecDeque<Segment>>,
    requests: Mutex<Vec<ResponsesRequest>>,
    replies: Mutex<VecDeque<Value>>,
    create_bodies: Mutex<Vec<Value>>,
    stored: HashMap<String, Value>,
}

impl ScriptedTransport {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments: Mutex::new(segments.into()),
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            create_bodies: Mutex::new(Vec::new()),
            stored: HashMap::new(),
        }
    }

    /// Queue response objects returned by successive `create` calls.
    pub fn with_replies(mut self, replies: Vec<Value>) -> Self {
        self.replies = Mutex::new(replies.into());
        self
    }

    /// Make a response object available to `retrieve`.
    pub fn with_stored(mut self, response: Value) -> Self {
        let id = response["id"].as_str().unwrap().to_string();
        self.stored.insert(id, response);
        self
    }

    /// Bodies sent through `create`, oldest first.
    pub fn create_bodies(&self) -> Vec<Value> {
        self.create_bodies.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<ResponsesRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests as the JSON bodies that would be sent.
    pub fn request_bodies(&self) -> Vec<Value> {
        self.requests()
            .iter()
            .map(|r| serde_json::to_value(r).unwrap())
            .collect()
    }
}

#[async_trait]
impl ResponsesTransport for ScriptedTransport {
    async fn open_stream(&self, request: &ResponsesRequest) -> Result<ResponseEventStream, RunError> {
        self.requests.lock().unwrap().push(request.clone());
        let segment = self.segments.lock().unwrap().pop_front();
        let (events, failure) = match segment {
            Some(Segment::Events(events)) => (events, None),
            Some(Segment::FailAfter(events, message)) => (events, Some(message)),
            Some(Segment::Reject { status, message }) => return Err(RunError::api(status, message)),
            None => return Err(RunError::api(500, "script exhausted")),
        };

        let stream = async_stream::stream! {
            for event in events {
                yield Ok(RawResponseEvent::from_value(event));
            }
            if let Some(message) = failure {
                yield Err(RunError::Stream(message));
            }
        };
        Ok(Box::pin(stream))
    }

    async fn create(&self, body: &Value) -> Result<ResponseObject, RunError> {
        self.create_bodies.lock().unwrap().push(body.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RunError::api(500, "no scripted reply"))?;
        Ok(serde_json::from_value(reply)?)
    }

    async fn retrieve(&self, response_id: &str) -> Result<ResponseObject, RunError> {
        let stored = self
            .stored
            .get(response_id)
            .cloned()
            .ok_or_else(|| RunError::api(404, format!("No response found with id '{response_id}'.")))?;
        Ok(serde_json::from_value(stored)?)
    }
}

/// A stored response whose only output is one assistant message.
pub fn message_response(response_id: &str, text: &str) -> Value {
    json!({
        "id": response_id,
        "status": "completed",
        "output": [{"type": "message", "content": [{"type": "output_text", "text": text}]}],
    })
}

pub fn created(response_id: &str) -> Value {
    json!({"type": "response.created", "response": {"id": response_id, "status": "in_progress"}})
}

pub fn created_in_conversation(response_id: &str, conversation_id: &str) -> Value {
    json!({
        "type": "response.created",
        "response": {"id": response_id, "conversation": {"id": conversation_id}},
    })
}

pub fn text_delta(delta: &str) -> Value {
    json!({"type": "response.output_text.delta", "item_id": "msg_1", "delta": delta})
}

pub fn call_added(item_id: &str, call_id: &str, name: &str) -> Value {
    json!({
        "type": "response.output_item.added",
        "output_index": 0,
        "item": {"type": "function_call", "id": item_id, "call_id": call_id, "name": name, "arguments": ""},
    })
}

pub fn args_delta(item_id: &str, delta: &str) -> Value {
    json!({"type": "response.function_call_arguments.delta", "item_id": item_id, "delta": delta})
}

pub fn args_done(item_id: &str, arguments: &str) -> Value {
    json!({"type": "response.function_call_arguments.done", "item_id": item_id, "arguments": arguments})
}

pub fn completed(response_id: &str) -> Value {
    json!({"type": "response.completed", "response": {"id": response_id, "status": "completed"}})
}

/// A complete tool-calling segment: created, one call with streamed arguments, done.
pub fn tool_call_segment(response_id: &str, call_id: &str, name: &str, arguments: &str) -> Vec<Value> {
    let item_id = format!("fc_{call_id}");
    vec![
        created(response_id),
        call_added(&item_id, call_id, name),
        args_delta(&item_id, arguments),
        args_done(&item_id, arguments),
    ]
}

/// A plain text segment ending in `response.completed`.
pub fn text_segment(response_id: &str, text: &str) -> Vec<Value> {
    vec![created(response_id), text_delta(text), completed(response_id)]
}
