//! Route handlers

pub mod chat;
pub mod events;
pub mod health;
pub mod tasks;

use std::convert::Infallible;

use axum::response::sse::Event;
use serde::Deserialize;
use serde_json::Value;

use crate::agent::Agent;
use crate::agent_loop::Run;
use crate::relay::RelayFrame;
use crate::server::state::AppState;

/// Body shared by `POST /` and `POST /tasks`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub previous_response_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl RunRequest {
    /// Start a run of `agent` with this request's input and continuity ids.
    pub(crate) fn into_run(self, state: &AppState, agent: std::sync::Arc<Agent>) -> Run {
        let mut run = state.runner().run_streamed(agent, self.items);
        if let Some(id) = self.previous_response_id {
            run = run.previous_response_id(id);
        }
        if let Some(id) = self.conversation_id {
            run = run.conversation_id(id);
        }
        run
    }
}

/// Convert a relay frame into an axum SSE event.
pub(crate) fn sse_event(frame: RelayFrame) -> Result<Event, Infallible> {
    Ok(Event::default()
        .event(frame.event)
        .data(frame.data.to_string()))
}
