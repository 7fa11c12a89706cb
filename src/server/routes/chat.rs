//! Chat endpoint: one streamed run per request, relayed as SSE.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::post,
    Json, Router,
};
use futures::{Stream, StreamExt};

use super::{sse_event, RunRequest};
use crate::agent_loop::EventData;
use crate::relay::{chat_frames, error_frame, RelayFrame};
use crate::server::state::AppState;

/// POST / - run the chat agent and stream its events, ending with `done`.
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut events = req.into_run(&state, state.chat_agent()).stream_events();

    let stream = async_stream::stream! {
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    if let EventData::ToolResult { name, result } = &event.data {
                        tracing::info!(tool = %name, result = %result, "tool result");
                    }
                    for frame in chat_frames(&event) {
                        yield sse_event(frame);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "chat run failed");
                    yield sse_event(error_frame(&err));
                }
            }
        }
        yield sse_event(RelayFrame::done());
    };

    Sse::new(stream)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(chat))
}
