//! Task API endpoints
//!
//! Background runs whose events go to the global `/events` feed.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::Serialize;
use serde_json::json;

use super::RunRequest;
use crate::relay::sse::TASK_UPDATED_EVENT;
use crate::relay::{task_created_frame, task_frames, task_status_frame, RelayFrame};
use crate::server::state::{AppState, TASK_MAX_TURNS};
use crate::server::task::{Task, TaskSnapshot, TaskStatus};
use crate::tools::RunContext;

#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub task_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /tasks - queue a background run
async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Json<CreateTaskResponse> {
    let task = Arc::new(Task::new(req.items.clone()));
    state.insert_task(Arc::clone(&task)).await;
    state.publish(task_created_frame(&task.id));
    tracing::info!(task_id = %task.id, "task created");

    let task_id = task.id.clone();
    tokio::spawn(run_task(state, task, req));
    Json(CreateTaskResponse { task_id })
}

async fn run_task(state: AppState, task: Arc<Task>, req: RunRequest) {
    let context: RunContext = task.clone();
    let mut events = req
        .into_run(&state, state.task_agent())
        .shared_context(context)
        .max_turns(TASK_MAX_TURNS)
        .stream_events();

    while let Some(item) = events.next().await {
        match item {
            Ok(event) => {
                for frame in task_frames(&task.id, &event) {
                    state.publish(frame);
                }
            }
            Err(err) => {
                tracing::warn!(task_id = %task.id, error = %err, "task run failed");
                state.publish(RelayFrame::new(
                    TASK_UPDATED_EVENT,
                    json!({ "task_id": task.id, "error": err.to_string() }),
                ));
            }
        }
    }

    task.set_status(TaskStatus::Done);
    state.publish(task_status_frame(&task.id, &TaskStatus::Done.to_string()));
    tracing::info!(task_id = %task.id, "task done");
}

/// GET /tasks/{id} - snapshot of one task
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    match state.task(&id).await {
        Some(task) => Ok(Json(task.snapshot())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Task {} not found", id),
            }),
        )),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task))
        .route("/tasks/{id}", get(get_task))
}
