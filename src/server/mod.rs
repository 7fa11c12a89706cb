//! SSE relay server: chat, background tasks, and the global task feed.

pub mod routes;
pub mod state;
pub mod task;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::StreamrunConfig;
use crate::error::RunError;
use crate::provider::OpenAiResponsesTransport;

pub use state::AppState;
pub use task::{todo_tools, Task, TaskSnapshot, TaskStatus, Todo};

/// Every route, with permissive CORS and HTTP tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::chat::router())
        .merge(routes::tasks::router())
        .merge(routes::events::router())
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Bind `config.bind_addr()` and serve the demo agents until the process ends.
pub async fn serve(config: &StreamrunConfig) -> Result<(), RunError> {
    let transport = OpenAiResponsesTransport::from_config(config)?;
    let state = AppState::new(Arc::new(transport), config.model());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("relay server listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
