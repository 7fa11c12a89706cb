//! Transport seam between the run state machine and the Responses API.

pub mod http;
pub mod openai_responses;

use async_trait::async_trait;
use futures::stream::BoxStream;

use serde_json::Value;

use crate::error::RunError;
use crate::types::{RawResponseEvent, ResponseObject, ResponsesRequest};

pub use openai_responses::OpenAiResponsesTransport;

/// Stream of decoded events for one response segment.
pub type ResponseEventStream = BoxStream<'static, Result<RawResponseEvent, RunError>>;

/// Access to the Responses API: streamed segments plus the non-streaming calls used by
/// hallucinated tools and the CLI fallback.
///
/// A rejected request (bad request, auth, not found) must fail the `open_stream`
/// call itself so the run can classify it; errors yielded mid-stream are treated as
/// fatal transport failures.
#[async_trait]
pub trait ResponsesTransport: Send + Sync {
    async fn open_stream(&self, request: &ResponsesRequest) -> Result<ResponseEventStream, RunError>;

    /// Non-streaming `POST /responses` with an arbitrary body.
    async fn create(&self, body: &Value) -> Result<ResponseObject, RunError>;

    /// Fetch a stored response by id.
    async fn retrieve(&self, response_id: &str) -> Result<ResponseObject, RunError>;
}
