//! OpenAI Responses API transport (`POST /responses`, `GET /responses/{id}`).

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tracing::debug;

use super::http::{bearer_headers, shared_client, status_to_error, SseDecoder};
use super::{ResponseEventStream, ResponsesTransport};
use crate::config::StreamrunConfig;
use crate::error::RunError;
use crate::types::{RawResponseEvent, ResponseObject, ResponsesRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP transport for the OpenAI Responses API.
#[derive(Clone)]
pub struct OpenAiResponsesTransport {
    api_key: String,
    base_url: String,
    debug_events: bool,
}

impl OpenAiResponsesTransport {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            api_key: api_key.into(),
            base_url,
            debug_events: false,
        }
    }

    /// Build a transport from configuration. Fails without an API key.
    pub fn from_config(config: &StreamrunConfig) -> Result<Self, RunError> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(api_key, config.base_url().map(str::to_string))
            .with_debug_events(config.debug_events()))
    }

    /// Log every decoded event at debug level.
    pub fn with_debug_events(mut self, enabled: bool) -> Self {
        self.debug_events = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for OpenAiResponsesTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiResponsesTransport")
            .field("base_url", &self.base_url)
            .field("debug_events", &self.debug_events)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ResponsesTransport for OpenAiResponsesTransport {
    async fn open_stream(&self, request: &ResponsesRequest) -> Result<ResponseEventStream, RunError> {
        let url = format!("{}/responses", self.base_url);
        debug!(
            model = %request.model,
            tools = request.tools.len(),
            previous_response_id = request.previous_response_id.as_deref().unwrap_or(""),
            conversation = request.conversation.as_deref().unwrap_or(""),
            "Responses open_stream"
        );

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key, true))
            .json(request)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();
        let debug_events = self.debug_events;

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(RunError::Network(e));
                        return;
                    }
                };
                for data in decoder.push(&chunk) {
                    match RawResponseEvent::parse(&data) {
                        Ok(event) => {
                            if debug_events {
                                debug!(event_type = event.event_type(), data = %data, "Responses SSE event");
                            }
                            yield Ok(event);
                        }
                        Err(e) => debug!(error = %e, data = %data, "Responses SSE parse failed"),
                    }
                }
                if decoder.is_done() {
                    return;
                }
            }

            if let Some(data) = decoder.finish() {
                match RawResponseEvent::parse(&data) {
                    Ok(event) => yield Ok(event),
                    Err(e) => debug!(error = %e, "trailing SSE frame is not JSON"),
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn create(&self, body: &Value) -> Result<ResponseObject, RunError> {
        let url = format!("{}/responses", self.base_url);
        debug!(url = %url, "Responses create");
        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key, false))
            .json(body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(resp.json().await?)
    }

    async fn retrieve(&self, response_id: &str) -> Result<ResponseObject, RunError> {
        let url = format!("{}/responses/{}", self.base_url, response_id);
        debug!(response_id, "Responses retrieve");
        let resp = shared_client()
            .get(&url)
            .headers(bearer_headers(&self.api_key, false))
            .send()
            .await?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let transport = OpenAiResponsesTransport::new("sk", Some("http://localhost:9/v1/".into()));
        assert_eq!(transport.base_url(), "http://localhost:9/v1");
        assert_eq!(
            OpenAiResponsesTransport::new("sk", None).base_url(),
            DEFAULT_BASE_URL
        );
    }

    #[test]
    fn debug_output_hides_key() {
        let transport = OpenAiResponsesTransport::new("sk-secret", None);
        assert!(!format!("{transport:?}").contains("sk-secret"));
    }
}
