//! Shared HTTP client, SSE framing, and error mapping.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::RunError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// No overall timeout is set: streamed responses stay open for as long as the model
/// keeps producing events.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "falling back to default HTTP client");
                reqwest::Client::new()
            })
    })
}

/// Default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str, streaming: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if streaming {
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    }
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a non-success HTTP status and body to an error.
///
/// The message is `error.message` from a JSON error body when present, else the raw body.
pub fn status_to_error(status: u16, body: &str) -> RunError {
    let message = extract_error_message(body).unwrap_or_else(|| body.trim().to_string());
    match status {
        401 | 403 => RunError::Authentication(message),
        _ => RunError::api(status, message),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Feed raw chunks with [`push`](Self::push); each complete frame's joined `data:` payload
/// comes back in order. Comment lines and non-data fields are ignored. Bytes are only
/// decoded once a whole line has arrived, so multi-byte characters split across chunks
/// survive intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    pending_data: Vec<String>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `[DONE]` frame has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            if self.done {
                break;
            }
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                if let Some(data) = self.take_frame() {
                    frames.push(data);
                }
            } else {
                self.push_field(line);
            }
        }
        frames
    }

    /// Flush a trailing frame that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = String::from_utf8_lossy(&rest);
            self.push_field(rest.trim_end_matches(['\n', '\r']));
        }
        self.take_frame()
    }

    fn push_field(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            self.pending_data.push(rest.to_string());
        }
    }

    fn take_frame(&mut self) -> Option<String> {
        if self.pending_data.is_empty() || self.done {
            return None;
        }
        let data = self.pending_data.join("\n");
        self.pending_data.clear();
        if data == "[DONE]" {
            self.done = true;
            return None;
        }
        Some(data)
    }
}
