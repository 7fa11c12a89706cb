//! Relaying run events to outside consumers: SSE frames and human summaries.

pub mod sse;
pub mod summary;

pub use sse::{
    chat_frames, error_frame, synthesized_message, task_created_frame, task_frames,
    task_status_frame, RelayFrame,
};
pub use summary::synthesize_tool_result_text;
