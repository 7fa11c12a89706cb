//! Convenience re-exports for common use.

pub use crate::agent::{Agent, ModelSettings};
pub use crate::agent_loop::{EventData, Run, RunEvent, RunEventStream, Runner};
pub use crate::config::StreamrunConfig;
pub use crate::error::{Result, RunError, ToolError};
pub use crate::provider::{OpenAiResponsesTransport, ResponsesTransport};
pub use crate::tools::{FunctionTool, Signature, Tool, ToolArguments, ToolContext};
pub use crate::types::{RawResponseEvent, ResponseEvent, RunInput};
