//! Routing of function calls to registered tools.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::{json, Value};

use super::arguments::ToolArguments;
use super::tool::{RunContext, Tool, ToolContext};

/// Looks tools up by name and runs them, converting every failure into a
/// `{"error": message}` result.
#[derive(Clone)]
pub struct ToolDispatcher {
    tools: Vec<Arc<dyn Tool>>,
    context: Option<RunContext>,
}

impl ToolDispatcher {
    pub fn new(tools: Vec<Arc<dyn Tool>>, context: Option<RunContext>) -> Self {
        Self { tools, context }
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// First registered tool with this name.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// Run a tool. The run context is passed only when the tool's signature asks for it.
    pub async fn dispatch(&self, tool: &dyn Tool, args: ToolArguments) -> Value {
        let ctx = if tool.signature().wants_context() {
            ToolContext::new(self.context.clone())
        } else {
            ToolContext::empty()
        };
        let name = tool.name().to_string();
        let outcome = AssertUnwindSafe(tool.execute(&args, &ctx))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(value)) => {
                tracing::debug!(tool = %name, "tool call succeeded");
                value
            }
            Ok(Err(err)) => {
                tracing::warn!(tool = %name, error = %err, "tool call failed");
                json!({ "error": err.to_string() })
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(tool = %name, error = %message, "tool call panicked");
                json!({ "error": message })
            }
        }
    }
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        f.debug_struct("ToolDispatcher")
            .field("tools", &names)
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

/// Extract the message of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}
