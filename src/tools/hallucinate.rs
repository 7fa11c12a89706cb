//! Tools whose results are produced by a model instead of local code.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use super::arguments::ToolArguments;
use super::schema::FunctionToolDeclaration;
use super::tool::{Tool, ToolContext};
use super::types::Signature;
use crate::error::ToolError;
use crate::provider::ResponsesTransport;

pub const DEFAULT_HALLUCINATION_MODEL: &str = "gpt-4.1-mini";

const EMULATION_PROMPT: &str = "Emulate the function call below. You are given the function's \
JSON schema, the arguments, and a history of prior calls. Respond with a JSON object \
representing the function's return value.";

/// One earlier call of a hallucinated tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HallucinatedCall {
    pub name: String,
    pub schema: FunctionToolDeclaration,
    pub args: Value,
    pub returned: Value,
}

/// A tool that asks a model to invent a plausible return value.
///
/// Prior calls of this instance are sent along so answers stay consistent.
pub struct HallucinatedTool {
    name: String,
    description: Option<String>,
    signature: Signature,
    transport: Arc<dyn ResponsesTransport>,
    model: String,
    history: Mutex<Vec<HallucinatedCall>>,
}

impl HallucinatedTool {
    pub fn new(
        name: impl Into<String>,
        signature: Signature,
        transport: Arc<dyn ResponsesTransport>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            signature,
            transport,
            model: DEFAULT_HALLUCINATION_MODEL.to_string(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Calls made so far, oldest first.
    pub fn history(&self) -> Vec<HallucinatedCall> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn request_body(&self, schema: &FunctionToolDeclaration, args: &Value) -> Value {
        let previous = self.history();
        let payload = json!({
            "function_schema": schema,
            "function_name": self.name,
            "args": args,
            "previous_function_calls": previous,
        });
        let payload_text =
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
        json!({
            "model": self.model,
            "input": [
                {"role": "developer", "content": EMULATION_PROMPT},
                {"role": "user", "content": payload_text},
            ],
            "text": {"format": {"type": "json_object"}},
            "reasoning": {"effort": "low"},
        })
    }
}

#[async_trait]
impl Tool for HallucinatedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    async fn execute(&self, args: &ToolArguments, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let schema = FunctionToolDeclaration::for_tool(self);
        let args = args.to_value();
        let body = self.request_body(&schema, &args);

        let response = self.transport.create(&body).await?;
        let text = response.output_text();
        let returned: Value = if text.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&text).map_err(|e| {
                ToolError::Execution(format!("model returned invalid JSON for {}: {e}", self.name))
            })?
        };
        tracing::debug!(tool = %self.name, "hallucinated result");

        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(HallucinatedCall {
                name: self.name.clone(),
                schema,
                args,
                returned: returned.clone(),
            });
        Ok(returned)
    }
}

impl std::fmt::Debug for HallucinatedTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HallucinatedTool")
            .field("name", &self.name)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::OpenAiResponsesTransport;

    #[test]
    fn history_survives_a_poisoned_lock() {
        let tool = Arc::new(HallucinatedTool::new(
            "get_balance",
            Signature::new().required("account"),
            Arc::new(OpenAiResponsesTransport::new("sk", None)),
        ));
        tool.history.lock().unwrap().push(HallucinatedCall {
            name: "get_balance".to_string(),
            schema: FunctionToolDeclaration::for_tool(tool.as_ref()),
            args: json!({"account": "checking"}),
            returned: json!({"balance": 120}),
        });

        let poisoner = Arc::clone(&tool);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.history.lock().unwrap();
            panic!("poison the history lock");
        })
        .join();
        assert!(tool.history.is_poisoned());

        assert_eq!(tool.history().len(), 1);
        let body = tool.request_body(
            &FunctionToolDeclaration::for_tool(tool.as_ref()),
            &json!({"account": "savings"}),
        );
        let payload: Value =
            serde_json::from_str(body["input"][1]["content"].as_str().unwrap()).unwrap();
        assert_eq!(payload["previous_function_calls"][0]["returned"], json!({"balance": 120}));
    }
}
