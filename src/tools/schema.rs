//! Function-tool declarations sent with each request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::tool::Tool;
use super::types::Signature;

/// JSON schema of a tool's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

impl ParametersSchema {
    /// Every parameter is declared as a string; defaults make it optional.
    pub fn from_signature(signature: &Signature) -> Self {
        let properties = signature
            .params()
            .iter()
            .map(|p| (p.name.clone(), json!({ "type": "string" })))
            .collect();
        let required = signature
            .required_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            kind: "object".to_string(),
            properties,
            required,
            additional_properties: true,
        }
    }

    pub fn empty() -> Self {
        Self::from_signature(&Signature::new())
    }
}

/// One `{"type": "function", ...}` entry of a request's `tools` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionToolDeclaration {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: ParametersSchema,
    pub strict: bool,
}

impl FunctionToolDeclaration {
    pub fn for_tool(tool: &dyn Tool) -> Self {
        let parameters = match tool.signature().validate() {
            Ok(()) => ParametersSchema::from_signature(tool.signature()),
            Err(reason) => {
                tracing::warn!(tool = tool.name(), %reason, "unusable tool signature, declaring no parameters");
                ParametersSchema::empty()
            }
        };
        let description = tool
            .description()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Self {
            kind: "function".to_string(),
            name: tool.name().to_string(),
            description,
            parameters,
            strict: false,
        }
    }
}

/// Declarations for every registered tool, in registration order.
pub fn build_function_tools(tools: &[Arc<dyn Tool>]) -> Vec<FunctionToolDeclaration> {
    tools
        .iter()
        .map(|tool| FunctionToolDeclaration::for_tool(tool.as_ref()))
        .collect()
}
