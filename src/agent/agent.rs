//! Agent definition: model, instructions, tools, and model settings.

use std::sync::Arc;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::tools::schema::{build_function_tools, FunctionToolDeclaration};
use crate::tools::tool::Tool;
use crate::types::{Reasoning, ReasoningSummary};

/// Per-agent model options sent with every segment.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
pub struct ModelSettings {
    pub reasoning: Option<Reasoning>,
}

impl ModelSettings {
    /// Reasoning summaries on: `detailed` for o3-family models, `concise` otherwise.
    pub fn with_reasoning_summary_for(model: &str) -> Self {
        let summary = if model.starts_with("o3") {
            ReasoningSummary::Detailed
        } else {
            ReasoningSummary::Concise
        };
        Self {
            reasoning: Some(Reasoning {
                effort: None,
                summary: Some(summary),
            }),
        }
    }
}

/// Immutable description of an agent, shared by runs through `Arc<Agent>`.
///
/// ```
/// use streamrun::agent::Agent;
///
/// let agent = Agent::builder()
///     .name("Assistant")
///     .model("o3")
///     .instructions("Be brief.")
///     .build();
/// assert_eq!(agent.model(), "o3");
/// assert!(agent.tools().is_empty());
/// ```
#[derive(Clone, Builder)]
pub struct Agent {
    #[builder(into)]
    name: String,
    #[builder(into)]
    model: String,
    #[builder(into)]
    instructions: Option<String>,
    #[builder(default)]
    tools: Vec<Arc<dyn Tool>>,
    model_settings: Option<ModelSettings>,
}

impl Agent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn model_settings(&self) -> Option<&ModelSettings> {
        self.model_settings.as_ref()
    }

    pub fn reasoning(&self) -> Option<&Reasoning> {
        self.model_settings.as_ref()?.reasoning.as_ref()
    }

    /// Function-tool declarations for this agent's tools.
    pub fn tool_declarations(&self) -> Vec<FunctionToolDeclaration> {
        build_function_tools(&self.tools)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tools: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("instructions", &self.instructions)
            .field("tools", &tools)
            .field("model_settings", &self.model_settings)
            .finish()
    }
}
