//! Demo agent: business tools backed by [`MockApi`].

pub mod mock_api;

use std::sync::Arc;

use serde_json::json;

use crate::agent::{Agent, ModelSettings};
use crate::error::ToolError;
use crate::tools::{FunctionTool, Signature, Tool, ToolArguments};

pub use mock_api::{Document, Email, MockApi, Policy, Ticket};

pub const DEMO_INSTRUCTIONS: &str = "You can and should call tools to gather facts and take actions. \
Begin by planning with concise TODOs, then execute them, checking off as you go. \
When tools help, call them; after tool use, produce a brief, direct answer. \
Operate autonomously to reach a conclusion.";

fn id_arg(args: &ToolArguments, key: &str) -> Result<u32, ToolError> {
    let id = args.get_i64(key)?;
    u32::try_from(id).map_err(|_| ToolError::InvalidArguments(format!("'{key}' out of range: {id}")))
}

pub fn get_weather() -> FunctionTool {
    FunctionTool::new(
        "get_weather",
        Signature::new().required("city"),
        |args: ToolArguments, _ctx| async move {
            let city = args.get_str("city")?;
            Ok::<_, ToolError>(json!({
                "city": city,
                "temperature": "22 °C",
                "condition": "Sunny",
                "humidity": "40 %",
                "wind": "10 km/h",
            }))
        },
    )
    .with_description("Get the current weather for a given city.")
}

/// Every demo business tool, all sharing `api`.
pub fn demo_tools(api: Arc<MockApi>) -> Vec<Arc<dyn Tool>> {
    let search_open_tickets = {
        let api = Arc::clone(&api);
        FunctionTool::blocking(
            "search_open_tickets",
            Signature::new().required("query"),
            move |args, _ctx| Ok::<_, ToolError>(api.search_open_tickets(args.get_str("query")?)),
        )
        .with_description("Search open tickets by query string.")
    };
    let read_document = {
        let api = Arc::clone(&api);
        FunctionTool::blocking(
            "read_document",
            Signature::new().required("doc_id"),
            move |args, _ctx| Ok::<_, ToolError>(api.read_document(id_arg(&args, "doc_id")?)),
        )
        .with_description("Read a document (runbook) by its ID.")
    };
    let get_runbook_by_category = {
        let api = Arc::clone(&api);
        FunctionTool::blocking(
            "get_runbook_by_category",
            Signature::new().required("category"),
            move |args, _ctx| {
                Ok::<_, ToolError>(api.get_runbook_by_category(args.get_str("category")?))
            },
        )
        .with_description("Get a runbook document by category.")
    };
    let search_policies = {
        let api = Arc::clone(&api);
        FunctionTool::blocking(
            "search_policies",
            Signature::new().required("query"),
            move |args, _ctx| Ok::<_, ToolError>(api.search_policies(args.get_str("query")?)),
        )
        .with_description("Search policies by query string.")
    };
    let get_emails = {
        let api = Arc::clone(&api);
        FunctionTool::blocking(
            "get_emails",
            Signature::new().optional("to"),
            move |args, _ctx| Ok::<_, ToolError>(api.get_emails(args.get_str_opt("to"))),
        )
        .with_description("Get emails, optionally filtered by recipient.")
    };
    let add_ticket_comment = {
        let api = Arc::clone(&api);
        FunctionTool::blocking(
            "add_ticket_comment",
            Signature::new().required("ticket_id").required("comment"),
            move |args, _ctx| {
                let ticket_id = id_arg(&args, "ticket_id")?;
                Ok::<_, ToolError>(api.add_ticket_comment(ticket_id, args.get_str("comment")?))
            },
        )
        .with_description("Add a comment to a ticket.")
    };
    let write_document = {
        let api = Arc::clone(&api);
        FunctionTool::blocking(
            "write_document",
            Signature::new()
                .required("title")
                .required("content")
                .optional("doc_id"),
            move |args, _ctx| {
                let doc_id = match args.get("doc_id") {
                    None | Some(serde_json::Value::Null) => None,
                    Some(_) => Some(id_arg(&args, "doc_id")?),
                };
                Ok::<_, ToolError>(api.write_document(
                    args.get_str("title")?,
                    args.get_str("content")?,
                    doc_id,
                ))
            },
        )
        .with_description("Create or update a document.")
    };
    let send_email = {
        let api = Arc::clone(&api);
        FunctionTool::blocking(
            "send_email",
            Signature::new()
                .required("from_addr")
                .required("to_addr")
                .required("subject")
                .required("body"),
            move |args, _ctx| {
                Ok::<_, ToolError>(api.send_email(
                    args.get_str("from_addr")?,
                    args.get_str("to_addr")?,
                    args.get_str("subject")?,
                    args.get_str("body")?,
                ))
            },
        )
        .with_description("Send an email.")
    };

    vec![
        Arc::new(get_weather()),
        Arc::new(search_open_tickets),
        Arc::new(read_document),
        Arc::new(get_runbook_by_category),
        Arc::new(search_policies),
        Arc::new(get_emails),
        Arc::new(add_ticket_comment),
        Arc::new(write_document),
        Arc::new(send_email),
    ]
}

/// The demo assistant with every business tool plus `extra` tools.
pub fn demo_agent(model: &str, api: Arc<MockApi>, extra: Vec<Arc<dyn Tool>>) -> Agent {
    let mut tools = demo_tools(api);
    tools.extend(extra);
    Agent::builder()
        .name("assistant")
        .model(model)
        .instructions(DEMO_INSTRUCTIONS)
        .tools(tools)
        .model_settings(ModelSettings::with_reasoning_summary_for(model))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolContext;

    fn find(tools: &[Arc<dyn Tool>], name: &str) -> Arc<dyn Tool> {
        tools.iter().find(|t| t.name() == name).cloned().unwrap()
    }

    #[tokio::test]
    async fn read_document_accepts_string_id() {
        let tools = demo_tools(Arc::new(MockApi::new()));
        let tool = find(&tools, "read_document");
        let out = tool
            .execute(&ToolArguments::new(json!({"doc_id": "2"})), &ToolContext::empty())
            .await
            .unwrap();
        assert_eq!(out["title"], "Hardware Triage Runbook");
    }

    #[tokio::test]
    async fn missing_document_is_null() {
        let tools = demo_tools(Arc::new(MockApi::new()));
        let tool = find(&tools, "read_document");
        let out = tool
            .execute(&ToolArguments::new(json!({"doc_id": 42})), &ToolContext::empty())
            .await
            .unwrap();
        assert!(out.is_null());
    }

    #[test]
    fn agent_declares_all_tools() {
        let agent = demo_agent("o3", Arc::new(MockApi::new()), Vec::new());
        let names: Vec<String> = agent.tool_declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(names.len(), 9);
        assert_eq!(names[0], "get_weather");
        assert!(agent.reasoning().is_some());
    }
}
