//! Model-backed tools and stored-response fallbacks over a scripted transport.

mod common;

use std::sync::Arc;

use serde_json::{json, Value};

use common::*;
use streamrun::agent::Agent;
use streamrun::agent_loop::{RunEvent, Runner};
use streamrun::provider::ResponsesTransport;
use streamrun::tools::{HallucinatedTool, Signature, Tool};

fn order_agent(transport: Arc<dyn ResponsesTransport>) -> Arc<Agent> {
    let lookup: Arc<dyn Tool> = Arc::new(
        HallucinatedTool::new("lookup_order", Signature::new().required("order_id"), transport)
            .with_description("Status of a customer order."),
    );
    Arc::new(
        Agent::builder()
            .name("support")
            .model("o3")
            .tools(vec![lookup])
            .build(),
    )
}

fn tool_result(events: &[RunEvent]) -> Value {
    events
        .iter()
        .find(|e| e.event_type() == "function.tool_result")
        .expect("tool result event")
        .data
        .to_json()
}

#[tokio::test]
async fn hallucinated_tool_runs_inside_a_streamed_run() {
    let transport = Arc::new(
        ScriptedTransport::new(vec![
            Segment::Events(tool_call_segment("resp_1", "call_1", "lookup_order", r#"{"order_id":"42"}"#)),
            Segment::Events(text_segment("resp_2", "Your order has shipped.")),
        ])
        .with_replies(vec![message_response("resp_h", r#"{"status": "shipped"}"#)]),
    );
    let agent = order_agent(transport.clone());

    let events = Runner::new(transport.clone())
        .run_streamed(agent, "Where is order 42?")
        .stream_events()
        .collect_events()
        .await
        .unwrap();

    assert_eq!(tool_result(&events)["result"], json!({"status": "shipped"}));

    let created = transport.create_bodies();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["model"], "gpt-4.1-mini");
    let payload: Value = serde_json::from_str(created[0]["input"][1]["content"].as_str().unwrap()).unwrap();
    assert_eq!(payload["function_name"], "lookup_order");
    assert_eq!(payload["args"], json!({"order_id": "42"}));
    assert_eq!(payload["previous_function_calls"], json!([]));

    let chained = &transport.request_bodies()[1];
    assert_eq!(chained["input"][0]["output"], r#"{"status":"shipped"}"#);
}

#[tokio::test]
async fn invalid_model_output_becomes_error_result() {
    let transport = Arc::new(
        ScriptedTransport::new(vec![
            Segment::Events(tool_call_segment("resp_1", "call_1", "lookup_order", r#"{"order_id":"7"}"#)),
            Segment::Events(text_segment("resp_2", "Could not look it up.")),
        ])
        .with_replies(vec![message_response("resp_h", "not json at all")]),
    );
    let agent = order_agent(transport.clone());

    let events = Runner::new(transport.clone())
        .run_streamed(agent, "Where is order 7?")
        .stream_events()
        .collect_events()
        .await
        .unwrap();

    let result = tool_result(&events);
    assert!(result["result"]["error"]
        .as_str()
        .unwrap()
        .contains("invalid JSON for lookup_order"));
    assert_eq!(events.last().unwrap().event_type(), "response.completed");
}

#[cfg(feature = "cli")]
#[tokio::test]
async fn cli_fallback_reads_stored_response() {
    use streamrun::cli::fallback_message;

    let transport = ScriptedTransport::new(Vec::new())
        .with_stored(message_response("resp_9", "  Done for today.\n"))
        .with_stored(message_response("resp_blank", "   "));

    assert_eq!(
        fallback_message(&transport, "resp_9").await.as_deref(),
        Some("Done for today.")
    );
    assert_eq!(fallback_message(&transport, "resp_blank").await, None);
    assert_eq!(fallback_message(&transport, "resp_missing").await, None);
}
