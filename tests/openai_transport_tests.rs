//! OpenAI Responses transport against a mock HTTP server.

mod common;

use std::sync::Arc;

use futures::StreamExt;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use streamrun::agent::Agent;
use streamrun::agent_loop::Runner;
use streamrun::error::{ErrorCategory, RunError, ToolError};
use streamrun::provider::{OpenAiResponsesTransport, ResponsesTransport};
use streamrun::tools::{
    FunctionTool, HallucinatedTool, Signature, Tool, ToolArguments, ToolContext,
};
use streamrun::types::{ResponseEvent, ResponsesRequest, RunInput};

fn sse_body(events: &[Value]) -> String {
    let mut body = String::new();
    for event in events {
        body.push_str(&format!("event: {}\ndata: {}\n\n", event["type"].as_str().unwrap(), event));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn sse_response(events: &[Value]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(sse_body(events), "text/event-stream")
}

fn transport(server: &MockServer) -> OpenAiResponsesTransport {
    OpenAiResponsesTransport::new("test-key", Some(server.uri()))
}

#[tokio::test]
async fn open_stream_decodes_sse_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("accept", "text/event-stream"))
        .and(body_string_contains("\"stream\":true"))
        .respond_with(sse_response(&text_segment("resp_1", "Hello")))
        .expect(1)
        .mount(&server)
        .await;

    let request = ResponsesRequest::new("o3", RunInput::from("hi"));
    let events: Vec<_> = transport(&server)
        .open_stream(&request)
        .await
        .expect("stream opens")
        .collect()
        .await;

    let types: Vec<String> = events
        .iter()
        .map(|e| e.as_ref().unwrap().event_type().to_string())
        .collect();
    assert_eq!(
        types,
        vec!["response.created", "response.output_text.delta", "response.completed"]
    );
    match events[1].as_ref().unwrap().event() {
        ResponseEvent::OutputTextDelta { delta, .. } => assert_eq!(delta, "Hello"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn rejected_request_surfaces_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Previous response with id 'resp_0' not found.",
                "type": "invalid_request_error",
                "param": "previous_response_id",
            }
        })))
        .mount(&server)
        .await;

    let request = ResponsesRequest::new("o3", RunInput::from("hi"));
    let err = match transport(&server).open_stream(&request).await {
        Ok(_) => panic!("expected rejection"),
        Err(err) => err,
    };
    assert_eq!(
        err.bad_request_message(),
        Some("Previous response with id 'resp_0' not found.")
    );
}

#[tokio::test]
async fn unauthorized_is_an_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let request = ResponsesRequest::new("o3", RunInput::from("hi"));
    let err = match transport(&server).open_stream(&request).await {
        Ok(_) => panic!("expected rejection"),
        Err(err) => err,
    };
    assert!(matches!(err, RunError::Authentication(_)));
    assert_eq!(err.category(), ErrorCategory::Authentication);
}

#[tokio::test]
async fn retrieve_returns_output_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/responses/resp_7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_7",
            "status": "completed",
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "Final "},
                    {"type": "output_text", "text": "answer"}
                ]}
            ]
        })))
        .mount(&server)
        .await;

    let response = transport(&server).retrieve("resp_7").await.unwrap();
    assert_eq!(response.id, "resp_7");
    assert_eq!(response.output_text(), "Final answer");
}

#[tokio::test]
async fn full_run_over_http_chains_tool_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_string_contains("function_call_output"))
        .respond_with(sse_response(&text_segment("resp_2", "It is sunny in Oslo.")))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(sse_response(&tool_call_segment(
            "resp_1",
            "call_1",
            "get_weather",
            r#"{"city":"Oslo"}"#,
        )))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;

    let weather: Arc<dyn Tool> = Arc::new(FunctionTool::new(
        "get_weather",
        Signature::new().required("city"),
        |args: ToolArguments, _ctx| async move {
            Ok::<_, ToolError>(json!({"city": args.get_str("city")?, "condition": "Sunny"}))
        },
    ));
    let agent = Agent::builder()
        .name("assistant")
        .model("o3")
        .tools(vec![weather])
        .build();

    let events = Runner::new(Arc::new(transport(&server)))
        .run_streamed(Arc::new(agent), "Weather in Oslo?")
        .stream_events()
        .collect_events()
        .await
        .unwrap();

    assert_eq!(events.last().unwrap().event_type(), "response.completed");
    let tool_result = events
        .iter()
        .find(|e| e.event_type() == "function.tool_result")
        .expect("tool result event");
    assert_eq!(tool_result.data.to_json()["result"]["condition"], "Sunny");

    let requests = server.received_requests().await.unwrap();
    let chained: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(chained["previous_response_id"], "resp_1");
    assert_eq!(chained["input"][0]["call_id"], "call_1");
}

#[tokio::test]
async fn hallucinated_tool_sends_previous_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_string_contains("json_object"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_h",
            "output": [{"type": "message", "content": [
                {"type": "output_text", "text": "{\"balance\": 120}"}
            ]}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let tool = HallucinatedTool::new(
        "get_balance",
        Signature::new().required("account"),
        Arc::new(transport(&server)),
    )
    .with_description("Current balance of an account.");

    let args = ToolArguments::new(json!({"account": "checking"}));
    let first = tool.execute(&args, &ToolContext::empty()).await.unwrap();
    assert_eq!(first, json!({"balance": 120}));
    tool.execute(&args, &ToolContext::empty()).await.unwrap();

    let history = tool.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].args, json!({"account": "checking"}));

    let requests = server.received_requests().await.unwrap();
    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(second["model"], "gpt-4.1-mini");
    let payload: Value =
        serde_json::from_str(second["input"][1]["content"].as_str().unwrap()).unwrap();
    assert_eq!(payload["function_name"], "get_balance");
    assert_eq!(payload["previous_function_calls"][0]["returned"], json!({"balance": 120}));
}
