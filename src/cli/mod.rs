//! CLI entry point for streamrun.

use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent_loop::{EventData, RunEvent, Runner};
use crate::config::StreamrunConfig;
use crate::demo::{demo_agent, MockApi};
use crate::error::RunError;
use crate::provider::{OpenAiResponsesTransport, ResponsesTransport};
use crate::relay::synthesize_tool_result_text;
use crate::types::{OutputItem, ResponseEvent};

/// streamrun CLI
#[derive(Parser, Debug)]
#[command(name = "streamrun", version, about = "Streaming tool-calling runs over the Responses API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat with the demo agent in the terminal
    Chat(ChatArgs),
    /// Run the SSE relay server
    Serve(ServeArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Model to use (defaults to AGENT_MODEL or o3)
    #[arg(short, long)]
    pub model: Option<String>,
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Interface to bind (defaults to HOST or 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (defaults to PORT or 8000)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Model to use (defaults to AGENT_MODEL or o3)
    #[arg(short, long)]
    pub model: Option<String>,
}

impl ServeArgs {
    /// Apply command-line overrides on top of loaded configuration.
    pub fn apply(self, mut config: StreamrunConfig) -> StreamrunConfig {
        if let Some(host) = self.host {
            config = config.with_host(host);
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(model) = self.model {
            config = config.with_model(model);
        }
        config
    }
}

/// One line of REPL input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Exit,
    NewConversation,
    ShowId,
    Empty,
    Prompt(String),
}

impl ReplInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_lowercase().as_str() {
            "exit" | "quit" => Self::Exit,
            "/new" => Self::NewConversation,
            "/id" => Self::ShowId,
            "" => Self::Empty,
            _ => Self::Prompt(trimmed.to_string()),
        }
    }
}

/// Continuity ids carried from one REPL turn to the next.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub conversation_id: Option<String>,
    pub previous_response_id: Option<String>,
}

impl ChatSession {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Renders one turn's events to a terminal.
pub struct TurnPrinter<W: Write> {
    out: W,
    debug_events: bool,
    streamed_text: bool,
    printed_message: bool,
    last_response_id: Option<String>,
}

impl<W: Write> TurnPrinter<W> {
    pub fn new(out: W, debug_events: bool) -> Self {
        Self {
            out,
            debug_events,
            streamed_text: false,
            printed_message: false,
            last_response_id: None,
        }
    }

    /// Whether any assistant-facing text was printed this turn.
    pub fn printed_message(&self) -> bool {
        self.printed_message
    }

    pub fn last_response_id(&self) -> Option<&str> {
        self.last_response_id.as_deref()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print one run event and record continuity ids in `session`.
    pub fn handle(&mut self, event: &RunEvent, session: &mut ChatSession) -> std::io::Result<()> {
        if self.debug_events {
            writeln!(self.out, "[{}]", event.data.event_type())?;
        }
        match &event.data {
            EventData::Response(raw) => self.handle_response(raw.event(), session),
            EventData::ToolResult { name, result } => self.handle_tool_result(name, result),
            EventData::Closed => Ok(()),
        }
    }

    fn handle_response(
        &mut self,
        event: &ResponseEvent,
        session: &mut ChatSession,
    ) -> std::io::Result<()> {
        match event {
            ResponseEvent::Created { response } => {
                if let Some(id) = response.conversation_id() {
                    session.conversation_id = Some(id.to_string());
                }
                self.last_response_id = Some(response.id.clone());
            }
            ResponseEvent::OutputTextDelta { delta, .. } if !delta.is_empty() => {
                write!(self.out, "{delta}")?;
                self.out.flush()?;
                self.streamed_text = true;
            }
            ResponseEvent::OutputTextDone { .. } if self.streamed_text => {
                writeln!(self.out)?;
                self.printed_message = true;
            }
            ResponseEvent::OutputItemAdded {
                item: OutputItem::Reasoning { summary, .. },
                ..
            } => {
                let lines: Vec<&str> = summary
                    .iter()
                    .flatten()
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .collect();
                writeln!(self.out, "Reasoning... {}", lines.join("\n"))?;
            }
            ResponseEvent::OutputItemDone { item, .. } => match item {
                OutputItem::Message { content, .. } if !self.streamed_text => {
                    let text = message_text(content.as_deref().unwrap_or_default());
                    if !text.is_empty() {
                        writeln!(self.out, "Assistant: {text}")?;
                        self.printed_message = true;
                    }
                }
                OutputItem::FunctionCall {
                    name, arguments, ..
                } => {
                    let args = arguments.as_deref().unwrap_or_default().trim();
                    let inner = args
                        .strip_prefix('{')
                        .and_then(|a| a.strip_suffix('}'))
                        .unwrap_or(args);
                    writeln!(self.out, "{}({inner})", name.as_deref().unwrap_or("function"))?;
                }
                _ => {}
            },
            ResponseEvent::Completed { response } => {
                session.previous_response_id = Some(response.id.clone());
                self.last_response_id = Some(response.id.clone());
                self.streamed_text = false;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_tool_result(&mut self, name: &str, result: &Value) -> std::io::Result<()> {
        if self.printed_message {
            return Ok(());
        }
        writeln!(self.out, "Assistant: {}", synthesize_tool_result_text(name, result))?;
        let pretty = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
        writeln!(self.out, "{name} -> {pretty}")?;
        self.printed_message = true;
        Ok(())
    }
}

fn message_text(content: &[Value]) -> String {
    content
        .iter()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect()
}

/// Interactive loop against the demo agent. Returns on `exit`, `quit`, or end of input.
pub async fn run_chat(config: &StreamrunConfig) -> Result<(), RunError> {
    let transport: Arc<dyn ResponsesTransport> =
        Arc::new(OpenAiResponsesTransport::from_config(config)?);
    let runner = Runner::new(Arc::clone(&transport));
    let agent = Arc::new(demo_agent(config.model(), Arc::new(MockApi::new()), Vec::new()));
    let mut session = ChatSession::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            println!("\nExiting.");
            return Ok(());
        };
        let prompt = match ReplInput::parse(&line) {
            ReplInput::Exit => {
                println!("Exiting.");
                return Ok(());
            }
            ReplInput::NewConversation => {
                session.reset();
                println!("(started a new conversation)");
                continue;
            }
            ReplInput::ShowId => {
                println!(
                    "conversationId: {}",
                    session.conversation_id.as_deref().unwrap_or("(none)")
                );
                continue;
            }
            ReplInput::Empty => continue,
            ReplInput::Prompt(prompt) => prompt,
        };

        let mut run = runner.run_streamed(Arc::clone(&agent), prompt);
        if let Some(id) = &session.previous_response_id {
            run = run.previous_response_id(id.clone());
        }
        if let Some(id) = &session.conversation_id {
            run = run.conversation_id(id.clone());
        }

        let mut printer = TurnPrinter::new(std::io::stdout(), config.debug_events());
        let mut events = run.stream_events();
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => printer.handle(&event, &mut session)?,
                Err(err) => eprintln!("\nError: {err}"),
            }
        }

        if !printer.printed_message() {
            if let Some(id) = printer.last_response_id() {
                if let Some(text) = fallback_message(transport.as_ref(), id).await {
                    println!("Assistant: {text}");
                }
            }
        }
    }
}

/// Final text of a stored response, for turns that streamed nothing printable.
pub async fn fallback_message(transport: &dyn ResponsesTransport, response_id: &str) -> Option<String> {
    match transport.retrieve(response_id).await {
        Ok(response) => {
            let text = response.output_text();
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Err(err) => {
            tracing::debug!(error = %err, "fallback retrieve failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawResponseEvent;
    use serde_json::json;

    fn response(value: Value) -> RunEvent {
        RunEvent::response(RawResponseEvent::from_value(value))
    }

    fn printed(printer: TurnPrinter<Vec<u8>>) -> String {
        String::from_utf8(printer.into_inner()).unwrap()
    }

    #[test]
    fn repl_commands() {
        assert_eq!(ReplInput::parse(" QUIT "), ReplInput::Exit);
        assert_eq!(ReplInput::parse("/new"), ReplInput::NewConversation);
        assert_eq!(ReplInput::parse("/id"), ReplInput::ShowId);
        assert_eq!(ReplInput::parse("   "), ReplInput::Empty);
        assert_eq!(ReplInput::parse(" hi there "), ReplInput::Prompt("hi there".into()));
    }

    #[test]
    fn streamed_text_and_ids_are_tracked() {
        let mut session = ChatSession::default();
        let mut printer = TurnPrinter::new(Vec::new(), false);
        let events = [
            response(json!({"type": "response.created", "response": {"id": "resp_1", "conversation": {"id": "conv_1"}}})),
            response(json!({"type": "response.output_text.delta", "delta": "Hel"})),
            response(json!({"type": "response.output_text.delta", "delta": "lo"})),
            response(json!({"type": "response.output_text.done", "text": "Hello"})),
            response(json!({"type": "response.output_item.done", "item": {"type": "message", "content": [{"type": "output_text", "text": "Hello"}]}})),
            response(json!({"type": "response.completed", "response": {"id": "resp_1"}})),
        ];
        for event in &events {
            printer.handle(event, &mut session).unwrap();
        }
        assert!(printer.printed_message());
        assert_eq!(printer.last_response_id(), Some("resp_1"));
        assert_eq!(session.conversation_id.as_deref(), Some("conv_1"));
        assert_eq!(session.previous_response_id.as_deref(), Some("resp_1"));
        assert_eq!(printed(printer), "Hello\n");
    }

    #[test]
    fn function_calls_and_tool_results_are_printed() {
        let mut session = ChatSession::default();
        let mut printer = TurnPrinter::new(Vec::new(), false);
        printer
            .handle(
                &response(json!({"type": "response.output_item.done", "item": {"type": "function_call", "name": "get_weather", "arguments": "{\"city\":\"Oslo\"}"}})),
                &mut session,
            )
            .unwrap();
        printer
            .handle(
                &RunEvent::tool_result("get_weather", json!({"city": "Oslo", "temperature": "3 °C", "condition": "Snow"})),
                &mut session,
            )
            .unwrap();
        let out = printed(printer);
        assert!(out.starts_with("get_weather(\"city\":\"Oslo\")\n"));
        assert!(out.contains("Assistant: Weather in Oslo: 3 °C, Snow.\n"));
        assert!(out.contains("get_weather -> {"));
    }

    #[test]
    fn serve_args_override_config() {
        let args = ServeArgs {
            host: Some("127.0.0.1".into()),
            port: Some(9001),
            model: None,
        };
        let config = args.apply(StreamrunConfig::new().with_model("gpt-4.1"));
        assert_eq!(config.bind_addr(), "127.0.0.1:9001");
        assert_eq!(config.model(), "gpt-4.1");
    }
}
