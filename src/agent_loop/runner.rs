//! Streaming run state machine: segments, tool hand-offs, and recovery.

use std::any::Any;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;
use tracing::{debug, info, warn, Instrument};

use super::bridge::{event_bridge, EventSender, RunEventStream};
use super::events::RunEvent;
use super::pending::PendingCalls;
use crate::agent::Agent;
use crate::error::RunError;
use crate::provider::{ResponseEventStream, ResponsesTransport};
use crate::tools::dispatch::ToolDispatcher;
use crate::tools::schema::FunctionToolDeclaration;
use crate::tools::tool::RunContext;
use crate::tools::ToolArguments;
use crate::types::{
    FunctionCallOutput, OutputItem, RawResponseEvent, ResponseEvent, ResponsesRequest, RunInput,
};
use crate::util::retry::{ChainRetryPolicy, RejectionKind, SegmentKind};

/// Lifecycle of a run's producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Initial,
    Streaming,
    Chaining,
    RetryBackoff,
    Done,
}

/// Starts runs against a Responses transport.
#[derive(Clone)]
pub struct Runner {
    transport: Arc<dyn ResponsesTransport>,
}

impl Runner {
    pub fn new(transport: Arc<dyn ResponsesTransport>) -> Self {
        Self { transport }
    }

    /// Prepare a streamed run. Nothing is sent until [`Run::stream_events`].
    pub fn run_streamed(&self, agent: Arc<Agent>, input: impl Into<RunInput>) -> Run {
        Run {
            transport: Arc::clone(&self.transport),
            agent,
            input: input.into(),
            previous_response_id: None,
            conversation_id: None,
            context: None,
            max_turns: None,
            retry_policy: ChainRetryPolicy::default(),
        }
    }
}

/// One logical run: an agent, its input, and continuity identifiers.
pub struct Run {
    transport: Arc<dyn ResponsesTransport>,
    agent: Arc<Agent>,
    input: RunInput,
    previous_response_id: Option<String>,
    conversation_id: Option<String>,
    context: Option<RunContext>,
    max_turns: Option<u32>,
    retry_policy: ChainRetryPolicy,
}

impl Run {
    /// Continue from an earlier response. Ignored when a conversation id is set.
    pub fn previous_response_id(mut self, id: impl Into<String>) -> Self {
        self.previous_response_id = Some(id.into()).filter(|id: &String| !id.is_empty());
        self
    }

    pub fn conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into()).filter(|id: &String| !id.is_empty());
        self
    }

    /// Value handed to tools whose signature asks for the run context.
    pub fn context<T: Any + Send + Sync>(mut self, context: T) -> Self {
        self.context = Some(Arc::new(context));
        self
    }

    pub fn shared_context(mut self, context: RunContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Bound the number of chained segments. Unbounded by default.
    pub fn max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn retry_policy(mut self, policy: ChainRetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Spawn the producer and return the consumer stream.
    ///
    /// Must be called inside a tokio runtime. Dropping the stream cancels the run at
    /// its next await point on the remote stream.
    pub fn stream_events(self) -> RunEventStream {
        let (tx, rx) = event_bridge();
        let span = tracing::info_span!("run", agent = %self.agent.name(), model = %self.agent.model());
        let driver = RunDriver::new(self, tx);
        tokio::spawn(driver.drive().instrument(span));
        rx
    }
}

impl std::fmt::Debug for Run {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("agent", &self.agent.name())
            .field("input", &self.input)
            .field("previous_response_id", &self.previous_response_id)
            .field("conversation_id", &self.conversation_id)
            .field("has_context", &self.context.is_some())
            .field("max_turns", &self.max_turns)
            .finish()
    }
}

/// How one segment ended.
enum SegmentEnd {
    /// A tool ran; the next segment carries its output.
    HandOff {
        response_id: Option<String>,
        output: FunctionCallOutput,
    },
    Completed,
    /// Remote stream ended without `response.completed`, or retries ran out.
    Ended,
    Cancelled,
}

struct RunDriver {
    transport: Arc<dyn ResponsesTransport>,
    agent: Arc<Agent>,
    input: RunInput,
    declarations: Vec<FunctionToolDeclaration>,
    dispatcher: ToolDispatcher,
    tx: EventSender,
    previous_response_id: Option<String>,
    conversation_id: Option<String>,
    max_turns: Option<u32>,
    retry_policy: ChainRetryPolicy,
    state: RunState,
}

impl RunDriver {
    fn new(run: Run, tx: EventSender) -> Self {
        let declarations = run.agent.tool_declarations();
        let dispatcher = ToolDispatcher::new(run.agent.tools().to_vec(), run.context);
        Self {
            transport: run.transport,
            agent: run.agent,
            input: run.input,
            declarations,
            dispatcher,
            tx,
            previous_response_id: run.previous_response_id,
            conversation_id: run.conversation_id,
            max_turns: run.max_turns,
            retry_policy: run.retry_policy,
            state: RunState::Initial,
        }
    }

    async fn drive(mut self) {
        if let Err(err) = self.run().await {
            warn!(error = %err, category = %err.category(), "run failed");
            self.tx.send_error(err);
        }
        self.transition(RunState::Done);
        self.tx.send(RunEvent::closed());
    }

    fn transition(&mut self, next: RunState) {
        if self.state != next {
            info!(from = %self.state, to = %next, "run state");
            self.state = next;
        }
    }

    async fn run(&mut self) -> Result<(), RunError> {
        let mut end = self.initial_segment().await?;
        let mut turns: u32 = 0;
        loop {
            let (response_id, output) = match end {
                SegmentEnd::HandOff {
                    response_id,
                    output,
                } => (response_id, output),
                SegmentEnd::Completed | SegmentEnd::Ended | SegmentEnd::Cancelled => return Ok(()),
            };
            turns += 1;
            if let Some(max_turns) = self.max_turns {
                if turns > max_turns {
                    warn!(max_turns, "turn limit reached, ending run");
                    return Ok(());
                }
            }
            self.transition(RunState::Chaining);
            let request = self.chained_request(response_id, output);
            end = self.chained_segment(&request).await?;
        }
    }

    async fn initial_segment(&mut self) -> Result<SegmentEnd, RunError> {
        let mut continuation_dropped = false;
        loop {
            let request = self.initial_request();
            match self.open(&request).await {
                None => return Ok(SegmentEnd::Cancelled),
                Some(Ok(stream)) => return self.consume(stream).await,
                Some(Err(err)) => match RejectionKind::classify(&err, SegmentKind::Initial) {
                    RejectionKind::InvalidContinuation if !continuation_dropped => {
                        warn!(error = %err, "continuation rejected, restarting without previous response id");
                        self.previous_response_id = None;
                        continuation_dropped = true;
                    }
                    _ => return Err(err),
                },
            }
        }
    }

    async fn chained_segment(&mut self, request: &ResponsesRequest) -> Result<SegmentEnd, RunError> {
        let mut attempt: u32 = 0;
        loop {
            match self.open(request).await {
                None => return Ok(SegmentEnd::Cancelled),
                Some(Ok(stream)) => return self.consume(stream).await,
                Some(Err(err)) => match RejectionKind::classify(&err, SegmentKind::Chained) {
                    RejectionKind::ChainRace => {
                        attempt += 1;
                        if !self.retry_policy.allows(attempt) {
                            warn!(retries = attempt - 1, error = %err, "chained segment still rejected, ending run");
                            return Ok(SegmentEnd::Ended);
                        }
                        self.transition(RunState::RetryBackoff);
                        let delay = self.retry_policy.delay(attempt);
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "previous response not visible yet, retrying"
                        );
                        tokio::select! {
                            _ = self.tx.closed() => return Ok(SegmentEnd::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                    _ => return Err(err),
                },
            }
        }
    }

    /// Open a segment unless the consumer is already gone.
    async fn open(&self, request: &ResponsesRequest) -> Option<Result<ResponseEventStream, RunError>> {
        tokio::select! {
            biased;
            _ = self.tx.closed() => None,
            opened = self.transport.open_stream(request) => Some(opened),
        }
    }

    async fn consume(&mut self, mut stream: ResponseEventStream) -> Result<SegmentEnd, RunError> {
        self.transition(RunState::Streaming);
        let mut pending = PendingCalls::new();
        let mut response_id: Option<String> = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.tx.closed() => {
                    debug!("consumer dropped, abandoning segment");
                    return Ok(SegmentEnd::Cancelled);
                }
                next = stream.next() => next,
            };
            let Some(item) = next else {
                debug!("segment ended without response.completed");
                return Ok(SegmentEnd::Ended);
            };
            let raw = item?;

            if response_id.is_none() {
                response_id = raw.event().response().map(|r| r.id.clone());
            }
            self.track(&raw, &mut pending);
            let completed = raw.event().is_completed();
            let finished_call = match raw.event() {
                ResponseEvent::FunctionCallArgumentsDone { item_id, arguments } => {
                    Some((item_id.clone(), arguments.clone()))
                }
                _ => None,
            };

            debug!(event_type = raw.event_type(), "forwarding event");
            if !self.tx.send(RunEvent::response(raw)) {
                return Ok(SegmentEnd::Cancelled);
            }
            if completed {
                return Ok(SegmentEnd::Completed);
            }
            if let Some((item_id, fallback)) = finished_call {
                let output = self
                    .finish_call(&mut pending, item_id.as_deref(), fallback.as_deref())
                    .await;
                if let Some(output) = output {
                    return Ok(SegmentEnd::HandOff {
                        response_id,
                        output,
                    });
                }
            }
        }
    }

    fn track(&mut self, raw: &RawResponseEvent, pending: &mut PendingCalls) {
        match raw.event() {
            ResponseEvent::Created { response } => {
                if let Some(conversation_id) = response.conversation_id() {
                    if self.conversation_id.as_deref() != Some(conversation_id) {
                        debug!(conversation_id, "conversation id recorded");
                        self.conversation_id = Some(conversation_id.to_string());
                    }
                }
            }
            ResponseEvent::OutputItemAdded {
                item:
                    OutputItem::FunctionCall {
                        id: Some(item_id),
                        call_id,
                        name,
                        arguments,
                    },
                ..
            } => {
                debug!(item_id = %item_id, name = name.as_deref().unwrap_or(""), "function call announced");
                pending.open(item_id, name.clone(), call_id.clone(), arguments.clone());
            }
            ResponseEvent::FunctionCallArgumentsDelta {
                item_id: Some(item_id),
                delta,
            } => pending.append(item_id, delta),
            _ => {}
        }
    }

    /// Dispatch a finished call. `None` means the call is skipped and streaming continues.
    async fn finish_call(
        &self,
        pending: &mut PendingCalls,
        item_id: Option<&str>,
        fallback_arguments: Option<&str>,
    ) -> Option<FunctionCallOutput> {
        let Some(call) = item_id.and_then(|id| pending.take(id)) else {
            debug!(item_id = item_id.unwrap_or(""), "finished call was never announced, skipping");
            return None;
        };
        let Some((name, call_id)) = call.identity() else {
            debug!("finished call has no name or call id, skipping");
            return None;
        };
        let Some(tool) = self.dispatcher.find(name).cloned() else {
            debug!(tool = name, "no registered tool for call, skipping");
            return None;
        };

        let text = if call.arguments.trim().is_empty() {
            fallback_arguments.unwrap_or("{}")
        } else {
            call.arguments.as_str()
        };
        let args = ToolArguments::parse(text);

        info!(tool = name, call_id, "dispatching tool");
        let result = self.dispatcher.dispatch(tool.as_ref(), args).await;
        self.tx.send(RunEvent::tool_result(name, result.clone()));
        Some(FunctionCallOutput::new(call_id, &result))
    }

    fn base_request(&self, input: RunInput) -> ResponsesRequest {
        let mut request = ResponsesRequest::new(self.agent.model(), input);
        request.tools = self.declarations.clone();
        request.reasoning = self.agent.reasoning().cloned();
        request
    }

    fn initial_request(&self) -> ResponsesRequest {
        let mut request = self.base_request(self.input.clone());
        request.instructions = self.agent.instructions().map(str::to_string);
        match &self.conversation_id {
            Some(conversation_id) => request.conversation = Some(conversation_id.clone()),
            None => request.previous_response_id = self.previous_response_id.clone(),
        }
        request
    }

    fn chained_request(&self, response_id: Option<String>, output: FunctionCallOutput) -> ResponsesRequest {
        let item = json!({
            "type": output.kind,
            "call_id": output.call_id,
            "output": output.output,
        });
        let mut request = self.base_request(RunInput::Items(vec![item]));
        request.previous_response_id = response_id;
        request.conversation = self.conversation_id.clone();
        request
    }
}
