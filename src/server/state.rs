//! Application state

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use super::task::{todo_tools, Task};
use crate::agent::Agent;
use crate::agent_loop::Runner;
use crate::demo::{demo_agent, MockApi};
use crate::provider::ResponsesTransport;
use crate::relay::RelayFrame;

/// Frames buffered for slow `/events` subscribers before they start lagging.
const EVENT_FEED_CAPACITY: usize = 1024;
/// Chained segments allowed per background task.
pub const TASK_MAX_TURNS: u32 = 100;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    runner: Runner,
    model: String,
    chat_agent: Arc<Agent>,
    task_agent: Arc<Agent>,
    /// Every task created since startup; finished tasks stay queryable and are never evicted.
    tasks: RwLock<HashMap<String, Arc<Task>>>,
    events: broadcast::Sender<RelayFrame>,
}

impl AppState {
    /// State with the demo agents on `model`, sharing one mock API.
    pub fn new(transport: Arc<dyn ResponsesTransport>, model: &str) -> Self {
        let api = Arc::new(MockApi::new());
        let chat_agent = demo_agent(model, Arc::clone(&api), Vec::new());
        let task_agent = demo_agent(model, api, todo_tools());
        Self::with_agents(transport, chat_agent, task_agent)
    }

    pub fn with_agents(
        transport: Arc<dyn ResponsesTransport>,
        chat_agent: Agent,
        task_agent: Agent,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_FEED_CAPACITY);
        Self {
            inner: Arc::new(AppStateInner {
                runner: Runner::new(transport),
                model: chat_agent.model().to_string(),
                chat_agent: Arc::new(chat_agent),
                task_agent: Arc::new(task_agent),
                tasks: RwLock::new(HashMap::new()),
                events,
            }),
        }
    }

    pub fn runner(&self) -> &Runner {
        &self.inner.runner
    }

    pub fn model(&self) -> &str {
        &self.inner.model
    }

    pub fn chat_agent(&self) -> Arc<Agent> {
        Arc::clone(&self.inner.chat_agent)
    }

    pub fn task_agent(&self) -> Arc<Agent> {
        Arc::clone(&self.inner.task_agent)
    }

    pub async fn insert_task(&self, task: Arc<Task>) {
        self.inner.tasks.write().await.insert(task.id.clone(), task);
    }

    pub async fn task(&self, id: &str) -> Option<Arc<Task>> {
        self.inner.tasks.read().await.get(id).cloned()
    }

    /// Send a frame to every `/events` subscriber. Dropped when nobody listens.
    pub fn publish(&self, frame: RelayFrame) {
        if self.inner.events.send(frame).is_err() {
            tracing::trace!("no event feed subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RelayFrame> {
        self.inner.events.subscribe()
    }
}
