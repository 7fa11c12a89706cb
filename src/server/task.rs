//! Background tasks and the todo tools that operate on them.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;
use crate::tools::{FunctionTool, Signature, Tool, ToolArguments, ToolContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    pub text: String,
    pub done: bool,
}

/// A queued agent run. Handed to tools as the run context.
#[derive(Debug)]
pub struct Task {
    pub id: String,
    pub items: Vec<Value>,
    pub created_at: DateTime<Utc>,
    todos: Mutex<Vec<Todo>>,
    status: Mutex<TaskStatus>,
}

/// Serializable view of a [`Task`].
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub status: TaskStatus,
    pub todos: Vec<Todo>,
    pub created_at: DateTime<Utc>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Task {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            items,
            created_at: Utc::now(),
            todos: Mutex::new(Vec::new()),
            status: Mutex::new(TaskStatus::Running),
        }
    }

    pub fn status(&self) -> TaskStatus {
        *lock(&self.status)
    }

    pub fn set_status(&self, status: TaskStatus) {
        *lock(&self.status) = status;
    }

    pub fn todos(&self) -> Vec<Todo> {
        lock(&self.todos).clone()
    }

    pub fn add_todo(&self, text: &str) -> Vec<Todo> {
        let mut todos = lock(&self.todos);
        todos.push(Todo {
            text: text.to_string(),
            done: false,
        });
        todos.clone()
    }

    /// Mark the todo at `index` (0-based) done; `None` if out of range.
    pub fn complete_todo(&self, index: usize) -> Option<Vec<Todo>> {
        let mut todos = lock(&self.todos);
        todos.get_mut(index)?.done = true;
        Some(todos.clone())
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id.clone(),
            status: self.status(),
            todos: self.todos(),
            created_at: self.created_at,
        }
    }
}

/// `add_todo` and `complete_todo`, which need the task as run context.
pub fn todo_tools() -> Vec<Arc<dyn Tool>> {
    let add_todo = FunctionTool::new(
        "add_todo",
        Signature::new().required("text").with_context(),
        |args: ToolArguments, ctx: ToolContext| async move {
            let task = ctx.require::<Task>()?;
            Ok::<_, ToolError>(task.add_todo(args.get_str("text")?))
        },
    )
    .with_description("Add an item to the task's todo list.");

    let complete_todo = FunctionTool::new(
        "complete_todo",
        Signature::new().required("index").with_context(),
        |args: ToolArguments, ctx: ToolContext| async move {
            let task = ctx.require::<Task>()?;
            let index = usize::try_from(args.get_i64("index")?)
                .map_err(|_| ToolError::InvalidArguments("index must be non-negative".into()))?;
            task.complete_todo(index)
                .ok_or_else(|| ToolError::execution(format!("no todo at index {index}")))
        },
    )
    .with_description("Check off the todo at a 0-based index.");

    vec![Arc::new(add_todo), Arc::new(complete_todo)]
}
