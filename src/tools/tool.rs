//! Tool trait and closure-based tool wrapper.

use std::any::Any;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::arguments::ToolArguments;
use super::normalize::to_jsonable;
use super::types::Signature;
use crate::error::ToolError;

/// Opaque per-run value handed to tools that ask for it.
pub type RunContext = Arc<dyn Any + Send + Sync>;

/// Context passed to a tool call. Empty unless the tool's signature asks for it.
#[derive(Clone, Default)]
pub struct ToolContext {
    inner: Option<RunContext>,
}

impl ToolContext {
    pub fn new(inner: Option<RunContext>) -> Self {
        Self { inner }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    pub fn raw(&self) -> Option<&RunContext> {
        self.inner.as_ref()
    }

    /// Downcast the run context to a concrete type.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.inner.as_deref().and_then(|ctx| ctx.downcast_ref::<T>())
    }

    /// Like [`get`](Self::get) but fails with [`ToolError::MissingContext`].
    pub fn require<T: Any + Send + Sync>(&self) -> Result<&T, ToolError> {
        self.get::<T>().ok_or_else(|| {
            ToolError::MissingContext(format!(
                "expected context of type {}",
                std::any::type_name::<T>()
            ))
        })
    }
}

impl Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("present", &self.inner.is_some())
            .finish()
    }
}

/// Core tool trait. Implement it for tools that need their own state.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by.
    fn name(&self) -> &str;

    /// Human-readable description; `None` omits it from the declaration.
    fn description(&self) -> Option<&str> {
        None
    }

    fn signature(&self) -> &Signature;

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<Value, ToolError>;
}

type ToolFuture = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send>>;
type ToolHandler = dyn Fn(ToolArguments, ToolContext) -> ToolFuture + Send + Sync;

/// Closure-based tool.
///
/// Handler results only need `Serialize + Debug`; they are normalized to JSON
/// after the call. Handler errors only need `Display`.
pub struct FunctionTool {
    name: String,
    description: Option<String>,
    signature: Signature,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    /// Create a tool from an async closure.
    pub fn new<F, Fut, R, E>(name: impl Into<String>, signature: Signature, handler: F) -> Self
    where
        F: Fn(ToolArguments, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Serialize + Debug,
        E: Display,
    {
        let handler = Arc::new(handler);
        Self {
            name: name.into(),
            description: None,
            signature,
            handler: Arc::new(move |args: ToolArguments, ctx: ToolContext| -> ToolFuture {
                let fut = handler(args, ctx);
                Box::pin(async move {
                    match fut.await {
                        Ok(value) => Ok(to_jsonable(&value)),
                        Err(err) => Err(ToolError::Execution(err.to_string())),
                    }
                })
            }),
        }
    }

    /// Create a tool from a synchronous function. Calls run on the blocking pool.
    pub fn blocking<F, R, E>(name: impl Into<String>, signature: Signature, handler: F) -> Self
    where
        F: Fn(ToolArguments, ToolContext) -> Result<R, E> + Send + Sync + 'static,
        R: Serialize + Debug,
        E: Display,
    {
        let handler = Arc::new(handler);
        Self {
            name: name.into(),
            description: None,
            signature,
            handler: Arc::new(move |args: ToolArguments, ctx: ToolContext| -> ToolFuture {
                let handler = Arc::clone(&handler);
                Box::pin(async move {
                    let joined = tokio::task::spawn_blocking(move || {
                        handler(args, ctx)
                            .map(|value| to_jsonable(&value))
                            .map_err(|err| err.to_string())
                    })
                    .await;
                    match joined {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(message)) => Err(ToolError::Execution(message)),
                        Err(join_err) if join_err.is_panic() => Err(ToolError::Panicked(
                            super::dispatch::panic_message(join_err.into_panic().as_ref()),
                        )),
                        Err(join_err) => Err(ToolError::Execution(join_err.to_string())),
                    }
                })
            }),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<Value, ToolError> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("signature", &self.signature)
            .finish()
    }
}
