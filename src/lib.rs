//! streamrun: streaming tool-calling runs over the OpenAI Responses API.
//!
//! A run sends the agent's input, relays every remote event to the caller, executes
//! function calls against registered tools as their arguments finish streaming, and
//! chains a follow-up response with the tool output until the model completes.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use streamrun::prelude::*;
//!
//! # async fn example() -> streamrun::error::Result<()> {
//! let config = StreamrunConfig::load()?;
//! let transport = Arc::new(OpenAiResponsesTransport::from_config(&config)?);
//! let agent = Agent::builder().name("assistant").model(config.model()).build();
//!
//! let mut events = Runner::new(transport)
//!     .run_streamed(Arc::new(agent), "Hello!")
//!     .stream_events();
//! while let Some(event) = events.next().await {
//!     println!("{}", event?.data.event_type());
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod agent_loop;
pub mod config;
pub mod demo;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod relay;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;
