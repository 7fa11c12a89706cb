//! Streaming run orchestration: events, bridge, pending calls, and the run loop.

pub mod bridge;
pub mod events;
pub mod pending;
pub mod runner;

pub use bridge::{event_bridge, EventSender, RunEventStream};
pub use events::*;
pub use pending::{PendingCall, PendingCalls};
pub use runner::{Run, RunState, Runner};
