//! Wire types for the Responses API.

pub mod event;
pub mod request;

pub use event::*;
pub use request::*;
