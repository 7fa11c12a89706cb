//! Agent definitions.

pub mod agent;

pub use agent::{Agent, ModelSettings};
