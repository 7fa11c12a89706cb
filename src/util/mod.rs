//! Utility modules: chained-segment retry.

pub mod retry;

pub use retry::{ChainRetryPolicy, RejectionKind, SegmentKind};
