//! Classification and backoff for rejected response segments.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::error::RunError;

/// Which kind of segment a request opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SegmentKind {
    /// First segment of a run, carrying the caller's input.
    Initial,
    /// Continuation carrying `function_call_output` items.
    Chained,
}

/// How a run reacts to a failed `open_stream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RejectionKind {
    /// The caller-supplied continuation id is unusable: drop it and retry once.
    InvalidContinuation,
    /// The just-finished response is not yet visible server-side: back off and retry.
    ChainRace,
    /// Anything else ends the run with an error.
    Fatal,
}

fn continuation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"previous[ _]response").expect("valid continuation pattern"))
}

fn chain_race_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"previous[ _]response|not found").expect("valid chain race pattern")
    })
}

impl RejectionKind {
    /// Classify a request rejection. Only bad-request (400) rejections are ever retried.
    pub fn classify(error: &RunError, segment: SegmentKind) -> Self {
        let Some(message) = error.bad_request_message() else {
            return Self::Fatal;
        };
        let message = message.to_lowercase();
        match segment {
            SegmentKind::Initial if continuation_pattern().is_match(&message) => {
                Self::InvalidContinuation
            }
            SegmentKind::Chained if chain_race_pattern().is_match(&message) => Self::ChainRace,
            _ => Self::Fatal,
        }
    }
}

/// Linear backoff for chained segments that race the previous response's persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRetryPolicy {
    /// Retries allowed per hand-off before the run ends gracefully.
    pub max_retries: u32,
    /// Delay unit; attempt `n` waits `n * backoff_step`.
    pub backoff_step: Duration,
}

impl Default for ChainRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_step: Duration::from_millis(250),
        }
    }
}

impl ChainRetryPolicy {
    pub fn new(max_retries: u32, backoff_step: Duration) -> Self {
        Self {
            max_retries,
            backoff_step,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }

    /// Whether retry number `attempt` (1-based) is still allowed.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_continuation_only_on_initial_segment() {
        let err = RunError::api(400, "Previous response with id 'resp_x' not found.");
        assert_eq!(
            RejectionKind::classify(&err, SegmentKind::Initial),
            RejectionKind::InvalidContinuation
        );
        assert_eq!(
            RejectionKind::classify(&err, SegmentKind::Chained),
            RejectionKind::ChainRace
        );
    }

    #[test]
    fn parameter_name_counts_as_continuation() {
        let err = RunError::api(400, "Invalid 'previous_response_id': expected resp_ prefix");
        assert_eq!(
            RejectionKind::classify(&err, SegmentKind::Initial),
            RejectionKind::InvalidContinuation
        );
    }

    #[test]
    fn not_found_alone_is_only_a_race_when_chained() {
        let err = RunError::api(400, "Item NOT FOUND");
        assert_eq!(RejectionKind::classify(&err, SegmentKind::Initial), RejectionKind::Fatal);
        assert_eq!(
            RejectionKind::classify(&err, SegmentKind::Chained),
            RejectionKind::ChainRace
        );
    }

    #[test]
    fn other_statuses_are_fatal() {
        let err = RunError::api(404, "previous response not found");
        assert_eq!(RejectionKind::classify(&err, SegmentKind::Chained), RejectionKind::Fatal);
        let err = RunError::Stream("previous response".into());
        assert_eq!(RejectionKind::classify(&err, SegmentKind::Initial), RejectionKind::Fatal);
    }

    #[test]
    fn delay_is_linear() {
        let policy = ChainRetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_millis(250));
        assert_eq!(policy.delay(3), Duration::from_millis(750));
        assert!(policy.allows(3));
        assert!(!policy.allows(4));
    }
}
