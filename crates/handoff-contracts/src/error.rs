//! Runtime error types for the handoff dispatch pipeline.
//!
//! All fallible operations return `TriageResult<T>`. Every variant is a
//! distinguished kind so callers branch on the variant, never on the message.

use thiserror::Error;

use crate::guardrail::GuardrailOutcome;

/// Failures reported by a completion service.
///
/// The runner never retries on any of these; retry policy belongs to the
/// service implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// The request could not reach the service (DNS, TLS, connection reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service did not answer within its configured deadline.
    #[error("completion request timed out")]
    Timeout,

    /// The service refused the request because a rate limit or quota was hit.
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The service answered, but the body carried no usable text.
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

/// The unified error type for the handoff runtime.
#[derive(Debug, Error)]
pub enum TriageError {
    /// A guardrail bound to the agent returned `blocked = true`.
    ///
    /// Carries the triggering outcome so the caller can present its `info`.
    #[error("guardrail '{}' blocked agent '{agent}'", outcome.guardrail)]
    GuardrailBlocked {
        agent: String,
        outcome: GuardrailOutcome,
    },

    /// The completion service failed or returned an unusable response.
    #[error("completion failed for agent '{agent}': {source}")]
    CompletionFailed {
        agent: String,
        #[source]
        source: CompletionError,
    },

    /// Raw text could not be coerced into the declared or requested shape.
    #[error("output does not match shape '{shape_id}': {reason}")]
    OutputShapeMismatch { shape_id: String, reason: String },

    /// An agent's delegate graph refers back to itself.
    ///
    /// Raised while loading or validating configuration, never mid-run.
    #[error("delegation cycle detected: {}", path.join(" -> "))]
    DelegationCycle { path: Vec<String> },

    /// The run observed an external cancellation signal.
    #[error("run cancelled before agent '{agent}' completed")]
    Cancelled { agent: String },

    /// A roster or client configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl TriageError {
    /// Return true if this error is a guardrail block rather than a failure.
    pub fn is_blocked(&self) -> bool {
        matches!(self, TriageError::GuardrailBlocked { .. })
    }
}

/// Convenience alias used throughout the handoff crates.
pub type TriageResult<T> = Result<T, TriageError>;
