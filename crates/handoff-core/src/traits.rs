//! Core trait definitions for the handoff dispatch pipeline.
//!
//! These three traits are the seams of the runtime:
//!
//! - `CompletionService`: the external text generator (untrusted, fallible)
//! - `InputGuardrail`:    a gate evaluated before an agent runs
//! - `DelegationRouter`:  picks which delegate, if any, answers the input
//!
//! The `Runner` wires them together. A completion is never requested for an
//! agent until every guardrail bound to it has passed.

use std::sync::Arc;

use async_trait::async_trait;

use handoff_contracts::{
    completion::CompletionRequest,
    context::RunContext,
    error::{CompletionError, TriageResult},
    guardrail::GuardrailOutcome,
};

use crate::{agent::Agent, runner::Runner};

/// A text-completion backend.
///
/// Implementations own transport, timeouts and any retry policy. The runner
/// calls `complete` at most once per resolved agent and never retries.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate text for the given system instructions and user text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// A check evaluated before an agent produces output.
///
/// Guardrails hold no per-run state; everything they need lives in the
/// `RunContext`. A guardrail may perform a nested `runner.run(...)` (for
/// example to ask a policy agent for a judgment). That nested run shares the
/// same context and cancellation signal.
#[async_trait]
pub trait InputGuardrail: Send + Sync {
    /// Stable name reported in outcomes and logs.
    fn name(&self) -> &str;

    /// Inspect `input` before `agent` runs.
    ///
    /// Returning an outcome with `blocked = true` aborts the run with
    /// `TriageError::GuardrailBlocked`. Returning `Err` aborts it with that
    /// error.
    async fn check(
        &self,
        runner: &Runner,
        ctx: &mut RunContext,
        agent: &Agent,
        input: &str,
    ) -> TriageResult<GuardrailOutcome>;
}

/// Chooses the delegate that should answer `input` instead of `agent`.
///
/// Returning `None` means `agent` answers the request itself.
pub trait DelegationRouter: Send + Sync {
    fn route<'a>(&self, agent: &'a Agent, input: &str) -> Option<&'a Arc<Agent>>;
}
