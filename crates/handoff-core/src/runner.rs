//! The handoff runner: guardrail-gated, delegation-routed completion.
//!
//! The runner enforces the dispatch model:
//!
//!   Guardrails → Route → [Guardrails of delegate → Route]* → Complete → Shape
//!
//! A completion is NEVER requested for an agent until every guardrail bound
//! to it has passed. The first blocking outcome aborts the run; later
//! guardrails are not evaluated. Everything runs strictly in sequence: the
//! only suspension points are guardrail checks and the completion call.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use handoff_contracts::{
    completion::CompletionRequest,
    context::RunContext,
    error::{TriageError, TriageResult},
    guardrail::GuardrailOutcome,
};

use crate::{
    agent::Agent,
    result::RunResult,
    routing::NameMatchRouter,
    traits::{CompletionService, DelegationRouter},
};

/// Drives agent runs against one completion service.
///
/// A runner holds no per-run state; each session brings its own
/// `RunContext`. All runs on one runner observe the same cancellation token,
/// and cancellation is permanent: once the token fires, every later run on
/// that runner fails with `TriageError::Cancelled`. Sessions that must be
/// cancelled independently each get their own runner, typically built with
/// `with_cancellation(parent.child_token())`.
pub struct Runner {
    completion: Arc<dyn CompletionService>,
    router: Box<dyn DelegationRouter>,
    cancel: CancellationToken,
}

impl Runner {
    /// Create a runner using name-match routing and a fresh cancellation token.
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            completion,
            router: Box::new(NameMatchRouter),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the delegation policy.
    pub fn with_router(mut self, router: Box<dyn DelegationRouter>) -> Self {
        self.router = router;
        self
    }

    /// Observe an externally owned cancellation token.
    ///
    /// Pass a child token to scope cancellation to this runner while still
    /// honouring a shutdown signal on the parent.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The token this runner aborts on. Clone it to cancel from elsewhere.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `agent` on `input` within the caller's session context.
    ///
    /// # Pipeline
    ///
    /// 1. Evaluate `agent`'s guardrails in order; the first `blocked` outcome
    ///    returns `TriageError::GuardrailBlocked`
    /// 2. Ask the router for a delegate; if one matches, evaluate its
    ///    guardrails the same way and route again from it
    /// 3. Send the resolved agent's instructions and `input` to the
    ///    completion service; failures return `TriageError::CompletionFailed`
    /// 4. Record the exchange in the context transcript
    /// 5. Coerce the text into the resolved agent's output shape
    ///
    /// The cancellation token is checked before every guardrail and before
    /// the completion, and races the in-flight completion.
    pub async fn run(
        &self,
        agent: &Agent,
        input: &str,
        ctx: &mut RunContext,
    ) -> TriageResult<RunResult> {
        debug!(
            session_id = %ctx.session_id().0,
            agent = %agent.name(),
            guardrails = agent.guardrails().len(),
            delegates = agent.delegates().len(),
            "run starting"
        );

        // ── Step 1: Guardrails of the invoked agent ──────────────────────────
        let mut outcomes = Vec::new();
        self.evaluate_guardrails(agent, input, ctx, &mut outcomes)
            .await?;

        // ── Step 2: Delegation ───────────────────────────────────────────────
        //
        // Delegates are `Arc`-built bottom-up, so the walk always terminates.
        let mut resolved = agent;
        while let Some(delegate) = self.router.route(resolved, input) {
            info!(
                from = %resolved.name(),
                to = %delegate.name(),
                "delegating"
            );
            resolved = delegate.as_ref();
            self.evaluate_guardrails(resolved, input, ctx, &mut outcomes)
                .await?;
        }

        // ── Step 3: Completion ───────────────────────────────────────────────
        let raw_output = self.complete(resolved, input).await?;

        // ── Step 4: Transcript ───────────────────────────────────────────────
        //
        // Recorded before shaping so a caller can fall back to the raw text
        // when shaping fails.
        ctx.record(resolved.name(), input, &raw_output);

        // ── Step 5: Output shaping ───────────────────────────────────────────
        let final_output = handoff_shape::coerce(&raw_output, resolved.output_shape())?;

        debug!(
            agent = %resolved.name(),
            shape = %resolved.output_shape().shape_id(),
            "run complete"
        );

        Ok(RunResult {
            agent: resolved.name().to_string(),
            raw_output,
            final_output,
            guardrail_outcomes: outcomes,
        })
    }

    /// Run with a throwaway context, for callers without session state.
    pub async fn run_once(&self, agent: &Agent, input: &str) -> TriageResult<RunResult> {
        let mut ctx = RunContext::new();
        self.run(agent, input, &mut ctx).await
    }

    async fn evaluate_guardrails(
        &self,
        agent: &Agent,
        input: &str,
        ctx: &mut RunContext,
        outcomes: &mut Vec<GuardrailOutcome>,
    ) -> TriageResult<()> {
        for guardrail in agent.guardrails() {
            self.ensure_active(agent)?;

            debug!(
                agent = %agent.name(),
                guardrail = %guardrail.name(),
                "evaluating guardrail"
            );
            let outcome = guardrail.check(self, ctx, agent, input).await?;

            if outcome.blocked {
                warn!(
                    agent = %agent.name(),
                    guardrail = %outcome.guardrail,
                    "guardrail blocked run"
                );
                return Err(TriageError::GuardrailBlocked {
                    agent: agent.name().to_string(),
                    outcome,
                });
            }
            outcomes.push(outcome);
        }
        Ok(())
    }

    async fn complete(&self, agent: &Agent, input: &str) -> TriageResult<String> {
        self.ensure_active(agent)?;

        let request = CompletionRequest::new(agent.instructions(), input);
        debug!(agent = %agent.name(), "requesting completion");

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(agent = %agent.name(), "completion abandoned on cancellation");
                return Err(self.cancelled(agent));
            }
            result = self.completion.complete(request) => result,
        };

        result.map_err(|source| {
            warn!(agent = %agent.name(), error = %source, "completion failed");
            TriageError::CompletionFailed {
                agent: agent.name().to_string(),
                source,
            }
        })
    }

    fn ensure_active(&self, agent: &Agent) -> TriageResult<()> {
        if self.cancel.is_cancelled() {
            return Err(self.cancelled(agent));
        }
        Ok(())
    }

    fn cancelled(&self, agent: &Agent) -> TriageError {
        TriageError::Cancelled {
            agent: agent.name().to_string(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
