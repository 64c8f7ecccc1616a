//! Policy-check guardrail.
//!
//! `PolicyCheckGuardrail` asks a policy agent for a structured judgment about
//! the input through a nested run, then reads one boolean field of that
//! judgment. A `false` judgment blocks the run unless the caller has set the
//! context's bypass flag; the judgment is reported either way.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use handoff_contracts::{
    context::RunContext,
    error::{TriageError, TriageResult},
    guardrail::GuardrailOutcome,
    shape::{FinalOutput, OutputShape},
};
use handoff_core::{Agent, InputGuardrail, Runner};

/// Gates a run on a policy agent's boolean judgment.
pub struct PolicyCheckGuardrail {
    name: String,
    policy_agent: Arc<Agent>,
    allow_field: String,
}

impl PolicyCheckGuardrail {
    /// `allow_field` names the boolean in the judgment that must be `true`.
    pub fn new(
        name: impl Into<String>,
        policy_agent: Arc<Agent>,
        allow_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            policy_agent,
            allow_field: allow_field.into(),
        }
    }

    pub fn policy_agent(&self) -> &Arc<Agent> {
        &self.policy_agent
    }

    pub fn allow_field(&self) -> &str {
        &self.allow_field
    }

    /// Context key under which the latest judgment is stored.
    pub fn context_key(&self) -> String {
        format!("guardrail.{}", self.name)
    }

    /// The shape the judgment is read with.
    ///
    /// A policy agent that declares no structured shape still has its reply
    /// read as a JSON object, without schema constraints.
    fn judgment_shape(&self) -> OutputShape {
        match self.policy_agent.output_shape() {
            OutputShape::Structured(_) => self.policy_agent.output_shape().clone(),
            OutputShape::Text => {
                OutputShape::structured(format!("{}-judgment", self.name), Value::Null)
            }
        }
    }
}

#[async_trait]
impl InputGuardrail for PolicyCheckGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(
        &self,
        runner: &Runner,
        ctx: &mut RunContext,
        agent: &Agent,
        input: &str,
    ) -> TriageResult<GuardrailOutcome> {
        debug!(
            guardrail = %self.name,
            agent = %agent.name(),
            policy_agent = %self.policy_agent.name(),
            "requesting policy judgment"
        );

        let shape = self.judgment_shape();
        let result = runner.run(&self.policy_agent, input, ctx).await?;
        let FinalOutput::Structured { value: judgment, .. } = result.as_shape(&shape)? else {
            return Err(TriageError::OutputShapeMismatch {
                shape_id: shape.shape_id().to_string(),
                reason: "judgment was not structured".to_string(),
            });
        };

        let allowed = judgment
            .get(&self.allow_field)
            .and_then(Value::as_bool)
            .ok_or_else(|| TriageError::OutputShapeMismatch {
                shape_id: shape.shape_id().to_string(),
                reason: format!("judgment has no boolean field '{}'", self.allow_field),
            })?;

        ctx.insert(self.context_key(), judgment.clone());

        let bypass = ctx.bypass_guardrails();
        if !allowed && bypass {
            info!(
                guardrail = %self.name,
                agent = %agent.name(),
                "policy judgment failed; bypass requested, not blocking"
            );
        }

        Ok(GuardrailOutcome {
            guardrail: self.name.clone(),
            info: judgment,
            blocked: !allowed && !bypass,
        })
    }
}
