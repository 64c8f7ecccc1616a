//! Agent definitions.
//!
//! An `Agent` is an immutable role: a name, the instructions sent to the
//! completion service, the shape its output must take, and the delegates and
//! guardrails bound to it. Agents are built once at setup with
//! `Agent::builder` and shared by `Arc` for the lifetime of the session.

use std::{fmt, sync::Arc};

use handoff_contracts::{
    error::{TriageError, TriageResult},
    shape::OutputShape,
};

use crate::traits::InputGuardrail;

pub struct Agent {
    name: String,
    instructions: String,
    output_shape: OutputShape,
    handoff_description: Option<String>,
    delegates: Vec<Arc<Agent>>,
    guardrails: Vec<Arc<dyn InputGuardrail>>,
}

impl Agent {
    /// Start building an agent. Every other field has a safe default.
    pub fn builder(name: impl Into<String>, instructions: impl Into<String>) -> AgentBuilder {
        AgentBuilder {
            agent: Agent {
                name: name.into(),
                instructions: instructions.into(),
                output_shape: OutputShape::Text,
                handoff_description: None,
                delegates: Vec::new(),
                guardrails: Vec::new(),
            },
        }
    }

    /// Identifier used for display and as the delegation match key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn output_shape(&self) -> &OutputShape {
        &self.output_shape
    }

    /// When to hand off to this agent. Documentation only; never enforced.
    pub fn handoff_description(&self) -> Option<&str> {
        self.handoff_description.as_deref()
    }

    /// Delegates in the order routing tests them.
    pub fn delegates(&self) -> &[Arc<Agent>] {
        &self.delegates
    }

    /// Guardrails in the order they are evaluated.
    pub fn guardrails(&self) -> &[Arc<dyn InputGuardrail>] {
        &self.guardrails
    }

    /// Check that no name repeats along any delegation path.
    ///
    /// `Arc`-built agents cannot form a structural cycle, but two distinct
    /// agents sharing a name would route as if they did. Returns
    /// `TriageError::DelegationCycle` with the offending path.
    pub fn validate_delegation(&self) -> TriageResult<()> {
        fn walk(agent: &Agent, path: &mut Vec<String>) -> TriageResult<()> {
            if path.iter().any(|seen| seen == &agent.name) {
                let mut cycle = path.clone();
                cycle.push(agent.name.clone());
                return Err(TriageError::DelegationCycle { path: cycle });
            }
            path.push(agent.name.clone());
            for delegate in &agent.delegates {
                walk(delegate, path)?;
            }
            path.pop();
            Ok(())
        }

        walk(self, &mut Vec::new())
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Agent: {}>", self.name)
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("output_shape", &self.output_shape.shape_id())
            .field(
                "delegates",
                &self.delegates.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .field(
                "guardrails",
                &self.guardrails.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Builder returned by `Agent::builder`. Building never fails.
pub struct AgentBuilder {
    agent: Agent,
}

impl AgentBuilder {
    pub fn output_shape(mut self, shape: OutputShape) -> Self {
        self.agent.output_shape = shape;
        self
    }

    pub fn handoff_description(mut self, description: impl Into<String>) -> Self {
        self.agent.handoff_description = Some(description.into());
        self
    }

    /// Append a delegate; routing tests delegates in the order added.
    pub fn delegate(mut self, delegate: Arc<Agent>) -> Self {
        self.agent.delegates.push(delegate);
        self
    }

    /// Append a guardrail; guardrails run in the order added.
    pub fn guardrail(mut self, guardrail: Arc<dyn InputGuardrail>) -> Self {
        self.agent.guardrails.push(guardrail);
        self
    }

    pub fn build(self) -> Agent {
        self.agent
    }
}
