//! The tutor's agents, built in code.
//!
//! Four agents: a homework judge, two subject tutors and a triage agent that
//! routes to the tutors behind a homework policy check. `roster/tutor.toml`
//! describes the same setup declaratively; see [`load_roster`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use handoff_contracts::{error::TriageResult, shape::StructuredOutput};
use handoff_core::Agent;
use handoff_policy::{AgentRoster, PolicyCheckGuardrail};

pub const GUARDRAIL_CHECK: &str = "Guardrail check";
pub const MATH_TUTOR: &str = "Math Tutor";
pub const HISTORY_TUTOR: &str = "History Tutor";
pub const TRIAGE_AGENT: &str = "Triage Agent";

/// Name of the homework policy-check guardrail.
pub const HOMEWORK_GUARDRAIL: &str = "homework";

pub const GUARDRAIL_INSTRUCTIONS: &str = "Check if the user is asking about homework, academic subjects, or general knowledge questions. Be generous: treat simple educational or philosophical questions as homework.";
pub const MATH_INSTRUCTIONS: &str = "You provide help with math problems. Explain your reasoning at each step and include examples.";
pub const HISTORY_INSTRUCTIONS: &str = "You provide assistance with historical queries. Explain important events and context clearly.";
pub const TRIAGE_INSTRUCTIONS: &str = "You determine which agent to use based on the user's homework question.";

/// Declarative form of [`triage_agent`].
pub const TUTOR_ROSTER: &str = include_str!("../roster/tutor.toml");

/// The homework judge's verdict on one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeworkOutput {
    pub is_homework: bool,
    pub reasoning: String,
}

impl StructuredOutput for HomeworkOutput {
    const SHAPE_ID: &'static str = "homework-judgment-v1";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "required": ["is_homework", "reasoning"],
            "properties": {
                "is_homework": { "type": "boolean" },
                "reasoning": { "type": "string" }
            }
        })
    }
}

pub fn guardrail_agent() -> Arc<Agent> {
    Arc::new(
        Agent::builder(GUARDRAIL_CHECK, GUARDRAIL_INSTRUCTIONS)
            .output_shape(HomeworkOutput::shape())
            .build(),
    )
}

pub fn math_tutor() -> Arc<Agent> {
    Arc::new(
        Agent::builder(MATH_TUTOR, MATH_INSTRUCTIONS)
            .handoff_description("Specialist agent for math questions")
            .build(),
    )
}

pub fn history_tutor() -> Arc<Agent> {
    Arc::new(
        Agent::builder(HISTORY_TUTOR, HISTORY_INSTRUCTIONS)
            .handoff_description("Specialist agent for historical questions")
            .build(),
    )
}

/// Gate on the judge's `is_homework` field.
pub fn homework_guardrail() -> PolicyCheckGuardrail {
    PolicyCheckGuardrail::new(HOMEWORK_GUARDRAIL, guardrail_agent(), "is_homework")
}

/// The entry agent: homework-gated, delegating to History then Math.
pub fn triage_agent() -> Arc<Agent> {
    Arc::new(
        Agent::builder(TRIAGE_AGENT, TRIAGE_INSTRUCTIONS)
            .delegate(history_tutor())
            .delegate(math_tutor())
            .guardrail(Arc::new(homework_guardrail()))
            .build(),
    )
}

/// Load the bundled roster.
pub fn load_roster() -> TriageResult<AgentRoster> {
    AgentRoster::from_toml_str(TUTOR_ROSTER)
}
