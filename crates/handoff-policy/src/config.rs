//! Roster configuration schema.
//!
//! A `RosterConfig` is deserialized from TOML and declares the output shapes,
//! guardrails and agents of one deployment. Agents refer to shapes, delegates
//! and guardrails by name; the loader resolves those names when it builds the
//! roster.
//!
//! Example:
//! ```toml
//! [[shapes]]
//! id = "homework-judgment-v1"
//! json_schema = { type = "object", required = ["is_homework", "reasoning"] }
//!
//! [[guardrails]]
//! name = "homework"
//! kind = "policy-check"
//! policy_agent = "Guardrail check"
//! allow_field = "is_homework"
//!
//! [[agents]]
//! name = "Guardrail check"
//! instructions = "Check if the user is asking about homework."
//! output = "homework-judgment-v1"
//!
//! [[agents]]
//! name = "Triage Agent"
//! instructions = "You determine which agent to use."
//! delegates = ["History Tutor", "Math Tutor"]
//! guardrails = ["homework"]
//! ```

use serde::{Deserialize, Serialize};

/// How a declared guardrail is implemented.
///
/// Expressed in TOML as kebab-case: `kind = "policy-check"` or `kind = "custom"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuardrailKind {
    /// Built by the loader: runs `policy_agent` and reads `allow_field`.
    PolicyCheck,
    /// Supplied by the host through `RosterLoader::register_guardrail`.
    Custom,
}

/// A named structured output shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeSpec {
    /// Identifier agents reference in their `output` field.
    pub id: String,
    /// JSON Schema document, written as a TOML table.
    pub json_schema: serde_json::Value,
}

/// A named guardrail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailSpec {
    /// Identifier agents reference in their `guardrails` list.
    pub name: String,

    pub kind: GuardrailKind,

    /// Mandatory for `policy-check`: the agent whose judgment gates the run.
    pub policy_agent: Option<String>,

    /// Mandatory for `policy-check`: the boolean judgment field that must be
    /// `true` for the run to proceed.
    pub allow_field: Option<String>,
}

/// A single agent loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Unique name; also the delegation match key.
    pub name: String,

    /// System instructions sent verbatim to the completion service.
    pub instructions: String,

    /// Documentation of when to hand off to this agent.
    pub handoff_description: Option<String>,

    /// Shape id from `[[shapes]]`. Absent means free text.
    pub output: Option<String>,

    /// Delegate agent names, in routing order.
    #[serde(default)]
    pub delegates: Vec<String>,

    /// Guardrail names, in evaluation order.
    #[serde(default)]
    pub guardrails: Vec<String>,
}

/// The top-level structure deserialized from a TOML roster file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub shapes: Vec<ShapeSpec>,

    #[serde(default)]
    pub guardrails: Vec<GuardrailSpec>,

    /// Agents in declaration order.
    pub agents: Vec<AgentSpec>,
}
