//! Guardrail outcome type.
//!
//! A guardrail inspects the input before an agent runs and reports an
//! `GuardrailOutcome`. Any outcome with `blocked = true` stops the run.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TriageError, TriageResult};

/// The result of evaluating one guardrail against one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailOutcome {
    /// Name of the guardrail that produced this outcome.
    pub guardrail: String,
    /// Arbitrary payload produced by the guardrail (e.g. a policy judgment).
    pub info: Value,
    /// True means the enclosing run must not proceed.
    pub blocked: bool,
}

impl GuardrailOutcome {
    /// An outcome that lets the run continue.
    pub fn pass(guardrail: impl Into<String>, info: Value) -> Self {
        Self {
            guardrail: guardrail.into(),
            info,
            blocked: false,
        }
    }

    /// An outcome that stops the run.
    pub fn block(guardrail: impl Into<String>, info: Value) -> Self {
        Self {
            guardrail: guardrail.into(),
            info,
            blocked: true,
        }
    }

    /// Decode `info` as a typed value.
    ///
    /// Returns `TriageError::OutputShapeMismatch` when the payload does not
    /// deserialize into `T`.
    pub fn info_as<T: DeserializeOwned>(&self) -> TriageResult<T> {
        serde_json::from_value(self.info.clone()).map_err(|e| TriageError::OutputShapeMismatch {
            shape_id: format!("guardrail:{}", self.guardrail),
            reason: e.to_string(),
        })
    }
}
