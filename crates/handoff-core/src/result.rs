//! The value returned by a successful run.

use handoff_contracts::{
    error::TriageResult,
    guardrail::GuardrailOutcome,
    shape::{FinalOutput, OutputShape, StructuredOutput},
};

/// Output of one `Runner::run`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Name of the agent that produced the output, after delegation.
    pub agent: String,
    /// Text exactly as the completion service returned it.
    pub raw_output: String,
    /// `raw_output` coerced into the resolved agent's declared shape.
    pub final_output: FinalOutput,
    /// Every guardrail outcome evaluated during the run, in evaluation order.
    pub guardrail_outcomes: Vec<GuardrailOutcome>,
}

impl RunResult {
    /// Re-shape `raw_output` against an explicitly requested shape.
    ///
    /// Independent of the agent's declared shape, so a caller can read a
    /// structured judgment out of any run.
    pub fn as_shape(&self, shape: &OutputShape) -> TriageResult<FinalOutput> {
        handoff_shape::coerce(&self.raw_output, shape)
    }

    /// Shape `raw_output` as `T` and deserialize it.
    pub fn final_output_as<T: StructuredOutput>(&self) -> TriageResult<T> {
        self.as_shape(&T::shape())?.into_typed()
    }

    /// Display text for the final output.
    pub fn display_text(&self) -> String {
        self.final_output.to_string()
    }
}
