//! Shaping engine: raw completion text → `FinalOutput`.
//!
//! `coerce` is a pure function of its inputs, so shaping the same text with
//! the same shape always yields equal values.
//!
//! Structured shapes are handled in two phases:
//!
//! 1. **Extraction**: `extract_json` narrows the raw text to a JSON object.
//!    Completion services often wrap JSON in a fenced code block or add a
//!    sentence of prose around it; both are tolerated.
//! 2. **Validation**: the parsed value is checked against the shape's JSON
//!    Schema. All schema violations are collected into a single
//!    `OutputShapeMismatch` so the caller sees the full failure set at once.

use serde_json::Value;
use tracing::{debug, warn};

use handoff_contracts::{
    error::{TriageError, TriageResult},
    shape::{FinalOutput, OutputShape, StructuredShape},
};

/// Coerce `raw` into `shape`.
///
/// `OutputShape::Text` wraps the text verbatim and never fails.
/// `OutputShape::Structured` fails with `OutputShapeMismatch` when no JSON
/// object can be found, when it does not parse, or when it violates the
/// schema.
pub fn coerce(raw: &str, shape: &OutputShape) -> TriageResult<FinalOutput> {
    let structured = match shape {
        OutputShape::Text => return Ok(FinalOutput::Text(raw.to_string())),
        OutputShape::Structured(structured) => structured,
    };

    let json = extract_json(raw)
        .ok_or_else(|| mismatch(structured, "no JSON object found in output".to_string()))?;

    let value: Value = serde_json::from_str(json)
        .map_err(|e| mismatch(structured, format!("invalid JSON: {e}")))?;

    validate(&value, structured)?;

    debug!(shape_id = %structured.shape_id, "output shaped");
    Ok(FinalOutput::Structured {
        shape_id: structured.shape_id.clone(),
        value,
    })
}

/// Locate the JSON object inside `raw`.
///
/// If the text contains a fenced code block, only its body is considered.
/// The result spans from the first `{` to the last `}`. Returns `None` when
/// no such span exists.
pub fn extract_json(raw: &str) -> Option<&str> {
    let mut text = raw.trim();

    if let Some(open) = text.find("```") {
        let after = &text[open + 3..];
        // Skip the info string ("json") up to the end of the fence line.
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(after.len());
        let body = &after[body_start..];
        if let Some(close) = body.find("```") {
            text = body[..close].trim();
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Validate `value` against the shape's JSON Schema.
///
/// A null schema means "no structural constraint".
fn validate(value: &Value, shape: &StructuredShape) -> TriageResult<()> {
    if shape.json_schema.is_null() {
        return Ok(());
    }

    let validator = jsonschema::validator_for(&shape.json_schema).map_err(|e| {
        warn!(shape_id = %shape.shape_id, error = %e, "schema compilation failure");
        mismatch(shape, format!("invalid JSON Schema document: {e}"))
    })?;

    let violations: Vec<String> = validator
        .iter_errors(value)
        .map(|error| format!("at '{}': {}", error.instance_path, error))
        .collect();

    if violations.is_empty() {
        return Ok(());
    }

    let reason = violations.join("; ");
    warn!(shape_id = %shape.shape_id, %reason, "structural validation failure");
    Err(mismatch(shape, reason))
}

fn mismatch(shape: &StructuredShape, reason: String) -> TriageError {
    TriageError::OutputShapeMismatch {
        shape_id: shape.shape_id.clone(),
        reason,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
