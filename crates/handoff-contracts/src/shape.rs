//! Output shape and final output types.
//!
//! An agent declares the shape its completion text must take. `Text` is the
//! plain answer shape and is trusted verbatim; `Structured` shapes carry a
//! JSON Schema document the shaping engine validates against.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TriageError, TriageResult};

/// A structured shape: an identifier plus the JSON Schema it must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredShape {
    /// Stable identifier used in error messages (e.g. "homework-judgment-v1").
    pub shape_id: String,
    /// JSON Schema document the parsed output is validated against.
    pub json_schema: Value,
}

/// The result shape an agent declares for its completion text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum OutputShape {
    /// Free-text answer, wrapped as-is.
    #[default]
    Text,
    /// A JSON object validated against a schema.
    Structured(StructuredShape),
}

impl OutputShape {
    /// Build a structured shape from an id and schema document.
    pub fn structured(shape_id: impl Into<String>, json_schema: Value) -> Self {
        OutputShape::Structured(StructuredShape {
            shape_id: shape_id.into(),
            json_schema,
        })
    }

    /// The shape identifier; `"text"` for the free-text shape.
    pub fn shape_id(&self) -> &str {
        match self {
            OutputShape::Text => "text",
            OutputShape::Structured(s) => &s.shape_id,
        }
    }
}

/// A Rust type that can be read out of a structured completion.
///
/// Implementors describe themselves with a schema so the runner can validate
/// the raw text before deserializing it.
pub trait StructuredOutput: Serialize + DeserializeOwned {
    /// Identifier for this shape.
    const SHAPE_ID: &'static str;

    /// JSON Schema the serialized form must satisfy.
    fn json_schema() -> Value;

    /// The `OutputShape` an agent declares to produce this type.
    fn shape() -> OutputShape {
        OutputShape::structured(Self::SHAPE_ID, Self::json_schema())
    }
}

/// Completion text after it has been coerced into a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FinalOutput {
    /// Verbatim text for the free-text shape.
    Text(String),
    /// A validated JSON value for a structured shape.
    Structured { shape_id: String, value: Value },
}

impl FinalOutput {
    /// The text when this is a free-text output.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FinalOutput::Text(text) => Some(text),
            FinalOutput::Structured { .. } => None,
        }
    }

    /// Deserialize a structured output into `T`.
    ///
    /// Fails with `OutputShapeMismatch` for text outputs, for a different
    /// `shape_id`, or when the value does not deserialize.
    pub fn into_typed<T: StructuredOutput>(self) -> TriageResult<T> {
        match self {
            FinalOutput::Structured { shape_id, value } if shape_id == T::SHAPE_ID => {
                serde_json::from_value(value).map_err(|e| TriageError::OutputShapeMismatch {
                    shape_id,
                    reason: e.to_string(),
                })
            }
            FinalOutput::Structured { shape_id, .. } => Err(TriageError::OutputShapeMismatch {
                shape_id: T::SHAPE_ID.to_string(),
                reason: format!("output was shaped as '{shape_id}'"),
            }),
            FinalOutput::Text(_) => Err(TriageError::OutputShapeMismatch {
                shape_id: T::SHAPE_ID.to_string(),
                reason: "output is free text".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for FinalOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalOutput::Text(text) => f.write_str(text),
            FinalOutput::Structured { value, .. } => write!(f, "{value}"),
        }
    }
}
