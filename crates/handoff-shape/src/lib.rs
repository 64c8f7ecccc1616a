//! # handoff-shape
//!
//! Output shaping for the handoff runtime.
//!
//! [`engine::coerce`] turns raw completion text into a
//! [`FinalOutput`](handoff_contracts::shape::FinalOutput) in two phases:
//!
//! 1. **Extraction**: locate the JSON object inside the raw text (bare,
//!    fenced in a code block, or surrounded by prose).
//! 2. **Validation**: check the parsed value against the shape's JSON Schema
//!    via the `jsonschema` crate.
//!
//! Free-text shapes skip both phases and wrap the text verbatim.

pub mod engine;

pub use engine::{coerce, extract_json};
