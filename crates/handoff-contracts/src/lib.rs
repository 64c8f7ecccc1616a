//! # handoff-contracts
//!
//! Shared types, output shapes, and error contracts for the handoff runtime.
//!
//! All crates in the workspace import from here. No dispatch logic lives in
//! this crate: only data definitions and error types.

pub mod completion;
pub mod context;
pub mod error;
pub mod guardrail;
pub mod shape;
