//! # handoff-core
//!
//! The guardrail-gated dispatch runtime for handoff agents.
//!
//! This crate provides:
//! - `Agent`, the immutable role definition, and its builder
//! - The three seam traits (`CompletionService`, `InputGuardrail`,
//!   `DelegationRouter`)
//! - `NameMatchRouter`, the default first-match delegation policy
//! - The `Runner` that wires them together in the correct order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use handoff_core::{Agent, Runner};
//!
//! let runner = Runner::new(completion_service);
//! let result = runner.run(&triage_agent, "what is 2+2?", &mut ctx).await?;
//! ```

pub mod agent;
pub mod result;
pub mod routing;
pub mod runner;
pub mod traits;

pub use agent::{Agent, AgentBuilder};
pub use result::RunResult;
pub use routing::NameMatchRouter;
pub use runner::Runner;
pub use traits::{CompletionService, DelegationRouter, InputGuardrail};
