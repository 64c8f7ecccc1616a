//! The request sent to a completion service.
//!
//! The wire format is the service's concern; the runner only ever produces a
//! system instruction and the raw user text.

use serde::{Deserialize, Serialize};

/// A two-part prompt: the resolved agent's instructions and the user's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System role content, taken verbatim from the agent's instructions.
    pub system: String,
    /// User role content, the raw input text.
    pub user: String,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}
