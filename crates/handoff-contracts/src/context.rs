//! Caller-owned session state.
//!
//! A `RunContext` is created by the caller once per session and lent to the
//! runner by `&mut` for each top-level run. Guardrails and delegates invoked
//! within that run all see the same context. Concurrent sessions must use
//! independent contexts; the exclusive borrow makes sharing one across
//! concurrent runs impossible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unique identifier for one caller session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    /// Create a new, unique session ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// One completed completion call, recorded after the service answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Name of the agent whose instructions were sent.
    pub agent: String,
    /// The user text sent with them.
    pub input: String,
    /// The raw text the service returned.
    pub output: String,
    /// Wall-clock time the entry was recorded (UTC).
    pub at: DateTime<Utc>,
}

/// Mutable session state shared by one run's guardrails and delegates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunContext {
    session_id: SessionId,
    bypass_guardrails: bool,
    state: Map<String, Value>,
    transcript: Vec<TranscriptEntry>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Caller-level request to suppress guardrail blocking.
    ///
    /// Guardrails still evaluate and report their judgment; they just do not
    /// block while this is set.
    pub fn bypass_guardrails(&self) -> bool {
        self.bypass_guardrails
    }

    pub fn set_bypass_guardrails(&mut self, bypass: bool) {
        self.bypass_guardrails = bypass;
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Insert a value, returning the previous one for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.state.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.state.remove(key)
    }

    /// Append a completed completion to the transcript.
    pub fn record(&mut self, agent: &str, input: &str, output: &str) {
        self.transcript.push(TranscriptEntry {
            agent: agent.to_string(),
            input: input.to_string(),
            output: output.to_string(),
            at: Utc::now(),
        });
    }

    /// Completed completions in the order they finished.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }
}
