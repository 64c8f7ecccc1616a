//! # handoff-policy
//!
//! Declarative setup for the handoff runtime.
//!
//! ## Overview
//!
//! This crate provides two things:
//!
//! - [`PolicyCheckGuardrail`], an [`InputGuardrail`](handoff_core::InputGuardrail)
//!   that runs a policy agent and gates on one boolean field of its judgment.
//! - [`AgentRoster`] and [`RosterLoader`], which build a whole set of agents,
//!   shapes and guardrails from a TOML file.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use handoff_policy::AgentRoster;
//!
//! let roster = AgentRoster::from_file(Path::new("roster/tutor.toml"))?;
//! let triage = roster.agent("Triage Agent")?;
//! // Pass `triage` to `handoff_core::Runner::run(...)`.
//! ```
//!
//! ## Name resolution
//!
//! Agents refer to shapes, delegates and guardrails by name. Names are
//! resolved when the roster is built; an unknown or duplicate name, or a
//! delegation loop, is reported then and never at run time.

pub mod check;
pub mod config;
pub mod roster;

pub use check::PolicyCheckGuardrail;
pub use config::{AgentSpec, GuardrailKind, GuardrailSpec, RosterConfig, ShapeSpec};
pub use roster::{AgentRoster, RosterLoader};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use handoff_contracts::{
        completion::CompletionRequest,
        context::RunContext,
        error::{CompletionError, TriageError, TriageResult},
        guardrail::GuardrailOutcome,
        shape::OutputShape,
    };
    use handoff_core::{Agent, CompletionService, InputGuardrail, Runner};

    use crate::{AgentRoster, PolicyCheckGuardrail, RosterLoader};

    // ── Helpers ───────────────────────────────────────────────────────────────

    const POLICY: &str = "Check if the user is asking about homework.";

    const TUTOR_ROSTER: &str = r#"
        [[shapes]]
        id = "homework-judgment-v1"
        json_schema = { type = "object", required = ["is_homework", "reasoning"] }

        [[guardrails]]
        name = "homework"
        kind = "policy-check"
        policy_agent = "Guardrail check"
        allow_field = "is_homework"

        [[agents]]
        name = "Guardrail check"
        instructions = "Check if the user is asking about homework."
        output = "homework-judgment-v1"

        [[agents]]
        name = "Math Tutor"
        instructions = "You help with math."
        handoff_description = "Specialist agent for math questions"

        [[agents]]
        name = "History Tutor"
        instructions = "You help with history."

        [[agents]]
        name = "Triage Agent"
        instructions = "You determine which agent to use."
        delegates = ["History Tutor", "Math Tutor"]
        guardrails = ["homework"]
    "#;

    /// Answers the policy agent with a fixed judgment and everyone else with
    /// an echo of their instructions.
    struct JudgmentService {
        judgment: String,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl JudgmentService {
        fn new(judgment: serde_json::Value) -> Self {
            Self {
                judgment: judgment.to_string(),
                calls: Arc::new(Mutex::new(vec![])),
            }
        }
    }

    #[async_trait]
    impl CompletionService for JudgmentService {
        async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            self.calls.lock().unwrap().push(request.system.clone());
            if request.system == POLICY {
                Ok(self.judgment.clone())
            } else {
                Ok(format!("answered under: {}", request.system))
            }
        }
    }

    struct AlwaysPass;

    #[async_trait]
    impl InputGuardrail for AlwaysPass {
        fn name(&self) -> &str {
            "always-pass"
        }

        async fn check(
            &self,
            _runner: &Runner,
            _ctx: &mut RunContext,
            _agent: &Agent,
            _input: &str,
        ) -> TriageResult<GuardrailOutcome> {
            Ok(GuardrailOutcome::pass("always-pass", json!(null)))
        }
    }

    fn homework_guardrail(shape: OutputShape) -> PolicyCheckGuardrail {
        let policy = Arc::new(
            Agent::builder("Guardrail check", POLICY)
                .output_shape(shape)
                .build(),
        );
        PolicyCheckGuardrail::new("homework", policy, "is_homework")
    }

    fn guarded_triage(guardrail: PolicyCheckGuardrail) -> Agent {
        Agent::builder("Triage Agent", "You determine which agent to use.")
            .delegate(Arc::new(Agent::builder("Math Tutor", "You help with math.").build()))
            .guardrail(Arc::new(guardrail))
            .build()
    }

    // ── 1. roster loading ─────────────────────────────────────────────────────

    #[test]
    fn test_load_tutor_roster() {
        let roster = AgentRoster::from_toml_str(TUTOR_ROSTER).unwrap();

        let names: Vec<&str> = roster.agents().map(|a| a.name()).collect();
        assert_eq!(
            names,
            vec!["Guardrail check", "Math Tutor", "History Tutor", "Triage Agent"]
        );
        assert_eq!(roster.len(), 4);
        assert!(!roster.is_empty());

        let triage = roster.agent("Triage Agent").unwrap();
        let delegates: Vec<&str> = triage.delegates().iter().map(|d| d.name()).collect();
        assert_eq!(delegates, vec!["History Tutor", "Math Tutor"]);
        let guardrails: Vec<&str> = triage.guardrails().iter().map(|g| g.name()).collect();
        assert_eq!(guardrails, vec!["homework"]);

        let math = roster.get("Math Tutor").unwrap();
        assert_eq!(
            math.handoff_description(),
            Some("Specialist agent for math questions")
        );
        assert_eq!(math.output_shape(), &OutputShape::Text);
    }

    #[test]
    fn test_shared_agents_are_built_once() {
        let roster = AgentRoster::from_toml_str(TUTOR_ROSTER).unwrap();
        let triage = roster.agent("Triage Agent").unwrap();
        let math = roster.agent("Math Tutor").unwrap();
        assert!(Arc::ptr_eq(&triage.delegates()[1], &math));
    }

    #[test]
    fn test_declared_shape_is_attached() {
        let roster = AgentRoster::from_toml_str(TUTOR_ROSTER).unwrap();
        let check = roster.agent("Guardrail check").unwrap();

        match check.output_shape() {
            OutputShape::Structured(shape) => {
                assert_eq!(shape.shape_id, "homework-judgment-v1");
                assert_eq!(shape.json_schema["required"], json!(["is_homework", "reasoning"]));
            }
            other => panic!("expected a structured shape, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_agent_lookup_is_config_error() {
        let roster = AgentRoster::from_toml_str(TUTOR_ROSTER).unwrap();
        assert!(roster.get("Science Tutor").is_none());
        assert!(matches!(
            roster.agent("Science Tutor"),
            Err(TriageError::ConfigError { .. })
        ));
    }

    // ── 2. roster errors ──────────────────────────────────────────────────────

    #[test]
    fn test_unknown_delegate_is_rejected() {
        let toml = r#"
            [[agents]]
            name = "Triage Agent"
            instructions = "route"
            delegates = ["Science Tutor"]
        "#;

        match AgentRoster::from_toml_str(toml) {
            Err(TriageError::ConfigError { reason }) => {
                assert!(reason.contains("unknown agent 'Science Tutor'"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_shape_and_guardrail_are_rejected() {
        let bad_shape = r#"
            [[agents]]
            name = "Guardrail check"
            instructions = "judge"
            output = "missing-shape"
        "#;
        let bad_guardrail = r#"
            [[agents]]
            name = "Triage Agent"
            instructions = "route"
            guardrails = ["missing-guardrail"]
        "#;

        assert!(matches!(
            AgentRoster::from_toml_str(bad_shape),
            Err(TriageError::ConfigError { .. })
        ));
        assert!(matches!(
            AgentRoster::from_toml_str(bad_guardrail),
            Err(TriageError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_duplicate_agent_is_rejected() {
        let toml = r#"
            [[agents]]
            name = "Math Tutor"
            instructions = "one"

            [[agents]]
            name = "Math Tutor"
            instructions = "two"
        "#;

        match AgentRoster::from_toml_str(toml) {
            Err(TriageError::ConfigError { reason }) => {
                assert_eq!(reason, "duplicate agent 'Math Tutor'");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    /// An empty name would match every input during routing.
    #[test]
    fn test_empty_agent_name_is_rejected() {
        let toml = r#"
            [[agents]]
            name = " "
            instructions = "catch-all"

            [[agents]]
            name = "Triage Agent"
            instructions = "route"
            delegates = [" "]
        "#;

        match AgentRoster::from_toml_str(toml) {
            Err(TriageError::ConfigError { reason }) => {
                assert_eq!(reason, "agent name must not be empty");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_delegation_cycle_is_rejected() {
        let toml = r#"
            [[agents]]
            name = "Triage Agent"
            instructions = "route"
            delegates = ["Math Tutor"]

            [[agents]]
            name = "Math Tutor"
            instructions = "math"
            delegates = ["Triage Agent"]
        "#;

        match AgentRoster::from_toml_str(toml) {
            Err(TriageError::DelegationCycle { path }) => {
                assert_eq!(path, vec!["Triage Agent", "Math Tutor", "Triage Agent"]);
            }
            other => panic!("expected DelegationCycle, got {:?}", other),
        }
    }

    /// A policy agent guarded by its own policy check could never run.
    #[test]
    fn test_self_guarding_policy_agent_is_a_cycle() {
        let toml = r#"
            [[guardrails]]
            name = "homework"
            kind = "policy-check"
            policy_agent = "Guardrail check"
            allow_field = "is_homework"

            [[agents]]
            name = "Guardrail check"
            instructions = "judge"
            guardrails = ["homework"]
        "#;

        assert!(matches!(
            AgentRoster::from_toml_str(toml),
            Err(TriageError::DelegationCycle { .. })
        ));
    }

    #[test]
    fn test_policy_check_requires_fields() {
        let toml = r#"
            [[guardrails]]
            name = "homework"
            kind = "policy-check"
            policy_agent = "Guardrail check"

            [[agents]]
            name = "Guardrail check"
            instructions = "judge"

            [[agents]]
            name = "Triage Agent"
            instructions = "route"
            guardrails = ["homework"]
        "#;

        match AgentRoster::from_toml_str(toml) {
            Err(TriageError::ConfigError { reason }) => {
                assert!(reason.contains("allow_field"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_guardrail_must_be_registered() {
        let toml = r#"
            [[guardrails]]
            name = "always-pass"
            kind = "custom"

            [[agents]]
            name = "Math Tutor"
            instructions = "math"
            guardrails = ["always-pass"]
        "#;

        assert!(matches!(
            AgentRoster::from_toml_str(toml),
            Err(TriageError::ConfigError { .. })
        ));

        let mut loader = RosterLoader::new();
        loader.register_guardrail("always-pass", Arc::new(AlwaysPass));
        let roster = loader.load_str(toml).unwrap();
        let math = roster.agent("Math Tutor").unwrap();
        assert_eq!(math.guardrails()[0].name(), "always-pass");
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        match AgentRoster::from_toml_str("[[agents]]\nname = ") {
            Err(TriageError::ConfigError { reason }) => {
                assert!(reason.starts_with("failed to parse roster TOML"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = AgentRoster::from_file(std::path::Path::new("does/not/exist.toml"));
        assert!(matches!(result, Err(TriageError::ConfigError { .. })));
    }

    // ── 3. policy-check guardrail ─────────────────────────────────────────────

    #[tokio::test]
    async fn test_negative_judgment_blocks() {
        let service = JudgmentService::new(json!({
            "is_homework": false,
            "reasoning": "casual question"
        }));
        let calls = service.calls.clone();
        let runner = Runner::new(Arc::new(service));
        let triage = guarded_triage(homework_guardrail(OutputShape::Text));

        match runner.run_once(&triage, "what is the meaning of life?").await {
            Err(TriageError::GuardrailBlocked { agent, outcome }) => {
                assert_eq!(agent, "Triage Agent");
                assert_eq!(outcome.guardrail, "homework");
                assert_eq!(outcome.info["is_homework"], json!(false));
                assert_eq!(outcome.info["reasoning"], json!("casual question"));
            }
            other => panic!("expected GuardrailBlocked, got {:?}", other),
        }
        // Only the policy agent was consulted.
        assert_eq!(*calls.lock().unwrap(), vec![POLICY.to_string()]);
    }

    #[tokio::test]
    async fn test_positive_judgment_passes() {
        let runner = Runner::new(Arc::new(JudgmentService::new(json!({
            "is_homework": true,
            "reasoning": "arithmetic exercise"
        }))));
        let triage = guarded_triage(homework_guardrail(OutputShape::Text));

        let result = runner.run_once(&triage, "math tutor: what is 2+2?").await.unwrap();

        assert_eq!(result.agent, "Math Tutor");
        assert_eq!(result.guardrail_outcomes.len(), 1);
        assert!(!result.guardrail_outcomes[0].blocked);
        assert_eq!(result.guardrail_outcomes[0].info["is_homework"], json!(true));
    }

    /// Bypass lets the run through while still reporting the negative
    /// judgment.
    #[tokio::test]
    async fn test_bypass_reports_but_does_not_block() {
        let runner = Runner::new(Arc::new(JudgmentService::new(json!({
            "is_homework": false,
            "reasoning": "casual question"
        }))));
        let triage = guarded_triage(homework_guardrail(OutputShape::Text));
        let mut ctx = RunContext::new();
        ctx.set_bypass_guardrails(true);

        let result = runner.run(&triage, "ask the math tutor some trivia", &mut ctx).await.unwrap();

        assert_eq!(result.agent, "Math Tutor");
        let outcome = &result.guardrail_outcomes[0];
        assert!(!outcome.blocked);
        assert_eq!(outcome.info["is_homework"], json!(false));
    }

    #[tokio::test]
    async fn test_judgment_is_stored_in_context() {
        let runner = Runner::new(Arc::new(JudgmentService::new(json!({
            "is_homework": true,
            "reasoning": "essay prompt"
        }))));
        let guardrail = homework_guardrail(OutputShape::Text);
        assert_eq!(guardrail.context_key(), "guardrail.homework");
        let triage = guarded_triage(guardrail);
        let mut ctx = RunContext::new();

        runner.run(&triage, "history essay", &mut ctx).await.unwrap();

        assert_eq!(
            ctx.get("guardrail.homework"),
            Some(&json!({ "is_homework": true, "reasoning": "essay prompt" }))
        );
    }

    #[tokio::test]
    async fn test_judgment_without_allow_field_is_mismatch() {
        let runner = Runner::new(Arc::new(JudgmentService::new(json!({
            "verdict": "homework"
        }))));
        let triage = guarded_triage(homework_guardrail(OutputShape::Text));

        match runner.run_once(&triage, "math").await {
            Err(TriageError::OutputShapeMismatch { shape_id, reason }) => {
                assert_eq!(shape_id, "homework-judgment");
                assert!(reason.contains("is_homework"), "got: {reason}");
            }
            other => panic!("expected OutputShapeMismatch, got {:?}", other),
        }
    }

    /// A roster-built policy check behaves like a hand-built one.
    #[tokio::test]
    async fn test_roster_guardrail_gates_triage() {
        let roster = AgentRoster::from_toml_str(TUTOR_ROSTER).unwrap();
        let triage = roster.agent("Triage Agent").unwrap();

        let deny = Runner::new(Arc::new(JudgmentService::new(json!({
            "is_homework": false,
            "reasoning": "small talk"
        }))));
        assert!(matches!(
            deny.run_once(&triage, "how are you?").await,
            Err(TriageError::GuardrailBlocked { .. })
        ));

        let allow = Runner::new(Arc::new(JudgmentService::new(json!({
            "is_homework": true,
            "reasoning": "history assignment"
        }))));
        let result = allow
            .run_once(&triage, "history tutor: who was the first president?")
            .await
            .unwrap();
        assert_eq!(result.agent, "History Tutor");
    }
}
