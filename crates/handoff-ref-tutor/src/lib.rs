//! # handoff-ref-tutor
//!
//! Homework tutor reference setup for the handoff runtime.
//!
//! A triage agent routes questions to a Math Tutor or a History Tutor. Before
//! it does, a homework policy check asks the "Guardrail check" agent whether
//! the question is schoolwork; a negative verdict blocks the question unless
//! the caller asks to bypass the check.
//!
//! [`ScriptedCompletion`] answers every agent offline, so the whole flow can
//! run without an API key.

pub mod agents;
pub mod offline;
pub mod session;

pub use agents::{load_roster, triage_agent, HomeworkOutput};
pub use offline::ScriptedCompletion;
pub use session::{TutorReply, TutorSession};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use handoff_contracts::{completion::CompletionRequest, error::CompletionError};
    use handoff_core::{Agent, CompletionService, Runner};
    use handoff_policy::AgentRoster;

    use crate::{
        agents::{self, HISTORY_TUTOR, MATH_TUTOR, TRIAGE_AGENT},
        load_roster, triage_agent, HomeworkOutput, ScriptedCompletion, TutorReply, TutorSession,
    };

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn offline_session() -> TutorSession {
        TutorSession::new(Runner::new(Arc::new(ScriptedCompletion)), triage_agent())
    }

    struct DownService;

    #[async_trait]
    impl CompletionService for DownService {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
            Err(CompletionError::Transport("connection refused".to_string()))
        }
    }

    fn names(agents: &[Arc<Agent>]) -> Vec<&str> {
        agents.iter().map(|a| a.name()).collect()
    }

    // ── 1. homework questions ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_math_homework_reaches_math_tutor() {
        let mut session = offline_session();

        let reply = session.ask("Math Tutor: solve 2x + 3 = 7", false).await;

        match &reply {
            TutorReply::Answered { agent, answer, judgment } => {
                assert_eq!(agent, MATH_TUTOR);
                assert!(answer.contains("step by step"));
                assert!(judgment.as_ref().unwrap().is_homework);
            }
            other => panic!("expected Answered, got {:?}", other),
        }
        assert!(reply.to_string().contains("is homework: true"));
    }

    #[tokio::test]
    async fn test_history_homework_reaches_history_tutor() {
        let mut session = offline_session();

        let reply = session
            .ask("History Tutor: why did the Roman empire fall?", false)
            .await;

        assert!(matches!(reply, TutorReply::Answered { ref agent, .. } if agent == HISTORY_TUTOR));
    }

    /// Homework that names neither tutor is answered by the triage agent.
    #[tokio::test]
    async fn test_unrouted_homework_stays_with_triage() {
        let mut session = offline_session();

        let reply = session.ask("explain photosynthesis", false).await;

        match reply {
            TutorReply::Answered { agent, answer, .. } => {
                assert_eq!(agent, TRIAGE_AGENT);
                assert!(answer.contains("Mention the Math Tutor or the History Tutor"));
            }
            other => panic!("expected Answered, got {:?}", other),
        }
    }

    // ── 2. guardrail ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_small_talk_is_blocked() {
        let mut session = offline_session();

        let reply = session.ask("book me a table for dinner", false).await;

        match &reply {
            TutorReply::Blocked { judgment, message, .. } => {
                assert!(!judgment.as_ref().unwrap().is_homework);
                assert!(message.contains("homework"));
            }
            other => panic!("expected Blocked, got {:?}", other),
        }
        let shown = reply.to_string();
        assert!(shown.contains("is homework: false"));
        assert!(shown.contains("Blocked by the 'homework' guardrail"));
        // Only the judge ran.
        let ran: Vec<&str> = session
            .context()
            .transcript()
            .iter()
            .map(|e| e.agent.as_str())
            .collect();
        assert_eq!(ran, vec![agents::GUARDRAIL_CHECK]);
    }

    /// Bypass answers the question but still shows the negative verdict.
    #[tokio::test]
    async fn test_bypass_answers_and_reports_verdict() {
        let mut session = offline_session();

        let reply = session.ask("book me a table for dinner", true).await;

        match &reply {
            TutorReply::Answered { agent, judgment, .. } => {
                assert_eq!(agent, TRIAGE_AGENT);
                assert_eq!(
                    judgment.as_ref().map(|j| j.is_homework),
                    Some(false),
                    "bypass must not rewrite the verdict"
                );
            }
            other => panic!("expected Answered, got {:?}", other),
        }
        assert!(reply.to_string().contains("is homework: false"));
    }

    #[tokio::test]
    async fn test_bypass_is_per_question() {
        let mut session = offline_session();

        assert!(matches!(
            session.ask("book me a table for dinner", true).await,
            TutorReply::Answered { .. }
        ));
        assert!(matches!(
            session.ask("book me a table for dinner", false).await,
            TutorReply::Blocked { .. }
        ));
    }

    // ── 3. failures ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_service_outage_is_reported_as_failure() {
        let mut session = TutorSession::new(Runner::new(Arc::new(DownService)), triage_agent());

        let reply = session.ask("Math Tutor: 2+2?", false).await;

        match &reply {
            TutorReply::Failed { message } => {
                assert!(message.contains("connection refused"), "got: {message}");
            }
            other => panic!("expected Failed, got {:?}", other),
        }
        assert!(reply.judgment().is_none());
        assert!(reply.to_string().starts_with("The tutor could not answer."));
    }

    #[test]
    fn test_empty_answer_display() {
        let reply = TutorReply::Answered {
            agent: MATH_TUTOR.to_string(),
            answer: "  ".to_string(),
            judgment: Some(HomeworkOutput {
                is_homework: true,
                reasoning: "arithmetic".to_string(),
            }),
        };
        assert!(reply.to_string().ends_with("Math Tutor did not respond."));
    }

    // ── 4. session state ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_transcript_accumulates_across_questions() {
        let mut session = offline_session();

        session.ask("Math Tutor: 2+2?", false).await;
        session.ask("History Tutor: why was Napoleon exiled?", false).await;

        let ran: Vec<&str> = session
            .context()
            .transcript()
            .iter()
            .map(|e| e.agent.as_str())
            .collect();
        assert_eq!(
            ran,
            vec![
                agents::GUARDRAIL_CHECK,
                MATH_TUTOR,
                agents::GUARDRAIL_CHECK,
                HISTORY_TUTOR
            ]
        );
    }

    // ── 5. roster ─────────────────────────────────────────────────────────────

    /// The bundled TOML describes exactly the agents built in code.
    #[test]
    fn test_roster_matches_code() {
        let roster = load_roster().unwrap();
        let triage = triage_agent();

        let from_file = roster.agent(TRIAGE_AGENT).unwrap();
        assert_eq!(from_file.instructions(), triage.instructions());
        assert_eq!(names(from_file.delegates()), names(triage.delegates()));

        for (loaded, built) in from_file.delegates().iter().zip(triage.delegates()) {
            assert_eq!(loaded.instructions(), built.instructions());
            assert_eq!(loaded.handoff_description(), built.handoff_description());
        }

        let guardrails: Vec<&str> = from_file.guardrails().iter().map(|g| g.name()).collect();
        assert_eq!(guardrails, vec![agents::HOMEWORK_GUARDRAIL]);

        let judge = roster.agent(agents::GUARDRAIL_CHECK).unwrap();
        assert_eq!(judge.output_shape(), agents::guardrail_agent().output_shape());
    }

    #[tokio::test]
    async fn test_roster_triage_behaves_like_code() {
        let roster = load_roster().unwrap();
        let mut session = TutorSession::new(
            Runner::new(Arc::new(ScriptedCompletion)),
            roster.agent(TRIAGE_AGENT).unwrap(),
        );

        assert!(matches!(
            session.ask("Math Tutor: 12 * 7", false).await,
            TutorReply::Answered { ref agent, .. } if agent == MATH_TUTOR
        ));
        assert!(matches!(
            session.ask("book me a table for dinner", false).await,
            TutorReply::Blocked { .. }
        ));
    }

    /// The judgment is read from the guardrail outcomes, whatever the
    /// guardrail is called.
    #[tokio::test]
    async fn test_renamed_guardrail_still_reports_verdict() {
        let toml = agents::TUTOR_ROSTER
            .replace(r#"name = "homework""#, r#"name = "policy""#)
            .replace(r#"guardrails = ["homework"]"#, r#"guardrails = ["policy"]"#);
        let roster = AgentRoster::from_toml_str(&toml).unwrap();
        let mut session = TutorSession::new(
            Runner::new(Arc::new(ScriptedCompletion)),
            roster.agent(TRIAGE_AGENT).unwrap(),
        );

        match session.ask("book me a table for dinner", true).await {
            TutorReply::Answered { judgment, .. } => {
                assert_eq!(judgment.map(|j| j.is_homework), Some(false));
            }
            other => panic!("expected Answered, got {:?}", other),
        }

        let reply = session.ask("book me a table for dinner", false).await;
        match &reply {
            TutorReply::Blocked { guardrail, judgment, .. } => {
                assert_eq!(guardrail, "policy");
                assert!(!judgment.as_ref().unwrap().is_homework);
            }
            other => panic!("expected Blocked, got {:?}", other),
        }
        assert!(reply.to_string().contains("Blocked by the 'policy' guardrail"));
    }
}
