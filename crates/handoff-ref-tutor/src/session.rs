//! One tutoring session: a triage agent, a runner and the session context.

use std::{fmt, sync::Arc};

use tracing::{info, warn};

use handoff_contracts::{context::RunContext, error::TriageError, guardrail::GuardrailOutcome};
use handoff_core::{Agent, Runner};

use crate::agents::HomeworkOutput;

/// What the caller shows for one question.
#[derive(Debug, Clone, PartialEq)]
pub enum TutorReply {
    /// A tutor answered. `judgment` is absent only when no homework check ran.
    Answered {
        agent: String,
        answer: String,
        judgment: Option<HomeworkOutput>,
    },
    /// A guardrail refused the question.
    Blocked {
        guardrail: String,
        judgment: Option<HomeworkOutput>,
        message: String,
    },
    /// The run failed for a reason other than a guardrail.
    Failed { message: String },
}

impl TutorReply {
    pub fn judgment(&self) -> Option<&HomeworkOutput> {
        match self {
            TutorReply::Answered { judgment, .. } | TutorReply::Blocked { judgment, .. } => {
                judgment.as_ref()
            }
            TutorReply::Failed { .. } => None,
        }
    }
}

impl fmt::Display for TutorReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(judgment) = self.judgment() {
            writeln!(f, "Homework check")?;
            writeln!(f, "  is homework: {}", judgment.is_homework)?;
            writeln!(f, "  reasoning:   {}", judgment.reasoning)?;
            writeln!(f)?;
        }

        match self {
            TutorReply::Answered { agent, answer, .. } if answer.trim().is_empty() => {
                write!(f, "{agent} did not respond.")
            }
            TutorReply::Answered { agent, answer, .. } => write!(f, "{agent}:\n{answer}"),
            TutorReply::Blocked { guardrail, message, .. } => {
                write!(f, "Blocked by the '{guardrail}' guardrail.\n\nerror: {message}")
            }
            TutorReply::Failed { message } => write!(f, "The tutor could not answer.\n\nerror: {message}"),
        }
    }
}

/// A conversation with the tutor. Questions share one `RunContext`, so the
/// transcript accumulates across calls.
pub struct TutorSession {
    runner: Runner,
    triage: Arc<Agent>,
    ctx: RunContext,
}

impl TutorSession {
    pub fn new(runner: Runner, triage: Arc<Agent>) -> Self {
        Self {
            runner,
            triage,
            ctx: RunContext::new(),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Ask one question. `bypass` lets a non-homework question through while
    /// still reporting the judgment.
    pub async fn ask(&mut self, question: &str, bypass: bool) -> TutorReply {
        self.ctx.set_bypass_guardrails(bypass);

        info!(
            session_id = %self.ctx.session_id().0,
            bypass,
            "tutor question received"
        );

        match self.runner.run(&self.triage, question, &mut self.ctx).await {
            Ok(result) => TutorReply::Answered {
                judgment: homework_judgment(&result.guardrail_outcomes),
                answer: result.display_text(),
                agent: result.agent,
            },
            Err(TriageError::GuardrailBlocked { agent, outcome }) => TutorReply::Blocked {
                judgment: homework_judgment(std::slice::from_ref(&outcome)),
                message: format!("guardrail '{}' blocked agent '{agent}'", outcome.guardrail),
                guardrail: outcome.guardrail,
            },
            Err(e) => {
                warn!(error = %e, "tutor run failed");
                TutorReply::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// The first outcome whose `info` reads as a homework judgment.
fn homework_judgment(outcomes: &[GuardrailOutcome]) -> Option<HomeworkOutput> {
    outcomes
        .iter()
        .find_map(|outcome| outcome.info_as::<HomeworkOutput>().ok())
}
