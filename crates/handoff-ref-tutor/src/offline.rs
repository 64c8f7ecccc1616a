//! Offline completion service for the tutor.
//!
//! `ScriptedCompletion` answers the four tutor agents without any network
//! access. The homework judge uses a keyword heuristic; the tutors reply with
//! canned text that echoes the question. All replies are deterministic.

use async_trait::async_trait;
use tracing::debug;

use handoff_contracts::{completion::CompletionRequest, error::CompletionError};
use handoff_core::CompletionService;

use crate::agents::{
    HomeworkOutput, GUARDRAIL_INSTRUCTIONS, HISTORY_INSTRUCTIONS, HISTORY_TUTOR,
    MATH_INSTRUCTIONS, MATH_TUTOR, TRIAGE_INSTRUCTIONS,
};

/// Words that mark a question as schoolwork.
const STUDY_KEYWORDS: &[&str] = &[
    "homework",
    "assignment",
    "essay",
    "exam",
    "math",
    "algebra",
    "geometry",
    "calculus",
    "equation",
    "fraction",
    "percent",
    "solve",
    "calculate",
    "prove",
    "history",
    "century",
    "empire",
    "dynasty",
    "revolution",
    "war",
    "president",
    "explain",
    "why",
    "meaning of",
    "philosophy",
];

/// Deterministic stand-in for a hosted model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedCompletion;

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self
    }

    /// The judge's verdict on `question`.
    ///
    /// Tutor names are routing hints and are ignored.
    pub fn judge(question: &str) -> HomeworkOutput {
        let lowered = [MATH_TUTOR, HISTORY_TUTOR]
            .iter()
            .fold(question.to_lowercase(), |text, tutor| {
                text.replace(&tutor.to_lowercase(), " ")
            });

        if let Some(keyword) = STUDY_KEYWORDS.iter().find(|k| lowered.contains(*k)) {
            return HomeworkOutput {
                is_homework: true,
                reasoning: format!("The question mentions '{keyword}', an educational topic."),
            };
        }
        if has_arithmetic(&lowered) {
            return HomeworkOutput {
                is_homework: true,
                reasoning: "The question contains an arithmetic expression.".to_string(),
            };
        }
        HomeworkOutput {
            is_homework: false,
            reasoning: "The question does not relate to any academic subject.".to_string(),
        }
    }
}

/// A digit next to an arithmetic operator, e.g. `2+2` or `3 * 4`.
fn has_arithmetic(text: &str) -> bool {
    let compact: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.windows(2).any(|pair| {
        let (a, b) = (pair[0], pair[1]);
        (a.is_ascii_digit() && "+-*/=^".contains(b)) || ("+-*/=^".contains(a) && b.is_ascii_digit())
    })
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let question = request.user.trim();
        let reply = match request.system.as_str() {
            GUARDRAIL_INSTRUCTIONS => serde_json::to_string(&Self::judge(question))
                .map_err(|e| CompletionError::Malformed(e.to_string()))?,
            MATH_INSTRUCTIONS => format!(
                "Let's work through \"{question}\" step by step. First restate what is asked, \
                 then apply the relevant rule, and finally check the result with a simple example."
            ),
            HISTORY_INSTRUCTIONS => format!(
                "To answer \"{question}\", start with the period and the people involved, \
                 then look at the causes and what followed from the events."
            ),
            TRIAGE_INSTRUCTIONS => format!(
                "I could not tell which tutor should take \"{question}\". \
                 Mention the Math Tutor or the History Tutor to be routed."
            ),
            _ => format!("(offline) No scripted answer for: {question}"),
        };

        debug!(chars = reply.len(), "scripted completion");
        Ok(reply)
    }
}
