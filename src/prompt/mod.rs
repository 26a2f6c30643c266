pub mod templates;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArchitectError;
use crate::protocol::canonical::PromptPair;

/// One of the three sequential workflow steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WorkflowStep {
    /// Step 1: raw material to logic blueprint.
    Strategist,
    /// Step 2: blueprint to composed prose.
    Composer,
    /// Step 3: composed prose to critical review.
    Reviewer,
}

impl WorkflowStep {
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            WorkflowStep::Strategist => 1,
            WorkflowStep::Composer => 2,
            WorkflowStep::Reviewer => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStep::Strategist => "strategist",
            WorkflowStep::Composer => "composer",
            WorkflowStep::Reviewer => "reviewer",
        }
    }
}

impl TryFrom<u8> for WorkflowStep {
    type Error = ArchitectError;

    fn try_from(step: u8) -> Result<Self, Self::Error> {
        match step {
            1 => Ok(WorkflowStep::Strategist),
            2 => Ok(WorkflowStep::Composer),
            3 => Ok(WorkflowStep::Reviewer),
            other => Err(ArchitectError::InvalidRequest(format!(
                "step must be 1, 2 or 3, got {other}"
            ))),
        }
    }
}

impl From<WorkflowStep> for u8 {
    fn from(step: WorkflowStep) -> Self {
        step.number()
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System prompt for `step`.
///
/// The composer prompt is prefixed with a reference style block when
/// reference text is supplied.
#[must_use]
pub fn build_system_prompt(step: WorkflowStep, reference_text: Option<&str>) -> String {
    match step {
        WorkflowStep::Strategist => templates::STRATEGIST.to_string(),
        WorkflowStep::Composer => match reference_text {
            Some(reference) if !reference.is_empty() => {
                format!("[REFERENCE STYLE TEXT]\n{reference}\n\n{}", templates::COMPOSER)
            }
            _ => templates::COMPOSER.to_string(),
        },
        WorkflowStep::Reviewer => templates::REVIEWER.to_string(),
    }
}

/// User message for `step`.
///
/// Step 1 passes the input through; steps 2 and 3 wrap the prior step's
/// output and the instructions in labelled sections. A missing prior text
/// renders as an empty section.
#[must_use]
pub fn build_user_message(
    step: WorkflowStep,
    user_input: &str,
    blueprint: Option<&str>,
    composition: Option<&str>,
) -> String {
    match step {
        WorkflowStep::Strategist => user_input.to_string(),
        WorkflowStep::Composer => labelled_message(
            "[LOGIC BLUEPRINT]",
            blueprint.unwrap_or_default(),
            user_input,
        ),
        WorkflowStep::Reviewer => labelled_message(
            "[COMPOSED TEXT]",
            composition.unwrap_or_default(),
            user_input,
        ),
    }
}

fn labelled_message(label: &str, prior: &str, user_input: &str) -> String {
    const INSTRUCTIONS_LABEL: &str = "[USER INSTRUCTIONS]";
    let mut out = String::with_capacity(
        label.len() + prior.len() + INSTRUCTIONS_LABEL.len() + user_input.len() + 4,
    );
    out.push_str(label);
    out.push('\n');
    out.push_str(prior);
    out.push_str("\n\n");
    out.push_str(INSTRUCTIONS_LABEL);
    out.push('\n');
    out.push_str(user_input);
    out
}

/// Build both prompts for one generation call.
#[must_use]
pub fn build_prompt_pair(
    step: WorkflowStep,
    user_input: &str,
    blueprint: Option<&str>,
    composition: Option<&str>,
    reference_text: Option<&str>,
) -> PromptPair {
    PromptPair {
        system: build_system_prompt(step, reference_text),
        user: build_user_message(step, user_input, blueprint, composition),
    }
}
