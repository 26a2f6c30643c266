use std::time::Duration;

use tracing::info;

use crate::prompt::WorkflowStep;
use crate::protocol::canonical::{PromptPair, ProviderKind, Termination};

/// Estimate the number of tokens in `text`.
///
/// Uses a lightweight heuristic (`bytes / 4`); neither provider reports usage
/// on the streaming paths used here.
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64).div_ceil(4)
}

/// Estimate the input tokens of a prompt pair.
#[must_use]
pub fn estimate_prompt_tokens(prompt: &PromptPair) -> u64 {
    estimate_tokens(&prompt.system) + estimate_tokens(&prompt.user)
}

/// Counters accumulated while a generation stream is drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationTally {
    pub fragments: u64,
    pub output_chars: u64,
    pub output_bytes: u64,
}

impl GenerationTally {
    #[inline]
    pub fn record_fragment(&mut self, fragment: &str) {
        self.fragments += 1;
        self.output_chars += fragment.chars().count() as u64;
        self.output_bytes += fragment.len() as u64;
    }

    /// Estimated output tokens using the same heuristic as [`estimate_tokens`].
    #[must_use]
    pub fn estimated_output_tokens(&self) -> u64 {
        self.output_bytes.div_ceil(4)
    }
}

/// Log a completed generation at INFO level.
pub fn log_generation_usage(
    step: WorkflowStep,
    provider: ProviderKind,
    input_tokens: u64,
    tally: &GenerationTally,
    termination: Termination,
    duration: Duration,
) {
    info!(
        step = %step,
        provider = %provider,
        fragments = tally.fragments,
        output_chars = tally.output_chars,
        estimated_input_tokens = input_tokens,
        estimated_output_tokens = tally.estimated_output_tokens(),
        termination = ?termination,
        duration_seconds = duration.as_secs_f64(),
        "generation completed"
    );
}
