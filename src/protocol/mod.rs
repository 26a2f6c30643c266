pub mod canonical;
pub mod gemini;
pub mod openai_chat;

pub use canonical::{LineOutcome, PromptPair, ProviderKind, StreamEvent, Termination};

/// Decode one protocol line with the adapter for `provider`.
#[must_use]
pub fn decode_line(provider: ProviderKind, line: &str) -> LineOutcome {
    match provider {
        ProviderKind::OpenAiChat => openai_chat::stream::decode_openai_sse_line(line),
        ProviderKind::Gemini => gemini::stream::decode_gemini_sse_line(line),
    }
}
