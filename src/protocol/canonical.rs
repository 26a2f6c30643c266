use std::fmt;

use serde::Serialize;

/// Wire protocol family spoken by a provider endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// `POST {base}/chat/completions`, terminated by `data: [DONE]`.
    OpenAiChat,
    /// `POST {base}/v1beta/models/{model}:streamGenerateContent`, terminated by
    /// connection close.
    Gemini,
}

const GOOGLE_API_HOST_MARKER: &str = "googleapis.com";

impl ProviderKind {
    /// Classify an endpoint base by substring.
    ///
    /// This is a routing heuristic, not URL validation: any base mentioning
    /// `googleapis.com` (including `generativelanguage.googleapis.com`) is
    /// treated as Gemini, everything else as OpenAI-compatible.
    #[must_use]
    pub fn classify(endpoint_base: &str) -> Self {
        if endpoint_base.contains(GOOGLE_API_HOST_MARKER) {
            ProviderKind::Gemini
        } else {
            ProviderKind::OpenAiChat
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAiChat => "openai_chat",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System and user prompt for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Result of decoding one protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Not a data line, unparseable, or carrying no text.
    Skip,
    Fragment(String),
    /// Explicit terminal sentinel.
    Done,
}

/// How a successful stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The provider sent its terminal sentinel.
    Sentinel,
    /// The response body closed.
    EndOfStream,
}

/// Item yielded by a generation stream.
///
/// A successful stream yields any number of fragments followed by exactly one
/// `Complete`, whichever provider produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Fragment(String),
    Complete(Termination),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_google_endpoint() {
        assert_eq!(
            ProviderKind::classify("https://generativelanguage.googleapis.com"),
            ProviderKind::Gemini
        );
    }

    #[test]
    fn test_classify_other_endpoints_as_openai() {
        for base in [
            "https://api.openai.com/v1",
            "https://api.deepseek.com",
            "http://localhost:11434/v1",
            "",
        ] {
            assert_eq!(ProviderKind::classify(base), ProviderKind::OpenAiChat, "{base}");
        }
    }

    #[test]
    fn test_termination_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Termination::EndOfStream).unwrap(),
            "\"end_of_stream\""
        );
    }
}
