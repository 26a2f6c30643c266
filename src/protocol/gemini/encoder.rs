use crate::error::ArchitectError;
use crate::protocol::canonical::PromptPair;
use crate::util::trim_base_url;

use super::{GeminiContent, GeminiGenerationConfig, GeminiPart, GeminiRequest};

/// `{base}/v1beta/models/{model}:streamGenerateContent?alt=sse&key={credential}`.
///
/// # Errors
///
/// Returns [`ArchitectError::InvalidRequest`] when the joined URL does not
/// parse.
pub fn stream_generate_url(
    endpoint_base: &str,
    model: &str,
    credential: &str,
) -> Result<url::Url, ArchitectError> {
    let raw = format!(
        "{}/v1beta/models/{model}:streamGenerateContent",
        trim_base_url(endpoint_base)
    );
    let mut url = url::Url::parse(&raw)
        .map_err(|e| ArchitectError::InvalidRequest(format!("Invalid endpoint URL: {e}")))?;
    url.query_pairs_mut()
        .append_pair("alt", "sse")
        .append_pair("key", credential);
    Ok(url)
}

/// Request headers; the credential travels in the query string.
#[must_use]
pub fn build_stream_headers() -> http::HeaderMap {
    let mut headers = http::HeaderMap::with_capacity(2);
    headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        http::header::ACCEPT,
        http::HeaderValue::from_static("text/event-stream"),
    );
    headers
}

/// Encode a prompt pair as a single user-role message.
///
/// This usage has no separate system role, so the system prompt precedes the
/// user message, separated by a blank line.
#[must_use]
pub fn encode_stream_request(prompt: &PromptPair, max_output_tokens: u32) -> GeminiRequest {
    let mut text = String::with_capacity(prompt.system.len() + prompt.user.len() + 2);
    text.push_str(&prompt.system);
    text.push_str("\n\n");
    text.push_str(&prompt.user);

    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart { text: Some(text) }],
        }],
        generation_config: GeminiGenerationConfig { max_output_tokens },
    }
}
