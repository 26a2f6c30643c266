use crate::error::ArchitectError;
use crate::protocol::canonical::PromptPair;
use crate::util::trim_base_url;

use super::{OpenAiChatRequest, OpenAiMessage};

/// `{base}/chat/completions`.
#[must_use]
pub fn chat_completions_url(endpoint_base: &str) -> String {
    format!("{}/chat/completions", trim_base_url(endpoint_base))
}

/// Build request headers carrying the bearer credential.
///
/// # Errors
///
/// Returns [`ArchitectError::InvalidRequest`] when the credential contains
/// characters that cannot appear in an HTTP header value.
pub fn build_chat_headers(credential: &str) -> Result<http::HeaderMap, ArchitectError> {
    let mut headers = http::HeaderMap::with_capacity(3);
    headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        http::header::ACCEPT,
        http::HeaderValue::from_static("text/event-stream"),
    );
    let mut auth = http::HeaderValue::from_str(&format!("Bearer {credential}")).map_err(|_| {
        ArchitectError::InvalidRequest("API key contains invalid header characters".into())
    })?;
    auth.set_sensitive(true);
    headers.insert(http::header::AUTHORIZATION, auth);
    Ok(headers)
}

/// Encode a prompt pair as a streaming chat completion request with a
/// distinct system message.
#[must_use]
pub fn encode_chat_request(prompt: &PromptPair, model: &str, max_tokens: u32) -> OpenAiChatRequest {
    OpenAiChatRequest {
        model: model.to_string(),
        messages: vec![
            OpenAiMessage {
                role: "system".to_string(),
                content: prompt.system.clone(),
            },
            OpenAiMessage {
                role: "user".to_string(),
                content: prompt.user.clone(),
            },
        ],
        stream: true,
        max_tokens,
    }
}
