use std::time::{SystemTime, UNIX_EPOCH};

const SSE_DATA_MARKER: &str = "data: ";
const SSE_DONE_SENTINEL: &str = "[DONE]";

#[inline]
pub(crate) fn unix_now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| {
            i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Payload of an SSE `data: ` line, or `None` for any other line.
///
/// Only the exact `data: ` marker is recognized; blank lines, comments and
/// other fields are not data lines.
#[inline]
pub(crate) fn sse_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(SSE_DATA_MARKER)
}

#[inline]
pub(crate) fn is_done_payload(payload: &str) -> bool {
    payload == SSE_DONE_SENTINEL
}

/// Decode a JSON data payload, treating malformed JSON as absent.
#[inline]
pub(crate) fn parse_sse_json<T>(payload: &str) -> Option<T>
where
    T: serde::de::DeserializeOwned,
{
    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(
                error = %err,
                payload_len = payload.len(),
                "skipping malformed stream payload"
            );
            None
        }
    }
}

#[inline]
pub(crate) fn trim_base_url(base: &str) -> &str {
    base.trim().trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_payload_requires_exact_marker() {
        assert_eq!(sse_data_payload("data: {}"), Some("{}"));
        assert_eq!(sse_data_payload("data:{}"), None);
        assert_eq!(sse_data_payload(""), None);
        assert_eq!(sse_data_payload(": keep-alive"), None);
        assert_eq!(sse_data_payload("event: message"), None);
    }

    #[test]
    fn done_payload_requires_exact_match() {
        assert!(is_done_payload("[DONE]"));
        assert!(!is_done_payload("[DONE] "));
        assert!(!is_done_payload(" [DONE]"));
        assert!(!is_done_payload("[done]"));
        assert!(!is_done_payload("{\"done\":true}"));
    }

    #[test]
    fn trim_base_url_drops_trailing_slashes() {
        assert_eq!(trim_base_url("https://api.openai.com/v1/"), "https://api.openai.com/v1");
        assert_eq!(trim_base_url(" http://localhost:8080 "), "http://localhost:8080");
    }
}
