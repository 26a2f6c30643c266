use crate::protocol::canonical::LineOutcome;
use crate::util::{is_done_payload, parse_sse_json, sse_data_payload};

use super::OpenAiStreamChunk;

/// Decode one protocol line of an `OpenAI` chat completion stream.
///
/// Non-data lines, malformed JSON and chunks without delta text are skipped
/// rather than treated as errors; noisy real-world streams rely on this.
/// `data: [DONE]` is the only terminal signal.
#[must_use]
pub fn decode_openai_sse_line(line: &str) -> LineOutcome {
    let Some(payload) = sse_data_payload(line) else {
        return LineOutcome::Skip;
    };
    if is_done_payload(payload) {
        return LineOutcome::Done;
    }
    let Some(chunk) = parse_sse_json::<OpenAiStreamChunk>(payload) else {
        return LineOutcome::Skip;
    };
    match first_delta_content(chunk) {
        Some(text) => LineOutcome::Fragment(text),
        None => LineOutcome::Skip,
    }
}

fn first_delta_content(chunk: OpenAiStreamChunk) -> Option<String> {
    let choice = chunk.choices.into_iter().next()?;
    let content = choice.delta?.content?;
    if content.is_empty() {
        return None;
    }
    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_content_becomes_fragment() {
        let outcome =
            decode_openai_sse_line(r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#);
        assert_eq!(outcome, LineOutcome::Fragment("Hel".into()));
    }

    #[test]
    fn test_done_sentinel() {
        assert_eq!(decode_openai_sse_line("data: [DONE]"), LineOutcome::Done);
    }

    #[test]
    fn test_padded_done_is_skipped() {
        for line in ["data:  [DONE]", "data: [DONE] ", "data: [DONE]\t"] {
            assert_eq!(decode_openai_sse_line(line), LineOutcome::Skip, "{line:?}");
        }
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        assert_eq!(decode_openai_sse_line("data: {not valid json"), LineOutcome::Skip);
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        for line in ["", ": ping", "event: message", "id: 7", "data:[DONE]"] {
            assert_eq!(decode_openai_sse_line(line), LineOutcome::Skip, "{line}");
        }
    }

    #[test]
    fn test_missing_fields_are_skipped() {
        for line in [
            r#"data: {}"#,
            r#"data: {"choices":[]}"#,
            r#"data: {"choices":[{"delta":{}}]}"#,
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":null}}]}"#,
            r#"data: {"choices":[{"delta":{"content":""}}]}"#,
            r#"data: {"choices":[{"finish_reason":"stop"}]}"#,
        ] {
            assert_eq!(decode_openai_sse_line(line), LineOutcome::Skip, "{line}");
        }
    }

    #[test]
    fn test_only_first_choice_is_read() {
        let outcome = decode_openai_sse_line(
            r#"data: {"choices":[{"delta":{"content":"a"}},{"delta":{"content":"b"}}]}"#,
        );
        assert_eq!(outcome, LineOutcome::Fragment("a".into()));
    }

    #[test]
    fn test_full_chunk_with_metadata() {
        let outcome = decode_openai_sse_line(
            r#"data: {"id":"chatcmpl-1","object":"chat.completion.chunk","created":1,"model":"m","choices":[{"index":0,"delta":{"content":" world"},"finish_reason":null}]}"#,
        );
        assert_eq!(outcome, LineOutcome::Fragment(" world".into()));
    }
}
