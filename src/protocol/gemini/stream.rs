use crate::protocol::canonical::LineOutcome;
use crate::util::{parse_sse_json, sse_data_payload};

use super::GeminiResponse;

/// Decode one protocol line of a Gemini `alt=sse` stream.
///
/// Gemini has no terminal sentinel, so this never returns
/// [`LineOutcome::Done`]; the stream ends when the body closes. Malformed
/// JSON and chunks without text are skipped.
#[must_use]
pub fn decode_gemini_sse_line(line: &str) -> LineOutcome {
    let Some(payload) = sse_data_payload(line) else {
        return LineOutcome::Skip;
    };
    let Some(chunk) = parse_sse_json::<GeminiResponse>(payload) else {
        return LineOutcome::Skip;
    };
    match first_part_text(chunk) {
        Some(text) => LineOutcome::Fragment(text),
        None => LineOutcome::Skip,
    }
}

fn first_part_text(chunk: GeminiResponse) -> Option<String> {
    let candidate = chunk.candidates?.into_iter().next()?;
    let part = candidate.content?.parts.into_iter().next()?;
    part.text.filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_text_becomes_fragment() {
        let outcome = decode_gemini_sse_line(
            r#"data: {"candidates":[{"content":{"parts":[{"text":"Hi"}]}}]}"#,
        );
        assert_eq!(outcome, LineOutcome::Fragment("Hi".into()));
    }

    #[test]
    fn test_done_literal_is_not_a_sentinel() {
        assert_eq!(decode_gemini_sse_line("data: [DONE]"), LineOutcome::Skip);
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        assert_eq!(
            decode_gemini_sse_line(r#"data: {"candidates":[{"content""#),
            LineOutcome::Skip
        );
    }

    #[test]
    fn test_chunks_without_text_are_skipped() {
        for line in [
            r#"data: {}"#,
            r#"data: {"candidates":[]}"#,
            r#"data: {"candidates":[{"finishReason":"STOP"}]}"#,
            r#"data: {"candidates":[{"content":{"parts":[]}}]}"#,
            r#"data: {"candidates":[{"content":{"role":"model","parts":[{"functionCall":{"name":"f","args":{}}}]}}]}"#,
            r#"data: {"usageMetadata":{"promptTokenCount":3}}"#,
        ] {
            assert_eq!(decode_gemini_sse_line(line), LineOutcome::Skip, "{line}");
        }
    }

    #[test]
    fn test_final_chunk_with_finish_reason_keeps_text() {
        let outcome = decode_gemini_sse_line(
            r#"data: {"candidates":[{"content":{"role":"model","parts":[{"text":"end."}]},"finishReason":"STOP","index":0}],"modelVersion":"gemini-2.0-flash"}"#,
        );
        assert_eq!(outcome, LineOutcome::Fragment("end.".into()));
    }
}
