use memchr::memchr_iter;

/// Incremental `\n`-delimited line decoder.
///
/// Lines are yielded without their terminator; a `\r` directly before the
/// `\n` is stripped as well. Invalid UTF-8 is replaced with U+FFFD. A partial
/// trailing line or UTF-8 sequence is held until the next chunk.
pub struct LineDecoder {
    buffer: String,
    read_offset: usize,
    remainder: Vec<u8>,
}

impl LineDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            read_offset: 0,
            remainder: Vec::new(),
        }
    }

    /// Feed a raw chunk and return the lines it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        self.feed_into(chunk, &mut out);
        out
    }

    /// Feed a raw chunk and append completed lines into a caller-provided buffer.
    pub fn feed_into(&mut self, chunk: &[u8], out: &mut Vec<String>) {
        self.decode_chunk(chunk);
        self.drain_lines(out);
    }

    /// Bytes held back because they do not yet form a complete line.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.buffer.len() - self.read_offset + self.remainder.len()
    }

    fn decode_chunk(&mut self, chunk: &[u8]) {
        if self.remainder.is_empty() {
            let tail = decode_lossy_prefix(chunk, &mut self.buffer);
            self.remainder.extend_from_slice(tail);
            return;
        }

        let mut pending = std::mem::take(&mut self.remainder);
        pending.extend_from_slice(chunk);
        let tail_len = decode_lossy_prefix(&pending, &mut self.buffer).len();
        let consumed = pending.len() - tail_len;
        pending.drain(..consumed);
        self.remainder = pending;
    }

    fn drain_lines(&mut self, out: &mut Vec<String>) {
        let mut processed_up_to = self.read_offset;
        let scan_start = processed_up_to;
        for rel_pos in memchr_iter(b'\n', &self.buffer.as_bytes()[scan_start..]) {
            let line_end = scan_start + rel_pos;
            let line = &self.buffer[processed_up_to..line_end];
            let line = line.strip_suffix('\r').unwrap_or(line);
            out.push(line.to_owned());
            processed_up_to = line_end + 1;
        }

        self.read_offset = processed_up_to;
        if self.read_offset == self.buffer.len() {
            self.buffer.clear();
            self.read_offset = 0;
            return;
        }
        let should_compact = self.read_offset > 0
            && (self.read_offset >= self.buffer.len() / 2 || self.read_offset >= 8 * 1024);
        if should_compact {
            self.buffer.drain(..self.read_offset);
            self.read_offset = 0;
        }
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Append the decodable prefix of `bytes` to `out` and return the trailing
/// incomplete UTF-8 sequence, if any.
fn decode_lossy_prefix<'a>(mut bytes: &'a [u8], out: &mut String) -> &'a [u8] {
    loop {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                out.push_str(text);
                return &[];
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match err.error_len() {
                    None => return rest,
                    Some(invalid_len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        bytes = &rest[invalid_len..];
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_in_chunks(input: &[u8], boundaries: &[usize]) -> Vec<String> {
        let mut decoder = LineDecoder::new();
        let mut out = Vec::new();
        let mut start = 0;
        for &end in boundaries {
            decoder.feed_into(&input[start..end], &mut out);
            start = end;
        }
        decoder.feed_into(&input[start..], &mut out);
        out
    }

    #[test]
    fn test_single_chunk_lines() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.feed(b"data: a\n\ndata: b\n");
        assert_eq!(lines, vec!["data: a", "", "data: b"]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_partial_line_is_carried_over() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.feed(b"data: hel").is_empty());
        assert_eq!(decoder.pending_len(), 9);
        assert_eq!(decoder.feed(b"lo\nda"), vec!["data: hello"]);
        assert_eq!(decoder.feed(b"ta: x\n"), vec!["data: x"]);
    }

    #[test]
    fn test_crlf_terminators_are_stripped() {
        let mut decoder = LineDecoder::new();
        assert_eq!(
            decoder.feed(b"data: a\r\n\r\ndata: [DONE]\r\n"),
            vec!["data: a", "", "data: [DONE]"]
        );
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.feed(b"data: a\r").is_empty());
        assert_eq!(decoder.feed(b"\n"), vec!["data: a"]);
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let input = "data: 你好\n".as_bytes();
        // "你" occupies bytes 6..9; split inside it.
        let lines = decode_in_chunks(input, &[7, 8]);
        assert_eq!(lines, vec!["data: 你好"]);
    }

    #[test]
    fn test_every_split_point_matches_unsplit_input() {
        let input = "data: {\"t\":\"é😀\"}\n\n: comment\r\ndata: [DONE]\ntrailing".as_bytes();
        let expected = LineDecoder::new().feed(input);
        for a in 0..=input.len() {
            for b in a..=input.len() {
                assert_eq!(
                    decode_in_chunks(input, &[a, b]),
                    expected,
                    "split at {a}/{b}"
                );
            }
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let input = "data: ü\ndata: ß\n".as_bytes();
        let mut decoder = LineDecoder::new();
        let mut out = Vec::new();
        for byte in input {
            decoder.feed_into(std::slice::from_ref(byte), &mut out);
        }
        assert_eq!(out, vec!["data: ü", "data: ß"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.feed(b"ab\xffcd\n");
        assert_eq!(lines, vec!["ab\u{fffd}cd"]);
    }

    #[test]
    fn test_trailing_partial_line_is_never_emitted() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.feed(b"line\ntail"), vec!["line"]);
        assert_eq!(decoder.pending_len(), 4);
    }

    #[test]
    fn test_compaction_keeps_line_boundaries() {
        let mut decoder = LineDecoder::new();
        let long = "x".repeat(10_000);
        let mut chunk = format!("{long}\n");
        chunk.push_str("partial");
        assert_eq!(decoder.feed(chunk.as_bytes()), vec![long]);
        assert_eq!(decoder.feed(b" end\n"), vec!["partial end"]);
    }
}
