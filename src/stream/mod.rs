pub mod lines;

pub use lines::LineDecoder;

use std::fmt;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_util::Stream;
use pin_project_lite::pin_project;
use smallvec::SmallVec;

use crate::error::ArchitectError;

struct PendingLines {
    lines: SmallVec<[String; 8]>,
    head: usize,
}

impl PendingLines {
    #[inline]
    fn new() -> Self {
        Self {
            lines: SmallVec::new(),
            head: 0,
        }
    }

    #[inline]
    fn pop_front(&mut self) -> Option<String> {
        if self.head >= self.lines.len() {
            return None;
        }
        let line = std::mem::take(&mut self.lines[self.head]);
        self.head += 1;
        if self.head == self.lines.len() {
            self.lines.clear();
            self.head = 0;
        }
        Some(line)
    }

    #[inline]
    fn extend_from_vec(&mut self, parsed: &mut Vec<String>) {
        if parsed.is_empty() {
            return;
        }
        self.lines.reserve(parsed.len());
        self.lines.extend(parsed.drain(..));
    }
}

pin_project! {
    /// Lazy sequence of protocol lines read from a streamed response body.
    ///
    /// A source error is surfaced once as [`ArchitectError::Transport`] and
    /// ends the sequence. At end-of-stream an unterminated trailing line is
    /// dropped.
    pub struct ProtocolLines<S> {
        #[pin]
        source: S,
        decoder: LineDecoder,
        parsed: Vec<String>,
        pending: PendingLines,
        finished: bool,
    }
}

impl<S> ProtocolLines<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            decoder: LineDecoder::new(),
            parsed: Vec::with_capacity(8),
            pending: PendingLines::new(),
            finished: false,
        }
    }
}

impl<S, B, E> Stream for ProtocolLines<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    type Item = Result<String, ArchitectError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if let Some(line) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(line)));
            }
            if *this.finished {
                return Poll::Ready(None);
            }

            match ready!(this.source.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => {
                    this.decoder.feed_into(chunk.as_ref(), this.parsed);
                    this.pending.extend_from_vec(this.parsed);
                }
                Some(Err(err)) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(ArchitectError::Transport(format!(
                        "Failed to read response body: {err}"
                    )))));
                }
                None => {
                    *this.finished = true;
                    let dropped = this.decoder.pending_len();
                    if dropped > 0 {
                        tracing::debug!(
                            dropped_bytes = dropped,
                            "response body ended inside an unterminated line"
                        );
                    }
                }
            }
        }
    }
}

/// Split a byte stream into protocol lines.
pub fn protocol_lines<S>(byte_stream: S) -> ProtocolLines<S> {
    ProtocolLines::new(byte_stream)
}
