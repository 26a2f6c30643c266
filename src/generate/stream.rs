use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use futures_util::stream::FusedStream;
use futures_util::{Stream, StreamExt};

use crate::error::ArchitectError;
use crate::observability::token_counter::{log_generation_usage, GenerationTally};
use crate::prompt::WorkflowStep;
use crate::protocol::canonical::{LineOutcome, ProviderKind, StreamEvent, Termination};
use crate::protocol::decode_line;
use crate::stream::ProtocolLines;

type BoxedBody = Pin<Box<dyn Stream<Item = Result<Bytes, String>> + Send>>;

/// Ordered text fragments of one generation.
///
/// Yields zero or more [`StreamEvent::Fragment`]s followed by exactly one
/// [`StreamEvent::Complete`], or ends after a single error. Dropping the
/// stream (or calling [`GenerationStream::close`]) releases the provider
/// connection.
pub struct GenerationStream {
    lines: Option<ProtocolLines<BoxedBody>>,
    provider: ProviderKind,
    step: WorkflowStep,
    input_tokens: u64,
    tally: GenerationTally,
    started: Instant,
    finished: bool,
}

impl GenerationStream {
    /// Wrap a provider response body.
    pub fn from_byte_stream<S, E>(
        provider: ProviderKind,
        step: WorkflowStep,
        input_tokens: u64,
        body: S,
    ) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: fmt::Display,
    {
        let body: BoxedBody = Box::pin(body.map(|chunk| chunk.map_err(|err| err.to_string())));
        Self {
            lines: Some(ProtocolLines::new(body)),
            provider,
            step,
            input_tokens,
            tally: GenerationTally::default(),
            started: Instant::now(),
            finished: false,
        }
    }

    #[must_use]
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    #[must_use]
    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    /// Stop consuming and release the underlying connection.
    pub fn close(self) {
        drop(self);
    }

    fn complete(&mut self, termination: Termination) -> StreamEvent {
        self.finished = true;
        self.lines = None;
        log_generation_usage(
            self.step,
            self.provider,
            self.input_tokens,
            &self.tally,
            termination,
            self.started.elapsed(),
        );
        StreamEvent::Complete(termination)
    }
}

impl Stream for GenerationStream {
    type Item = Result<StreamEvent, ArchitectError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let Some(lines) = this.lines.as_mut() else {
                return Poll::Ready(None);
            };

            match Pin::new(lines).poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(line))) => match decode_line(this.provider, &line) {
                    LineOutcome::Skip => {}
                    LineOutcome::Fragment(text) => {
                        this.tally.record_fragment(&text);
                        return Poll::Ready(Some(Ok(StreamEvent::Fragment(text))));
                    }
                    LineOutcome::Done => {
                        return Poll::Ready(Some(Ok(this.complete(Termination::Sentinel))));
                    }
                },
                Poll::Ready(Some(Err(err))) => {
                    this.finished = true;
                    this.lines = None;
                    tracing::warn!(
                        step = %this.step,
                        provider = %this.provider,
                        fragments = this.tally.fragments,
                        error = %err,
                        "generation stream failed"
                    );
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    return Poll::Ready(Some(Ok(this.complete(Termination::EndOfStream))));
                }
            }
        }
    }
}

impl FusedStream for GenerationStream {
    fn is_terminated(&self) -> bool {
        self.lines.is_none()
    }
}

impl Drop for GenerationStream {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                step = %self.step,
                provider = %self.provider,
                fragments = self.tally.fragments,
                "generation stream dropped before completion"
            );
        }
    }
}

/// Drain a stream into its concatenated text and termination.
///
/// # Errors
///
/// Returns the first error the stream yields.
pub async fn collect_text(
    mut stream: GenerationStream,
) -> Result<(String, Termination), ArchitectError> {
    let mut text = String::new();
    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Fragment(fragment) => text.push_str(&fragment),
            StreamEvent::Complete(termination) => return Ok((text, termination)),
        }
    }
    Err(ArchitectError::Internal(
        "generation stream ended without completion".to_string(),
    ))
}
