//! Stream consumer: apply a streamed answer to the transcript.
//!
//! ## Lifecycle of one answer
//!
//! ```text
//! new()            pending indicator shown
//!   │  feed(bytes) … first non-empty chunk
//!   ▼
//! live entry       plain text, refreshed on every chunk
//!   │  Done event (or end of stream)
//!   ▼
//! finalized        rendered to HTML exactly once, then frozen
//! ```
//!
//! An error before the first chunk removes the indicator and appends a single
//! error entry. An error after it keeps the partial text and appends an
//! error marker to the same entry. Malformed lines are logged and skipped.
//!
//! The consumer never renders markdown while text is still arriving: a
//! half-received `**bold` would otherwise flash as broken markup.

use crate::error::PdfQaError;
use crate::observer::Observer;
use crate::pipeline::event::{parse_line, StreamEvent};
use crate::pipeline::frame::LineFramer;
use crate::pipeline::markdown::{escape_html, render_markdown};
use crate::transcript::{EntryId, Transcript};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters for one consumed answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    /// Raw bytes fed in.
    pub bytes: usize,
    /// Complete lines seen, including non-event lines.
    pub lines: usize,
    /// `chunk` events that carried text. The empty start frame is not counted.
    pub chunks: usize,
    /// `data:` lines that could not be parsed.
    pub malformed_lines: usize,
    /// Byte length of the final answer text.
    pub answer_len: usize,
    /// Whether an explicit `done` event was received.
    pub saw_done: bool,
    /// Wall-clock time from construction to completion.
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Indicator shown, no text yet.
    Pending,
    /// Text is arriving into this entry.
    Live(EntryId),
    /// Finalized or failed; nothing more is applied.
    Finished,
}

/// Drives one answer from pending indicator to finalized transcript entry.
pub struct StreamConsumer<'t> {
    transcript: &'t mut Transcript,
    observer: Observer,
    framer: LineFramer,
    buffer: String,
    phase: Phase,
    failure: Option<PdfQaError>,
    stats: StreamStats,
    started: Instant,
}

impl<'t> StreamConsumer<'t> {
    /// Start a new answer: shows the pending indicator.
    pub fn new(transcript: &'t mut Transcript, observer: Observer) -> Self {
        transcript.show_pending();
        observer.on_pending();
        Self {
            transcript,
            observer,
            framer: LineFramer::new(),
            buffer: String::new(),
            phase: Phase::Pending,
            failure: None,
            stats: StreamStats::default(),
            started: Instant::now(),
        }
    }

    /// Whether a terminal event or error has been applied.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Feed one raw chunk of the response body.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.stats.bytes += bytes.len();
        for line in self.framer.push(bytes) {
            self.handle_line(&line);
        }
    }

    /// Record a transport or server failure for the current answer.
    ///
    /// Before any text: the indicator goes and one error entry is appended.
    /// After some text: the partial answer stays, followed by an error marker.
    pub fn fail(&mut self, err: PdfQaError) {
        let message = err.to_string();
        match self.phase {
            Phase::Pending => {
                warn!("Answer failed before any text arrived: {}", message);
                self.transcript.clear_pending();
                self.transcript.push_error(&message);
            }
            Phase::Live(id) => {
                warn!(
                    "Answer failed after {} chars: {}",
                    self.buffer.len(),
                    message
                );
                let mut html = render_markdown(&self.buffer);
                html.push_str(&error_marker(&message));
                self.transcript.fail_entry(id, html);
            }
            Phase::Finished => {
                debug!("Ignoring error after answer completed: {}", message);
                return;
            }
        }
        self.observer.on_answer_error(&message);
        self.phase = Phase::Finished;
        self.failure = Some(err);
    }

    /// End of input: flush the residual line and settle the outcome.
    ///
    /// A stream that ends without `done` but with text is finalized as if
    /// `done` had arrived; one that ends with no text at all is an
    /// [`PdfQaError::EmptyAnswer`].
    pub fn finish(mut self) -> Result<StreamStats, PdfQaError> {
        if let Some(line) = self.framer.finish() {
            self.handle_line(&line);
        }
        match self.phase {
            Phase::Live(_) => {
                debug!("Stream ended without a done event; finalizing");
                self.complete();
            }
            Phase::Pending => self.fail(PdfQaError::EmptyAnswer),
            Phase::Finished => {}
        }

        self.stats.answer_len = self.buffer.len();
        self.stats.duration_ms = self.started.elapsed().as_millis() as u64;

        match self.failure.take() {
            Some(err) => Err(err),
            None => {
                info!(
                    "Answer complete: {} chars, {} chunks, {}ms",
                    self.stats.answer_len, self.stats.chunks, self.stats.duration_ms
                );
                Ok(self.stats)
            }
        }
    }

    /// Read `stream` to its end (or to the first terminal event) and settle.
    pub async fn drive<S, B>(mut self, mut stream: S) -> Result<StreamStats, PdfQaError>
    where
        S: Stream<Item = Result<B, PdfQaError>> + Unpin,
        B: AsRef<[u8]>,
    {
        while let Some(item) = stream.next().await {
            match item {
                Ok(bytes) => {
                    self.feed(bytes.as_ref());
                    if self.is_finished() {
                        break;
                    }
                }
                Err(e) => {
                    self.fail(e);
                    break;
                }
            }
        }
        self.finish()
    }

    fn handle_line(&mut self, line: &str) {
        self.stats.lines += 1;
        match parse_line(line) {
            Ok(Some(event)) => self.apply(event),
            Ok(None) => {}
            Err(e) => {
                self.stats.malformed_lines += 1;
                warn!("Skipping stream line: {}", e);
            }
        }
    }

    fn apply(&mut self, event: StreamEvent) {
        if self.phase == Phase::Finished {
            debug!("Ignoring {:?} after answer completed", event);
            return;
        }
        match event {
            StreamEvent::Chunk(text) => self.append(&text),
            StreamEvent::Done => {
                self.stats.saw_done = true;
                match self.phase {
                    Phase::Live(_) => self.complete(),
                    _ => self.fail(PdfQaError::EmptyAnswer),
                }
            }
            StreamEvent::Failed(message) => self.fail(PdfQaError::ServerError(message)),
        }
    }

    fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.stats.chunks += 1;
        self.buffer.push_str(text);

        if self.phase == Phase::Pending {
            let id = self.transcript.begin_answer();
            self.phase = Phase::Live(id);
            self.observer.on_first_chunk();
        }
        if let Phase::Live(id) = self.phase {
            self.transcript.update_live(id, &self.buffer);
            self.observer.on_chunk(text, &self.buffer);
        }
    }

    fn complete(&mut self) {
        if let Phase::Live(id) = self.phase {
            let html = render_markdown(&self.buffer);
            self.transcript.finalize(id, html.clone());
            self.observer.on_answer_finalized(&html);
            self.phase = Phase::Finished;
        }
    }
}

/// Consume a whole answer stream into `transcript`.
///
/// Shorthand for [`StreamConsumer::new`] followed by [`StreamConsumer::drive`].
pub async fn consume_stream<S, B>(
    stream: S,
    transcript: &mut Transcript,
    observer: Observer,
) -> Result<StreamStats, PdfQaError>
where
    S: Stream<Item = Result<B, PdfQaError>> + Unpin,
    B: AsRef<[u8]>,
{
    StreamConsumer::new(transcript, observer).drive(stream).await
}

fn error_marker(message: &str) -> String {
    format!(
        r#"<div style="margin-top: 0.75rem; color: #dc2626; font-weight: 600;">❌ Error: {}</div>"#,
        escape_html(message)
    )
}
