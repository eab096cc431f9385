//! Event parsing: map one framed line to a [`StreamEvent`].
//!
//! Only lines carrying the `data: ` prefix are events; anything else
//! (blank keep-alive lines, SSE comments) is skipped without comment.

use crate::error::FrameError;
use serde::{Deserialize, Serialize};

/// Prefix marking a line that carries a JSON payload.
pub const DATA_PREFIX: &str = "data: ";

/// One decoded event of the answer stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// A piece of answer text, appended verbatim.
    Chunk(String),
    /// Terminal marker: the answer is complete.
    Done,
    /// Terminal marker: the server failed to produce an answer.
    Failed(String),
}

impl StreamEvent {
    /// Whether no further events are expected after this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Failed(_))
    }
}

/// Prefix the server puts on the message of an error frame.
const SERVER_ERROR_PREFIX: &str = "Error: ";

/// Wire shape of a `data:` payload. Unknown keys (`status`, …) are ignored.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    chunk: Option<String>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    error: Option<bool>,
}

/// Parse one complete line.
///
/// Returns `Ok(None)` for lines that are not events.
///
/// Precedence when keys are combined: `error` beats `done`, which beats
/// `chunk`. The start frame `{"chunk": "", "done": false}` therefore yields
/// an empty `Chunk`, and the closing `{"chunk": "", "done": true}` yields
/// `Done`.
pub fn parse_line(line: &str) -> Result<Option<StreamEvent>, FrameError> {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };

    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| FrameError::InvalidJson {
            line: line.to_string(),
            detail: e.to_string(),
        })?;

    let frame: RawFrame =
        serde_json::from_value(value).map_err(|_| FrameError::UnexpectedShape {
            line: line.to_string(),
        })?;

    if frame.error.unwrap_or(false) {
        let message = frame
            .chunk
            .as_deref()
            .map(|c| c.strip_prefix(SERVER_ERROR_PREFIX).unwrap_or(c))
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "Unknown server error".to_string());
        return Ok(Some(StreamEvent::Failed(message)));
    }
    if frame.done.unwrap_or(false) {
        return Ok(Some(StreamEvent::Done));
    }
    match frame.chunk {
        Some(text) => Ok(Some(StreamEvent::Chunk(text))),
        None => Err(FrameError::UnexpectedShape {
            line: line.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_line() {
        assert_eq!(
            parse_line(r#"data: {"chunk": "Hello "}"#),
            Ok(Some(StreamEvent::Chunk("Hello ".into())))
        );
    }

    #[test]
    fn done_line() {
        assert_eq!(parse_line(r#"data: {"done": true}"#), Ok(Some(StreamEvent::Done)));
    }

    #[test]
    fn done_wins_over_empty_chunk() {
        assert_eq!(
            parse_line(r#"data: {"chunk": "", "done": true}"#),
            Ok(Some(StreamEvent::Done))
        );
    }

    #[test]
    fn start_frame_is_empty_chunk() {
        assert_eq!(
            parse_line(r#"data: {"chunk": "", "done": false, "status": "started"}"#),
            Ok(Some(StreamEvent::Chunk(String::new())))
        );
    }

    #[test]
    fn error_frame_is_failed() {
        let ev = parse_line(r#"data: {"chunk": "Error: quota", "done": true, "error": true}"#);
        assert_eq!(ev, Ok(Some(StreamEvent::Failed("quota".into()))));
        assert!(ev.unwrap().unwrap().is_terminal());
    }

    #[test]
    fn error_frame_keeps_multiline_detail_without_server_prefix() {
        let ev = parse_line(
            r#"data: {"chunk": "Error: boom\nTraceback (most recent call last)", "done": true, "error": true}"#,
        );
        assert_eq!(
            ev,
            Ok(Some(StreamEvent::Failed(
                "boom\nTraceback (most recent call last)".into()
            )))
        );
    }

    #[test]
    fn error_frame_with_bare_prefix_is_unknown() {
        assert_eq!(
            parse_line(r#"data: {"chunk": "Error: ", "error": true}"#),
            Ok(Some(StreamEvent::Failed("Unknown server error".into())))
        );
    }

    #[test]
    fn non_data_lines_are_skipped() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line(": keep-alive"), Ok(None));
        assert_eq!(parse_line("event: message"), Ok(None));
        assert_eq!(parse_line("data:{\"chunk\":\"x\"}"), Ok(None));
    }

    #[test]
    fn truncated_json_is_invalid() {
        let err = parse_line(r#"data: {"chunk": "Hel"#).unwrap_err();
        assert!(matches!(err, FrameError::InvalidJson { .. }));
    }

    #[test]
    fn wrong_shape_is_reported() {
        assert!(matches!(
            parse_line("data: 42"),
            Err(FrameError::UnexpectedShape { .. })
        ));
        assert!(matches!(
            parse_line(r#"data: {"status": "started"}"#),
            Err(FrameError::UnexpectedShape { .. })
        ));
        assert!(matches!(
            parse_line(r#"data: {"chunk": 7}"#),
            Err(FrameError::UnexpectedShape { .. })
        ));
    }
}
