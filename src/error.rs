//! Error types for the pdf-qa-client library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PdfQaError`] is **fatal for one operation**. The upload or the current
//!   question cannot proceed (bad input file, server rejected the request,
//!   connection dropped). Returned as `Err(PdfQaError)` from the
//!   [`crate::session::Session`] and [`crate::client::QaClient`] methods.
//!   The transcript and the uploaded-document state survive it.
//!
//! * [`FrameError`] is **non-fatal**. A single `data:` line of the answer
//!   stream could not be understood. It is logged and counted in
//!   [`crate::consumer::StreamStats`] while the rest of the stream is still
//!   consumed, so one garbled frame never costs the whole answer.

use std::path::PathBuf;
use thiserror::Error;

/// All operation-level errors returned by the pdf-qa-client library.
///
/// Per-line stream failures use [`FrameError`] and never propagate here.
#[derive(Debug, Error)]
pub enum PdfQaError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Document was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("Please upload a PDF file: '{path}' is not a PDF\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Reading a local file failed after it was opened.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Server errors ─────────────────────────────────────────────────────
    /// The upload endpoint answered with a non-2xx status.
    #[error("Upload failed: {detail}")]
    UploadFailed { status: u16, detail: String },

    /// The ask endpoint answered with a non-2xx status before streaming.
    #[error("{detail}")]
    AskFailed { status: u16, detail: String },

    /// The server sent an error frame in place of an answer.
    #[error("{0}")]
    ServerError(String),

    // ── Transport errors ──────────────────────────────────────────────────
    /// The HTTP request could not be sent or its response could not be read.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// The answer stream broke off after it started.
    #[error("Answer stream interrupted: {0}")]
    StreamInterrupted(String),

    /// The answer stream ended without producing any text.
    #[error("The server returned an empty answer")]
    EmptyAnswer,

    // ── Session errors ────────────────────────────────────────────────────
    /// A question was asked before any document was uploaded.
    #[error("Please upload a PDF first")]
    NoDocument,

    /// The question was empty after trimming.
    #[error("Please enter a question")]
    EmptyQuestion,

    /// Another question is still being answered.
    #[error("A question is already being answered; wait for it to finish")]
    QuestionInFlight,

    /// An upload is still running.
    #[error("An upload is already in progress")]
    UploadInFlight,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PdfQaError {
    /// Wrap a `reqwest` failure with a short description of what was attempted.
    pub fn transport(context: impl Into<String>, source: reqwest::Error) -> Self {
        PdfQaError::Transport {
            context: context.into(),
            source,
        }
    }
}

/// A non-fatal error for a single line of the answer stream.
///
/// Counted and logged by [`crate::consumer::StreamConsumer`]; the stream
/// continues with the next line.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FrameError {
    /// The `data:` payload is not valid JSON.
    #[error("Malformed stream frame {line:?}: {detail}")]
    InvalidJson { line: String, detail: String },

    /// The payload is JSON but carries neither `chunk` nor `done`.
    #[error("Unrecognised stream frame {line:?}")]
    UnexpectedShape { line: String },
}
