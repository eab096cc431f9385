//! Observer trait for upload and answer events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::config::ClientConfigBuilder::observer`] to be told, in real time,
//! what a chat UI would have to redraw: the pending indicator appearing, the
//! first piece of answer text replacing it, each refresh of the live text,
//! and the final rendered HTML.
//!
//! The library never draws anything itself. A terminal front-end can echo
//! deltas to stdout, a web bridge can forward them over a socket, and tests
//! can simply count calls.
//!
//! # Example
//!
//! ```rust
//! use pdf_qa_client::{ClientConfig, SessionObserver};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ChunkCounter {
//!     chunks: AtomicUsize,
//! }
//!
//! impl SessionObserver for ChunkCounter {
//!     fn on_chunk(&self, delta: &str, _live_text: &str) {
//!         self.chunks.fetch_add(1, Ordering::SeqCst);
//!         eprint!("{delta}");
//!     }
//! }
//!
//! let counter = Arc::new(ChunkCounter { chunks: AtomicUsize::new(0) });
//!
//! let config = ClientConfig::builder()
//!     .observer(counter as Arc<dyn SessionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::client::UploadReceipt;
use std::sync::Arc;

/// Severity of a one-off notification (the toast of a browser UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Called by the session and stream consumer as a question progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` so a session
/// can be moved onto a tokio task.
pub trait SessionObserver: Send + Sync {
    /// Called before the document is sent.
    ///
    /// # Arguments
    /// * `name`: file name of the document
    /// * `size`: size in bytes
    fn on_upload_start(&self, name: &str, size: u64) {
        let _ = (name, size);
    }

    /// Called once the server has processed the document.
    fn on_upload_complete(&self, receipt: &UploadReceipt) {
        let _ = receipt;
    }

    /// Called when the "generating answer" indicator is shown.
    fn on_pending(&self) {}

    /// Called once per question, when the first non-empty text arrives and
    /// the pending indicator gives way to the live answer.
    fn on_first_chunk(&self) {}

    /// Called for every chunk appended to the live answer.
    ///
    /// # Arguments
    /// * `delta`    : the text just received
    /// * `live_text`: the whole answer so far, as plain text
    fn on_chunk(&self, delta: &str, live_text: &str) {
        let _ = (delta, live_text);
    }

    /// Called once when the answer is complete and rendered.
    fn on_answer_finalized(&self, html: &str) {
        let _ = html;
    }

    /// Called when the current question ends in an error.
    fn on_answer_error(&self, message: &str) {
        let _ = message;
    }

    /// Called for messages a UI would show as a transient notification.
    fn on_notification(&self, level: NotificationLevel, message: &str) {
        let _ = (level, message);
    }
}

/// A no-op implementation for callers that don't need events.
///
/// This is the default when no observer is configured.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type Observer = Arc<dyn SessionObserver>;
