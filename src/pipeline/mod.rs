//! Pipeline stages that turn a streamed answer body into HTML.
//!
//! Each submodule implements exactly one transformation step and knows
//! nothing about HTTP or the transcript, so each is testable on plain bytes
//! and strings.
//!
//! ## Data Flow
//!
//! ```text
//! bytes ──▶ frame ──▶ event ──▶ (consumer) ──▶ markdown
//! (chunks)  (lines)   (Chunk/Done)  (buffer)    (HTML, once)
//! ```
//!
//! 1. [`frame`]   : reassemble chunk boundaries into whole `\n`-terminated lines
//! 2. [`event`]   : parse `data: {json}` lines into [`event::StreamEvent`]s
//! 3. [`markdown`]: render the completed answer text to styled HTML
//!
//! The stateful step between 2 and 3, accumulating text and updating the
//! transcript, lives in [`crate::consumer`].

pub mod event;
pub mod frame;
pub mod markdown;
