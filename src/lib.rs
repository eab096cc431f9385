//! # pdf-qa-client
//!
//! Ask questions about a PDF through a retrieval-augmented QA service and
//! follow the answers as they stream in.
//!
//! ## Why this crate?
//!
//! The service answers with a chunked body of `data: {json}` lines. Read
//! naively, that body breaks in three places: lines split across network
//! reads, multi-byte characters split across lines, and markdown rendered
//! while half of a `**bold**` marker has arrived. This crate reassembles the
//! stream, keeps the answer as plain text while it is live, and renders it to
//! safe HTML exactly once when the answer is complete.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Select   check the local file is a readable %PDF
//!  ├─ 2. Upload   multipart POST /upload/ → server path
//!  ├─ 3. Ask      form POST /ask/ → chunked answer body
//!  ├─ 4. Frame    bytes → lines (UTF-8 safe across reads)
//!  ├─ 5. Parse    `data:` lines → Chunk / Done / Failed events
//!  ├─ 6. Consume  live plain-text entry, pending indicator, error policy
//!  └─ 7. Render   markdown subset → styled HTML, once, at completion
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_qa_client::{ClientConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://127.0.0.1:8000")
//!         .build()?;
//!     let mut session = Session::new(config)?;
//!     session.upload("paper.pdf").await?;
//!     let stats = session.ask("What is the main contribution?").await?;
//!     eprintln!("{} chunks in {}ms", stats.chunks, stats.duration_ms);
//!     println!("{}", session.transcript().to_html());
//!     Ok(())
//! }
//! ```
//!
//! The renderer and the stream consumer work without a server:
//!
//! ```rust
//! use pdf_qa_client::render_markdown;
//!
//! let html = render_markdown("**Summary**:\n1. first\n2. second");
//! assert_eq!(html.matches("<li").count(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfqa` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf-qa-client = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod consumer;
pub mod document;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod session;
pub mod transcript;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{AnswerStream, QaClient, UploadReceipt};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL};
pub use consumer::{consume_stream, StreamConsumer, StreamStats};
pub use document::{display_name, format_file_size, select_document, SelectedDocument};
pub use error::{FrameError, PdfQaError};
pub use observer::{NoopObserver, NotificationLevel, Observer, SessionObserver};
pub use pipeline::event::{parse_line, StreamEvent};
pub use pipeline::markdown::{escape_html, render_markdown};
pub use session::{Session, SessionState};
pub use transcript::{EntryId, EntryStatus, Role, Transcript, TranscriptEntry};
