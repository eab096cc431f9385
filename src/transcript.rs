//! The chat transcript: an append-only list of entries plus its HTML view.
//!
//! The transcript is plain data. Nothing in it is derived from what a screen
//! currently shows; instead [`Transcript::to_html`] regenerates the visible
//! chat from the entries on demand. That keeps the stream consumer and the
//! renderer testable without any UI at all.
//!
//! The "generating answer" indicator is deliberately *not* an entry. It is a
//! flag beside the list, so showing and hiding it never deletes or reorders
//! entries.

use crate::pipeline::markdown::{escape_html, render_markdown};
use serde::{Deserialize, Serialize};

/// Who wrote an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// Lifecycle of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Bot answer still receiving text; shown as plain text.
    Streaming,
    /// Complete; never mutated again.
    Finalized,
    /// Ended in an error. May hold partial answer text.
    Error,
}

/// One message in the chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    /// Raw text as typed by the user or streamed by the server.
    pub text: String,
    /// Rendered HTML. Only bot entries have it, and only once they stop streaming.
    pub html: Option<String>,
    pub status: EntryStatus,
}

/// Index of an entry inside its [`Transcript`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(usize);

impl EntryId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered, append-only sequence of [`TranscriptEntry`] values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    pending: bool,
}

const ERROR_PREFIX: &str = "❌ Error: ";

const PENDING_HTML: &str = r#"<div class="message message-bot typing-indicator-message"><div class="typing-indicator"><span class="typing-text">✨ Generating answer</span><div class="typing-dots"><div class="typing-dot"></div><div class="typing-dot"></div><div class="typing-dot"></div></div></div></div>"#;

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&TranscriptEntry> {
        self.entries.get(id.0)
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a question. User text is never interpreted as markdown.
    pub fn push_user(&mut self, text: impl Into<String>) -> EntryId {
        self.push(TranscriptEntry {
            role: Role::User,
            text: text.into(),
            html: None,
            status: EntryStatus::Finalized,
        })
    }

    /// Append a complete bot message (welcome and status lines), rendered at once.
    pub fn push_bot(&mut self, text: impl Into<String>) -> EntryId {
        let text = text.into();
        let html = render_markdown(&text);
        self.push(TranscriptEntry {
            role: Role::Bot,
            text,
            html: Some(html),
            status: EntryStatus::Finalized,
        })
    }

    /// Append a bot error line: `❌ Error: <message>`.
    pub fn push_error(&mut self, message: &str) -> EntryId {
        let text = format!("{ERROR_PREFIX}{message}");
        let html = render_markdown(&text);
        self.push(TranscriptEntry {
            role: Role::Bot,
            text,
            html: Some(html),
            status: EntryStatus::Error,
        })
    }

    /// Start a streaming bot answer. Replaces the pending indicator.
    pub fn begin_answer(&mut self) -> EntryId {
        self.pending = false;
        self.push(TranscriptEntry {
            role: Role::Bot,
            text: String::new(),
            html: None,
            status: EntryStatus::Streaming,
        })
    }

    /// Replace the live text of a streaming entry. Returns `false` if the
    /// entry is unknown or no longer streaming.
    pub fn update_live(&mut self, id: EntryId, text: &str) -> bool {
        match self.streaming_mut(id) {
            Some(entry) => {
                entry.text.clear();
                entry.text.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Freeze a streaming entry with its rendered HTML.
    pub fn finalize(&mut self, id: EntryId, html: String) -> bool {
        self.close_streaming(id, html, EntryStatus::Finalized)
    }

    /// Freeze a streaming entry as failed, keeping its partial text.
    pub fn fail_entry(&mut self, id: EntryId, html: String) -> bool {
        self.close_streaming(id, html, EntryStatus::Error)
    }

    pub fn show_pending(&mut self) {
        self.pending = true;
    }

    pub fn clear_pending(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Regenerate the chat view from the entries.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry_html(entry));
        }
        if self.pending {
            out.push_str(PENDING_HTML);
        }
        out
    }

    fn push(&mut self, entry: TranscriptEntry) -> EntryId {
        self.entries.push(entry);
        EntryId(self.entries.len() - 1)
    }

    fn streaming_mut(&mut self, id: EntryId) -> Option<&mut TranscriptEntry> {
        self.entries
            .get_mut(id.0)
            .filter(|e| e.status == EntryStatus::Streaming)
    }

    fn close_streaming(&mut self, id: EntryId, html: String, status: EntryStatus) -> bool {
        match self.streaming_mut(id) {
            Some(entry) => {
                entry.html = Some(html);
                entry.status = status;
                true
            }
            None => false,
        }
    }
}

fn entry_html(entry: &TranscriptEntry) -> String {
    match (entry.role, &entry.html) {
        (Role::User, _) => format!(
            r#"<div class="message message-user"><div class="message-content">{}</div></div>"#,
            escape_html(&entry.text)
        ),
        (Role::Bot, Some(html)) => format!(
            r#"<div class="message message-bot"><div class="message-content">{html}</div></div>"#
        ),
        (Role::Bot, None) => format!(
            r#"<div class="message message-bot"><div class="message-content" style="white-space: pre-wrap; line-height: 1.8;">{}</div></div>"#,
            escape_html(&entry.text)
        ),
    }
}
