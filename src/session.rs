//! Session: the controller tying upload, questions and the transcript together.
//!
//! ```text
//!            upload()                  ok
//!   Idle ─────────────▶ AwaitingUpload ───▶ Ready ◀──────────────┐
//!    ▲                       │ err           │ ask()             │ answer settled
//!    └───────────────────────┘               ▼                   │ (ok or err)
//!                                      AwaitingAnswer ───────────┘
//! ```
//!
//! A failed re-upload from `Ready` returns to `Ready` with the previous
//! document, so earlier questions can continue.

use crate::client::{QaClient, UploadReceipt};
use crate::config::ClientConfig;
use crate::consumer::{StreamConsumer, StreamStats};
use crate::document::{display_name, select_document};
use crate::error::PdfQaError;
use crate::observer::{NotificationLevel, Observer};
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Where the session is in its upload/question cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No document associated yet.
    #[default]
    Idle,
    /// An upload is in progress. `previous` is the document to fall back to.
    AwaitingUpload { previous: Option<String> },
    /// A document is associated and questions are accepted.
    Ready { document: String },
    /// A question is being answered.
    AwaitingAnswer { document: String },
}

impl SessionState {
    /// Server path of the associated document, if any.
    pub fn document(&self) -> Option<&str> {
        match self {
            Self::Ready { document } | Self::AwaitingAnswer { document } => Some(document),
            Self::AwaitingUpload { previous } => previous.as_deref(),
            Self::Idle => None,
        }
    }

    /// Whether [`SessionState::begin_question`] would succeed.
    pub fn can_ask(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn begin_upload(&mut self) -> Result<(), PdfQaError> {
        let previous = match self {
            Self::Idle => None,
            Self::Ready { document } => Some(std::mem::take(document)),
            Self::AwaitingUpload { .. } => return Err(PdfQaError::UploadInFlight),
            Self::AwaitingAnswer { .. } => return Err(PdfQaError::QuestionInFlight),
        };
        *self = Self::AwaitingUpload { previous };
        Ok(())
    }

    pub fn upload_succeeded(&mut self, document: String) {
        *self = Self::Ready { document };
    }

    pub fn upload_failed(&mut self) {
        *self = match std::mem::take(self) {
            Self::AwaitingUpload {
                previous: Some(document),
            } => Self::Ready { document },
            Self::AwaitingUpload { previous: None } => Self::Idle,
            other => other,
        };
    }

    /// Claim the session for one question and return the document to ask about.
    pub fn begin_question(&mut self) -> Result<String, PdfQaError> {
        match self {
            Self::Ready { document } => {
                let document = document.clone();
                *self = Self::AwaitingAnswer {
                    document: document.clone(),
                };
                Ok(document)
            }
            Self::Idle => Err(PdfQaError::NoDocument),
            Self::AwaitingUpload { .. } => Err(PdfQaError::UploadInFlight),
            Self::AwaitingAnswer { .. } => Err(PdfQaError::QuestionInFlight),
        }
    }

    pub fn answer_finished(&mut self) {
        if let Self::AwaitingAnswer { document } = self {
            *self = Self::Ready {
                document: std::mem::take(document),
            };
        }
    }
}

/// One conversation about one (replaceable) document.
pub struct Session {
    client: QaClient,
    state: SessionState,
    transcript: Transcript,
    observer: Observer,
}

impl Session {
    /// Create a session and post the configured welcome message.
    pub fn new(config: ClientConfig) -> Result<Self, PdfQaError> {
        let client = QaClient::new(&config)?;
        let mut transcript = Transcript::new();
        if let Some(ref welcome) = config.welcome_message {
            transcript.push_bot(welcome.clone());
        }
        Ok(Self {
            client,
            state: SessionState::Idle,
            transcript,
            observer: config.observer(),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Server path of the current document.
    pub fn document(&self) -> Option<&str> {
        self.state.document()
    }

    /// Validate and upload `path`, making it the document for later questions.
    pub async fn upload(&mut self, path: impl AsRef<Path>) -> Result<UploadReceipt, PdfQaError> {
        let doc = match select_document(path) {
            Ok(doc) => doc,
            Err(e) => {
                self.notify(NotificationLevel::Error, &e.to_string());
                return Err(e);
            }
        };

        self.state.begin_upload()?;
        self.observer.on_upload_start(&doc.name, doc.size);

        match self.client.upload(&doc).await {
            Ok(receipt) => {
                self.state.upload_succeeded(receipt.path.clone());
                self.transcript.push_bot(format!(
                    "✅ PDF \"{}\" has been uploaded and processed. You can now ask questions about it!",
                    display_name(&receipt.path)
                ));
                self.observer.on_upload_complete(&receipt);
                self.notify(NotificationLevel::Info, "PDF is processed! Ready for questions!");
                Ok(receipt)
            }
            Err(e) => {
                warn!("Upload of {} failed: {}", doc.name, e);
                self.state.upload_failed();
                self.notify(NotificationLevel::Error, &e.to_string());
                Err(e)
            }
        }
    }

    /// Ask one question and stream the answer into the transcript.
    ///
    /// Validation errors (`EmptyQuestion`, `NoDocument`, in-flight) leave the
    /// transcript untouched. Once the question is accepted it is always
    /// recorded, and the session returns to `Ready` however the answer ends.
    pub async fn ask(&mut self, question: &str) -> Result<StreamStats, PdfQaError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PdfQaError::EmptyQuestion);
        }
        let document = self.state.begin_question()?;

        info!("Asking about {}: {}", display_name(&document), question);
        self.transcript.push_user(question);

        let mut consumer = StreamConsumer::new(&mut self.transcript, self.observer.clone());
        let result = match self.client.ask(&document, question).await {
            Ok(stream) => consumer.drive(stream).await,
            Err(e) => {
                consumer.fail(e);
                consumer.finish()
            }
        };

        self.state.answer_finished();
        if let Err(ref e) = result {
            warn!("Question failed: {}", e);
            self.notify(NotificationLevel::Error, "Failed to get answer");
        }
        result
    }

    /// Force the session out of `AwaitingAnswer` after an `ask` future was
    /// dropped before completion.
    pub fn reset_in_flight(&mut self) {
        if matches!(self.state, SessionState::AwaitingAnswer { .. }) {
            warn!("Resetting abandoned question");
            self.transcript.clear_pending();
            self.state.answer_finished();
        }
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        self.observer.on_notification(level, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::SessionObserver;
    use crate::transcript::{EntryStatus, Role};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Notes(Mutex<Vec<(NotificationLevel, String)>>);

    impl SessionObserver for Notes {
        fn on_notification(&self, level: NotificationLevel, message: &str) {
            self.0.lock().unwrap().push((level, message.to_string()));
        }
    }

    fn ready(doc: &str) -> SessionState {
        SessionState::Ready {
            document: doc.to_string(),
        }
    }

    /// Session pointed at a port nothing listens on.
    fn offline_session(notes: Arc<Notes>) -> Session {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:9")
            .connect_timeout_secs(2)
            .observer(notes)
            .build()
            .unwrap();
        Session::new(config).unwrap()
    }

    #[test]
    fn question_requires_document() {
        let mut s = SessionState::Idle;
        assert!(matches!(s.begin_question(), Err(PdfQaError::NoDocument)));
        assert_eq!(s, SessionState::Idle);
    }

    #[test]
    fn question_rejected_while_in_flight() {
        let mut s = ready("uploads/a.pdf");
        assert_eq!(s.begin_question().unwrap(), "uploads/a.pdf");
        assert!(!s.can_ask());
        assert!(matches!(
            s.begin_question(),
            Err(PdfQaError::QuestionInFlight)
        ));
        s.answer_finished();
        assert_eq!(s, ready("uploads/a.pdf"));
    }

    #[test]
    fn failed_first_upload_returns_to_idle() {
        let mut s = SessionState::Idle;
        s.begin_upload().unwrap();
        assert!(matches!(s.begin_question(), Err(PdfQaError::UploadInFlight)));
        s.upload_failed();
        assert_eq!(s, SessionState::Idle);
    }

    #[test]
    fn failed_reupload_keeps_previous_document() {
        let mut s = ready("uploads/a.pdf");
        s.begin_upload().unwrap();
        assert_eq!(s.document(), Some("uploads/a.pdf"));
        s.upload_failed();
        assert_eq!(s, ready("uploads/a.pdf"));
    }

    #[test]
    fn successful_reupload_replaces_document() {
        let mut s = ready("uploads/a.pdf");
        s.begin_upload().unwrap();
        s.upload_succeeded("uploads/b.pdf".into());
        assert_eq!(s.document(), Some("uploads/b.pdf"));
    }

    #[test]
    fn upload_rejected_during_answer() {
        let mut s = SessionState::AwaitingAnswer {
            document: "x.pdf".into(),
        };
        assert!(matches!(s.begin_upload(), Err(PdfQaError::QuestionInFlight)));
    }

    #[test]
    fn new_session_posts_welcome() {
        let s = Session::new(ClientConfig::default()).unwrap();
        assert_eq!(s.transcript().len(), 1);
        assert_eq!(s.transcript().entries()[0].role, Role::Bot);

        let quiet = ClientConfig::builder().no_welcome_message().build().unwrap();
        assert!(Session::new(quiet).unwrap().transcript().is_empty());
    }

    #[tokio::test]
    async fn ask_validation_leaves_transcript_alone() {
        let mut session = offline_session(Arc::new(Notes::default()));
        let before = session.transcript().len();

        assert!(matches!(
            session.ask("   ").await,
            Err(PdfQaError::EmptyQuestion)
        ));
        assert!(matches!(
            session.ask("what?").await,
            Err(PdfQaError::NoDocument)
        ));

        session.state = SessionState::AwaitingAnswer {
            document: "a.pdf".into(),
        };
        assert!(matches!(
            session.ask("what?").await,
            Err(PdfQaError::QuestionInFlight)
        ));
        assert_eq!(session.transcript().len(), before);
    }

    #[tokio::test]
    async fn unreachable_server_yields_single_error_entry() {
        let notes = Arc::new(Notes::default());
        let mut session = offline_session(notes.clone());
        session.state = ready("uploads/a.pdf");

        let err = session.ask("  summarise it  ").await.unwrap_err();
        assert!(matches!(err, PdfQaError::Transport { .. }), "got {err:?}");

        let entries = session.transcript().entries();
        let user = &entries[entries.len() - 2];
        assert_eq!(user.role, Role::User);
        assert_eq!(user.text, "summarise it");
        let last = entries.last().unwrap();
        assert_eq!(last.status, EntryStatus::Error);
        assert!(last.text.starts_with("❌ Error: Request failed"));

        assert!(!session.transcript().is_pending());
        assert!(session.state().can_ask());
        let notes = notes.0.lock().unwrap();
        assert_eq!(
            notes.last(),
            Some(&(NotificationLevel::Error, "Failed to get answer".to_string()))
        );
    }

    #[tokio::test]
    async fn upload_of_missing_file_notifies_and_stays_idle() {
        let notes = Arc::new(Notes::default());
        let mut session = offline_session(notes.clone());

        let err = session.upload("/no/such/file.pdf").await.unwrap_err();
        assert!(matches!(err, PdfQaError::FileNotFound { .. }));
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(notes.0.lock().unwrap()[0].0, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn upload_transport_failure_restores_state() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.4\n%%EOF\n").unwrap();

        let mut session = offline_session(Arc::new(Notes::default()));
        session.state = ready("uploads/old.pdf");

        assert!(session.upload(f.path()).await.is_err());
        assert_eq!(session.state(), &ready("uploads/old.pdf"));
    }

    #[test]
    fn reset_in_flight_recovers() {
        let mut session = offline_session(Arc::new(Notes::default()));
        session.state = SessionState::AwaitingAnswer {
            document: "a.pdf".into(),
        };
        session.transcript.show_pending();
        session.reset_in_flight();
        assert_eq!(session.state(), &ready("a.pdf"));
        assert!(!session.transcript().is_pending());
    }
}
