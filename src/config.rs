//! Configuration types for the QA client.
//!
//! Everything a [`crate::session::Session`] needs to know about the service
//! it talks to lives in [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. The defaults match the reference server: two
//! endpoints under one base URL, no request timeout on the answer stream.

use crate::error::PdfQaError;
use crate::observer::{NoopObserver, Observer};
use std::fmt;
use std::sync::Arc;

/// Default base URL of the QA service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Bot message shown when a session starts.
pub const DEFAULT_WELCOME: &str =
    "👋 Welcome! Upload a PDF document to get started. I'll analyze it and answer your questions.";

/// Configuration for a [`crate::session::Session`].
///
/// # Example
/// ```rust
/// use pdf_qa_client::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:8000")
///     .connect_timeout_secs(5)
///     .build()
///     .unwrap();
/// assert_eq!(config.ask_url(), "http://localhost:8000/ask/");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Scheme, host and port of the service, without a trailing slash.
    /// Default: `http://127.0.0.1:8000`.
    pub base_url: String,

    /// Path of the upload endpoint. Default: `/upload/`.
    pub upload_path: String,

    /// Path of the ask endpoint. Default: `/ask/`.
    pub ask_path: String,

    /// TCP connect timeout in seconds. Default: 30.
    ///
    /// Only connection setup is bounded. Answers can take as long as the
    /// server needs to generate them, so no timeout applies once the stream
    /// has started.
    pub connect_timeout_secs: u64,

    /// First bot message of a new session. `None` starts with an empty transcript.
    pub welcome_message: Option<String>,

    /// Receiver for upload and answer events.
    pub observer: Option<Observer>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_path: "/upload/".to_string(),
            ask_path: "/ask/".to_string(),
            connect_timeout_secs: 30,
            welcome_message: Some(DEFAULT_WELCOME.to_string()),
            observer: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("upload_path", &self.upload_path)
            .field("ask_path", &self.ask_path)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("welcome_message", &self.welcome_message)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn SessionObserver>"))
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the upload endpoint.
    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url, self.upload_path)
    }

    /// Full URL of the ask endpoint.
    pub fn ask_url(&self) -> String {
        format!("{}{}", self.base_url, self.ask_path)
    }

    /// The configured observer, or a no-op one.
    pub fn observer(&self) -> Observer {
        match self.observer {
            Some(ref obs) => Arc::clone(obs),
            None => Arc::new(NoopObserver),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.config.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn upload_path(mut self, path: impl Into<String>) -> Self {
        self.config.upload_path = path.into();
        self
    }

    pub fn ask_path(mut self, path: impl Into<String>) -> Self {
        self.config.ask_path = path.into();
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    pub fn welcome_message(mut self, text: impl Into<String>) -> Self {
        self.config.welcome_message = Some(text.into());
        self
    }

    pub fn no_welcome_message(mut self) -> Self {
        self.config.welcome_message = None;
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, PdfQaError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(PdfQaError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        for (name, path) in [("upload", &c.upload_path), ("ask", &c.ask_path)] {
            if !path.starts_with('/') {
                return Err(PdfQaError::InvalidConfig(format!(
                    "{name} path must start with '/', got '{path}'"
                )));
            }
        }
        if c.connect_timeout_secs == 0 {
            return Err(PdfQaError::InvalidConfig(
                "connect timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_reference_server() {
        let c = ClientConfig::default();
        assert_eq!(c.upload_url(), "http://127.0.0.1:8000/upload/");
        assert_eq!(c.ask_url(), "http://127.0.0.1:8000/ask/");
        assert!(c.welcome_message.is_some());
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let c = ClientConfig::builder()
            .base_url("https://qa.example.org/")
            .build()
            .unwrap();
        assert_eq!(c.upload_url(), "https://qa.example.org/upload/");
    }

    #[test]
    fn builder_rejects_bad_scheme() {
        let err = ClientConfig::builder()
            .base_url("ftp://host")
            .build()
            .unwrap_err();
        assert!(matches!(err, PdfQaError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_relative_path() {
        assert!(ClientConfig::builder().ask_path("ask").build().is_err());
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(ClientConfig::builder().connect_timeout_secs(0).build().is_err());
    }

    #[test]
    fn debug_hides_observer() {
        let c = ClientConfig::builder()
            .observer(Arc::new(NoopObserver))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn SessionObserver>"));
    }
}
