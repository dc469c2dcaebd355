//! Extraction errors raised by extractor and downloader collaborators

use thiserror::Error;

/// Underlying network condition that caused an extraction error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkCause {
    /// Generic URL-level error (unreachable host, aborted transfer)
    Url,
    /// Socket or request timeout
    Timeout,
    /// The source reported the video as currently unavailable
    Unavailable,
    /// Malformed HTTP status line
    BadStatusLine,
    /// Connection refused/reset or DNS resolution failure
    Connect,
    /// HTTP error response
    Http { status: u16 },
}

impl NetworkCause {
    /// Whether this cause is believed to be network instability rather than a defect
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkCause::Url
            | NetworkCause::Timeout
            | NetworkCause::Unavailable
            | NetworkCause::BadStatusLine
            | NetworkCause::Connect => true,
            NetworkCause::Http { status } => *status == 503,
        }
    }
}

impl std::fmt::Display for NetworkCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkCause::Url => write!(f, "url error"),
            NetworkCause::Timeout => write!(f, "timed out"),
            NetworkCause::Unavailable => write!(f, "video unavailable"),
            NetworkCause::BadStatusLine => write!(f, "bad status line"),
            NetworkCause::Connect => write!(f, "connection failed"),
            NetworkCause::Http { status } => write!(f, "HTTP {}", status),
        }
    }
}

/// Which stage of the collaborator raised the error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    /// Metadata extraction
    Extractor,
    /// File download
    Download,
    /// A warning that was not declared as expected
    Warning,
}

impl std::fmt::Display for ExtractionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionErrorKind::Extractor => write!(f, "ExtractorError"),
            ExtractionErrorKind::Download => write!(f, "DownloadError"),
            ExtractionErrorKind::Warning => write!(f, "Warning"),
        }
    }
}

/// Error returned by one extraction attempt
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind}: {message}")]
pub struct ExtractionError {
    kind: ExtractionErrorKind,
    message: String,
    cause: Option<NetworkCause>,
}

impl ExtractionError {
    pub fn extractor(message: impl Into<String>) -> Self {
        Self {
            kind: ExtractionErrorKind::Extractor,
            message: message.into(),
            cause: None,
        }
    }

    pub fn download(message: impl Into<String>) -> Self {
        Self {
            kind: ExtractionErrorKind::Download,
            message: message.into(),
            cause: None,
        }
    }

    pub fn unexpected_warning(message: impl Into<String>) -> Self {
        Self {
            kind: ExtractionErrorKind::Warning,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: NetworkCause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn kind(&self) -> ExtractionErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<NetworkCause> {
        self.cause
    }

    /// Errors without a recognised network cause are fatal
    pub fn is_transient(&self) -> bool {
        self.kind != ExtractionErrorKind::Warning
            && self.cause.is_some_and(|cause| cause.is_transient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_causes() {
        for cause in [
            NetworkCause::Url,
            NetworkCause::Timeout,
            NetworkCause::Unavailable,
            NetworkCause::BadStatusLine,
            NetworkCause::Connect,
            NetworkCause::Http { status: 503 },
        ] {
            assert!(cause.is_transient(), "{} should be transient", cause);
        }
    }

    #[test]
    fn test_fatal_http_statuses() {
        for status in [400, 403, 404, 500, 502] {
            assert!(!NetworkCause::Http { status }.is_transient());
        }
    }

    #[test]
    fn test_error_without_cause_is_fatal() {
        let error = ExtractionError::extractor("Unable to extract title");
        assert!(!error.is_transient());
        assert_eq!(error.to_string(), "ExtractorError: Unable to extract title");
    }

    #[test]
    fn test_error_with_timeout_is_transient() {
        let error = ExtractionError::download("read timed out").with_cause(NetworkCause::Timeout);
        assert!(error.is_transient());
        assert_eq!(error.cause(), Some(NetworkCause::Timeout));
    }

    #[test]
    fn test_warning_is_never_transient() {
        let error =
            ExtractionError::unexpected_warning("Falling back").with_cause(NetworkCause::Timeout);
        assert!(!error.is_transient());
    }
}
