use thiserror::Error;

use crate::domain::extractor::{ExtractionError, ExtractionErrorKind};

/// Harness errors - every way a test unit can end without passing
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Test definition incorrect: {message}")]
    MalformedDefinition { message: String },

    #[error("Transient network failure: {message}")]
    TransientNetworkFailure { message: String },

    #[error("Extraction failed: {0}")]
    ExtractionDefect(ExtractionError),

    #[error("{message}")]
    ValidationMismatch {
        subject: String,
        expected: String,
        actual: String,
        message: String,
    },

    #[error("Unexpected warning: {message}")]
    UnexpectedWarning { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

impl HarnessError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDefinition {
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientNetworkFailure {
            message: message.into(),
        }
    }

    pub fn mismatch(
        subject: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ValidationMismatch {
            subject: subject.into(),
            expected: expected.into(),
            actual: actual.into(),
            message: message.into(),
        }
    }

    pub fn unexpected_warning(message: impl Into<String>) -> Self {
        Self::UnexpectedWarning {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn io(path: impl std::fmt::Display, error: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.to_string(),
            message: error.to_string(),
        }
    }

    /// Assertion failures, as opposed to errors raised while running the unit
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ValidationMismatch { .. })
    }
}

impl From<ExtractionError> for HarnessError {
    fn from(err: ExtractionError) -> Self {
        match err.kind() {
            ExtractionErrorKind::Warning => Self::unexpected_warning(err.message()),
            _ if err.is_transient() => Self::transient(err.to_string()),
            _ => Self::ExtractionDefect(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_error() {
        let error = HarnessError::malformed("Are both 'id' and 'ext' keys present?");
        assert_eq!(
            error.to_string(),
            "Test definition incorrect: Are both 'id' and 'ext' keys present?"
        );
        assert!(!error.is_failure());
    }

    #[test]
    fn test_mismatch_is_failure() {
        let error = HarnessError::mismatch("title", "Example", "Other", "title mismatch");
        assert_eq!(error.to_string(), "title mismatch");
        assert!(error.is_failure());
    }

    #[test]
    fn test_io_error() {
        let error = HarnessError::io("/tmp/a.mp4", "permission denied");
        assert_eq!(error.to_string(), "I/O error on /tmp/a.mp4: permission denied");
    }

    #[test]
    fn test_from_extraction_error() {
        let warning: HarnessError = ExtractionError::unexpected_warning("odd").into();
        assert!(matches!(warning, HarnessError::UnexpectedWarning { .. }));

        let defect: HarnessError = ExtractionError::extractor("Unable to extract title").into();
        assert_eq!(
            defect.to_string(),
            "Extraction failed: ExtractorError: Unable to extract title"
        );
    }
}
