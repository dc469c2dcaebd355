//! Extraction Driver - preflight checks and the bounded retry loop

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::error::HarnessError;
use crate::domain::extractor::{DownloadSession, Downloader, ExtractionResult};
use crate::domain::test_case::{validate_output_known, TestCaseDefinition};
use crate::infrastructure::extractor::ExtractorRegistry;

/// Attempts made before transient failures turn into a skip
pub const MAX_ATTEMPTS: u32 = 3;

/// Result of the checks made before the first attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    Ready,
    Skip(String),
}

/// How a driver invocation resolved
#[derive(Debug)]
pub enum DriverOutcome {
    Extracted {
        result: ExtractionResult,
        attempts: u32,
    },
    /// Every attempt failed with a transient network error
    NetworkSkipped { attempts: u32, reason: String },
}

/// Fatal error raised by the downloader, with the attempts it took to get there
#[derive(Debug)]
pub struct DriverFailure {
    pub error: HarnessError,
    pub attempts: u32,
}

impl std::fmt::Display for DriverFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (after {} attempts)", self.error, self.attempts)
    }
}

/// Runs the downloader for one unit, retrying transient failures
pub struct ExtractionDriver {
    downloader: Arc<dyn Downloader>,
    registry: Arc<ExtractorRegistry>,
    max_attempts: u32,
}

impl std::fmt::Debug for ExtractionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionDriver")
            .field("extractors", &self.registry.len())
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl ExtractionDriver {
    pub fn new(downloader: Arc<dyn Downloader>, registry: Arc<ExtractorRegistry>) -> Self {
        Self {
            downloader,
            registry,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Checks made in a fixed order before anything is downloaded: the
    /// extractor must be working, the output files must be nameable, the
    /// case must not be skipped and every auxiliary extractor must work.
    pub fn preflight(&self, definition: &TestCaseDefinition) -> Result<Preflight, HarnessError> {
        let extractor = self.registry.get(definition.name()).ok_or_else(|| {
            HarnessError::malformed(format!("Unknown extractor: {}", definition.name()))
        })?;

        if !extractor.working() {
            return Ok(Preflight::Skip("IE marked as not _WORKING".to_string()));
        }

        validate_output_known(definition)?;

        if let Some(reason) = definition.skip() {
            return Ok(Preflight::Skip(reason.to_string()));
        }

        for key in definition.add_ie() {
            let other = self.registry.get(key).ok_or_else(|| {
                HarnessError::malformed(format!("Unknown extractor in add_ie: {}", key))
            })?;

            if !other.working() {
                return Ok(Preflight::Skip(format!(
                    "test depends on {}IE, marked as not WORKING",
                    other.key()
                )));
            }
        }

        Ok(Preflight::Ready)
    }

    /// Invoke the downloader until it succeeds, fails for good, or the
    /// attempt bound is exhausted by transient errors
    pub async fn extract(
        &self,
        unit: &str,
        definition: &TestCaseDefinition,
        session: &DownloadSession,
    ) -> Result<DriverOutcome, DriverFailure> {
        let mut attempt = 1;

        loop {
            debug!(unit = %unit, attempt, url = %definition.url(), "Extracting");

            match self.downloader.extract_info(definition.url(), session).await {
                Ok(result) => {
                    return Ok(DriverOutcome::Extracted {
                        result,
                        attempts: attempt,
                    });
                }
                Err(e) if !e.is_transient() => {
                    return Err(DriverFailure {
                        error: e.into(),
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    if attempt >= self.max_attempts {
                        warn!(unit = %unit, error = %e, "{} failed due to network errors, skipping...", unit);
                        return Ok(DriverOutcome::NetworkSkipped {
                            attempts: attempt,
                            reason: format!("{} failed due to network errors: {}", unit, e),
                        });
                    }

                    warn!(unit = %unit, error = %e, "Retrying: {} failed tries", attempt);
                    attempt += 1;
                }
            }
        }
    }
}
