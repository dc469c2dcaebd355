//! Unit outcomes, reports and suite tallies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::HarnessError;

/// Unique identifier for one unit run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a single assertion check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionOutcome {
    /// What was checked (field name or artifact check)
    pub name: String,
    pub passed: bool,
    pub expected: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssertionOutcome {
    pub fn passed(name: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            expected: expected.into(),
            actual: None,
            error: None,
        }
    }

    pub fn failed(
        name: impl Into<String>,
        expected: impl Into<String>,
        actual: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            expected: expected.into(),
            actual,
            error: Some(error.into()),
        }
    }

    /// Pass/fail check with no interesting actual value
    pub fn check(name: impl Into<String>, condition: bool, error: impl Into<String>) -> Self {
        if condition {
            Self::passed(name, "true")
        } else {
            Self::failed(name, "true", Some("false".to_string()), error)
        }
    }

    /// Qualify the check with where the checked value lives, e.g. `entries[1]`
    pub fn scoped(mut self, scope: &str) -> Self {
        self.name = format!("{}.{}", scope, self.name);
        self.error = self.error.map(|error| format!("{}: {}", scope, error));
        self
    }

    pub fn into_error(self) -> HarnessError {
        let message = self
            .error
            .unwrap_or_else(|| format!("Assertion '{}' failed", self.name));

        HarnessError::mismatch(
            self.name,
            self.expected,
            self.actual.unwrap_or_else(|| "<missing>".to_string()),
            message,
        )
    }
}

/// Final outcome of one test unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitOutcome {
    Passed,
    /// An expectation did not hold
    Failed { message: String },
    /// The unit raised before it could be validated
    Errored { message: String },
    Skipped { reason: String },
    /// Transient network failures exhausted the retry bound
    SkippedWithWarning { reason: String },
    ExpectedFailure { message: String },
    UnexpectedSuccess,
}

impl UnitOutcome {
    pub fn from_error(error: &HarnessError) -> Self {
        if error.is_failure() {
            UnitOutcome::Failed {
                message: error.to_string(),
            }
        } else {
            UnitOutcome::Errored {
                message: error.to_string(),
            }
        }
    }

    /// Reinterpret the outcome for a unit declared as expected to fail
    pub fn expecting_failure(self) -> Self {
        match self {
            UnitOutcome::Passed => UnitOutcome::UnexpectedSuccess,
            UnitOutcome::Failed { message } | UnitOutcome::Errored { message } => {
                UnitOutcome::ExpectedFailure { message }
            }
            other => other,
        }
    }

    /// Outcomes that do not count against the run
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            UnitOutcome::Passed
                | UnitOutcome::Skipped { .. }
                | UnitOutcome::SkippedWithWarning { .. }
                | UnitOutcome::ExpectedFailure { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            UnitOutcome::Passed => "ok",
            UnitOutcome::Failed { .. } => "FAIL",
            UnitOutcome::Errored { .. } => "ERROR",
            UnitOutcome::Skipped { .. } => "skipped",
            UnitOutcome::SkippedWithWarning { .. } => "skipped (network)",
            UnitOutcome::ExpectedFailure { .. } => "expected failure",
            UnitOutcome::UnexpectedSuccess => "unexpected success",
        }
    }
}

impl std::fmt::Display for UnitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitOutcome::Failed { message }
            | UnitOutcome::Errored { message }
            | UnitOutcome::ExpectedFailure { message } => write!(f, "{}: {}", self.label(), message),
            UnitOutcome::Skipped { reason } | UnitOutcome::SkippedWithWarning { reason } => {
                write!(f, "{}: {}", self.label(), reason)
            }
            _ => write!(f, "{}", self.label()),
        }
    }
}

/// Report for one unit run
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    id: RunId,
    name: String,
    identity: String,
    extractor: String,
    outcome: UnitOutcome,
    attempts: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    assertions: Vec<AssertionOutcome>,
    duration_ms: u64,
    executed_at: DateTime<Utc>,
}

impl UnitReport {
    pub fn new(
        name: impl Into<String>,
        identity: impl Into<String>,
        extractor: impl Into<String>,
        outcome: UnitOutcome,
    ) -> Self {
        Self {
            id: RunId::new(),
            name: name.into(),
            identity: identity.into(),
            extractor: extractor.into(),
            outcome,
            attempts: 0,
            assertions: Vec::new(),
            duration_ms: 0,
            executed_at: Utc::now(),
        }
    }

    // Builder methods
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_assertions(mut self, assertions: Vec<AssertionOutcome>) -> Self {
        self.assertions = assertions;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    // Getters
    pub fn id(&self) -> &RunId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn extractor(&self) -> &str {
        &self.extractor
    }

    pub fn outcome(&self) -> &UnitOutcome {
        &self.outcome
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn assertions(&self) -> &[AssertionOutcome] {
        &self.assertions
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn executed_at(&self) -> DateTime<Utc> {
        self.executed_at
    }
}

/// Tally of unit outcomes for one aggregated run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SuiteSummary {
    pub passed: usize,
    pub errors: usize,
    pub failures: usize,
    pub skipped: usize,
    pub expected_failures: usize,
    pub unexpected_successes: usize,
}

impl SuiteSummary {
    pub fn from_reports(reports: &[UnitReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.record(report.outcome());
        }
        summary
    }

    pub fn record(&mut self, outcome: &UnitOutcome) {
        match outcome {
            UnitOutcome::Passed => self.passed += 1,
            UnitOutcome::Failed { .. } => self.failures += 1,
            UnitOutcome::Errored { .. } => self.errors += 1,
            UnitOutcome::Skipped { .. } | UnitOutcome::SkippedWithWarning { .. } => {
                self.skipped += 1
            }
            UnitOutcome::ExpectedFailure { .. } => self.expected_failures += 1,
            UnitOutcome::UnexpectedSuccess => self.unexpected_successes += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed
            + self.errors
            + self.failures
            + self.skipped
            + self.expected_failures
            + self.unexpected_successes
    }

    /// No errors, failures or unexpected successes
    pub fn is_successful(&self) -> bool {
        self.errors == 0 && self.failures == 0 && self.unexpected_successes == 0
    }
}

impl std::fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Errors: {}\t Failures: {}\tSkipped: {}",
            self.errors, self.failures, self.skipped
        )?;
        write!(
            f,
            "Expected failures: {}\tUnexpected successes: {}",
            self.expected_failures, self.unexpected_successes
        )
    }
}

/// Report for a per-extractor composite run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub extractor: String,
    pub summary: SuiteSummary,
    pub reports: Vec<UnitReport>,
    pub duration_ms: u64,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.summary.is_successful()
    }
}
