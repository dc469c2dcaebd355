//! Test case validation

use thiserror::Error;

use super::{ExpectationSpec, TestCaseDefinition};
use crate::domain::error::HarnessError;

/// Validation errors for test case definitions
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionValidationError {
    #[error("Test case URL is required")]
    UrlRequired,

    #[error("The output file cannot be known. Are both 'id' and 'ext' keys present?")]
    OutputUnknown,

    #[error("playlist_mincount ({mincount}) is larger than playlist_count ({count})")]
    InconsistentCounts { mincount: usize, count: usize },

    #[error("Invalid expected warning pattern '{pattern}': {message}")]
    InvalidWarningPattern { pattern: String, message: String },
}

impl From<DefinitionValidationError> for HarnessError {
    fn from(err: DefinitionValidationError) -> Self {
        HarnessError::malformed(err.to_string())
    }
}

fn has_literal(spec: Option<&ExpectationSpec>) -> bool {
    spec.and_then(ExpectationSpec::as_literal_str).is_some()
}

/// Validate a definition before anything is downloaded.
///
/// Every expected case (the case itself or each declared playlist entry)
/// must pin `id` and `ext` to literal values so its artifacts can be named.
pub fn validate_definition(definition: &TestCaseDefinition) -> Result<(), DefinitionValidationError> {
    if definition.url().trim().is_empty() {
        return Err(DefinitionValidationError::UrlRequired);
    }

    validate_output_known(definition)?;

    for pattern in definition.expected_warnings() {
        regex::Regex::new(pattern).map_err(|e| DefinitionValidationError::InvalidWarningPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }

    if let (Some(mincount), Some(count)) =
        (definition.playlist_mincount(), definition.playlist_count())
    {
        if mincount > count {
            return Err(DefinitionValidationError::InconsistentCounts { mincount, count });
        }
    }

    Ok(())
}

/// Check only that the output file of every expected case can be named
pub fn validate_output_known(definition: &TestCaseDefinition) -> Result<(), DefinitionValidationError> {
    for case in definition.expected_cases() {
        let info_dict = case.info_dict();
        if !has_literal(info_dict.get("id")) || !has_literal(info_dict.get("ext")) {
            return Err(DefinitionValidationError::OutputUnknown);
        }
    }
    Ok(())
}
