//! Test case domain - Declared test cases, expectations and unit outcomes

mod entity;
mod expectation;
mod outcome;
mod validation;

pub use entity::{TestCaseDefinition, DEFAULT_FILE_MINSIZE};
pub use expectation::{
    CountRule, ExpectationEvaluator, ExpectationParseError, ExpectationSpec, ExpectedInfo,
    FieldPattern, ValueKind,
};
pub use outcome::{
    AssertionOutcome, RunId, SuiteReport, SuiteSummary, UnitOutcome, UnitReport,
};
pub use validation::{validate_definition, validate_output_known, DefinitionValidationError};
