//! Domain layer - Test definitions, expectations and collaborator interfaces

pub mod artifact;
pub mod error;
pub mod extractor;
pub mod test_case;

pub use artifact::{ArtifactSet, OutputTemplate};
pub use error::HarnessError;
pub use extractor::{
    DownloadParams, DownloadSession, Downloader, ExtractionError, ExtractionResult,
    InfoExtractor, NetworkCause, TestParams,
};
pub use test_case::{
    validate_definition, ExpectationSpec, ExpectedInfo, SuiteReport, SuiteSummary,
    TestCaseDefinition, UnitOutcome, UnitReport,
};
