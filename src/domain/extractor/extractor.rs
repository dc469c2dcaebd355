use std::fmt::Debug;

use crate::domain::test_case::TestCaseDefinition;

/// Trait for source extractors (one per supported site or source type)
pub trait InfoExtractor: Send + Sync + Debug {
    /// Stable identifier, used to name test units
    fn key(&self) -> &str;

    /// Extractors marked as not working have their tests skipped
    fn working(&self) -> bool {
        true
    }

    /// Test cases declared alongside the extractor
    fn test_cases(&self) -> Vec<TestCaseDefinition> {
        Vec::new()
    }
}
