//! Extractor Registry
//!
//! Lookup of info extractors by key, in registration order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::error::HarnessError;
use crate::domain::extractor::InfoExtractor;
use crate::domain::test_case::TestCaseDefinition;

/// Registry of every extractor the harness can resolve
#[derive(Debug, Default)]
pub struct ExtractorRegistry {
    /// Extractors in registration order
    extractors: Vec<Arc<dyn InfoExtractor>>,

    /// Index of extractor keys to positions
    index: HashMap<String, usize>,
}

impl ExtractorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor; keys must be unique
    pub fn register(&mut self, extractor: Arc<dyn InfoExtractor>) -> Result<(), HarnessError> {
        let key = extractor.key().to_string();

        if self.index.contains_key(&key) {
            return Err(HarnessError::configuration(format!(
                "Extractor already registered: {}",
                key
            )));
        }

        debug!(extractor = %key, working = extractor.working(), "Registering extractor");

        self.index.insert(key, self.extractors.len());
        self.extractors.push(extractor);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn InfoExtractor>> {
        self.index.get(key).map(|&i| self.extractors[i].clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.extractors.iter().map(|e| e.key())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn InfoExtractor>> {
        self.extractors.iter()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Collect the download test cases declared by every extractor.
    ///
    /// Each case is named after its extractor; URL-matching-only cases are
    /// left out.
    pub fn gather_test_cases(&self) -> Vec<TestCaseDefinition> {
        let cases: Vec<TestCaseDefinition> = self
            .extractors
            .iter()
            .flat_map(|extractor| {
                let key = extractor.key().to_string();
                extractor
                    .test_cases()
                    .into_iter()
                    .filter(|case| !case.is_only_matching())
                    .map(move |case| case.with_name(key.clone()))
            })
            .collect();

        info!(
            extractors = self.extractors.len(),
            cases = cases.len(),
            "Gathered test cases"
        );
        cases
    }
}
