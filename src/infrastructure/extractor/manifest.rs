//! Extractors declared in a definition manifest file
//!
//! ```json
//! { "extractors": [ { "key": "Dropbox", "working": true, "tests": [ ... ] } ] }
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::ExtractorRegistry;
use crate::domain::error::HarnessError;
use crate::domain::extractor::InfoExtractor;
use crate::domain::test_case::TestCaseDefinition;

fn default_true() -> bool {
    true
}

/// Extractor whose metadata and test cases come from a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestExtractor {
    key: String,
    #[serde(default = "default_true")]
    working: bool,
    #[serde(default)]
    tests: Vec<TestCaseDefinition>,
}

impl ManifestExtractor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            working: true,
            tests: Vec::new(),
        }
    }

    pub fn with_working(mut self, working: bool) -> Self {
        self.working = working;
        self
    }

    pub fn with_test(mut self, test: TestCaseDefinition) -> Self {
        self.tests.push(test);
        self
    }
}

impl InfoExtractor for ManifestExtractor {
    fn key(&self) -> &str {
        &self.key
    }

    fn working(&self) -> bool {
        self.working
    }

    fn test_cases(&self) -> Vec<TestCaseDefinition> {
        self.tests.clone()
    }
}

/// Parsed definition manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionManifest {
    #[serde(default)]
    pub extractors: Vec<ManifestExtractor>,
}

impl DefinitionManifest {
    /// Load a manifest from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading test definitions");

        let content =
            std::fs::read_to_string(path).map_err(|e| HarnessError::io(path.display(), e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, HarnessError> {
        serde_json::from_str(content)
            .map_err(|e| HarnessError::malformed(format!("Invalid definition manifest: {}", e)))
    }

    /// Register every declared extractor
    pub fn into_registry(self) -> Result<ExtractorRegistry, HarnessError> {
        let mut registry = ExtractorRegistry::new();
        for extractor in self.extractors {
            registry.register(Arc::new(extractor))?;
        }
        Ok(registry)
    }
}
