//! Declarative test case definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ExpectationSpec, ExpectedInfo};
use crate::domain::extractor::TestParams;

/// Minimum artifact size when a case declares none
pub const DEFAULT_FILE_MINSIZE: u64 = 10_000;

fn default_file_minsize() -> Option<u64> {
    Some(DEFAULT_FILE_MINSIZE)
}

/// One declared test case: a URL plus the metadata it must produce.
///
/// Playlist cases either nest child definitions under `playlist` or declare
/// aggregate expectations (`playlist_mincount`, `playlist_count`,
/// `playlist_duration_sum`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseDefinition {
    /// Extractor key this case exercises
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default, skip_serializing_if = "is_default_params")]
    params: TestParams,
    #[serde(default)]
    info_dict: ExpectedInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    playlist: Option<Vec<TestCaseDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    playlist_mincount: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    playlist_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    playlist_duration_sum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    md5: Option<String>,
    /// `None` disables the size check
    #[serde(default = "default_file_minsize")]
    file_minsize: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    skip: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    add_ie: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    expected_warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    only_matching: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expected_failure: Option<String>,
}

fn is_default_params(params: &TestParams) -> bool {
    params == &TestParams::default()
}

impl Default for TestCaseDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            params: TestParams::default(),
            info_dict: ExpectedInfo::new(),
            playlist: None,
            playlist_mincount: None,
            playlist_count: None,
            playlist_duration_sum: None,
            md5: None,
            file_minsize: default_file_minsize(),
            skip: None,
            add_ie: Vec::new(),
            expected_warnings: Vec::new(),
            only_matching: false,
            expected_failure: None,
        }
    }
}

impl TestCaseDefinition {
    /// Create a case for the extractor `name`
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Create a playlist child entry from its expected fields
    pub fn entry(info_dict: ExpectedInfo) -> Self {
        Self {
            info_dict,
            ..Default::default()
        }
    }

    // Builder methods
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_params(mut self, params: TestParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_info_dict(mut self, info_dict: ExpectedInfo) -> Self {
        self.info_dict = info_dict;
        self
    }

    pub fn with_expected(mut self, field: impl Into<String>, spec: ExpectationSpec) -> Self {
        self.info_dict.insert(field.into(), spec);
        self
    }

    pub fn with_playlist(mut self, entries: Vec<TestCaseDefinition>) -> Self {
        self.playlist = Some(entries);
        self
    }

    pub fn with_playlist_mincount(mut self, count: usize) -> Self {
        self.playlist_mincount = Some(count);
        self
    }

    pub fn with_playlist_count(mut self, count: usize) -> Self {
        self.playlist_count = Some(count);
        self
    }

    pub fn with_playlist_duration_sum(mut self, sum: f64) -> Self {
        self.playlist_duration_sum = Some(sum);
        self
    }

    pub fn with_md5(mut self, md5: impl Into<String>) -> Self {
        self.md5 = Some(md5.into());
        self
    }

    pub fn with_file_minsize(mut self, minsize: Option<u64>) -> Self {
        self.file_minsize = minsize;
        self
    }

    pub fn with_skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    pub fn with_add_ie(mut self, add_ie: Vec<String>) -> Self {
        self.add_ie = add_ie;
        self
    }

    pub fn with_expected_warnings(mut self, warnings: Vec<String>) -> Self {
        self.expected_warnings = warnings;
        self
    }

    pub fn with_only_matching(mut self, only_matching: bool) -> Self {
        self.only_matching = only_matching;
        self
    }

    pub fn with_expected_failure(mut self, reason: impl Into<String>) -> Self {
        self.expected_failure = Some(reason.into());
        self
    }

    // Getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn params(&self) -> &TestParams {
        &self.params
    }

    pub fn info_dict(&self) -> &ExpectedInfo {
        &self.info_dict
    }

    pub fn playlist(&self) -> Option<&[TestCaseDefinition]> {
        self.playlist.as_deref()
    }

    pub fn playlist_mincount(&self) -> Option<usize> {
        self.playlist_mincount
    }

    pub fn playlist_count(&self) -> Option<usize> {
        self.playlist_count
    }

    pub fn playlist_duration_sum(&self) -> Option<f64> {
        self.playlist_duration_sum
    }

    pub fn md5(&self) -> Option<&str> {
        self.md5.as_deref()
    }

    pub fn file_minsize(&self) -> Option<u64> {
        self.file_minsize
    }

    pub fn skip(&self) -> Option<&str> {
        self.skip.as_deref()
    }

    pub fn add_ie(&self) -> &[String] {
        &self.add_ie
    }

    pub fn expected_warnings(&self) -> &[String] {
        &self.expected_warnings
    }

    pub fn is_only_matching(&self) -> bool {
        self.only_matching
    }

    pub fn expected_failure(&self) -> Option<&str> {
        self.expected_failure.as_deref()
    }

    /// Any `playlist*` key makes this a playlist case
    pub fn is_playlist(&self) -> bool {
        self.playlist.is_some()
            || self.playlist_mincount.is_some()
            || self.playlist_count.is_some()
            || self.playlist_duration_sum.is_some()
    }

    /// Whether the playlist entries are declared one by one
    pub fn declares_entries(&self) -> bool {
        self.playlist.is_some()
    }

    /// Cases whose artifacts are validated: the declared playlist entries,
    /// none for an aggregate-only playlist, or the case itself
    pub fn expected_cases(&self) -> Vec<&TestCaseDefinition> {
        match &self.playlist {
            Some(entries) => entries.iter().collect(),
            None if self.is_playlist() => Vec::new(),
            None => vec![self],
        }
    }

    /// Literal expected fields, used to derive the artifact names
    pub fn naming_record(&self) -> Map<String, Value> {
        self.info_dict
            .iter()
            .filter_map(|(field, spec)| match spec {
                ExpectationSpec::Literal(value) if !value.is_null() => {
                    Some((field.clone(), value.clone()))
                }
                _ => None,
            })
            .collect()
    }
}
