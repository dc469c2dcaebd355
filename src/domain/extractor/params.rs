//! Download parameters: declared overrides and their resolved form

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default output filename template
pub const DEFAULT_OUTTMPL: &str = "%(id)s.%(ext)s";

/// Flat extraction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ExtractFlatRepr", into = "ExtractFlatRepr")]
pub enum ExtractFlat {
    #[default]
    Off,
    /// Only entries of playlists are left unresolved
    InPlaylist,
    /// Every URL is left unresolved
    Always,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ExtractFlatRepr {
    Flag(bool),
    Mode(String),
}

impl TryFrom<ExtractFlatRepr> for ExtractFlat {
    type Error = String;

    fn try_from(value: ExtractFlatRepr) -> Result<Self, Self::Error> {
        match value {
            ExtractFlatRepr::Flag(true) => Ok(ExtractFlat::Always),
            ExtractFlatRepr::Flag(false) => Ok(ExtractFlat::Off),
            ExtractFlatRepr::Mode(mode) if mode == "in_playlist" => Ok(ExtractFlat::InPlaylist),
            ExtractFlatRepr::Mode(mode) => Err(format!("Unknown extract_flat mode '{}'", mode)),
        }
    }
}

impl From<ExtractFlat> for ExtractFlatRepr {
    fn from(value: ExtractFlat) -> Self {
        match value {
            ExtractFlat::Off => ExtractFlatRepr::Flag(false),
            ExtractFlat::Always => ExtractFlatRepr::Flag(true),
            ExtractFlat::InPlaylist => ExtractFlatRepr::Mode("in_playlist".to_string()),
        }
    }
}

/// Parameter overrides as declared by a test case or configuration layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outtmpl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_download: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_flat: Option<ExtractFlat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_generic_extractor: Option<bool>,
    /// Reduced-fidelity sampling mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writeinfojson: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    /// Extra request headers in `Name:Value` form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    /// Collaborator-specific options passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TestParams {
    /// Layer `overrides` on top of these parameters
    pub fn layered(&self, overrides: &TestParams) -> TestParams {
        let mut extra = self.extra.clone();
        extra.extend(overrides.extra.clone());

        TestParams {
            outtmpl: overrides.outtmpl.clone().or_else(|| self.outtmpl.clone()),
            skip_download: overrides.skip_download.or(self.skip_download),
            extract_flat: overrides.extract_flat.or(self.extract_flat),
            force_generic_extractor: overrides
                .force_generic_extractor
                .or(self.force_generic_extractor),
            test: overrides.test.or(self.test),
            writeinfojson: overrides.writeinfojson.or(self.writeinfojson),
            user_agent: overrides.user_agent.clone().or_else(|| self.user_agent.clone()),
            referer: overrides.referer.clone().or_else(|| self.referer.clone()),
            headers: overrides.headers.clone().or_else(|| self.headers.clone()),
            extra,
        }
    }

    pub fn resolve(self) -> DownloadParams {
        DownloadParams {
            outtmpl: self.outtmpl.unwrap_or_else(|| DEFAULT_OUTTMPL.to_string()),
            skip_download: self.skip_download.unwrap_or(false),
            extract_flat: self.extract_flat.unwrap_or_default(),
            force_generic_extractor: self.force_generic_extractor.unwrap_or(false),
            test: self.test.unwrap_or(false),
            writeinfojson: self.writeinfojson.unwrap_or(true),
            user_agent: self.user_agent,
            referer: self.referer,
            headers: self.headers.unwrap_or_default(),
            extra: self.extra,
        }
    }
}

/// Fully resolved parameters handed to the downloader for one unit
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadParams {
    pub outtmpl: String,
    pub skip_download: bool,
    pub extract_flat: ExtractFlat,
    pub force_generic_extractor: bool,
    pub test: bool,
    pub writeinfojson: bool,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub headers: Vec<String>,
    pub extra: Map<String, Value>,
}

impl Default for DownloadParams {
    fn default() -> Self {
        TestParams::default().resolve()
    }
}
