use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::extractor::{TestParams, DEFAULT_OUTTMPL};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub harness: HarnessConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where definitions come from, where artifacts go and how units run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory artifacts are written to (and cleaned from)
    pub output_dir: PathBuf,
    /// Definition manifest (JSON)
    pub definitions: PathBuf,
    /// Units run at the same time
    pub concurrency: usize,
    /// Per-request timeout of the direct-link downloader
    pub request_timeout_secs: u64,
    /// Parameters every test case's `params` are layered over
    pub default_params: TestParams,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            definitions: PathBuf::from("definitions.json"),
            concurrency: 1,
            request_timeout_secs: 30,
            default_params: default_params(),
        }
    }
}

fn default_params() -> TestParams {
    TestParams {
        outtmpl: Some(DEFAULT_OUTTMPL.to_string()),
        test: Some(true),
        writeinfojson: Some(true),
        ..Default::default()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        let config = builder
            .add_source(
                config::Environment::with_prefix("HARNESS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
