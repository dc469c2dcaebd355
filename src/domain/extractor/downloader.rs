//! Downloader collaborator trait and the per-unit session it runs in

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::{DownloadParams, ExtractionError, ExtractionResult, ProgressEvent, ProgressHook, RequestConfig};
use crate::domain::artifact::{ArtifactSet, OutputTemplate};

#[cfg(test)]
use mockall::automock;

/// Warnings a unit declared as expected; anything else is escalated
#[derive(Debug, Clone, Default)]
pub struct WarningPolicy {
    expected: Vec<Regex>,
}

impl WarningPolicy {
    pub fn new(patterns: &[String]) -> Result<Self, regex::Error> {
        let expected = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { expected })
    }

    /// Whether `message` matches (searches) any declared pattern
    pub fn allows(&self, message: &str) -> bool {
        self.expected.iter().any(|re| re.is_match(message))
    }
}

/// Everything one unit hands to the downloader: resolved parameters, output
/// naming, request headers, progress subscribers and the warning policy.
pub struct DownloadSession {
    params: DownloadParams,
    template: OutputTemplate,
    request: RequestConfig,
    hooks: Vec<Arc<dyn ProgressHook>>,
    warnings: WarningPolicy,
}

impl std::fmt::Debug for DownloadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadSession")
            .field("params", &self.params)
            .field("template", &self.template)
            .field("request", &self.request)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl DownloadSession {
    pub fn new(params: DownloadParams, output_dir: impl Into<PathBuf>) -> Self {
        let template = OutputTemplate::new(params.outtmpl.clone()).with_directory(output_dir);
        let request = RequestConfig::from_params(&params);

        Self {
            params,
            template,
            request,
            hooks: Vec::new(),
            warnings: WarningPolicy::default(),
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn ProgressHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn with_warnings(mut self, warnings: WarningPolicy) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    pub fn params(&self) -> &DownloadParams {
        &self.params
    }

    pub fn template(&self) -> &OutputTemplate {
        &self.template
    }

    pub fn request(&self) -> &RequestConfig {
        &self.request
    }

    pub fn prepare_filename(&self, record: &Map<String, Value>) -> PathBuf {
        self.template.render(record)
    }

    pub fn artifacts(&self, record: &Map<String, Value>) -> ArtifactSet {
        self.template.artifacts(record)
    }

    pub fn report_progress(&self, event: &ProgressEvent) {
        for hook in &self.hooks {
            hook.on_progress(event);
        }
    }

    /// Undeclared warnings become errors during validation runs
    pub fn report_warning(&self, message: &str) -> Result<(), ExtractionError> {
        if self.warnings.allows(message) {
            debug!(warning = %message, "Expected warning emitted");
            return Ok(());
        }

        Err(ExtractionError::unexpected_warning(message))
    }
}

/// Orchestrator/downloader collaborator: resolves a URL into a metadata
/// record, writing the artifact and sidecar files as a side effect.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn extract_info(
        &self,
        url: &str,
        session: &DownloadSession,
    ) -> Result<ExtractionResult, ExtractionError>;
}
