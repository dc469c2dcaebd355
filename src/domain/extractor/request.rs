//! Per-unit request configuration

use std::collections::BTreeMap;

use super::DownloadParams;

/// Request header overrides for one test unit.
///
/// Threaded into every collaborator call instead of mutating process-wide
/// headers, so units customising headers can run side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestConfig {
    user_agent: Option<String>,
    referer: Option<String>,
    headers: BTreeMap<String, String>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params(params: &DownloadParams) -> Self {
        let mut config = Self {
            user_agent: params.user_agent.clone(),
            referer: params.referer.clone(),
            headers: BTreeMap::new(),
        };

        for header in &params.headers {
            // Entries without a colon are ignored
            if let Some((name, value)) = header.split_once(':') {
                config
                    .headers
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }

        config
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    /// All header overrides, user agent and referer first
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();

        if let Some(ref user_agent) = self.user_agent {
            headers.push(("User-Agent".to_string(), user_agent.clone()));
        }

        if let Some(ref referer) = self.referer {
            headers.push(("Referer".to_string(), referer.clone()));
        }

        headers.extend(
            self.headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        headers
    }

    pub fn is_empty(&self) -> bool {
        self.user_agent.is_none() && self.referer.is_none() && self.headers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_params() {
        let params = DownloadParams {
            user_agent: Some("harness/1.0".to_string()),
            referer: Some("http://example.com/".to_string()),
            headers: vec![
                "X-Forwarded-For: 1.2.3.4".to_string(),
                "malformed".to_string(),
            ],
            ..Default::default()
        };

        let config = RequestConfig::from_params(&params);
        assert_eq!(
            config.headers(),
            vec![
                ("User-Agent".to_string(), "harness/1.0".to_string()),
                ("Referer".to_string(), "http://example.com/".to_string()),
                ("X-Forwarded-For".to_string(), "1.2.3.4".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_by_default() {
        let config = RequestConfig::from_params(&DownloadParams::default());
        assert!(config.is_empty());
        assert!(config.headers().is_empty());
    }
}
