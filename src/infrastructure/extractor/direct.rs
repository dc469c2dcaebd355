//! Direct-link downloader
//!
//! Resolves plain media URLs (`https://host/path/clip.mp4`) into a metadata
//! record and downloads the file through reqwest.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::RANGE;
use reqwest::Url;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::domain::error::HarnessError;
use crate::domain::extractor::{
    DownloadSession, Downloader, ExtractionError, ExtractionResult, NetworkCause, ProgressEvent,
};
use crate::infrastructure::artifact::TEST_FILE_SIZE;

/// Extractor key reported for direct links
pub const DIRECT_EXTRACTOR_KEY: &str = "Generic";

/// Map a reqwest error onto the network cause the retry policy understands
pub fn network_cause(error: &reqwest::Error) -> Option<NetworkCause> {
    if error.is_timeout() {
        Some(NetworkCause::Timeout)
    } else if error.is_connect() {
        Some(NetworkCause::Connect)
    } else if let Some(status) = error.status() {
        Some(NetworkCause::Http {
            status: status.as_u16(),
        })
    } else if error.is_request() || error.is_body() {
        Some(NetworkCause::Url)
    } else {
        None
    }
}

fn download_error(error: reqwest::Error) -> ExtractionError {
    let cause = network_cause(&error);
    let err = ExtractionError::download(format!("Unable to download: {}", error));
    match cause {
        Some(cause) => err.with_cause(cause),
        None => err,
    }
}

fn io_error(path: &Path, error: std::io::Error) -> ExtractionError {
    ExtractionError::download(format!("Unable to write {}: {}", path.display(), error))
}

/// Downloader for URLs that point straight at a media file
#[derive(Debug, Clone)]
pub struct DirectDownloader {
    client: reqwest::Client,
}

impl DirectDownloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, HarnessError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HarnessError::configuration(format!("Invalid HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Metadata derivable from the URL alone
    fn describe(url: &str) -> Result<Map<String, Value>, ExtractionError> {
        let parsed = Url::parse(url)
            .map_err(|e| ExtractionError::extractor(format!("Invalid URL {}: {}", url, e)))?;

        let basename = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ExtractionError::extractor(format!("Unsupported URL: {}", url)))?;

        let (id, ext) = basename
            .rsplit_once('.')
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .ok_or_else(|| {
                ExtractionError::extractor(format!(
                    "Unable to determine file extension of {}",
                    url
                ))
            })?;

        let mut record = Map::new();
        record.insert("id".to_string(), Value::from(id));
        record.insert("title".to_string(), Value::from(id));
        record.insert("ext".to_string(), Value::from(ext.to_ascii_lowercase()));
        record.insert("url".to_string(), Value::from(url));
        record.insert("webpage_url".to_string(), Value::from(url));
        record.insert("extractor".to_string(), Value::from(DIRECT_EXTRACTOR_KEY));
        Ok(record)
    }

    /// Stream the body into the partial file, then move it into place
    async fn download(
        &self,
        url: &str,
        session: &DownloadSession,
        record: &mut Map<String, Value>,
    ) -> Result<(), ExtractionError> {
        let artifacts = session.artifacts(record);
        let test_mode = session.params().test;

        if let Some(parent) = artifacts.primary.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let mut request = self.client.get(url);
        for (name, value) in session.request().headers() {
            request = request.header(name, value);
        }
        if test_mode {
            request = request.header(RANGE, format!("bytes=0-{}", TEST_FILE_SIZE - 1));
        }

        let response = request.send().await.map_err(download_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::download(format!(
                "HTTP Error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ))
            .with_cause(NetworkCause::Http {
                status: status.as_u16(),
            }));
        }

        let limit = test_mode.then_some(TEST_FILE_SIZE);
        let total = match (response.content_length(), limit) {
            (Some(length), Some(limit)) => Some(length.min(limit)),
            (length, _) => length,
        };

        debug!(url = %url, path = %artifacts.partial.display(), ?total, "Downloading");

        let mut file = fs::File::create(&artifacts.partial)
            .await
            .map_err(|e| io_error(&artifacts.partial, e))?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(download_error)?;
            let mut bytes = &chunk[..];
            if let Some(limit) = limit {
                let remaining = limit.saturating_sub(downloaded) as usize;
                bytes = &bytes[..bytes.len().min(remaining)];
            }

            file.write_all(bytes)
                .await
                .map_err(|e| io_error(&artifacts.partial, e))?;
            downloaded += bytes.len() as u64;
            session.report_progress(&ProgressEvent::downloading(
                &artifacts.partial,
                downloaded,
                total,
            ));

            if limit.is_some_and(|limit| downloaded >= limit) {
                break;
            }
        }

        file.flush()
            .await
            .map_err(|e| io_error(&artifacts.partial, e))?;
        drop(file);

        fs::rename(&artifacts.partial, &artifacts.primary)
            .await
            .map_err(|e| io_error(&artifacts.primary, e))?;
        session.report_progress(&ProgressEvent::finished(&artifacts.primary, downloaded));

        info!(path = %artifacts.primary.display(), bytes = downloaded, "Download finished");

        record.insert("filesize".to_string(), Value::from(downloaded));
        record.insert(
            "_filename".to_string(),
            Value::from(artifacts.primary.display().to_string()),
        );
        Ok(())
    }

    async fn write_info_json(
        &self,
        session: &DownloadSession,
        record: &Map<String, Value>,
    ) -> Result<(), ExtractionError> {
        let sidecar = session.artifacts(record).sidecar;
        let content = serde_json::to_vec_pretty(record).map_err(|e| {
            ExtractionError::download(format!("Unable to serialize metadata: {}", e))
        })?;

        fs::write(&sidecar, content)
            .await
            .map_err(|e| io_error(&sidecar, e))?;
        debug!(path = %sidecar.display(), "Wrote metadata sidecar");
        Ok(())
    }
}

impl Default for DirectDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Downloader for DirectDownloader {
    async fn extract_info(
        &self,
        url: &str,
        session: &DownloadSession,
    ) -> Result<ExtractionResult, ExtractionError> {
        let mut record = Self::describe(url)?;

        if !session.params().skip_download {
            self.download(url, session, &mut record).await?;
        }

        if session.params().writeinfojson {
            if let Some(parent) = session.artifacts(&record).sidecar.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| io_error(parent, e))?;
            }
            self.write_info_json(session, &record).await?;
        }

        Ok(ExtractionResult::from_fields(record))
    }
}
