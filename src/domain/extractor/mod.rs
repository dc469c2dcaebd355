//! Extractor domain - Collaborator interfaces for extraction and download

mod downloader;
mod error;
#[allow(clippy::module_inception)]
mod extractor;
mod info_dict;
mod params;
mod progress;
mod request;

pub use downloader::{DownloadSession, Downloader, WarningPolicy};
pub use error::{ExtractionError, ExtractionErrorKind, NetworkCause};
pub use extractor::InfoExtractor;
pub use info_dict::ExtractionResult;
pub use params::{DownloadParams, ExtractFlat, TestParams, DEFAULT_OUTTMPL};
pub use progress::{FinishedFiles, ProgressEvent, ProgressHook, ProgressStatus};
pub use request::RequestConfig;

#[cfg(test)]
pub use downloader::mock::{ScriptedDownloader, Step};
#[cfg(test)]
pub use downloader::MockDownloader;
