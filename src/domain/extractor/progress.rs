//! Download progress notifications

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Status carried by a progress notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Error,
}

/// A single progress notification emitted by a downloader
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub filename: PathBuf,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
}

impl ProgressEvent {
    pub fn downloading(filename: impl Into<PathBuf>, downloaded: u64, total: Option<u64>) -> Self {
        Self {
            status: ProgressStatus::Downloading,
            filename: filename.into(),
            downloaded_bytes: Some(downloaded),
            total_bytes: total,
        }
    }

    /// Terminal event for a completed file
    pub fn finished(filename: impl Into<PathBuf>, total: u64) -> Self {
        Self {
            status: ProgressStatus::Finished,
            filename: filename.into(),
            downloaded_bytes: Some(total),
            total_bytes: Some(total),
        }
    }

    pub fn error(filename: impl Into<PathBuf>) -> Self {
        Self {
            status: ProgressStatus::Error,
            filename: filename.into(),
            downloaded_bytes: None,
            total_bytes: None,
        }
    }
}

/// Subscriber for progress notifications
pub trait ProgressHook: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Records every filename that reached the `finished` status
#[derive(Debug, Default)]
pub struct FinishedFiles {
    files: Mutex<BTreeSet<PathBuf>>,
}

impl FinishedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(path)
    }

    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

impl ProgressHook for FinishedFiles {
    fn on_progress(&self, event: &ProgressEvent) {
        if event.status == ProgressStatus::Finished {
            self.files
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .insert(event.filename.clone());
        }
    }
}
