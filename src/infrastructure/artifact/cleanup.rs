//! Cleanup Manager - removes every artifact a unit may have produced

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::artifact::ArtifactSet;

/// Removes artifact files, ignoring the ones that do not exist
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupManager;

impl CleanupManager {
    pub fn new() -> Self {
        Self
    }

    /// Remove one file. Returns whether something was deleted.
    pub fn remove(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed artifact");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove artifact");
                false
            }
        }
    }

    /// Remove every path of every set. Idempotent; returns the number of
    /// files deleted.
    pub fn cleanup<'a>(&self, sets: impl IntoIterator<Item = &'a ArtifactSet>) -> usize {
        sets.into_iter()
            .flat_map(|set| set.paths())
            .filter(|path| self.remove(path))
            .count()
    }
}

/// Scoped cleanup: removes stale artifacts when created and everything it
/// tracks when dropped, whichever way the unit ends
#[derive(Debug)]
pub struct ArtifactGuard {
    manager: CleanupManager,
    sets: Vec<ArtifactSet>,
}

impl ArtifactGuard {
    pub fn new(manager: CleanupManager, sets: Vec<ArtifactSet>) -> Self {
        let removed = manager.cleanup(&sets);
        if removed > 0 {
            debug!(removed, "Removed stale artifacts before run");
        }
        Self { manager, sets }
    }

    /// Track additional artifacts (e.g. the actual entries of a playlist)
    pub fn extend(&mut self, sets: impl IntoIterator<Item = ArtifactSet>) {
        for set in sets {
            if !self.sets.contains(&set) {
                self.sets.push(set);
            }
        }
    }

    pub fn tracked(&self) -> &[ArtifactSet] {
        &self.sets
    }

    /// Every tracked path, deduplicated
    pub fn tracked_paths(&self) -> BTreeSet<PathBuf> {
        self.sets
            .iter()
            .flat_map(|set| set.paths())
            .map(Path::to_path_buf)
            .collect()
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        self.manager.cleanup(&self.sets);
    }
}
