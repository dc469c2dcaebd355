//! Artifact infrastructure - Cleanup and checksums of produced files

mod checksum;
mod cleanup;

pub use checksum::{file_md5, format_bytes, TEST_FILE_SIZE};
pub use cleanup::{ArtifactGuard, CleanupManager};
