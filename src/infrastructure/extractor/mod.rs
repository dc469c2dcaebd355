//! Extractor infrastructure - Registry, manifest-declared extractors and the
//! direct-link downloader

mod direct;
mod manifest;
mod registry;

pub use direct::{network_cause, DirectDownloader, DIRECT_EXTRACTOR_KEY};
pub use manifest::{DefinitionManifest, ManifestExtractor};
pub use registry::ExtractorRegistry;
