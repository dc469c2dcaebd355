//! Artifact domain - Output naming for downloaded files and sidecars

mod namer;

pub use namer::{ArtifactSet, OutputTemplate, NA_PLACEHOLDER, PARTIAL_SUFFIX, SIDECAR_EXTENSION};
