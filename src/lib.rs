//! Extractor Harness
//!
//! Test-case driven validation of source extractors:
//! - Declarative test definitions with literal, regex, type, count and checksum expectations
//! - Bounded retries of transient network failures
//! - Artifact naming, validation and cleanup
//! - Per-extractor composite suites with tallied outcomes

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
