//! Infrastructure layer - Downloaders, artifact handling and the harness itself

pub mod artifact;
pub mod extractor;
pub mod harness;
pub mod logging;
