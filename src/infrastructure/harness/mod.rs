//! Harness - Drives, validates, names and aggregates extractor test units

mod driver;
mod suite;
mod synthesizer;
mod unit;
mod validator;

pub use driver::{DriverFailure, DriverOutcome, ExtractionDriver, Preflight, MAX_ATTEMPTS};
pub use suite::SuiteAggregator;
pub use synthesizer::TestRegistry;
pub use unit::{TestUnit, UnitRunner, UNIT_CLASS};
pub use validator::{ResultValidator, ValidationReport};
