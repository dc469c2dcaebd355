//! CLI module for the extractor harness
//!
//! Subcommands:
//! - `list`: print the synthesized test units
//! - `check`: validate definitions without downloading anything
//! - `run`: run single units, per-extractor suites or everything

pub mod check;
pub mod list;
pub mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::extractor::{DefinitionManifest, ExtractorRegistry};
use crate::infrastructure::harness::TestRegistry;
use crate::infrastructure::logging;

/// Extractor harness - test-case driven validation of source extractors
#[derive(Parser)]
#[command(name = "extractor-harness")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List synthesized test units
    List(list::ListArgs),

    /// Validate test definitions
    Check(check::CheckArgs),

    /// Run test units
    Run(run::RunArgs),
}

/// Where test definitions are read from
#[derive(Args, Clone, Debug, Default)]
pub struct DefinitionArgs {
    /// Definition manifest (overrides config)
    #[arg(short, long)]
    pub definitions: Option<PathBuf>,
}

/// Environment, configuration and logging shared by every subcommand
fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);
    config
}

/// Extractors declared by the manifest and the units synthesized from them
fn load_registries(
    config: &AppConfig,
    args: &DefinitionArgs,
) -> anyhow::Result<(ExtractorRegistry, TestRegistry)> {
    let path = args
        .definitions
        .clone()
        .unwrap_or_else(|| config.harness.definitions.clone());

    let extractors = DefinitionManifest::from_file(&path)?.into_registry()?;
    let units = TestRegistry::synthesize(extractors.gather_test_cases());
    Ok((extractors, units))
}
