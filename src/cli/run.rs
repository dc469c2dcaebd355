//! Run command - runs units and reports their outcomes

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::info;

use super::{bootstrap, load_registries, DefinitionArgs};
use crate::domain::test_case::{SuiteReport, SuiteSummary, UnitReport};
use crate::infrastructure::extractor::DirectDownloader;
use crate::infrastructure::harness::{ExtractionDriver, SuiteAggregator, UnitRunner};

/// Arguments for the run command
#[derive(Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: DefinitionArgs,

    /// Run the composite suite of one extractor
    #[arg(short, long, conflicts_with = "unit")]
    pub extractor: Option<String>,

    /// Run a single unit by name
    #[arg(short, long)]
    pub unit: Option<String>,

    /// Directory artifacts are written to (overrides config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Units run at the same time (overrides config)
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Print reports as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = bootstrap();
    let (extractors, units) = load_registries(&config, &args.source)?;

    let harness = &config.harness;
    let downloader =
        DirectDownloader::with_timeout(Duration::from_secs(harness.request_timeout_secs))?;
    let driver = ExtractionDriver::new(Arc::new(downloader), Arc::new(extractors));

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| harness.output_dir.clone());
    let runner = UnitRunner::new(Arc::new(driver), output_dir)
        .with_default_params(harness.default_params.clone());
    let aggregator = SuiteAggregator::new(Arc::new(runner))
        .with_concurrency(args.concurrency.unwrap_or(harness.concurrency));

    info!(units = units.len(), "Running test units");

    if let Some(name) = &args.unit {
        let report = aggregator.run_unit(&units, name).await?;
        print_report(&report, args.json)?;

        let mut summary = SuiteSummary::default();
        summary.record(report.outcome());
        return finish(&summary);
    }

    let suites = match &args.extractor {
        Some(key) => vec![aggregator.run_suite(&units, key).await?],
        None => aggregator.run_all(&units).await,
    };

    let mut total = SuiteSummary::default();
    for suite in &suites {
        print_suite(suite, args.json)?;
        for report in &suite.reports {
            total.record(report.outcome());
        }
    }

    if suites.len() > 1 && !args.json {
        println!("\nTotal: {} units\n{}", total.total(), total);
    }

    finish(&total)
}

fn print_report(report: &UnitReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        println!("{} ... {}", report.identity(), report.outcome());
    }
    Ok(())
}

fn print_suite(suite: &SuiteReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(suite)?);
        return Ok(());
    }

    for report in &suite.reports {
        print_report(report, false)?;
    }
    println!("{}\n", suite.summary);
    Ok(())
}

fn finish(summary: &SuiteSummary) -> anyhow::Result<()> {
    if !summary.is_successful() {
        anyhow::bail!(
            "{} errors, {} failures, {} unexpected successes",
            summary.errors,
            summary.failures,
            summary.unexpected_successes
        );
    }
    Ok(())
}
