//! Suite Aggregator - composite per-extractor runs and their tallies

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::info;

use super::synthesizer::TestRegistry;
use super::unit::{TestUnit, UnitRunner, UNIT_CLASS};
use crate::domain::error::HarnessError;
use crate::domain::test_case::{SuiteReport, SuiteSummary, UnitReport};

/// Runs groups of units and tallies their outcomes
#[derive(Debug)]
pub struct SuiteAggregator {
    runner: Arc<UnitRunner>,
    concurrency: usize,
}

impl SuiteAggregator {
    pub fn new(runner: Arc<UnitRunner>) -> Self {
        Self {
            runner,
            concurrency: 1,
        }
    }

    /// Units run at the same time; output templates are namespaced per unit
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn runner(&self) -> &UnitRunner {
        &self.runner
    }

    /// Run units, returning reports in the order the units were given
    pub async fn run_units(&self, units: &[&TestUnit]) -> Vec<UnitReport> {
        let runner = &self.runner;
        let mut indexed: Vec<(usize, UnitReport)> = stream::iter(units.iter().enumerate())
            .map(|(i, unit)| async move { (i, runner.run(unit).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, report)| report).collect()
    }

    /// Run one unit by name
    pub async fn run_unit(
        &self,
        registry: &TestRegistry,
        name: &str,
    ) -> Result<UnitReport, HarnessError> {
        let unit = registry
            .get(name)
            .ok_or_else(|| HarnessError::configuration(format!("Unknown test unit: {}", name)))?;
        Ok(self.runner.run(unit).await)
    }

    /// Composite `test_{key}_all` unit: every unit of one extractor
    pub async fn run_suite(
        &self,
        registry: &TestRegistry,
        key: &str,
    ) -> Result<SuiteReport, HarnessError> {
        let units = registry.units_for(key);
        if units.is_empty() {
            return Err(HarnessError::configuration(format!(
                "No test units for extractor {}",
                key
            )));
        }

        let name = TestRegistry::suite_name(key);
        let start = Instant::now();
        info!(
            suite = %name,
            units = units.len(),
            "{} ({}) [Test all: {}]:",
            name,
            UNIT_CLASS,
            key
        );

        let reports = self.run_units(&units).await;
        let summary = SuiteSummary::from_reports(&reports);

        info!(
            suite = %name,
            errors = summary.errors,
            failures = summary.failures,
            skipped = summary.skipped,
            "{}",
            summary
        );

        Ok(SuiteReport {
            name,
            extractor: key.to_string(),
            summary,
            reports,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Every composite unit in the registry, one per extractor
    pub async fn run_all(&self, registry: &TestRegistry) -> Vec<SuiteReport> {
        let mut suites = Vec::new();
        for key in registry.extractor_keys() {
            if let Ok(suite) = self.run_suite(registry, key).await {
                suites.push(suite);
            }
        }
        suites
    }
}
