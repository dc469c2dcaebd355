//! Test units and the runner executing one unit end to end

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::driver::{DriverOutcome, ExtractionDriver, Preflight};
use super::validator::{ResultValidator, ValidationReport};
use crate::domain::error::HarnessError;
use crate::domain::extractor::{
    DownloadParams, DownloadSession, ExtractFlat, FinishedFiles, TestParams, WarningPolicy,
};
use crate::domain::test_case::{TestCaseDefinition, UnitOutcome, UnitReport};
use crate::infrastructure::artifact::{ArtifactGuard, CleanupManager};

/// Class name shown in unit identities
pub const UNIT_CLASS: &str = "extractor_harness.TestDownload";

/// One synthesized test: a unique name bound to its definition
#[derive(Debug, Clone)]
pub struct TestUnit {
    name: String,
    definition: TestCaseDefinition,
}

impl TestUnit {
    pub fn new(name: impl Into<String>, definition: TestCaseDefinition) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &TestCaseDefinition {
        &self.definition
    }

    /// Key of the extractor under test
    pub fn extractor(&self) -> &str {
        self.definition.name()
    }

    /// Comma-separated auxiliary extractors
    pub fn add_ie(&self) -> String {
        self.definition.add_ie().join(",")
    }

    /// Reporting identity, e.g. `test_Foo (extractor_harness.TestDownload) [Bar]:`
    pub fn identity(&self) -> String {
        let add_ie = self.add_ie();
        if add_ie.is_empty() {
            format!("{} ({}):", self.name, UNIT_CLASS)
        } else {
            format!("{} ({}) [{}]:", self.name, UNIT_CLASS, add_ie)
        }
    }
}

/// Outcome of a unit before it is turned into a report
struct UnitRun {
    outcome: UnitOutcome,
    attempts: u32,
    assertions: ValidationReport,
}

impl UnitRun {
    fn new(outcome: UnitOutcome) -> Self {
        Self {
            outcome,
            attempts: 0,
            assertions: Vec::new(),
        }
    }

    fn error(error: &HarnessError, attempts: u32) -> Self {
        Self {
            outcome: UnitOutcome::from_error(error),
            attempts,
            assertions: Vec::new(),
        }
    }
}

/// Runs test units: preflight, extraction, validation and cleanup
pub struct UnitRunner {
    driver: Arc<ExtractionDriver>,
    cleanup: CleanupManager,
    output_dir: PathBuf,
    default_params: TestParams,
}

impl std::fmt::Debug for UnitRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitRunner")
            .field("driver", &self.driver)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl UnitRunner {
    pub fn new(driver: Arc<ExtractionDriver>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            cleanup: CleanupManager::new(),
            output_dir: output_dir.into(),
            default_params: TestParams::default(),
        }
    }

    /// Parameters every definition's own `params` are layered over
    pub fn with_default_params(mut self, params: TestParams) -> Self {
        self.default_params = params;
        self
    }

    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Resolved download parameters for a unit, its output template
    /// namespaced by the unit name
    pub fn params_for(&self, unit: &TestUnit) -> DownloadParams {
        let definition = unit.definition();
        let mut params = self.default_params.layered(definition.params());

        if definition.is_playlist() && !definition.declares_entries() {
            params.extract_flat.get_or_insert(ExtractFlat::InPlaylist);
            params.skip_download.get_or_insert(true);
        }

        let mut resolved = params.resolve();
        resolved.outtmpl = format!("{}_{}", unit.name(), resolved.outtmpl);
        resolved
    }

    pub async fn run(&self, unit: &TestUnit) -> UnitReport {
        let start = Instant::now();

        let mut run = self.execute(unit).await;
        if unit.definition().expected_failure().is_some() {
            run.outcome = run.outcome.expecting_failure();
        }

        match &run.outcome {
            UnitOutcome::Failed { message } | UnitOutcome::Errored { message } => {
                warn!(unit = %unit.name(), outcome = run.outcome.label(), error = %message, "Unit finished");
            }
            outcome => {
                info!(unit = %unit.name(), outcome = outcome.label(), attempts = run.attempts, "Unit finished");
            }
        }

        UnitReport::new(unit.name(), unit.identity(), unit.extractor(), run.outcome)
            .with_attempts(run.attempts)
            .with_assertions(run.assertions)
            .with_duration_ms(start.elapsed().as_millis() as u64)
    }

    async fn execute(&self, unit: &TestUnit) -> UnitRun {
        let definition = unit.definition();

        match self.driver.preflight(definition) {
            Err(e) => return UnitRun::error(&e, 0),
            Ok(Preflight::Skip(reason)) => {
                info!("Skipping {}: {}", definition.name(), reason);
                return UnitRun::new(UnitOutcome::Skipped { reason });
            }
            Ok(Preflight::Ready) => {}
        }

        let warnings = match WarningPolicy::new(definition.expected_warnings()) {
            Ok(warnings) => warnings,
            Err(e) => {
                let error = HarnessError::malformed(format!("Invalid expected warning: {}", e));
                return UnitRun::error(&error, 0);
            }
        };

        let finished = Arc::new(FinishedFiles::new());
        let session = DownloadSession::new(self.params_for(unit), &self.output_dir)
            .with_hook(finished.clone())
            .with_warnings(warnings);

        let declared = definition
            .expected_cases()
            .into_iter()
            .map(|case| session.artifacts(&case.naming_record()))
            .collect();
        let mut guard = ArtifactGuard::new(self.cleanup, declared);

        let (result, attempts) = match self.driver.extract(unit.name(), definition, &session).await {
            Ok(DriverOutcome::Extracted { result, attempts }) => (result, attempts),
            Ok(DriverOutcome::NetworkSkipped { attempts, reason }) => {
                let mut run = UnitRun::new(UnitOutcome::SkippedWithWarning { reason });
                run.attempts = attempts;
                return run;
            }
            Err(failure) => return UnitRun::error(&failure.error, failure.attempts),
        };

        if definition.is_playlist() {
            if let Some(entries) = result.entries() {
                guard.extend(entries.iter().map(|entry| session.artifacts(entry.fields())));
            }
        }

        let run = match ResultValidator::new(&session, &finished).validate(definition, &result) {
            Ok(assertions) => UnitRun {
                outcome: UnitOutcome::Passed,
                attempts,
                assertions,
            },
            Err(e) => UnitRun::error(&e, attempts),
        };

        drop(guard);
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extractor::{
        Downloader, ExtractionError, ExtractionResult, NetworkCause, ScriptedDownloader, Step,
    };
    use crate::domain::test_case::{ExpectationSpec, ExpectedInfo};
    use crate::infrastructure::extractor::{ExtractorRegistry, ManifestExtractor};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Leaves a partial file behind before every timeout
    #[derive(Default)]
    struct PartialThenTimeout {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Downloader for PartialThenTimeout {
        async fn extract_info(
            &self,
            _url: &str,
            session: &DownloadSession,
        ) -> Result<ExtractionResult, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let set = session.artifacts(example_result().fields());
            std::fs::write(&set.partial, b"partial").unwrap();
            Err(timeout())
        }
    }

    fn runner(downloader: Arc<dyn Downloader>, dir: &Path) -> UnitRunner {
        let mut registry = ExtractorRegistry::new();
        registry.register(Arc::new(ManifestExtractor::new("Example"))).unwrap();
        registry
            .register(Arc::new(ManifestExtractor::new("ExamplePlaylist")))
            .unwrap();
        let driver = ExtractionDriver::new(downloader, Arc::new(registry));
        UnitRunner::new(Arc::new(driver), dir)
    }

    fn scenario_a() -> TestUnit {
        TestUnit::new(
            "test_Example",
            TestCaseDefinition::new("Example", "http://example.com/v1")
                .with_expected("id", ExpectationSpec::literal("1"))
                .with_expected("ext", ExpectationSpec::literal("mp4"))
                .with_expected("title", ExpectationSpec::literal("Example")),
        )
    }

    fn example_result() -> ExtractionResult {
        ExtractionResult::new()
            .with_field("id", "1")
            .with_field("ext", "mp4")
            .with_field("title", "Example")
    }

    fn timeout() -> ExtractionError {
        ExtractionError::download("<urlopen error timed out>").with_cause(NetworkCause::Timeout)
    }

    fn residue(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[test]
    fn test_identity_includes_add_ie() {
        let unit = scenario_a();
        assert_eq!(
            unit.identity(),
            "test_Example (extractor_harness.TestDownload):"
        );

        let with_aux = TestUnit::new(
            "test_Example_1",
            unit.definition()
                .clone()
                .with_add_ie(vec!["Youtube".to_string(), "Vimeo".to_string()]),
        );
        assert_eq!(
            with_aux.identity(),
            "test_Example_1 (extractor_harness.TestDownload) [Youtube,Vimeo]:"
        );
    }

    #[test]
    fn test_params_namespaced_and_flat_playlist_defaults() {
        let dir = TempDir::new().unwrap();
        let runner = runner(Arc::new(ScriptedDownloader::new(vec![])), dir.path());

        let params = runner.params_for(&scenario_a());
        assert_eq!(params.outtmpl, "test_Example_%(id)s.%(ext)s");
        assert!(!params.skip_download);

        let playlist = TestUnit::new(
            "test_ExamplePlaylist",
            TestCaseDefinition::new("ExamplePlaylist", "http://example.com/pl")
                .with_playlist_mincount(3),
        );
        let params = runner.params_for(&playlist);
        assert_eq!(params.extract_flat, ExtractFlat::InPlaylist);
        assert!(params.skip_download);
    }

    #[tokio::test]
    async fn test_scenario_a_passes_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(ScriptedDownloader::succeeding(example_result()));
        let runner = runner(downloader.clone(), dir.path());

        let report = runner.run(&scenario_a()).await;

        assert_eq!(report.outcome(), &UnitOutcome::Passed);
        assert_eq!(report.attempts(), 1);
        assert!(!report.assertions().is_empty());
        assert!(residue(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_scenario_b_size_mismatch() {
        let dir = TempDir::new().unwrap();
        let downloader =
            Arc::new(ScriptedDownloader::succeeding(example_result()).with_file_size(500));
        let runner = runner(downloader, dir.path());

        let report = runner.run(&scenario_a()).await;

        match report.outcome() {
            UnitOutcome::Failed { message } => {
                assert!(message.contains("at least 9.77KiB"));
                assert!(message.contains("500.00B"));
            }
            other => panic!("expected a failure, got {:?}", other),
        }
        assert!(residue(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_scenario_c_timeouts_skip_with_warning() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(ScriptedDownloader::new(vec![
            Step::Fail(timeout()),
            Step::Fail(timeout()),
            Step::Fail(timeout()),
        ]));
        let runner = runner(downloader.clone(), dir.path());

        let report = runner.run(&scenario_a()).await;

        assert!(matches!(
            report.outcome(),
            UnitOutcome::SkippedWithWarning { .. }
        ));
        assert_eq!(report.attempts(), 3);
        assert!(report.assertions().is_empty());
        assert_eq!(downloader.calls(), 3);
    }

    #[tokio::test]
    async fn test_network_skip_leaves_no_partial_files() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(PartialThenTimeout::default());
        let runner = runner(downloader.clone(), dir.path());

        let report = runner.run(&scenario_a()).await;

        assert!(matches!(
            report.outcome(),
            UnitOutcome::SkippedWithWarning { .. }
        ));
        assert_eq!(report.attempts(), 3);
        assert_eq!(downloader.calls.load(Ordering::SeqCst), 3);
        assert!(residue(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_fatal_after_timeout_reports_attempts() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(ScriptedDownloader::new(vec![
            Step::Fail(timeout()),
            Step::Fail(ExtractionError::extractor("Unable to extract title")),
        ]));
        let runner = runner(downloader, dir.path());

        let report = runner.run(&scenario_a()).await;

        assert!(matches!(report.outcome(), UnitOutcome::Errored { .. }));
        assert_eq!(report.attempts(), 2);
    }

    #[tokio::test]
    async fn test_two_timeouts_then_success() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(ScriptedDownloader::new(vec![
            Step::Fail(timeout()),
            Step::Fail(timeout()),
            Step::Succeed(example_result()),
        ]));
        let runner = runner(downloader, dir.path());

        let report = runner.run(&scenario_a()).await;

        assert_eq!(report.outcome(), &UnitOutcome::Passed);
        assert_eq!(report.attempts(), 3);
    }

    #[tokio::test]
    async fn test_scenario_d_playlist_mincount() {
        let dir = TempDir::new().unwrap();
        let result = ExtractionResult::playlist(vec![
            ExtractionResult::new().with_field("id", "a").with_field("ext", "mp4"),
            ExtractionResult::new().with_field("id", "b").with_field("ext", "mp4"),
        ]);
        // Ignores the flat extraction hint and writes full entry files
        let downloader = Arc::new(ScriptedDownloader::succeeding(result));
        let runner = runner(downloader, dir.path());

        let unit = TestUnit::new(
            "test_ExamplePlaylist",
            TestCaseDefinition::new("ExamplePlaylist", "http://example.com/pl")
                .with_playlist_mincount(3)
                .with_params(TestParams {
                    skip_download: Some(false),
                    ..Default::default()
                }),
        );
        let report = runner.run(&unit).await;

        assert_eq!(
            report.outcome(),
            &UnitOutcome::Failed {
                message: "Expected at least 3 in playlist http://example.com/pl, but got only 2"
                    .to_string()
            }
        );
        assert!(residue(dir.path()).is_empty());
    }

    fn multi_video_unit() -> TestUnit {
        let child = |id: &str, title: &str| {
            TestCaseDefinition::entry(ExpectedInfo::new())
                .with_expected("id", ExpectationSpec::literal(id))
                .with_expected("ext", ExpectationSpec::literal("mp4"))
                .with_expected("title", ExpectationSpec::literal(title))
        };

        TestUnit::new(
            "test_ExamplePlaylist",
            TestCaseDefinition::new("ExamplePlaylist", "http://example.com/mv")
                .with_playlist(vec![child("a", "Ta"), child("b", "Tb")]),
        )
    }

    fn multi_video(second_title: &str) -> ExtractionResult {
        ExtractionResult::new()
            .with_field("_type", "multi_video")
            .with_field("id", "mv")
            .with_entries(vec![
                ExtractionResult::new()
                    .with_field("id", "a")
                    .with_field("ext", "mp4")
                    .with_field("title", "Ta"),
                ExtractionResult::new()
                    .with_field("id", "b")
                    .with_field("ext", "mp4")
                    .with_field("title", second_title),
            ])
    }

    #[tokio::test]
    async fn test_declared_entries_validated_by_position() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(ScriptedDownloader::succeeding(multi_video("Tb")));
        let runner = runner(downloader, dir.path());

        let report = runner.run(&multi_video_unit()).await;

        assert_eq!(report.outcome(), &UnitOutcome::Passed);
        assert!(report
            .assertions()
            .iter()
            .any(|a| a.name == "entries[1].title"));
        assert!(residue(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_declared_entry_mismatch_fails() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(ScriptedDownloader::succeeding(multi_video("WRONG")));
        let runner = runner(downloader, dir.path());

        let report = runner.run(&multi_video_unit()).await;

        assert_eq!(
            report.outcome(),
            &UnitOutcome::Failed {
                message: r#"entries[1]: Invalid value for field title, expected "Tb", got "WRONG""#
                    .to_string()
            }
        );
        assert!(residue(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_warning_errors() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(
            ScriptedDownloader::succeeding(example_result()).with_warning("Falling back on generic"),
        );
        let undeclared = runner(downloader, dir.path());

        let report = undeclared.run(&scenario_a()).await;
        assert!(matches!(report.outcome(), UnitOutcome::Errored { .. }));

        let declared = TestUnit::new(
            "test_Example",
            scenario_a()
                .definition()
                .clone()
                .with_expected_warnings(vec!["Falling back".to_string()]),
        );
        let downloader = Arc::new(
            ScriptedDownloader::succeeding(example_result()).with_warning("Falling back on generic"),
        );
        let report = runner(downloader, dir.path()).run(&declared).await;
        assert_eq!(report.outcome(), &UnitOutcome::Passed);
        assert!(residue(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_sidecar_inconsistency_fails() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(
            ScriptedDownloader::succeeding(example_result()).with_sidecar_field("title", "Other"),
        );
        let runner = runner(downloader, dir.path());

        let report = runner.run(&scenario_a()).await;
        assert!(matches!(report.outcome(), UnitOutcome::Failed { .. }));
        assert!(residue(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_stale_artifacts_removed_before_run() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("test_Example_1.mp4.part"), b"stale").unwrap();

        let downloader = Arc::new(ScriptedDownloader::new(vec![Step::Fail(
            ExtractionError::extractor("Unable to extract title"),
        )]));
        let runner = runner(downloader.clone(), dir.path());

        let report = runner.run(&scenario_a()).await;
        assert!(matches!(report.outcome(), UnitOutcome::Errored { .. }));
        assert_eq!(downloader.calls(), 1);
        assert!(residue(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_expected_failure() {
        let dir = TempDir::new().unwrap();
        let downloader =
            Arc::new(ScriptedDownloader::succeeding(example_result()).with_file_size(10));
        let runner = runner(downloader, dir.path());

        let unit = TestUnit::new(
            "test_Example",
            scenario_a().definition().clone().with_expected_failure("too small"),
        );
        let report = runner.run(&unit).await;
        assert!(matches!(report.outcome(), UnitOutcome::ExpectedFailure { .. }));
    }

    #[tokio::test]
    async fn test_malformed_definition_errors_without_extraction() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(ScriptedDownloader::succeeding(example_result()));
        let runner = runner(downloader.clone(), dir.path());

        let unit = TestUnit::new(
            "test_Example",
            TestCaseDefinition::new("Example", "http://example.com/v1")
                .with_expected("title", ExpectationSpec::literal("Example")),
        );
        let report = runner.run(&unit).await;

        assert!(matches!(report.outcome(), UnitOutcome::Errored { .. }));
        assert_eq!(downloader.calls(), 0);
    }
}
