//! Result Validator - ordered, fail-fast checks of an extraction result and
//! the artifacts it left on disk

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::error::HarnessError;
use crate::domain::extractor::{DownloadSession, ExtractionResult, FinishedFiles};
use crate::domain::test_case::{
    AssertionOutcome, ExpectationEvaluator, ExpectedInfo, TestCaseDefinition, DEFAULT_FILE_MINSIZE,
};
use crate::infrastructure::artifact::{file_md5, format_bytes, TEST_FILE_SIZE};

/// Assertions that held, in evaluation order
pub type ValidationReport = Vec<AssertionOutcome>;

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Collects passed assertions and stops at the first failing one
struct Checks {
    passed: ValidationReport,
}

impl Checks {
    fn new() -> Self {
        Self { passed: Vec::new() }
    }

    fn ensure(&mut self, outcome: AssertionOutcome) -> Result<(), HarnessError> {
        if outcome.passed {
            self.passed.push(outcome);
            Ok(())
        } else {
            Err(outcome.into_error())
        }
    }

    fn ensure_in(
        &mut self,
        scope: Option<&str>,
        outcome: AssertionOutcome,
    ) -> Result<(), HarnessError> {
        match scope {
            Some(scope) => self.ensure(outcome.scoped(scope)),
            None => self.ensure(outcome),
        }
    }

    /// Field expectations plus the mandatory fields of non-playlist records.
    /// `scope` names where the record came from (a playlist entry, a sidecar).
    fn record(
        &mut self,
        scope: Option<&str>,
        expected: &ExpectedInfo,
        actual: &Map<String, Value>,
    ) -> Result<(), HarnessError> {
        for outcome in ExpectationEvaluator::evaluate_all(expected, actual) {
            self.ensure_in(scope, outcome)?;
        }

        let result_type = actual.get("_type").and_then(Value::as_str);
        if matches!(result_type, Some("playlist" | "multi_video")) {
            return Ok(());
        }

        let mut mandatory = vec!["id", "title"];
        if expected.contains_key("ext") {
            mandatory.push("ext");
        }
        for field in mandatory {
            self.ensure_in(
                scope,
                AssertionOutcome::check(
                    format!("mandatory:{}", field),
                    is_truthy(actual.get(field)),
                    format!("Missing mandatory field {}", field),
                ),
            )?;
        }

        Ok(())
    }
}

/// Validates one unit's extraction result against its definition
pub struct ResultValidator<'a> {
    session: &'a DownloadSession,
    finished: &'a FinishedFiles,
}

impl<'a> ResultValidator<'a> {
    pub fn new(session: &'a DownloadSession, finished: &'a FinishedFiles) -> Self {
        Self { session, finished }
    }

    pub fn validate(
        &self,
        definition: &TestCaseDefinition,
        result: &ExtractionResult,
    ) -> Result<ValidationReport, HarnessError> {
        let mut checks = Checks::new();

        if definition.is_playlist() {
            self.validate_playlist(definition, result, &mut checks)?;
        }

        let entries = result.normalized_entries();
        for (index, case) in definition.expected_cases().into_iter().enumerate() {
            let entry = entries.get(index).ok_or_else(|| {
                HarnessError::mismatch(
                    "entries",
                    format!("at least {}", index + 1),
                    entries.len().to_string(),
                    format!(
                        "Expected an entry at position {} in {}, but got only {}",
                        index,
                        definition.url(),
                        entries.len()
                    ),
                )
            })?;

            let scope = definition
                .is_playlist()
                .then(|| format!("entries[{}]", index));
            checks.record(scope.as_deref(), case.info_dict(), entry.fields())?;
            self.validate_artifacts(case, &mut checks)?;
        }

        debug!(url = %definition.url(), assertions = checks.passed.len(), "Validation passed");
        Ok(checks.passed)
    }

    fn validate_playlist(
        &self,
        definition: &TestCaseDefinition,
        result: &ExtractionResult,
        checks: &mut Checks,
    ) -> Result<(), HarnessError> {
        checks.ensure(AssertionOutcome::check(
            "_type",
            result.is_playlist(),
            format!(
                "Expected a playlist or multi_video result, got {}",
                result.result_type()
            ),
        ))?;

        let entries = result.entries();
        checks.ensure(AssertionOutcome::check(
            "entries",
            entries.is_some(),
            "Expected the playlist result to have entries",
        ))?;
        let entries = entries.unwrap_or_default();

        checks.record(None, definition.info_dict(), result.fields())?;

        if let Some(mincount) = definition.playlist_mincount() {
            checks.ensure(self.count_outcome(
                "playlist_mincount",
                format!(">= {}", mincount),
                entries.len(),
                entries.len() >= mincount,
                format!(
                    "Expected at least {} in playlist {}, but got only {}",
                    mincount,
                    definition.url(),
                    entries.len()
                ),
            ))?;
        }

        if let Some(count) = definition.playlist_count() {
            checks.ensure(self.count_outcome(
                "playlist_count",
                count.to_string(),
                entries.len(),
                entries.len() == count,
                format!(
                    "Expected {} entries in playlist {}, but got {}.",
                    count,
                    definition.url(),
                    entries.len()
                ),
            ))?;
        }

        if let Some(expected) = definition.playlist_duration_sum() {
            let mut total = 0.0;
            for (index, entry) in entries.iter().enumerate() {
                let duration = entry.get("duration").and_then(Value::as_f64).ok_or_else(|| {
                    HarnessError::mismatch(
                        "playlist_duration_sum",
                        expected.to_string(),
                        "<missing>",
                        format!("Missing duration in playlist entry {}", index),
                    )
                })?;
                total += duration;
            }

            let outcome = if total == expected {
                AssertionOutcome::passed("playlist_duration_sum", expected.to_string())
            } else {
                AssertionOutcome::failed(
                    "playlist_duration_sum",
                    expected.to_string(),
                    Some(total.to_string()),
                    format!("Expected a total duration of {}, but got {}", expected, total),
                )
            };
            checks.ensure(outcome)?;
        }

        Ok(())
    }

    fn count_outcome(
        &self,
        name: &str,
        expected: String,
        actual: usize,
        holds: bool,
        message: String,
    ) -> AssertionOutcome {
        if holds {
            AssertionOutcome::passed(name, expected)
        } else {
            AssertionOutcome::failed(name, expected, Some(actual.to_string()), message)
        }
    }

    /// Primary file, progress, size and checksum, then the sidecar
    fn validate_artifacts(
        &self,
        case: &TestCaseDefinition,
        checks: &mut Checks,
    ) -> Result<(), HarnessError> {
        let params = self.session.params();
        let artifacts = self.session.artifacts(&case.naming_record());
        let primary = &artifacts.primary;

        if !params.skip_download {
            checks.ensure(AssertionOutcome::check(
                "file_exists",
                primary.exists(),
                format!("Missing file {}", primary.display()),
            ))?;

            checks.ensure(AssertionOutcome::check(
                "finished_hook",
                self.finished.contains(primary),
                format!(
                    "Download of {} never reported a finished status",
                    primary.display()
                ),
            ))?;

            if let Some(declared) = case.file_minsize() {
                let minsize = if params.test {
                    declared.max(DEFAULT_FILE_MINSIZE)
                } else {
                    declared
                };
                let size = std::fs::metadata(primary)
                    .map_err(|e| HarnessError::io(primary.display(), e))?
                    .len();

                checks.ensure(if size >= minsize {
                    AssertionOutcome::passed("file_minsize", format!(">= {}", minsize))
                } else {
                    AssertionOutcome::failed(
                        "file_minsize",
                        format!(">= {}", minsize),
                        Some(size.to_string()),
                        format!(
                            "Expected {} to be at least {}, but it's only {} ",
                            primary.display(),
                            format_bytes(minsize),
                            format_bytes(size)
                        ),
                    )
                })?;
            }

            if let Some(expected) = case.md5() {
                let limit = params.test.then_some(TEST_FILE_SIZE);
                let actual =
                    file_md5(primary, limit).map_err(|e| HarnessError::io(primary.display(), e))?;

                checks.ensure(if actual == expected {
                    AssertionOutcome::passed("md5", expected)
                } else {
                    AssertionOutcome::failed(
                        "md5",
                        expected,
                        Some(actual.clone()),
                        format!(
                            "md5 mismatch for {}: expected {}, got {}",
                            primary.display(),
                            expected,
                            actual
                        ),
                    )
                })?;
            }
        }

        let persisted = self.read_sidecar(&artifacts.sidecar, checks)?;
        let scope = artifacts.sidecar.display().to_string();
        checks.record(Some(&scope), case.info_dict(), &persisted)
    }

    fn read_sidecar(
        &self,
        sidecar: &Path,
        checks: &mut Checks,
    ) -> Result<Map<String, Value>, HarnessError> {
        checks.ensure(AssertionOutcome::check(
            "info_json_exists",
            sidecar.exists(),
            format!("Missing info file {}", sidecar.display()),
        ))?;

        let content =
            std::fs::read_to_string(sidecar).map_err(|e| HarnessError::io(sidecar.display(), e))?;

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(fields)) => Ok(fields),
            Ok(other) => Err(HarnessError::mismatch(
                "info_json",
                "object",
                other.to_string(),
                format!("Info file {} does not hold a JSON object", sidecar.display()),
            )),
            Err(e) => Err(HarnessError::mismatch(
                "info_json",
                "valid JSON",
                e.to_string(),
                format!("Info file {} is not valid JSON: {}", sidecar.display(), e),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extractor::{DownloadParams, ProgressEvent, TestParams};
    use crate::domain::test_case::ExpectationSpec;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        session: DownloadSession,
        finished: Arc<FinishedFiles>,
    }

    impl Fixture {
        fn new(params: DownloadParams) -> Self {
            let dir = TempDir::new().unwrap();
            let finished = Arc::new(FinishedFiles::new());
            let session = DownloadSession::new(params, dir.path()).with_hook(finished.clone());
            Self {
                dir,
                session,
                finished,
            }
        }

        fn write(&self, name: &str, bytes: usize, finished: bool) {
            let path = self.dir.path().join(name);
            std::fs::write(&path, vec![0u8; bytes]).unwrap();
            if finished {
                self.session
                    .report_progress(&ProgressEvent::finished(&path, bytes as u64));
            }
        }

        fn write_sidecar(&self, name: &str, value: Value) {
            std::fs::write(self.dir.path().join(name), value.to_string()).unwrap();
        }

        fn validate(
            &self,
            definition: &TestCaseDefinition,
            result: &ExtractionResult,
        ) -> Result<ValidationReport, HarnessError> {
            ResultValidator::new(&self.session, &self.finished).validate(definition, result)
        }
    }

    fn example() -> TestCaseDefinition {
        TestCaseDefinition::new("Example", "http://example.com/v1")
            .with_expected("id", ExpectationSpec::literal("1"))
            .with_expected("ext", ExpectationSpec::literal("mp4"))
            .with_expected("title", ExpectationSpec::literal("Example"))
    }

    fn example_result() -> ExtractionResult {
        ExtractionResult::new()
            .with_field("id", "1")
            .with_field("ext", "mp4")
            .with_field("title", "Example")
    }

    fn failure_message(result: Result<ValidationReport, HarnessError>) -> String {
        match result {
            Err(e @ HarnessError::ValidationMismatch { .. }) => e.to_string(),
            other => panic!("expected a validation mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_single_video_passes() {
        let fixture = Fixture::new(DownloadParams::default());
        fixture.write("1.mp4", 12_000, true);
        fixture.write_sidecar("1.info.json", json!({"id": "1", "ext": "mp4", "title": "Example"}));

        let report = fixture.validate(&example(), &example_result()).unwrap();
        assert!(report.iter().all(|a| a.passed));
        assert!(report.iter().any(|a| a.name == "file_minsize"));
    }

    #[test]
    fn test_undersized_file_fails() {
        let fixture = Fixture::new(DownloadParams::default());
        fixture.write("1.mp4", 500, true);
        fixture.write_sidecar("1.info.json", json!({"id": "1", "ext": "mp4", "title": "Example"}));

        let message = failure_message(fixture.validate(&example(), &example_result()));
        assert!(message.contains("to be at least 9.77KiB, but it's only 500.00B"));
    }

    #[test]
    fn test_minsize_clamped_in_test_mode() {
        let params = DownloadParams {
            test: true,
            ..Default::default()
        };
        let fixture = Fixture::new(params);
        fixture.write("1.mp4", 5_000, true);
        fixture.write_sidecar("1.info.json", json!({"id": "1", "ext": "mp4", "title": "Example"}));

        let definition = example().with_file_minsize(Some(1_000));
        assert!(fixture.validate(&definition, &example_result()).is_err());

        let unchecked = example().with_file_minsize(None);
        assert!(fixture.validate(&unchecked, &example_result()).is_ok());
    }

    #[test]
    fn test_missing_finished_event_fails() {
        let fixture = Fixture::new(DownloadParams::default());
        fixture.write("1.mp4", 12_000, false);
        fixture.write_sidecar("1.info.json", json!({"id": "1", "ext": "mp4", "title": "Example"}));

        let message = failure_message(fixture.validate(&example(), &example_result()));
        assert!(message.contains("never reported a finished status"));
    }

    #[test]
    fn test_md5_over_test_prefix() {
        let params = DownloadParams {
            test: true,
            ..Default::default()
        };
        let fixture = Fixture::new(params);
        fixture.write("1.mp4", 12_000, true);
        fixture.write_sidecar("1.info.json", json!({"id": "1", "ext": "mp4", "title": "Example"}));

        let prefix = format!("{:x}", md5::compute(vec![0u8; TEST_FILE_SIZE as usize]));
        let definition = example().with_md5(prefix);
        assert!(fixture.validate(&definition, &example_result()).is_ok());

        let wrong = example().with_md5("00000000000000000000000000000000");
        assert!(failure_message(fixture.validate(&wrong, &example_result())).contains("md5 mismatch"));
    }

    #[test]
    fn test_sidecar_mismatch_fails() {
        let fixture = Fixture::new(DownloadParams::default());
        fixture.write("1.mp4", 12_000, true);
        fixture.write_sidecar("1.info.json", json!({"id": "1", "ext": "mp4", "title": "Other"}));

        let message = failure_message(fixture.validate(&example(), &example_result()));
        let sidecar = fixture.dir.path().join("1.info.json");
        assert_eq!(
            message,
            format!(
                r#"{}: Invalid value for field title, expected "Example", got "Other""#,
                sidecar.display()
            )
        );
    }

    #[test]
    fn test_playlist_entry_mismatch_names_entry() {
        let fixture = Fixture::new(DownloadParams::default());
        for (id, title) in [("a", "Ta"), ("b", "Tb")] {
            fixture.write(&format!("{}.mp4", id), 12_000, true);
            fixture.write_sidecar(
                &format!("{}.info.json", id),
                json!({"id": id, "ext": "mp4", "title": title}),
            );
        }

        let child = |id: &str, title: &str| {
            TestCaseDefinition::entry(ExpectedInfo::new())
                .with_expected("id", ExpectationSpec::literal(id))
                .with_expected("ext", ExpectationSpec::literal("mp4"))
                .with_expected("title", ExpectationSpec::literal(title))
        };
        let definition = TestCaseDefinition::new("ExamplePlaylist", "http://example.com/mv")
            .with_playlist(vec![child("a", "Ta"), child("b", "Tb")]);
        let result = |second: &str| {
            ExtractionResult::new()
                .with_field("_type", "multi_video")
                .with_entries(vec![
                    ExtractionResult::new()
                        .with_field("id", "a")
                        .with_field("ext", "mp4")
                        .with_field("title", "Ta"),
                    ExtractionResult::new()
                        .with_field("id", "b")
                        .with_field("ext", "mp4")
                        .with_field("title", second),
                ])
        };

        let report = fixture.validate(&definition, &result("Tb")).unwrap();
        assert!(report.iter().any(|a| a.name == "entries[0].id"));

        let message = failure_message(fixture.validate(&definition, &result("Other")));
        assert_eq!(
            message,
            r#"entries[1]: Invalid value for field title, expected "Tb", got "Other""#
        );
    }

    #[test]
    fn test_missing_sidecar_fails() {
        let fixture = Fixture::new(DownloadParams::default());
        fixture.write("1.mp4", 12_000, true);

        let message = failure_message(fixture.validate(&example(), &example_result()));
        assert!(message.starts_with("Missing info file"));
    }

    #[test]
    fn test_mandatory_title() {
        let fixture = Fixture::new(DownloadParams::default());
        let definition = TestCaseDefinition::new("Example", "http://example.com/v1")
            .with_expected("id", ExpectationSpec::literal("1"))
            .with_expected("ext", ExpectationSpec::literal("mp4"));
        let result = ExtractionResult::new().with_field("id", "1").with_field("ext", "mp4");

        let message = failure_message(fixture.validate(&definition, &result));
        assert_eq!(message, "Missing mandatory field title");
    }

    #[test]
    fn test_playlist_mincount_fails_before_download_checks() {
        let params = TestParams {
            skip_download: Some(true),
            ..Default::default()
        }
        .resolve();
        let fixture = Fixture::new(params);

        let definition = TestCaseDefinition::new("ExamplePlaylist", "http://example.com/pl")
            .with_playlist_mincount(5);
        let result = ExtractionResult::playlist(vec![
            ExtractionResult::new().with_field("id", "a"),
            ExtractionResult::new().with_field("id", "b"),
        ]);

        let message = failure_message(fixture.validate(&definition, &result));
        assert_eq!(
            message,
            "Expected at least 5 in playlist http://example.com/pl, but got only 2"
        );
    }

    #[test]
    fn test_playlist_count_and_duration() {
        let params = TestParams {
            skip_download: Some(true),
            ..Default::default()
        }
        .resolve();
        let fixture = Fixture::new(params);

        let result = ExtractionResult::playlist(vec![
            ExtractionResult::new().with_field("id", "a").with_field("duration", 10),
            ExtractionResult::new().with_field("id", "b").with_field("duration", 20.5),
        ]);

        let counted = TestCaseDefinition::new("ExamplePlaylist", "http://example.com/pl")
            .with_playlist_count(2)
            .with_playlist_duration_sum(30.5);
        assert!(fixture.validate(&counted, &result).is_ok());

        let wrong = TestCaseDefinition::new("ExamplePlaylist", "http://example.com/pl")
            .with_playlist_count(3);
        assert_eq!(
            failure_message(fixture.validate(&wrong, &result)),
            "Expected 3 entries in playlist http://example.com/pl, but got 2."
        );
    }

    #[test]
    fn test_single_result_for_playlist_definition_fails() {
        let fixture = Fixture::new(DownloadParams::default());
        let definition = TestCaseDefinition::new("ExamplePlaylist", "http://example.com/pl")
            .with_playlist_mincount(1);

        assert!(fixture.validate(&definition, &example_result()).is_err());
    }
}
