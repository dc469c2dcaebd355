//! Artifact naming - derives output, partial and sidecar paths from a record

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

/// Suffix appended to the primary path while a download is in progress
pub const PARTIAL_SUFFIX: &str = ".part";

/// Extension replacing the primary extension for the metadata sidecar
pub const SIDECAR_EXTENSION: &str = "info.json";

/// Substituted for fields missing from the record
pub const NA_PLACEHOLDER: &str = "NA";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%\((\w+)\)([sd])").expect("placeholder regex is valid"));

/// Every filesystem path a single record may produce
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactSet {
    pub primary: PathBuf,
    pub partial: PathBuf,
    pub sidecar: PathBuf,
}

impl ArtifactSet {
    pub fn from_primary(primary: impl Into<PathBuf>) -> Self {
        let primary = primary.into();

        let mut partial = OsString::from(primary.as_os_str());
        partial.push(PARTIAL_SUFFIX);

        Self {
            sidecar: primary.with_extension(SIDECAR_EXTENSION),
            partial: PathBuf::from(partial),
            primary,
        }
    }

    pub fn paths(&self) -> [&Path; 3] {
        [&self.primary, &self.partial, &self.sidecar]
    }
}

/// Output filename template with `%(field)s` / `%(field)d` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    directory: PathBuf,
    template: String,
}

impl OutputTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            directory: PathBuf::new(),
            template: template.into(),
        }
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Prefix the template with a namespace so distinct units never collide
    pub fn namespaced(&self, namespace: &str) -> Self {
        Self {
            directory: self.directory.clone(),
            template: format!("{}_{}", namespace, self.template),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Primary output path for a record
    pub fn render(&self, record: &Map<String, Value>) -> PathBuf {
        let filename = PLACEHOLDER.replace_all(&self.template, |caps: &Captures| {
            let value = record.get(&caps[1]);
            sanitize(&format_field(value, &caps[2]))
        });

        self.directory.join(filename.as_ref())
    }

    pub fn artifacts(&self, record: &Map<String, Value>) -> ArtifactSet {
        ArtifactSet::from_primary(self.render(record))
    }
}

fn format_field(value: Option<&Value>, conversion: &str) -> String {
    match value {
        None | Some(Value::Null) => NA_PLACEHOLDER.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if conversion == "d" => match n.as_f64() {
            Some(f) => format!("{}", f.trunc() as i64),
            None => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

fn sanitize(field: &str) -> String {
    field
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_default_template() {
        let template = OutputTemplate::new("%(id)s.%(ext)s");
        let set = template.artifacts(&record(json!({"id": "1", "ext": "mp4"})));

        assert_eq!(set.primary, PathBuf::from("1.mp4"));
        assert_eq!(set.partial, PathBuf::from("1.mp4.part"));
        assert_eq!(set.sidecar, PathBuf::from("1.info.json"));
    }

    #[test]
    fn test_namespaced_in_directory() {
        let template = OutputTemplate::new("%(id)s.%(ext)s")
            .with_directory("/tmp/out")
            .namespaced("test_Example");
        let path = template.render(&record(json!({"id": "abc", "ext": "webm"})));

        assert_eq!(path, PathBuf::from("/tmp/out/test_Example_abc.webm"));
    }

    #[test]
    fn test_missing_fields_and_sanitizing() {
        let template = OutputTemplate::new("%(title)s-%(id)s.%(ext)s");
        let path = template.render(&record(json!({"id": "a/b", "ext": "mp4"})));

        assert_eq!(path, PathBuf::from("NA-a_b.mp4"));
    }

    #[test]
    fn test_numeric_fields() {
        let template = OutputTemplate::new("%(playlist_index)d-%(id)s.%(ext)s");
        let path = template.render(&record(json!({"playlist_index": 3.0, "id": 7, "ext": "mp3"})));

        assert_eq!(path, PathBuf::from("3-7.mp3"));
    }

    #[test]
    fn test_sidecar_without_extension() {
        let set = ArtifactSet::from_primary("/tmp/video");
        assert_eq!(set.sidecar, PathBuf::from("/tmp/video.info.json"));
        assert_eq!(set.paths().len(), 3);
    }
}
