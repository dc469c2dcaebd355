//! Metadata records produced by extraction

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

const TYPE_KEY: &str = "_type";
const ENTRIES_KEY: &str = "entries";

/// Metadata record returned by one successful extraction attempt.
///
/// Either a single video record or a `playlist`/`multi_video` record owning
/// its ordered child records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    fields: Map<String, Value>,
    entries: Option<Vec<ExtractionResult>>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            entries: None,
        }
    }

    /// Create a playlist record with the given entries
    pub fn playlist(entries: Vec<ExtractionResult>) -> Self {
        Self::new()
            .with_field(TYPE_KEY, "playlist")
            .with_entries(entries)
    }

    // Builder methods
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_entries(mut self, entries: Vec<ExtractionResult>) -> Self {
        self.entries = Some(entries);
        self
    }

    // Getters
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn entries(&self) -> Option<&[ExtractionResult]> {
        self.entries.as_deref()
    }

    /// Declared result type, `video` when absent
    pub fn result_type(&self) -> &str {
        self.get_str(TYPE_KEY).unwrap_or("video")
    }

    pub fn is_playlist(&self) -> bool {
        matches!(self.result_type(), "playlist" | "multi_video")
    }

    /// Entries of a playlist, or the record itself for a bare single item
    pub fn normalized_entries(&self) -> Vec<&ExtractionResult> {
        match &self.entries {
            Some(entries) => entries.iter().collect(),
            None => vec![self],
        }
    }

    pub fn to_value(&self) -> Value {
        let mut fields = self.fields.clone();

        if let Some(entries) = &self.entries {
            fields.insert(
                ENTRIES_KEY.to_string(),
                Value::Array(entries.iter().map(ExtractionResult::to_value).collect()),
            );
        }

        Value::Object(fields)
    }

    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(mut fields) = value else {
            return Err(format!("expected a JSON object, got {}", value));
        };

        let entries = match fields.remove(ENTRIES_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .map(ExtractionResult::from_value)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(other) => return Err(format!("'entries' must be a list, got {}", other)),
        };

        Ok(Self { fields, entries })
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExtractionResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ExtractionResult::from_value(value).map_err(serde::de::Error::custom)
    }
}
