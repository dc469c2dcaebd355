//! Expectation specs and the matcher applying them to metadata fields

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::AssertionOutcome;

/// Expected metadata record: field name to expectation
pub type ExpectedInfo = BTreeMap<String, ExpectationSpec>;

/// Errors raised while reading a declarative expectation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExpectationParseError {
    #[error("Invalid regex pattern '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("Invalid count '{0}'")]
    InvalidCount(String),

    #[error("Invalid '{tag}' expectation: {message}")]
    InvalidTag { tag: String, message: String },
}

/// JSON value kinds usable in type expectations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Number,
    String,
    List,
    Dict,
    Bool,
}

impl ValueKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "int" => Some(ValueKind::Int),
            "float" => Some(ValueKind::Float),
            "number" => Some(ValueKind::Number),
            "string" | "str" => Some(ValueKind::String),
            "list" => Some(ValueKind::List),
            "dict" => Some(ValueKind::Dict),
            "bool" => Some(ValueKind::Bool),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Dict => "dict",
            ValueKind::Bool => "bool",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueKind::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (ValueKind::Float | ValueKind::Number, Value::Number(_)) => true,
            (ValueKind::String, Value::String(_)) => true,
            (ValueKind::List, Value::Array(_)) => true,
            (ValueKind::Dict, Value::Object(_)) => true,
            (ValueKind::Bool, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

/// Sequence length rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountRule {
    AtLeast(usize),
    Exactly(usize),
}

impl CountRule {
    pub fn accepts(&self, len: usize) -> bool {
        match self {
            CountRule::AtLeast(min) => len >= *min,
            CountRule::Exactly(count) => len == *count,
        }
    }
}

/// Regular expression that must match the whole stringified value
#[derive(Debug, Clone)]
pub struct FieldPattern {
    source: String,
    regex: Regex,
}

impl FieldPattern {
    pub fn new(source: impl Into<String>) -> Result<Self, ExpectationParseError> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{})$", source)).map_err(|e| {
            ExpectationParseError::InvalidRegex {
                pattern: source.clone(),
                message: e.to_string(),
            }
        })?;

        Ok(Self { source, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_full_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for FieldPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Expected-value specification for one metadata field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum ExpectationSpec {
    /// Exact equality on the normalized value
    Literal(Value),
    /// Stringified value fully matches the regex
    Pattern(FieldPattern),
    /// Numeric value within an inclusive range; omitted sides are unbounded
    Bound { min: Option<f64>, max: Option<f64> },
    /// Substring, element, or (for a list expectation) subset containment
    Contains(Value),
    StartsWith(String),
    /// Field need not be checked
    Any,
    /// Every nested spec must match
    Compound(Vec<ExpectationSpec>),
    Type(ValueKind),
    /// md5 hex digest of the stringified value
    Md5(String),
    /// Length rule on a list value
    Count(CountRule),
}

const TAGS: [&str; 7] = ["any", "pattern", "contains", "startswith", "type", "all", "md5"];

impl ExpectationSpec {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn pattern(source: &str) -> Result<Self, ExpectationParseError> {
        Ok(Self::Pattern(FieldPattern::new(source)?))
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::Bound {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self::Bound {
            min: Some(min),
            max: None,
        }
    }

    pub fn contains(value: impl Into<Value>) -> Self {
        Self::Contains(value.into())
    }

    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Self::StartsWith(prefix.into())
    }

    pub fn all(specs: Vec<ExpectationSpec>) -> Self {
        Self::Compound(specs)
    }

    /// Literal string value, if this spec pins one
    pub fn as_literal_str(&self) -> Option<String> {
        match self {
            Self::Literal(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Self::Literal(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Apply the spec; an absent field only matches `Any`
    pub fn matches(&self, actual: Option<&Value>) -> bool {
        match (self, actual) {
            (Self::Any, _) => true,
            (Self::Compound(specs), _) => specs.iter().all(|spec| spec.matches(actual)),
            (_, None) => false,
            (_, Some(value)) => self.matches_value(value),
        }
    }

    fn matches_value(&self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::Compound(specs) => specs.iter().all(|spec| spec.matches_value(value)),
            Self::Literal(expected) => values_equal(expected, value),
            Self::Pattern(pattern) => pattern.is_full_match(&stringify(value)),
            Self::Bound { min, max } => value.as_f64().is_some_and(|n| {
                min.is_none_or(|lower| n >= lower) && max.is_none_or(|upper| n <= upper)
            }),
            Self::Contains(expected) => match (expected, value) {
                (Value::Array(subset), Value::Array(items)) => subset
                    .iter()
                    .all(|wanted| items.iter().any(|item| values_equal(wanted, item))),
                (Value::String(needle), Value::String(haystack)) => haystack.contains(needle),
                (wanted, Value::Array(items)) => items.iter().any(|item| values_equal(wanted, item)),
                _ => false,
            },
            Self::StartsWith(prefix) => value.as_str().is_some_and(|s| s.starts_with(prefix)),
            Self::Type(kind) => kind.accepts(value),
            Self::Md5(hex) => {
                format!("{:x}", md5::compute(stringify(value))) == hex.to_ascii_lowercase()
            }
            Self::Count(rule) => value.as_array().is_some_and(|items| rule.accepts(items.len())),
        }
    }

    fn parse_shorthand(text: String) -> Result<Self, ExpectationParseError> {
        if let Some(source) = text.strip_prefix("re:") {
            return Self::pattern(source);
        }
        if let Some(prefix) = text.strip_prefix("startswith:") {
            return Ok(Self::StartsWith(prefix.to_string()));
        }
        if let Some(needle) = text.strip_prefix("contains:") {
            return Ok(Self::Contains(Value::String(needle.to_string())));
        }
        if let Some(hex) = text.strip_prefix("md5:") {
            return Ok(Self::Md5(hex.to_string()));
        }
        if let Some(count) = text.strip_prefix("mincount:") {
            return parse_count(count).map(|n| Self::Count(CountRule::AtLeast(n)));
        }
        if let Some(count) = text.strip_prefix("count:") {
            return parse_count(count).map(|n| Self::Count(CountRule::Exactly(n)));
        }

        Ok(Self::Literal(Value::String(text)))
    }

    fn parse_tagged(mut map: Map<String, Value>) -> Result<Self, ExpectationParseError> {
        if map.keys().all(|k| k == "min" || k == "max") {
            let min = bound_value(map.remove("min"), "min")?;
            let max = bound_value(map.remove("max"), "max")?;
            return Ok(Self::Bound { min, max });
        }

        let Some((tag, value)) = map.into_iter().next() else {
            return Ok(Self::Literal(Value::Object(Map::new())));
        };

        let invalid = |message: &str| ExpectationParseError::InvalidTag {
            tag: tag.clone(),
            message: message.to_string(),
        };

        match tag.as_str() {
            "any" => Ok(Self::Any),
            "contains" => Ok(Self::Contains(value)),
            "pattern" => value
                .as_str()
                .ok_or_else(|| invalid("expected a string"))
                .and_then(Self::pattern),
            "startswith" => value
                .as_str()
                .map(|p| Self::StartsWith(p.to_string()))
                .ok_or_else(|| invalid("expected a string")),
            "md5" => value
                .as_str()
                .map(|hex| Self::Md5(hex.to_string()))
                .ok_or_else(|| invalid("expected a string")),
            "type" => value
                .as_str()
                .and_then(ValueKind::parse)
                .map(Self::Type)
                .ok_or_else(|| invalid("unknown type name")),
            "all" => match value {
                Value::Array(items) => items
                    .into_iter()
                    .map(ExpectationSpec::try_from)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Self::Compound),
                _ => Err(invalid("expected a list")),
            },
            _ => Err(invalid("unknown tag")),
        }
    }
}

fn parse_count(text: &str) -> Result<usize, ExpectationParseError> {
    text.trim()
        .parse()
        .map_err(|_| ExpectationParseError::InvalidCount(text.to_string()))
}

fn bound_value(value: Option<Value>, tag: &str) -> Result<Option<f64>, ExpectationParseError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| ExpectationParseError::InvalidTag {
                tag: tag.to_string(),
                message: format!("expected a number, got {}", v),
            }),
    }
}

fn is_tagged(map: &Map<String, Value>) -> bool {
    let bound_only = !map.is_empty() && map.keys().all(|k| k == "min" || k == "max");
    let single_tag = map.len() == 1 && map.keys().all(|k| TAGS.contains(&k.as_str()));
    bound_only || single_tag
}

/// Equality that treats `1` and `1.0` as the same number
fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => expected == actual,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl TryFrom<Value> for ExpectationSpec {
    type Error = ExpectationParseError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Self::parse_shorthand(text),
            Value::Object(map) if is_tagged(&map) => Self::parse_tagged(map),
            other => Ok(Self::Literal(other)),
        }
    }
}

impl From<ExpectationSpec> for Value {
    fn from(spec: ExpectationSpec) -> Self {
        match spec {
            ExpectationSpec::Literal(value) => value,
            ExpectationSpec::Pattern(pattern) => Value::String(format!("re:{}", pattern.as_str())),
            ExpectationSpec::Bound { min, max } => {
                let mut map = Map::new();
                if let Some(min) = min {
                    map.insert("min".to_string(), json!(min));
                }
                if let Some(max) = max {
                    map.insert("max".to_string(), json!(max));
                }
                Value::Object(map)
            }
            ExpectationSpec::Contains(Value::String(needle)) => {
                Value::String(format!("contains:{}", needle))
            }
            ExpectationSpec::Contains(value) => json!({ "contains": value }),
            ExpectationSpec::StartsWith(prefix) => Value::String(format!("startswith:{}", prefix)),
            ExpectationSpec::Any => json!({ "any": true }),
            ExpectationSpec::Compound(specs) => {
                json!({ "all": specs.into_iter().map(Value::from).collect::<Vec<_>>() })
            }
            ExpectationSpec::Type(kind) => json!({ "type": kind.name() }),
            ExpectationSpec::Md5(hex) => Value::String(format!("md5:{}", hex)),
            ExpectationSpec::Count(CountRule::AtLeast(n)) => Value::String(format!("mincount:{}", n)),
            ExpectationSpec::Count(CountRule::Exactly(n)) => Value::String(format!("count:{}", n)),
        }
    }
}

impl std::fmt::Display for ExpectationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::from(self.clone()))
    }
}

/// Applies expected-info dicts to metadata records
pub struct ExpectationEvaluator;

impl ExpectationEvaluator {
    /// Evaluate one field expectation
    pub fn evaluate(field: &str, spec: &ExpectationSpec, actual: Option<&Value>) -> AssertionOutcome {
        if spec.matches(actual) {
            return AssertionOutcome::passed(field, spec.to_string());
        }

        match actual {
            None => AssertionOutcome::failed(
                field,
                spec.to_string(),
                None,
                format!("Missing field '{}', expected {}", field, spec),
            ),
            Some(value) => {
                let actual = Self::truncate(&value.to_string());
                AssertionOutcome::failed(
                    field,
                    spec.to_string(),
                    Some(actual.clone()),
                    format!(
                        "Invalid value for field {}, expected {}, got {}",
                        field, spec, actual
                    ),
                )
            }
        }
    }

    /// Evaluate every expected field; fields the expectation omits are ignored
    pub fn evaluate_all(expected: &ExpectedInfo, actual: &Map<String, Value>) -> Vec<AssertionOutcome> {
        expected
            .iter()
            .map(|(field, spec)| Self::evaluate(field, spec, actual.get(field)))
            .collect()
    }

    fn truncate(text: &str) -> String {
        match text.char_indices().nth(200) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        }
    }
}
