//! Test Unit Synthesizer - turns definitions into uniquely named units

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use super::unit::TestUnit;
use crate::domain::test_case::TestCaseDefinition;

/// Explicit registry of synthesized test units, in declaration order
#[derive(Debug, Default)]
pub struct TestRegistry {
    units: Vec<TestUnit>,
    index: HashMap<String, usize>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name every definition `test_{extractor}`, adding `_1`, `_2`, ... when
    /// the name is taken
    pub fn synthesize(definitions: impl IntoIterator<Item = TestCaseDefinition>) -> Self {
        let mut registry = Self::new();
        for definition in definitions {
            registry.add(definition);
        }
        registry
    }

    /// Add one definition and return the name it was given
    pub fn add(&mut self, definition: TestCaseDefinition) -> String {
        let mut name = format!("test_{}", definition.name());
        let mut i = 1;
        while self.index.contains_key(&name) {
            name = format!("test_{}_{}", definition.name(), i);
            i += 1;
        }

        debug!(unit = %name, extractor = %definition.name(), "Synthesized test unit");

        self.index.insert(name.clone(), self.units.len());
        self.units.push(TestUnit::new(name.clone(), definition));
        name
    }

    pub fn get(&self, name: &str) -> Option<&TestUnit> {
        self.index.get(name).map(|&i| &self.units[i])
    }

    pub fn units(&self) -> &[TestUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Distinct extractor keys, in first-declaration order
    pub fn extractor_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for unit in &self.units {
            if !keys.contains(&unit.extractor()) {
                keys.push(unit.extractor());
            }
        }
        keys
    }

    /// Units named `test_{key}` or `test_{key}_{n}` that exercise `key`
    pub fn units_for(&self, key: &str) -> Vec<&TestUnit> {
        let pattern = format!(r"^test_{}(?:_\d+)?$", regex::escape(key));
        let Ok(matcher) = Regex::new(&pattern) else {
            return Vec::new();
        };

        self.units
            .iter()
            .filter(|unit| unit.extractor() == key && matcher.is_match(unit.name()))
            .collect()
    }

    /// Name of the composite unit running every test of `key`
    pub fn suite_name(key: &str) -> String {
        format!("test_{}_all", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(name: &str) -> TestCaseDefinition {
        TestCaseDefinition::new(name, format!("http://example.com/{}", name))
    }

    #[test]
    fn test_collision_naming() {
        let registry = TestRegistry::synthesize(vec![
            case("Dropbox"),
            case("Imdb"),
            case("Dropbox"),
            case("Dropbox"),
        ]);

        let names: Vec<&str> = registry.units().iter().map(|u| u.name()).collect();
        assert_eq!(
            names,
            vec!["test_Dropbox", "test_Imdb", "test_Dropbox_1", "test_Dropbox_2"]
        );
        assert_eq!(registry.get("test_Dropbox_2").unwrap().extractor(), "Dropbox");
    }

    #[test]
    fn test_grouping_by_extractor() {
        let registry = TestRegistry::synthesize(vec![
            case("Foo"),
            case("Foo"),
            case("Foo_1"),
            case("FooBar"),
        ]);

        // `Foo_1` collides with the second Foo unit and is renamed
        assert!(registry.get("test_Foo_1_1").is_some());

        let foo: Vec<&str> = registry.units_for("Foo").iter().map(|u| u.name()).collect();
        assert_eq!(foo, vec!["test_Foo", "test_Foo_1"]);

        let foo_1: Vec<&str> = registry.units_for("Foo_1").iter().map(|u| u.name()).collect();
        assert_eq!(foo_1, vec!["test_Foo_1_1"]);
        assert_eq!(registry.units_for("FooBar").len(), 1);
        assert_eq!(registry.extractor_keys(), vec!["Foo", "Foo_1", "FooBar"]);
        assert_eq!(TestRegistry::suite_name("Foo"), "test_Foo_all");
    }
}
