//! Table-driven provider builder
//!
//! For provider types whose parameters are independent of each other: a
//! provider type and a table of named ranges, choice sets or constants.

use std::collections::BTreeMap;

use bedrock_space::{ConfigurationSpace, IntRange, ParamPath, ParameterRange, SpaceError, Value};
use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::provider::ProviderSpaceBuilder;

/// One entry of a [`StaticSpaceBuilder`] table
///
/// In config files: an integer or `[min, max]` pair is a range, any other
/// list is a choice set, and a string or boolean is a constant. A two-element
/// integer list is always read as a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StaticParameter {
    /// Inclusive integer range, constant if fixed
    Range(IntRange),
    /// Uniform choice, constant if single
    Choices(Vec<Value>),
    /// Fixed value
    Fixed(Value),
}

/// Provider builder declaring a fixed table of independent parameters
///
/// Dotted names nest, so `"target.type"` is declared under `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticSpaceBuilder {
    provider_type: String,
    #[serde(default)]
    parameters: BTreeMap<String, StaticParameter>,
}

impl StaticSpaceBuilder {
    /// Create builder for `provider_type` with no parameters
    #[must_use]
    pub fn new(provider_type: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Parse from a JSON options object
    ///
    /// # Errors
    /// [`SpecError::InvalidOptions`] if the object does not describe a table
    pub fn from_options(options: &serde_json::Value) -> Result<Self, SpecError> {
        Self::deserialize(options).map_err(|e| SpecError::InvalidOptions {
            kind: "static".into(),
            reason: e.to_string(),
        })
    }

    /// Add or replace a table entry
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, parameter: StaticParameter) -> Self {
        self.parameters.insert(name.into(), parameter);
        self
    }

    /// Add an integer range
    #[must_use]
    pub fn with_integer(self, name: impl Into<String>, range: impl Into<IntRange>) -> Self {
        self.with_parameter(name, StaticParameter::Range(range.into()))
    }

    /// Add a choice set
    #[must_use]
    pub fn with_choices<V: Into<Value>>(
        self,
        name: impl Into<String>,
        choices: impl IntoIterator<Item = V>,
    ) -> Self {
        let choices = choices.into_iter().map(Into::into).collect();
        self.with_parameter(name, StaticParameter::Choices(choices))
    }

    /// Add a constant
    #[must_use]
    pub fn with_constant(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_parameter(name, StaticParameter::Fixed(value.into()))
    }

    /// Table entries by name
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, StaticParameter> {
        &self.parameters
    }
}

impl ProviderSpaceBuilder for StaticSpaceBuilder {
    fn provider_type(&self) -> &str {
        &self.provider_type
    }

    fn declare(&self, prefix: &ParamPath) -> Result<ConfigurationSpace, SpaceError> {
        let mut space = ConfigurationSpace::new();
        for (name, parameter) in &self.parameters {
            let keys: Vec<&str> = name.split('.').collect();
            let path = prefix.with_keys(&keys);
            space.add(match parameter {
                StaticParameter::Range(range) => ParameterRange::integer_or_constant(path, *range),
                StaticParameter::Choices(choices) => {
                    ParameterRange::categorical_or_constant(path, choices.iter().cloned())
                }
                StaticParameter::Fixed(value) => ParameterRange::constant(path, value.clone()),
            })?;
        }
        Ok(space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedrock_space::{ConstructionError, Domain};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_table_from_options() {
        let options = serde_json::json!({
            "provider_type": "yokan",
            "parameters": {
                "cache_size": [1, 8],
                "backend": ["map", "rocksdb", "lmdb"],
                "database.name": "metadata",
                "threads": 4
            }
        });
        let builder = StaticSpaceBuilder::from_options(&options).unwrap();
        assert_eq!(
            builder,
            StaticSpaceBuilder::new("yokan")
                .with_integer("cache_size", (1, 8))
                .with_choices("backend", ["map", "rocksdb", "lmdb"])
                .with_constant("database.name", "metadata")
                .with_integer("threads", 4)
        );
    }

    #[test]
    fn rejects_unknown_option_fields() {
        let options = serde_json::json!({"provider_type": "yokan", "params": {}});
        assert!(matches!(
            StaticSpaceBuilder::from_options(&options),
            Err(SpecError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn declares_under_prefix() {
        let prefix = ParamPath::key("config");
        let space = StaticSpaceBuilder::new("yokan")
            .with_integer("threads", 4)
            .with_choices("backend", ["map"])
            .with_integer("cache.size", (1, 8))
            .declare(&prefix)
            .unwrap();

        let domains: Vec<(String, Domain)> = space
            .parameters()
            .map(|p| (p.path().to_string(), p.domain().clone()))
            .collect();
        assert_eq!(
            domains,
            vec![
                ("config.backend".into(), Domain::Constant("map".into())),
                (
                    "config.cache.size".into(),
                    Domain::Integer(IntRange::new(1, 8))
                ),
                ("config.threads".into(), Domain::Constant(Value::Int(4))),
            ]
        );
    }

    #[test]
    fn empty_choice_set_fails() {
        let err = StaticSpaceBuilder::new("yokan")
            .with_choices("backend", Vec::<Value>::new())
            .declare(&ParamPath::key("config"))
            .unwrap_err();
        assert!(matches!(
            err,
            SpaceError::Construction(ConstructionError::EmptyChoices(_))
        ));
    }
}
