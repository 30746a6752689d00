//! Provider builders
//!
//! A [`ProviderSpaceBuilder`] knows the parameters of one provider type. A
//! [`ProviderSpaceFactory`] binds a builder to a family name and an instance
//! count range, which is what the process space builder consumes.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use bedrock_space::{
    ConfigurationSpace, IntRange, ParamPath, SampledConfiguration, SpaceError, Value,
};

use crate::error::ReconstructionError;

/// Parameter declarations for one provider type
///
/// Implementations are stateless apart from their options and may be shared
/// across threads behind an [`Arc`].
pub trait ProviderSpaceBuilder: Debug + Send + Sync {
    /// Provider type recorded in the specification, e.g. `warabi`
    fn provider_type(&self) -> &str;

    /// Declare one provider instance's parameters and conditions, every path
    /// under `prefix`
    ///
    /// Conditions may reference parameters outside `prefix` as parents.
    ///
    /// # Errors
    /// Returns error if a declaration is invalid
    fn declare(&self, prefix: &ParamPath) -> Result<ConfigurationSpace, SpaceError>;

    /// Shape sampled parameters into the provider's `config` document
    ///
    /// The default nests the parameters by key.
    ///
    /// # Errors
    /// Returns error if the parameters are inconsistent
    fn resolve(
        &self,
        parameters: &ProviderParameters,
    ) -> Result<serde_json::Value, ReconstructionError> {
        parameters.to_tree()
    }
}

/// Binding of a provider builder to a family and an instance count
#[derive(Debug, Clone)]
pub struct ProviderSpaceFactory {
    family: String,
    builder: Arc<dyn ProviderSpaceBuilder>,
    count: IntRange,
}

impl ProviderSpaceFactory {
    /// Bind `builder` to `family`, with `count` instances per pool
    #[must_use]
    pub fn new(
        family: impl Into<String>,
        builder: impl ProviderSpaceBuilder + 'static,
        count: impl Into<IntRange>,
    ) -> Self {
        Self::from_arc(family, Arc::new(builder), count)
    }

    /// Bind a shared builder
    #[must_use]
    pub fn from_arc(
        family: impl Into<String>,
        builder: Arc<dyn ProviderSpaceBuilder>,
        count: impl Into<IntRange>,
    ) -> Self {
        Self {
            family: family.into(),
            builder,
            count: count.into(),
        }
    }

    /// Family name
    #[inline]
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Bound builder
    #[inline]
    #[must_use]
    pub fn builder(&self) -> &dyn ProviderSpaceBuilder {
        self.builder.as_ref()
    }

    /// Instance count range per pool
    #[inline]
    #[must_use]
    pub fn count(&self) -> IntRange {
        self.count
    }
}

/// Sampled parameters of one provider instance
///
/// Keys are relative to the instance's `config` prefix, e.g. `target.type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderParameters {
    prefix: ParamPath,
    values: BTreeMap<ParamPath, Value>,
}

impl ProviderParameters {
    /// Create empty parameter set rooted at `prefix`
    #[inline]
    #[must_use]
    pub fn new(prefix: ParamPath) -> Self {
        Self {
            prefix,
            values: BTreeMap::new(),
        }
    }

    /// Gather every entry of `config` under `prefix`
    #[must_use]
    pub fn collect(config: &SampledConfiguration, prefix: &ParamPath) -> Self {
        let values = config
            .under(prefix)
            .filter_map(|(path, value)| {
                path.relative_to(prefix)
                    .ok()
                    .map(|key| (key, value.clone()))
            })
            .collect();
        Self {
            prefix: prefix.clone(),
            values,
        }
    }

    /// Set a parameter, returning the previous value
    pub fn insert(&mut self, key: ParamPath, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key, value.into())
    }

    /// Absolute prefix of these parameters
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &ParamPath {
        &self.prefix
    }

    /// Get a parameter by dotted key, e.g. `transfer_manager.type`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        let key: ParamPath = key.parse().ok()?;
        self.values.get(&key)
    }

    /// Check if a parameter is present
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Get a parameter that must be present
    ///
    /// # Errors
    /// [`ReconstructionError::MissingKey`] with the absolute path
    pub fn require(&self, key: &str) -> Result<&Value, ReconstructionError> {
        self.get(key)
            .ok_or_else(|| ReconstructionError::MissingKey(self.absolute(key)))
    }

    /// Get a string parameter that must be present
    ///
    /// # Errors
    /// Missing key or non-string value
    pub fn require_str(&self, key: &str) -> Result<&str, ReconstructionError> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| ReconstructionError::WrongType {
            path: self.absolute(key),
            expected: "string",
            found: value.clone(),
        })
    }

    /// Get an integer parameter that must be present
    ///
    /// # Errors
    /// Missing key or non-integer value
    pub fn require_int(&self, key: &str) -> Result<i64, ReconstructionError> {
        let value = self.require(key)?;
        value.as_int().ok_or_else(|| ReconstructionError::WrongType {
            path: self.absolute(key),
            expected: "int",
            found: value.clone(),
        })
    }

    /// Number of parameters
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no parameters
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(relative key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&ParamPath, &Value)> {
        self.values.iter()
    }

    /// Nest parameters into a JSON object, one level per path segment
    ///
    /// # Errors
    /// [`ReconstructionError::ConflictingKeys`] if a key is both a leaf and a
    /// parent
    pub fn to_tree(&self) -> Result<serde_json::Value, ReconstructionError> {
        let mut root = serde_json::Map::new();
        for (key, value) in &self.values {
            let conflict = || ReconstructionError::ConflictingKeys(self.prefix.join(key));
            let names: Vec<String> = key.iter().map(ToString::to_string).collect();
            let Some((leaf, parents)) = names.split_last() else {
                return Err(conflict());
            };

            let mut node = &mut root;
            for name in parents {
                node = node
                    .entry(name.clone())
                    .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()))
                    .as_object_mut()
                    .ok_or_else(conflict)?;
            }
            if node.insert(leaf.clone(), value.clone().into()).is_some() {
                return Err(conflict());
            }
        }
        Ok(serde_json::Value::Object(root))
    }

    fn absolute(&self, key: &str) -> ParamPath {
        match key.parse::<ParamPath>() {
            Ok(key) => self.prefix.join(&key),
            Err(_) => self.prefix.with_key(key),
        }
    }
}
