//! Registry of provider builder kinds
//!
//! Maps the builder kind named in a space config file to a constructor taking
//! that family's JSON options.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::SpecError;
use crate::provider::ProviderSpaceBuilder;
use crate::static_builder::StaticSpaceBuilder;

/// Constructor turning a JSON options object into a builder
pub type BuilderConstructor =
    fn(&serde_json::Value) -> Result<Arc<dyn ProviderSpaceBuilder>, SpecError>;

/// Registry of available builder kinds
#[derive(Debug, Default, Clone)]
pub struct BuilderRegistry {
    constructors: BTreeMap<String, BuilderConstructor>,
}

impl BuilderRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Create registry with the built-in `static` kind
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("static", |options| {
            Ok(Arc::new(StaticSpaceBuilder::from_options(options)?))
        });
        registry
    }

    /// Register a builder kind, replacing any previous constructor
    pub fn register(&mut self, kind: &str, constructor: BuilderConstructor) {
        self.constructors.insert(kind.to_string(), constructor);
    }

    /// Check if kind exists
    #[inline]
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Remove kind
    #[inline]
    pub fn remove(&mut self, kind: &str) -> bool {
        self.constructors.remove(kind).is_some()
    }

    /// List registered kinds, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Get number of registered kinds
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Construct a builder of `kind` from its options
    ///
    /// `null` options are treated as an empty object.
    ///
    /// # Errors
    /// [`SpecError::UnknownBuilder`] or the constructor's own error
    pub fn build(
        &self,
        kind: &str,
        options: &serde_json::Value,
    ) -> Result<Arc<dyn ProviderSpaceBuilder>, SpecError> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| SpecError::UnknownBuilder(kind.to_string()))?;
        if options.is_null() {
            constructor(&serde_json::Value::Object(serde_json::Map::new()))
        } else {
            constructor(options)
        }
    }
}
