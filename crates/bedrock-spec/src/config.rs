//! Space config files
//!
//! A [`SpaceConfig`] describes a process space declaratively: pool and
//! execution stream ranges plus one entry per provider family naming a
//! builder kind from a [`BuilderRegistry`] and its options.
//!
//! ```toml
//! num_pools = [1, 3]
//! num_xstreams = [2, 5]
//!
//! [[families]]
//! family = "storage"
//! type = "warabi"
//! count = [1, 3]
//! options = { types = ["memory", "pmdk"] }
//! ```

use std::path::Path;

use bedrock_space::{ConfigurationSpace, IntRange};
use serde::{Deserialize, Serialize};

use crate::builder::ProcSpaceBuilder;
use crate::error::SpecError;
use crate::provider::ProviderSpaceFactory;
use crate::registry::BuilderRegistry;

const fn one() -> IntRange {
    IntRange::fixed(1)
}

/// Declarative process space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpaceConfig {
    /// Pool count range
    #[serde(default = "one")]
    pub num_pools: IntRange,
    /// Per-pool execution stream range
    #[serde(default = "one")]
    pub num_xstreams: IntRange,
    /// Provider family bindings
    #[serde(default)]
    pub families: Vec<FamilyConfig>,
}

/// One provider family binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyConfig {
    /// Family name
    pub family: String,
    /// Builder kind registered in the [`BuilderRegistry`]
    #[serde(rename = "type")]
    pub kind: String,
    /// Instances per pool
    #[serde(default = "one")]
    pub count: IntRange,
    /// Options passed to the builder constructor
    #[serde(default)]
    pub options: serde_json::Value,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            num_pools: one(),
            num_xstreams: one(),
            families: Vec::new(),
        }
    }
}

impl SpaceConfig {
    /// Create config with one pool of one execution stream
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pool count range
    #[must_use]
    pub fn with_num_pools(mut self, range: impl Into<IntRange>) -> Self {
        self.num_pools = range.into();
        self
    }

    /// Set per-pool execution stream range
    #[must_use]
    pub fn with_num_xstreams(mut self, range: impl Into<IntRange>) -> Self {
        self.num_xstreams = range.into();
        self
    }

    /// Add a family binding
    #[must_use]
    pub fn with_family(
        mut self,
        family: impl Into<String>,
        kind: impl Into<String>,
        count: impl Into<IntRange>,
        options: serde_json::Value,
    ) -> Self {
        self.families.push(FamilyConfig {
            family: family.into(),
            kind: kind.into(),
            count: count.into(),
            options,
        });
        self
    }

    /// Load from a file, picking the format from its extension
    ///
    /// # Errors
    /// I/O, parse, or unsupported extension errors
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let config = match extension.as_str() {
            "toml" => Self::from_toml_str(&text),
            "json" => Self::from_json_str(&text),
            "yaml" | "yml" => Self::from_yaml_str(&text),
            _ => Err(SpecError::UnsupportedFormat(extension)),
        }?;
        tracing::debug!(
            path = %path.display(),
            families = config.families.len(),
            "loaded space config"
        );
        Ok(config)
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns error if the text is not a valid space config
    pub fn from_toml_str(text: &str) -> Result<Self, SpecError> {
        Ok(toml::from_str(text)?)
    }

    /// Parse JSON text
    ///
    /// # Errors
    /// Returns error if the text is not a valid space config
    pub fn from_json_str(text: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse YAML text
    ///
    /// # Errors
    /// Returns error if the text is not a valid space config
    pub fn from_yaml_str(text: &str) -> Result<Self, SpecError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Construct one factory per family through `registry`
    ///
    /// # Errors
    /// Unknown builder kinds or options rejected by a constructor
    pub fn to_factories(
        &self,
        registry: &BuilderRegistry,
    ) -> Result<Vec<ProviderSpaceFactory>, SpecError> {
        self.families
            .iter()
            .map(|f| {
                let builder = registry.build(&f.kind, &f.options)?;
                Ok(ProviderSpaceFactory::from_arc(&f.family, builder, f.count))
            })
            .collect()
    }

    /// Space builder for this config
    ///
    /// # Errors
    /// See [`SpaceConfig::to_factories`]
    pub fn to_builder(&self, registry: &BuilderRegistry) -> Result<ProcSpaceBuilder, SpecError> {
        Ok(ProcSpaceBuilder::new()
            .with_num_pools(self.num_pools)
            .with_num_xstreams(self.num_xstreams)
            .with_factories(self.to_factories(registry)?))
    }

    /// Declare the configuration space (not frozen)
    ///
    /// # Errors
    /// Factory construction or space construction errors
    pub fn build_space(&self, registry: &BuilderRegistry) -> Result<ConfigurationSpace, SpecError> {
        Ok(self.to_builder(registry)?.build()?)
    }
}
