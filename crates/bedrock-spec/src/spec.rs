//! Process specifications
//!
//! A [`ProcSpec`] is the nested, domain-shaped description of one process:
//! its address, its pools, and the providers each pool hosts. It is rebuilt
//! from a flat [`SampledConfiguration`] by reversing the parameter layout in
//! [`crate::layout`].

use std::collections::BTreeSet;

use bedrock_space::{
    ConfigurationSpace, IntRange, ParamPath, SampledConfiguration, Segment, SpaceError,
};
use serde::ser::Error as _;
use serde::{Deserialize, Serialize};

use crate::builder::ProcSpaceBuilder;
use crate::error::{ReconstructionError, SpecError};
use crate::layout;
use crate::provider::{ProviderParameters, ProviderSpaceFactory};

/// Nested specification of one process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcSpec {
    /// Network address, e.g. `na+sm`
    pub address: String,
    /// Pools in index order
    pub pools: Vec<PoolSpec>,
}

/// One pool and the providers it hosts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSpec {
    /// Pool name, `pool_{p}`
    pub name: String,
    /// Execution streams bound to the pool
    pub num_xstreams: u32,
    /// Providers in family/instance order
    pub providers: Vec<ProviderSpec>,
}

/// One provider instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Instance name, `{family}_{p}_{i}`
    pub name: String,
    /// Family the instance belongs to
    pub family: String,
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: String,
    /// Process-wide id, sequential from 0
    pub provider_id: u32,
    /// Provider configuration document
    pub config: serde_json::Value,
}

impl ProcSpec {
    /// Declare the configuration space of a process
    ///
    /// Shorthand for [`ProcSpaceBuilder`].
    ///
    /// # Errors
    /// See [`ProcSpaceBuilder::build`]
    pub fn space(
        num_pools: impl Into<IntRange>,
        num_xstreams: impl Into<IntRange>,
        factories: &[ProviderSpaceFactory],
    ) -> Result<ConfigurationSpace, SpaceError> {
        ProcSpaceBuilder::new()
            .with_num_pools(num_pools)
            .with_num_xstreams(num_xstreams)
            .with_factories(factories.iter().cloned())
            .build()
    }

    /// Rebuild a specification from a flat configuration
    ///
    /// Provider configs are the raw parameters nested by key.
    ///
    /// # Errors
    /// [`ReconstructionError`] if an expected key is missing or mistyped
    pub fn from_config(
        address: impl Into<String>,
        config: &SampledConfiguration,
    ) -> Result<Self, ReconstructionError> {
        Self::from_config_with(address, config, &[])
    }

    /// Rebuild a specification, letting each family's builder shape its
    /// providers' configs
    ///
    /// Families without a matching factory fall back to nested raw
    /// parameters. Every active pool must carry a count key for each bound
    /// family that may have instances.
    ///
    /// # Errors
    /// [`ReconstructionError`] if an expected key is missing or mistyped, or a
    /// builder rejects its parameters
    pub fn from_config_with(
        address: impl Into<String>,
        config: &SampledConfiguration,
        factories: &[ProviderSpaceFactory],
    ) -> Result<Self, ReconstructionError> {
        let num_pools = read_count(config, &layout::num_pools())?;
        let mut families = discover_families(config, num_pools);
        if num_pools > 0 {
            families.extend(
                factories
                    .iter()
                    .filter(|f| f.count().max > 0)
                    .map(|f| f.family().to_string()),
            );
        }

        let mut pools = Vec::new();
        let mut next_id: u32 = 0;
        for p in 0..num_pools {
            let xstreams_path = layout::num_xstreams(p);
            let xstreams = read_int(config, &xstreams_path)?;
            let num_xstreams = u32::try_from(xstreams).map_err(|_| {
                ReconstructionError::InvalidCount {
                    path: xstreams_path,
                    value: xstreams,
                }
            })?;

            let mut providers = Vec::new();
            for family in &families {
                let count = read_count(config, &layout::family_count(p, family))?;
                let factory = factories.iter().find(|f| f.family() == family);
                for i in 0..count {
                    let provider_type = read_str(config, &layout::provider_type(p, family, i))?;
                    let parameters =
                        ProviderParameters::collect(config, &layout::provider_config(p, family, i));
                    let provider_config = match factory {
                        Some(factory) => factory.builder().resolve(&parameters)?,
                        None => parameters.to_tree()?,
                    };
                    providers.push(ProviderSpec {
                        name: format!("{family}_{p}_{i}"),
                        family: family.clone(),
                        provider_type: provider_type.to_string(),
                        provider_id: next_id,
                        config: provider_config,
                    });
                    next_id += 1;
                }
            }

            pools.push(PoolSpec {
                name: format!("pool_{p}"),
                num_xstreams,
                providers,
            });
        }

        let spec = Self {
            address: address.into(),
            pools,
        };
        tracing::debug!(
            address = %spec.address,
            pools = spec.pools.len(),
            providers = spec.provider_count(),
            "materialized process specification"
        );
        Ok(spec)
    }

    /// Total number of providers across pools
    #[must_use]
    pub fn provider_count(&self) -> usize {
        self.pools.iter().map(|p| p.providers.len()).sum()
    }

    /// Iterate every provider in pool order
    pub fn providers(&self) -> impl Iterator<Item = &ProviderSpec> {
        self.pools.iter().flat_map(|p| p.providers.iter())
    }

    /// Serialize to JSON
    ///
    /// `indent == 0` gives the compact form. Map keys inside provider configs
    /// are sorted, so equal specs always render to the same text.
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self, indent: usize) -> Result<String, SpecError> {
        if indent == 0 {
            return Ok(serde_json::to_string(self)?);
        }
        let indent = " ".repeat(indent);
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(|e| SpecError::Json(serde_json::Error::custom(e)))
    }

    /// Serialize to YAML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> Result<String, SpecError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns error if the text is not a valid specification
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse from YAML
    ///
    /// # Errors
    /// Returns error if the text is not a valid specification
    pub fn from_yaml(yaml: &str) -> Result<Self, SpecError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Families with any key in an active pool, sorted by name
fn discover_families(config: &SampledConfiguration, num_pools: usize) -> BTreeSet<String> {
    config
        .paths()
        .filter_map(|path| match path.segments() {
            [Segment::Pool(p), Segment::Family(family), ..] if *p < num_pools => {
                Some(family.clone())
            }
            _ => None,
        })
        .collect()
}

fn read_int(config: &SampledConfiguration, path: &ParamPath) -> Result<i64, ReconstructionError> {
    let value = config
        .get(path)
        .ok_or_else(|| ReconstructionError::MissingKey(path.clone()))?;
    value.as_int().ok_or_else(|| ReconstructionError::WrongType {
        path: path.clone(),
        expected: "int",
        found: value.clone(),
    })
}

fn read_count(
    config: &SampledConfiguration,
    path: &ParamPath,
) -> Result<usize, ReconstructionError> {
    let value = read_int(config, path)?;
    usize::try_from(value).map_err(|_| ReconstructionError::InvalidCount {
        path: path.clone(),
        value,
    })
}

fn read_str<'a>(
    config: &'a SampledConfiguration,
    path: &ParamPath,
) -> Result<&'a str, ReconstructionError> {
    let value = config
        .get(path)
        .ok_or_else(|| ReconstructionError::MissingKey(path.clone()))?;
    value.as_str().ok_or_else(|| ReconstructionError::WrongType {
        path: path.clone(),
        expected: "string",
        found: value.clone(),
    })
}
