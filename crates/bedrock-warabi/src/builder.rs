//! Warabi provider space
//!
//! Parameters declared under each instance's `config` prefix:
//!
//! ```text
//! target.type                                  backend choice
//! target.path                                  type in persistent backends
//! target.initial_size                          type == pmdk
//! transfer_manager.type                        transfer manager choice
//! transfer_manager.pipeline.<setting>          transfer_manager.type == pipeline
//! ```

use std::sync::Arc;

use bedrock_space::{
    Condition, ConfigurationSpace, ConstructionError, ParamPath, ParameterRange, SpaceError,
};
use bedrock_spec::{
    BuilderRegistry, ProviderParameters, ProviderSpaceBuilder, ReconstructionError, SpecError,
};
use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};

use crate::options::{Backend, TransferManager, WarabiOptions};

/// Provider type of Warabi providers
pub const PROVIDER_TYPE: &str = "warabi";

const TARGET_TYPE: [&str; 2] = ["target", "type"];
const TARGET_PATH: [&str; 2] = ["target", "path"];
const TARGET_INITIAL_SIZE: [&str; 2] = ["target", "initial_size"];
const TM_TYPE: [&str; 2] = ["transfer_manager", "type"];

/// Space builder for Warabi storage providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarabiSpaceBuilder {
    options: WarabiOptions,
    backends: Vec<Backend>,
}

impl WarabiSpaceBuilder {
    /// Create builder, filtering the offered backends
    ///
    /// # Errors
    /// [`ConstructionError::Builder`] if persistence is required without
    /// paths, no backend or transfer manager is left, pmdk is offered
    /// without an initial size, or a pipeline range is invalid
    pub fn new(options: WarabiOptions) -> Result<Self, ConstructionError> {
        let fail = |reason: &str| ConstructionError::Builder {
            family: PROVIDER_TYPE.to_string(),
            reason: reason.to_string(),
        };

        if options.need_persistence && options.paths.is_empty() {
            return Err(fail("paths are required when persistence is needed"));
        }
        let backends: Vec<Backend> = Backend::ALL
            .into_iter()
            .filter(|b| options.types.contains(b))
            .filter(|b| !options.need_persistence || b.is_persistent())
            .collect();
        if backends.is_empty() {
            return Err(fail("no backend type left to choose from"));
        }
        if backends.contains(&Backend::Pmdk) && options.initial_size.is_none() {
            return Err(fail("pmdk targets need an initial size"));
        }
        if options.transfer_managers.is_empty() {
            return Err(fail("no transfer manager to choose from"));
        }
        for (key, range) in options.pipeline.ranges() {
            range.validate_count(format_args!("pipeline {key}"))?;
        }

        tracing::debug!(
            backends = ?backends,
            paths = options.paths.len(),
            "created warabi space builder"
        );
        Ok(Self { options, backends })
    }

    /// Parse options from JSON and create builder
    ///
    /// # Errors
    /// [`SpecError::InvalidOptions`] or a construction error
    pub fn from_options(options: &JsonValue) -> Result<Self, SpecError> {
        let options = WarabiOptions::deserialize(options).map_err(|e| SpecError::InvalidOptions {
            kind: PROVIDER_TYPE.into(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(options)?)
    }

    /// Options the builder was created with
    #[inline]
    #[must_use]
    pub fn options(&self) -> &WarabiOptions {
        &self.options
    }

    /// Backends left after filtering, in canonical order
    #[inline]
    #[must_use]
    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    fn persistent_backends(&self) -> Vec<&'static str> {
        self.backends
            .iter()
            .filter(|b| b.is_persistent())
            .map(|b| b.name())
            .collect()
    }

    fn offers_pipeline(&self) -> bool {
        self.options
            .transfer_managers
            .contains(&TransferManager::Pipeline)
    }
}

impl Default for WarabiSpaceBuilder {
    fn default() -> Self {
        Self {
            options: WarabiOptions::default(),
            backends: Backend::ALL.to_vec(),
        }
    }
}

impl ProviderSpaceBuilder for WarabiSpaceBuilder {
    fn provider_type(&self) -> &str {
        PROVIDER_TYPE
    }

    fn declare(&self, prefix: &ParamPath) -> Result<ConfigurationSpace, SpaceError> {
        let mut space = ConfigurationSpace::new();

        let target_type = prefix.with_keys(&TARGET_TYPE);
        space.add(ParameterRange::categorical_or_constant(
            target_type.clone(),
            self.backends.iter().map(|b| b.name()),
        ))?;

        let persistent = self.persistent_backends();
        if !self.options.paths.is_empty() && !persistent.is_empty() {
            let path = prefix.with_keys(&TARGET_PATH);
            space.add(ParameterRange::categorical_or_constant(
                path.clone(),
                self.options.paths.iter().map(String::as_str),
            ))?;
            space.add_condition(Condition::one_of(path, target_type.clone(), persistent))?;
        }

        if let (true, Some(size)) = (
            self.backends.contains(&Backend::Pmdk),
            self.options.initial_size,
        ) {
            let initial_size = prefix.with_keys(&TARGET_INITIAL_SIZE);
            space.add(ParameterRange::constant(initial_size.clone(), size))?;
            space.add_condition(Condition::equals(
                initial_size,
                target_type,
                Backend::Pmdk.name(),
            ))?;
        }

        let tm_type = prefix.with_keys(&TM_TYPE);
        space.add(ParameterRange::categorical_or_constant(
            tm_type.clone(),
            self.options.transfer_managers.iter().map(|tm| tm.name()),
        ))?;

        if self.offers_pipeline() {
            let pipeline = prefix.with_keys(&["transfer_manager", "pipeline"]);
            for (key, range) in self.options.pipeline.ranges() {
                let path = pipeline.with_key(key);
                space.add(ParameterRange::integer_or_constant(path.clone(), range))?;
                space.add_condition(Condition::equals(
                    path,
                    tm_type.clone(),
                    TransferManager::Pipeline.name(),
                ))?;
            }
        }

        Ok(space)
    }

    fn resolve(&self, parameters: &ProviderParameters) -> Result<JsonValue, ReconstructionError> {
        let backend_name = parameters.require_str("target.type")?;
        let backend = Backend::from_name(backend_name).ok_or_else(|| {
            ReconstructionError::Resolve {
                prefix: parameters.prefix().clone(),
                reason: format!("unknown warabi backend '{backend_name}'"),
            }
        })?;

        let mut target = Map::new();
        if parameters.contains("target.path") {
            target.insert(
                "path".into(),
                parameters.require_str("target.path")?.into(),
            );
        }
        match backend {
            Backend::Pmdk => {
                let size = parameters.require_int("target.initial_size")?;
                target.insert("create_if_missing_with_size".into(), size.into());
                target.insert("override_if_exists".into(), true.into());
            }
            Backend::Abtio => {
                target.insert("create_if_missing".into(), true.into());
                target.insert("override_if_exists".into(), true.into());
            }
            Backend::Memory => {}
        }

        let tm = parameters.require_str("transfer_manager.type")?;
        let mut tm_config = Map::new();
        if tm == TransferManager::Pipeline.name() {
            for (key, _) in self.options.pipeline.ranges() {
                let value = parameters.require_int(&format!("transfer_manager.pipeline.{key}"))?;
                tm_config.insert(key.into(), value.into());
            }
        }

        let mut config = json!({
            "target": {"type": backend.name(), "config": target},
            "transfer_manager": {"type": tm, "config": tm_config},
        });
        if !self.options.tags.is_empty() {
            config["tags"] = json!(self.options.tags);
        }
        Ok(config)
    }
}

/// Register the `warabi` builder kind
pub fn register(registry: &mut BuilderRegistry) {
    registry.register(PROVIDER_TYPE, |options| {
        Ok(Arc::new(WarabiSpaceBuilder::from_options(options)?))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedrock_space::Domain;
    use pretty_assertions::assert_eq;

    fn prefix() -> ParamPath {
        "pool[0].family[storage].provider[0].config".parse().unwrap()
    }

    fn declared(options: WarabiOptions) -> Vec<String> {
        WarabiSpaceBuilder::new(options)
            .unwrap()
            .declare(&ParamPath::key("config"))
            .unwrap()
            .parameters()
            .map(|p| p.path().to_string())
            .collect()
    }

    fn params(entries: &[(&str, bedrock_space::Value)]) -> ProviderParameters {
        let mut params = ProviderParameters::new(prefix());
        for (key, value) in entries {
            params.insert(key.parse().unwrap(), value.clone());
        }
        params
    }

    #[test]
    fn default_declarations() {
        assert_eq!(
            declared(WarabiOptions::default()),
            vec![
                "config.target.type",
                "config.target.initial_size",
                "config.transfer_manager.type",
                "config.transfer_manager.pipeline.num_pools",
                "config.transfer_manager.pipeline.num_buffers_per_pool",
                "config.transfer_manager.pipeline.first_buffer_size",
                "config.transfer_manager.pipeline.buffer_size_multiplier",
            ]
        );
    }

    #[test]
    fn paths_only_for_persistent_backends() {
        let builder =
            WarabiSpaceBuilder::new(WarabiOptions::new().with_paths(["/aaa", "/bbb"])).unwrap();
        let space = builder.declare(&ParamPath::key("config")).unwrap();
        let guard = space
            .conditions()
            .iter()
            .find(|c| c.child().to_string() == "config.target.path")
            .unwrap();
        assert_eq!(
            guard.to_string(),
            "config.target.path | config.target.type in {'abtio', 'pmdk'}"
        );

        // memory only: no path parameter at all
        let names = declared(
            WarabiOptions::new()
                .with_types([Backend::Memory])
                .with_paths(["/aaa"]),
        );
        assert!(!names.iter().any(|n| n.ends_with("path")));
    }

    #[test]
    fn single_choices_collapse_to_constants() {
        let builder = WarabiSpaceBuilder::new(
            WarabiOptions::new()
                .with_types([Backend::Memory])
                .with_transfer_managers([TransferManager::Default]),
        )
        .unwrap();
        let space = builder.declare(&ParamPath::key("config")).unwrap();
        let domains: Vec<&Domain> = space.parameters().map(|p| p.domain()).collect();
        assert_eq!(
            domains,
            vec![
                &Domain::Constant("memory".into()),
                &Domain::Constant("__default__".into()),
            ]
        );
    }

    #[test]
    fn construction_errors() {
        let persistence = WarabiSpaceBuilder::new(WarabiOptions::new().with_need_persistence(true));
        assert!(matches!(persistence, Err(ConstructionError::Builder { .. })));

        let none_left = WarabiSpaceBuilder::new(
            WarabiOptions::new()
                .with_types([Backend::Memory])
                .with_paths(["/data"])
                .with_need_persistence(true),
        );
        assert!(matches!(none_left, Err(ConstructionError::Builder { .. })));

        let no_size = WarabiSpaceBuilder::new(WarabiOptions::new().with_initial_size(None));
        assert!(matches!(no_size, Err(ConstructionError::Builder { .. })));

        // without pmdk the size is not needed
        assert!(WarabiSpaceBuilder::new(
            WarabiOptions::new()
                .with_types([Backend::Memory, Backend::Abtio])
                .with_initial_size(None)
        )
        .is_ok());
    }

    #[test]
    fn need_persistence_drops_memory() {
        let builder = WarabiSpaceBuilder::new(
            WarabiOptions::new()
                .with_paths(["/data"])
                .with_need_persistence(true),
        )
        .unwrap();
        assert_eq!(builder.backends(), &[Backend::Abtio, Backend::Pmdk]);
    }

    #[test]
    fn resolves_pmdk_pipeline() {
        let config = WarabiSpaceBuilder::new(WarabiOptions::new().with_tags(["hot"]))
            .unwrap()
            .resolve(&params(&[
                ("target.type", "pmdk".into()),
                ("target.initial_size", 10_485_760_i64.into()),
                ("transfer_manager.type", "pipeline".into()),
                ("transfer_manager.pipeline.num_pools", 1_i64.into()),
                ("transfer_manager.pipeline.num_buffers_per_pool", 8_i64.into()),
                ("transfer_manager.pipeline.first_buffer_size", 1024_i64.into()),
                ("transfer_manager.pipeline.buffer_size_multiplier", 2_i64.into()),
            ]))
            .unwrap();
        assert_eq!(
            config,
            json!({
                "target": {
                    "type": "pmdk",
                    "config": {"create_if_missing_with_size": 10_485_760, "override_if_exists": true}
                },
                "transfer_manager": {
                    "type": "pipeline",
                    "config": {
                        "num_pools": 1,
                        "num_buffers_per_pool": 8,
                        "first_buffer_size": 1024,
                        "buffer_size_multiplier": 2
                    }
                },
                "tags": ["hot"]
            })
        );
    }

    #[test]
    fn resolves_abtio_with_path() {
        let config = WarabiSpaceBuilder::default()
            .resolve(&params(&[
                ("target.type", "abtio".into()),
                ("target.path", "/aaa".into()),
                ("transfer_manager.type", "__default__".into()),
            ]))
            .unwrap();
        assert_eq!(
            config,
            json!({
                "target": {
                    "type": "abtio",
                    "config": {"path": "/aaa", "create_if_missing": true, "override_if_exists": true}
                },
                "transfer_manager": {"type": "__default__", "config": {}}
            })
        );
    }

    #[test]
    fn resolve_reports_missing_keys() {
        let err = WarabiSpaceBuilder::default()
            .resolve(&params(&[
                ("target.type", "memory".into()),
                ("transfer_manager.type", "pipeline".into()),
            ]))
            .unwrap_err();
        assert_eq!(
            err,
            ReconstructionError::MissingKey(
                prefix().with_keys(&["transfer_manager", "pipeline", "num_pools"])
            )
        );
    }

    #[test]
    fn registers_kind() {
        let mut registry = BuilderRegistry::with_defaults();
        register(&mut registry);
        let builder = registry
            .build("warabi", &serde_json::Value::Null)
            .unwrap();
        assert_eq!(builder.provider_type(), "warabi");
        assert!(matches!(
            registry.build("warabi", &json!({"types": ["nvme"]})),
            Err(SpecError::InvalidOptions { .. })
        ));
    }
}
