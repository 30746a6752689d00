//! Process configuration space builder
//!
//! Expands pool and provider-family bindings into one flat, conditional
//! [`ConfigurationSpace`] laid out as described in [`crate::layout`].

use std::collections::HashSet;

use bedrock_space::{
    Condition, ConfigurationSpace, ConstructionError, IntRange, ParamPath, ParameterRange,
    Segment, SpaceError,
};

use crate::layout;
use crate::provider::ProviderSpaceFactory;

/// Builder for the configuration space of one process
///
/// # Example
///
/// ```rust
/// use bedrock_spec::{ProcSpaceBuilder, ProviderSpaceFactory, StaticSpaceBuilder};
///
/// let db = StaticSpaceBuilder::new("yokan").with_choices("backend", ["map", "rocksdb"]);
/// let space = ProcSpaceBuilder::new()
///     .with_num_pools((1, 2))
///     .with_num_xstreams((1, 4))
///     .with_factory(ProviderSpaceFactory::new("db", db, (0, 1)))
///     .build()
///     .unwrap();
/// assert!(space.contains(&"pool[1].family[db].provider[0].config.backend".parse().unwrap()));
/// ```
#[derive(Debug, Clone)]
pub struct ProcSpaceBuilder {
    num_pools: IntRange,
    num_xstreams: IntRange,
    factories: Vec<ProviderSpaceFactory>,
}

impl Default for ProcSpaceBuilder {
    fn default() -> Self {
        Self {
            num_pools: IntRange::fixed(1),
            num_xstreams: IntRange::fixed(1),
            factories: Vec::new(),
        }
    }
}

impl ProcSpaceBuilder {
    /// Create builder with one pool of one execution stream and no providers
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

    /// Add a provider family binding
    #[must_use]
    pub fn with_factory(mut self, factory: ProviderSpaceFactory) -> Self {
        self.factories.push(factory);
        self
    }

    /// Add several provider family bindings
    #[must_use]
    pub fn with_factories(mut self, factories: impl IntoIterator<Item = ProviderSpaceFactory>) -> Self {
        self.factories.extend(factories);
        self
    }

    /// Pool count range
    #[inline]
    #[must_use]
    pub fn num_pools(&self) -> IntRange {
        self.num_pools
    }

    /// Per-pool execution stream range
    #[inline]
    #[must_use]
    pub fn num_xstreams(&self) -> IntRange {
        self.num_xstreams
    }

    /// Bound provider families, in declaration order
    #[inline]
    #[must_use]
    pub fn factories(&self) -> &[ProviderSpaceFactory] {
        &self.factories
    }

    /// Declare every parameter and condition of the process space
    ///
    /// The result is not frozen. Identical builders produce identical
    /// parameter order.
    ///
    /// # Errors
    /// Returns [`ConstructionError`] for bad ranges, invalid or duplicated
    /// families, or builder declarations outside their namespace
    pub fn build(&self) -> Result<ConfigurationSpace, SpaceError> {
        self.num_pools.validate_count(layout::NUM_POOLS)?;
        self.num_xstreams.validate_count(layout::NUM_XSTREAMS)?;
        self.validate_factories()?;

        let mut space = ConfigurationSpace::new();
        let num_pools = layout::num_pools();
        space.add(ParameterRange::integer(num_pools.clone(), self.num_pools))?;

        for p in 0..self.num_pools.max_count() {
            let xstreams = layout::num_xstreams(p);
            space.add(ParameterRange::integer(xstreams.clone(), self.num_xstreams))?;
            space.add_condition(Condition::index_below(xstreams, num_pools.clone(), p))?;

            for factory in &self.factories {
                self.declare_family(&mut space, p, factory)?;
            }
        }

        tracing::debug!(
            parameters = space.len(),
            conditions = space.conditions().len(),
            families = self.factories.len(),
            "built process configuration space"
        );
        Ok(space)
    }

    fn validate_factories(&self) -> Result<(), ConstructionError> {
        let mut seen = HashSet::new();
        for factory in &self.factories {
            let family = factory.family();
            Segment::family(family)
                .validate()
                .map_err(|e| ConstructionError::InvalidFamily {
                    family: family.to_string(),
                    reason: e.to_string(),
                })?;
            if !seen.insert(family) {
                return Err(ConstructionError::DuplicateFamily(family.to_string()));
            }
            factory
                .count()
                .validate_count(format_args!("family '{family}'"))?;
        }
        Ok(())
    }

    fn declare_family(
        &self,
        space: &mut ConfigurationSpace,
        p: usize,
        factory: &ProviderSpaceFactory,
    ) -> Result<(), SpaceError> {
        let family = factory.family();
        let count = factory.count();
        if count.max == 0 {
            return Ok(());
        }

        let count_path = layout::family_count(p, family);
        space.add(ParameterRange::integer(count_path.clone(), count))?;
        space.add_condition(Condition::index_below(
            count_path.clone(),
            layout::num_pools(),
            p,
        ))?;

        let builder = factory.builder();
        for i in 0..count.max_count() {
            let type_path = layout::provider_type(p, family, i);
            space.add(ParameterRange::constant(
                type_path.clone(),
                builder.provider_type(),
            ))?;
            space.add_condition(Condition::index_below(type_path, count_path.clone(), i))?;

            let prefix = layout::provider_config(p, family, i);
            let (parameters, conditions) = builder.declare(&prefix)?.into_parts();
            tracing::trace!(
                %prefix,
                parameters = parameters.len(),
                provider_type = builder.provider_type(),
                "declared provider instance"
            );

            for parameter in parameters {
                let path = parameter.path().clone();
                check_namespace(&prefix, &path)?;
                space.add(parameter)?;
                space.add_condition(Condition::index_below(path, count_path.clone(), i))?;
            }
            for condition in conditions {
                check_namespace(&prefix, condition.child())?;
                space.add_condition(condition)?;
            }
        }
        Ok(())
    }
}

fn check_namespace(prefix: &ParamPath, path: &ParamPath) -> Result<(), ConstructionError> {
    if prefix.is_prefix_of(path) && path != prefix {
        Ok(())
    } else {
        Err(ConstructionError::OutsideNamespace {
            path: path.clone(),
            prefix: prefix.clone(),
        })
    }
}
