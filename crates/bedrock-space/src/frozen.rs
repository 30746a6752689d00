//! Frozen, sampling-ready configuration spaces

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

use crate::condition::Condition;
use crate::config::SampledConfiguration;
use crate::error::ValidationError;
use crate::path::ParamPath;
use crate::range::{Domain, ParameterRange};
use crate::value::Value;

/// Immutable snapshot of a validated [`ConfigurationSpace`]
///
/// Parameters are stored parents-first, so a single forward pass decides
/// which conditional branches are reachable. There is no mutation API.
///
/// [`ConfigurationSpace`]: crate::ConfigurationSpace
#[derive(Debug, Clone)]
pub struct FrozenSpace {
    parameters: Vec<FrozenParameter>,
    index: HashMap<ParamPath, usize>,
}

#[derive(Debug, Clone)]
struct FrozenParameter {
    range: ParameterRange,
    default: Value,
    sampler: Sampler,
    guards: Vec<Guard>,
}

#[derive(Debug, Clone)]
struct Guard {
    parent: usize,
    condition: Condition,
}

#[derive(Debug, Clone)]
enum Sampler {
    Uniform { min: i64, max: i64 },
    Pick(Vec<Value>),
    Weighted(Vec<Value>, WeightedIndex<f64>),
    Fixed(Value),
}

impl Sampler {
    fn for_domain(path: &ParamPath, domain: &Domain) -> Result<Self, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidDomain {
            path: path.clone(),
            reason,
        };
        match domain {
            Domain::Integer(range) if range.min <= range.max => Ok(Self::Uniform {
                min: range.min,
                max: range.max,
            }),
            Domain::Integer(range) => Err(invalid(format!("empty range {range}"))),
            Domain::Categorical { choices, .. } if choices.is_empty() => {
                Err(invalid("no choices".into()))
            }
            Domain::Categorical {
                choices,
                weights: None,
            } => Ok(Self::Pick(choices.clone())),
            Domain::Categorical {
                choices,
                weights: Some(weights),
            } => {
                let index = WeightedIndex::new(weights.iter().copied())
                    .map_err(|e| invalid(e.to_string()))?;
                Ok(Self::Weighted(choices.clone(), index))
            }
            Domain::Constant(value) => Ok(Self::Fixed(value.clone())),
        }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        match self {
            Self::Uniform { min, max } => Value::Int(rng.random_range(*min..=*max)),
            Self::Pick(choices) => choices[rng.random_range(0..choices.len())].clone(),
            Self::Weighted(choices, index) => choices[index.sample(rng)].clone(),
            Self::Fixed(value) => value.clone(),
        }
    }
}

impl FrozenSpace {
    /// Build from parameters already sorted parents-first
    pub(crate) fn new(
        parameters: Vec<ParameterRange>,
        conditions: &[Condition],
    ) -> Result<Self, ValidationError> {
        let index: HashMap<ParamPath, usize> = parameters
            .iter()
            .enumerate()
            .map(|(i, p)| (p.path().clone(), i))
            .collect();

        let mut guards: Vec<Vec<Guard>> = vec![Vec::new(); parameters.len()];
        for condition in conditions {
            let child = index
                .get(condition.child())
                .copied()
                .ok_or_else(|| ValidationError::UnknownParameter(condition.child().clone()))?;
            let parent = index.get(condition.parent()).copied().ok_or_else(|| {
                ValidationError::UnknownParent {
                    child: condition.child().clone(),
                    parent: condition.parent().clone(),
                }
            })?;
            if parent >= child {
                return Err(ValidationError::CyclicCondition(condition.child().clone()));
            }
            guards[child].push(Guard {
                parent,
                condition: condition.clone(),
            });
        }

        let parameters = parameters
            .into_iter()
            .zip(guards)
            .map(|(range, guards)| {
                let default =
                    range
                        .default_value()
                        .ok_or_else(|| ValidationError::InvalidDomain {
                            path: range.path().clone(),
                            reason: "no default value".into(),
                        })?;
                let sampler = Sampler::for_domain(range.path(), range.domain())?;
                Ok(FrozenParameter {
                    range,
                    default,
                    sampler,
                    guards,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(Self { parameters, index })
    }

    /// Draw one configuration from `rng`
    ///
    /// Governing parameters are sampled before the parameters they guard;
    /// a parameter whose conditions do not all hold is skipped entirely,
    /// along with everything it governs. Calls share no state besides `rng`.
    #[must_use]
    pub fn sample_configuration<R: Rng + ?Sized>(&self, rng: &mut R) -> SampledConfiguration {
        let config = self.walk(|p| p.sampler.draw(&mut *rng));
        tracing::trace!(active = config.len(), "sampled configuration");
        config
    }

    /// Draw one configuration from the thread-local random source
    #[must_use]
    pub fn sample(&self) -> SampledConfiguration {
        self.sample_configuration(&mut rand::rng())
    }

    /// Configuration made of every active parameter's default
    #[must_use]
    pub fn default_configuration(&self) -> SampledConfiguration {
        self.walk(|p| p.default.clone())
    }

    fn walk(&self, mut pick: impl FnMut(&FrozenParameter) -> Value) -> SampledConfiguration {
        let mut values: Vec<Option<Value>> = Vec::with_capacity(self.parameters.len());
        for parameter in &self.parameters {
            let active = parameter.guards.iter().all(|g| {
                values
                    .get(g.parent)
                    .and_then(Option::as_ref)
                    .is_some_and(|v| g.condition.is_satisfied_by(v))
            });
            values.push(active.then(|| pick(parameter)));
        }

        self.parameters
            .iter()
            .zip(values)
            .filter_map(|(p, v)| v.map(|v| (p.range.path().clone(), v)))
            .collect()
    }

    /// Check that `config` is exactly a configuration of this space
    ///
    /// # Errors
    /// - [`ValidationError::UnexpectedValue`] for unknown or inactive keys
    /// - [`ValidationError::MissingValue`] for active keys without a value
    /// - [`ValidationError::OutOfDomain`] for values outside their domain
    pub fn check(&self, config: &SampledConfiguration) -> Result<(), ValidationError> {
        if let Some(unknown) = config.paths().find(|p| !self.index.contains_key(*p)) {
            return Err(ValidationError::UnexpectedValue(unknown.clone()));
        }

        for parameter in &self.parameters {
            let path = parameter.range.path();
            let active = parameter.guards.iter().all(|g| {
                config
                    .get(self.parameters[g.parent].range.path())
                    .is_some_and(|v| g.condition.is_satisfied_by(v))
            });
            match (active, config.get(path)) {
                (true, None) => return Err(ValidationError::MissingValue(path.clone())),
                (true, Some(value)) if !parameter.range.domain().contains(value) => {
                    return Err(ValidationError::OutOfDomain {
                        path: path.clone(),
                        value: value.clone(),
                    });
                }
                (false, Some(_)) => return Err(ValidationError::UnexpectedValue(path.clone())),
                _ => {}
            }
        }
        Ok(())
    }

    /// Number of parameters
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check if the space has no parameters
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Check if a parameter exists
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &ParamPath) -> bool {
        self.index.contains_key(path)
    }

    /// Get a parameter declaration
    #[inline]
    #[must_use]
    pub fn get(&self, path: &ParamPath) -> Option<&ParameterRange> {
        self.index.get(path).map(|&i| &self.parameters[i].range)
    }

    /// Parameters in sampling order (parents first)
    #[inline]
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterRange> {
        self.parameters.iter().map(|p| &p.range)
    }

    /// Conditions in sampling order of the parameters they guard
    #[inline]
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.parameters
            .iter()
            .flat_map(|p| p.guards.iter().map(|g| &g.condition))
    }
}

impl Display for FrozenSpace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration space object:")?;
        writeln!(f, "  Hyperparameters:")?;
        for parameter in self.parameters() {
            writeln!(f, "    {parameter}")?;
        }
        let mut conditions = self.conditions().peekable();
        if conditions.peek().is_some() {
            writeln!(f, "  Conditions:")?;
            for condition in conditions {
                writeln!(f, "    {condition}")?;
            }
        }
        Ok(())
    }
}
