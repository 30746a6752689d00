//! Parameter declarations
//!
//! A [`ParameterRange`] names a sampleable value and its legal [`Domain`]:
//! an inclusive integer range, a categorical choice set, or a constant.

use std::fmt::{self, Display, Formatter};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ConstructionError;
use crate::path::ParamPath;
use crate::value::Value;

/// Inclusive integer range
///
/// Deserializes from either a single integer (a fixed value) or a
/// `[min, max]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "IntRangeRepr", into = "IntRangeRepr")]
pub struct IntRange {
    /// Lower bound, inclusive
    pub min: i64,
    /// Upper bound, inclusive
    pub max: i64,
}

impl IntRange {
    /// Create range `[min, max]`
    #[inline]
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Range holding a single value
    #[inline]
    #[must_use]
    pub const fn fixed(value: i64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Check if range holds a single value
    #[inline]
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Check if value lies within the inclusive bounds
    #[inline]
    #[must_use]
    pub const fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Reject `min > max`
    ///
    /// # Errors
    /// Returns [`ConstructionError::InvalidRange`] naming `what`
    pub fn validate(&self, what: impl Display) -> Result<(), ConstructionError> {
        if self.min > self.max {
            return Err(ConstructionError::InvalidRange {
                what: what.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Reject ranges that are inverted or start below zero
    ///
    /// # Errors
    /// [`ConstructionError::InvalidRange`] or [`ConstructionError::NegativeCount`]
    pub fn validate_count(&self, what: impl Display) -> Result<(), ConstructionError> {
        let what = what.to_string();
        self.validate(&what)?;
        if self.min < 0 {
            return Err(ConstructionError::NegativeCount {
                what,
                min: self.min,
            });
        }
        Ok(())
    }

    /// Number of indices `0..max` a count parameter can activate
    ///
    /// Negative upper bounds activate nothing.
    #[inline]
    #[must_use]
    pub fn max_count(&self) -> usize {
        usize::try_from(self.max).unwrap_or(0)
    }
}

impl From<(i64, i64)> for IntRange {
    fn from((min, max): (i64, i64)) -> Self {
        Self::new(min, max)
    }
}

impl From<i64> for IntRange {
    fn from(value: i64) -> Self {
        Self::fixed(value)
    }
}

impl From<RangeInclusive<i64>> for IntRange {
    fn from(range: RangeInclusive<i64>) -> Self {
        Self::new(*range.start(), *range.end())
    }
}

impl Display for IntRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum IntRangeRepr {
    Fixed(i64),
    Pair(i64, i64),
}

impl From<IntRangeRepr> for IntRange {
    fn from(repr: IntRangeRepr) -> Self {
        match repr {
            IntRangeRepr::Fixed(v) => Self::fixed(v),
            IntRangeRepr::Pair(min, max) => Self::new(min, max),
        }
    }
}

impl From<IntRange> for IntRangeRepr {
    fn from(range: IntRange) -> Self {
        if range.is_fixed() {
            Self::Fixed(range.min)
        } else {
            Self::Pair(range.min, range.max)
        }
    }
}

/// Legal values of a parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    /// Uniform integer over an inclusive range
    Integer(IntRange),
    /// One of an enumerated set, uniform unless weighted
    Categorical {
        /// Enumerated choices, in declaration order
        choices: Vec<Value>,
        /// Relative weights, one per choice
        weights: Option<Vec<f64>>,
    },
    /// Fixed value
    Constant(Value),
}

impl Domain {
    /// Check if a value belongs to the domain
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        match self {
            Self::Integer(range) => value.as_int().is_some_and(|v| range.contains(v)),
            Self::Categorical { choices, .. } => choices.contains(value),
            Self::Constant(c) => c == value,
        }
    }

    /// Default used when none is declared
    #[must_use]
    pub fn derived_default(&self) -> Option<Value> {
        match self {
            Self::Integer(range) => Some(Value::Int(range.min)),
            Self::Categorical { choices, .. } => choices.first().cloned(),
            Self::Constant(c) => Some(c.clone()),
        }
    }

    /// Short type name used when printing a space
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "UniformInteger",
            Self::Categorical { weights: None, .. } => "Categorical",
            Self::Categorical { weights: Some(_), .. } => "WeightedCategorical",
            Self::Constant(_) => "Constant",
        }
    }

    fn validate(&self, path: &ParamPath) -> Result<(), ConstructionError> {
        match self {
            Self::Integer(range) => range.validate(format!("'{path}'")),
            Self::Categorical { choices, weights } => {
                if choices.is_empty() {
                    return Err(ConstructionError::EmptyChoices(path.clone()));
                }
                let Some(weights) = weights else {
                    return Ok(());
                };
                let invalid = |reason: String| ConstructionError::InvalidWeights {
                    path: path.clone(),
                    reason,
                };
                if weights.len() != choices.len() {
                    return Err(invalid(format!(
                        "{} weights for {} choices",
                        weights.len(),
                        choices.len()
                    )));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(invalid("weights must be finite and non-negative".into()));
                }
                if weights.iter().sum::<f64>() <= 0.0 {
                    return Err(invalid("weights sum to zero".into()));
                }
                Ok(())
            }
            Self::Constant(_) => Ok(()),
        }
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(range) => write!(f, "Range: {range}"),
            Self::Categorical { choices, weights } => {
                let rendered: Vec<String> = choices.iter().map(ToString::to_string).collect();
                write!(f, "Choices: {{{}}}", rendered.join(", "))?;
                if let Some(weights) = weights {
                    write!(f, ", Weights: {weights:?}")?;
                }
                Ok(())
            }
            Self::Constant(value) => write!(f, "Value: {value}"),
        }
    }
}

/// Declaration of one sampleable parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRange {
    path: ParamPath,
    domain: Domain,
    default: Option<Value>,
}

impl ParameterRange {
    /// Uniform integer over `range`, defaulting to its minimum
    #[must_use]
    pub fn integer(path: ParamPath, range: impl Into<IntRange>) -> Self {
        Self::with_domain(path, Domain::Integer(range.into()))
    }

    /// Uniform choice over `choices`, defaulting to the first one
    #[must_use]
    pub fn categorical<V: Into<Value>>(
        path: ParamPath,
        choices: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::with_domain(
            path,
            Domain::Categorical {
                choices: choices.into_iter().map(Into::into).collect(),
                weights: None,
            },
        )
    }

    /// Weighted choice over `(choice, weight)` pairs
    #[must_use]
    pub fn weighted<V: Into<Value>>(
        path: ParamPath,
        choices: impl IntoIterator<Item = (V, f64)>,
    ) -> Self {
        let (choices, weights): (Vec<Value>, Vec<f64>) = choices
            .into_iter()
            .map(|(c, w)| (c.into(), w))
            .unzip();
        Self::with_domain(
            path,
            Domain::Categorical {
                choices,
                weights: Some(weights),
            },
        )
    }

    /// Fixed value
    #[must_use]
    pub fn constant(path: ParamPath, value: impl Into<Value>) -> Self {
        Self::with_domain(path, Domain::Constant(value.into()))
    }

    /// Integer range, collapsed to a constant when it holds a single value
    #[must_use]
    pub fn integer_or_constant(path: ParamPath, range: impl Into<IntRange>) -> Self {
        let range = range.into();
        if range.is_fixed() {
            Self::constant(path, range.min)
        } else {
            Self::integer(path, range)
        }
    }

    /// Categorical, collapsed to a constant when there is a single choice
    #[must_use]
    pub fn categorical_or_constant<V: Into<Value>>(
        path: ParamPath,
        choices: impl IntoIterator<Item = V>,
    ) -> Self {
        let mut choices: Vec<Value> = choices.into_iter().map(Into::into).collect();
        if choices.len() == 1 {
            Self::constant(path, choices.remove(0))
        } else {
            Self::categorical(path, choices)
        }
    }

    /// Parameter with an arbitrary domain
    #[inline]
    #[must_use]
    pub fn with_domain(path: ParamPath, domain: Domain) -> Self {
        Self {
            path,
            domain,
            default: None,
        }
    }

    /// Override the default value
    #[inline]
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Get path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &ParamPath {
        &self.path
    }

    /// Get domain
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Explicit default, or the one derived from the domain
    #[must_use]
    pub fn default_value(&self) -> Option<Value> {
        self.default
            .clone()
            .or_else(|| self.domain.derived_default())
    }

    /// Check path, domain and default
    ///
    /// # Errors
    /// Returns the first [`ConstructionError`] found
    pub fn validate(&self) -> Result<(), ConstructionError> {
        self.path.validate()?;
        self.domain.validate(&self.path)?;
        if let Some(default) = &self.default {
            if !self.domain.contains(default) {
                return Err(ConstructionError::DefaultOutOfDomain {
                    path: self.path.clone(),
                    default: default.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Display for ParameterRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, Type: {}, {}",
            self.path,
            self.domain.type_name(),
            self.domain
        )?;
        if let Some(default) = self.default_value() {
            write!(f, ", Default: {default}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_range_validate() {
        assert!(IntRange::new(1, 3).validate("num_pools").is_ok());
        assert!(IntRange::fixed(0).validate("count").is_ok());
        assert!(matches!(
            IntRange::new(4, 2).validate("num_pools"),
            Err(ConstructionError::InvalidRange { min: 4, max: 2, .. })
        ));
    }

    #[test]
    fn int_range_serde_accepts_scalar_or_pair() {
        let fixed: IntRange = serde_json::from_str("8").unwrap();
        assert_eq!(fixed, IntRange::fixed(8));
        let pair: IntRange = serde_json::from_str("[2, 5]").unwrap();
        assert_eq!(pair, IntRange::new(2, 5));
        assert_eq!(serde_json::to_string(&pair).unwrap(), "[2,5]");
        assert_eq!(serde_json::to_string(&fixed).unwrap(), "8");
    }

    #[test]
    fn count_ranges_must_be_non_negative() {
        assert!(IntRange::new(0, 0).validate_count("count").is_ok());
        assert!(matches!(
            IntRange::new(-1, 2).validate_count("count"),
            Err(ConstructionError::NegativeCount { min: -1, .. })
        ));
    }

    #[test]
    fn max_count_clamps_negative() {
        assert_eq!(IntRange::new(1, 3).max_count(), 3);
        assert_eq!(IntRange::new(-2, -1).max_count(), 0);
    }

    #[test]
    fn defaults_derive_from_domain() {
        let p = ParameterRange::integer(ParamPath::key("n"), (2, 5));
        assert_eq!(p.default_value(), Some(Value::Int(2)));

        let p = ParameterRange::categorical(ParamPath::key("t"), ["memory", "pmdk"]);
        assert_eq!(p.default_value(), Some(Value::from("memory")));

        let p = p.with_default("pmdk");
        assert_eq!(p.default_value(), Some(Value::from("pmdk")));
    }

    #[test]
    fn validate_rejects_default_outside_domain() {
        let p = ParameterRange::integer(ParamPath::key("n"), (2, 5)).with_default(9);
        assert!(matches!(
            p.validate(),
            Err(ConstructionError::DefaultOutOfDomain { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_choices() {
        let p = ParameterRange::categorical(ParamPath::key("t"), Vec::<Value>::new());
        assert!(matches!(p.validate(), Err(ConstructionError::EmptyChoices(_))));
    }

    #[test]
    fn validate_rejects_bad_weights() {
        let p = ParameterRange::weighted(ParamPath::key("t"), [("a", 0.0), ("b", 0.0)]);
        assert!(matches!(
            p.validate(),
            Err(ConstructionError::InvalidWeights { .. })
        ));

        let p = ParameterRange::weighted(ParamPath::key("t"), [("a", -1.0), ("b", 2.0)]);
        assert!(matches!(
            p.validate(),
            Err(ConstructionError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn or_constant_collapses_single_values() {
        let p = ParameterRange::integer_or_constant(ParamPath::key("n"), 8);
        assert_eq!(p.domain(), &Domain::Constant(Value::Int(8)));

        let p = ParameterRange::categorical_or_constant(ParamPath::key("t"), ["pmdk"]);
        assert_eq!(p.domain(), &Domain::Constant(Value::from("pmdk")));

        let p = ParameterRange::integer_or_constant(ParamPath::key("n"), (1, 4));
        assert_eq!(p.domain(), &Domain::Integer(IntRange::new(1, 4)));
    }

    #[test]
    fn display_lists_type_and_default() {
        let p = ParameterRange::integer(ParamPath::key("num_pools"), (1, 3));
        assert_eq!(
            p.to_string(),
            "num_pools, Type: UniformInteger, Range: [1, 3], Default: 1"
        );
    }
}
