//! Activation conditions
//!
//! A [`Condition`] makes a child parameter active only when its governing
//! parent holds a matching value. A child with several conditions is active
//! only when all of them hold.

use std::fmt::{self, Display, Formatter};

use crate::error::ValidationError;
use crate::path::ParamPath;
use crate::range::Domain;
use crate::value::Value;

/// Guard predicate on a governing parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Active iff `parent > than`, e.g. instance index below a sampled count
    Greater {
        child: ParamPath,
        parent: ParamPath,
        than: i64,
    },
    /// Active iff `parent == value`
    Equals {
        child: ParamPath,
        parent: ParamPath,
        value: Value,
    },
    /// Active iff `parent` is one of `values`
    In {
        child: ParamPath,
        parent: ParamPath,
        values: Vec<Value>,
    },
}

impl Condition {
    /// `child` is active iff `parent > than`
    #[inline]
    #[must_use]
    pub fn greater(child: ParamPath, parent: ParamPath, than: i64) -> Self {
        Self::Greater {
            child,
            parent,
            than,
        }
    }

    /// `child` is active iff `parent` holds a count above `index`
    #[must_use]
    pub fn index_below(child: ParamPath, count: ParamPath, index: usize) -> Self {
        Self::greater(child, count, i64::try_from(index).unwrap_or(i64::MAX))
    }

    /// `child` is active iff `parent == value`
    #[inline]
    #[must_use]
    pub fn equals(child: ParamPath, parent: ParamPath, value: impl Into<Value>) -> Self {
        Self::Equals {
            child,
            parent,
            value: value.into(),
        }
    }

    /// `child` is active iff `parent` is one of `values`
    #[inline]
    #[must_use]
    pub fn one_of<V: Into<Value>>(
        child: ParamPath,
        parent: ParamPath,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In {
            child,
            parent,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Get guarded parameter
    #[inline]
    #[must_use]
    pub fn child(&self) -> &ParamPath {
        match self {
            Self::Greater { child, .. } | Self::Equals { child, .. } | Self::In { child, .. } => {
                child
            }
        }
    }

    /// Get governing parameter
    #[inline]
    #[must_use]
    pub fn parent(&self) -> &ParamPath {
        match self {
            Self::Greater { parent, .. }
            | Self::Equals { parent, .. }
            | Self::In { parent, .. } => parent,
        }
    }

    /// Evaluate against the governing parameter's value
    #[must_use]
    pub fn is_satisfied_by(&self, parent_value: &Value) -> bool {
        match self {
            Self::Greater { than, .. } => parent_value.as_int().is_some_and(|v| v > *than),
            Self::Equals { value, .. } => parent_value == value,
            Self::In { values, .. } => values.contains(parent_value),
        }
    }

    /// Check that some value of `parent_domain` satisfies the condition
    ///
    /// # Errors
    /// - [`ValidationError::IncompatibleCondition`] for an ordering test on a
    ///   non-integer domain
    /// - [`ValidationError::Unreachable`] if no value of the domain satisfies it
    pub fn check_reachable(&self, parent_domain: &Domain) -> Result<(), ValidationError> {
        let reachable = match (self, parent_domain) {
            (Self::Greater { than, .. }, Domain::Integer(range)) => range.max > *than,
            (Self::Greater { .. }, Domain::Categorical { choices, .. })
                if choices.iter().all(|c| c.as_int().is_some()) =>
            {
                choices.iter().any(|c| self.is_satisfied_by(c))
            }
            (Self::Greater { .. }, Domain::Constant(Value::Int(_))) => {
                parent_domain.derived_default().is_some_and(|v| self.is_satisfied_by(&v))
            }
            (Self::Greater { .. }, _) => {
                return Err(ValidationError::IncompatibleCondition {
                    child: self.child().clone(),
                    parent: self.parent().clone(),
                    reason: format!("ordering test on {} domain", parent_domain.type_name()),
                });
            }
            (Self::Equals { value, .. }, domain) => domain.contains(value),
            (Self::In { values, .. }, domain) => values.iter().any(|v| domain.contains(v)),
        };

        if reachable {
            Ok(())
        } else {
            Err(ValidationError::Unreachable {
                child: self.child().clone(),
                condition: self.to_string(),
            })
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greater {
                child,
                parent,
                than,
            } => write!(f, "{child} | {parent} > {than}"),
            Self::Equals {
                child,
                parent,
                value,
            } => write!(f, "{child} | {parent} == {value}"),
            Self::In {
                child,
                parent,
                values,
            } => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{child} | {parent} in {{{}}}", rendered.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::IntRange;

    fn count() -> ParamPath {
        ParamPath::key("count")
    }

    #[test]
    fn index_below_holds_for_larger_counts() {
        let c = Condition::index_below(ParamPath::key("x"), count(), 1);
        assert!(!c.is_satisfied_by(&Value::Int(1)));
        assert!(c.is_satisfied_by(&Value::Int(2)));
        assert!(!c.is_satisfied_by(&Value::from("2")));
    }

    #[test]
    fn greater_unreachable_beyond_range() {
        let c = Condition::greater(ParamPath::key("x"), count(), 3);
        let result = c.check_reachable(&Domain::Integer(IntRange::new(0, 2)));
        assert!(matches!(result, Err(ValidationError::Unreachable { .. })));
        assert!(c
            .check_reachable(&Domain::Integer(IntRange::new(0, 4)))
            .is_ok());
    }

    #[test]
    fn greater_on_strings_is_incompatible() {
        let c = Condition::greater(ParamPath::key("x"), ParamPath::key("type"), 0);
        let domain = Domain::Categorical {
            choices: vec!["memory".into()],
            weights: None,
        };
        assert!(matches!(
            c.check_reachable(&domain),
            Err(ValidationError::IncompatibleCondition { .. })
        ));
    }

    #[test]
    fn equals_requires_value_in_domain() {
        let domain = Domain::Categorical {
            choices: vec!["__default__".into(), "pipeline".into()],
            weights: None,
        };
        let ok = Condition::equals(ParamPath::key("x"), ParamPath::key("tm"), "pipeline");
        let bad = Condition::equals(ParamPath::key("x"), ParamPath::key("tm"), "bulk");
        assert!(ok.check_reachable(&domain).is_ok());
        assert!(matches!(
            bad.check_reachable(&domain),
            Err(ValidationError::Unreachable { .. })
        ));
    }

    #[test]
    fn display_reads_like_a_guard() {
        let c = Condition::one_of(ParamPath::key("path"), ParamPath::key("type"), ["abtio", "pmdk"]);
        assert_eq!(c.to_string(), "path | type in {'abtio', 'pmdk'}");
    }
}
