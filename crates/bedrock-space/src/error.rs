//! Error types for configuration spaces
//!
//! - [`ConstructionError`]: bad declarations while building a space
//! - [`ValidationError`]: inconsistent conditional graph at freeze time, or
//!   a configuration that does not fit a frozen space
//! - [`UsageError`]: mutation of an already-frozen space

use crate::path::{ParamPath, PathError};
use crate::value::Value;

/// Errors raised while declaring parameters
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstructionError {
    /// Two parameters resolve to the same path
    #[error("duplicate parameter '{0}'")]
    DuplicateParameter(ParamPath),

    /// Inclusive range with `min > max`
    #[error("invalid range for {what}: min {min} > max {max}")]
    InvalidRange { what: String, min: i64, max: i64 },

    /// Count range admitting negative cardinalities
    #[error("count range for {what} starts below zero: {min}")]
    NegativeCount { what: String, min: i64 },

    /// Categorical parameter without choices
    #[error("parameter '{0}' has no choices")]
    EmptyChoices(ParamPath),

    /// Weights that cannot form a distribution
    #[error("invalid weights for '{path}': {reason}")]
    InvalidWeights { path: ParamPath, reason: String },

    /// Explicit default outside the declared domain
    #[error("default {default} of '{path}' is outside its domain")]
    DefaultOutOfDomain { path: ParamPath, default: Value },

    /// Malformed parameter path
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// Provider family binding that cannot be namespaced
    #[error("invalid provider family '{family}': {reason}")]
    InvalidFamily { family: String, reason: String },

    /// Same family bound twice
    #[error("provider family '{0}' is bound more than once")]
    DuplicateFamily(String),

    /// Builder declared a parameter outside the prefix it was given
    #[error("parameter '{path}' is outside namespace '{prefix}'")]
    OutsideNamespace { path: ParamPath, prefix: ParamPath },

    /// Provider builder rejected its own options
    #[error("provider builder for '{family}' failed: {reason}")]
    Builder { family: String, reason: String },
}

/// Errors raised by `freeze()` and configuration checks
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Condition guards a parameter that does not exist
    #[error("condition targets unknown parameter '{0}'")]
    UnknownParameter(ParamPath),

    /// Condition references a governing parameter that does not exist
    #[error("condition on '{child}' references unknown parameter '{parent}'")]
    UnknownParent { child: ParamPath, parent: ParamPath },

    /// Condition can never hold given the governing parameter's domain
    #[error("condition '{condition}' can never hold")]
    Unreachable { child: ParamPath, condition: String },

    /// Condition kind does not apply to the governing parameter's domain
    #[error("condition on '{child}' is incompatible with '{parent}': {reason}")]
    IncompatibleCondition {
        child: ParamPath,
        parent: ParamPath,
        reason: String,
    },

    /// Conditions depend on each other in a loop
    #[error("cyclic condition through '{0}'")]
    CyclicCondition(ParamPath),

    /// Domain that cannot be sampled
    #[error("invalid domain for '{path}': {reason}")]
    InvalidDomain { path: ParamPath, reason: String },

    /// Active parameter without a value
    #[error("active parameter '{0}' has no value")]
    MissingValue(ParamPath),

    /// Value for an inactive or unknown parameter
    #[error("unexpected value for '{0}'")]
    UnexpectedValue(ParamPath),

    /// Value outside the declared domain
    #[error("value {value} of '{path}' is outside its domain")]
    OutOfDomain { path: ParamPath, value: Value },
}

/// Misuse of the space lifecycle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    /// Mutation attempted after `freeze()`
    #[error("cannot {operation}: configuration space is frozen")]
    AlreadyFrozen { operation: &'static str },
}

/// Any error raised by a [`ConfigurationSpace`](crate::ConfigurationSpace)
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpaceError {
    /// Declaration error
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// Freeze-time validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Lifecycle misuse
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl SpaceError {
    /// Check if error is a programming error rather than a bad declaration
    #[inline]
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

impl From<PathError> for SpaceError {
    fn from(e: PathError) -> Self {
        Self::Construction(ConstructionError::InvalidPath(e))
    }
}
