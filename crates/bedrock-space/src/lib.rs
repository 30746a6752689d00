//! Bedrock configuration spaces
//!
//! Conditional parameter spaces with typed paths, frozen into immutable
//! sampling distributions.
//!
//! # Core Concepts
//!
//! - [`ParamPath`]: typed position of a parameter (pool, family, provider, key)
//! - [`ParameterRange`]: integer range, categorical choice or constant
//! - [`Condition`]: activation guard on a governing parameter
//! - [`ConfigurationSpace`]: mutable declarations, `freeze()` to validate
//! - [`FrozenSpace`]: read-only snapshot, `sample_configuration(rng)`
//! - [`SampledConfiguration`]: flat map of active parameter values
//!
//! # Example
//!
//! ```rust
//! use bedrock_space::{Condition, ConfigurationSpace, ParamPath, ParameterRange};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut space = ConfigurationSpace::new();
//! let tm = ParamPath::key("tm");
//! let buffers = ParamPath::key("num_buffers");
//! space.add(ParameterRange::categorical(tm.clone(), ["__default__", "pipeline"])).unwrap();
//! space.add(ParameterRange::integer(buffers.clone(), (1, 16))).unwrap();
//! space.add_condition(Condition::equals(buffers.clone(), tm, "pipeline")).unwrap();
//!
//! let frozen = space.freeze().unwrap();
//! let config = frozen.sample_configuration(&mut StdRng::seed_from_u64(1));
//! assert!(frozen.check(&config).is_ok());
//! ```

#![warn(unreachable_pub)]

// Core modules
mod condition;
mod config;
mod error;
mod frozen;
mod path;
mod range;
mod space;
mod value;

// Re-exports
pub use condition::Condition;
pub use config::SampledConfiguration;
pub use error::{ConstructionError, SpaceError, UsageError, ValidationError};
pub use frozen::FrozenSpace;
pub use path::{ParamPath, PathError, Segment};
pub use range::{Domain, IntRange, ParameterRange};
pub use space::ConfigurationSpace;
pub use value::Value;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and sampling spaces
    pub use crate::{
        Condition, ConfigurationSpace, FrozenSpace, IntRange, ParamPath, ParameterRange,
        SampledConfiguration, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
