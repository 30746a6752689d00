//! Bedrock process specifications
//!
//! Builds the configuration space of a process from pool ranges and provider
//! family bindings, and materializes sampled configurations back into nested
//! [`ProcSpec`] documents.
//!
//! # Core Concepts
//!
//! - [`ProviderSpaceBuilder`]: declares one provider type's parameters
//! - [`ProviderSpaceFactory`]: builder + family name + instance count range
//! - [`ProcSpaceBuilder`] / [`ProcSpec::space`]: the process space
//! - [`ProcSpec::from_config`]: flat configuration to nested specification
//! - [`SpaceConfig`] + [`BuilderRegistry`]: spaces declared in config files
//!
//! # Example
//!
//! ```rust
//! use bedrock_spec::{ProcSpec, ProviderSpaceFactory, StaticSpaceBuilder};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let db = StaticSpaceBuilder::new("yokan").with_choices("backend", ["map", "lmdb"]);
//! let factories = [ProviderSpaceFactory::new("db", db, (1, 2))];
//! let mut space = ProcSpec::space((1, 3), (2, 5), &factories).unwrap();
//! let frozen = space.freeze().unwrap();
//!
//! let config = frozen.sample_configuration(&mut StdRng::seed_from_u64(7));
//! let spec = ProcSpec::from_config("na+sm", &config).unwrap();
//! assert!((1..=3).contains(&spec.pools.len()));
//! ```

#![warn(unreachable_pub)]

mod builder;
mod config;
mod error;
pub mod layout;
mod provider;
mod registry;
mod spec;
mod static_builder;

pub use builder::ProcSpaceBuilder;
pub use config::{FamilyConfig, SpaceConfig};
pub use error::{ReconstructionError, SpecError};
pub use provider::{ProviderParameters, ProviderSpaceBuilder, ProviderSpaceFactory};
pub use registry::{BuilderConstructor, BuilderRegistry};
pub use spec::{PoolSpec, ProcSpec, ProviderSpec};
pub use static_builder::{StaticParameter, StaticSpaceBuilder};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
