//! Warabi storage providers for Bedrock process spaces
//!
//! [`WarabiSpaceBuilder`] declares the backend, target path, and transfer
//! manager parameters of a Warabi provider, and resolves sampled values into
//! the `target`/`transfer_manager` document Warabi expects.
//!
//! # Example
//!
//! ```rust
//! use bedrock_spec::{ProcSpec, ProviderSpaceFactory};
//! use bedrock_warabi::{WarabiOptions, WarabiSpaceBuilder};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let builder = WarabiSpaceBuilder::new(WarabiOptions::default()).unwrap();
//! let factories = [ProviderSpaceFactory::new("storage", builder, (1, 3))];
//! let frozen = ProcSpec::space((1, 3), (2, 5), &factories)
//!     .unwrap()
//!     .freeze()
//!     .unwrap();
//!
//! let config = frozen.sample_configuration(&mut StdRng::seed_from_u64(42));
//! let spec = ProcSpec::from_config_with("na+sm", &config, &factories).unwrap();
//! println!("{}", spec.to_json(4).unwrap());
//! ```

#![warn(unreachable_pub)]

mod builder;
mod options;

pub use builder::{register, WarabiSpaceBuilder, PROVIDER_TYPE};
pub use options::{Backend, PipelineOptions, TransferManager, WarabiOptions, DEFAULT_INITIAL_SIZE};
