//! Testing utilities for the Bedrock space workspace
//!
//! Shared fixtures: seeded random sources, provider factories, and space
//! config files.

#![allow(missing_docs)]

use std::io::Write;

use bedrock_space::{FrozenSpace, ParamPath, SampledConfiguration, Value};
use bedrock_spec::{BuilderRegistry, ProcSpec, ProviderSpaceFactory, StaticSpaceBuilder};
use bedrock_warabi::{WarabiOptions, WarabiSpaceBuilder};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::NamedTempFile;

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn registry() -> BuilderRegistry {
    let mut registry = BuilderRegistry::with_defaults();
    bedrock_warabi::register(&mut registry);
    registry
}

pub fn warabi_factory(count: (i64, i64)) -> ProviderSpaceFactory {
    warabi_factory_with(WarabiOptions::default(), count)
}

pub fn warabi_factory_with(options: WarabiOptions, count: (i64, i64)) -> ProviderSpaceFactory {
    let builder = WarabiSpaceBuilder::new(options).unwrap();
    ProviderSpaceFactory::new("storage", builder, count)
}

pub fn kv_builder() -> StaticSpaceBuilder {
    StaticSpaceBuilder::new("yokan")
        .with_choices("backend", ["map", "lmdb", "rocksdb"])
        .with_integer("cache_size", (1, 64))
}

pub fn kv_factory(count: (i64, i64)) -> ProviderSpaceFactory {
    ProviderSpaceFactory::new("db", kv_builder(), count)
}

/// `num_pools ∈ [1, 3]`, `num_xstreams ∈ [2, 5]`, storage `count ∈ [1, 3]`
pub fn warabi_scenario() -> (FrozenSpace, Vec<ProviderSpaceFactory>) {
    let factories = vec![warabi_factory((1, 3))];
    let space = ProcSpec::space((1, 3), (2, 5), &factories)
        .unwrap()
        .freeze()
        .unwrap();
    (space, factories)
}

pub fn config_from(entries: &[(&str, Value)]) -> SampledConfiguration {
    entries
        .iter()
        .map(|(path, value)| (path.parse::<ParamPath>().unwrap(), value.clone()))
        .collect()
}

/// Write `contents` to a temp file ending in `.{extension}`
pub fn config_file(extension: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(&format!(".{extension}"))
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub const WARABI_TOML: &str = r#"
num_pools = [1, 3]
num_xstreams = [2, 5]

[[families]]
family = "storage"
type = "warabi"
count = [1, 3]

[[families]]
family = "db"
type = "static"
count = [0, 2]

[families.options]
provider_type = "yokan"
parameters = { backend = ["map", "lmdb"], cache_size = [1, 64] }
"#;
