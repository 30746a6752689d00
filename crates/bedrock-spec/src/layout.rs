//! Parameter layout of a process configuration space
//!
//! ```text
//! num_pools
//! pool[p].num_xstreams                          num_pools > p
//! pool[p].family[f].count                       num_pools > p
//! pool[p].family[f].provider[i].type            count > i
//! pool[p].family[f].provider[i].config.<...>    count > i
//! ```
//!
//! Both the space builder and the materializer go through these helpers, so
//! the two always agree on where a value lives.

use bedrock_space::ParamPath;

/// Key holding the number of pools
pub const NUM_POOLS: &str = "num_pools";
/// Key holding a pool's execution stream count
pub const NUM_XSTREAMS: &str = "num_xstreams";
/// Key holding a family's instance count within a pool
pub const COUNT: &str = "count";
/// Key holding a provider instance's type
pub const TYPE: &str = "type";
/// Key under which a builder declares its parameters
pub const CONFIG: &str = "config";

/// `num_pools`
#[must_use]
pub fn num_pools() -> ParamPath {
    ParamPath::key(NUM_POOLS)
}

/// `pool[p]`
#[must_use]
pub fn pool(p: usize) -> ParamPath {
    ParamPath::root().with_pool(p)
}

/// `pool[p].num_xstreams`
#[must_use]
pub fn num_xstreams(p: usize) -> ParamPath {
    pool(p).with_key(NUM_XSTREAMS)
}

/// `pool[p].family[f].count`
#[must_use]
pub fn family_count(p: usize, family: &str) -> ParamPath {
    pool(p).with_family(family).with_key(COUNT)
}

/// `pool[p].family[f].provider[i]`
#[must_use]
pub fn provider(p: usize, family: &str, i: usize) -> ParamPath {
    pool(p).with_family(family).with_provider(i)
}

/// `pool[p].family[f].provider[i].type`
#[must_use]
pub fn provider_type(p: usize, family: &str, i: usize) -> ParamPath {
    provider(p, family, i).with_key(TYPE)
}

/// `pool[p].family[f].provider[i].config`
#[must_use]
pub fn provider_config(p: usize, family: &str, i: usize) -> ParamPath {
    provider(p, family, i).with_key(CONFIG)
}
