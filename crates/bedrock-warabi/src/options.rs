//! Warabi builder options

use bedrock_space::IntRange;
use serde::{Deserialize, Serialize};

/// Default size of a freshly created pmdk target, in bytes
pub const DEFAULT_INITIAL_SIZE: i64 = 10_485_760;

/// Storage backend of a Warabi target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Volatile in-memory target
    Memory,
    /// File-backed target through ABT-IO
    Abtio,
    /// Persistent-memory pool
    Pmdk,
}

impl Backend {
    /// Every backend, in declaration order
    pub const ALL: [Self; 3] = [Self::Memory, Self::Abtio, Self::Pmdk];

    /// Name used in configurations
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Abtio => "abtio",
            Self::Pmdk => "pmdk",
        }
    }

    /// Check if data survives a restart
    #[inline]
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        !matches!(self, Self::Memory)
    }

    /// Look up a backend by name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

/// Bulk transfer strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferManager {
    /// Direct RDMA into the target
    #[serde(rename = "__default__")]
    Default,
    /// Staged through a pool of intermediate buffers
    #[serde(rename = "pipeline")]
    Pipeline,
}

impl TransferManager {
    /// Name used in configurations
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "__default__",
            Self::Pipeline => "pipeline",
        }
    }
}

/// Ranges of the pipeline transfer manager's settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOptions {
    /// Buffer pools
    pub num_pools: IntRange,
    /// Buffers in each pool
    pub num_buffers_per_pool: IntRange,
    /// Size of the smallest buffer, in bytes
    pub first_buffer_size: IntRange,
    /// Growth factor between consecutive pools
    pub buffer_size_multiplier: IntRange,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            num_pools: IntRange::fixed(1),
            num_buffers_per_pool: IntRange::fixed(8),
            first_buffer_size: IntRange::fixed(1024),
            buffer_size_multiplier: IntRange::fixed(2),
        }
    }
}

impl PipelineOptions {
    /// Settings as `(key, range)` pairs, in declaration order
    #[must_use]
    pub fn ranges(&self) -> [(&'static str, IntRange); 4] {
        [
            ("num_pools", self.num_pools),
            ("num_buffers_per_pool", self.num_buffers_per_pool),
            ("first_buffer_size", self.first_buffer_size),
            ("buffer_size_multiplier", self.buffer_size_multiplier),
        ]
    }
}

/// Options of a [`WarabiSpaceBuilder`](crate::WarabiSpaceBuilder)
///
/// Every field is optional in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WarabiOptions {
    /// Backends to choose from
    pub types: Vec<Backend>,
    /// Target paths persistent backends choose from
    pub paths: Vec<String>,
    /// Size of newly created pmdk targets; required when pmdk is offered
    pub initial_size: Option<i64>,
    /// Restrict to persistent backends
    pub need_persistence: bool,
    /// Transfer managers to choose from
    pub transfer_managers: Vec<TransferManager>,
    /// Pipeline transfer manager ranges
    pub pipeline: PipelineOptions,
    /// Tags attached to every provider
    pub tags: Vec<String>,
}

impl Default for WarabiOptions {
    fn default() -> Self {
        Self {
            types: Backend::ALL.to_vec(),
            paths: Vec::new(),
            initial_size: Some(DEFAULT_INITIAL_SIZE),
            need_persistence: false,
            transfer_managers: vec![TransferManager::Default, TransferManager::Pipeline],
            pipeline: PipelineOptions::default(),
            tags: Vec::new(),
        }
    }
}

impl WarabiOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set offered backends
    #[must_use]
    pub fn with_types(mut self, types: impl IntoIterator<Item = Backend>) -> Self {
        self.types = types.into_iter().collect();
        self
    }

    /// Set target paths
    #[must_use]
    pub fn with_paths<S: Into<String>>(mut self, paths: impl IntoIterator<Item = S>) -> Self {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set or clear the pmdk initial size
    #[must_use]
    pub fn with_initial_size(mut self, size: Option<i64>) -> Self {
        self.initial_size = size;
        self
    }

    /// Restrict to persistent backends
    #[must_use]
    pub fn with_need_persistence(mut self, need: bool) -> Self {
        self.need_persistence = need;
        self
    }

    /// Set offered transfer managers
    #[must_use]
    pub fn with_transfer_managers(
        mut self,
        managers: impl IntoIterator<Item = TransferManager>,
    ) -> Self {
        self.transfer_managers = managers.into_iter().collect();
        self
    }

    /// Set pipeline ranges
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: PipelineOptions) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Set provider tags
    #[must_use]
    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_gives_defaults() {
        let options: WarabiOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, WarabiOptions::default());
        assert_eq!(options.initial_size, Some(10_485_760));
    }

    #[test]
    fn parses_names_and_ranges() {
        let options: WarabiOptions = serde_json::from_value(serde_json::json!({
            "types": ["memory", "pmdk"],
            "transfer_managers": ["pipeline"],
            "pipeline": {"num_pools": [1, 4], "first_buffer_size": 4096},
        }))
        .unwrap();
        assert_eq!(options.types, vec![Backend::Memory, Backend::Pmdk]);
        assert_eq!(options.transfer_managers, vec![TransferManager::Pipeline]);
        assert_eq!(options.pipeline.num_pools, IntRange::new(1, 4));
        assert_eq!(options.pipeline.first_buffer_size, IntRange::fixed(4096));
        assert_eq!(options.pipeline.num_buffers_per_pool, IntRange::fixed(8));
    }

    #[test]
    fn rejects_unknown_backend() {
        let result: Result<WarabiOptions, _> =
            serde_json::from_value(serde_json::json!({"types": ["rocksdb"]}));
        assert!(result.is_err());
    }

    #[test]
    fn backend_names() {
        assert_eq!(Backend::from_name("abtio"), Some(Backend::Abtio));
        assert_eq!(Backend::from_name("lmdb"), None);
        assert!(!Backend::Memory.is_persistent());
        assert!(Backend::Pmdk.is_persistent());
    }
}
