//! Error types for process specifications

use std::path::PathBuf;

use bedrock_space::{ConstructionError, ParamPath, SpaceError, ValidationError, Value};

/// Errors raised while rebuilding a [`ProcSpec`](crate::ProcSpec) from a
/// flat configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReconstructionError {
    /// Expected key absent from the configuration
    #[error("missing key '{0}'")]
    MissingKey(ParamPath),

    /// Key present with a value of the wrong kind
    #[error("key '{path}' holds {found}, expected {expected}")]
    WrongType {
        path: ParamPath,
        expected: &'static str,
        found: Value,
    },

    /// Count or size that cannot index anything
    #[error("key '{path}' holds invalid count {value}")]
    InvalidCount { path: ParamPath, value: i64 },

    /// A key is both a leaf and the parent of other keys
    #[error("conflicting keys under '{0}'")]
    ConflictingKeys(ParamPath),

    /// Provider builder could not shape its parameters
    #[error("cannot resolve provider parameters under '{prefix}': {reason}")]
    Resolve { prefix: ParamPath, reason: String },
}

/// Any error raised by this crate
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// Space construction, validation or lifecycle error
    #[error(transparent)]
    Space(#[from] SpaceError),

    /// Flat configuration does not describe a process
    #[error(transparent)]
    Reconstruction(#[from] ReconstructionError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config file could not be read
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file extension not recognized
    #[error("unsupported config format '{0}' (expected toml, json, yaml or yml)")]
    UnsupportedFormat(String),

    /// No constructor registered for a builder kind
    #[error("unknown builder kind '{0}'")]
    UnknownBuilder(String),

    /// Builder options rejected by their constructor
    #[error("invalid options for builder '{kind}': {reason}")]
    InvalidOptions { kind: String, reason: String },
}

impl SpecError {
    /// Check if error comes from a config file rather than the declarations
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Json(_)
                | Self::Yaml(_)
                | Self::Toml(_)
                | Self::Io { .. }
                | Self::UnsupportedFormat(_)
                | Self::UnknownBuilder(_)
                | Self::InvalidOptions { .. }
        )
    }

    /// Check if error is a lifecycle misuse
    #[inline]
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Space(e) if e.is_usage())
    }
}

impl From<ConstructionError> for SpecError {
    fn from(e: ConstructionError) -> Self {
        Self::Space(SpaceError::Construction(e))
    }
}

impl From<ValidationError> for SpecError {
    fn from(e: ValidationError) -> Self {
        Self::Space(SpaceError::Validation(e))
    }
}
