//! Sampled configurations

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::path::ParamPath;
use crate::value::Value;

/// One concrete assignment of values to the active parameters of a space
///
/// Inactive parameters are absent, never null. Entries are ordered by
/// [`ParamPath`], so indices sort numerically and everything under a common
/// prefix is contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampledConfiguration {
    values: BTreeMap<ParamPath, Value>,
}

impl SampledConfiguration {
    /// Get value of a parameter
    #[inline]
    #[must_use]
    pub fn get(&self, path: &ParamPath) -> Option<&Value> {
        self.values.get(path)
    }

    /// Get integer value of a parameter
    #[inline]
    #[must_use]
    pub fn get_int(&self, path: &ParamPath) -> Option<i64> {
        self.get(path).and_then(Value::as_int)
    }

    /// Check if parameter is active in this configuration
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &ParamPath) -> bool {
        self.values.contains_key(path)
    }

    /// Number of active parameters
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no parameter is active
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate entries in path order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&ParamPath, &Value)> {
        self.values.iter()
    }

    /// Iterate active paths in order
    #[inline]
    pub fn paths(&self) -> impl Iterator<Item = &ParamPath> {
        self.values.keys()
    }

    /// Entries whose path starts with `prefix` (the prefix itself included)
    pub fn under<'a>(
        &'a self,
        prefix: &'a ParamPath,
    ) -> impl Iterator<Item = (&'a ParamPath, &'a Value)> + 'a {
        self.values
            .range(prefix.clone()..)
            .take_while(move |(path, _)| prefix.is_prefix_of(path))
    }

    /// Serialize to a JSON object keyed by flat path strings
    ///
    /// # Errors
    /// Returns error if serialization fails (rare for JSON)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl FromIterator<(ParamPath, Value)> for SampledConfiguration {
    fn from_iter<I: IntoIterator<Item = (ParamPath, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SampledConfiguration {
    type Item = (&'a ParamPath, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, ParamPath, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl Display for SampledConfiguration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration(values={{")?;
        for (path, value) in &self.values {
            writeln!(f, "  '{path}': {value},")?;
        }
        write!(f, "}})")
    }
}
