//! Typed parameter paths
//!
//! Provides [`ParamPath`] for addressing parameters inside a configuration
//! space by their position in the eventual process specification.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

/// One step of a [`ParamPath`]
///
/// Variant order matters: it fixes the sort order of sampled configurations,
/// so plain keys come before the indexed scopes that share their parent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Named leaf or intermediate key, e.g. `num_xstreams`
    Key(String),
    /// Pool index, rendered `pool[2]`
    Pool(usize),
    /// Provider family tag, rendered `family[storage]`
    Family(String),
    /// Provider instance index within a family, rendered `provider[0]`
    Provider(usize),
}

impl Segment {
    /// Create a key segment
    #[inline]
    #[must_use]
    pub fn key(name: impl Into<String>) -> Self {
        Self::Key(name.into())
    }

    /// Create a family segment
    #[inline]
    #[must_use]
    pub fn family(tag: impl Into<String>) -> Self {
        Self::Family(tag.into())
    }

    /// Check that names only use identifier characters
    ///
    /// # Errors
    /// Returns [`PathError`] on empty or non `[A-Za-z0-9_]` names
    pub fn validate(&self) -> Result<(), PathError> {
        match self {
            Self::Key(name) | Self::Family(name) => validate_name(name),
            Self::Pool(_) | Self::Provider(_) => Ok(()),
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(name) => f.write_str(name),
            Self::Pool(index) => write!(f, "pool[{index}]"),
            Self::Family(tag) => write!(f, "family[{tag}]"),
            Self::Provider(index) => write!(f, "provider[{index}]"),
        }
    }
}

impl FromStr for Segment {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::EmptySegment);
        }

        let Some(open) = s.find('[') else {
            validate_name(s)?;
            return Ok(Self::Key(s.to_string()));
        };

        let inner = s[open + 1..]
            .strip_suffix(']')
            .ok_or_else(|| PathError::InvalidSegment(s.to_string()))?;

        match &s[..open] {
            "pool" => Ok(Self::Pool(parse_index(s, inner)?)),
            "provider" => Ok(Self::Provider(parse_index(s, inner)?)),
            "family" => {
                validate_name(inner)?;
                Ok(Self::Family(inner.to_string()))
            }
            _ => Err(PathError::InvalidSegment(s.to_string())),
        }
    }
}

fn parse_index(segment: &str, inner: &str) -> Result<usize, PathError> {
    inner
        .parse()
        .map_err(|_| PathError::InvalidIndex(segment.to_string()))
}

fn validate_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() {
        Err(PathError::EmptySegment)
    } else if name.contains(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
        Err(PathError::InvalidSegment(name.to_string()))
    } else {
        Ok(())
    }
}

/// Path of a parameter within a configuration space
///
/// Each segment is typed, so nested specifications can be rebuilt from a
/// flat configuration without parsing strings. The dotted string form only
/// exists at the serialization boundary.
///
/// # Examples
/// - `[Key("num_pools")]` → `num_pools`
/// - `[Pool(1), Key("num_xstreams")]` → `pool[1].num_xstreams`
/// - `[Pool(0), Family("storage"), Provider(2), Key("type")]` →
///   `pool[0].family[storage].provider[2].type`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ParamPath(SmallVec<[Segment; 6]>);

impl ParamPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self(segments.into_iter().collect())
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    /// Path made of a single key
    #[inline]
    #[must_use]
    pub fn key(name: impl Into<String>) -> Self {
        Self::root().child(Segment::key(name))
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].iter().cloned().collect()))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: Segment) -> Self {
        let mut new = self.clone();
        new.0.push(segment);
        new
    }

    /// Append a key segment
    #[inline]
    #[must_use]
    pub fn with_key(&self, name: impl Into<String>) -> Self {
        self.child(Segment::Key(name.into()))
    }

    /// Append a pool index
    #[inline]
    #[must_use]
    pub fn with_pool(&self, index: usize) -> Self {
        self.child(Segment::Pool(index))
    }

    /// Append a family tag
    #[inline]
    #[must_use]
    pub fn with_family(&self, tag: impl Into<String>) -> Self {
        self.child(Segment::Family(tag.into()))
    }

    /// Append a provider index
    #[inline]
    #[must_use]
    pub fn with_provider(&self, index: usize) -> Self {
        self.child(Segment::Provider(index))
    }

    /// Append a run of keys, e.g. `&["transfer_manager", "type"]`
    #[inline]
    #[must_use]
    pub fn with_keys(&self, names: &[impl AsRef<str>]) -> Self {
        let mut new = self.clone();
        new.0
            .extend(names.iter().map(|n| Segment::Key(n.as_ref().to_string())));
        new
    }

    /// Concatenate two paths
    #[inline]
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut new = self.clone();
        new.0.extend(other.0.iter().cloned());
        new
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0[..] == other.0[..self.0.len()]
    }

    /// Get relative path from ancestor
    ///
    /// # Errors
    /// Returns error if `self` is not a descendant of `ancestor`
    pub fn relative_to(&self, ancestor: &Self) -> Result<Self, PathError> {
        if !ancestor.is_prefix_of(self) {
            return Err(PathError::NotDescendant {
                path: self.to_string(),
                ancestor: ancestor.to_string(),
            });
        }
        Ok(Self(self.0[ancestor.0.len()..].iter().cloned().collect()))
    }

    /// Validate every segment
    ///
    /// # Errors
    /// Returns the first invalid segment, or [`PathError::EmptyPath`] for root
    pub fn validate(&self) -> Result<(), PathError> {
        if self.is_empty() {
            return Err(PathError::EmptyPath);
        }
        self.0.iter().try_for_each(Segment::validate)
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.0.iter()
    }

    /// Keys-only view, joined with `separator`
    ///
    /// Returns `None` if the path holds any indexed segment.
    #[must_use]
    pub fn join_keys(&self, separator: &str) -> Option<String> {
        let keys = self
            .0
            .iter()
            .map(|s| match s {
                Segment::Key(k) => Some(k.as_str()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        Some(keys.join(separator))
    }
}

impl Display for ParamPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for ParamPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        s.split('.').map(Segment::from_str).collect()
    }
}

impl FromIterator<Segment> for ParamPath {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for ParamPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ParamPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to parameter paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Root path where a parameter was expected
    #[error("parameter path is empty")]
    EmptyPath,

    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Invalid segment characters or unknown indexed scope
    #[error("invalid segment: {0} (must be alphanumeric or underscore)")]
    InvalidSegment(String),

    /// Index of `pool[..]`/`provider[..]` is not a number
    #[error("invalid index in segment: {0}")]
    InvalidIndex(String),

    /// Not a descendant path
    #[error("path '{path}' is not a descendant of '{ancestor}'")]
    NotDescendant { path: String, ancestor: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_path() -> ParamPath {
        ParamPath::root()
            .with_pool(2)
            .with_family("storage")
            .with_provider(0)
            .with_key("type")
    }

    #[test]
    fn path_display_uses_typed_segments() {
        assert_eq!(
            provider_path().to_string(),
            "pool[2].family[storage].provider[0].type"
        );
        assert_eq!(ParamPath::key("num_pools").to_string(), "num_pools");
    }

    #[test]
    fn path_parse_inverts_display() {
        let path = provider_path().with_keys(&["target", "path"]);
        let parsed: ParamPath = path.to_string().parse().unwrap();
        assert_eq!(parsed, path);
    }

    #[test]
    fn path_parse_rejects_unknown_scope() {
        let result: Result<ParamPath, _> = "pools[1].x".parse();
        assert!(matches!(result, Err(PathError::InvalidSegment(_))));
    }

    #[test]
    fn path_parse_rejects_bad_index() {
        let result: Result<ParamPath, _> = "pool[x].num_xstreams".parse();
        assert!(matches!(result, Err(PathError::InvalidIndex(_))));
    }

    #[test]
    fn path_parse_rejects_empty_segment() {
        let result: Result<ParamPath, _> = "a..b".parse();
        assert!(matches!(result, Err(PathError::EmptySegment)));
    }

    #[test]
    fn path_validate_rejects_invalid_key() {
        let path = ParamPath::key("tm-type");
        assert!(matches!(path.validate(), Err(PathError::InvalidSegment(_))));
        assert!(matches!(
            ParamPath::root().validate(),
            Err(PathError::EmptyPath)
        ));
    }

    #[test]
    fn path_relative_to() {
        let prefix = ParamPath::root().with_pool(2).with_family("storage");
        let relative = provider_path().relative_to(&prefix).unwrap();
        assert_eq!(relative.to_string(), "provider[0].type");

        let other = ParamPath::root().with_pool(1);
        assert!(matches!(
            provider_path().relative_to(&other),
            Err(PathError::NotDescendant { .. })
        ));
    }

    #[test]
    fn path_ordering_is_numeric_on_indices() {
        let p2 = ParamPath::root().with_pool(2).with_key("num_xstreams");
        let p10 = ParamPath::root().with_pool(10).with_key("num_xstreams");
        assert!(p2 < p10);
        assert!(ParamPath::key("num_pools") < p2);
    }

    #[test]
    fn path_join_keys() {
        let path = ParamPath::root().with_keys(&["transfer_manager", "pipeline", "num_pools"]);
        assert_eq!(
            path.join_keys(".").as_deref(),
            Some("transfer_manager.pipeline.num_pools")
        );
        assert_eq!(provider_path().join_keys("."), None);
    }

    #[test]
    fn path_serde_as_string() {
        let json = serde_json::to_string(&provider_path()).unwrap();
        assert_eq!(json, "\"pool[2].family[storage].provider[0].type\"");
        let back: ParamPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, provider_path());
    }
}
