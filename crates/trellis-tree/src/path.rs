//! Tree paths
//!
//! Provides [`TreePath`], the canonical identifier of a node: the names of its
//! ancestors plus its own name, root first.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path of a node in an experiment tree
///
/// Used for logging, history entries and jump targets.
///
/// # Examples
/// - `["exp", "intro", "welcome"]` → `exp.intro.welcome`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct TreePath(Vec<String>);

impl TreePath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Create path from a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if any)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment, the node's own name
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(|s| s.as_str())
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Check if this path is an ancestor of another (strict prefix)
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    /// Whether `name` can be used as a node name
    #[must_use]
    pub fn is_valid_segment(name: &str) -> bool {
        !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    }
}

impl Display for TreePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for TreePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment)
                } else if !Self::is_valid_segment(seg) {
                    Err(PathError::InvalidSegment(seg.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl From<Vec<String>> for TreePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

/// Errors related to tree paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Path string was empty
    #[error("path is empty")]
    Empty,

    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Invalid segment characters
    #[error("invalid segment: {0} (must be alphanumeric, '-' or '_')")]
    InvalidSegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_parent_and_last() {
        let path: TreePath = "exp.intro.welcome".parse().unwrap();
        assert_eq!(path.last(), Some("welcome"));
        assert_eq!(path.parent().unwrap().to_string(), "exp.intro");
        assert!(TreePath::new(vec![]).parent().is_none());
    }

    #[test]
    fn path_child() {
        let parent = TreePath::single("exp");
        let child = parent.child("p1");
        assert_eq!(child.segments(), &["exp", "p1"]);
    }

    #[test]
    fn path_is_ancestor_of() {
        let parent: TreePath = "exp".parse().unwrap();
        let child: TreePath = "exp.p1".parse().unwrap();
        assert!(parent.is_ancestor_of(&child));
        assert!(!child.is_ancestor_of(&parent));
        assert!(!parent.is_ancestor_of(&parent.clone()));
    }

    #[test]
    fn path_from_str_rejects_bad_input() {
        assert_eq!("".parse::<TreePath>(), Err(PathError::Empty));
        assert_eq!("a..b".parse::<TreePath>(), Err(PathError::EmptySegment));
        assert!(matches!(
            "a.b c".parse::<TreePath>(),
            Err(PathError::InvalidSegment(_))
        ));
    }

    #[test]
    fn path_display_round_trips_through_from_str() {
        let path = TreePath::new(vec!["exp".into(), "block-1".into(), "q_1".into()]);
        let parsed: TreePath = path.to_string().parse().unwrap();
        assert_eq!(parsed, path);
    }
}
