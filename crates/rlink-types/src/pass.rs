//! Pass identity and the fixed per-pass comparison-name ordering.

use std::fmt;

/// Identifies one blocking pass. Regular passes are indexed in configured
/// order; ground-truth-ID passes run first and are never excluded by a
/// later regular pass's accumulated exclusion predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PassId {
    Regular(u16),
    GroundTruth(Box<str>),
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular(n) => write!(f, "{n}"),
            Self::GroundTruth(gid) => write!(f, "dup_{gid}"),
        }
    }
}

impl PassId {
    pub fn is_ground_truth(&self) -> bool {
        matches!(self, Self::GroundTruth(_))
    }

    pub fn regular_index(&self) -> Option<u16> {
        match self {
            Self::Regular(n) => Some(*n),
            Self::GroundTruth(_) => None,
        }
    }
}

/// The fixed, ordered set of comparison names a pass computes. Indices into
/// a pass's [`crate::score::ScoreVector`] are positions in this list, so
/// lookups by name are a linear scan over a handful of entries rather than a
/// hash lookup per candidate pair.
#[derive(Debug, Clone, Default)]
pub struct PassSchema {
    names: Vec<Box<str>>,
}

impl PassSchema {
    pub fn new(names: Vec<Box<str>>) -> Self {
        Self { names }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| &**n == name)
    }

    pub fn names(&self) -> &[Box<str>] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
