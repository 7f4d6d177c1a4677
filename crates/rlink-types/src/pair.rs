//! Candidate, accepted, and weighted pair types that flow from the blocker
//! through to the resolver.

use crate::pass::PassId;
use crate::score::ScoreVector;

/// A single candidate pair produced by a blocking pass, before scoring.
#[derive(Debug, Clone)]
pub struct CandidatePair {
    pub indv_id_a: Box<str>,
    pub indv_id_b: Box<str>,
    pub idx_a: u32,
    pub idx_b: u32,
    pub passnum: PassId,
}

/// The four monotonic acceptance levels a scored pair may satisfy.
/// `strict => moderate => relaxed => review` always holds by construction:
/// see `rlink-acceptor`, which ORs each looser level with the one above it
/// rather than evaluating the four predicates independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptFlags {
    pub strict: bool,
    pub moderate: bool,
    pub relaxed: bool,
    pub review: bool,
}

impl AcceptFlags {
    pub const fn all_true() -> Self {
        Self {
            strict: true,
            moderate: true,
            relaxed: true,
            review: true,
        }
    }

    pub fn any(self) -> bool {
        self.strict || self.moderate || self.relaxed || self.review
    }

    pub fn at_least(self, strictness: Strictness) -> bool {
        match strictness {
            Strictness::Strict => self.strict,
            Strictness::Moderate => self.moderate,
            Strictness::Relaxed => self.relaxed,
            Strictness::Review => self.review,
        }
    }
}

/// Selects which acceptance column a resolver pass consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strictness {
    Strict,
    Moderate,
    Relaxed,
    Review,
}

impl Strictness {
    pub const ALL: [Self; 4] = [Self::Strict, Self::Moderate, Self::Relaxed, Self::Review];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Moderate => "moderate",
            Self::Relaxed => "relaxed",
            Self::Review => "review",
        }
    }
}

/// A candidate pair that cleared at least `review` acceptance, with its
/// score vector and final weight attached.
#[derive(Debug, Clone)]
pub struct AcceptedPair {
    pub pair: CandidatePair,
    pub scores: ScoreVector,
    pub flags: AcceptFlags,
    pub weight: f64,
}
