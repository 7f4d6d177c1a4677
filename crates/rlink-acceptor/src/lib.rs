//! Cascading acceptance rules.
//!
//! An [`Acceptor`] is referenced by a stable name from config rather than a
//! dynamically-loaded file path: it's a capability selected from an
//! in-process [`AcceptorRegistry`], satisfying a fixed 16-predicate
//! interface (4 passes x 4 strictness levels, pass 0 short-circuited).
//! Alternatives are compiled in and registered at startup, never loaded
//! from disk at match time.

use std::collections::HashMap;
use std::sync::Arc;

use rlink_types::config::CutoffScores;
use rlink_types::pair::AcceptFlags;
use rlink_types::pass::{PassId, PassSchema};
use rlink_types::score::ScoreVector;

pub trait Acceptor: Send + Sync {
    fn accept(&self, pass: &PassId, scores: &ScoreVector, schema: &PassSchema) -> AcceptFlags;
}

type AcceptorFactory = fn(CutoffScores) -> Arc<dyn Acceptor>;

/// Maps a configured acceptor name to a factory. The default acceptor is
/// always registered; a caller can register additional implementations
/// before building a match from config.
#[derive(Default)]
pub struct AcceptorRegistry {
    factories: HashMap<&'static str, AcceptorFactory>,
}

impl AcceptorRegistry {
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.register("default", |cutoffs| {
            Arc::new(DefaultAcceptor::new(cutoffs)) as Arc<dyn Acceptor>
        });
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: AcceptorFactory) {
        self.factories.insert(name, factory);
    }

    pub fn build(&self, name: &str, cutoffs: CutoffScores) -> Option<Arc<dyn Acceptor>> {
        self.factories.get(name).map(|factory| factory(cutoffs))
    }
}

/// Comparison names the default acceptor looks for in a pass's
/// [`PassSchema`]. A pass that omits one of these simply can't trigger the
/// mask built from it; only `name_sim` is assumed present from pass 1
/// onward.
mod names {
    pub const NAME: &str = "name_sim";
    pub const ID: &str = "id_sim";
    pub const BYEAR: &str = "byear_sim";
    pub const BMONTHBDAY: &str = "bmonthbday_sim";
    pub const MINIT: &str = "minit_sim";
    pub const MNAME: &str = "mname_sim";
    pub const LOC: &str = "loc_sim";
}

fn score_of(scores: &ScoreVector, schema: &PassSchema, name: &str) -> Option<f32> {
    scores.get_by_name(schema, name).filter(|v| !ScoreVector::is_missing(*v))
}

/// Derived boolean masks shared by the strict/moderate/relaxed/review
/// predicates for a scored pair.
struct Masks {
    common_id_null: bool,
    id_high: bool,
    id_review: bool,
    dob_exact: bool,
    dob_partial: bool,
    minit_match_mname_veryhighsim: bool,
    loc_exact: bool,
    name_score: Option<f32>,
}

impl Masks {
    /// `dob_exact`/`dob_partial` are built from the two separate DOB
    /// comparers (`byear_sim`, `bmonthbday_sim`), mirroring the original's
    /// `dob_exact_mask`/`dob_partial_mask`:
    /// `dob_exact = bmonthbday==1 && byear==1`;
    /// `dob_partial = (bmonthbday==1 && byear>=within_1y) ||
    /// (either_month_day<=bmonthbday<=swap_month_day && byear==1)`.
    fn derive(scores: &ScoreVector, schema: &PassSchema, cutoffs: &CutoffScores) -> Self {
        let id_sim = score_of(scores, schema, names::ID);
        let byear_sim = score_of(scores, schema, names::BYEAR);
        let bmonthbday_sim = score_of(scores, schema, names::BMONTHBDAY);
        let minit_sim = score_of(scores, schema, names::MINIT);
        let mname_sim = score_of(scores, schema, names::MNAME);
        let loc_sim = score_of(scores, schema, names::LOC);

        let byear_exact = byear_sim.is_some_and(|v| v >= 0.999);
        let byear_within1 = byear_sim.is_some_and(|v| f64::from(v) >= cutoffs.byear_within1_score);
        let bmonthbday_exact = bmonthbday_sim.is_some_and(|v| v >= 0.999);
        let bmonthbday_between = bmonthbday_sim.is_some_and(|v| {
            let v = f64::from(v);
            v >= cutoffs.bmonthbday_either_score && v <= cutoffs.bmonthbday_swap_score
        });

        let dob_exact = bmonthbday_exact && byear_exact;
        let dob_partial = (bmonthbday_exact && byear_within1) || (bmonthbday_between && byear_exact);

        // minit_match_mname_veryhighsim_mask: the initial is either a good
        // match (sim == 1) or lands exactly on the "unclear" tier with a
        // very-high-similarity middle name backing it.
        let minit_good = minit_sim.is_some_and(|v| v >= 0.999);
        let minit_unclear = minit_sim
            .is_some_and(|v| (f64::from(v) - cutoffs.minit_match_mname_unclear_score).abs() < 1e-6);
        let mname_very_high = mname_sim.is_some_and(|v| f64::from(v) >= cutoffs.name_very_high_score);

        Self {
            common_id_null: id_sim.is_none(),
            id_high: id_sim.is_some_and(|v| f64::from(v) >= cutoffs.id_high_score),
            id_review: id_sim.is_some_and(|v| f64::from(v) >= cutoffs.id_review_score),
            dob_exact,
            dob_partial,
            minit_match_mname_veryhighsim: minit_good || (minit_unclear && mname_very_high),
            loc_exact: loc_sim.is_some_and(|v| v >= 0.999),
            name_score: score_of(scores, schema, names::NAME),
        }
    }

    fn name_at_least(&self, cutoff: f64) -> bool {
        self.name_score.is_some_and(|v| f64::from(v) >= cutoff)
    }
}

/// The shipped default acceptor, reproducing the cascading cutoff rules of
/// the original's four regular blocking passes. Pass 0 (the loosest,
/// highest-recall name/dob block) accepts unconditionally at every level
/// since it carries no comparisons to threshold on.
pub struct DefaultAcceptor {
    cutoffs: CutoffScores,
}

impl DefaultAcceptor {
    pub fn new(cutoffs: CutoffScores) -> Self {
        Self { cutoffs }
    }

    fn review_threshold(&self, pass: u16) -> f64 {
        let offset = self
            .cutoffs
            .review_offset
            .get(&pass.to_string())
            .copied()
            .unwrap_or(0.0);
        self.cutoffs.name_review_score + offset
    }

    fn accept_regular(&self, pass: u16, masks: &Masks) -> AcceptFlags {
        let strict = masks.dob_exact
            && (masks.id_high || masks.name_at_least(self.cutoffs.name_high_score))
            // Pass 3 drops the location-exact branch that passes 1 and 2 use
            // as an alternate route to strict acceptance.
            && (pass == 3 || masks.id_high || masks.loc_exact || masks.dob_exact);

        let moderate = strict
            || (masks.dob_partial && masks.id_high)
            || (!masks.common_id_null && masks.id_high && masks.name_at_least(self.cutoffs.name_review_score))
            // Pass 3 adds a dedicated middle-initial + very-high-similarity
            // middle-name route to moderate acceptance that the other
            // passes don't carry.
            || (pass == 3 && masks.minit_match_mname_veryhighsim);

        let relaxed = moderate
            || (masks.id_review && masks.name_at_least(self.cutoffs.name_review_score))
            || (masks.dob_partial && masks.name_at_least(self.cutoffs.name_high_score));

        let review = relaxed || masks.name_at_least(self.review_threshold(pass));

        AcceptFlags {
            strict,
            moderate,
            relaxed,
            review,
        }
    }
}

impl Acceptor for DefaultAcceptor {
    fn accept(&self, pass: &PassId, scores: &ScoreVector, schema: &PassSchema) -> AcceptFlags {
        if matches!(pass, PassId::GroundTruth(_)) {
            return AcceptFlags::all_true();
        }
        let Some(regular) = pass.regular_index() else {
            return AcceptFlags::all_true();
        };
        if regular == 0 {
            return AcceptFlags::all_true();
        }
        let masks = Masks::derive(scores, schema, &self.cutoffs);
        self.accept_regular(regular, &masks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlink_types::score::MISSING;

    fn cutoffs() -> CutoffScores {
        CutoffScores {
            name_high_score: 0.95,
            name_review_score: 0.8,
            name_very_high_score: 0.9,
            id_high_score: 0.95,
            id_review_score: 0.8,
            byear_within1_score: 0.5,
            bmonthbday_either_score: 0.25,
            bmonthbday_swap_score: 0.5,
            minit_match_mname_unclear_score: 0.7,
            review_offset: HashMap::new(),
        }
    }

    fn schema() -> PassSchema {
        PassSchema::new(vec!["name_sim".into(), "id_sim".into(), "byear_sim".into(), "bmonthbday_sim".into()])
    }

    fn scores(name: f32, id: f32, byear: f32, bmonthbday: f32) -> ScoreVector {
        let mut v = ScoreVector::missing(4);
        v.set(0, name);
        v.set(1, id);
        v.set(2, byear);
        v.set(3, bmonthbday);
        v
    }

    #[test]
    fn pass_zero_always_accepts_all_levels() {
        let acceptor = DefaultAcceptor::new(cutoffs());
        let empty_schema = PassSchema::default();
        let flags = acceptor.accept(&PassId::Regular(0), &ScoreVector::missing(0), &empty_schema);
        assert_eq!(flags, AcceptFlags::all_true());
    }

    #[test]
    fn ground_truth_pass_always_accepts() {
        let acceptor = DefaultAcceptor::new(cutoffs());
        let flags = acceptor.accept(
            &PassId::GroundTruth("ssn".into()),
            &ScoreVector::missing(0),
            &PassSchema::default(),
        );
        assert_eq!(flags, AcceptFlags::all_true());
    }

    #[test]
    fn monotonicity_holds_for_every_level() {
        let acceptor = DefaultAcceptor::new(cutoffs());
        let schema = schema();
        let cases = [
            scores(0.99, 0.99, 1.0, 1.0),
            scores(0.5, MISSING, 0.0, 0.0),
            scores(0.85, 0.85, 0.5, 1.0),
            scores(0.0, MISSING, MISSING, MISSING),
        ];
        for case in cases {
            let flags = acceptor.accept(&PassId::Regular(1), &case, &schema);
            if flags.strict {
                assert!(flags.moderate);
            }
            if flags.moderate {
                assert!(flags.relaxed);
            }
            if flags.relaxed {
                assert!(flags.review);
            }
        }
    }

    #[test]
    fn strong_match_clears_strict() {
        let acceptor = DefaultAcceptor::new(cutoffs());
        let flags = acceptor.accept(&PassId::Regular(1), &scores(0.99, 0.99, 1.0, 1.0), &schema());
        assert!(flags.strict);
    }

    #[test]
    fn weak_match_fails_every_level() {
        let acceptor = DefaultAcceptor::new(cutoffs());
        let flags = acceptor.accept(&PassId::Regular(1), &scores(0.1, MISSING, MISSING, MISSING), &schema());
        assert_eq!(flags, AcceptFlags::default());
    }

    #[test]
    fn dob_partial_via_swapped_month_day_and_exact_byear() {
        let acceptor = DefaultAcceptor::new(cutoffs());
        // bmonthbday lands between either_month_day and swap_month_day
        // (the swapped-digits tier) while byear is an exact match; paired
        // with a high id score this clears moderate via dob_partial && id_high.
        let flags = acceptor.accept(&PassId::Regular(1), &scores(0.5, 0.99, 1.0, 0.5), &schema());
        assert!(!flags.strict);
        assert!(flags.moderate);
    }

    #[test]
    fn registry_resolves_default_by_name() {
        let registry = AcceptorRegistry::with_defaults();
        assert!(registry.build("default", cutoffs()).is_some());
        assert!(registry.build("nonexistent", cutoffs()).is_none());
    }
}
