//! Property-based coverage for the two testable properties that are
//! naturally generative rather than example-based: weight dominance across
//! passes (§8.3) and the resolver's greedy-dominance guarantee (§8.8).

use proptest::prelude::*;
use rlink_types::pair::{AcceptFlags, AcceptedPair, CandidatePair, Strictness};
use rlink_types::pass::PassId;
use rlink_types::score::ScoreVector;

fn score_vec(values: Vec<f32>) -> ScoreVector {
    let mut v = ScoreVector::missing(values.len());
    for (i, value) in values.into_iter().enumerate() {
        v.set(i, value);
    }
    v
}

proptest! {
    /// An earlier pass always outweighs a later one, no matter how strong
    /// the later pass's evidence is, as long as both are within the
    /// configured number of regular passes.
    #[test]
    fn weight_dominance_holds_across_passes(
        total_passes in 2u16..20,
        scores1 in proptest::collection::vec(-1.0f32..=1.0, 0..10),
        scores2 in proptest::collection::vec(-1.0f32..=1.0, 0..10),
        offset in 0u16..18,
    ) {
        // p1 is always pass 0; p2 is some later pass strictly within range.
        let p1 = 0u16;
        let p2 = 1 + offset % (total_passes - 1);

        let indices1: Vec<usize> = (0..scores1.len()).collect();
        let indices2: Vec<usize> = (0..scores2.len()).collect();
        let w1 = rlink_weigher::weight(&PassId::Regular(p1), &score_vec(scores1), total_passes, &indices1);
        let w2 = rlink_weigher::weight(&PassId::Regular(p2), &score_vec(scores2), total_passes, &indices2);
        prop_assert!(w1 > w2, "pass {p1} (weight {w1}) should outweigh pass {p2} (weight {w2})");
    }

    /// In a 121 resolution, whenever one `A` has several non-tied
    /// candidate partners, the survivor is always the highest-weight one —
    /// a lower-weight row is never chosen over a higher-weight one.
    #[test]
    fn resolver_greedy_dominance_picks_highest_weight(
        weights in proptest::collection::hash_set(1i32..1000, 2..6),
    ) {
        let mut weights: Vec<i32> = weights.into_iter().collect();
        weights.sort_unstable_by(|a, b| b.cmp(a));

        let accepted: Vec<AcceptedPair> = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| AcceptedPair {
                pair: CandidatePair {
                    indv_id_a: "A".into(),
                    indv_id_b: format!("B{i}").into(),
                    idx_a: 0,
                    idx_b: i as u32,
                    passnum: PassId::Regular(0),
                },
                scores: ScoreVector::missing(0),
                flags: AcceptFlags::all_true(),
                weight: f64::from(w),
            })
            .collect();

        let rows = rlink_resolver::resolve_one_to_one(&accepted, Strictness::Strict);
        prop_assert_eq!(rows.len(), 1);
        prop_assert_eq!(rows[0].indv_id_b.as_str(), "B0");
    }
}
