//! Scalar weight computation.
//!
//! `weight = 10^(P - passnum) + sum(clamp(score))` for regular passes,
//! where `P` is the total number of regular passes and the `-1.0` missing
//! sentinel is replaced by `0.5` before summing. Only the comparers actually
//! configured for a pass contribute to the sum: `scores` is sized to the
//! global, cross-pass schema, so a column a pass never computes also reads
//! back as `-1.0` and must NOT be charged the same `0.5` as a column the
//! pass computed but found one side absent for. `in_pass_indices` is the set
//! of global-schema column indices this pass's comparer table actually
//! populates. Ground-truth-ID passes are weighted above every regular pass
//! unconditionally, regardless of their (nonexistent) scores.

use rlink_types::pass::PassId;
use rlink_types::score::ScoreVector;

fn clamp_score(value: f32) -> f64 {
    if ScoreVector::is_missing(value) {
        0.5
    } else {
        f64::from(value).max(0.0)
    }
}

/// `total_passes` is the number of configured regular passes (`P` in the
/// formula above), independent of how many of them actually ran.
/// `in_pass_indices` are the global-schema indices this pass's comparer
/// table populates; any column outside that set is ignored rather than
/// treated as a missing-value contribution.
pub fn weight(pass: &PassId, scores: &ScoreVector, total_passes: u16, in_pass_indices: &[usize]) -> f64 {
    match pass {
        PassId::GroundTruth(_) => 10f64.powi(i32::from(total_passes) + 1),
        PassId::Regular(passnum) => {
            let base = 10f64.powi(i32::from(total_passes) - i32::from(*passnum));
            base + in_pass_indices.iter().map(|&i| clamp_score(scores.get(i))).sum::<f64>()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_truth_outweighs_every_regular_pass() {
        let scores = ScoreVector::missing(0);
        let gid_weight = weight(&PassId::GroundTruth("ssn".into()), &scores, 4, &[]);
        let pass0_weight = weight(&PassId::Regular(0), &scores, 4, &[]);
        assert!(gid_weight > pass0_weight);
    }

    #[test]
    fn earlier_pass_outweighs_later_pass_regardless_of_scores() {
        let mut low_scores = ScoreVector::missing(2);
        low_scores.set(0, 0.0);
        low_scores.set(1, 0.0);
        let mut high_scores = ScoreVector::missing(2);
        high_scores.set(0, 1.0);
        high_scores.set(1, 1.0);
        let earlier = weight(&PassId::Regular(0), &low_scores, 4, &[0, 1]);
        let later = weight(&PassId::Regular(3), &high_scores, 4, &[0, 1]);
        assert!(earlier > later);
    }

    #[test]
    fn in_pass_missing_contributes_half() {
        let scores = ScoreVector::missing(1);
        let base = weight(&PassId::Regular(2), &ScoreVector::missing(0), 4, &[]);
        let with_missing = weight(&PassId::Regular(2), &scores, 4, &[0]);
        assert!((with_missing - base - 0.5).abs() < 1e-9);
    }

    #[test]
    fn out_of_pass_missing_contributes_nothing() {
        let scores = ScoreVector::missing(1);
        let base = weight(&PassId::Regular(2), &ScoreVector::missing(0), 4, &[]);
        let without_contribution = weight(&PassId::Regular(2), &scores, 4, &[]);
        assert_eq!(without_contribution, base);
    }
}
