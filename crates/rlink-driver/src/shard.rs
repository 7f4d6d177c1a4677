//! On-disk shard format.
//!
//! A shard is a CSV file with a fixed header prefix
//! (`indv_id_a, indv_id_b, idx_a, idx_b, passnum, match_strict,
//! match_moderate, match_relaxed, match_review, weight`) followed by one
//! column per comparison name in the pass's [`PassSchema`]. Shards are
//! written pre-sorted by weight descending and are the same format as the
//! final pairwise output — the merge step never re-encodes a row, it only
//! picks the next-highest-weight row across shards.

use std::path::{Path, PathBuf};

use rlink_error::Result;
use rlink_types::pair::AcceptedPair;
use rlink_types::pass::PassSchema;

pub const WEIGHT_COLUMN: usize = 9;

fn header(schema: &PassSchema) -> Vec<String> {
    let mut cols = vec![
        "indv_id_a".to_string(),
        "indv_id_b".to_string(),
        "idx_a".to_string(),
        "idx_b".to_string(),
        "passnum".to_string(),
        "match_strict".to_string(),
        "match_moderate".to_string(),
        "match_relaxed".to_string(),
        "match_review".to_string(),
        "weight".to_string(),
    ];
    cols.extend(schema.names().iter().map(ToString::to_string));
    cols
}

fn row(pair: &AcceptedPair, schema: &PassSchema) -> Vec<String> {
    let mut out = vec![
        pair.pair.indv_id_a.to_string(),
        pair.pair.indv_id_b.to_string(),
        pair.pair.idx_a.to_string(),
        pair.pair.idx_b.to_string(),
        pair.pair.passnum.to_string(),
        pair.flags.strict.to_string(),
        pair.flags.moderate.to_string(),
        pair.flags.relaxed.to_string(),
        pair.flags.review.to_string(),
        pair.weight.to_string(),
    ];
    out.extend((0..schema.len()).map(|i| pair.scores.get(i).to_string()));
    out
}

/// Writes `pairs` (already sorted by weight descending) to a new shard
/// file under `dir`, named by `name`.
pub fn write_shard(dir: &Path, name: &str, pairs: &[AcceptedPair], schema: &PassSchema) -> Result<PathBuf> {
    let path = dir.join(format!("{name}.csv"));
    let mut writer = csv::WriterBuilder::new().from_path(&path)?;
    writer.write_record(header(schema))?;
    for pair in pairs {
        writer.write_record(row(pair, schema))?;
    }
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlink_types::pair::AcceptFlags;
    use rlink_types::pass::PassId;
    use rlink_types::score::ScoreVector;
    use rlink_types::CandidatePair;

    #[test]
    fn shard_round_trips_header_and_row_count() {
        let dir = tempfile::tempdir().unwrap();
        let schema = PassSchema::new(vec!["name_sim".into()]);
        let mut scores = ScoreVector::missing(1);
        scores.set(0, 0.9);
        let pairs = vec![AcceptedPair {
            pair: CandidatePair {
                indv_id_a: "a1".into(),
                indv_id_b: "b1".into(),
                idx_a: 0,
                idx_b: 0,
                passnum: PassId::Regular(0),
            },
            scores,
            flags: AcceptFlags::all_true(),
            weight: 10.9,
        }];
        let path = write_shard(dir.path(), "shard_0", &pairs, &schema).unwrap();
        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().len(), 11);
        assert_eq!(reader.records().count(), 1);
    }
}
