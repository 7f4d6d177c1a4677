//! Multi-pass equijoin blocking.
//!
//! Each pass is an in-memory hash join over a small field list. A candidate
//! pair surfaced by pass *N* is dropped if it would also satisfy any
//! earlier pass's join condition: [`PastJoinCond`] accumulates the field
//! lists of every pass run so far and is consulted before a pair is
//! attributed to the current pass, so a pair is attributed to exactly the
//! earliest pass that would have blocked it.

use std::collections::HashMap;

use rlink_error::{Result, RlinkError};
use rlink_types::config::BlockField;
use rlink_types::pass::PassId;
use rlink_types::record::{FieldValue, RecordTable};
use rlink_types::schema::ColumnMap;
use rlink_types::CandidatePair;

/// A blocking pass's fields, resolved to dense column indices.
#[derive(Debug, Clone)]
pub struct BlockPass {
    fields: Vec<(u32, u32)>,
}

impl BlockPass {
    /// Resolves a pass's configured field names against both tables.
    /// Returns `Ok(None)` rather than an error when a field is absent from
    /// either table: the pass is skipped, with a warning, not the whole
    /// match (`spec.md` §4.2, "a pass whose fields are not present on both
    /// tables is skipped").
    ///
    /// If any field in `raw` sets `inverted`, the whole pass is treated as
    /// using swapped-side blocking (the fnamelname/lnamefname strategy): the
    /// `b`-side column order is reversed before being zipped against the
    /// `a`-side's fixed order, mirroring the original's whole-list
    /// `passblocks_b.reverse()`.
    pub fn compile(raw: &[BlockField], columns_a: &ColumnMap, columns_b: &ColumnMap) -> Option<Self> {
        let inverted = raw.iter().any(|field| field.inverted);
        let mut idx_as = Vec::with_capacity(raw.len());
        let mut idx_bs = Vec::with_capacity(raw.len());
        for field in raw {
            let (Some(idx_a), Some(idx_b)) =
                (columns_a.index_of(&field.field_a), columns_b.index_of(&field.field_b))
            else {
                tracing::warn!(
                    field_a = %field.field_a,
                    field_b = %field.field_b,
                    "pass is being skipped since a configured field is not included in both tables"
                );
                return None;
            };
            idx_as.push(idx_a);
            idx_bs.push(idx_b);
        }
        if inverted {
            idx_bs.reverse();
        }
        let fields = idx_as.into_iter().zip(idx_bs).collect();
        Some(Self { fields })
    }

    fn key_for(&self, table: &RecordTable, row_idx: u32, side: Side) -> Option<Vec<KeyPart>> {
        let mut key = Vec::with_capacity(self.fields.len());
        for &(idx_a, idx_b) in &self.fields {
            let idx = match side {
                Side::A => idx_a,
                Side::B => idx_b,
            };
            let value = table.rows[row_idx as usize].get(idx)?;
            key.push(KeyPart::from(value));
        }
        Some(key)
    }
}

#[derive(Clone, Copy)]
enum Side {
    A,
    B,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
    Str(Box<str>),
    Num(u64),
    Date(i32, u32, u32),
}

impl From<&FieldValue> for KeyPart {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Str(s) => Self::Str(s.clone()),
            FieldValue::Num(n) => Self::Num(n.to_bits()),
            FieldValue::Date { year, month, day } => Self::Date(*year, *month, *day),
        }
    }
}

/// Accumulates the field lists of every regular pass run so far, so later
/// passes can exclude pairs that an earlier pass would already have found.
/// Ground-truth-ID passes are never added here: they are a side channel,
/// not a blocking pass (`spec.md` §4.2).
#[derive(Debug, Clone, Default)]
pub struct PastJoinCond {
    passes: Vec<Vec<(u32, u32)>>,
}

impl PastJoinCond {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, pass: &BlockPass) {
        self.passes.push(pass.fields.clone());
    }

    fn excludes(&self, table_a: &RecordTable, idx_a: u32, table_b: &RecordTable, idx_b: u32) -> bool {
        self.passes.iter().any(|fields| {
            fields.iter().all(|&(fa, fb)| {
                let va = table_a.rows[idx_a as usize].get(fa);
                let vb = table_b.rows[idx_b as usize].get(fb);
                matches!((va, vb), (Some(a), Some(b)) if a == b)
            })
        })
    }
}

/// Runs one regular blocking pass: hash-equijoin `table_a` against
/// `table_b` on the pass's field list, excluding pairs any earlier pass
/// would already cover, and excluding self-pairs / duplicate unordered
/// pairs when `dedup` is set (`table_a` and `table_b` are the same table in
/// that case).
pub fn run_pass(
    passnum: u16,
    pass: &BlockPass,
    table_a: &RecordTable,
    table_b: &RecordTable,
    past: &PastJoinCond,
    dedup: bool,
) -> Vec<CandidatePair> {
    let mut index: HashMap<Vec<KeyPart>, Vec<u32>> = HashMap::new();
    for idx_a in 0..table_a.len() as u32 {
        if let Some(key) = pass.key_for(table_a, idx_a, Side::A) {
            index.entry(key).or_default().push(idx_a);
        }
    }

    let mut out = Vec::new();
    for idx_b in 0..table_b.len() as u32 {
        let Some(key) = pass.key_for(table_b, idx_b, Side::B) else {
            continue;
        };
        let Some(candidates) = index.get(&key) else {
            continue;
        };
        for &idx_a in candidates {
            if dedup && idx_a >= idx_b {
                continue;
            }
            let row_a = &table_a.rows[idx_a as usize];
            let row_b = &table_b.rows[idx_b as usize];
            if dedup && row_a.indv_id == row_b.indv_id {
                continue;
            }
            if past.excludes(table_a, idx_a, table_b, idx_b) {
                continue;
            }
            out.push(CandidatePair {
                indv_id_a: row_a.indv_id.clone(),
                indv_id_b: row_b.indv_id.clone(),
                idx_a,
                idx_b,
                passnum: PassId::Regular(passnum),
            });
        }
    }
    out
}

/// Runs one ground-truth-ID pass: an exact equijoin on a single ID field
/// present in both tables, bypassing similarity scoring entirely. Results
/// are weighted above every regular pass (see `rlink-weigher`) and are not
/// added to [`PastJoinCond`].
pub fn run_ground_truth_pass(
    gid: &str,
    columns_a: &ColumnMap,
    columns_b: &ColumnMap,
    table_a: &RecordTable,
    table_b: &RecordTable,
    dedup: bool,
) -> Result<Vec<CandidatePair>> {
    let (Some(idx_a), Some(idx_b)) = (columns_a.index_of(gid), columns_b.index_of(gid)) else {
        return Err(RlinkError::config(format!(
            "ground truth id field '{gid}' not present on both tables"
        )));
    };
    let pass = BlockPass {
        fields: vec![(idx_a, idx_b)],
    };
    let raw = run_pass(0, &pass, table_a, table_b, &PastJoinCond::new(), dedup);
    Ok(raw
        .into_iter()
        .map(|mut pair| {
            pair.passnum = PassId::GroundTruth(gid.into());
            pair
        })
        .collect())
}
