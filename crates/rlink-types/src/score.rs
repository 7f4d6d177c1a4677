//! Dense per-pair similarity score storage.

use smallvec::SmallVec;

use crate::pass::PassSchema;

/// A missing comparison (one or both fields absent on this pair) is encoded
/// with this sentinel rather than `Option`, so the vector stays a flat
/// `f32` buffer that workers can sort and weigh without matching on a
/// variant per element.
pub const MISSING: f32 = -1.0;

/// A pass's similarity scores for one candidate pair, in [`PassSchema`]
/// order. Stack-allocated up to 12 comparisons, which covers every pass in
/// practice; spills to the heap beyond that.
#[derive(Debug, Clone, Default)]
pub struct ScoreVector(SmallVec<[f32; 12]>);

impl ScoreVector {
    pub fn missing(len: usize) -> Self {
        Self(SmallVec::from_elem(MISSING, len))
    }

    pub fn set(&mut self, idx: usize, value: f32) {
        self.0[idx] = value;
    }

    pub fn get(&self, idx: usize) -> f32 {
        self.0[idx]
    }

    pub fn get_by_name(&self, schema: &PassSchema, name: &str) -> Option<f32> {
        schema.index_of(name).map(|idx| self.0[idx])
    }

    pub fn is_missing(value: f32) -> bool {
        value < 0.0
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
