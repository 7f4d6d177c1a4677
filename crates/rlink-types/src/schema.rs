//! Logical-name-to-dense-index mapping for a [`crate::record::RecordTable`].
//!
//! Production loading of raw input into this shape is an external concern
//! (see `spec.md` §1 Non-goals); this module only defines the shape itself.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    name_to_idx: HashMap<Box<str>, u32>,
}

impl ColumnMap {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        let name_to_idx = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| (name.into(), idx as u32))
            .collect();
        Self { name_to_idx }
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.name_to_idx.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_idx.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.name_to_idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_idx.is_empty()
    }
}
